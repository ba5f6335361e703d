//! Application configuration management.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Snapshot source configuration.
    pub snapshot: SnapshotConfig,
    /// Aggregation thresholds and defaults.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    /// Auto-refresh configuration.
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where raw records are loaded from.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Path to the JSON snapshot file.
    pub path: String,
    /// Restrict records to one campus. `None` loads every campus.
    #[serde(default)]
    pub campus_id: Option<String>,
}

/// Thresholds and defaults used by the aggregation engine.
///
/// The advisory thresholds are presentation heuristics, so they live here
/// instead of being hard-coded in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyticsConfig {
    /// Zone used to decide which local month an instant falls in.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    /// Length of the trailing month series.
    #[serde(default = "default_trailing_months")]
    pub trailing_months: u32,
    /// Percent change beyond which a trend counts as up or down.
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold: Decimal,
    /// `max / max(min, 1)` above which a distribution is flagged as imbalanced.
    #[serde(default = "default_imbalance_ratio")]
    pub imbalance_ratio: Decimal,
    /// A distribution needs more groups than this to be checked for imbalance.
    #[serde(default = "default_imbalance_min_groups")]
    pub imbalance_min_groups: usize,
    /// Fraction of the average group count below which a category is low on stock.
    #[serde(default = "default_low_stock_ratio")]
    pub low_stock_ratio: Decimal,
    /// Length of top lists (popular books, authors, readers).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Length of the most/least reading class lists.
    #[serde(default = "default_class_rank_n")]
    pub class_rank_n: usize,
    /// Fine accrued per overdue day.
    #[serde(default = "default_fine_per_day")]
    pub fine_per_day: Decimal,
    /// Page size when a request does not name one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_timezone() -> Tz {
    chrono_tz::Europe::Istanbul
}

fn default_trailing_months() -> u32 {
    6
}

fn default_trend_threshold() -> Decimal {
    Decimal::from(5)
}

fn default_imbalance_ratio() -> Decimal {
    Decimal::from(5)
}

fn default_imbalance_min_groups() -> usize {
    3
}

fn default_low_stock_ratio() -> Decimal {
    Decimal::new(5, 1)
}

fn default_top_n() -> usize {
    10
}

fn default_class_rank_n() -> usize {
    5
}

fn default_fine_per_day() -> Decimal {
    Decimal::from(5)
}

fn default_page_size() -> u32 {
    10
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            trailing_months: default_trailing_months(),
            trend_threshold: default_trend_threshold(),
            imbalance_ratio: default_imbalance_ratio(),
            imbalance_min_groups: default_imbalance_min_groups(),
            low_stock_ratio: default_low_stock_ratio(),
            top_n: default_top_n(),
            class_rank_n: default_class_rank_n(),
            fine_per_day: default_fine_per_day(),
            default_page_size: default_page_size(),
        }
    }
}

/// Periodic re-fetch and recompute of one report.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Whether the auto-refresher runs at all.
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between runs.
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
    /// Report type to keep fresh.
    #[serde(default = "default_refresh_report")]
    pub report_type: String,
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_refresh_report() -> String {
    "monthly_loans".to_string()
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_refresh_interval(),
            report_type: default_refresh_report(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SHELFWISE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
