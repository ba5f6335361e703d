//! Report data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shelfwise_shared::types::{PageRequest, PageResponse};

use super::error::ReportError;
use crate::budget::BudgetSummary;
use crate::compare::ComparisonResult;
use crate::metrics::{Advisory, DistributionEntry, Metric, SeriesAnalytics, TagShare};
use crate::period::{DateRange, YearMonth};
use crate::ranking::RankingEntry;
use crate::table::{FieldValue, SortSpec, TableRow};

/// Every report the assembler can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Headline KPIs.
    Overview,
    /// Loans per trailing month.
    MonthlyLoans,
    /// Sign-ups per trailing month.
    UserRegistrations,
    /// Paid fines per trailing month.
    FineCollections,
    /// Catalog additions per trailing month.
    CollectionGrowth,
    /// Reward claims per trailing month.
    RewardClaimsTrend,
    /// Loans per month of the academic year.
    AcademicYearLoans,
    /// Books per category.
    CategoryDistribution,
    /// Books per publisher.
    PublisherDistribution,
    /// Books per status.
    BookStatusDistribution,
    /// Books per tag.
    TagDistribution,
    /// Expense amount per category.
    ExpenseDistribution,
    /// Paid fines against the unpaid estimate.
    FinesDistribution,
    /// Most borrowed books.
    PopularBooks,
    /// Most borrowed authors.
    MostReadAuthors,
    /// Users with the most loans.
    ActiveReaders,
    /// Classes with the most loans.
    TopClasses,
    /// Classes with the fewest loans.
    BottomClasses,
    /// Most claimed rewards.
    PopularRewards,
    /// Income, expense and remaining budget.
    BudgetSummary,
    /// Expenses per category, month against month.
    MonthComparison,
    /// Loan activity, category against category.
    CategoryComparison,
    /// Filtered, sorted, paged transaction table.
    Transactions,
}

impl ReportType {
    /// All report types.
    pub const ALL: [Self; 23] = [
        Self::Overview,
        Self::MonthlyLoans,
        Self::UserRegistrations,
        Self::FineCollections,
        Self::CollectionGrowth,
        Self::RewardClaimsTrend,
        Self::AcademicYearLoans,
        Self::CategoryDistribution,
        Self::PublisherDistribution,
        Self::BookStatusDistribution,
        Self::TagDistribution,
        Self::ExpenseDistribution,
        Self::FinesDistribution,
        Self::PopularBooks,
        Self::MostReadAuthors,
        Self::ActiveReaders,
        Self::TopClasses,
        Self::BottomClasses,
        Self::PopularRewards,
        Self::BudgetSummary,
        Self::MonthComparison,
        Self::CategoryComparison,
        Self::Transactions,
    ];

    /// Wire name, e.g. `monthly_loans`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::MonthlyLoans => "monthly_loans",
            Self::UserRegistrations => "user_registrations",
            Self::FineCollections => "fine_collections",
            Self::CollectionGrowth => "collection_growth",
            Self::RewardClaimsTrend => "reward_claims_trend",
            Self::AcademicYearLoans => "academic_year_loans",
            Self::CategoryDistribution => "category_distribution",
            Self::PublisherDistribution => "publisher_distribution",
            Self::BookStatusDistribution => "book_status_distribution",
            Self::TagDistribution => "tag_distribution",
            Self::ExpenseDistribution => "expense_distribution",
            Self::FinesDistribution => "fines_distribution",
            Self::PopularBooks => "popular_books",
            Self::MostReadAuthors => "most_read_authors",
            Self::ActiveReaders => "active_readers",
            Self::TopClasses => "top_classes",
            Self::BottomClasses => "bottom_classes",
            Self::PopularRewards => "popular_rewards",
            Self::BudgetSummary => "budget_summary",
            Self::MonthComparison => "month_comparison",
            Self::CategoryComparison => "category_comparison",
            Self::Transactions => "transactions",
        }
    }

    /// Report title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Overview => "Library Overview",
            Self::MonthlyLoans => "Monthly Loans",
            Self::UserRegistrations => "User Registrations",
            Self::FineCollections => "Fine Collections",
            Self::CollectionGrowth => "Collection Growth",
            Self::RewardClaimsTrend => "Reward Claims",
            Self::AcademicYearLoans => "Loans by Academic Month",
            Self::CategoryDistribution => "Books by Category",
            Self::PublisherDistribution => "Books by Publisher",
            Self::BookStatusDistribution => "Books by Status",
            Self::TagDistribution => "Books by Tag",
            Self::ExpenseDistribution => "Expenses by Category",
            Self::FinesDistribution => "Paid and Unpaid Fines",
            Self::PopularBooks => "Most Borrowed Books",
            Self::MostReadAuthors => "Most Read Authors",
            Self::ActiveReaders => "Most Active Readers",
            Self::TopClasses => "Most Active Classes",
            Self::BottomClasses => "Least Active Classes",
            Self::PopularRewards => "Most Claimed Rewards",
            Self::BudgetSummary => "Budget Summary",
            Self::MonthComparison => "Monthly Expense Comparison",
            Self::CategoryComparison => "Category Comparison",
            Self::Transactions => "Transactions",
        }
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReportError::UnknownReportType(wanted.to_string()))
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of one report run.
///
/// `as_of` is the explicit "now"; nothing else in a run reads the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Report to build.
    pub report_type: ReportType,
    /// Reference instant.
    pub as_of: DateTime<Utc>,
    /// Selected month, for academic-year and month-scoped reports.
    pub month: Option<YearMonth>,
    /// Inclusive local date range.
    pub date_range: Option<DateRange>,
    /// Category filter.
    pub category: Option<String>,
    /// Class or cohort filter.
    pub class: Option<String>,
    /// Free-text search over transaction descriptions.
    pub search: Option<String>,
    /// Left side of a comparison.
    pub left: Option<String>,
    /// Right side of a comparison.
    pub right: Option<String>,
    /// Sort for tabular reports.
    pub sort: Option<SortSpec>,
    /// Page for tabular reports.
    pub page: Option<PageRequest>,
    /// How tag shares are measured.
    #[serde(default)]
    pub tag_share: TagShare,
}

impl ReportRequest {
    /// Creates a request with no filters.
    #[must_use]
    pub const fn new(report_type: ReportType, as_of: DateTime<Utc>) -> Self {
        Self {
            report_type,
            as_of,
            month: None,
            date_range: None,
            category: None,
            class: None,
            search: None,
            left: None,
            right: None,
            sort: None,
            page: None,
            tag_share: TagShare::OfOccurrences,
        }
    }

    /// Builds a date range, rejecting inverted ends.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` if `start > end`.
    pub fn date_range_of(start: NaiveDate, end: NaiveDate) -> Result<DateRange, ReportError> {
        DateRange::new(start, end).ok_or(ReportError::InvalidDateRange { start, end })
    }

    /// Parses a `YYYY-MM` month.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidMonth` for anything else.
    pub fn month_of(raw: &str) -> Result<YearMonth, ReportError> {
        YearMonth::parse(raw).ok_or_else(|| ReportError::InvalidMonth(raw.to_string()))
    }
}

/// One row of the transaction table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    /// Transaction ID.
    pub id: String,
    /// Local booking date.
    pub date: NaiveDate,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// Category.
    pub category: String,
    /// Description.
    pub description: String,
    /// Amount.
    pub amount: Decimal,
}

impl TableRow for TransactionRow {
    fn field(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(FieldValue::Text(self.id.clone())),
            "date" => Some(FieldValue::Date(self.date)),
            "type" => Some(FieldValue::Text(self.transaction_type.clone())),
            "category" => Some(FieldValue::Text(self.category.clone())),
            "description" => Some(FieldValue::Text(self.description.clone())),
            "amount" => Some(FieldValue::Number(self.amount)),
            _ => None,
        }
    }
}

/// Payload of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    /// KPIs or a bucketed series.
    Metrics(Vec<Metric>),
    /// Grouped shares.
    Distribution(Vec<DistributionEntry>),
    /// Ranked groups.
    Ranking(Vec<RankingEntry>),
    /// Two evaluated sides.
    Comparison(ComparisonResult),
    /// Budget figures.
    Budget(BudgetSummary),
    /// A page of transactions.
    Transactions(PageResponse<TransactionRow>),
}

/// What the report ran against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    /// Date range in effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Category in effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Class in effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Search text in effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Side information attached to every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Reference instant of the run.
    pub as_of: DateTime<Utc>,
    /// Non-fatal observations about the data.
    pub advisories: Vec<Advisory>,
    /// Trend, prediction and summary for series reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<SeriesAnalytics>,
    /// Records excluded for unusable timestamps.
    pub dropped: usize,
    /// Filters in effect.
    pub filters: AppliedFilters,
}

/// An assembled report, ready for rendering or export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report type.
    pub report_type: ReportType,
    /// Title.
    pub title: String,
    /// Payload.
    pub data: ReportData,
    /// Group labels for table and chart headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Period labels for series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_labels: Option<Vec<String>>,
    /// Side information.
    pub metadata: ReportMetadata,
}
