//! Report assembly service.

use rust_decimal::Decimal;
use shelfwise_shared::AnalyticsConfig;
use shelfwise_shared::types::PageRequest;
use tracing::debug;

use super::error::ReportError;
use super::types::{
    AppliedFilters, Report, ReportData, ReportMetadata, ReportRequest, ReportType, TransactionRow,
};
use crate::budget::BudgetLedger;
use crate::compare::{Comparator, ExpenseBreakdown, LoanActivity, SideSpec};
use crate::events::directory::label;
use crate::events::{
    Directory, Event, EventNormalizer, LoanClock, Normalized, RawBook, Snapshot,
};
use crate::metrics::{
    Advisory, Aggregation, DistributionEntry, Metric, MetricComputer, SeriesAnalytics, shares,
};
use crate::period::{Bucket, YearMonth};
use crate::ranking::{RankingEngine, RankingEntry};
use crate::table::{Predicate, SortDirection, SortSpec, view};

/// Builds reports from a snapshot.
///
/// Stateless between calls: the same snapshot and request always give the
/// same report.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    config: AnalyticsConfig,
    normalizer: EventNormalizer,
    metrics: MetricComputer,
    ledger: BudgetLedger,
    comparator: Comparator,
}

/// Report parts before metadata is attached.
struct Draft {
    data: ReportData,
    categories: Option<Vec<String>>,
    period_labels: Option<Vec<String>>,
    advisories: Vec<Advisory>,
    analytics: Option<SeriesAnalytics>,
    dropped: usize,
}

impl Draft {
    const fn new(data: ReportData) -> Self {
        Self {
            data,
            categories: None,
            period_labels: None,
            advisories: Vec::new(),
            analytics: None,
            dropped: 0,
        }
    }
}

impl ReportAssembler {
    /// Creates an assembler from the analytics configuration.
    #[must_use]
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            config: config.clone(),
            normalizer: EventNormalizer::new(config.timezone),
            metrics: MetricComputer::new(config),
            ledger: BudgetLedger::new(config),
            comparator: Comparator::new(config.timezone),
        }
    }

    /// Assembles the requested report.
    ///
    /// # Errors
    ///
    /// Returns a `ReportError` when the request is invalid. Validation runs
    /// before any aggregation.
    pub fn assemble(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
    ) -> Result<Report, ReportError> {
        Self::validate(request)?;

        let directory = Directory::new(snapshot);
        let draft = match request.report_type {
            ReportType::Overview => self.overview(snapshot, request, &directory),
            ReportType::MonthlyLoans => {
                let loans = self.loans(snapshot, request, &directory, LoanClock::Borrowed);
                self.trailing_series(request, loans, Aggregation::Count, "count")
            }
            ReportType::UserRegistrations => {
                let users = self.registrations(snapshot, request);
                self.trailing_series(request, users, Aggregation::Count, "count")
            }
            ReportType::FineCollections => {
                let fines = self.loans(snapshot, request, &directory, LoanClock::FinePaid);
                self.trailing_series(request, fines, Aggregation::Sum, "TRY")
            }
            ReportType::CollectionGrowth => {
                let books = self.catalog(snapshot, request);
                self.trailing_series(request, books, Aggregation::Count, "count")
            }
            ReportType::RewardClaimsTrend => {
                let claims = self.normalizer.reward_claims(snapshot);
                self.trailing_series(request, claims, Aggregation::Count, "count")
            }
            ReportType::AcademicYearLoans => self.academic_year_loans(snapshot, request, &directory),
            ReportType::CategoryDistribution => {
                self.book_distribution(snapshot, request, |book| label(book.category.as_deref()), true)
            }
            ReportType::PublisherDistribution => {
                self.book_distribution(snapshot, request, |book| label(book.publisher.as_deref()), false)
            }
            ReportType::BookStatusDistribution => {
                self.book_distribution(snapshot, request, |book| label(book.status.as_deref()), false)
            }
            ReportType::TagDistribution => self.tag_distribution(snapshot, request),
            ReportType::ExpenseDistribution => self.expense_distribution(snapshot, request),
            ReportType::FinesDistribution => self.fines_distribution(snapshot, request),
            ReportType::PopularBooks => self.loan_ranking(
                snapshot,
                request,
                &directory,
                |_, event| event.ref_id.clone(),
                |d, id| d.book_title(id),
            ),
            ReportType::MostReadAuthors => self.loan_ranking(
                snapshot,
                request,
                &directory,
                |d, event| Some(d.book_author(event.ref_id.as_deref())),
                |_, author| label(author),
            ),
            ReportType::ActiveReaders => self.loan_ranking(
                snapshot,
                request,
                &directory,
                |_, event| event.actor_id.clone(),
                |d, id| d.user_name(id),
            ),
            ReportType::TopClasses => self.class_ranking(snapshot, request, &directory, true),
            ReportType::BottomClasses => self.class_ranking(snapshot, request, &directory, false),
            ReportType::PopularRewards => self.popular_rewards(snapshot, request),
            ReportType::BudgetSummary => self.budget_summary(snapshot, request),
            ReportType::MonthComparison => self.month_comparison(snapshot, request)?,
            ReportType::CategoryComparison => {
                self.category_comparison(snapshot, request, &directory)?
            }
            ReportType::Transactions => self.transactions(snapshot, request),
        };

        if draft.dropped > 0 {
            debug!(
                report_type = %request.report_type,
                dropped = draft.dropped,
                "Excluded records without a usable timestamp"
            );
        }

        Ok(Report {
            report_type: request.report_type,
            title: request.report_type.title().to_string(),
            data: draft.data,
            categories: draft.categories,
            period_labels: draft.period_labels,
            metadata: ReportMetadata {
                as_of: request.as_of,
                advisories: draft.advisories,
                analytics: draft.analytics,
                dropped: draft.dropped,
                filters: AppliedFilters {
                    date_range: request.date_range,
                    category: request.category.clone(),
                    class: request.class.clone(),
                    search: request.search.clone(),
                },
            },
        })
    }

    fn validate(request: &ReportRequest) -> Result<(), ReportError> {
        if let Some(page) = request.page {
            if page.page < 1 {
                return Err(ReportError::InvalidPage(page.page));
            }
            if page.per_page == 0 {
                return Err(ReportError::InvalidPageSize(page.per_page));
            }
        }
        Ok(())
    }

    /// The month a month-scoped report looks at.
    fn selected_month(&self, request: &ReportRequest) -> YearMonth {
        request
            .month
            .unwrap_or_else(|| YearMonth::of(request.as_of, self.config.timezone))
    }

    fn in_range(&self, request: &ReportRequest, event: &Event) -> bool {
        request
            .date_range
            .is_none_or(|range| range.contains(event.timestamp, self.config.timezone))
    }

    /// Loans on one clock, tagged with their book's category and narrowed
    /// by the class and category filters.
    fn loans(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
        directory: &Directory<'_>,
        clock: LoanClock,
    ) -> Normalized {
        let mut normalized = self.normalizer.loans(snapshot, clock);
        for event in &mut normalized.events {
            event.category = Some(directory.book_category(event.ref_id.as_deref()));
        }
        normalized.events.retain(|event| {
            request
                .class
                .as_deref()
                .is_none_or(|class| directory.user_class(event.actor_id.as_deref()) == class)
                && request
                    .category
                    .as_deref()
                    .is_none_or(|category| event.category.as_deref() == Some(category))
        });
        normalized
    }

    fn registrations(&self, snapshot: &Snapshot, request: &ReportRequest) -> Normalized {
        let mut normalized = self.normalizer.registrations(snapshot);
        if let Some(class) = request.class.as_deref() {
            normalized
                .events
                .retain(|event| label(event.category.as_deref()) == class);
        }
        normalized
    }

    fn catalog(&self, snapshot: &Snapshot, request: &ReportRequest) -> Normalized {
        let mut normalized = self.normalizer.catalog_adds(snapshot);
        if let Some(category) = request.category.as_deref() {
            normalized
                .events
                .retain(|event| label(event.category.as_deref()) == category);
        }
        normalized
    }

    fn transaction_events(&self, snapshot: &Snapshot, request: &ReportRequest) -> Normalized {
        let mut normalized = self.normalizer.transactions(snapshot);
        normalized.events.retain(|event| {
            self.in_range(request, event)
                && request
                    .category
                    .as_deref()
                    .is_none_or(|category| label(event.category.as_deref()) == category)
        });
        normalized
    }

    fn overview(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
        directory: &Directory<'_>,
    ) -> Draft {
        let period = request
            .date_range
            .unwrap_or_else(|| self.selected_month(request).range());
        let loans = self.loans(snapshot, request, directory, LoanClock::Borrowed);
        let loans_in_period = loans
            .events
            .iter()
            .filter(|event| period.contains(event.timestamp, self.config.timezone))
            .count();
        let fines = self.ledger.fine_summary(&snapshot.loans, request.as_of);
        let lost_books = snapshot
            .books
            .iter()
            .filter(|book| {
                book.status
                    .as_deref()
                    .is_some_and(|status| status.eq_ignore_ascii_case("lost"))
            })
            .count();

        let mut draft = Draft::new(ReportData::Metrics(vec![
            Metric::new("total_users", Decimal::from(snapshot.users.len())).with_unit("count"),
            Metric::new("total_books", Decimal::from(snapshot.books.len())).with_unit("count"),
            Metric::new("loans", Decimal::from(loans_in_period)).with_unit("count"),
            Metric::new("overdue_loans", Decimal::from(fines.overdue_loans)).with_unit("count"),
            Metric::new("unpaid_fines", fines.unpaid_estimate).with_unit("TRY"),
            Metric::new("paid_fines", fines.paid).with_unit("TRY"),
            Metric::new("lost_books", Decimal::from(lost_books)).with_unit("count"),
        ]));
        draft.period_labels = Some(vec![period.to_string()]);
        draft.dropped = loans.dropped;
        draft
    }

    fn trailing_series(
        &self,
        request: &ReportRequest,
        normalized: Normalized,
        aggregation: Aggregation,
        unit: &str,
    ) -> Draft {
        let buckets = self
            .metrics
            .bucketer()
            .trailing(request.as_of, self.config.trailing_months);
        self.series(&buckets, &normalized, aggregation, unit)
    }

    fn academic_year_loans(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
        directory: &Directory<'_>,
    ) -> Draft {
        let buckets = self
            .metrics
            .bucketer()
            .academic_year(self.selected_month(request));
        let loans = self.loans(snapshot, request, directory, LoanClock::Borrowed);
        self.series(&buckets, &loans, Aggregation::Count, "count")
    }

    fn series(
        &self,
        buckets: &[Bucket],
        normalized: &Normalized,
        aggregation: Aggregation,
        unit: &str,
    ) -> Draft {
        let values = self
            .metrics
            .per_bucket(&normalized.events, buckets, |_| true, aggregation);

        let mut draft = Draft::new(ReportData::Metrics(MetricComputer::series(
            buckets, &values, unit,
        )));
        draft.period_labels = Some(buckets.iter().map(|bucket| bucket.label.clone()).collect());
        draft.analytics = Some(self.metrics.analyze(&values));
        draft.dropped = normalized.dropped;
        draft
    }

    /// Books narrowed by the category filter and, when a date range is
    /// given, by the date they entered the catalog.
    fn books<'a>(
        &self,
        snapshot: &'a Snapshot,
        request: &ReportRequest,
    ) -> Vec<&'a RawBook> {
        snapshot
            .books
            .iter()
            .filter(|book| {
                request
                    .category
                    .as_deref()
                    .is_none_or(|category| label(book.category.as_deref()) == category)
            })
            .filter(|book| {
                request.date_range.is_none_or(|range| {
                    self.normalizer
                        .catalog_add(book)
                        .is_some_and(|event| range.contains(event.timestamp, self.config.timezone))
                })
            })
            .collect()
    }

    fn book_distribution<K>(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
        key: K,
        check_stock: bool,
    ) -> Draft
    where
        K: Fn(&RawBook) -> String,
    {
        let books = self.books(snapshot, request);
        let entries = MetricComputer::distribution(&books, |book| key(*book), |_| Decimal::ONE);
        self.distribution_draft(entries, check_stock)
    }

    fn tag_distribution(&self, snapshot: &Snapshot, request: &ReportRequest) -> Draft {
        let books = self.books(snapshot, request);
        let entries =
            MetricComputer::tag_distribution(&books, |book| book.tags.as_slice(), request.tag_share);
        self.distribution_draft(entries, false)
    }

    fn expense_distribution(&self, snapshot: &Snapshot, request: &ReportRequest) -> Draft {
        let normalized = self.transaction_events(snapshot, request);
        let expenses: Vec<&Event> = normalized.events.iter().filter(|e| e.is_expense()).collect();
        let entries = MetricComputer::distribution(
            &expenses,
            |event| label(event.category.as_deref()),
            |event| event.amount,
        );

        let mut draft = self.distribution_draft(entries, false);
        draft.dropped = normalized.dropped;
        draft
    }

    fn fines_distribution(&self, snapshot: &Snapshot, request: &ReportRequest) -> Draft {
        let fines = self.ledger.fine_summary(&snapshot.loans, request.as_of);
        let total = fines.paid.saturating_add(fines.unpaid_estimate);
        let counts = [fines.paid, fines.unpaid_estimate];
        let entries = ["paid", "unpaid"]
            .into_iter()
            .zip(counts)
            .zip(shares(&counts, total))
            .map(|((name, count), percentage)| DistributionEntry {
                name: name.to_string(),
                count,
                percentage,
            })
            .collect();

        let mut draft = Draft::new(ReportData::Distribution(entries));
        draft.categories = Some(vec!["paid".to_string(), "unpaid".to_string()]);
        draft
    }

    fn distribution_draft(&self, entries: Vec<DistributionEntry>, check_stock: bool) -> Draft {
        let advisories = self.metrics.advisories(&entries, check_stock);
        let categories = entries.iter().map(|entry| entry.name.clone()).collect();

        let mut draft = Draft::new(ReportData::Distribution(entries));
        draft.categories = Some(categories);
        draft.advisories = advisories;
        draft
    }

    /// Ranks loans grouped by `key`; `resolve` turns a winning key into its label.
    ///
    /// Keys are entity ids where the entity has one, so two users or books
    /// sharing a name stay apart.
    fn loan_ranking<K, R>(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
        directory: &Directory<'_>,
        key: K,
        resolve: R,
    ) -> Draft
    where
        K: Fn(&Directory<'_>, &Event) -> Option<String>,
        R: Fn(&Directory<'_>, Option<&str>) -> String,
    {
        let loans = self.loans(snapshot, request, directory, LoanClock::Borrowed);
        let groups = RankingEngine::tally(
            loans
                .events
                .iter()
                .filter(|event| self.in_range(request, event))
                .map(|event| key(directory, event).unwrap_or_default()),
        );
        let entries = RankingEngine::top_n(&groups, self.config.top_n)
            .into_iter()
            .map(|entry| RankingEntry {
                label: resolve(directory, Some(entry.label.as_str()).filter(|id| !id.is_empty())),
                ..entry
            })
            .collect();
        Self::ranking_draft(entries, loans.dropped)
    }

    /// Loans per class. Every class that has users is ranked, even with no loans.
    fn class_ranking(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
        directory: &Directory<'_>,
        top: bool,
    ) -> Draft {
        let loans = self.loans(snapshot, request, directory, LoanClock::Borrowed);
        let seeded = snapshot
            .users
            .iter()
            .filter(|user| user.student_class.is_some())
            .map(|user| (label(user.student_class.as_deref()), Decimal::ZERO));
        let counted = loans
            .events
            .iter()
            .filter(|event| self.in_range(request, event))
            .map(|event| (directory.user_class(event.actor_id.as_deref()), Decimal::ONE));
        let groups = RankingEngine::accumulate(seeded.chain(counted));

        let n = self.config.class_rank_n;
        let entries = if top {
            RankingEngine::top_n(&groups, n)
        } else {
            RankingEngine::bottom_n(&groups, n)
        };
        Self::ranking_draft(entries, loans.dropped)
    }

    fn popular_rewards(&self, snapshot: &Snapshot, request: &ReportRequest) -> Draft {
        let claims = self.normalizer.reward_claims(snapshot);
        let groups = RankingEngine::tally(
            claims
                .events
                .iter()
                .filter(|event| self.in_range(request, event))
                .map(|event| label(event.category.as_deref())),
        );
        Self::ranking_draft(RankingEngine::top_n(&groups, self.config.top_n), claims.dropped)
    }

    fn ranking_draft(entries: Vec<RankingEntry>, dropped: usize) -> Draft {
        let categories = entries.iter().map(|entry| entry.label.clone()).collect();
        let mut draft = Draft::new(ReportData::Ranking(entries));
        draft.categories = Some(categories);
        draft.dropped = dropped;
        draft
    }

    fn budget_summary(&self, snapshot: &Snapshot, request: &ReportRequest) -> Draft {
        let normalized = self.transaction_events(snapshot, request);
        let carry_over = BudgetLedger::carry_over_from_fines(&snapshot.loans);
        let summary = BudgetLedger::compute_summary(&normalized.events, carry_over);

        let mut draft = Draft::new(ReportData::Budget(summary));
        draft.dropped = normalized.dropped;
        draft
    }

    /// Expenses per category for two months. Defaults to the selected month
    /// against the month before it.
    fn month_comparison(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
    ) -> Result<Draft, ReportError> {
        let right = match request.right.as_deref() {
            Some(raw) => ReportRequest::month_of(raw)?,
            None => self.selected_month(request),
        };
        let left = match request.left.as_deref() {
            Some(raw) => ReportRequest::month_of(raw)?,
            None => right.minus_months(1),
        };

        let mut normalized = self.normalizer.transactions(snapshot);
        if let Some(category) = request.category.as_deref() {
            normalized
                .events
                .retain(|event| label(event.category.as_deref()) == category);
        }

        let result = self.comparator.compare(
            &normalized.events,
            &SideSpec::period(left.to_string(), left.range()),
            &SideSpec::period(right.to_string(), right.range()),
            &ExpenseBreakdown,
        );

        let categories = result.left.metrics.iter().map(|m| m.name.clone()).collect();
        let mut draft = Draft::new(ReportData::Comparison(result));
        draft.categories = Some(categories);
        draft.period_labels = Some(vec![left.to_string(), right.to_string()]);
        draft.dropped = normalized.dropped;
        Ok(draft)
    }

    /// Loan activity for two book categories over the same loans.
    fn category_comparison(
        &self,
        snapshot: &Snapshot,
        request: &ReportRequest,
        directory: &Directory<'_>,
    ) -> Result<Draft, ReportError> {
        let left = request
            .left
            .as_deref()
            .ok_or(ReportError::MissingParameter("left"))?;
        let right = request
            .right
            .as_deref()
            .ok_or(ReportError::MissingParameter("right"))?;

        let mut loans = self.normalizer.loans(snapshot, LoanClock::Borrowed);
        for event in &mut loans.events {
            event.category = Some(directory.book_category(event.ref_id.as_deref()));
        }
        loans.events.retain(|event| {
            self.in_range(request, event)
                && request
                    .class
                    .as_deref()
                    .is_none_or(|class| directory.user_class(event.actor_id.as_deref()) == class)
        });

        let result = self.comparator.compare(
            &loans.events,
            &SideSpec::category(left),
            &SideSpec::category(right),
            &LoanActivity,
        );

        let mut draft = Draft::new(ReportData::Comparison(result));
        draft.categories = Some(vec![left.to_string(), right.to_string()]);
        draft.dropped = loans.dropped;
        Ok(draft)
    }

    /// The transaction table: filtered, sorted (newest first by default),
    /// then paged.
    fn transactions(&self, snapshot: &Snapshot, request: &ReportRequest) -> Draft {
        let mut dropped = 0;
        let mut rows: Vec<TransactionRow> = Vec::with_capacity(snapshot.transactions.len());
        for tx in &snapshot.transactions {
            let Some(event) = self.normalizer.transaction(tx) else {
                dropped += 1;
                continue;
            };
            rows.push(TransactionRow {
                id: tx.id.clone(),
                date: event
                    .timestamp
                    .with_timezone(&self.config.timezone)
                    .date_naive(),
                transaction_type: event.status.unwrap_or_default(),
                category: label(tx.category.as_deref()),
                description: tx.description.clone().unwrap_or_default(),
                amount: event.amount,
            });
        }

        let mut predicates = Vec::new();
        if let Some(range) = request.date_range {
            predicates.push(Predicate::DateRange {
                field: "date".to_string(),
                range,
            });
        }
        if let Some(category) = &request.category {
            predicates.push(Predicate::Equals {
                field: "category".to_string(),
                value: category.clone(),
            });
        }
        if let Some(search) = request.search.as_deref().filter(|text| !text.trim().is_empty()) {
            predicates.push(Predicate::Contains {
                field: "description".to_string(),
                needle: search.trim().to_string(),
            });
        }

        let sort = request
            .sort
            .clone()
            .unwrap_or_else(|| SortSpec::new("date", SortDirection::Desc));
        let page = request
            .page
            .unwrap_or_else(|| PageRequest::new(1, self.config.default_page_size));
        let paged = view(&rows, &predicates, Some(&sort), page);

        let mut draft = Draft::new(ReportData::Transactions(paged));
        draft.dropped = dropped;
        draft
    }
}
