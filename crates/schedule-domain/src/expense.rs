//! The `FixedExpense` aggregate and its append-only recurrence history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    common::{CurrencyCode, Identifiable, NamedEntity},
    range::{RangeError, RecurrenceRange},
};

#[derive(Debug, Clone, PartialEq, Error)]
/// Failures raised while building or mutating a [`FixedExpense`].
pub enum ExpenseError {
    #[error("range starting {start} must begin after {floor}")]
    InvalidRange { start: NaiveDate, floor: NaiveDate },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Range(#[from] RangeError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Where an expense is paid from: a bound account, or a bare currency.
pub enum FundingSource {
    Account(Uuid),
    Currency(CurrencyCode),
}

impl FundingSource {
    /// Builds the funding source from the pair of optional inputs. Exactly one must be set.
    pub fn from_parts(
        account: Option<Uuid>,
        currency: Option<CurrencyCode>,
    ) -> Result<Self, ExpenseError> {
        match (account, currency) {
            (Some(account), None) => Ok(FundingSource::Account(account)),
            (None, Some(currency)) => Ok(FundingSource::Currency(currency)),
            (Some(_), Some(_)) => Err(ExpenseError::Configuration(
                "expense cannot be bound to both an account and a currency".into(),
            )),
            (None, None) => Err(ExpenseError::Configuration(
                "expense requires either an account or a currency".into(),
            )),
        }
    }

    pub fn account(&self) -> Option<Uuid> {
        match self {
            FundingSource::Account(id) => Some(*id),
            FundingSource::Currency(_) => None,
        }
    }

    pub fn currency(&self) -> Option<&CurrencyCode> {
        match self {
            FundingSource::Account(_) => None,
            FundingSource::Currency(code) => Some(code),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which branch of the compaction rule `add_range` took.
pub enum RangeChange {
    /// The trailing range had never been reconciled and was overwritten.
    Replaced,
    /// The trailing range was in use; history grew by one.
    Appended,
}

/// Recurring financial obligation with a versioned history of recurrence rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixedExpense {
    id: Uuid,
    name: String,
    category_id: Uuid,
    funding: FundingSource,
    ranges: Vec<RecurrenceRange>,
    #[serde(default = "FixedExpense::default_enabled")]
    enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_reconciled_date: Option<NaiveDate>,
    #[serde(default)]
    version: u64,
}

impl FixedExpense {
    /// Creates an enabled expense with a single initial range.
    ///
    /// Exactly one of `account` and `currency` must be provided.
    pub fn new(
        name: impl Into<String>,
        category_id: Uuid,
        account: Option<Uuid>,
        currency: Option<CurrencyCode>,
        initial_range: RecurrenceRange,
    ) -> Result<Self, ExpenseError> {
        let funding = FundingSource::from_parts(account, currency)?;
        initial_range.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category_id,
            funding,
            ranges: vec![initial_range],
            enabled: true,
            last_reconciled_date: None,
            version: 0,
        })
    }

    pub fn category_id(&self) -> Uuid {
        self.category_id
    }

    pub fn funding(&self) -> &FundingSource {
        &self.funding
    }

    pub fn ranges(&self) -> &[RecurrenceRange] {
        &self.ranges
    }

    pub fn last_range(&self) -> Option<&RecurrenceRange> {
        self.ranges.last()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_reconciled_date(&self) -> Option<NaiveDate> {
        self.last_reconciled_date
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Index of the range with the greatest start date on or before `date`.
    pub fn effective_index(&self, date: NaiveDate) -> Option<usize> {
        let after = self.ranges.partition_point(|range| range.start_date() <= date);
        after.checked_sub(1)
    }

    /// Range governing `date`, or `None` when `date` precedes the first range.
    pub fn effective_range(&self, date: NaiveDate) -> Option<&RecurrenceRange> {
        self.effective_index(date).map(|index| &self.ranges[index])
    }

    /// Exclusive end of the range at `index`: the next range's start, or unbounded.
    pub fn effective_end(&self, index: usize) -> Option<NaiveDate> {
        self.ranges.get(index + 1).map(RecurrenceRange::start_date)
    }

    /// Whether any reconciliation record may reference the trailing range.
    pub fn last_range_in_use(&self) -> bool {
        match (self.last_reconciled_date, self.ranges.last()) {
            (Some(watermark), Some(last)) => watermark >= last.start_date(),
            _ => false,
        }
    }

    /// Adds a new version of the recurrence rule.
    ///
    /// The range must start after both the reconciliation watermark and the
    /// current trailing range. An unreconciled trailing range is replaced
    /// in place; a reconciled one is kept and the new range appended.
    pub fn add_range(&mut self, range: RecurrenceRange) -> Result<RangeChange, ExpenseError> {
        range.validate()?;
        let start = range.start_date();
        if let Some(watermark) = self.last_reconciled_date {
            if start <= watermark {
                return Err(ExpenseError::InvalidRange {
                    start,
                    floor: watermark,
                });
            }
        }
        if let Some(last) = self.ranges.last() {
            if start <= last.start_date() {
                return Err(ExpenseError::InvalidRange {
                    start,
                    floor: last.start_date(),
                });
            }
        }

        let in_use = self.last_range_in_use();
        let change = match self.ranges.last_mut() {
            Some(slot) if !in_use => {
                *slot = range;
                RangeChange::Replaced
            }
            _ => {
                self.ranges.push(range);
                RangeChange::Appended
            }
        };
        self.version += 1;
        Ok(change)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.version += 1;
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name;
            self.version += 1;
        }
    }

    pub fn set_category(&mut self, category_id: Uuid) {
        if self.category_id != category_id {
            self.category_id = category_id;
            self.version += 1;
        }
    }

    /// Advances the watermark to `date` if it is later than the current one.
    pub fn record_reconciliation(&mut self, date: NaiveDate) {
        if self.last_reconciled_date.map_or(true, |current| date > current) {
            self.last_reconciled_date = Some(date);
            self.version += 1;
        }
    }

    /// Resets the watermark to the latest of `dates`, e.g. after a reconciliation was reverted.
    pub fn recompute_watermark<I>(&mut self, dates: I)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let latest = dates.into_iter().max();
        if latest != self.last_reconciled_date {
            self.last_reconciled_date = latest;
            self.version += 1;
        }
    }

    /// Re-checks every aggregate invariant, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ExpenseError> {
        if self.ranges.is_empty() {
            return Err(ExpenseError::Configuration(format!(
                "expense {} has no recurrence ranges",
                self.id
            )));
        }
        for range in &self.ranges {
            range.validate()?;
        }
        for pair in self.ranges.windows(2) {
            if pair[1].start_date() <= pair[0].start_date() {
                return Err(ExpenseError::InvalidRange {
                    start: pair[1].start_date(),
                    floor: pair[0].start_date(),
                });
            }
        }
        Ok(())
    }

    pub fn default_enabled() -> bool {
        true
    }
}

impl Identifiable for FixedExpense {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for FixedExpense {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::AmountMode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(amount: f64, day: u32, start: NaiveDate) -> RecurrenceRange {
        RecurrenceRange::monthly(AmountMode::Fixed { amount }, day, start).unwrap()
    }

    fn rent() -> FixedExpense {
        FixedExpense::new(
            "Rent",
            Uuid::new_v4(),
            None,
            Some(CurrencyCode::new("EUR")),
            monthly(900.0, 1, date(2025, 1, 1)),
        )
        .unwrap()
    }

    #[test]
    fn funding_requires_exactly_one_source() {
        let range = monthly(10.0, 1, date(2025, 1, 1));
        let neither = FixedExpense::new("X", Uuid::new_v4(), None, None, range);
        assert!(matches!(neither, Err(ExpenseError::Configuration(_))));

        let both = FixedExpense::new(
            "X",
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            Some(CurrencyCode::new("USD")),
            range,
        );
        assert!(matches!(both, Err(ExpenseError::Configuration(_))));
    }

    #[test]
    fn effective_range_picks_latest_start_on_or_before() {
        let mut expense = rent();
        expense.record_reconciliation(date(2025, 5, 1));
        expense.add_range(monthly(950.0, 1, date(2025, 6, 1))).unwrap();

        assert!(expense.effective_range(date(2024, 12, 31)).is_none());
        assert_eq!(
            expense.effective_range(date(2025, 5, 31)).unwrap().amount(),
            AmountMode::Fixed { amount: 900.0 }
        );
        assert_eq!(
            expense.effective_range(date(2025, 6, 1)).unwrap().amount(),
            AmountMode::Fixed { amount: 950.0 }
        );
        assert_eq!(expense.effective_end(0), Some(date(2025, 6, 1)));
        assert_eq!(expense.effective_end(1), None);
    }

    #[test]
    fn add_range_rejects_dates_at_or_before_watermark() {
        let mut expense = rent();
        expense.record_reconciliation(date(2025, 3, 1));
        let before = expense.clone();

        let err = expense
            .add_range(monthly(950.0, 1, date(2025, 3, 1)))
            .unwrap_err();
        assert!(matches!(err, ExpenseError::InvalidRange { .. }));
        assert_eq!(expense, before);
    }

    #[test]
    fn add_range_rejects_dates_at_or_before_last_start() {
        let mut expense = rent();
        let err = expense
            .add_range(monthly(950.0, 1, date(2025, 1, 1)))
            .unwrap_err();
        assert_eq!(
            err,
            ExpenseError::InvalidRange {
                start: date(2025, 1, 1),
                floor: date(2025, 1, 1)
            }
        );
        assert_eq!(expense.version(), 0);
    }

    #[test]
    fn unused_initial_range_is_replaced() {
        let mut expense = rent();
        assert_eq!(
            expense.add_range(monthly(950.0, 1, date(2025, 3, 1))).unwrap(),
            RangeChange::Replaced
        );
        assert_eq!(expense.ranges().len(), 1);
        assert_eq!(expense.ranges()[0].start_date(), date(2025, 3, 1));
        assert_eq!(expense.version(), 1);
    }

    #[test]
    fn unused_trailing_range_is_replaced() {
        let mut expense = rent();
        expense.record_reconciliation(date(2025, 2, 1));
        assert_eq!(
            expense.add_range(monthly(950.0, 1, date(2025, 6, 1))).unwrap(),
            RangeChange::Appended
        );
        assert_eq!(expense.ranges().len(), 2);

        // Nothing reconciled on or after June yet, so the June rule is replaced.
        assert_eq!(
            expense.add_range(monthly(975.0, 1, date(2025, 7, 1))).unwrap(),
            RangeChange::Replaced
        );
        assert_eq!(expense.ranges().len(), 2);
        assert_eq!(expense.last_range().unwrap().start_date(), date(2025, 7, 1));
        assert_eq!(expense.ranges()[0].start_date(), date(2025, 1, 1));
    }

    #[test]
    fn used_trailing_range_is_kept() {
        let mut expense = rent();
        expense.record_reconciliation(date(2025, 5, 1));
        expense.add_range(monthly(950.0, 1, date(2025, 6, 1))).unwrap();
        expense.record_reconciliation(date(2025, 6, 1));

        assert_eq!(
            expense.add_range(monthly(975.0, 1, date(2025, 7, 1))).unwrap(),
            RangeChange::Appended
        );
        assert_eq!(expense.ranges().len(), 3);
    }

    #[test]
    fn mutations_bump_version_only_on_change() {
        let mut expense = rent();
        expense.set_enabled(true);
        assert_eq!(expense.version(), 0);
        expense.set_enabled(false);
        assert_eq!(expense.version(), 1);
        expense.rename("Rent");
        assert_eq!(expense.version(), 1);
        expense.rename("Flat rent");
        assert_eq!(expense.version(), 2);
    }

    #[test]
    fn set_category_bumps_version_only_on_change() {
        let mut expense = rent();
        let original = expense.category_id();
        expense.set_category(original);
        assert_eq!(expense.version(), 0);

        let housing = Uuid::new_v4();
        expense.set_category(housing);
        assert_eq!(expense.category_id(), housing);
        assert_eq!(expense.version(), 1);
        expense.set_category(housing);
        assert_eq!(expense.version(), 1);
    }

    #[test]
    fn watermark_only_moves_forward_unless_recomputed() {
        let mut expense = rent();
        expense.record_reconciliation(date(2025, 4, 1));
        expense.record_reconciliation(date(2025, 2, 1));
        assert_eq!(expense.last_reconciled_date(), Some(date(2025, 4, 1)));

        expense.recompute_watermark(vec![date(2025, 1, 1), date(2025, 2, 1)]);
        assert_eq!(expense.last_reconciled_date(), Some(date(2025, 2, 1)));

        expense.recompute_watermark(Vec::new());
        assert_eq!(expense.last_reconciled_date(), None);
    }

    #[test]
    fn validate_detects_unordered_history() {
        let expense = rent();
        let mut json = serde_json::to_value(&expense).unwrap();
        let first = json["ranges"][0].clone();
        json["ranges"].as_array_mut().unwrap().push(first);
        let broken: FixedExpense = serde_json::from_value(json).unwrap();
        assert!(matches!(
            broken.validate(),
            Err(ExpenseError::InvalidRange { .. })
        ));
    }
}
