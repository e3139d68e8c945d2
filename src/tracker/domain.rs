use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Placeholder for descriptive fields the sales ledger never supplied.
pub const UNKNOWN: &str = "Unknown";

/// One posted sales ledger line in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub account: String,
    pub material: String,
    pub sale_date: NaiveDate,
    pub volume: f64,
    pub value: f64,
    pub state: String,
    pub sales_officer: String,
    pub region: String,
    pub customer_name: String,
}

/// Descriptive identity of one participating credit account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountProfile {
    pub account: String,
    pub state: String,
    pub sales_officer: String,
    pub region: String,
    pub customer_name: String,
}

impl AccountProfile {
    /// Profile for an account that never appears in the sales ledger.
    pub fn unknown(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            state: UNKNOWN.to_string(),
            sales_officer: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            customer_name: UNKNOWN.to_string(),
        }
    }

    pub fn from_sale(sale: &SaleRecord) -> Self {
        Self {
            account: sale.account.clone(),
            state: sale.state.clone(),
            sales_officer: sale.sales_officer.clone(),
            region: sale.region.clone(),
            customer_name: sale.customer_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMethod {
    Sum,
    Average,
}

impl AggregationMethod {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "average" | "avg" => Some(Self::Average),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMode {
    Volume,
    Value,
}

impl CalculationMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Value => "value",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "volume" => Some(Self::Volume),
            "value" => Some(Self::Value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MandatoryQualify {
    Yes,
    No,
}

impl MandatoryQualify {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    /// Anything other than an explicit yes counts as no.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(raw) if raw.trim().eq_ignore_ascii_case("yes") => Self::Yes,
            _ => Self::No,
        }
    }
}

/// One historical base window. Both endpoints are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodSpec {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub method: AggregationMethod,
}

impl PeriodSpec {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }

    /// Calendar-month count of the window, endpoints inclusive. A window
    /// inside a single month spans one month.
    pub fn month_span(&self) -> i32 {
        month_span(self.from_date, self.to_date)
    }
}

pub fn month_span(from: NaiveDate, to: NaiveDate) -> i32 {
    use chrono::Datelike;
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32) + 1
}

/// Derived totals are kept as reals but rounded to whole units,
/// halves away from zero.
pub fn round_total(value: f64) -> f64 {
    value.round()
}

/// Per-account metric block for one scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricBlock {
    pub base1_volume: f64,
    pub base2_volume: f64,
    pub total_volume: f64,
    pub base1_value: f64,
    pub base2_value: f64,
    pub total_value: f64,
}

impl MetricBlock {
    /// Fills the derived totals from the two base windows. Totals take the
    /// per-metric maximum across the bases, rounded to whole units.
    pub fn from_bases(
        base1_volume: f64,
        base2_volume: f64,
        base1_value: f64,
        base2_value: f64,
    ) -> Self {
        Self {
            base1_volume,
            base2_volume,
            total_volume: round_total(base1_volume.max(base2_volume)),
            base1_value,
            base2_value,
            total_value: round_total(base1_value.max(base2_value)),
        }
    }
}

/// Lenient date parsing for external payloads: plain dates, RFC 3339
/// timestamps, and the date-time and day-first forms ledger exports carry.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn month_span_counts_both_endpoints() {
        assert_eq!(month_span(date(2024, 1, 1), date(2024, 3, 31)), 3);
        assert_eq!(month_span(date(2024, 1, 15), date(2024, 1, 20)), 1);
        assert_eq!(month_span(date(2023, 11, 1), date(2024, 2, 29)), 4);
    }

    #[test]
    fn period_contains_is_inclusive_on_both_ends() {
        let period = PeriodSpec {
            from_date: date(2024, 1, 1),
            to_date: date(2024, 2, 29),
            method: AggregationMethod::Sum,
        };
        assert!(period.contains(date(2024, 1, 1)));
        assert!(period.contains(date(2024, 2, 29)));
        assert!(!period.contains(date(2024, 3, 1)));
        assert!(!period.contains(date(2023, 12, 31)));
    }

    #[test]
    fn totals_take_rounded_maximum() {
        let block = MetricBlock::from_bases(100.4, 100.6, 10.0, 9.0);
        assert_eq!(block.total_volume, 101.0);
        assert_eq!(block.total_value, 10.0);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_total(0.5), 1.0);
        assert_eq!(round_total(1.5), 2.0);
        assert_eq!(round_total(2.4), 2.0);
    }

    #[test]
    fn parse_date_accepts_ledger_export_forms() {
        assert_eq!(parse_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T10:30:00Z"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 00:00:00"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15-01-2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("  "), None);
        assert_eq!(parse_date("not-a-date"), None);
    }

    #[test]
    fn mandatory_qualify_defaults_to_no() {
        assert_eq!(MandatoryQualify::parse(Some("YES")), MandatoryQualify::Yes);
        assert_eq!(MandatoryQualify::parse(Some("maybe")), MandatoryQualify::No);
        assert_eq!(MandatoryQualify::parse(None), MandatoryQualify::No);
    }
}
