use crate::tracker::domain::{AccountProfile, AggregationMethod, PeriodSpec, SaleRecord};
use std::collections::BTreeMap;

/// Volume and value sums for one account over one base window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    pub volume: f64,
    pub value: f64,
}

/// Aggregates one base window over an already material-scoped sales slice.
///
/// Every account in `accounts` gets an entry; accounts without in-window
/// sales stay at zero. The `average` method rescales sums by the window's
/// calendar-month count. No rounding happens here.
pub fn aggregate_period(
    sales: &[&SaleRecord],
    accounts: &[AccountProfile],
    period: &PeriodSpec,
) -> BTreeMap<String, PeriodTotals> {
    let mut totals: BTreeMap<String, PeriodTotals> = accounts
        .iter()
        .map(|profile| (profile.account.clone(), PeriodTotals::default()))
        .collect();

    for sale in sales {
        if !period.contains(sale.sale_date) {
            continue;
        }
        if let Some(entry) = totals.get_mut(&sale.account) {
            entry.volume += sale.volume;
            entry.value += sale.value;
        }
    }

    if period.method == AggregationMethod::Average {
        let months = period.month_span();
        if months > 0 {
            let divisor = f64::from(months);
            for entry in totals.values_mut() {
                entry.volume /= divisor;
                entry.value /= divisor;
            }
        }
    }

    totals
}
