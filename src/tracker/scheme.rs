use crate::tracker::aggregate::aggregate_period;
use crate::tracker::domain::{
    AccountProfile, CalculationMode, MandatoryQualify, MetricBlock, PeriodSpec, SaleRecord,
};
use crate::tracker::products::MaterialScope;
use std::collections::BTreeMap;

/// Labels attached to every row for one scheme (main or additional).
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeMeta {
    pub name: String,
    pub scheme_type: CalculationMode,
    pub mandatory_qualify: MandatoryQualify,
}

/// Per-account metric blocks for one scheme.
pub type AccountMetrics = BTreeMap<String, MetricBlock>;

/// Computes one scheme's metric blocks over both base windows.
///
/// Both metrics are always computed; the calculation mode only labels the
/// result. A missing second window is synthesized by replicating the first.
/// Derived totals take the rounded per-metric maximum across the bases.
pub fn calculate_scheme(
    sales: &[SaleRecord],
    accounts: &[AccountProfile],
    scope: &MaterialScope,
    base_periods: &[PeriodSpec],
) -> AccountMetrics {
    let scoped: Vec<&SaleRecord> = sales
        .iter()
        .filter(|sale| scope.matches(&sale.material))
        .collect();

    let base1 = base_periods
        .first()
        .map(|period| aggregate_period(&scoped, accounts, period))
        .unwrap_or_default();
    let base2 = base_periods
        .get(1)
        .map(|period| aggregate_period(&scoped, accounts, period));

    accounts
        .iter()
        .map(|profile| {
            let first = base1.get(&profile.account).copied().unwrap_or_default();
            let second = base2
                .as_ref()
                .map(|totals| totals.get(&profile.account).copied().unwrap_or_default())
                .unwrap_or(first);

            let block = MetricBlock::from_bases(
                first.volume,
                second.volume,
                first.value,
                second.value,
            );
            (profile.account.clone(), block)
        })
        .collect()
}
