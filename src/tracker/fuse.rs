use crate::tracker::domain::{AccountProfile, MetricBlock};
use crate::tracker::scheme::{AccountMetrics, SchemeMeta};
use crate::tracker::table::{Cell, TrackerTable};
use chrono::NaiveDate;

const IDENTITY_COLUMNS: [&str; 11] = [
    "schemeId",
    "schemeName",
    "schemeType",
    "schemePeriodFrom",
    "schemePeriodTo",
    "mandatoryQualify",
    "account",
    "state",
    "salesOfficer",
    "region",
    "customerName",
];

const METRIC_COLUMNS: [&str; 6] = [
    "base1VolumeFinal",
    "base2VolumeFinal",
    "totalVolume",
    "base1ValueFinal",
    "base2ValueFinal",
    "totalValue",
];

const ADDITIONAL_META_COLUMNS: [&str; 3] = ["schemeName", "schemeType", "mandatoryQualify"];

/// Scheme-level metadata replicated into every row of the result.
#[derive(Debug, Clone)]
pub struct MainSchemeContext {
    pub scheme_id: String,
    pub meta: SchemeMeta,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
}

/// The canonical column layout for a result carrying `additional_count`
/// additional schemes: main identity and metric block first, then one
/// contiguous `_p{i}` group per additional scheme in declared order.
pub fn canonical_columns(additional_count: usize) -> Vec<String> {
    let mut columns: Vec<String> = IDENTITY_COLUMNS
        .iter()
        .chain(METRIC_COLUMNS.iter())
        .map(|column| column.to_string())
        .collect();

    for index in 1..=additional_count {
        for column in ADDITIONAL_META_COLUMNS.iter().chain(METRIC_COLUMNS.iter()) {
            columns.push(format!("{column}_p{index}"));
        }
    }

    columns
}

/// Fuses the main-scheme metrics with the additional-scheme sub-results
/// into one wide row per account.
///
/// The main table establishes the row universe. A `None` sub-result (failed
/// or timed-out task) contributes zero numerics under the scheme's declared
/// metadata. A `None` main result collapses the whole table to its headers.
pub fn fuse(
    main: &MainSchemeContext,
    accounts: &[AccountProfile],
    main_metrics: Option<&AccountMetrics>,
    additional: &[(SchemeMeta, Option<AccountMetrics>)],
) -> TrackerTable {
    let mut table = TrackerTable::empty(canonical_columns(additional.len()));

    let Some(main_metrics) = main_metrics else {
        return table;
    };

    for profile in accounts {
        let mut row = Vec::with_capacity(table.columns.len());

        row.push(Cell::text(main.scheme_id.clone()));
        row.push(Cell::text(main.meta.name.clone()));
        row.push(Cell::text(main.meta.scheme_type.label()));
        row.push(Cell::text(main.period_from.format("%Y-%m-%d").to_string()));
        row.push(Cell::text(main.period_to.format("%Y-%m-%d").to_string()));
        row.push(Cell::text(main.meta.mandatory_qualify.label()));
        row.push(Cell::text(profile.account.clone()));
        row.push(Cell::text(profile.state.clone()));
        row.push(Cell::text(profile.sales_officer.clone()));
        row.push(Cell::text(profile.region.clone()));
        row.push(Cell::text(profile.customer_name.clone()));

        push_metric_cells(
            &mut row,
            main_metrics.get(&profile.account).copied().unwrap_or_default(),
        );

        for (meta, metrics) in additional {
            row.push(Cell::text(meta.name.clone()));
            row.push(Cell::text(meta.scheme_type.label()));
            row.push(Cell::text(meta.mandatory_qualify.label()));

            let block = metrics
                .as_ref()
                .and_then(|metrics| metrics.get(&profile.account).copied())
                .unwrap_or_default();
            push_metric_cells(&mut row, block);
        }

        table.push_row(row);
    }

    let canonical = canonical_columns(additional.len());
    table.reorder(&canonical)
}

fn push_metric_cells(row: &mut Vec<Cell>, block: MetricBlock) {
    row.push(Cell::Number(block.base1_volume));
    row.push(Cell::Number(block.base2_volume));
    row.push(Cell::Number(block.total_volume));
    row.push(Cell::Number(block.base1_value));
    row.push(Cell::Number(block.base2_value));
    row.push(Cell::Number(block.total_value));
}
