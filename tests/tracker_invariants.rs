use incentive_tracker::tracker::{
    canonical_columns, RunConfig, SalesPayload, SaleRecord, SchemeSpec, TrackerEngine,
    TrackerRun,
};
use std::collections::HashSet;
use std::io::Cursor;

const SALES_CSV: &str = "\
credit_account,material,sale_date,volume,value,state_name,so_name,region_name,customer_name
936878,mat1,2024-01-15,100.5,1000.25,KA,Asha,South,Acme Paints
936878,mat2,2024-02-01,30,300,KA,Asha,South,Acme Paints
100200,mat1,2024-03-12,80,820,TN,Ravi,South,Zen Traders
100200,mat2,2024-04-02,15,145,TN,Ravi,South,Zen Traders
555001,mat3,2024-01-20,9,90,MH,Meera,West,Sun Decor
";

fn sales() -> Vec<SaleRecord> {
    SalesPayload::from_csv_reader(Cursor::new(SALES_CSV))
        .expect("csv parses")
        .normalize()
        .expect("payload normalizes")
}

fn scheme() -> SchemeSpec {
    SchemeSpec::from_value(serde_json::json!({
        "basicInfo": { "schemeTitle": "Invariant Scheme" },
        "mainScheme": {
            "mandatoryQualify": "yes",
            "productData": { "materials": ["mat1"], "skus": ["mat2"] }
        },
        "additionalSchemes": [
            {
                "schemeTitle": "Companion",
                "volumeValueBased": "value",
                "productData": { "materials": ["mat2"] }
            }
        ]
    }))
    .expect("scheme parses")
}

fn run_config() -> RunConfig {
    RunConfig::from_json(
        r#"{
            "schemeId": 77,
            "schemeFrom": "2024-05-01",
            "schemeTo": "2024-06-30",
            "calculationMode": "value",
            "basePeriods": [
                { "fromDate": "2024-01-01", "toDate": "2024-02-29", "method": "sum" },
                { "fromDate": "2024-03-01", "toDate": "2024-04-30", "method": "average" }
            ]
        }"#,
    )
    .expect("run config parses")
}

async fn run_once() -> TrackerRun {
    TrackerEngine::default()
        .compute(sales(), &scheme(), &run_config())
        .await
        .expect("engine run succeeds")
}

#[tokio::test]
async fn totals_are_rounded_maxima_for_every_scheme_group() {
    let run = run_once().await;
    let table = &run.table;

    for row in 0..table.rows.len() {
        for suffix in ["", "_p1"] {
            let base1_volume = table
                .number(row, &format!("base1VolumeFinal{suffix}"))
                .expect("base1 volume");
            let base2_volume = table
                .number(row, &format!("base2VolumeFinal{suffix}"))
                .expect("base2 volume");
            let total_volume = table
                .number(row, &format!("totalVolume{suffix}"))
                .expect("total volume");
            assert_eq!(total_volume, base1_volume.max(base2_volume).round());

            let base1_value = table
                .number(row, &format!("base1ValueFinal{suffix}"))
                .expect("base1 value");
            let base2_value = table
                .number(row, &format!("base2ValueFinal{suffix}"))
                .expect("base2 value");
            let total_value = table
                .number(row, &format!("totalValue{suffix}"))
                .expect("total value");
            assert_eq!(total_value, base1_value.max(base2_value).round());
        }
    }
}

#[tokio::test]
async fn all_numeric_cells_are_finite_and_non_negative() {
    let run = run_once().await;
    for row in &run.table.rows {
        for cell in row {
            if let Some(number) = cell.as_number() {
                assert!(number.is_finite());
                assert!(number >= 0.0);
            }
        }
    }
}

#[tokio::test]
async fn account_keys_are_unique_and_sorted() {
    let run = run_once().await;
    let table = &run.table;
    let accounts: Vec<&str> = (0..table.rows.len())
        .map(|row| table.text(row, "account").expect("account cell"))
        .collect();

    let unique: HashSet<&&str> = accounts.iter().collect();
    assert_eq!(unique.len(), accounts.len());

    let mut sorted = accounts.clone();
    sorted.sort();
    assert_eq!(accounts, sorted);
}

#[tokio::test]
async fn column_order_matches_the_canonical_layout() {
    let run = run_once().await;
    assert_eq!(run.table.columns, canonical_columns(1));
}

#[tokio::test]
async fn metadata_columns_are_identical_across_rows() {
    let run = run_once().await;
    let table = &run.table;
    assert!(table.rows.len() > 1);

    for column in [
        "schemeId",
        "schemeName",
        "schemeType",
        "schemePeriodFrom",
        "schemePeriodTo",
        "mandatoryQualify",
        "schemeName_p1",
        "schemeType_p1",
        "mandatoryQualify_p1",
    ] {
        let first = table.text(0, column).expect("metadata cell");
        for row in 1..table.rows.len() {
            assert_eq!(table.text(row, column), Some(first), "column {column}");
        }
    }
    assert_eq!(table.text(0, "schemeId"), Some("77"));
    assert_eq!(table.text(0, "schemeType"), Some("value"));
}

#[tokio::test]
async fn copy_on_missing_base_holds_for_single_period_runs() {
    let single = RunConfig::from_json(
        r#"{
            "schemeId": 77,
            "schemeFrom": "2024-05-01",
            "schemeTo": "2024-06-30",
            "calculationMode": "volume",
            "basePeriods": [
                { "fromDate": "2024-01-01", "toDate": "2024-02-29", "method": "sum" }
            ]
        }"#,
    )
    .expect("run config parses");

    let run = TrackerEngine::default()
        .compute(sales(), &scheme(), &single)
        .await
        .expect("engine run succeeds");
    let table = &run.table;

    for row in 0..table.rows.len() {
        for suffix in ["", "_p1"] {
            assert_eq!(
                table.number(row, &format!("base1VolumeFinal{suffix}")),
                table.number(row, &format!("base2VolumeFinal{suffix}")),
            );
            assert_eq!(
                table.number(row, &format!("base1ValueFinal{suffix}")),
                table.number(row, &format!("base2ValueFinal{suffix}")),
            );
        }
    }
}

#[tokio::test]
async fn running_twice_produces_the_same_table() {
    let first = run_once().await;
    let second = run_once().await;
    assert_eq!(first.table, second.table);
    assert_eq!(first.diagnostics, second.diagnostics);
}
