use crate::tracker::domain::{
    parse_date, AggregationMethod, CalculationMode, MandatoryQualify, PeriodSpec,
};
use crate::tracker::normalizer::scalar_key;
use crate::tracker::products::ProductData;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, thiserror::Error)]
pub enum ConfigViolation {
    #[error("basePeriods must contain one or two entries, got {0}")]
    BasePeriodCount(usize),
    #[error("base period runs backwards: {from} is after {to}")]
    BackwardsPeriod { from: NaiveDate, to: NaiveDate },
    #[error("unknown aggregation method `{0}`")]
    UnknownMethod(String),
    #[error("unknown calculation mode `{0}`")]
    UnknownMode(String),
    #[error("field `{field}` holds unparseable date `{value}`")]
    UnparseableDate { field: &'static str, value: String },
    #[error("malformed configuration document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Declarative description of one scheme: the main scheme plus any number of
/// companion additional schemes sharing the main scheme's base windows.
#[derive(Debug, Clone)]
pub struct SchemeSpec {
    pub title: String,
    pub mandatory_qualify: MandatoryQualify,
    pub product_data: ProductData,
    pub selected_credit_accounts: BTreeSet<String>,
    pub selected_states: BTreeSet<String>,
    pub additional: Vec<AdditionalScheme>,
}

#[derive(Debug, Clone)]
pub struct AdditionalScheme {
    pub name: String,
    pub mandatory_qualify: MandatoryQualify,
    pub mode: CalculationMode,
    pub product_data: ProductData,
}

impl SchemeSpec {
    pub fn from_json(document: &str) -> Result<Self, ConfigViolation> {
        let raw: RawSchemeDocument = serde_json::from_str(document)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_value(document: Value) -> Result<Self, ConfigViolation> {
        let raw: RawSchemeDocument = serde_json::from_value(document)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSchemeDocument) -> Self {
        let additional = raw
            .additional_schemes
            .into_iter()
            .enumerate()
            .map(|(index, scheme)| {
                let name = scheme
                    .scheme_title
                    .filter(|title| !title.trim().is_empty())
                    .or_else(|| {
                        scheme
                            .scheme_number
                            .as_ref()
                            .and_then(scalar_key)
                            .map(|number| format!("Additional Scheme {number}"))
                    })
                    .unwrap_or_else(|| format!("Additional Scheme {}", index + 1));

                AdditionalScheme {
                    name,
                    mandatory_qualify: MandatoryQualify::parse(
                        scheme.mandatory_qualify.as_deref(),
                    ),
                    mode: scheme
                        .volume_value_based
                        .as_deref()
                        .and_then(CalculationMode::parse)
                        .unwrap_or(CalculationMode::Volume),
                    product_data: coerce_product_data(scheme.product_data),
                }
            })
            .collect();

        Self {
            title: raw
                .basic_info
                .scheme_title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| "Untitled Scheme".to_string()),
            mandatory_qualify: MandatoryQualify::parse(
                raw.main_scheme.mandatory_qualify.as_deref(),
            ),
            product_data: coerce_product_data(raw.main_scheme.product_data),
            selected_credit_accounts: coerce_key_set(
                raw.main_scheme.scheme_applicable.selected_credit_accounts,
            ),
            selected_states: coerce_key_set(raw.main_scheme.scheme_applicable.selected_states),
            additional,
        }
    }
}

/// Per-run window and mode configuration supplied alongside the scheme.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub scheme_id: String,
    pub scheme_from: NaiveDate,
    pub scheme_to: NaiveDate,
    pub calculation_mode: CalculationMode,
    pub base_periods: Vec<PeriodSpec>,
}

impl RunConfig {
    pub fn from_json(document: &str) -> Result<Self, ConfigViolation> {
        let raw: RawRunConfig = serde_json::from_str(document)?;

        let scheme_from = parse_config_date("schemeFrom", &raw.scheme_from)?;
        let scheme_to = parse_config_date("schemeTo", &raw.scheme_to)?;
        let calculation_mode = CalculationMode::parse(&raw.calculation_mode)
            .ok_or_else(|| ConfigViolation::UnknownMode(raw.calculation_mode.clone()))?;

        let base_periods = raw
            .base_periods
            .iter()
            .map(|period| {
                let from_date = parse_config_date("fromDate", &period.from_date)?;
                let to_date = parse_config_date("toDate", &period.to_date)?;
                let method = AggregationMethod::parse(&period.method)
                    .ok_or_else(|| ConfigViolation::UnknownMethod(period.method.clone()))?;
                Ok(PeriodSpec {
                    from_date,
                    to_date,
                    method,
                })
            })
            .collect::<Result<Vec<_>, ConfigViolation>>()?;

        let config = Self {
            scheme_id: raw
                .scheme_id
                .as_ref()
                .and_then(scalar_key)
                .unwrap_or_default(),
            scheme_from,
            scheme_to,
            calculation_mode,
            base_periods,
        };
        config.ensure_valid()?;
        Ok(config)
    }

    /// Revalidates the window set; engine entry points call this so that a
    /// hand-built config cannot bypass the parse-time checks.
    pub fn ensure_valid(&self) -> Result<(), ConfigViolation> {
        let count = self.base_periods.len();
        if count == 0 || count > 2 {
            return Err(ConfigViolation::BasePeriodCount(count));
        }
        for period in &self.base_periods {
            if period.from_date > period.to_date {
                return Err(ConfigViolation::BackwardsPeriod {
                    from: period.from_date,
                    to: period.to_date,
                });
            }
        }
        Ok(())
    }
}

fn parse_config_date(field: &'static str, value: &str) -> Result<NaiveDate, ConfigViolation> {
    parse_date(value).ok_or_else(|| ConfigViolation::UnparseableDate {
        field,
        value: value.to_string(),
    })
}

fn coerce_product_data(raw: BTreeMap<String, Vec<Value>>) -> ProductData {
    let buckets = raw
        .into_iter()
        .map(|(bucket, materials)| {
            let materials = materials.iter().filter_map(scalar_key).collect();
            (bucket, materials)
        })
        .collect();
    ProductData::new(buckets)
}

fn coerce_key_set(raw: Vec<Value>) -> BTreeSet<String> {
    raw.iter().filter_map(scalar_key).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchemeDocument {
    #[serde(default)]
    basic_info: RawBasicInfo,
    #[serde(default)]
    main_scheme: RawMainScheme,
    #[serde(default)]
    additional_schemes: Vec<RawAdditionalScheme>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBasicInfo {
    #[serde(default)]
    scheme_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMainScheme {
    #[serde(default)]
    mandatory_qualify: Option<String>,
    #[serde(default)]
    product_data: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    scheme_applicable: RawApplicable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApplicable {
    #[serde(default)]
    selected_credit_accounts: Vec<Value>,
    #[serde(default)]
    selected_states: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAdditionalScheme {
    #[serde(default)]
    scheme_number: Option<Value>,
    #[serde(default)]
    scheme_title: Option<String>,
    #[serde(default)]
    mandatory_qualify: Option<String>,
    #[serde(default)]
    volume_value_based: Option<String>,
    #[serde(default)]
    product_data: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRunConfig {
    #[serde(default)]
    scheme_id: Option<Value>,
    scheme_from: String,
    scheme_to: String,
    calculation_mode: String,
    base_periods: Vec<RawPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPeriod {
    from_date: String,
    to_date: String,
    method: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEME_DOC: &str = r#"{
        "basicInfo": { "schemeTitle": "Festive Push 2024" },
        "mainScheme": {
            "mandatoryQualify": "Yes",
            "productData": { "grps": ["m1", "m2"], "mysteryBucket": ["m9"] },
            "schemeApplicable": {
                "selectedCreditAccounts": [936878, "100200"],
                "selectedStates": ["KA", "TN"]
            }
        },
        "additionalSchemes": [
            {
                "schemeNumber": 1,
                "mandatoryQualify": "no",
                "volumeValueBased": "value",
                "productData": { "skus": ["m3"] }
            },
            {
                "schemeTitle": "Thinner Focus",
                "productData": {}
            }
        ],
        "unknownEnvelopeField": true
    }"#;

    #[test]
    fn parses_the_scheme_envelope() {
        let spec = SchemeSpec::from_json(SCHEME_DOC).expect("scheme parses");
        assert_eq!(spec.title, "Festive Push 2024");
        assert_eq!(spec.mandatory_qualify, MandatoryQualify::Yes);
        assert!(spec.selected_credit_accounts.contains("936878"));
        assert!(spec.selected_credit_accounts.contains("100200"));
        assert_eq!(spec.selected_states.len(), 2);

        let materials = spec.product_data.material_set();
        assert!(materials.contains("m1") && materials.contains("m2"));
        assert!(!materials.contains("m9"));

        assert_eq!(spec.additional.len(), 2);
        assert_eq!(spec.additional[0].name, "Additional Scheme 1");
        assert_eq!(spec.additional[0].mode, CalculationMode::Value);
        assert_eq!(spec.additional[1].name, "Thinner Focus");
        assert_eq!(spec.additional[1].mode, CalculationMode::Volume);
        assert!(spec.additional[1].product_data.material_set().is_empty());
    }

    #[test]
    fn missing_optional_envelope_parts_default() {
        let spec = SchemeSpec::from_json("{}").expect("empty envelope parses");
        assert_eq!(spec.title, "Untitled Scheme");
        assert_eq!(spec.mandatory_qualify, MandatoryQualify::No);
        assert!(spec.selected_credit_accounts.is_empty());
        assert!(spec.additional.is_empty());
    }

    #[test]
    fn parses_a_run_config() {
        let config = RunConfig::from_json(
            r#"{
                "schemeId": 4401,
                "schemeFrom": "2024-05-01",
                "schemeTo": "2024-06-30",
                "calculationMode": "volume",
                "basePeriods": [
                    { "fromDate": "2024-01-01", "toDate": "2024-02-29", "method": "sum" },
                    { "fromDate": "2024-03-01", "toDate": "2024-04-30", "method": "average" }
                ]
            }"#,
        )
        .expect("run config parses");

        assert_eq!(config.scheme_id, "4401");
        assert_eq!(config.calculation_mode, CalculationMode::Volume);
        assert_eq!(config.base_periods.len(), 2);
        assert_eq!(config.base_periods[1].method, AggregationMethod::Average);
    }

    #[test]
    fn rejects_bad_base_period_counts() {
        let config = RunConfig {
            scheme_id: "1".to_string(),
            scheme_from: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            scheme_to: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            calculation_mode: CalculationMode::Volume,
            base_periods: Vec::new(),
        };
        match config.ensure_valid() {
            Err(ConfigViolation::BasePeriodCount(0)) => {}
            other => panic!("expected count violation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_backwards_periods_and_unknown_methods() {
        let backwards = RunConfig::from_json(
            r#"{
                "schemeFrom": "2024-05-01", "schemeTo": "2024-06-30",
                "calculationMode": "volume",
                "basePeriods": [
                    { "fromDate": "2024-02-01", "toDate": "2024-01-01", "method": "sum" }
                ]
            }"#,
        );
        assert!(matches!(
            backwards,
            Err(ConfigViolation::BackwardsPeriod { .. })
        ));

        let unknown = RunConfig::from_json(
            r#"{
                "schemeFrom": "2024-05-01", "schemeTo": "2024-06-30",
                "calculationMode": "volume",
                "basePeriods": [
                    { "fromDate": "2024-01-01", "toDate": "2024-02-01", "method": "median" }
                ]
            }"#,
        );
        match unknown {
            Err(ConfigViolation::UnknownMethod(method)) => assert_eq!(method, "median"),
            other => panic!("expected unknown method, got {other:?}"),
        }
    }
}
