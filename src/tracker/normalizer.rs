use crate::tracker::domain::{parse_date, SaleRecord, UNKNOWN};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

/// Columns every sales payload must carry. Descriptive columns are optional
/// and default to [`UNKNOWN`].
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["credit_account", "material", "sale_date", "volume", "value"];

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("required column `{0}` is missing from the sales payload")]
    MissingColumn(&'static str),
    #[error("row {row}: credit_account is empty")]
    EmptyAccount { row: usize },
    #[error("row {row}: unparseable sale date `{value}`")]
    UnparseableDate { row: usize, value: String },
    #[error("row {row}: column `{column}` holds non-numeric value `{value}`")]
    NonNumeric {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("unable to read sales payload: {0}")]
    Csv(#[from] csv::Error),
}

/// Raw tabular sales payload prior to canonicalization. Cell values keep
/// whatever scalar type the source carried; [`SalesPayload::normalize`]
/// coerces them.
#[derive(Debug, Clone, Default)]
pub struct SalesPayload {
    columns: Vec<String>,
    rows: Vec<BTreeMap<String, Value>>,
}

impl SalesPayload {
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, InputError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|header| header.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row = BTreeMap::new();
            for (column, cell) in columns.iter().zip(record.iter()) {
                row.insert(column.clone(), Value::String(cell.to_string()));
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn from_json_rows(rows: Vec<serde_json::Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|column| column == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().collect())
            .collect();

        Self { columns, rows }
    }

    /// Re-wraps already-canonical records. Normalizing the result is the
    /// identity.
    pub fn from_records(records: &[SaleRecord]) -> Self {
        let columns = [
            "credit_account",
            "material",
            "sale_date",
            "volume",
            "value",
            "state_name",
            "so_name",
            "region",
            "customer_name",
        ]
        .iter()
        .map(|column| column.to_string())
        .collect();

        let rows = records
            .iter()
            .map(|record| {
                let mut row = BTreeMap::new();
                row.insert(
                    "credit_account".to_string(),
                    Value::String(record.account.clone()),
                );
                row.insert("material".to_string(), Value::String(record.material.clone()));
                row.insert(
                    "sale_date".to_string(),
                    Value::String(record.sale_date.format("%Y-%m-%d").to_string()),
                );
                row.insert("volume".to_string(), json_number(record.volume));
                row.insert("value".to_string(), json_number(record.value));
                row.insert("state_name".to_string(), Value::String(record.state.clone()));
                row.insert(
                    "so_name".to_string(),
                    Value::String(record.sales_officer.clone()),
                );
                row.insert("region".to_string(), Value::String(record.region.clone()));
                row.insert(
                    "customer_name".to_string(),
                    Value::String(record.customer_name.clone()),
                );
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Canonicalizes the payload into [`SaleRecord`]s: unifies column
    /// aliases, coerces dates and numerics, fills descriptive gaps with
    /// [`UNKNOWN`]. Extra columns are dropped.
    pub fn normalize(self) -> Result<Vec<SaleRecord>, InputError> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }

        for required in REQUIRED_COLUMNS {
            if !self.columns.iter().any(|column| column == required) {
                return Err(InputError::MissingColumn(required));
            }
        }

        let mut records = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let row_number = index + 1;

            let account = row
                .get("credit_account")
                .and_then(scalar_key)
                .ok_or(InputError::EmptyAccount { row: row_number })?;

            let material = row
                .get("material")
                .and_then(scalar_key)
                .unwrap_or_else(|| UNKNOWN.to_string());

            let raw_date = text_cell(row, "sale_date").unwrap_or_default();
            let sale_date =
                parse_date(&raw_date).ok_or_else(|| InputError::UnparseableDate {
                    row: row_number,
                    value: raw_date.clone(),
                })?;

            let volume = numeric_cell(row, "volume", row_number)?;
            let value = numeric_cell(row, "value", row_number)?;

            let state = descriptive_cell(row, &["state_name"]);
            let sales_officer = descriptive_cell(row, &["so_name", "area_head_name"]);
            let region = descriptive_cell(row, &["region", "region_name"]);
            let customer_name = descriptive_cell(row, &["customer_name"]);

            records.push(SaleRecord {
                account,
                material,
                sale_date,
                volume,
                value,
                state,
                sales_officer,
                region,
                customer_name,
            });
        }

        Ok(records)
    }
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Coerces a scalar cell into a stable string key. Digit strings pass
/// through untouched; integral JSON numbers render without an exponent or a
/// trailing fraction.
pub(crate) fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int.to_string())
            } else if let Some(unsigned) = number.as_u64() {
                Some(unsigned.to_string())
            } else {
                number.as_f64().map(|float| {
                    if float.fract() == 0.0 && float.is_finite() {
                        format!("{}", float as i64)
                    } else {
                        format!("{}", float)
                    }
                })
            }
        }
        _ => None,
    }
}

fn text_cell(row: &BTreeMap<String, Value>, column: &str) -> Option<String> {
    match row.get(column) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

fn descriptive_cell(row: &BTreeMap<String, Value>, columns: &[&str]) -> String {
    columns
        .iter()
        .find_map(|column| text_cell(row, column))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn numeric_cell(
    row: &BTreeMap<String, Value>,
    column: &'static str,
    row_number: usize,
) -> Result<f64, InputError> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(number)) => Ok(number.as_f64().unwrap_or(0.0)),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed.parse::<f64>().map_err(|_| InputError::NonNumeric {
                row: row_number,
                column,
                value: trimmed.to_string(),
            })
        }
        Some(other) => Err(InputError::NonNumeric {
            row: row_number,
            column,
            value: other.to_string(),
        }),
    }
}
