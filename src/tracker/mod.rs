pub mod accounts;
pub mod aggregate;
pub mod coordinator;
pub mod domain;
pub mod fuse;
pub mod normalizer;
pub mod products;
pub mod scheme;
pub mod spec;
pub mod table;

pub use accounts::resolve_accounts;
pub use domain::{
    AccountProfile, AggregationMethod, CalculationMode, MandatoryQualify, MetricBlock,
    PeriodSpec, SaleRecord,
};
pub use fuse::{canonical_columns, MainSchemeContext};
pub use normalizer::{InputError, SalesPayload};
pub use products::{MaterialScope, ProductData};
pub use scheme::{AccountMetrics, SchemeMeta};
pub use spec::{AdditionalScheme, ConfigViolation, RunConfig, SchemeSpec};
pub use table::{Cell, TrackerTable};

use crate::config::EngineConfig;
use coordinator::{run_tasks, CalculationTask, SchemeTask, TaskOutcome};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// The two fatal error families. Everything else the engine absorbs into
/// the returned diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigViolation),
}

/// Non-fatal conditions absorbed during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    MainSchemeFailed { reason: String },
    MainSchemeTimedOut,
    AdditionalSchemeFailed {
        index: usize,
        name: String,
        reason: String,
    },
    AdditionalSchemeTimedOut { index: usize, name: String },
}

/// The result of one engine invocation: the fused tracker table plus the
/// diagnostics absorbed along the way.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerRun {
    pub table: TrackerTable,
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes base-period tracker metrics for a scheme and its companions.
#[derive(Debug, Clone, Default)]
pub struct TrackerEngine {
    config: EngineConfig,
}

impl TrackerEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Runs the full calculation: resolves the participating accounts, runs
    /// one bounded task per scheme, and fuses the sub-results into one wide
    /// row per account.
    ///
    /// Returns `Err` only for invalid input or configuration. A failed or
    /// timed-out additional scheme zero-fills its column group; a failed
    /// main scheme downgrades the run to an empty table with canonical
    /// headers.
    pub async fn compute(
        &self,
        sales: Vec<SaleRecord>,
        scheme: &SchemeSpec,
        run: &RunConfig,
    ) -> Result<TrackerRun, TrackerError> {
        run.ensure_valid()?;

        let accounts = resolve_accounts(&sales, scheme);
        let sales = Arc::new(sales);
        let accounts = Arc::new(accounts);

        let mut tasks: Vec<Box<dyn SchemeTask>> = Vec::with_capacity(1 + scheme.additional.len());
        tasks.push(Box::new(CalculationTask {
            sales: Arc::clone(&sales),
            accounts: Arc::clone(&accounts),
            scope: MaterialScope::for_main_scheme(&scheme.product_data),
            base_periods: run.base_periods.clone(),
        }));
        for additional in &scheme.additional {
            tasks.push(Box::new(CalculationTask {
                sales: Arc::clone(&sales),
                accounts: Arc::clone(&accounts),
                scope: MaterialScope::for_additional_scheme(&additional.product_data),
                base_periods: run.base_periods.clone(),
            }));
        }

        let mut outcomes = run_tasks(tasks, &self.config).await.into_iter();
        let mut diagnostics = Vec::new();

        let main_metrics = match outcomes.next() {
            Some(TaskOutcome::Completed(metrics)) => Some(metrics),
            Some(TaskOutcome::Failed { reason }) => {
                diagnostics.push(Diagnostic::MainSchemeFailed { reason });
                None
            }
            Some(TaskOutcome::TimedOut) | None => {
                diagnostics.push(Diagnostic::MainSchemeTimedOut);
                None
            }
        };

        let additional: Vec<(SchemeMeta, Option<AccountMetrics>)> = scheme
            .additional
            .iter()
            .zip(outcomes)
            .enumerate()
            .map(|(index, (declared, outcome))| {
                let meta = SchemeMeta {
                    name: declared.name.clone(),
                    scheme_type: declared.mode,
                    mandatory_qualify: declared.mandatory_qualify,
                };
                let metrics = match outcome {
                    TaskOutcome::Completed(metrics) => Some(metrics),
                    TaskOutcome::Failed { reason } => {
                        diagnostics.push(Diagnostic::AdditionalSchemeFailed {
                            index: index + 1,
                            name: declared.name.clone(),
                            reason,
                        });
                        None
                    }
                    TaskOutcome::TimedOut => {
                        diagnostics.push(Diagnostic::AdditionalSchemeTimedOut {
                            index: index + 1,
                            name: declared.name.clone(),
                        });
                        None
                    }
                };
                (meta, metrics)
            })
            .collect();

        let context = MainSchemeContext {
            scheme_id: run.scheme_id.clone(),
            meta: SchemeMeta {
                name: scheme.title.clone(),
                scheme_type: run.calculation_mode,
                mandatory_qualify: scheme.mandatory_qualify,
            },
            period_from: run.scheme_from,
            period_to: run.scheme_to,
        };

        let table = fuse::fuse(&context, &accounts, main_metrics.as_ref(), &additional);

        for diagnostic in &diagnostics {
            warn!(?diagnostic, "scheme sub-result absorbed");
        }
        info!(
            accounts = accounts.len(),
            rows = table.rows.len(),
            additional_schemes = scheme.additional.len(),
            "tracker run complete"
        );

        Ok(TrackerRun {
            table,
            diagnostics,
        })
    }
}
