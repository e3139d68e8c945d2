use crate::config::EngineConfig;
use crate::tracker::domain::{AccountProfile, PeriodSpec, SaleRecord};
use crate::tracker::products::MaterialScope;
use crate::tracker::scheme::{calculate_scheme, AccountMetrics};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// A unit of scheme work the coordinator can dispatch. The production
/// implementation wraps [`calculate_scheme`]; tests substitute slow or
/// panicking tasks.
pub trait SchemeTask: Send + 'static {
    fn compute(self: Box<Self>) -> AccountMetrics;
}

pub struct CalculationTask {
    pub sales: Arc<Vec<SaleRecord>>,
    pub accounts: Arc<Vec<AccountProfile>>,
    pub scope: MaterialScope,
    pub base_periods: Vec<PeriodSpec>,
}

impl SchemeTask for CalculationTask {
    fn compute(self: Box<Self>) -> AccountMetrics {
        calculate_scheme(&self.sales, &self.accounts, &self.scope, &self.base_periods)
    }
}

/// How one scheme task resolved. A failed or timed-out task never fails the
/// run; the fuser zero-fills its columns.
#[derive(Debug)]
pub enum TaskOutcome {
    Completed(AccountMetrics),
    Failed { reason: String },
    TimedOut,
}

/// Runs one task per scheme on a bounded worker pool with a shared per-task
/// deadline, and resolves every task before returning. Outcomes come back
/// in submission order regardless of completion order.
pub async fn run_tasks(
    tasks: Vec<Box<dyn SchemeTask>>,
    config: &EngineConfig,
) -> Vec<TaskOutcome> {
    let pool = Arc::new(Semaphore::new(config.workers.max(1)));
    let deadline = config.task_deadline;

    let handles: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                let _permit = match pool.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(closed) => {
                        return TaskOutcome::Failed {
                            reason: closed.to_string(),
                        }
                    }
                };

                match timeout(deadline, tokio::task::spawn_blocking(|| task.compute())).await {
                    Err(_elapsed) => TaskOutcome::TimedOut,
                    Ok(Err(join_error)) => TaskOutcome::Failed {
                        reason: join_error.to_string(),
                    },
                    Ok(Ok(metrics)) => TaskOutcome::Completed(metrics),
                }
            })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => TaskOutcome::Failed {
                reason: join_error.to_string(),
            },
        });
    }
    outcomes
}
