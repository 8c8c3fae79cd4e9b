use std::future::Future;
use std::time::Duration;

use relkit_core::RunnerScope;
use secrecy::SecretString;
use serde::Deserialize;

use crate::transport::{ApiRequest, GithubTransport, TransportError};

const PAGE_SIZE: usize = 100;
const OFFLINE: &str = "offline";

/// A registered self-hosted runner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Runner {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub busy: bool,
}

impl Runner {
    pub fn is_offline(&self) -> bool {
        self.status == OFFLINE
    }
}

#[derive(Deserialize)]
struct RunnerPage {
    #[serde(default)]
    total_count: usize,
    runners: Vec<Runner>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
    #[serde(default)]
    expires_at: Option<String>,
}

/// Outcome of one reap cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    pub deleted: Vec<u64>,
    /// Runners that could not be deleted, with the reason.
    pub failed: Vec<(u64, String)>,
}

impl ReapReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

#[derive(Debug)]
pub struct RegistrationToken {
    pub token: SecretString,
    pub expires_at: Option<String>,
}

/// Lists and deletes self-hosted runners.
pub struct RunnerReaper<'a, T: GithubTransport> {
    transport: &'a T,
}

impl<'a, T: GithubTransport> RunnerReaper<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// All runners registered in `scope`, across pages.
    pub async fn list_runners(&self, scope: &RunnerScope) -> Result<Vec<Runner>, ReaperError> {
        let mut runners = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "{prefix}/actions/runners?per_page={PAGE_SIZE}&page={page}",
                prefix = scope.api_prefix()
            );
            let response = self
                .transport
                .send(ApiRequest::get(url))
                .await
                .map_err(|e| ReaperError::List {
                    scope: scope.to_string(),
                    source: e,
                })?;

            if response.status != 200 {
                return Err(ReaperError::UnexpectedStatus {
                    action: "list runners",
                    status: response.status,
                    body: response.body,
                });
            }

            let batch: RunnerPage = response.json().map_err(|e| ReaperError::Decode {
                action: "list runners",
                source: e,
            })?;

            let received = batch.runners.len();
            runners.extend(batch.runners);

            if received < PAGE_SIZE || runners.len() >= batch.total_count {
                break;
            }
            page += 1;
        }

        Ok(runners)
    }

    /// Ids of runners reporting `offline`.
    pub async fn list_offline(&self, scope: &RunnerScope) -> Result<Vec<u64>, ReaperError> {
        let runners = self.list_runners(scope).await?;
        Ok(runners
            .into_iter()
            .filter(Runner::is_offline)
            .map(|r| r.id)
            .collect())
    }

    pub async fn delete_runner(&self, scope: &RunnerScope, runner_id: u64) -> Result<(), ReaperError> {
        let url = format!("{}/actions/runners/{runner_id}", scope.api_prefix());
        let response = self
            .transport
            .send(ApiRequest::delete(url))
            .await
            .map_err(|e| ReaperError::Delete {
                runner_id,
                source: e,
            })?;

        if response.status != 204 {
            return Err(ReaperError::UnexpectedStatus {
                action: "delete runner",
                status: response.status,
                body: response.body,
            });
        }
        Ok(())
    }

    /// Delete every offline runner in `scope`.
    ///
    /// Listing failures abort the cycle; a failed delete is logged and
    /// recorded in the report while the rest of the batch continues.
    pub async fn reap(&self, scope: &RunnerScope) -> Result<ReapReport, ReaperError> {
        let offline = self.list_offline(scope).await?;
        let mut report = ReapReport::default();

        if offline.is_empty() {
            tracing::info!(%scope, "no offline runners");
            return Ok(report);
        }

        for runner_id in offline {
            match self.delete_runner(scope, runner_id).await {
                Ok(()) => {
                    tracing::info!(%scope, runner_id, "deleted offline runner");
                    report.deleted.push(runner_id);
                }
                Err(e) => {
                    tracing::warn!(%scope, runner_id, error = %e, "failed to delete runner");
                    report.failed.push((runner_id, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Fresh token for registering a new runner in `scope`.
    pub async fn registration_token(
        &self,
        scope: &RunnerScope,
    ) -> Result<RegistrationToken, ReaperError> {
        let url = format!("{}/actions/runners/registration-token", scope.api_prefix());
        let response = self
            .transport
            .send(ApiRequest::post(url))
            .await
            .map_err(|e| ReaperError::Token {
                scope: scope.to_string(),
                source: e,
            })?;

        if response.status != 201 {
            return Err(ReaperError::UnexpectedStatus {
                action: "create registration token",
                status: response.status,
                body: response.body,
            });
        }

        let parsed: TokenResponse = response.json().map_err(|e| ReaperError::Decode {
            action: "create registration token",
            source: e,
        })?;

        Ok(RegistrationToken {
            token: SecretString::from(parsed.token),
            expires_at: parsed.expires_at,
        })
    }
}

/// Reap `scope` now and then every `interval` until `shutdown` resolves.
///
/// A failed cycle is logged and the schedule carries on. `shutdown` is
/// polled before each cycle and throughout each sleep. Returns the number
/// of completed cycles.
pub async fn run_reaper<T, F>(
    reaper: &RunnerReaper<'_, T>,
    scope: &RunnerScope,
    interval: Duration,
    shutdown: F,
) -> u64
where
    T: GithubTransport,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut cycles = 0;

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            result = reaper.reap(scope) => {
                match result {
                    Ok(report) => tracing::info!(
                        %scope,
                        deleted = report.deleted_count(),
                        failed = report.failed.len(),
                        "reap cycle finished"
                    ),
                    Err(e) => tracing::error!(%scope, error = %e, "reap cycle failed"),
                }
                cycles += 1;
            }
        }

        tokio::select! {
            biased;
            () = &mut shutdown => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!(%scope, cycles, "runner reaper stopped");
    cycles
}

#[derive(Debug, thiserror::Error)]
pub enum ReaperError {
    #[error("failed to list runners for {scope}")]
    List {
        scope: String,
        source: TransportError,
    },

    #[error("failed to delete runner {runner_id}")]
    Delete {
        runner_id: u64,
        source: TransportError,
    },

    #[error("failed to create registration token for {scope}")]
    Token {
        scope: String,
        source: TransportError,
    },

    #[error("{action}: unexpected HTTP {status}: {body}")]
    UnexpectedStatus {
        action: &'static str,
        status: u16,
        body: String,
    },

    #[error("{action}: response could not be decoded")]
    Decode {
        action: &'static str,
        source: serde_json::Error,
    },
}
