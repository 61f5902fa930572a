//! SQL job submission and completion polling
//!
//! State labels other than the terminal ones are opaque: the poller only
//! asks "terminal yet?". The first status check is immediate; later checks
//! wait `PollPolicy::interval` through an injected `Sleeper`.

use super::client::DremioClient;
use super::error::{DremioError, Result};
use super::transport::Transport;
use crate::config::Settings;
use async_trait::async_trait;
use std::time::Duration;

pub const STATE_COMPLETED: &str = "COMPLETED";
pub const STATE_CANCELED: &str = "CANCELED";
pub const STATE_FAILED: &str = "FAILED";

/// Something that can wait between polls
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-interval, bounded polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    /// 120 polls 5 seconds apart: about ten minutes
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(5),
            max_polls: 120,
        }
    }
}

/// Where a polled job stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Completed,
    /// CANCELED or FAILED, with the state label
    Ended(String),
    Running(String),
}

impl JobPhase {
    pub fn from_state(state: &str) -> Self {
        match state {
            STATE_COMPLETED => JobPhase::Completed,
            STATE_CANCELED | STATE_FAILED => JobPhase::Ended(state.to_string()),
            other => JobPhase::Running(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobPhase::Running(_))
    }
}

/// Submits SQL and waits for the job to finish
pub struct QueryExecutor<'a, T, S> {
    client: &'a DremioClient<T>,
    sleeper: S,
    policy: PollPolicy,
}

impl<'a, T: Transport> QueryExecutor<'a, T, TokioSleeper> {
    pub fn new(client: &'a DremioClient<T>) -> Self {
        QueryExecutor {
            client,
            sleeper: TokioSleeper,
            policy: PollPolicy::default(),
        }
    }
}

impl<'a, T: Transport, S: Sleeper> QueryExecutor<'a, T, S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> QueryExecutor<'a, T, S2> {
        QueryExecutor {
            client: self.client,
            sleeper,
            policy: self.policy,
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Submit `sql` and block until the job completes; returns the job id
    pub async fn run_and_wait(&self, settings: &Settings, sql: &str) -> Result<String> {
        let job_id = self.client.submit_sql(settings, sql).await?;
        tracing::info!("Submitted job {}", job_id);
        self.wait_for_completion(settings, &job_id, sql).await?;
        Ok(job_id)
    }

    /// Poll until COMPLETED; CANCELED/FAILED and an exhausted budget are errors
    pub async fn wait_for_completion(
        &self,
        settings: &Settings,
        job_id: &str,
        sql: &str,
    ) -> Result<()> {
        let mut last_state = String::from("UNKNOWN");

        for poll in 1..=self.policy.max_polls {
            if poll > 1 {
                self.sleeper.sleep(self.policy.interval).await;
            }

            let job = self.client.get_job(settings, job_id).await?;
            let state = job.job_state.ok_or_else(|| {
                DremioError::Protocol(format!(
                    "response for job {} did not include jobState as required",
                    job_id
                ))
            })?;
            let error_message = job.error_message.ok_or_else(|| {
                DremioError::Protocol(format!(
                    "response for job {} did not include errorMessage field as required",
                    job_id
                ))
            })?;

            match JobPhase::from_state(&state) {
                JobPhase::Completed => {
                    tracing::info!("Job {} completed after {} poll(s)", job_id, poll);
                    return Ok(());
                }
                JobPhase::Ended(state) => {
                    return Err(DremioError::JobFailed {
                        job_id: job_id.to_string(),
                        sql: sql.to_string(),
                        state,
                        message: error_message.unwrap_or_default(),
                    });
                }
                JobPhase::Running(state) => {
                    tracing::debug!(
                        "Job {} is {} (poll {}/{})",
                        job_id,
                        state,
                        poll,
                        self.policy.max_polls
                    );
                    last_state = state;
                }
            }
        }

        Err(DremioError::JobTimeout {
            job_id: job_id.to_string(),
            sql: sql.to_string(),
            polls: self.policy.max_polls,
            last_state,
        })
    }
}
