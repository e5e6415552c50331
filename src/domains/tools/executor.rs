//! Retrying Executor.
//!
//! Runs a tool call as up to `retries + 1` strictly sequential attempts. Each
//! attempt rebuilds the request from the descriptor, so nothing from a
//! previous attempt is reused. The descriptor timeout bounds the whole loop
//! including backoff sleeps; when it fires the in-flight attempt is dropped.
//!
//! The last attempt decides the outcome when nothing succeeded:
//! - an HTTP response (even an error status) is returned for processing
//! - a network failure becomes [`ToolError::Exhausted`]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::auth::EnvSource;
use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::request::build_request;
use super::transport::{HttpTransport, RawResponse, SendError};

/// Default backoff unit: attempt `n` waits `n` units before sending.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Executes tool requests with linear backoff retries.
#[derive(Clone)]
pub struct RetryingExecutor {
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    env: Arc<dyn EnvSource>,
    backoff_unit: Duration,
}

impl RetryingExecutor {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        sleeper: Arc<dyn Sleeper>,
        env: Arc<dyn EnvSource>,
        backoff_unit: Duration,
    ) -> Self {
        Self {
            transport,
            sleeper,
            env,
            backoff_unit,
        }
    }

    /// Execute `tool` with already validated arguments.
    pub async fn execute(
        &self,
        tool: &ToolDescriptor,
        args: &Map<String, Value>,
    ) -> Result<RawResponse, ToolError> {
        match tool.deadline() {
            Some(limit) => tokio::time::timeout(limit, self.run_attempts(tool, args))
                .await
                .map_err(|_| {
                    warn!(tool = %tool.name, "Tool call timed out after {:?}", limit);
                    ToolError::Timeout(limit)
                })?,
            None => self.run_attempts(tool, args).await,
        }
    }

    async fn run_attempts(
        &self,
        tool: &ToolDescriptor,
        args: &Map<String, Value>,
    ) -> Result<RawResponse, ToolError> {
        let attempts = tool.retries + 1;
        let mut last: Option<Result<RawResponse, SendError>> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.backoff_unit * attempt;
                debug!(tool = %tool.name, attempt, "Backing off for {:?}", delay);
                self.sleeper.sleep(delay).await;
            }

            let request = build_request(tool, args, self.env.as_ref())?;
            debug!(
                tool = %tool.name,
                attempt = attempt + 1,
                method = %request.method,
                url = %request.url,
                "Sending upstream request"
            );

            match self.transport.send(request).await {
                Ok(response) if tool.is_success_status(response.status) => return Ok(response),
                Ok(response) => {
                    warn!(
                        tool = %tool.name,
                        attempt = attempt + 1,
                        status = response.status,
                        "Upstream returned unsuccessful status"
                    );
                    last = Some(Ok(response));
                }
                Err(e) => {
                    warn!(tool = %tool.name, attempt = attempt + 1, "Upstream request failed: {}", e);
                    last = Some(Err(e));
                }
            }
        }

        match last {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(ToolError::Exhausted {
                attempts,
                message: e.to_string(),
            }),
            None => Err(ToolError::internal("no attempt was made")),
        }
    }
}
