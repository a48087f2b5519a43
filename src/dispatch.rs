use std::{future::Future, sync::Arc};

use anyhow::{Context, Result};
use log::{debug, error, info};
use reqwest::{StatusCode, header::USER_AGENT};

use crate::{batch::Batch, config::TargetConfig, params::CalcParams, random::SharedRng};

/// Runs one job. Failures are handled (logged) inside; nothing is returned.
pub trait Dispatcher: Send + Sync + 'static {
    fn dispatch(&self, id: usize) -> impl Future<Output = ()> + Send;
}

/// Builds the dispatcher shared by all jobs of one batch.
pub trait DispatcherFactory {
    type Dispatcher: Dispatcher;
    fn for_batch(&self, batch: &Batch) -> Result<Self::Dispatcher>;
}

#[derive(Debug)]
pub enum JobOutcome {
    /// Got a response. Any status counts, including non-2xx.
    Completed {
        id: usize,
        params: CalcParams,
        status: StatusCode,
    },
    InvalidRequest {
        id: usize,
        params: CalcParams,
        error: anyhow::Error,
    },
    Failed {
        id: usize,
        params: CalcParams,
        error: anyhow::Error,
    },
}

impl JobOutcome {
    pub fn params(&self) -> &CalcParams {
        match self {
            Self::Completed { params, .. }
            | Self::InvalidRequest { params, .. }
            | Self::Failed { params, .. } => params,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn log(&self) {
        match self {
            Self::Completed { id, params, status } => {
                info!("Request {id} - {params}, Status: {status}");
            }
            Self::InvalidRequest { id, params, error } => {
                error!("Error creating request {id}: {error:#} ({params})");
            }
            Self::Failed { id, params, error } => {
                error!("Error in request {id}: {error:#} ({params})");
            }
        }
    }
}

/// Fixed endpoint plus the run-wide random source. Hands out one
/// [`HttpDispatcher`] with a fresh client per batch.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    config: Arc<TargetConfig>,
    rng: Arc<SharedRng>,
}

impl HttpTarget {
    pub fn new(config: TargetConfig, rng: Arc<SharedRng>) -> Self {
        Self {
            config: Arc::new(config),
            rng,
        }
    }

    pub fn dispatcher(&self, pool_size: usize) -> Result<HttpDispatcher> {
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .pool_max_idle_per_host(pool_size)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpDispatcher {
            client,
            config: self.config.clone(),
            rng: self.rng.clone(),
        })
    }
}

impl DispatcherFactory for HttpTarget {
    type Dispatcher = HttpDispatcher;

    fn for_batch(&self, batch: &Batch) -> Result<HttpDispatcher> {
        self.dispatcher(batch.count)
    }
}

#[derive(Debug)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    config: Arc<TargetConfig>,
    rng: Arc<SharedRng>,
}

impl HttpDispatcher {
    /// One GET with freshly generated parameters. Never retries.
    pub async fn send(&self, id: usize) -> JobOutcome {
        let params = CalcParams::generate(&*self.rng);
        let request = self
            .client
            .get(self.config.url.clone())
            .header(USER_AGENT, self.config.user_agent.as_str())
            .query(&params)
            .build();
        let request = match request {
            Ok(req) => req,
            Err(error) => {
                return JobOutcome::InvalidRequest {
                    id,
                    params,
                    error: error.into(),
                };
            }
        };
        match self.client.execute(request).await {
            Ok(resp) => {
                let status = resp.status();
                // drain so the connection goes back to the pool
                if let Err(e) = resp.bytes().await {
                    debug!("Request {id}: failed to read response body: {e}");
                }
                JobOutcome::Completed { id, params, status }
            }
            Err(error) => JobOutcome::Failed {
                id,
                params,
                error: error.into(),
            },
        }
    }
}

impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, id: usize) {
        self.send(id).await.log();
    }
}
