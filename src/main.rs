use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use anyhow::{Result, bail};
use batch_loadgen::{
    BatchController, BatchPlan, HttpTarget,
    config::{DEFAULT_URL, TargetConfig},
    random::SharedRng,
};
use clap::Parser;
use reqwest::Url;

/// Send concurrent GET requests with random parameters, batch by batch
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Total number of requests to send
    #[arg(long, short = 'n')]
    requests: Option<usize>,
    /// Number of requests to send at a time
    #[arg(long, short)]
    batch_size: Option<usize>,
    /// Total number of requests, when --requests is not given
    #[arg(value_name = "REQUESTS")]
    requests_pos: Option<usize>,
    /// Batch size, when --batch-size is not given
    #[arg(value_name = "BATCH_SIZE")]
    batch_size_pos: Option<usize>,
    #[arg(long, default_value = DEFAULT_URL)]
    url: Url,
    /// Per-request timeout in seconds
    #[arg(long, short, default_value_t = 30.0)]
    timeout: f64,
}

impl Cli {
    fn plan(&self) -> Result<BatchPlan> {
        let total = self.requests.or(self.requests_pos).and_then(NonZeroUsize::new);
        let size = self.batch_size.or(self.batch_size_pos).and_then(NonZeroUsize::new);
        let (Some(total), Some(size)) = (total, size) else {
            bail!("Please provide valid values for total requests and batch size.");
        };
        Ok(BatchPlan::new(total, size))
    }

    fn target(&self) -> Result<TargetConfig> {
        if self.timeout.is_nan() || self.timeout <= 0.0 {
            bail!("Timeout must be a positive number of seconds.");
        }
        let timeout = Duration::try_from_secs_f64(self.timeout)?;
        Ok(TargetConfig::new(self.url.clone()).with_timeout(timeout))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let plan = cli.plan()?;
    let target = HttpTarget::new(cli.target()?, Arc::new(SharedRng::from_os_rng()));
    BatchController::new(target, plan).run().await
}
