use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use reqwest::Url;
use tracing::{debug, info};

use crate::app::{PoolConfig, WorkerPool, print_summary};
use crate::args::BenchArgs;
use crate::config::{apply_config, load_config};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{ClientOptions, RequestExecutor, TemplateProvider, build_client};
use crate::metrics::{ReporterConfig, SequenceGenerator, StatsAggregator};
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

/// Everything resolved before the runtime starts; building it sends nothing.
#[derive(Debug)]
pub(super) struct RunPlan {
    pool: PoolConfig,
    client: ClientOptions,
    provider: TemplateProvider,
    reporter: ReporterConfig,
}

pub(super) fn build_plan(
    mut args: BenchArgs,
    matches: &ArgMatches,
    invocation: Vec<String>,
) -> AppResult<RunPlan> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, matches, &config)?;
    }

    let target = resolve_endpoint(args.endpoint.as_deref()).map_err(AppError::validation)?;
    let provider =
        TemplateProvider::from_files(args.header_file.as_deref(), args.body_file.as_deref())?;
    debug!(
        "Body template has {} sequence placeholder(s)",
        provider.placeholder_count()
    );

    Ok(RunPlan {
        pool: PoolConfig {
            worker_num: args.worker_num.get(),
            batch_size: args.batch_size.get(),
            target,
            method: args.method.clone(),
        },
        client: ClientOptions::from_args(&args),
        provider,
        reporter: ReporterConfig {
            tick_interval: Duration::from_millis(args.tick_interval_ms.get()),
            log_dir: args.log_dir.clone(),
            invocation,
        },
    })
}

fn resolve_endpoint(endpoint: Option<&str>) -> Result<Url, ValidationError> {
    let value = endpoint
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingEndpoint)?;
    let url = Url::parse(value).map_err(|err| ValidationError::InvalidEndpoint {
        url: value.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ValidationError::UnsupportedScheme {
            url: value.to_owned(),
        }),
    }
}

pub(super) async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let client = build_client(&plan.client)?;
    let stats = Arc::new(StatsAggregator::new());
    let executor = RequestExecutor::new(
        client,
        Arc::clone(&stats),
        Arc::new(SequenceGenerator::new()),
        Arc::new(plan.provider),
    );
    let pool = WorkerPool::new(executor, stats, plan.reporter);
    let result = pool.run(&plan.pool, &shutdown_tx).await;

    drop(shutdown_tx.send(()));
    drop(signal_handle.await);

    let run = result?;
    if let Some(report) = run.report.as_ref() {
        info!("Statistics written to {}", report.log_path.display());
    }
    print_summary(&run);
    Ok(())
}
