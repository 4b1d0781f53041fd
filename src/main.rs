//! gr - cached `go run`
//!
//! CLI entry point: wires configuration into the dispatcher.

use clap::Parser;
use console::style;
use gr::cache::ArtifactCache;
use gr::cli::Cli;
use gr::config::{self, Config, ConfigManager};
use gr::dispatch::{Dispatcher, Invocation, ProcessImage, INTERNAL_FAILURE};
use gr::error::GrResult;
use gr::fingerprint::BuildConfig;
use gr::toolchain::GoToolchain;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from((code & 0xff) as u8),
        Err(e) => {
            eprintln!("{} {}", style("gr:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("hint:").yellow(), hint);
            }
            ExitCode::from(INTERNAL_FAILURE as u8)
        }
    }
}

async fn run(cli: Cli) -> GrResult<i32> {
    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Config: {}", config_manager.path().display());

    let cache_dir = config::resolve_cache_dir(cli.cache_dir.as_deref(), &config)?;
    let cache = ArtifactCache::new(cache_dir)?;
    debug!("Cache root: {}", cache.root().display());

    let go = cli.go.clone().unwrap_or_else(|| config.build.go.clone());
    let flags = config
        .build
        .flags
        .iter()
        .chain(cli.build_flags.iter())
        .cloned()
        .collect();
    let build = BuildConfig::from_process_env(go.clone(), flags, &config.build.env);

    let invocation = Invocation::new(cli.package(), cli.program_args().to_vec(), build)?;
    let builder = GoToolchain::new(go);

    let completion = Dispatcher::new(&cache, &builder, &ProcessImage)
        .dispatch(&invocation)
        .await?;
    Ok(completion.exit_code())
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let filter = match verbose {
        0 => EnvFilter::new("gr=warn"),
        1 => EnvFilter::new("gr=info"),
        _ => EnvFilter::new("gr=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
