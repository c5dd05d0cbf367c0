mod cli;
mod config;
mod context;
mod error;
mod gate;
mod notify;
mod pipeline;
mod plugin;
mod render;
mod runner;
mod types;
mod util;
mod version;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, InitArgs, RunArgs};
use config::{Config, DEFAULT_CONFIG};
use context::BuildContext;
use pipeline::Pipeline;
use runner::ShellRunner;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init(args) => init(&args),
        Commands::Run(args) => run(args).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_FAILURE),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}

fn init(args: &InitArgs) -> anyhow::Result<bool> {
    if Path::new(&args.config).exists() && !args.r#override {
        anyhow::bail!(
            "Config file {} already exists (use --override to replace it)",
            args.config
        );
    }
    std::fs::write(&args.config, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config {}", args.config))?;
    info!("Created {}", args.config);
    Ok(true)
}

/// Returns whether the build passed
async fn run(args: RunArgs) -> anyhow::Result<bool> {
    let mut config = Config::load(&args.config)?;
    if let Some(id) = args.build_id {
        config.build.id = id;
    }
    if let Some(branch) = args.branch {
        config.build.branch = branch;
    }
    if let Some(commit) = args.commit {
        config.build.commit_id = commit;
    }
    let output = args.output.or(config.output.path);

    let mut ctx = BuildContext::new(config.build);
    let pipeline = Pipeline::new(&config.plugins, &ctx)?;

    if args.dry_run {
        for (name, stage) in pipeline.plan() {
            info!("Plugin '{}' ({:?})", name, stage);
        }
        info!("Dry run: {} plugin(s) configured", config.plugins.len());
        return Ok(true);
    }

    info!("Starting build #{} in {}", ctx.info.id, ctx.info.path.display());
    let runner = ShellRunner::new(ctx.info.path.clone());
    pipeline.run(&mut ctx, &runner).await;

    if let Some(path) = output {
        pipeline::write_output(&path, &ctx)?;
    }
    Ok(ctx.success)
}
