use clap::{Parser, Subcommand};

/// Keeps `--log-level` last in help output
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

#[derive(Parser)]
#[command(name = "buildgate", version, about = "Runs build plugins and gates the build on their findings", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: BUILDGATE_LOG=] [default: info]
    #[arg(
        long,
        env = "BUILDGATE_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a default buildgate.toml config file
    Init(InitArgs),
    /// Run the configured plugins against a build
    Run(RunArgs),
}

#[derive(Parser)]
pub struct InitArgs {
    /// Where to write the default config
    #[arg(long, default_value = "buildgate.toml")]
    pub config: String,

    /// Replace the file if it already exists
    #[arg(long)]
    pub r#override: bool,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to config file (initialize with `buildgate init`)
    #[arg(long, default_value = "buildgate.toml")]
    pub config: String,

    /// Build number, overrides `build.id`
    #[arg(long, env = "BUILDGATE_BUILD_ID")]
    pub build_id: Option<String>,

    /// Branch name, overrides `build.branch`
    #[arg(long, env = "BUILDGATE_BRANCH")]
    pub branch: Option<String>,

    /// Commit hash, overrides `build.commit_id`
    #[arg(long, env = "BUILDGATE_COMMIT")]
    pub commit: Option<String>,

    /// Output file path (.md or .json), overrides `output.path`
    #[arg(long)]
    pub output: Option<String>,

    /// Dry run: only list the plugins without running them
    #[arg(long)]
    pub dry_run: bool,
}
