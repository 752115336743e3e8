use core::time::Duration;
use std::{path::PathBuf, process::exit};

use clap::{Parser, Subcommand};
use color_eyre::{Section, config::HookBuilder, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use ipfspod::Settings;
use tracing::{error, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod add;
mod key;
mod new;
mod publish;

#[derive(Parser)]
#[command(about = "Publish podcasts on IPFS", long_about = None)]
#[command(version, author)]
struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// ipfs binary to invoke
    #[arg(long, env = "IPFSPOD_IPFS", global = true)]
    ipfs: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long, env = "IPFSPOD_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new podcast, in a new folder
    ///
    /// These fields all fill out a template and are easily changed later, in
    /// particular description should probably be longer than is conveniently
    /// given as an option.
    New(new::NewArgs),

    /// Add a new episode to a channel's episode list
    Add(add::AddArgs),

    /// Regenerate the RSS feed and update IPNS
    Publish(publish::PublishArgs),

    /// Inspect or remove ipfs keys
    #[command(subcommand)]
    Key(key::KeyCommands),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    HookBuilder::default()
        .display_env_section(true)
        .panic_section("It looks like ipfspod encountered a bug")
        .install()
        .expect("Failed to install color-eyre hook");

    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    if let Err(err) = entry(cli).await {
        error!("{:#}", err);
        exit(1);
    }
}

async fn entry(cli: Cli) -> eyre::Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())
        .await
        .note("Can't load settings")?;
    if let Some(ipfs) = cli.ipfs {
        settings.set_ipfs(ipfs);
    }

    match cli.command {
        Commands::New(args) => new::run(args, &settings).await,
        Commands::Add(args) => add::run(args, &settings).await,
        Commands::Publish(args) => publish::run(args, &settings).await,
        Commands::Key(command) => key::run(command, &settings).await,
    }
}

pub async fn long_task<T, E>(
    loading_msg: &'static str,
    f: impl Future<Output = Result<T, E>>,
    complete_msg: &'static str,
) -> Result<T, E> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(loading_msg);

    let result = f.await;

    match &result {
        Ok(_) => pb.finish_with_message(complete_msg),
        Err(_) => pb.finish_and_clear(),
    }
    result
}
