use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use rcmount_daemon::http_server::api::client::ApiClient;

mod cli;

use cli::op::{Op, OpContext};
use cli::ops::{Cache, Daemon, Health, Init, Mount, Rc};

const DEFAULT_REMOTE: &str = "http://127.0.0.1:8090";
const LOG_FILE_PREFIX: &str = "rcmount.log";

#[derive(Parser, Debug)]
#[command(name = "rcmount", version, about = "Control an rclone VFS mount")]
struct Cli {
    /// Path to the config file (default: ~/.rcmount/config.toml)
    #[arg(long, global = true, env = "RCMOUNT_CONFIG")]
    config: Option<PathBuf>,

    /// API address of a running daemon
    #[arg(long, global = true, env = "RCMOUNT_REMOTE", default_value = DEFAULT_REMOTE)]
    remote: Url,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a starter config file
    Init(Init),
    /// Run the control-plane service in the foreground
    Daemon(Daemon),
    /// Check config and daemon liveness
    Health(Health),
    /// Mount lifecycle operations
    Mount(Mount),
    /// RC endpoint operations
    Rc(Rc),
    /// VFS cache operations
    Cache(Cache),
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rcmount")
        .join(common::config::CONFIG_FILE_NAME)
}

fn init_logging(log_dir: Option<&PathBuf>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .init();
            None
        }
    }
}

async fn run<O: Op>(op: &O, ctx: &OpContext) -> anyhow::Result<String> {
    Ok(op.execute(ctx).await?.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_ref());

    let ctx = OpContext {
        client: ApiClient::new(&cli.remote)?,
        config_path: cli.config.clone().unwrap_or_else(default_config_path),
    };

    let output = match &cli.command {
        Command::Init(op) => run(op, &ctx).await,
        Command::Daemon(op) => run(op, &ctx).await,
        Command::Health(op) => run(op, &ctx).await,
        Command::Mount(op) => run(op, &ctx).await,
        Command::Rc(op) => run(op, &ctx).await,
        Command::Cache(op) => run(op, &ctx).await,
    };

    match output {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            use owo_colors::OwoColorize;
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
