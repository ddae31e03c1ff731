use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use beacon_core::BeaconConfig;
use beacon_protocol::{BridgeRequest, Command};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

mod app;
mod bridge;
mod dispatch;

use app::{App, StdoutSink};
use dispatch::Dispatcher;

#[derive(Parser)]
#[command(name = "beacon", version, about = "Local notification scheduler")]
struct Cli {
    /// Config file; falls back to BEACON_CONFIG, then ~/.beacon/beacon.toml.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Schedule a notification from a JSON option mapping.
    Show { options: String },
    /// Print every stored notification.
    List,
    /// Print the option mappings of the given ids.
    Get { ids: Vec<i32> },
    /// Remove notifications entirely.
    Cancel {
        ids: Vec<i32>,
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },
    /// Dismiss notifications from the display, keeping them stored.
    Clear {
        ids: Vec<i32>,
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },
    /// Import an exported `{ "<id>": "<json>" }` map into the store.
    Import { file: PathBuf },
    /// Send one raw bridge action, e.g. `exec getByIds '[[2,5,9]]'`.
    Exec {
        action: String,
        #[arg(default_value = "[]")]
        args: String,
    },
    /// Restore wake-ups, fire them on time and serve the bridge on stdin.
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon_daemon=info,beacon_scheduler=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > BEACON_CONFIG env > ~/.beacon/beacon.toml
    let config_path = cli.config.clone().or_else(|| std::env::var("BEACON_CONFIG").ok());
    let config = BeaconConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(code = e.code(), "Config load failed ({}), using defaults", e);
        BeaconConfig::default()
    });

    let (app, ui_loop) = App::open(config)?;
    let ui_task = tokio::spawn(ui_loop.run());
    let dispatcher = Dispatcher::new(app.pipeline.clone(), Arc::new(StdoutSink));

    match cli.command {
        Cmd::Run => run(&app, &dispatcher).await?,
        Cmd::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let count = beacon_store::import_entries(app.store.as_ref(), &text)?;
            info!(count, file = %file.display(), "entries imported");
            println!("{count}");
        }
        Cmd::Exec { action, args } => {
            let args: Vec<Value> = serde_json::from_str(&args).context("args must be a JSON array")?;
            let request = BridgeRequest {
                id: "cli".to_string(),
                action,
                args,
            };
            println!("{}", serde_json::to_string_pretty(&dispatcher.respond(&request))?);
        }
        other => {
            let command = to_command(other)?;
            if let Some(payload) = dispatcher.handle(command)? {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
        }
    }

    // Dropping the last renderer handle lets the UI loop drain and stop.
    drop(dispatcher);
    drop(app);
    ui_task.await?;
    Ok(())
}

fn to_command(cmd: Cmd) -> anyhow::Result<Command> {
    let ids = |raw: Vec<i32>| raw.into_iter().map(beacon_core::NotificationId).collect::<Vec<_>>();
    Ok(match cmd {
        Cmd::Show { options } => match serde_json::from_str::<Value>(&options)? {
            Value::Object(props) => Command::Show(props),
            _ => anyhow::bail!("options must be a JSON object"),
        },
        Cmd::List => Command::GetAll,
        Cmd::Get { ids: raw } => Command::GetByIds(ids(raw)),
        Cmd::Cancel { all: true, .. } => Command::CancelAll,
        Cmd::Cancel { ids: raw, .. } => match ids(raw).as_slice() {
            [id] => Command::Cancel(*id),
            _ => anyhow::bail!("cancel takes exactly one id, or --all"),
        },
        Cmd::Clear { all: true, .. } => Command::ClearAll,
        Cmd::Clear { ids: raw, .. } => match ids(raw).as_slice() {
            [id] => Command::Clear(*id),
            _ => anyhow::bail!("clear takes exactly one id, or --all"),
        },
        Cmd::Import { .. } | Cmd::Exec { .. } | Cmd::Run => {
            anyhow::bail!("not a single bridge command")
        }
    })
}

async fn run(app: &App, dispatcher: &Dispatcher) -> anyhow::Result<()> {
    let report = app.registry().restore(chrono::Utc::now())?;
    info!(
        armed = report.armed,
        advanced = report.advanced,
        missed = report.missed,
        "beacon daemon started"
    );

    // spawn timer loop; it fires due wake-ups through the trigger pipeline
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let tick = Duration::from_millis(app.config.timer.tick_millis.max(1));
    let timer = tokio::spawn(app.timer.clone().run(app.pipeline.clone(), tick, shutdown_rx));

    bridge::serve(dispatcher).await?;

    // signal timer to stop
    let _ = shutdown_tx.send(true);
    timer.await?;
    Ok(())
}
