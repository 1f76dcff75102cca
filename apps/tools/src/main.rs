use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use publisher::{ClientId, CommandDispatcher, ConnectOptions, DEFAULT_BROKER_URL};
use shared::domain::{EntityKind, LogicalCommand, Side};
use translator::{Calibration, ColorPolicy, Translator};
use url::Url;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = DEFAULT_BROKER_URL)]
    broker_url: String,
    #[arg(long, default_value = publisher::DEFAULT_CLIENT_ID_PREFIX)]
    client_id_prefix: String,
    #[arg(long, default_value = translator::calibration::DEFAULT_REVISION)]
    calibration: String,
    /// TOML calibration table; overrides `--calibration`.
    #[arg(long)]
    calibration_file: Option<PathBuf>,
    #[arg(long, default_value = "strict")]
    color_policy: ColorPolicy,
    #[arg(long, default_value_t = 5_000)]
    connect_timeout_ms: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the messages a command translates to without connecting.
    Translate(CommandArgs),
    /// Translate a command and publish it to the broker.
    Send(CommandArgs),
    /// List every entity with the values it accepts.
    Catalog,
}

#[derive(Args, Debug)]
struct CommandArgs {
    entity: EntityKind,
    #[arg(long)]
    side: Option<Side>,
    #[arg(long)]
    action: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    color: Option<String>,
}

impl CommandArgs {
    fn logical_command(&self) -> LogicalCommand {
        LogicalCommand {
            entity: self.entity,
            action: self.action.as_deref().map(Into::into),
            side: self.side.map(Into::into),
            position: self.position.as_deref().map(Into::into),
            color: self.color.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let translator = build_translator(&cli)?;

    match &cli.command {
        Command::Translate(args) => {
            for message in translator.translate(&args.logical_command())? {
                let payload = serde_json::to_string(&message.payload)?;
                println!("{} {}", message.topic, payload);
            }
        }
        Command::Send(args) => {
            let broker_url: Url = cli
                .broker_url
                .parse()
                .with_context(|| format!("invalid broker url '{}'", cli.broker_url))?;
            let mut options = ConnectOptions::new(broker_url);
            options.reconnect_period = None;
            let client_id = ClientId::generate(&cli.client_id_prefix);
            let connection = publisher::connect(&options, client_id)?;
            connection
                .wait_ready(Duration::from_millis(cli.connect_timeout_ms))
                .await?;

            let dispatcher = CommandDispatcher::new(translator, connection.clone());
            let published = dispatcher.dispatch(&args.logical_command())?;
            connection.disconnect().await;

            let stats = connection.stats();
            println!(
                "published {} message(s) as {} ({} failed)",
                published.len(),
                connection.client_id(),
                stats.failed
            );
        }
        Command::Catalog => {
            println!("{}", serde_json::to_string_pretty(&translator.catalog())?);
        }
    }

    Ok(())
}

fn build_translator(cli: &Cli) -> Result<Translator> {
    let calibration = match &cli.calibration_file {
        Some(path) => Calibration::from_file(path)?,
        None => Calibration::builtin(&cli.calibration)?,
    };
    Ok(Translator::new(calibration, cli.color_policy))
}
