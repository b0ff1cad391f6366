//! SignalR hub client CLI - listen to or invoke a hub from the terminal.
//!
//! This is the main binary entry point. See the `signalr_client` library
//! for the core functionality.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use signalr_client::{Client, ClientConfig, ClientInvocationMessage, Messages, Session};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
/// mimalloc provides better multi-threaded performance than the system allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser)]
#[command(name = "signalr-client")]
#[command(version)]
#[command(about = "Connect to a SignalR hub and stream its pushes")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the loaded configuration.
#[derive(Args)]
struct ConnectionArgs {
    /// Server host, optionally with port
    #[arg(long, global = true)]
    host: Option<String>,
    /// Client protocol version
    #[arg(long, global = true)]
    protocol: Option<String>,
    /// Hub subscription JSON, e.g. '[{"name":"chat"}]'
    #[arg(long, global = true)]
    connection_data: Option<String>,
    /// Use http/ws instead of https/wss
    #[arg(long, global = true)]
    insecure: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and print every pushed envelope as a JSON line
    Listen,
    /// Send one invocation, then print pushes until the session ends
    Invoke {
        /// Hub name
        #[arg(long)]
        hub: String,
        /// Method name
        #[arg(long)]
        method: String,
        /// Invocation id
        #[arg(long, default_value_t = 1)]
        id: i64,
        /// Text arguments, concatenated in order
        args: Vec<String>,
    },
    /// Print the effective configuration
    Config,
}

impl ConnectionArgs {
    fn apply(self, config: &mut ClientConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(protocol) = self.protocol {
            config.protocol_version = protocol;
        }
        if let Some(data) = self.connection_data {
            config.connection_data = data;
        }
        if self.insecure {
            config.secure = false;
        }
    }
}

async fn connect(config: ClientConfig) -> Result<Session> {
    if config.host.is_empty() {
        anyhow::bail!("No host configured. Pass --host or set SIGNALR_HOST.");
    }
    let client = Client::new(config)?;
    let session = client
        .initialize()
        .await
        .context("Failed to initialize session")?;
    Ok(session)
}

/// Print envelopes until the stream ends, then report why.
async fn print_messages(mut messages: Messages) -> Result<()> {
    while let Some(envelope) = messages.recv().await {
        println!("{}", serde_json::to_string(&envelope)?);
    }
    let reason = messages.terminated().await;
    eprintln!("Session ended: {}", reason);
    Ok(())
}

async fn run_listen(config: ClientConfig) -> Result<()> {
    let mut session = connect(config).await?;
    let messages = session
        .messages()
        .context("Message stream already taken")?;
    log::info!(
        "Listening on connection {}",
        session.negotiation().connection_id
    );
    print_messages(messages).await
}

async fn run_invoke(
    config: ClientConfig,
    hub: String,
    method: String,
    id: i64,
    args: Vec<String>,
) -> Result<()> {
    let mut session = connect(config).await?;
    let messages = session
        .messages()
        .context("Message stream already taken")?;

    let invocation = args
        .into_iter()
        .fold(ClientInvocationMessage::new(id, hub, method), |msg, arg| {
            msg.arg(arg)
        });
    session
        .write(&invocation)
        .await
        .context("Failed to send invocation")?;

    print_messages(messages).await
}

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr so stdout stays a clean JSON-lines stream.
    // SIGNALR_LOG_FILE redirects logs to a file instead.
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Ok(path) = std::env::var("SIGNALR_LOG_FILE") {
        let log_file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create log file at {}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(env_logger::Target::Stderr);
    }
    builder.format_timestamp_secs().init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load()?;
    cli.connection.apply(&mut config);

    match cli.command {
        Commands::Listen => run_listen(config).await?,
        Commands::Invoke {
            hub,
            method,
            id,
            args,
        } => run_invoke(config, hub, method, id, args).await?,
        Commands::Config => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(())
}
