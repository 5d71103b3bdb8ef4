// src/main.rs
// command-admin - run maintenance commands from a web admin panel

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use command_admin::{
    AppState,
    config::{EnvSettings, ServerConfig, SettingsSource},
    reconcile::reconcile,
    registry::{CommandRegistry, load_registry},
    server,
};

#[derive(Parser)]
#[command(name = "command-admin")]
#[command(about = "Run registered maintenance commands from a web admin panel")]
#[command(version)]
struct Cli {
    /// Database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// TOML command manifest (overrides COMMAND_ADMIN_MANIFEST)
    #[arg(long, global = true)]
    manifest: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the admin panel (default)
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Mirror the registry into the commands table once
    Sync,

    /// List the commands in the registry
    Commands,

    /// Run one command and record the call, as the Run button does
    Run {
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logging first, so configuration warnings are not lost.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(ServerConfig::bootstrap_level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = ServerConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Some(path) = cli.manifest {
        config.manifest_path = Some(path);
    }

    let settings: Arc<dyn SettingsSource> = Arc::new(EnvSettings);
    let registry: Arc<dyn CommandRegistry> =
        Arc::new(load_registry(config.manifest_path.as_deref(), settings.clone())?);

    let command = cli.command.unwrap_or(Commands::Serve { host: None, port: None });

    if let Commands::Commands = command {
        let filter = settings.current().prefix;
        for (name, app) in registry.commands() {
            let marker = if name.starts_with(&filter) { "" } else { "  (hidden by prefix)" };
            let help = registry.help(&name).unwrap_or_default();
            println!("{name:<32} {app:<20} {help}{marker}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let pool = server::connect(&config.database_url).await?;
    let state = Arc::new(AppState::new(pool, registry, settings, &config.url_prefix));

    match command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            info!("Starting command-admin ({} commands registered)", state.registry.commands().len());
            server::serve(state, &config.bind_address()).await?;
        }
        Commands::Sync => {
            let prefix = state.settings.current().prefix;
            let report = reconcile(&state.commands, &state.registry.commands(), &prefix).await?;
            println!(
                "{} created, {} deleted, {} unchanged",
                report.created, report.deleted, report.kept
            );
        }
        Commands::Run { name } => {
            let call = state.invoker.invoke(&name).await?;
            let mut out = std::io::stdout();
            out.write_all(call.stdout.as_bytes())?;
            out.flush()?;
            eprintln!(
                "call #{} {} in {} ms",
                call.id,
                call.status,
                call.duration().num_milliseconds()
            );
            if !call.succeeded() {
                if let Some(error) = &call.error {
                    eprintln!("error: {error}");
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Commands => {}
    }

    Ok(ExitCode::SUCCESS)
}
