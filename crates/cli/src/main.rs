mod billing_commands;
mod db_commands;
mod fleet_commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use mirrorplane_config::MirrorplaneConfig;

#[derive(Parser)]
#[command(
    name = "mirrorplane",
    about = "Mirrorplane — control plane for message-mirroring worker fleets"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the control-plane server (default when no subcommand is given).
    Serve,
    /// Fleet inspection.
    Fleet {
        #[command(subcommand)]
        action: fleet_commands::FleetAction,
    },
    /// Database maintenance.
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
    /// Billing helpers.
    Billing {
        #[command(subcommand)]
        action: billing_commands::BillingAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Resolve config: file, then `MIRRORPLANE_*` env vars, then CLI flags.
fn resolve_config(cli: &Cli) -> MirrorplaneConfig {
    let mut config = mirrorplane_config::discover_and_load();
    mirrorplane_config::apply_env_overrides(&mut config);
    if let Some(ref bind) = cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = resolve_config(&cli);

    match cli.command {
        None | Some(Commands::Serve) => {
            info!(version = env!("CARGO_PKG_VERSION"), "mirrorplane starting");
            mirrorplane_gateway::start_control_plane(config).await
        },
        Some(Commands::Fleet { action }) => fleet_commands::handle_fleet(action, &config).await,
        Some(Commands::Db { action }) => db_commands::handle_db(action, &config).await,
        Some(Commands::Billing { action }) => billing_commands::handle_billing(action, &config),
    }
}
