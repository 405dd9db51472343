use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use keyward::config::Config;
use keyward::db::{AppState, Gateway, create_pool, init_db};
use keyward::email::{EmailService, Notifier};
use keyward::handlers;
use keyward::services::admins;

#[derive(Parser)]
#[command(name = "keyward", version, about = "Self-hosted license key server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create an admin account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

fn open_gateway(config: &Config) -> anyhow::Result<Gateway> {
    let pool = create_pool(&config.database_path, config.db_pool_size)
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    {
        let conn = pool.get().context("failed to get database connection")?;
        init_db(&conn).context("failed to initialize schema")?;
    }
    Ok(Gateway::new(pool, config.write_retry))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyward=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let db = open_gateway(&config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::CreateAdmin { username, password } => {
            let admin = admins::create_admin(&db, &username, &password)?;
            tracing::info!(username = %admin.username, "admin created");
            Ok(())
        }
        Command::Serve => serve(config, db),
    }
}

fn serve(config: Config, db: Gateway) -> anyhow::Result<()> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
        && admins::ensure_default_admin(&db, username, password)?
    {
        tracing::info!(username = %username, "bootstrap admin created");
    }

    // The blocking HTTP client must be built and dropped outside the runtime,
    // so this handle outlives `block_on`.
    let notifier: Arc<dyn Notifier> =
        Arc::new(EmailService::new(db.clone(), config.default_from_email.clone())?);

    let state = AppState {
        db,
        notifier: notifier.clone(),
        public_base_url: config.public_base_url.clone(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let app = handlers::app(state);
        let addr = config.addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        tracing::info!(addr = %addr, dev_mode = config.dev_mode, "keyward listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")
    })?;

    drop(runtime);
    drop(notifier);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
