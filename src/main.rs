// src/main.rs

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use job_connector::database::Database;
use job_connector::environment::{EnvironmentConfig, Secrets};
use job_connector::identity::AdminRepository;
use job_connector::import::{import_file, ImportKind};
use job_connector::start_web_server;

#[derive(Parser)]
#[command(name = "jobconnector")]
#[command(about = "Job board API server with OTP login")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Bulk-load seekers or jobs from a CSV file
    Import {
        /// "seekers" or "jobs"
        #[arg(long)]
        kind: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Create an admin account
    SeedAdmin {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        whatsapp: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(EnvFilter::new("job_connector=info,rocket::server=off")),
        )
        .init();

    let cli = Cli::parse();
    let env_config = EnvironmentConfig::load()?;

    match cli.command {
        Commands::Serve { port } => {
            let secrets = Secrets::from_env()?;
            start_web_server(env_config, secrets, port).await?;
        }
        Commands::Import { kind, file } => {
            let kind = ImportKind::parse(&kind)
                .ok_or_else(|| anyhow::anyhow!("Unknown import kind: {kind}"))?;
            let db = Database::new(&env_config.database_path).await?;
            let report = import_file(db.pool(), kind, &file).await?;
            info!(
                "Imported {} rows, skipped {}",
                report.inserted, report.skipped
            );
        }
        Commands::SeedAdmin {
            name,
            whatsapp,
            email,
        } => {
            if whatsapp.is_none() && email.is_none() {
                anyhow::bail!("An admin needs a WhatsApp number or an email address");
            }
            let db = Database::new(&env_config.database_path).await?;
            let admin = AdminRepository::new(db.pool())
                .create(name.as_deref(), whatsapp.as_deref(), email.as_deref())
                .await?;
            info!("Created admin {}", admin.id);
        }
    }

    Ok(())
}
