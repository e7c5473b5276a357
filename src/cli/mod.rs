//! # Command Line Interface
//!
//! `nsx-cert`: manage the NSX client certificate kept in the plugin database.

pub mod certificate;
pub mod output;

use crate::certificates::NSX_OPENSTACK_IDENTITY;
use crate::config::DatabaseConfig;
use crate::storage::{create_pool, SqlxClientCertificateRepository};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use certificate::{handle_certificate_command, CertificateCommands, CertificateSummary};

#[derive(Parser, Debug)]
#[command(name = "nsx-cert")]
#[command(about = "NSX client certificate administration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: CertificateCommands,

    /// Database URL override
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Certificate identity
    #[arg(long, global = true, default_value = NSX_OPENSTACK_IDENTITY)]
    pub identity: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialise_logging(cli.verbose)?;

    let mut database = DatabaseConfig::from_env();
    if let Some(url) = cli.database_url {
        database.url = url;
    }
    // The certificate table must exist before anything can be stored
    database.auto_migrate = true;

    let pool = create_pool(&database).await?;
    let repository = SqlxClientCertificateRepository::new(pool);

    handle_certificate_command(cli.command, &repository, &cli.identity).await
}

/// Install the stderr subscriber; a subscriber that is already installed is kept.
pub fn initialise_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).finish(),
    )
    .is_err()
    {
        // Already set, e.g. when driven from tests
    }
    Ok(())
}
