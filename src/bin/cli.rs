//! pagewatch CLI
//!
//! ```text
//! pagewatch new-user --name <name> --email <email>
//! pagewatch sub --name <site> --url <url> [--selector <css>] --user <email>
//! pagewatch update --key <api-key>
//! pagewatch status
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagewatch::{
    error::{AppError, Result},
    mail::SendGridMailer,
    models::{Config, NewSite},
    pipeline,
    storage::{SqliteStore, SubscriptionStore},
};

/// pagewatch - website change notifier
#[derive(Parser, Debug)]
#[command(name = "pagewatch", version, about = "Watches web pages and emails update digests")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "pagewatch.toml")]
    config: PathBuf,

    /// Override the database path from the config
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new user
    NewUser {
        /// Name of the user
        #[arg(long)]
        name: String,

        /// Email address of the user
        #[arg(long)]
        email: String,
    },

    /// Subscribe a user to a site
    Sub {
        /// Name of the site
        #[arg(long)]
        name: String,

        /// URL of the site
        #[arg(long)]
        url: String,

        /// CSS selector to watch (defaults to the whole document body)
        #[arg(long, default_value = "")]
        selector: String,

        /// Email address of the user to notify of changes
        #[arg(long)]
        user: String,
    },

    /// Check all sites for changes and send out notifications
    Update {
        /// Mail API key
        #[arg(long)]
        key: String,
    },

    /// Show registered users and their subscriptions
    Status,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let db_path = cli
        .db
        .unwrap_or_else(|| PathBuf::from(&config.store.db_path));
    let store = SqliteStore::open(&db_path)?;

    match cli.command {
        Command::NewUser { name, email } => {
            if store.find_user_by_email(&email).await?.is_some() {
                return Err(AppError::store(format!("email {email} already registered")));
            }
            let user = store.create_user(&name, &email).await?;
            log::info!("Registered user {} <{}>", user.name, user.email);
        }

        Command::Sub {
            name,
            url,
            selector,
            user,
        } => {
            // Reject malformed URLs before anything is written.
            url::Url::parse(&url)?;

            let site = store
                .add_site(
                    &user,
                    NewSite {
                        name,
                        url,
                        selector,
                    },
                )
                .await?;
            log::info!("Subscribed {} to {} ({})", user, site.name, site.url);
        }

        Command::Update { key } => {
            let mailer = SendGridMailer::new(key, &config.notifier)?;
            let outcome = pipeline::run_pass(&config, &store, &mailer).await?;

            log::info!(
                "Pass complete: {} users, {} sites checked, {} changed, {} failed",
                outcome.users_total,
                outcome.sites_checked,
                outcome.sites_changed,
                outcome.site_failures
            );
            log::info!(
                "Notifications: {} sent, {} failed",
                outcome.messages_sent,
                outcome.delivery_failures
            );
        }

        Command::Status => {
            let users = store.all_users().await?;
            if users.is_empty() {
                log::info!("No users registered in {}", db_path.display());
                return Ok(());
            }
            for user in &users {
                let sites = store.sites_for_user(user).await?;
                log::info!(
                    "{} <{}>: {} site(s)",
                    user.name,
                    user.email,
                    sites.len()
                );
                for site in sites {
                    log::info!("    {} - {}", site.name, site.url);
                }
            }
        }
    }

    Ok(())
}
