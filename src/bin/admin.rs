//! CLI administration tool for newsletter sending domains.
//!
//! Connects, verifies and disconnects custom sending domains, and performs
//! database operations without requiring the web application.
//!
//! # Usage
//!
//! ```bash
//! # Connect a domain to newsletter 42
//! cargo run --bin admin -- domain connect 42 mail.example.com
//!
//! # Re-check DNS verification
//! cargo run --bin admin -- domain verify 42
//!
//! # List verified domains
//! cargo run --bin admin -- domain list --verified
//!
//! # Disconnect without prompting
//! cargo run --bin admin -- domain disconnect 42 -y
//!
//! # Check database connection / apply migrations
//! cargo run --bin admin -- db check
//! cargo run --bin admin -- db migrate
//! ```
//!
//! # Environment Variables
//!
//! See [`newsletter_domains::config`] for the full list. `DATABASE_URL` and
//! `RESEND_API_KEY` are required.

use newsletter_domains::config::{self, Config};
use newsletter_domains::domain::entities::{Domain, VerificationRecord};
use newsletter_domains::infrastructure::persistence::PgDomainRepository;
use newsletter_domains::infrastructure::provider::ResendClient;
use newsletter_domains::prelude::SendingDomainService;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type Service = SendingDomainService<PgDomainRepository, ResendClient>;

/// CLI tool for managing newsletter sending domains.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage sending domains
    Domain {
        #[command(subcommand)]
        action: DomainAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Sending domain subcommands.
#[derive(Subcommand)]
enum DomainAction {
    /// Connect a sending domain to a newsletter
    Connect {
        /// Newsletter ID
        newsletter_id: i64,

        /// Domain name (e.g., "mail.example.com")
        name: String,
    },

    /// Re-check verification status and report the result
    Verify { newsletter_id: i64 },

    /// Register with the provider if needed, otherwise refresh statuses
    Sync { newsletter_id: i64 },

    /// Show the newsletter's domain and its DNS records
    Show { newsletter_id: i64 },

    /// List all domains
    List {
        /// Only fully verified domains
        #[arg(long)]
        verified: bool,
    },

    /// Disconnect the newsletter's domain
    Disconnect {
        newsletter_id: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Record whether a DMARC record has been published
    Dmarc {
        newsletter_id: i64,

        #[arg(action = clap::ArgAction::Set)]
        added: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Invalid configuration")?;
    init_tracing(&config)?;
    config.print_summary();

    let pool = connect(&config).await?;

    match cli.command {
        Commands::Domain { action } => {
            let service = build_service(&config, pool);
            handle_domain_action(action, &service).await?
        }
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Installs the tracing subscriber; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid RUST_LOG directive '{}'", config.log_level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

fn build_service(config: &Config, pool: PgPool) -> Service {
    let repository = Arc::new(PgDomainRepository::new(Arc::new(pool)));
    let provider = Arc::new(ResendClient::with_base_url(
        config.resend_api_key.clone(),
        config.resend_api_url.clone(),
    ));
    SendingDomainService::new(repository, provider)
}

/// Dispatches domain management commands.
async fn handle_domain_action(action: DomainAction, service: &Service) -> Result<()> {
    match action {
        DomainAction::Connect {
            newsletter_id,
            name,
        } => connect_domain(service, newsletter_id, &name).await?,
        DomainAction::Verify { newsletter_id } => verify_domain(service, newsletter_id).await?,
        DomainAction::Sync { newsletter_id } => {
            println!("{}", "🔄 Syncing domain...".bright_blue());
            let domain = service.get_for_newsletter(newsletter_id).await?;
            let domain = service.register_or_sync(domain.id).await?;
            print_domain(&domain);
        }
        DomainAction::Show { newsletter_id } => {
            let domain = service.get_for_newsletter(newsletter_id).await?;
            print_domain(&domain);
        }
        DomainAction::List { verified } => list_domains(service, verified).await?,
        DomainAction::Disconnect { newsletter_id, yes } => {
            disconnect_domain(service, newsletter_id, yes).await?
        }
        DomainAction::Dmarc {
            newsletter_id,
            added,
        } => {
            let domain = service.set_dmarc_added(newsletter_id, added).await?;
            println!(
                "{} DMARC for {} marked as {}",
                "✅".green(),
                domain.name.cyan(),
                if added { "added".green() } else { "not added".yellow() }
            );
        }
    }

    Ok(())
}

/// Connects a domain and prints the DNS records the tenant must publish.
async fn connect_domain(service: &Service, newsletter_id: i64, name: &str) -> Result<()> {
    println!("{}", "🌐 Connect Sending Domain".bright_blue().bold());
    println!();

    match service.connect(newsletter_id, name).await {
        Ok(domain) => {
            println!("{}", "✅ Domain connected".green().bold());
            println!();
            print_domain(&domain);
            Ok(())
        }
        Err(e) if e.is_user_correctable() => {
            println!("{} {}", "❌".red(), e.to_string().red());
            Ok(())
        }
        Err(e) => Err(e).context("Failed to connect domain"),
    }
}

async fn verify_domain(service: &Service, newsletter_id: i64) -> Result<()> {
    println!("{}", "🔍 Verifying domain...".bright_blue());

    let domain = service.get_for_newsletter(newsletter_id).await?;
    if service.verify(domain.id).await? {
        println!("{} {} is verified", "✅".green(), domain.name.cyan().bold());
    } else {
        println!(
            "{} {} is not verified yet. DNS changes can take a while to propagate.",
            "⏳".yellow(),
            domain.name.cyan().bold()
        );
    }

    Ok(())
}

/// Lists domains with their three statuses.
///
/// # Output Format
///
/// ```text
/// 📋 Sending Domains
///
///   ID  Newsletter  Name                           Status     DKIM       SPF
///   ─────────────────────────────────────────────────────────────────────────────
///   1   42          mail.example.com               success    success    success
/// ```
async fn list_domains(service: &Service, only_verified: bool) -> Result<()> {
    println!("{}", "📋 Sending Domains".bright_blue().bold());
    println!();

    let domains = service.list_domains(only_verified).await?;

    if domains.is_empty() {
        println!("{}", "  No domains found".yellow());
        return Ok(());
    }

    println!(
        "  {:<4} {:<11} {:<30} {:<10} {:<10} {:<10}",
        "ID".bright_white().bold(),
        "Newsletter".bright_white().bold(),
        "Name".bright_white().bold(),
        "Status".bright_white().bold(),
        "DKIM".bright_white().bold(),
        "SPF".bright_white().bold()
    );
    println!("  {}", "─".repeat(80).bright_black());

    for domain in &domains {
        println!(
            "  {:<4} {:<11} {:<30} {:<10} {:<10} {:<10}",
            domain.id.to_string().bright_black(),
            domain.newsletter_id.to_string().bright_black(),
            domain.name.cyan(),
            colored_status(domain.status.as_str()),
            colored_status(domain.dkim_status.as_str()),
            colored_status(domain.spf_status.as_str())
        );
    }

    println!();
    println!(
        "  Total: {}",
        domains.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn disconnect_domain(service: &Service, newsletter_id: i64, skip_confirm: bool) -> Result<()> {
    println!("{}", "🔌 Disconnect Sending Domain".bright_blue().bold());
    println!();

    let domain = service.get_for_newsletter(newsletter_id).await?;
    println!("  Domain: {}", domain.name.cyan());
    println!("  ID:     {}", domain.id.to_string().bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Disconnect this domain? Mail will fall back to the shared domain.")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    service
        .disconnect(newsletter_id)
        .await
        .context("Failed to disconnect domain")?;

    println!("{}", "✅ Domain disconnected".green().bold());
    println!();

    Ok(())
}

fn print_domain(domain: &Domain) {
    println!("  Name:       {}", domain.name.cyan().bold());
    println!("  Newsletter: {}", domain.newsletter_id);
    println!("  Status:     {}", colored_status(domain.status.as_str()));
    println!("  DKIM:       {}", colored_status(domain.dkim_status.as_str()));
    println!("  SPF:        {}", colored_status(domain.spf_status.as_str()));
    println!("  Region:     {}", domain.region);
    println!(
        "  DMARC:      {}",
        if domain.dmarc_added { "added".green() } else { "not added".yellow() }
    );

    if !domain.provider_records.is_empty() {
        println!();
        println!("{}", "DNS records:".bright_white().bold());
        for record in &domain.provider_records {
            print_record(record);
        }
    }
    println!();
}

fn print_record(record: &VerificationRecord) {
    let status = record.status.as_deref().unwrap_or("unknown");
    println!(
        "  {:<5} {:<4} {} {}",
        record.record.bright_white(),
        record.record_type,
        record.name.cyan(),
        colored_status(status)
    );
    match record.priority {
        Some(priority) => println!("        {} (priority {})", record.value.bright_black(), priority),
        None => println!("        {}", record.value.bright_black()),
    }
}

fn colored_status(status: &str) -> ColoredString {
    match status {
        "success" | "verified" => status.green(),
        "failed" => status.red(),
        "temporary_failure" => status.yellow(),
        _ => status.bright_black(),
    }
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;
            let domains: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
                .fetch_one(pool)
                .await
                .context("Table 'domains' is missing; run `admin db migrate`")?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  Domains: {}", domains.to_string().bright_green().bold());
        }
        DbAction::Migrate => {
            println!("{}", "📦 Applying migrations...".bright_blue());

            sqlx::migrate!("./migrations")
                .run(pool)
                .await
                .context("Failed to apply migrations")?;

            println!("{}", "✅ Migrations applied".green().bold());
        }
    }

    Ok(())
}
