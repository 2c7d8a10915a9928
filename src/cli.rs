use clap::{Parser, Subcommand};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::PostgresLedgerRepository;
use crate::config::Config;
use crate::services::LedgerService;

#[derive(Parser)]
#[command(name = "referral-ledger")]
#[command(about = "Referral Ledger - wallets, referral rewards and withdrawals", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,

    /// Wallet inspection commands
    #[command(subcommand)]
    Wallet(WalletCommands),
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Print a wallet and its audit result
    Show {
        /// User UUID
        #[arg(value_name = "USER_ID")]
        user_id: Uuid,
    },

    /// Audit every wallet against its transaction log
    Reconcile,
}

async fn ledger_service(config: &Config) -> anyhow::Result<LedgerService> {
    let pool = crate::db::create_pool(config).await?;
    let repository = PostgresLedgerRepository::new(pool, config.lock_timeout());
    Ok(LedgerService::new(Arc::new(repository)))
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;
    println!("✓ Database migrations completed");

    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Database URL: {}", mask_password(&config.database_url));
    println!("  Database Max Connections: {}", config.database_max_connections);
    println!("  Ledger Lock Timeout: {} ms", config.ledger_lock_timeout_ms);
    println!("  Settings Refresh: {} s", config.settings_refresh_secs);
    println!("  Admin API Key: ****");
    println!("  CORS Origins: {}", config.cors_allowed_origins.join(", "));
    println!("  Log Format: {:?}", config.log_format);

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

pub async fn handle_wallet_show(config: &Config, user_id: Uuid) -> anyhow::Result<()> {
    let ledger = ledger_service(config).await?;
    let audit = ledger.audit_wallet(user_id).await?;
    let wallet = &audit.cached;

    println!("Wallet {}", user_id);
    println!("  Available:          {}", wallet.available_balance);
    println!("  Pending withdrawal: {}", wallet.pending_withdrawal);
    println!("  Total earned:       {}", wallet.total_earned);
    println!("  Total withdrawn:    {}", wallet.total_withdrawn);
    println!("  Transactions:       {}", audit.transaction_count);

    if audit.consistent {
        println!("✓ Wallet reconciles with its transaction log");
        Ok(())
    } else {
        anyhow::bail!(
            "Wallet {} does not reconcile: replayed available balance is {}",
            user_id,
            audit.replayed.available_balance
        )
    }
}

pub async fn handle_wallet_reconcile(config: &Config) -> anyhow::Result<()> {
    let ledger = ledger_service(config).await?;
    let report = ledger.reconcile_all().await?;

    println!("Checked {} wallets", report.checked);
    if report.mismatches.is_empty() {
        println!("✓ All wallets reconcile");
        return Ok(());
    }

    println!("{:<38} {:>16} {:>16}", "User", "Cached", "Replayed");
    println!("{}", "-".repeat(72));
    for audit in &report.mismatches {
        println!(
            "{:<38} {:>16} {:>16}",
            audit.user_id, audit.cached.available_balance, audit.replayed.available_balance
        );
    }
    anyhow::bail!("{} wallets do not reconcile", report.mismatches.len())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
