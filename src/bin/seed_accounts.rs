//! Seed accounts into the PostgreSQL store
//!
//! Ops tooling for development and demo environments; customer-facing
//! account opening lives outside this service.
//!
//! Usage:
//!   cargo run --bin seed_accounts -- --env dev
//!   cargo run --bin seed_accounts -- --env dev --owner 7 --currency USD --amount 250.00
//!
//! Without `--owner`, seeds the standard demo pair: owner 1 with 100.00 USD
//! and owner 2 with 50.00 USD.

use anyhow::{Context, bail};

use ledgercore::account::AccountRepository;
use ledgercore::config::AppConfig;
use ledgercore::db::Database;
use ledgercore::money;

fn arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let env = arg_value(&args, "--env").unwrap_or_else(|| "dev".to_string());

    let config = AppConfig::load(&env);
    let Some(url) = &config.postgres_url else {
        bail!("postgres_url is not set in config/{}.yaml", env);
    };

    let db = Database::connect(url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let seeds: Vec<(i64, String, String)> = match arg_value(&args, "--owner") {
        Some(owner) => {
            let owner: i64 = owner.parse().context("--owner must be an integer")?;
            let currency = arg_value(&args, "--currency").unwrap_or_else(|| "USD".to_string());
            let amount = arg_value(&args, "--amount").unwrap_or_else(|| "100.00".to_string());
            vec![(owner, currency, amount)]
        }
        None => vec![
            (1, "USD".to_string(), "100.00".to_string()),
            (2, "USD".to_string(), "50.00".to_string()),
        ],
    };

    for (owner, currency, amount) in seeds {
        let exponent = money::currency_exponent(&currency);
        let balance = money::parse_amount(&amount, exponent)
            .with_context(|| format!("invalid amount: {}", amount))?;

        let account_id = AccountRepository::open(db.pool(), owner, &currency, balance).await?;
        println!(
            "opened account {} (owner {}, {} {})",
            account_id, owner, amount, currency
        );
    }

    Ok(())
}
