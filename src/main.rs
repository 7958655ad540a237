use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use cnpj_registry::{
    check_digits, format_digits, Config, HttpLookupProvider, RegistryId, Resolver, SqliteStore,
};

#[derive(Parser)]
#[command(name = "cnpj-registry", version, about = "Validate and look up Brazilian company registry ids (CNPJ)")]
struct Cli {
    /// Path to a TOML config file (defaults to ./cnpj-registry.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a registry id's check digits
    Validate { registry_id: String },

    /// Resolve a registry id from the local store or the lookup provider
    Resolve { registry_id: String },

    /// List every stored company
    List,

    /// Compute the two check digits for a 12-digit base
    CheckDigits { base: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    cnpj_registry::logging::init("warn");

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { registry_id } => run_validate(&registry_id),
        Command::CheckDigits { base } => run_check_digits(&base),
        Command::Resolve { registry_id } => {
            let resolver = build_resolver(cli.config.as_deref())?;
            run_resolve(&resolver, &registry_id).await
        }
        Command::List => {
            let resolver = build_resolver(cli.config.as_deref())?;
            run_list(&resolver).await
        }
    }
}

fn build_resolver(config_path: Option<&std::path::Path>) -> Result<Resolver> {
    let config = Config::load(config_path)?;

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    let provider = HttpLookupProvider::new(&config.provider.base_url, config.provider.timeout())
        .context("Failed to build lookup provider client")?;

    Ok(Resolver::new(Arc::new(store), Arc::new(provider)))
}

fn run_validate(raw: &str) -> Result<()> {
    match RegistryId::parse(raw) {
        Ok(id) => {
            println!("✓ {} is valid ({})", raw, id.digits());
            Ok(())
        }
        Err(reason) => bail!("{} is not a valid registry id: {}", raw, reason),
    }
}

fn run_check_digits(base: &str) -> Result<()> {
    let digits: Vec<u8> = base
        .chars()
        .filter(|c| !matches!(c, '.' | '/'))
        .map(|c| c.to_digit(10).map(|d| d as u8))
        .collect::<Option<_>>()
        .context("base must contain only digits and separators")?;

    let base: [u8; 12] = digits
        .try_into()
        .map_err(|d: Vec<u8>| anyhow::anyhow!("base must be 12 digits, got {}", d.len()))?;

    let [first, second] = check_digits(&base);
    let full: String = base
        .iter()
        .chain([first, second].iter())
        .map(|d| char::from(b'0' + d))
        .collect();

    println!("Check digits: {}{}", first, second);
    if let Some(formatted) = format_digits(&full) {
        println!("Registry id:  {}", formatted);
    }
    Ok(())
}

async fn run_resolve(resolver: &Resolver, raw: &str) -> Result<()> {
    let record = resolver.resolve(raw).await?;

    println!("🏢 {}", record.registry_id);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Name:       {}", record.name);
    if !record.trade_name.is_empty() {
        println!("Trade name: {}", record.trade_name);
    }
    println!("Address:    {}", record.address_line());
    if !record.email.is_empty() {
        println!("Email:      {}", record.email);
    }
    if !record.phone.is_empty() {
        println!("Phone:      {}", record.phone);
    }
    if !record.registry_authority.is_empty() {
        println!("EFR:        {}", record.registry_authority);
    }
    println!("Status:     {}", record.status);
    println!("Fetched at: {}", record.fetched_at.to_rfc3339());

    Ok(())
}

async fn run_list(resolver: &Resolver) -> Result<()> {
    let records = resolver.list().await?;

    if records.is_empty() {
        println!("No companies stored yet.");
        return Ok(());
    }

    for record in &records {
        println!(
            "{:>6}  {:<20}  {:<10}  {}",
            record.id.unwrap_or_default(),
            record.registry_id,
            record.status,
            record.name
        );
    }
    println!("\n✓ {} companies", records.len());

    Ok(())
}
