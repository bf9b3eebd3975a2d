//! hipay: operator CLI for the payment gateway.
//!
//! Subcommands: transaction, token, capture, refund, cancel, verify-notify, verify-callback.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hipay_gateway::{GatewayClient, Operation, TokenLookup, TransactionLookup, TransactionRef};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Gateway lookups, maintenance and signature checks using HIPAY_* credentials.
#[derive(Parser, Debug)]
#[command(name = "hipay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch transaction details by transaction or order id.
    Transaction(TransactionArgs),
    /// Fetch vault token details.
    Token(TokenArgs),
    /// Capture an authorized transaction.
    Capture(MaintenanceArgs),
    /// Refund a captured transaction.
    Refund(MaintenanceArgs),
    /// Cancel an authorized transaction.
    Cancel(MaintenanceArgs),
    /// Check the hash of a server-to-server notification body.
    VerifyNotify(VerifyNotifyArgs),
    /// Check the hash of a redirect callback query string.
    VerifyCallback(VerifyCallbackArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct TransactionArgs {
    #[arg(long)]
    transaction_id: Option<String>,
    #[arg(long)]
    order_id: Option<String>,
}

#[derive(Args, Debug)]
struct TokenArgs {
    #[arg(long)]
    token: String,
    #[arg(long)]
    request_id: Option<String>,
}

#[derive(Args, Debug)]
struct MaintenanceArgs {
    /// Gateway transaction reference
    #[arg(long)]
    id: String,
    /// Amount in major units; omit for the full amount
    #[arg(long)]
    amount: Option<String>,
}

#[derive(Args, Debug)]
struct VerifyNotifyArgs {
    /// File holding the exact raw notification body
    #[arg(long)]
    body_file: PathBuf,
    #[arg(long)]
    hash: String,
}

#[derive(Args, Debug)]
struct VerifyCallbackArgs {
    /// URL-encoded query string, with or without the leading '?'
    #[arg(long)]
    query: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = GatewayClient::from_env().context("failed to initialize gateway client")?;
    tracing::info!("Environment: {}", client.environment()?);

    match cli.command {
        Commands::Transaction(args) => {
            let lookup = match (args.transaction_id, args.order_id) {
                (Some(id), _) => TransactionLookup::TransactionId(id),
                (None, Some(order_id)) => TransactionLookup::OrderId(order_id),
                (None, None) => bail!("either --transaction-id or --order-id is required"),
            };
            print_json(&client.get_transaction_details(&lookup).await?)?;
        }
        Commands::Token(args) => {
            let mut lookup = TokenLookup::new(args.token);
            lookup.request_id = args.request_id;
            print_json(&client.get_token_details(&lookup).await?)?;
        }
        Commands::Capture(args) => maintain(&client, args, Operation::Capture).await?,
        Commands::Refund(args) => maintain(&client, args, Operation::Refund).await?,
        Commands::Cancel(args) => maintain(&client, args, Operation::Cancel).await?,
        Commands::VerifyNotify(args) => {
            let body = std::fs::read_to_string(&args.body_file)
                .with_context(|| format!("failed to read {}", args.body_file.display()))?;
            return Ok(report(client.is_notify_signature_valid(&body, &args.hash)?));
        }
        Commands::VerifyCallback(args) => {
            let query = args.query.trim_start_matches('?');
            let url = reqwest::Url::parse(&format!("http://callback.invalid/?{}", query))
                .context("invalid query string")?;
            return Ok(report(client.is_callback_signature_valid(url.query_pairs())?));
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn maintain(
    client: &GatewayClient,
    args: MaintenanceArgs,
    operation: Operation,
) -> Result<()> {
    let transaction = TransactionRef {
        id: args.id,
        amount: args.amount,
    };
    print_json(&client.maintain(&transaction, operation).await?)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(valid: bool) -> ExitCode {
    if valid {
        println!("valid");
        ExitCode::SUCCESS
    } else {
        println!("invalid");
        ExitCode::FAILURE
    }
}
