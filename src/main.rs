use affiliate_core::{
    cache::{derive_key, QueryFamily},
    config::Config,
    fees::{self, decode_tax_rules},
    state::AppState,
};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "affiliate-core", about = "Query cache and fee tools for the affiliate dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the withdrawal charge for an amount
    Quote {
        #[arg(long)]
        amount: f64,
        /// Tax rules as sent by the backend (JSON array of {operator, target, tax})
        #[arg(long, default_value = "[]")]
        rules: String,
    },
    /// Print the cache key for a namespace and parameters
    Key {
        #[arg(long)]
        namespace: String,
        /// name=value, repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
    /// Fetch a listing through the cache
    Fetch {
        #[arg(long)]
        family: QueryFamily,
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
}

// Values that parse as JSON keep their type (`page=2` is a number), anything
// else is a string.
fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Quote { amount, rules } => {
            let rules = decode_tax_rules(&Value::String(rules))?;
            let quote = fees::net_after_charge(amount, &rules)?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Command::Key { namespace, params } => {
            let params: Map<String, Value> = params.into_iter().collect();
            println!("{}", derive_key(&namespace, &params)?);
        }
        Command::Fetch { family, params } => {
            let config = Config::from_env();
            tracing::info!("Configuration loaded: {:?}", config);

            let state = AppState::from_config(config)?;
            let params: Map<String, Value> = params.into_iter().collect();
            let payload = state.query(family, &params).await?;
            println!("{}", serde_json::to_string_pretty(&*payload)?);
        }
    }

    Ok(())
}
