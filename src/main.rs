use anyhow::{Context, Result};
use clap::Parser;
use spotval::config::Credentials;
use spotval::exchange::ExchangeClient;
use spotval::fx::BitfinexRateSource;
use spotval::valuation::{Valuation, ValuationService};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "spotval")]
#[command(about = "Values exchange spot balances in JPY")]
struct Cli {
    /// Asset symbol to report on its own (e.g. BTC); omit for the full mapping
    asset: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let credentials = Credentials::from_env().context("exchange credentials not configured")?;
    let exchange = ExchangeClient::new(credentials);
    let fx = BitfinexRateSource::new();
    let service = ValuationService::new(exchange, fx);

    match service.latest_assets_in_jpy(cli.asset.as_deref()).await? {
        Valuation::Asset(value) => println!("{value}"),
        Valuation::Portfolio(totals) => println!("{}", serde_json::to_string_pretty(&totals)?),
    }

    Ok(())
}
