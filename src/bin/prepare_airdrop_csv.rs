use std::path::PathBuf;
use std::time::Duration;

use airdrop_tools::io::rpc::{self, RpcClient};
use airdrop_tools::prepare::{self, PrepareOptions};
use airdrop_tools::model::TokenAddress;
use airdrop_tools::{Result, amount, logging};
use bigdecimal::{BigDecimal, Signed};
use clap::Parser;

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    if let Err(error) = logging::init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let rpc_url = rpc::resolve_rpc_url(cli.rpc_url)?;
    let client = RpcClient::new(rpc_url, Duration::from_secs(cli.rpc_timeout))?;

    println!("Fetching token info from {}...", cli.token_address);
    let token = rpc::fetch_token_info(&client, &cli.token_address.address)?;
    println!("Token: {}", token.symbol);
    println!("Decimals: {}", token.decimals);
    println!();

    let mut options = PrepareOptions::new(cli.input_csv).with_min_amount(cli.min_amount);
    if let Some(output) = cli.output_csv {
        options = options.with_output(output);
    }
    let summary = prepare::prepare_csv(&options, token.decimals)?;
    println!("{summary}");
    Ok(())
}

fn parse_min_amount(value: &str) -> std::result::Result<BigDecimal, String> {
    let amount =
        amount::parse_amount(value).ok_or_else(|| format!("'{value}' is not a decimal amount"))?;
    if amount.is_negative() {
        return Err("the minimum amount cannot be negative".to_string());
    }
    Ok(amount)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Prepares an airdrop CSV with amounts scaled to the token's decimals.",
    after_help = "Example:\n  prepare_airdrop_csv eigen_yields_airdrop.csv \
                  0x639E387DE0fF0E68a42b5Ae77b86dA8F0e15623c --min-amount 0.01"
)]
struct Cli {
    /// Headerless CSV of `address,amount` rows, amounts in whole tokens.
    input_csv: PathBuf,

    /// Address of the ERC-20 token contract.
    token_address: TokenAddress,

    /// Output path for the `address,baseUnits` rows.
    output_csv: Option<PathBuf>,

    /// Minimum amount, in whole tokens, kept in the airdrop.
    #[arg(long, value_parser = parse_min_amount, default_value = "0.00001")]
    min_amount: BigDecimal,

    /// JSON-RPC endpoint used to read the token decimals and symbol.
    #[arg(long, env = "RPC_URL", hide_env_values = true)]
    rpc_url: Option<String>,

    /// Timeout, in seconds, of each RPC request.
    #[arg(long, default_value_t = rpc::DEFAULT_TIMEOUT.as_secs())]
    rpc_timeout: u64,
}
