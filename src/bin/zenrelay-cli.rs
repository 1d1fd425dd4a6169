use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "zenrelay-cli")]
#[command(about = "Command-line client for the ZenRelay API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service health
    Health,
    /// Target network descriptor
    Network,
    /// Current wallet state
    Wallet,
    /// Request wallet authorization
    Connect,
    /// Re-check the wallet's chain against the target network
    Reconcile,
    /// Register the target network with the wallet
    AddNetwork,
    /// Forget the local session
    Disconnect,
    /// List swappable tokens
    Tokens,
    /// Price a swap without executing it
    Quote {
        #[arg(long, default_value = "ZTC")]
        from: String,
        #[arg(long, default_value = "USDT")]
        to: String,
        amount: String,
    },
    /// Execute a swap
    Swap {
        #[arg(long, default_value = "ZTC")]
        from: String,
        #[arg(long, default_value = "USDT")]
        to: String,
        amount: String,
    },
    /// Badge progress
    Badge,
    /// Mint the swap badge
    Mint,
    /// Show or refresh suggestions
    Suggestions {
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::Network => client.get(format!("{base}/api/network")).send().await?,
        Commands::Wallet => client.get(format!("{base}/api/wallet")).send().await?,
        Commands::Connect => client.post(format!("{base}/api/wallet/connect")).send().await?,
        Commands::Reconcile => client.post(format!("{base}/api/wallet/reconcile")).send().await?,
        Commands::AddNetwork => client.post(format!("{base}/api/wallet/network")).send().await?,
        Commands::Disconnect => client.post(format!("{base}/api/wallet/disconnect")).send().await?,
        Commands::Tokens => client.get(format!("{base}/api/swap/tokens")).send().await?,
        Commands::Quote { from, to, amount } => {
            client
                .post(format!("{base}/api/swap/quote"))
                .json(&swap_body(from, to, amount))
                .send()
                .await?
        }
        Commands::Swap { from, to, amount } => {
            client
                .post(format!("{base}/api/swap"))
                .json(&swap_body(from, to, amount))
                .send()
                .await?
        }
        Commands::Badge => client.get(format!("{base}/api/badge")).send().await?,
        Commands::Mint => client.post(format!("{base}/api/badge/mint")).send().await?,
        Commands::Suggestions { refresh: false } => {
            client.get(format!("{base}/api/assistant")).send().await?
        }
        Commands::Suggestions { refresh: true } => {
            client.post(format!("{base}/api/assistant/refresh")).send().await?
        }
    };

    print_response(res).await
}

fn swap_body(from: String, to: String, amount: String) -> Value {
    json!({ "from": from, "to": to, "amount": amount })
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
