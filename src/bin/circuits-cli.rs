use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "circuits-cli")]
#[command(about = "Management CLI for the circuits demo service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List every registered circuit
    List,
    /// Show one circuit
    Get { name: String },
    /// Register a circuit (no-op if it exists)
    Add {
        name: String,
        #[arg(short, long)]
        break_limit: Option<u32>,
    },
    /// Drop every circuit
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::List => {
            let res = client.get(format!("{}/admin/circuits", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Get { name } => {
            let res = client.get(circuit_url(base, &name)?).send().await?;
            print_response(res).await?;
        }
        Commands::Add { name, break_limit } => {
            let mut req = client.put(circuit_url(base, &name)?);
            if let Some(limit) = break_limit {
                req = req.query(&[("break_limit", limit)]);
            }
            print_response(req.send().await?).await?;
        }
        Commands::Reset => {
            let res = client.delete(format!("{}/admin/circuits", base)).send().await?;
            if res.status().is_success() {
                println!("Registry reset");
            } else {
                eprintln!("Error: Admin API returned status {}", res.status());
            }
        }
    }

    Ok(())
}

/// `{base}/admin/circuits/{name}` with `name` encoded as one path segment.
fn circuit_url(base: &str, name: &str) -> Result<reqwest::Url, Box<dyn std::error::Error>> {
    let mut url = reqwest::Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("cannot append a path to {}", base))?
        .pop_if_empty()
        .extend(["admin", "circuits", name]);
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
