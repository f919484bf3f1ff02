use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator CLI for a running kfserving-proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness probe
    Alive,
    /// Model readiness as seen by the proxy
    Status,
    /// Submit a file inference job
    Run {
        /// Directory holding the input files
        #[arg(long)]
        input: PathBuf,
        /// Directory receiving results.json
        #[arg(long)]
        output: PathBuf,
    },
    /// Ask the proxy to shut down gracefully
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Alive => client.get(format!("{}/", base)).send().await?,
        Commands::Status => client.get(format!("{}/status", base)).send().await?,
        Commands::Run { input, output } => {
            client
                .post(format!("{}/run", base))
                .json(&json!({"type": "file", "input": input, "output": output}))
                .send()
                .await?
        }
        Commands::Shutdown => client.post(format!("{}/shutdown", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let pretty = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or(text);

    if status.is_success() {
        println!("{}", pretty);
        Ok(())
    } else {
        eprintln!("Error: proxy returned status {}", status);
        eprintln!("{}", pretty);
        std::process::exit(1);
    }
}
