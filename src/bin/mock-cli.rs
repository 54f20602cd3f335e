use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mock-cli")]
#[command(about = "Admin CLI for the mock server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,
    /// List loaded plugins
    Plugins,
    /// Show one plugin
    Plugin { name: String },
    /// Enable or disable a plugin
    Toggle { name: String },
    /// Rescan the plugins directory
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Health => client.get(format!("{base}/health")),
        Commands::Plugins => client.get(format!("{base}/_admin/plugins")),
        Commands::Plugin { name } => client.get(format!("{base}/_admin/plugins/{name}")),
        Commands::Toggle { name } => client.post(format!("{base}/_admin/plugins/{name}/toggle")),
        Commands::Reload => client.post(format!("{base}/_admin/reload")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {status}");
        if let Ok(text) = res.text().await {
            eprintln!("Response: {text}");
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
