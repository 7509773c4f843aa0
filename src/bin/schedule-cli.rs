use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "schedule-cli")]
#[command(about = "Query a running OCM schedule gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "GATEWAY_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// Fetch Primary and Standby schedules for a group
    Schedule {
        /// Base OCM group name (without -Primary/-Secondary)
        group: String,
        /// Only today's shifts (UTC)
        #[arg(long, conflicts_with = "date")]
        today: bool,
        /// Only the first shift on this date (YYYYMMDD)
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Schedule { group, today, date } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if today {
                query.push(("todayOnly", "true".to_string()));
            }
            if let Some(date) = date {
                query.push(("date", date));
            }

            let res = client
                .post(format!("{}/getSchedule", base))
                .query(&query)
                .json(&json!({ "group": group }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
