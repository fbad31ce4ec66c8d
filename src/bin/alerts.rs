//! alerts - list recent alerts from the poolwatch alert store

use anyhow::Result;
use clap::Parser;

use poolwatch::{AlertSink, SqliteAlertStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "List recent poolwatch alerts")]
struct Args {
    /// Path to the alert database.
    #[arg(long, env = "POOLWATCH_DB_PATH", default_value = "poolwatch.db")]
    db_path: String,

    /// Maximum number of alerts to show, most recent first.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Emit JSON instead of plain text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut store = SqliteAlertStore::open(&args.db_path)?;
    let alerts = store.list_recent(args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("no alerts logged yet");
        return Ok(());
    }
    for alert in &alerts {
        println!(
            "{} - {}: {}",
            alert.created_at, alert.alert_type, alert.details
        );
    }
    Ok(())
}
