use anyhow::{Context, Result, bail};
use mailthread::config::Config;
use mailthread::db::Database;
use mailthread::error::StoreError;
use mailthread::membership;
use mailthread::view::{self, DetailLevel};
use std::env;
use tracing::{Level, info};

const USAGE: &str = "usage: mailthread [--debug] <refresh|show> <thread_id> [--expand]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    let args: Vec<String> = env::args().skip(1).collect();
    let debug_logging = args.iter().any(|arg| arg == "--debug");
    let expand = args.iter().any(|arg| arg == "--expand");
    let positional: Vec<&str> = args
        .iter()
        .filter(|arg| !arg.starts_with("--"))
        .map(String::as_str)
        .collect();

    tracing_subscriber::fmt()
        .with_max_level(if debug_logging {
            Level::DEBUG
        } else {
            config.log_level()
        })
        .with_writer(std::io::stderr)
        .init();

    let db = Database::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    db.run_migrations()
        .await
        .context("Failed to apply schema")?;

    match positional.as_slice() {
        ["refresh", thread_id] => {
            let thread = db
                .get_thread(thread_id)
                .await?
                .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
            let thread = membership::refresh_membership(&db, thread)
                .await
                .with_context(|| format!("Failed to refresh thread {thread_id}"))?;
            info!(
                thread_id = %thread.id,
                labels = thread.label_ids.len(),
                folders = thread.folder_ids.len(),
                "membership refreshed"
            );
            println!("{}", serde_json::to_string_pretty(&thread)?);
        }
        ["show", thread_id] => {
            let detail = if expand {
                DetailLevel::Expanded
            } else {
                config.detail_level()
            };
            let hydrated = db
                .load_thread(thread_id, detail)
                .await?
                .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
            let record = view::project(hydrated)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
