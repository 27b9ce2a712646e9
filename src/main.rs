use amr_scrap::{config::Config, info_time, process::process_accessions, Result};
use chrono::Local;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let config = Config::parse();
    if let Err(e) = process_accessions(&config).await {
        info_time!("FATAL: {}", e);
        return Err(e);
    }
    info_time!(start_time, "Full program time:");

    Ok(())
}
