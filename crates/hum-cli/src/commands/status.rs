//! Readiness probe for the analysis service.

use anyhow::{Context, Result};
use hum_core::{AnalysisConfig, HttpAnalysisClient};

pub async fn run() -> Result<()> {
    let config = AnalysisConfig::from_env();
    let client = HttpAnalysisClient::new(&config).context("Invalid analysis service URL")?;

    match client.check_ready().await {
        Ok(true) => {
            println!("analysis service at {} is ready", config.base_url);
            Ok(())
        }
        Ok(false) => {
            println!(
                "analysis service at {} is up but not ready yet",
                config.base_url
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("analysis service at {} is unreachable", config.base_url);
            Err(err)
        }
    }
}
