// Composes trip packages for a request file, or a built-in sample, using offline providers.
//
//     compose_packages [request.json]
//
// Every provider call fails offline, so all packages are built from fallback offers.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::env;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trip_composer::{Providers, SearchRequest, ServiceConfig, TravelerCounts, TripPackageService};

fn sample_request() -> Result<SearchRequest> {
    let start = NaiveDate::from_ymd_opt(2025, 6, 1).context("invalid sample start date")?;
    let end = NaiveDate::from_ymd_opt(2025, 6, 8).context("invalid sample end date")?;

    let mut request = SearchRequest::new("JFK", &["CDG", "FCO"], start, end);
    request.travelers = TravelerCounts::new(2, 0, 0);
    request.preferences.interests = vec!["food".to_string(), "history".to_string()];
    Ok(request)
}

fn load_request(path: &str) -> Result<SearchRequest> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing search request in {}", path))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::from_env().context("loading configuration")?;
    let request = match env::args().nth(1) {
        Some(path) => load_request(&path)?,
        None => sample_request()?,
    };
    info!(
        origin = %request.origin,
        destinations = ?request.destinations,
        "composing packages offline"
    );

    let service = TripPackageService::new(Providers::offline(), config);
    let response = service.compose(&request).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
