//! Ingest command handlers

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::clients::SiteClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::IngestService;

pub async fn cmd_ingest(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    let client = SiteClient::from_config(&config.site)?;

    let mut targets = Vec::with_capacity(urls.len());
    for reference in urls {
        targets.push(client.sheet_url(reference)?);
    }

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    let service = IngestService::new(
        store,
        Arc::new(client),
        config.content_policy(),
        &config.ingest,
    );

    let cancel = CancellationToken::new();
    let ctrl = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            println!("Stopping after the sheets already in flight...");
            ctrl.cancel();
        }
    });

    println!("Ingesting {} sheet pages...", targets.len());
    let report = service.ingest_urls(targets, &cancel).await;

    println!();
    println!("{:-<70}", "");
    println!("Ingest complete!");
    println!("  Created: {}", report.created);
    println!("  Updated: {}", report.updated);
    if report.skipped > 0 {
        println!("  Skipped: {}", report.skipped);
    }
    if report.failed > 0 {
        println!("  Failed:  {}", report.failed);
    }

    Ok(())
}

pub async fn cmd_ingest_file(config: &Config, path: &str, url: &str) -> anyhow::Result<()> {
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {path}"))?;
    let sheet_url = Url::parse(url).with_context(|| format!("Invalid sheet URL: {url}"))?;

    let store = Store::new(&config.general.database_path).await?;
    let client = SiteClient::from_config(&config.site)?;
    let service = IngestService::new(
        store,
        Arc::new(client),
        config.content_policy(),
        &config.ingest,
    );

    let cancel = CancellationToken::new();
    match service.ingest_document(&html, &sheet_url, &cancel).await? {
        Some(outcome) if outcome.created => {
            println!("✓ Created title #{} from {path}", outcome.id);
        }
        Some(outcome) => println!("✓ Updated title #{} from {path}", outcome.id),
        None => println!("Sheet dropped by the content policy."),
    }

    Ok(())
}
