//! Variant Sync - reconcile catalog variants between local and production

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use variant_sync::config::SyncConfig;
use variant_sync::{backfill_variant_images, timed, CatalogStore, PgStore, SyncReport, Synchronizer, TermImageIndex};

const REPORT_SUBJECT: &str = "catalog.variants.sync.completed";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = SyncConfig::from_env()?;
    let task = std::env::args().nth(1).unwrap_or_else(|| "sync".to_string());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current item");
            on_interrupt.cancel();
        }
    });

    match task.as_str() {
        "sync" => {
            let local = connect(&config, &config.local_database_url).await?;
            let production = connect(&config, &config.production_database_url).await?;
            run_sync(&config, local, production, &cancel).await
        }
        "backfill" => run_backfill(&config, &connect(&config, &config.production_database_url).await?, &cancel).await,
        other => anyhow::bail!("unknown task {other:?}, expected `sync` or `backfill`"),
    }
}

async fn connect(config: &SyncConfig, url: &str) -> Result<PgStore> {
    let pool = PgPoolOptions::new().max_connections(config.max_connections).acquire_timeout(config.store_timeout()).connect(url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(PgStore::new(pool))
}

async fn run_sync(config: &SyncConfig, local: PgStore, production: PgStore, cancel: &CancellationToken) -> Result<()> {
    info!(scope = ?config.scope, "🔄 syncing local catalog into production");
    let report = Synchronizer::new(Arc::new(local), Arc::new(production), config.sync_options()).sync(config.scope, cancel).await?;

    for failure in report.attributes.errors.iter().chain(&report.terms.errors).chain(&report.variants.errors) {
        warn!(key = %failure.key, reason = %failure.reason, "item not synced");
    }
    for key in report.attributes.not_found.iter().chain(&report.terms.not_found).chain(&report.variants.not_found) {
        info!(%key, "skipped, missing in production");
    }
    info!(
        created = report.created(), updated = report.updated(), skipped = report.skipped(),
        errors = report.error_count(), cancelled = report.cancelled, "sync complete"
    );

    if let Some(url) = &config.nats_url {
        if let Err(e) = publish(url, &report).await { warn!(error = %e, "could not publish sync report"); }
    }
    Ok(())
}

async fn publish(url: &str, report: &SyncReport) -> Result<()> {
    let client = async_nats::connect(url).await?;
    client.publish(REPORT_SUBJECT.to_string(), serde_json::to_vec(report)?.into()).await?;
    client.flush().await?;
    Ok(())
}

async fn run_backfill(config: &SyncConfig, production: &PgStore, cancel: &CancellationToken) -> Result<()> {
    let limit = config.store_timeout();
    let Some(attribute) = timed(limit, production.load_attribute(&config.image_attribute)).await? else {
        warn!(attribute = %config.image_attribute, "image attribute not found, nothing to backfill");
        return Ok(());
    };
    let index = TermImageIndex::from_terms(&attribute.terms);
    info!(attribute = %config.image_attribute, swatches = index.len(), "🎨 backfilling variant images");

    let (mut persisted, mut invalid, mut failed) = (0, 0, 0);
    for product in timed(limit, production.list_products()).await? {
        if cancel.is_cancelled() { warn!("backfill cancelled"); break; }
        match backfill_variant_images(production, &product, &index, &config.image_attribute, limit).await {
            Ok(report) => {
                persisted += report.persisted;
                invalid += report.normalization.invalid.len();
                failed += report.errors.len();
            }
            Err(e) => {
                warn!(product = %product.slug, error = %e, "cannot backfill product");
                failed += 1;
            }
        }
    }
    info!(persisted, invalid, failed, "backfill complete");
    Ok(())
}
