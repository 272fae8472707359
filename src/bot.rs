//! Bot runtime: wiring and the long-polling loop.
//!
//! Each update is handled on its own tokio task so a slow TMDB call for one
//! admin does not hold up downloads for everyone else. The offset advances
//! as soon as an update is dispatched; handler failures are reported to
//! the user by the router and never re-delivered.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{bot_token, tmdb_api_key, Config};
use crate::db;
use crate::indexing::IndexingManager;
use crate::migrate;
use crate::router::{Router, RouterSettings};
use crate::session::SessionStore;
use crate::store::{CatalogStore, SqliteStore};
use crate::telegram::TelegramClient;
use crate::tmdb::TmdbClient;
use crate::transport::ChannelAnnouncer;

/// Pause after a failed `getUpdates` before polling again.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Run the bot until Ctrl-C.
pub async fn run_bot(config: &Config) -> Result<()> {
    let token = bot_token()?;
    let api_key = tmdb_api_key()?;

    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteStore::new(pool));

    let telegram = Arc::new(TelegramClient::new(&config.telegram, &token)?);
    let me = telegram
        .get_me()
        .await
        .context("Telegram rejected the bot token")?;
    info!(
        bot = me.username.as_deref().unwrap_or("unknown"),
        "Connected to Telegram"
    );

    let provider = Arc::new(TmdbClient::new(&config.tmdb, api_key)?);
    let announcer = Arc::new(ChannelAnnouncer::new(
        telegram.clone(),
        config.telegram.official_channel_id,
    ));
    let indexing = IndexingManager::new(
        store.clone(),
        provider,
        announcer,
        SessionStore::new(Duration::from_secs(config.indexing.session_ttl_secs)),
        config.tmdb.image_base_url.clone(),
        config.indexing.max_candidates,
    );
    let router = Arc::new(Router::new(
        telegram.clone(),
        store,
        indexing,
        RouterSettings::from_config(config),
    ));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut offset = 0;
    info!("Bot started");
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                return Ok(());
            }
            result = telegram.get_updates(offset) => match result {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(event) = update.into_event() else {
                            continue;
                        };
                        let router = router.clone();
                        tokio::spawn(async move {
                            router.handle(event).await;
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Polling failed, retrying");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }

        let purged = router.indexing().sessions().purge_expired();
        if purged > 0 {
            debug!(purged, "Expired indexing sessions dropped");
        }
    }
}
