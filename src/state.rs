use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::{
    ai::client::{ChatCompletionsClient, DescriptionGenerator},
    config::AppConfig,
    db,
    listings::repo::{ListingStore, PgListingStore},
    reset::{
        notifier::{LogNotifier, Notifier, WebhookNotifier},
        repo::{PgResetCodeStore, ResetCodeStore},
    },
    users::repo::{PgUserStore, UserStore},
    wishlist::repo::{PgWishlistStore, WishlistStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub listings: Arc<dyn ListingStore>,
    pub wishlists: Arc<dyn WishlistStore>,
    pub reset_codes: Arc<dyn ResetCodeStore>,
    pub notifier: Arc<dyn Notifier>,
    pub describer: Arc<dyn DescriptionGenerator>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config).await?;

        let notifier: Arc<dyn Notifier> = match &config.reset.webhook_url {
            Some(url) => {
                info!(%url, "reset codes delivered via webhook");
                Arc::new(WebhookNotifier::new(
                    url.clone(),
                    Duration::from_secs(config.reset.notify_timeout_secs),
                )?)
            }
            None => {
                info!("no NOTIFY_WEBHOOK_URL; reset codes go to the log notifier");
                Arc::new(LogNotifier::new(config.reset.log_plaintext))
            }
        };
        let describer = Arc::new(ChatCompletionsClient::new(&config.llm)?);

        Ok(Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            listings: Arc::new(PgListingStore::new(pool.clone())),
            wishlists: Arc::new(PgWishlistStore::new(pool.clone())),
            reset_codes: Arc::new(PgResetCodeStore::new(pool)),
            notifier,
            describer,
            config,
        })
    }

    /// In-memory state for tests: no database, no network.
    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::fake_state().0
    }
}
