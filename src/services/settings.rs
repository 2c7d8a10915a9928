use arc_swap::ArcSwap;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::domain::{ReferralSettings, SettingsUpdate};
use crate::error::LedgerError;
use crate::ports::SettingsRepository;

/// Versioned program settings. Readers take a [`snapshot`](Self::snapshot)
/// and use that one version for the whole operation.
pub struct SettingsProvider {
    repository: Arc<dyn SettingsRepository>,
    current: ArcSwap<ReferralSettings>,
    writer: Mutex<()>,
}

impl SettingsProvider {
    /// Loads the stored settings, falling back to the defaults when none were
    /// ever saved.
    pub async fn load(repository: Arc<dyn SettingsRepository>) -> Result<Arc<Self>, LedgerError> {
        let initial = repository.load_settings().await?.unwrap_or_default();
        tracing::info!(version = initial.version, "Referral settings loaded");

        Ok(Arc::new(Self {
            repository,
            current: ArcSwap::from_pointee(initial),
            writer: Mutex::new(()),
        }))
    }

    pub fn snapshot(&self) -> Arc<ReferralSettings> {
        self.current.load_full()
    }

    /// Validates `update` against the current snapshot, persists it as the
    /// next version and publishes it.
    pub async fn update(&self, update: SettingsUpdate) -> Result<Arc<ReferralSettings>, LedgerError> {
        let _guard = self.writer.lock().await;
        let next = update.apply_to(&self.snapshot(), Utc::now())?;

        match self.repository.save_settings(&next).await {
            Ok(saved) => {
                let saved = Arc::new(saved);
                self.current.store(saved.clone());
                tracing::info!(
                    version = saved.version,
                    min_withdrawal = %saved.min_withdrawal,
                    is_enabled = saved.is_enabled,
                    "Referral settings updated"
                );
                Ok(saved)
            }
            Err(LedgerError::Busy(message)) => {
                // Another instance won the race; pick up its version so a retry can succeed.
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Failed to refresh settings after a write conflict: {}", e);
                }
                Err(LedgerError::Busy(message))
            }
            Err(e) => Err(e),
        }
    }

    /// Publishes the stored settings if they are newer than the snapshot.
    pub async fn refresh(&self) -> Result<(), LedgerError> {
        if let Some(stored) = self.repository.load_settings().await? {
            if stored.version > self.current.load().version {
                tracing::info!(version = stored.version, "Referral settings refreshed");
                self.current.store(Arc::new(stored));
            }
        }
        Ok(())
    }

    pub fn start(self: &Arc<Self>, refresh_interval: Duration) -> JoinHandle<()> {
        let provider = self.clone();
        tokio::spawn(async move {
            loop {
                sleep(refresh_interval).await;
                if let Err(e) = provider.refresh().await {
                    tracing::error!("Failed to refresh referral settings: {}", e);
                }
            }
        })
    }
}
