use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapters::{ArventoAdapter, TrackimoAdapter, TrackimoOptions};
use crate::config::AppConfig;
use crate::error::{GatewayError, Result};
use crate::models::Provider;
use crate::vendors::{ArventoApi, HttpTrackimoClient, SoapArventoClient, TrackimoApi};

/// Per-provider connection handles. `None` means the provider has not been
/// connected in this process; its routes answer `ConnectionRequired`.
#[derive(Default)]
pub struct Connections {
    trackimo: RwLock<Option<Arc<TrackimoAdapter>>>,
    arvento: RwLock<Option<Arc<ArventoAdapter>>>,
}

impl Connections {
    pub async fn trackimo(&self) -> Result<Arc<TrackimoAdapter>> {
        self.trackimo
            .read()
            .await
            .clone()
            .ok_or(GatewayError::ConnectionRequired(Provider::Trackimo))
    }

    pub async fn arvento(&self) -> Result<Arc<ArventoAdapter>> {
        self.arvento
            .read()
            .await
            .clone()
            .ok_or(GatewayError::ConnectionRequired(Provider::Arvento))
    }

    pub async fn set_trackimo(&self, adapter: TrackimoAdapter) -> Arc<TrackimoAdapter> {
        let adapter = Arc::new(adapter);
        *self.trackimo.write().await = Some(adapter.clone());
        adapter
    }

    pub async fn set_arvento(&self, adapter: ArventoAdapter) -> Arc<ArventoAdapter> {
        let adapter = Arc::new(adapter);
        *self.arvento.write().await = Some(adapter.clone());
        adapter
    }

    /// Returns whether the provider was connected.
    pub async fn disconnect(&self, provider: Provider) -> bool {
        match provider {
            Provider::Trackimo => self.trackimo.write().await.take().is_some(),
            Provider::Arvento => self.arvento.write().await.take().is_some(),
        }
    }

    pub async fn connected(&self) -> Vec<Provider> {
        let mut providers = Vec::new();
        if self.trackimo.read().await.is_some() {
            providers.push(Provider::Trackimo);
        }
        if self.arvento.read().await.is_some() {
            providers.push(Provider::Arvento);
        }
        providers
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub trackimo_api: Arc<dyn TrackimoApi>,
    pub arvento_api: Arc<dyn ArventoApi>,
    pub connections: Connections,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let timeout = config.vendor_timeout();
        let trackimo_api = Arc::new(HttpTrackimoClient::new(&config.trackimo_api_url, timeout)?);
        let arvento_api = Arc::new(SoapArventoClient::new(timeout)?);
        Ok(Self::with_apis(config, trackimo_api, arvento_api))
    }

    pub fn with_apis(
        config: AppConfig,
        trackimo_api: Arc<dyn TrackimoApi>,
        arvento_api: Arc<dyn ArventoApi>,
    ) -> Self {
        Self {
            config,
            trackimo_api,
            arvento_api,
            connections: Connections::default(),
        }
    }

    pub fn trackimo_options(&self) -> TrackimoOptions {
        TrackimoOptions {
            page_size: self.config.trackimo_page_size,
            history_limit: self.config.trackimo_history_limit,
        }
    }
}
