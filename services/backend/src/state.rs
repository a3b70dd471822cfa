//! Shared application state.

use std::sync::Arc;

use fetchers::sdo::SdoCache;
use hamclock_common::ArtifactLayout;
use propagation::{EngineContext, MapCache};

/// Built once at startup; everything here is immutable or internally
/// synchronized.
pub struct AppState {
    pub layout: ArtifactLayout,
    pub engine: Arc<EngineContext>,
    pub map_cache: MapCache,
    pub sdo_cache: SdoCache,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(layout: ArtifactLayout) -> Self {
        let engine = Arc::new(EngineContext::load(&layout));
        Self {
            layout,
            engine,
            map_cache: MapCache::new(100),
            sdo_cache: SdoCache::new(),
            client: fetchers::client::build_client(),
        }
    }
}

pub type SharedState = Arc<AppState>;
