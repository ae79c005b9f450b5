//! Shared application state.

use std::path::Path;
use std::sync::Arc;

use rotiplanta_core::RotiPlantaConfig;
use rotiplanta_store::{FirestoreClient, ProfileStore};
use rotiplanta_table::{JamAiClient, TableService};

/// Collaborator handles and configuration shared by every handler.
pub struct AppState {
    pub config: RotiPlantaConfig,
    pub table: Arc<dyn TableService>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    pub fn new(
        config: RotiPlantaConfig,
        table: Arc<dyn TableService>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            config,
            table,
            profiles,
        }
    }

    /// State backed by the real JamAI and Firestore clients.
    pub fn from_config(config: RotiPlantaConfig) -> Self {
        let table = Arc::new(JamAiClient::new(&config.table));
        let profiles = Arc::new(FirestoreClient::new(&config.store));
        Self::new(config, table, profiles)
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.config.data_paths.uploads
    }
}
