use crate::{auth::CredentialStore, browser::TransferOrchestrator, storage::StorageGateway};
use std::sync::Arc;

/// Shared host API state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn StorageGateway>,
    pub transfers: TransferOrchestrator,
    pub credentials: CredentialStore,
}

impl AppState {
    pub fn new(gateway: Arc<dyn StorageGateway>, credentials: CredentialStore) -> Self {
        Self {
            transfers: TransferOrchestrator::new(gateway.clone()),
            gateway,
            credentials,
        }
    }
}
