use std::sync::Arc;

use crate::transfer::TransferService;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TransferService>,
}

impl AppState {
    pub fn new(service: Arc<TransferService>) -> Self {
        Self { service }
    }
}
