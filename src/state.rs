//! Shared state handed to every handler.

use std::sync::Arc;

use crate::{middleware::gate::RequestGate, services::user_store::UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub gate: Arc<RequestGate>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, gate: RequestGate) -> Self {
        Self {
            store,
            gate: Arc::new(gate),
        }
    }
}
