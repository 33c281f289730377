//! Application state shared across handlers

use std::sync::Arc;

use crate::{middleware::Authenticator, repositories::DataSource};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(source: Arc<dyn DataSource>, auth: Authenticator) -> Self {
        Self {
            source,
            auth: Arc::new(auth),
        }
    }
}
