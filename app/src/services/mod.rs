use domain::core::PortfolioManager;
use std::sync::Arc;

use crate::api::jwt::JwtKeys;

/// Cheaply cloneable handle to the application, shared by every request.
#[derive(Clone)]
pub struct AppHandle {
    inner: Arc<PortfolioManager>,
    jwt: JwtKeys,
}

impl AppHandle {
    pub fn new(manager: PortfolioManager, jwt: JwtKeys) -> Self {
        Self {
            inner: Arc::new(manager),
            jwt,
        }
    }

    /// Get a reference to the manager; it synchronizes internally
    pub fn manager(&self) -> &PortfolioManager {
        &self.inner
    }

    pub fn jwt(&self) -> &JwtKeys {
        &self.jwt
    }
}
