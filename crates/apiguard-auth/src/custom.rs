//! Pluggable authentication.
//!
//! Apps whose auth type is [`AuthType::Custom`](apiguard_core::AuthType::Custom)
//! are verified by a [`CustomAuth`] strategy supplied when the engine is built.

use async_trait::async_trait;

use apiguard_core::App;

use crate::access::Access;
use crate::engine::AccessRequest;
use crate::error::Result;

/// Trait for custom authentication strategies.
#[async_trait]
pub trait CustomAuth: Send + Sync {
    /// Verify a request on behalf of `app`.
    ///
    /// Any outcome other than `Ok(Access::Yes)` rejects the request.
    ///
    /// # Errors
    ///
    /// Returns an error if verification could not be carried out; the engine
    /// treats it as a rejection.
    async fn authenticate(&self, request: &AccessRequest, app: &App) -> Result<Access>;
}

/// A mock custom authentication strategy for testing.
///
/// Accepts a request when its secret key header equals the app's secret, and
/// can be switched to fail or stall.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockCustomAuth {
    /// Fail every call with `AuthError::Unavailable`.
    pub fail: bool,
    /// Never complete.
    pub stall: bool,
    /// Return this outcome instead of comparing secrets.
    pub outcome: Option<Access>,
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl CustomAuth for MockCustomAuth {
    async fn authenticate(&self, request: &AccessRequest, app: &App) -> Result<Access> {
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(crate::error::AuthError::Unavailable(
                "mock backend down".to_string(),
            ));
        }
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }
        match request.secret_key.as_deref() {
            Some(key) if key == app.secret_key => Ok(Access::Yes),
            _ => Ok(Access::CustomAuthReject),
        }
    }
}
