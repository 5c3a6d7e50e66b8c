//! Deadline wrapper around any gateway.

use async_trait::async_trait;
use complib_ids::ComponentId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{BackendGateway, Component, ComponentPatch, GatewayError, NewComponent, Session};

/// Default per-call deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Applies one deadline to every call of the wrapped gateway.
///
/// An expired call resolves to [`GatewayError::Timeout`]; the underlying
/// request future is dropped.
#[derive(Clone)]
pub struct TimedGateway {
    inner: Arc<dyn BackendGateway>,
    timeout: Duration,
}

impl TimedGateway {
    pub fn new(inner: Arc<dyn BackendGateway>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn guarded<T, F>(&self, op: &'static str, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Err(err)) => {
                debug!(op, kind = err.kind(), error = %err, "gateway call failed");
                Err(err)
            }
            Ok(result) => result,
            Err(_) => {
                let err = GatewayError::Timeout(self.timeout);
                warn!(
                    op,
                    kind = err.kind(),
                    timeout_secs = self.timeout.as_secs_f32(),
                    "gateway call timed out"
                );
                Err(err)
            }
        }
    }
}

#[async_trait]
impl BackendGateway for TimedGateway {
    async fn authenticate(&self, email: &str) -> Result<(), GatewayError> {
        self.guarded("authenticate", self.inner.authenticate(email)).await
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, GatewayError> {
        self.guarded("verify_otp", self.inner.verify_otp(email, code)).await
    }

    async fn current_session(&self) -> Result<Option<Session>, GatewayError> {
        self.guarded("current_session", self.inner.current_session()).await
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.guarded("sign_out", self.inner.sign_out()).await
    }

    async fn list_entities(&self) -> Result<Vec<Component>, GatewayError> {
        self.guarded("list_entities", self.inner.list_entities()).await
    }

    async fn insert_entity(&self, new: NewComponent) -> Result<Component, GatewayError> {
        self.guarded("insert_entity", self.inner.insert_entity(new)).await
    }

    async fn update_entity(
        &self,
        id: &ComponentId,
        patch: ComponentPatch,
    ) -> Result<Component, GatewayError> {
        self.guarded("update_entity", self.inner.update_entity(id, patch)).await
    }

    async fn delete_entity(&self, id: &ComponentId) -> Result<(), GatewayError> {
        self.guarded("delete_entity", self.inner.delete_entity(id)).await
    }

    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, GatewayError> {
        self.guarded("upload_image", self.inner.upload_image(bytes, file_name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryGateway;

    #[tokio::test(start_paused = true)]
    async fn test_hanging_call_times_out() {
        let memory = Arc::new(MemoryGateway::new());
        memory.set_hang(true);
        let timed = TimedGateway::new(memory.clone(), Duration::from_secs(5));

        let err = timed.authenticate("user@example.com").await.unwrap_err();
        assert_eq!(err, GatewayError::Timeout(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let memory = Arc::new(MemoryGateway::new());
        let timed = TimedGateway::new(memory.clone(), DEFAULT_REQUEST_TIMEOUT);

        timed.authenticate("user@example.com").await.unwrap();
        assert_eq!(memory.calls().authenticate, 1);
    }
}
