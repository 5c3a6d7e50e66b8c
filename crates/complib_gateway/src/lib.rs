//! Backend gateway for the component library.
//!
//! Authentication, row storage and image storage all live in a hosted
//! backend. This crate defines the narrow contract the client consumes
//! ([`BackendGateway`]) and ships two implementations:
//!
//! - [`HttpGateway`]: a Supabase-compatible REST client
//! - [`MemoryGateway`]: an in-process backend for tests and offline use
//!
//! [`TimedGateway`] wraps either one so that no call can hang forever.

pub mod error;
pub mod http;
pub mod memory;
pub mod model;
pub mod timed;

use async_trait::async_trait;
use complib_ids::ComponentId;

pub use error::GatewayError;
pub use http::{HttpGateway, HttpGatewayConfig};
pub use memory::{CallCounts, MemoryGateway};
pub use model::{Component, ComponentPatch, NewComponent, Session};
pub use timed::TimedGateway;

/// The backend contract.
///
/// Implementations scope every row operation to the current session's
/// owner; the client never filters by owner itself.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Send a one-time sign-in link (and code) to `email`.
    ///
    /// The session is established later through a side channel: either the
    /// emailed link or [`verify_otp`](Self::verify_otp).
    async fn authenticate(&self, email: &str) -> Result<(), GatewayError>;

    /// Exchange the emailed one-time code for a session.
    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, GatewayError>;

    async fn current_session(&self) -> Result<Option<Session>, GatewayError>;

    async fn sign_out(&self) -> Result<(), GatewayError>;

    /// All components owned by the session user, newest first.
    async fn list_entities(&self) -> Result<Vec<Component>, GatewayError>;

    async fn insert_entity(&self, new: NewComponent) -> Result<Component, GatewayError>;

    async fn update_entity(
        &self,
        id: &ComponentId,
        patch: ComponentPatch,
    ) -> Result<Component, GatewayError>;

    async fn delete_entity(&self, id: &ComponentId) -> Result<(), GatewayError>;

    /// Store image bytes and return a publicly reachable URL.
    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, GatewayError>;
}
