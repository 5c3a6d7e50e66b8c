//! In-process backend.
//!
//! Mirrors the hosted backend's observable behaviour closely enough for the
//! client to run offline and for tests to drive full flows: owner scoping,
//! newest-first listing, one-time codes, object URLs. Faults can be
//! injected per operation.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use complib_ids::{ComponentId, OwnerId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::model::image_object_path;
use crate::{BackendGateway, Component, ComponentPatch, GatewayError, NewComponent, Session};

const DEFAULT_OTP_CODE: &str = "000000";
const BUCKET: &str = "component-images";

/// Number of calls each operation has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub authenticate: usize,
    pub verify_otp: usize,
    pub current_session: usize,
    pub sign_out: usize,
    pub list: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
    pub upload: usize,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Authenticate,
    VerifyOtp,
    CurrentSession,
    SignOut,
    List,
    Insert,
    Update,
    Delete,
    Upload,
}

#[derive(Default)]
struct Faults {
    hang: bool,
    next_upload: Option<GatewayError>,
    next_insert: Option<GatewayError>,
    next_list: Option<GatewayError>,
    next_update: Option<GatewayError>,
    next_delete: Option<GatewayError>,
}

#[derive(Default)]
struct MemoryState {
    rows: Vec<Component>,
    objects: HashMap<String, Vec<u8>>,
    pending_codes: HashMap<String, String>,
    users: HashMap<String, OwnerId>,
    session: Option<Session>,
    last_created_at: Option<DateTime<Utc>>,
    faults: Faults,
    calls: CallCounts,
}

/// Backend held entirely in memory.
pub struct MemoryGateway {
    otp_code: String,
    state: Mutex<MemoryState>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            otp_code: DEFAULT_OTP_CODE.to_string(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Use a fixed one-time code instead of the default `000000`.
    pub fn with_otp_code(mut self, code: impl Into<String>) -> Self {
        self.otp_code = code.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    /// Make every subsequent call suspend forever.
    pub fn set_hang(&self, hang: bool) {
        self.state().faults.hang = hang;
    }

    pub fn fail_next_upload(&self, err: GatewayError) {
        self.state().faults.next_upload = Some(err);
    }

    pub fn fail_next_insert(&self, err: GatewayError) {
        self.state().faults.next_insert = Some(err);
    }

    pub fn fail_next_list(&self, err: GatewayError) {
        self.state().faults.next_list = Some(err);
    }

    pub fn fail_next_update(&self, err: GatewayError) {
        self.state().faults.next_update = Some(err);
    }

    pub fn fail_next_delete(&self, err: GatewayError) {
        self.state().faults.next_delete = Some(err);
    }

    /// Number of stored image objects, including orphans.
    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }

    /// Simulate the user opening the emailed sign-in link.
    pub fn confirm_link(&self, email: &str) -> Result<Session, GatewayError> {
        let mut state = self.state();
        let email = normalize_email(email);
        if state.pending_codes.remove(&email).is_none() {
            return Err(GatewayError::Access(format!("no sign-in link pending for {}", email)));
        }
        let session = establish(&mut state, &email);
        info!(email = %email, "sign-in link confirmed");
        Ok(session)
    }

    async fn enter(&self, op: Op) {
        let hang = {
            let mut state = self.state();
            let calls = &mut state.calls;
            match op {
                Op::Authenticate => calls.authenticate += 1,
                Op::VerifyOtp => calls.verify_otp += 1,
                Op::CurrentSession => calls.current_session += 1,
                Op::SignOut => calls.sign_out += 1,
                Op::List => calls.list += 1,
                Op::Insert => calls.insert += 1,
                Op::Update => calls.update += 1,
                Op::Delete => calls.delete += 1,
                Op::Upload => calls.upload += 1,
            }
            state.faults.hang
        };
        if hang {
            debug!(?op, "memory gateway hanging");
            std::future::pending::<()>().await;
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn establish(state: &mut MemoryState, email: &str) -> Session {
    let user_id = state
        .users
        .entry(email.to_string())
        .or_insert_with(OwnerId::generate)
        .clone();
    let session = Session {
        user_id,
        email: email.to_string(),
        access_token: uuid::Uuid::new_v4().to_string(),
        expires_at: Some(Utc::now() + ChronoDuration::hours(1)),
    };
    state.session = Some(session.clone());
    session
}

fn require_session(state: &MemoryState) -> Result<OwnerId, GatewayError> {
    state
        .session
        .as_ref()
        .map(|session| session.user_id.clone())
        .ok_or_else(|| GatewayError::Access("not signed in".to_string()))
}

/// Strictly increasing creation timestamps, even within one clock tick.
fn next_created_at(state: &mut MemoryState) -> DateTime<Utc> {
    let now = Utc::now();
    let ts = match state.last_created_at {
        Some(last) if now <= last => last + ChronoDuration::milliseconds(1),
        _ => now,
    };
    state.last_created_at = Some(ts);
    ts
}

#[async_trait]
impl BackendGateway for MemoryGateway {
    async fn authenticate(&self, email: &str) -> Result<(), GatewayError> {
        self.enter(Op::Authenticate).await;
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(GatewayError::Validation(format!("invalid email address: {}", email)));
        }
        self.state().pending_codes.insert(email.clone(), self.otp_code.clone());
        info!(email = %email, "sign-in link issued");
        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, GatewayError> {
        self.enter(Op::VerifyOtp).await;
        let email = normalize_email(email);
        let mut state = self.state();
        let matches = state
            .pending_codes
            .get(&email)
            .map_or(false, |expected| expected == code.trim());
        if !matches {
            return Err(GatewayError::Access("invalid or expired code".to_string()));
        }
        state.pending_codes.remove(&email);
        Ok(establish(&mut state, &email))
    }

    async fn current_session(&self) -> Result<Option<Session>, GatewayError> {
        self.enter(Op::CurrentSession).await;
        let mut state = self.state();
        if matches!(&state.session, Some(session) if session.is_expired_at(Utc::now())) {
            state.session = None;
        }
        Ok(state.session.clone())
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.enter(Op::SignOut).await;
        self.state().session = None;
        Ok(())
    }

    async fn list_entities(&self) -> Result<Vec<Component>, GatewayError> {
        self.enter(Op::List).await;
        let mut state = self.state();
        if let Some(err) = state.faults.next_list.take() {
            return Err(err);
        }
        let owner = require_session(&state)?;
        let mut rows: Vec<Component> = state
            .rows
            .iter()
            .filter(|row| row.owner_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_entity(&self, new: NewComponent) -> Result<Component, GatewayError> {
        self.enter(Op::Insert).await;
        let mut state = self.state();
        if let Some(err) = state.faults.next_insert.take() {
            return Err(err);
        }
        let owner = require_session(&state)?;
        new.validate()?;
        let component = Component {
            id: ComponentId::generate(),
            owner_id: owner,
            name: new.name,
            code: new.code,
            image_url: new.image_url,
            tags: new.tags,
            created_at: next_created_at(&mut state),
        };
        state.rows.push(component.clone());
        Ok(component)
    }

    async fn update_entity(
        &self,
        id: &ComponentId,
        patch: ComponentPatch,
    ) -> Result<Component, GatewayError> {
        self.enter(Op::Update).await;
        let mut state = self.state();
        if let Some(err) = state.faults.next_update.take() {
            return Err(err);
        }
        let owner = require_session(&state)?;
        patch.validate()?;
        let row = state
            .rows
            .iter_mut()
            .find(|row| &row.id == id && row.owner_id == owner)
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        patch.apply_to(row);
        Ok(row.clone())
    }

    async fn delete_entity(&self, id: &ComponentId) -> Result<(), GatewayError> {
        self.enter(Op::Delete).await;
        let mut state = self.state();
        if let Some(err) = state.faults.next_delete.take() {
            return Err(err);
        }
        let owner = require_session(&state)?;
        let before = state.rows.len();
        state.rows.retain(|row| !(&row.id == id && row.owner_id == owner));
        if state.rows.len() == before {
            return Err(GatewayError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String, GatewayError> {
        self.enter(Op::Upload).await;
        let mut state = self.state();
        if let Some(err) = state.faults.next_upload.take() {
            return Err(err);
        }
        require_session(&state)?;
        let path = image_object_path(file_name);
        let url = format!("memory://{}/{}", BUCKET, path);
        state.objects.insert(path, bytes);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_component(name: &str) -> NewComponent {
        NewComponent {
            name: name.to_string(),
            code: format!("<{}/>", name),
            image_url: "memory://component-images/components/x.png".to_string(),
            tags: vec![],
        }
    }

    async fn signed_in(gateway: &MemoryGateway, email: &str) -> Session {
        gateway.authenticate(email).await.unwrap();
        gateway.verify_otp(email, DEFAULT_OTP_CODE).await.unwrap()
    }

    #[tokio::test]
    async fn test_list_requires_session() {
        let gateway = MemoryGateway::new();
        let err = gateway.list_entities().await.unwrap_err();
        assert!(matches!(err, GatewayError::Access(_)));
    }

    #[tokio::test]
    async fn test_wrong_code_is_rejected() {
        let gateway = MemoryGateway::new();
        gateway.authenticate("user@example.com").await.unwrap();
        let err = gateway.verify_otp("user@example.com", "123456").await.unwrap_err();
        assert!(matches!(err, GatewayError::Access(_)));
        assert!(gateway.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_confirm_link_establishes_session() {
        let gateway = MemoryGateway::new();
        gateway.authenticate("User@Example.com").await.unwrap();
        let session = gateway.confirm_link("user@example.com").unwrap();
        assert_eq!(session.email, "user@example.com");
        assert_eq!(gateway.current_session().await.unwrap(), Some(session));
        assert!(gateway.confirm_link("user@example.com").is_err());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_owner_scoped() {
        let gateway = MemoryGateway::new();
        signed_in(&gateway, "a@example.com").await;
        gateway.insert_entity(new_component("First")).await.unwrap();
        gateway.insert_entity(new_component("Second")).await.unwrap();

        let names: Vec<String> = gateway
            .list_entities()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Second", "First"]);

        signed_in(&gateway, "b@example.com").await;
        assert!(gateway.list_entities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id_is_not_found() {
        let gateway = MemoryGateway::new();
        signed_in(&gateway, "a@example.com").await;
        let missing = ComponentId::parse("missing").unwrap();

        let err = gateway
            .update_entity(&missing, ComponentPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
        let err = gateway.delete_entity(&missing).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_other_owner_cannot_delete() {
        let gateway = MemoryGateway::new();
        signed_in(&gateway, "a@example.com").await;
        let created = gateway.insert_entity(new_component("Card")).await.unwrap();

        signed_in(&gateway, "b@example.com").await;
        let err = gateway.delete_entity(&created.id).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_missing_fields() {
        let gateway = MemoryGateway::new();
        signed_in(&gateway, "a@example.com").await;
        let mut new = new_component("Card");
        new.name.clear();
        let err = gateway.insert_entity(new).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_injected_upload_fault_is_one_shot() {
        let gateway = MemoryGateway::new();
        signed_in(&gateway, "a@example.com").await;
        gateway.fail_next_upload(GatewayError::Storage("bucket offline".into()));

        assert!(gateway.upload_image(vec![1, 2, 3], "a.png").await.is_err());
        let url = gateway.upload_image(vec![1, 2, 3], "a.png").await.unwrap();
        assert!(url.starts_with("memory://component-images/components/"));
        assert_eq!(gateway.object_count(), 1);
        assert_eq!(gateway.calls().upload, 2);
    }
}
