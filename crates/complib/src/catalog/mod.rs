//! Catalog core: the component list, its derived views and every user action.
//!
//! [`Catalog`] owns all client-side state. Actions that need the backend are
//! split in two: a `begin_*` method validates locally, updates busy flags and
//! returns a [`Task`]; once the task resolves its [`Completion`] is handed to
//! [`Catalog::apply`], which may return a follow-up task (the reload that
//! follows every successful mutation). Tasks own an `Arc` to the gateway and
//! never borrow the catalog, so a UI can spawn them and keep drawing.

pub mod auth;
pub mod clipboard;
pub mod error;
pub mod filter;
pub mod form;
pub mod notice;
pub mod tags;
pub mod view_state;

use complib_gateway::{BackendGateway, Component, GatewayError, NewComponent, Session};
use complib_ids::ComponentId;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub use auth::{AuthState, SignInForm};
pub use clipboard::{Clipboard, RecordingClipboard};
pub use error::CatalogError;
pub use filter::{all_tags, filter_components, CatalogQuery};
pub use form::{CreateForm, CreateRequest, EditForm, ImageFile, MAX_IMAGE_BYTES};
pub use notice::{Notice, NoticeLevel};
pub use tags::{parse_tag_list, TagEditor};
pub use view_state::{DisplayMode, ViewState, COPY_ACK_DURATION};

pub const EMPTY_TITLE: &str = "No components found";
pub const EMPTY_HINT: &str = "Try adjusting your search or filter criteria";

/// A unit of backend work started by a `begin_*` action.
pub type Task = Pin<Box<dyn Future<Output = Completion> + Send + 'static>>;

/// Where a create request stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateStage {
    Upload,
    /// The image is already stored; nothing removes it.
    Insert { orphaned_image: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFailure {
    pub stage: CreateStage,
    pub error: GatewayError,
}

/// Result of a finished [`Task`].
#[derive(Debug)]
pub enum Completion {
    SessionChecked(Result<Option<Session>, GatewayError>),
    SignInRequested {
        email: String,
        result: Result<(), GatewayError>,
    },
    CodeVerified(Result<Session, GatewayError>),
    SignedOut(Result<(), GatewayError>),
    Loaded {
        epoch: u64,
        result: Result<Vec<Component>, GatewayError>,
    },
    Created(Result<Component, CreateFailure>),
    Updated(Result<Component, GatewayError>),
    Deleted {
        id: ComponentId,
        name: String,
        result: Result<(), GatewayError>,
    },
}

/// Typed-name confirmation for a pending delete.
#[derive(Debug, Clone)]
pub struct DeleteConfirm {
    id: ComponentId,
    name: String,
    pub typed: String,
    busy: bool,
}

impl DeleteConfirm {
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Byte-for-byte comparison; no trimming, no case folding.
    pub fn matches(&self) -> bool {
        self.typed == self.name
    }
}

pub struct Catalog {
    gateway: Arc<dyn BackendGateway>,
    auth: AuthState,
    sign_in: SignInForm,
    components: Vec<Component>,
    loading: bool,
    loaded: bool,
    epoch: u64,
    query: CatalogQuery,
    view: ViewState,
    create_form: Option<CreateForm>,
    edit_form: Option<EditForm>,
    delete_confirm: Option<DeleteConfirm>,
    notices: Vec<Notice>,
}

impl Catalog {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self {
            gateway,
            auth: AuthState::Unauthenticated,
            sign_in: SignInForm::default(),
            components: Vec::new(),
            loading: false,
            loaded: false,
            epoch: 0,
            query: CatalogQuery::default(),
            view: ViewState::default(),
            create_form: None,
            edit_form: None,
            delete_confirm: None,
            notices: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn session(&self) -> Option<&Session> {
        self.auth.session()
    }

    pub fn sign_in(&self) -> &SignInForm {
        &self.sign_in
    }

    pub fn sign_in_mut(&mut self) -> &mut SignInForm {
        &mut self.sign_in
    }

    /// The authoritative list, newest first, as last loaded.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.iter().find(|component| &component.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True once at least one load has completed for this session.
    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut CatalogQuery {
        &mut self.query
    }

    pub fn visible(&self) -> Vec<&Component> {
        self.query.apply(&self.components)
    }

    pub fn tag_vocabulary(&self) -> Vec<String> {
        all_tags(&self.components)
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn display_mode(&self, id: &ComponentId) -> DisplayMode {
        self.view.mode(id)
    }

    pub fn toggle_display_mode(&mut self, id: &ComponentId) -> DisplayMode {
        self.view.toggle_mode(id)
    }

    pub fn set_display_mode(&mut self, id: &ComponentId, mode: DisplayMode) {
        self.view.set_mode(id, mode);
    }

    pub fn is_copy_acknowledged(&self, id: &ComponentId, now: Instant) -> bool {
        self.view.is_copy_acknowledged(id, now)
    }

    pub fn create_form(&self) -> Option<&CreateForm> {
        self.create_form.as_ref()
    }

    pub fn create_form_mut(&mut self) -> Option<&mut CreateForm> {
        self.create_form.as_mut()
    }

    pub fn edit_form(&self) -> Option<&EditForm> {
        self.edit_form.as_ref()
    }

    pub fn edit_form_mut(&mut self) -> Option<&mut EditForm> {
        self.edit_form.as_mut()
    }

    pub fn delete_confirm(&self) -> Option<&DeleteConfirm> {
        self.delete_confirm.as_ref()
    }

    pub fn delete_confirm_mut(&mut self) -> Option<&mut DeleteConfirm> {
        self.delete_confirm.as_mut()
    }

    /// Drain notices queued since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Revert copy acknowledgments whose time has passed.
    pub fn tick(&mut self, now: Instant) {
        self.view.expire(now);
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Ask the backend whether a session already exists.
    pub fn begin_session_check(&self) -> Task {
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move { Completion::SessionChecked(gateway.current_session().await) })
    }

    /// Send a one-time sign-in link to the email in the sign-in form.
    pub fn begin_request_sign_in(&mut self) -> Result<Task, CatalogError> {
        if !self.sign_in.can_request() {
            return Err(CatalogError::Busy);
        }
        let email = self.sign_in.email.trim().to_string();
        if email.is_empty() {
            return Err(self.reject(CatalogError::EmptyEmail));
        }
        self.sign_in.set_sending(true);
        info!(email = %email, "requesting sign-in link");

        let gateway = Arc::clone(&self.gateway);
        Ok(Box::pin(async move {
            let result = gateway.authenticate(&email).await;
            Completion::SignInRequested { email, result }
        }))
    }

    /// Exchange the emailed one-time code for a session.
    pub fn begin_verify_code(&mut self) -> Result<Task, CatalogError> {
        if self.sign_in.is_verifying() {
            return Err(CatalogError::Busy);
        }
        let email = match self.sign_in.sent_to() {
            Some(email) => email.to_string(),
            None => self.sign_in.email.trim().to_string(),
        };
        if email.is_empty() {
            return Err(self.reject(CatalogError::EmptyEmail));
        }
        let code = self.sign_in.code.trim().to_string();
        if code.is_empty() {
            return Err(self.reject(CatalogError::EmptyOtp));
        }
        self.sign_in.set_verifying(true);

        let gateway = Arc::clone(&self.gateway);
        Ok(Box::pin(async move {
            Completion::CodeVerified(gateway.verify_otp(&email, &code).await)
        }))
    }

    /// Sign out locally right away; the returned task tells the backend.
    ///
    /// The list, view state, search and any open form are discarded, and
    /// loads still in flight are ignored when they land.
    pub fn begin_sign_out(&mut self) -> Task {
        if let Some(session) = self.auth.session() {
            info!(email = %session.email, "signing out");
        }
        self.auth = AuthState::Unauthenticated;
        self.clear_session_data();

        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move { Completion::SignedOut(gateway.sign_out().await) })
    }

    fn clear_session_data(&mut self) {
        self.epoch += 1;
        self.components.clear();
        self.view.clear();
        self.query.clear();
        self.create_form = None;
        self.edit_form = None;
        self.delete_confirm = None;
        self.loading = false;
        self.loaded = false;
        self.sign_in.reset();
    }

    fn establish(&mut self, session: Session) -> Task {
        info!(email = %session.email, user_id = %session.user_id, "signed in");
        self.auth = AuthState::Authenticated(session);
        self.sign_in.reset();
        self.reload_task()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Fetch the full list again. Refused while signed out.
    pub fn begin_reload(&mut self) -> Result<Task, CatalogError> {
        if !self.is_authenticated() {
            return Err(CatalogError::NotAuthenticated);
        }
        Ok(self.reload_task())
    }

    fn reload_task(&mut self) -> Task {
        self.epoch += 1;
        self.loading = true;
        let epoch = self.epoch;
        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move {
            let result = gateway.list_entities().await;
            Completion::Loaded { epoch, result }
        })
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    pub fn open_create_form(&mut self) -> Result<&mut CreateForm, CatalogError> {
        if !self.is_authenticated() {
            return Err(CatalogError::NotAuthenticated);
        }
        Ok(self.create_form.get_or_insert_with(CreateForm::default))
    }

    /// Cancel: the form and its tag set are discarded.
    pub fn close_create_form(&mut self) {
        self.create_form = None;
    }

    /// Upload the image, then insert the row pointing at it.
    pub fn begin_create(&mut self) -> Result<Task, CatalogError> {
        let form = self.create_form.as_mut().ok_or(CatalogError::FormClosed)?;
        if form.is_busy() {
            return Err(CatalogError::Busy);
        }
        let request = match form.prepare() {
            Ok(request) => request,
            Err(err) => {
                form.set_error(Some(err.to_string()));
                return Err(self.reject(err));
            }
        };
        form.set_busy(true);
        form.set_error(None);
        info!(
            name = %request.name,
            image = %request.image.name,
            bytes = request.image.size(),
            "creating component"
        );

        let gateway = Arc::clone(&self.gateway);
        Ok(Box::pin(async move {
            Completion::Created(create_component(gateway, request).await)
        }))
    }

    // ------------------------------------------------------------------
    // Edit
    // ------------------------------------------------------------------

    pub fn open_edit_form(&mut self, id: &ComponentId) -> Result<&mut EditForm, CatalogError> {
        let component = self
            .component(id)
            .ok_or_else(|| CatalogError::UnknownComponent(id.clone()))?;
        let form = EditForm::from_component(component);
        Ok(self.edit_form.insert(form))
    }

    pub fn close_edit_form(&mut self) {
        self.edit_form = None;
    }

    pub fn begin_update(&mut self) -> Result<Task, CatalogError> {
        let form = self.edit_form.as_mut().ok_or(CatalogError::FormClosed)?;
        if form.is_busy() {
            return Err(CatalogError::Busy);
        }
        let patch = match form.prepare() {
            Ok(patch) => patch,
            Err(err) => {
                form.set_error(Some(err.to_string()));
                return Err(self.reject(err));
            }
        };
        form.set_busy(true);
        form.set_error(None);
        let id = form.id().clone();
        info!(id = %id, "updating component");

        let gateway = Arc::clone(&self.gateway);
        Ok(Box::pin(async move {
            Completion::Updated(gateway.update_entity(&id, patch).await)
        }))
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub fn open_delete(&mut self, id: &ComponentId) -> Result<&mut DeleteConfirm, CatalogError> {
        let component = self
            .component(id)
            .ok_or_else(|| CatalogError::UnknownComponent(id.clone()))?;
        let confirm = DeleteConfirm {
            id: component.id.clone(),
            name: component.name.clone(),
            typed: String::new(),
            busy: false,
        };
        Ok(self.delete_confirm.insert(confirm))
    }

    pub fn close_delete(&mut self) {
        self.delete_confirm = None;
    }

    /// Delete once the typed name matches exactly. A mismatch never
    /// reaches the backend.
    pub fn begin_delete(&mut self) -> Result<Task, CatalogError> {
        let confirm = self.delete_confirm.as_mut().ok_or(CatalogError::FormClosed)?;
        if confirm.busy {
            return Err(CatalogError::Busy);
        }
        if !confirm.matches() {
            let expected = confirm.name.clone();
            return Err(self.reject(CatalogError::ConfirmationMismatch { expected }));
        }
        confirm.busy = true;
        let id = confirm.id.clone();
        let name = confirm.name.clone();
        info!(id = %id, name = %name, "deleting component");

        let gateway = Arc::clone(&self.gateway);
        Ok(Box::pin(async move {
            let result = gateway.delete_entity(&id).await;
            Completion::Deleted { id, name, result }
        }))
    }

    // ------------------------------------------------------------------
    // Copy
    // ------------------------------------------------------------------

    /// Copy a component's code and acknowledge it for two seconds.
    pub fn copy_code(
        &mut self,
        id: &ComponentId,
        clipboard: &mut dyn Clipboard,
        now: Instant,
    ) -> Result<(), CatalogError> {
        let code = match self.component(id) {
            Some(component) => component.code.clone(),
            None => return Err(self.reject(CatalogError::UnknownComponent(id.clone()))),
        };
        if let Err(err) = clipboard.copy(&code) {
            return Err(self.reject(CatalogError::Clipboard(err.to_string())));
        }
        self.view.mark_copied(id, now);
        self.notices.push(Notice::info(
            "Copied!",
            "Component code copied to clipboard.",
        ));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    /// Fold a finished task back into the catalog.
    pub fn apply(&mut self, completion: Completion) -> Option<Task> {
        match completion {
            Completion::SessionChecked(result) => self.apply_session_checked(result),
            Completion::SignInRequested { email, result } => {
                self.apply_sign_in_requested(email, result);
                None
            }
            Completion::CodeVerified(result) => self.apply_code_verified(result),
            Completion::SignedOut(result) => {
                if let Err(err) = result {
                    warn!(error = %err, "backend sign-out failed; local session already cleared");
                }
                None
            }
            Completion::Loaded { epoch, result } => {
                self.apply_loaded(epoch, result);
                None
            }
            Completion::Created(result) => self.apply_created(result),
            Completion::Updated(result) => self.apply_updated(result),
            Completion::Deleted { id, name, result } => self.apply_deleted(id, name, result),
        }
    }

    /// Apply `task` and every follow-up it produces, inline.
    pub async fn run(&mut self, task: Task) {
        let mut next = Some(task);
        while let Some(task) = next {
            let completion = task.await;
            next = self.apply(completion);
        }
    }

    fn apply_session_checked(&mut self, result: Result<Option<Session>, GatewayError>) -> Option<Task> {
        match result {
            Ok(Some(session)) if !self.is_authenticated() => Some(self.establish(session)),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "session check failed");
                None
            }
        }
    }

    fn apply_sign_in_requested(&mut self, email: String, result: Result<(), GatewayError>) {
        match result {
            Ok(()) => {
                info!(email = %email, "sign-in link sent");
                self.sign_in.mark_sent(email);
                self.notices.push(Notice::info(
                    "Magic Link Sent",
                    "Check your email for the login link.",
                ));
            }
            Err(err) => {
                error!(email = %email, error = %err, "sign-in request failed");
                self.sign_in.set_sending(false);
                self.notices.push(Notice::error(
                    "Error",
                    "Failed to send magic link. Please try again.",
                ));
            }
        }
    }

    fn apply_code_verified(&mut self, result: Result<Session, GatewayError>) -> Option<Task> {
        match result {
            Ok(session) => Some(self.establish(session)),
            Err(err) => {
                error!(error = %err, "code verification failed");
                self.sign_in.set_verifying(false);
                self.notices.push(Notice::error("Sign-in failed", err.to_string()));
                None
            }
        }
    }

    fn apply_loaded(&mut self, epoch: u64, result: Result<Vec<Component>, GatewayError>) {
        if epoch != self.epoch || !self.is_authenticated() {
            debug!(epoch, current = self.epoch, "discarding stale load");
            return;
        }
        self.loading = false;
        match result {
            Ok(components) => {
                debug!(count = components.len(), "components loaded");
                self.view.reset_for(&components);
                self.components = components;
                self.loaded = true;
            }
            Err(err) => {
                error!(error = %err, "failed to load components");
                self.notices
                    .push(Notice::error("Error", "Failed to load components"));
            }
        }
    }

    fn apply_created(&mut self, result: Result<Component, CreateFailure>) -> Option<Task> {
        match result {
            Ok(component) => {
                info!(id = %component.id, name = %component.name, "component created");
                self.notices.push(Notice::info(
                    "Success",
                    format!("{} has been added to your library.", component.name),
                ));
                self.create_form = None;
                self.is_authenticated().then(|| self.reload_task())
            }
            Err(failure) => {
                let title = match &failure.stage {
                    CreateStage::Upload => {
                        error!(error = %failure.error, "image upload failed");
                        "Failed to upload image"
                    }
                    CreateStage::Insert { orphaned_image } => {
                        error!(error = %failure.error, "component insert failed");
                        warn!(url = %orphaned_image, "uploaded image left without a component");
                        "Failed to add component"
                    }
                };
                if let Some(form) = self.create_form.as_mut() {
                    form.set_busy(false);
                    form.set_error(Some(failure.error.to_string()));
                }
                self.notices
                    .push(Notice::error(title, failure.error.to_string()));
                None
            }
        }
    }

    fn apply_updated(&mut self, result: Result<Component, GatewayError>) -> Option<Task> {
        match result {
            Ok(component) => {
                info!(id = %component.id, "component updated");
                self.edit_form = None;
                self.notices
                    .push(Notice::info("Success", "Component updated successfully"));
                self.is_authenticated().then(|| self.reload_task())
            }
            Err(err) => {
                error!(error = %err, "component update failed");
                if let Some(form) = self.edit_form.as_mut() {
                    form.set_busy(false);
                    form.set_error(Some(err.to_string()));
                }
                self.notices
                    .push(Notice::error("Error", "Failed to update component"));
                None
            }
        }
    }

    fn apply_deleted(
        &mut self,
        id: ComponentId,
        name: String,
        result: Result<(), GatewayError>,
    ) -> Option<Task> {
        match result {
            Ok(()) => {
                info!(id = %id, "component deleted");
                self.delete_confirm = None;
                self.notices.push(Notice::info(
                    "Deleted",
                    format!("{} has been removed from your library.", name),
                ));
                self.is_authenticated().then(|| self.reload_task())
            }
            Err(err) => {
                error!(id = %id, error = %err, "component delete failed");
                if let Some(confirm) = self.delete_confirm.as_mut() {
                    confirm.busy = false;
                }
                self.notices
                    .push(Notice::error("Error", "Failed to delete component"));
                None
            }
        }
    }

    /// Log a locally detected failure, queue its notice and hand it back.
    fn reject(&mut self, err: CatalogError) -> CatalogError {
        warn!(error = %err, "action rejected");
        self.notices.push(Notice::error("Error", err.to_string()));
        err
    }
}

async fn create_component(
    gateway: Arc<dyn BackendGateway>,
    request: CreateRequest,
) -> Result<Component, CreateFailure> {
    let CreateRequest {
        name,
        code,
        tags,
        image,
    } = request;

    let image_url = gateway
        .upload_image(image.bytes, &image.name)
        .await
        .map_err(|error| CreateFailure {
            stage: CreateStage::Upload,
            error,
        })?;

    let new = NewComponent {
        name,
        code,
        image_url: image_url.clone(),
        tags,
    };
    gateway.insert_entity(new).await.map_err(|error| CreateFailure {
        stage: CreateStage::Insert {
            orphaned_image: image_url,
        },
        error,
    })
}
