//! TUI application state and key handling.
//!
//! Gateway work never runs on the draw loop: every [`Task`] the catalog
//! hands out is spawned onto the runtime and its [`Completion`] comes back
//! through a channel that [`App::tick`] drains.

use complib::catalog::{
    Catalog, CatalogError, Clipboard, Completion, DisplayMode, TagEditor, Task,
};
use complib::gateway::BackendGateway;
use complib_ids::ComponentId;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;

/// How long a status line stays visible.
pub const STATUS_DURATION: Duration = Duration::from_secs(3);
/// How often to look for a session while a sign-in link is outstanding.
pub const SESSION_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub is_error: bool,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignInField {
    #[default]
    Email,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Code,
    Image,
    Tags,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Code => "Code",
            FormField::Image => "Preview image",
            FormField::Tags => "Tags",
        }
    }

    fn order(with_image: bool) -> &'static [FormField] {
        if with_image {
            &[FormField::Name, FormField::Code, FormField::Image, FormField::Tags]
        } else {
            &[FormField::Name, FormField::Code, FormField::Tags]
        }
    }

    fn step(self, with_image: bool, forward: bool) -> Self {
        let order = Self::order(with_image);
        let pos = order.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward {
            (pos + 1) % order.len()
        } else {
            (pos + order.len() - 1) % order.len()
        };
        order[next]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Create(FormField),
    Edit(FormField),
    Delete,
    TagFilter { cursor: usize },
}

enum FieldInput {
    Handled,
    NextField,
    Ignored,
}

pub struct App {
    pub running: bool,
    pub catalog: Catalog,
    pub overlay: Overlay,
    pub sign_in_field: SignInField,
    pub search_focused: bool,
    pub selected: usize,
    /// Path typed into the create form's image field.
    pub image_path: String,
    pub status: Option<StatusMessage>,
    /// Notices waiting for the status line, oldest first.
    queued_status: VecDeque<(String, bool)>,
    clipboard: Box<dyn Clipboard>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    session_poll_pending: bool,
    last_session_poll: Option<Instant>,
}

impl App {
    pub fn new(gateway: Arc<dyn BackendGateway>, clipboard: Box<dyn Clipboard>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            running: true,
            catalog: Catalog::new(gateway),
            overlay: Overlay::None,
            sign_in_field: SignInField::Email,
            search_focused: false,
            selected: 0,
            image_path: String::new(),
            status: None,
            queued_status: VecDeque::new(),
            clipboard,
            completions_tx,
            completions_rx,
            in_flight: 0,
            session_poll_pending: false,
            last_session_poll: None,
        }
    }

    /// Kick off the initial session check.
    pub fn start(&mut self) {
        self.poll_session(Instant::now());
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    fn spawn(&mut self, task: Task) {
        let tx = self.completions_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let completion = task.await;
            // receiver only goes away on shutdown
            let _ = tx.send(completion);
        });
    }

    fn spawn_result(&mut self, result: Result<Task, CatalogError>) {
        match result {
            Ok(task) => self.spawn(task),
            Err(err) => debug!(error = %err, "action not started"),
        }
    }

    fn poll_session(&mut self, now: Instant) {
        self.session_poll_pending = true;
        self.last_session_poll = Some(now);
        let task = self.catalog.begin_session_check();
        self.spawn(task);
    }

    fn on_completion(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if matches!(completion, Completion::SessionChecked(_)) {
            self.session_poll_pending = false;
        }
        if let Some(next) = self.catalog.apply(completion) {
            self.spawn(next);
        }
    }

    /// Periodic housekeeping: apply finished tasks, expire acknowledgments
    /// and status, and poll for a session while a link is outstanding.
    pub fn tick(&mut self) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.on_completion(completion);
        }
        self.refresh(Instant::now());
    }

    fn refresh(&mut self, now: Instant) {
        self.catalog.tick(now);
        self.drain_notices();
        self.sync_overlay();
        self.clamp_selection();

        if matches!(&self.status, Some(status) if status.expires_at <= now) {
            self.status = None;
        }
        if self.status.is_none() {
            if let Some((message, is_error)) = self.queued_status.pop_front() {
                self.set_status_at(message, is_error, now);
            }
        }

        let awaiting_link =
            !self.catalog.is_authenticated() && self.catalog.sign_in().sent_to().is_some();
        let poll_due = self
            .last_session_poll
            .map_or(true, |last| now.duration_since(last) >= SESSION_POLL_INTERVAL);
        if awaiting_link && !self.session_poll_pending && poll_due {
            self.poll_session(now);
        }
    }

    /// Wait for every spawned task (and its follow-ups) to be applied.
    #[cfg(test)]
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => self.on_completion(completion),
                None => break,
            }
        }
        self.refresh(Instant::now());
    }

    fn drain_notices(&mut self) {
        self.queued_status.extend(
            self.catalog
                .take_notices()
                .into_iter()
                .map(|notice| (notice.to_string(), notice.is_error())),
        );
    }

    fn set_status(&mut self, message: impl Into<String>, is_error: bool) {
        self.set_status_at(message, is_error, Instant::now());
    }

    fn set_status_at(&mut self, message: impl Into<String>, is_error: bool, now: Instant) {
        self.status = Some(StatusMessage {
            message: message.into(),
            is_error,
            expires_at: now + STATUS_DURATION,
        });
    }

    /// Close overlays whose backing form went away (success or sign-out).
    fn sync_overlay(&mut self) {
        let gone = match self.overlay {
            Overlay::Create(_) => self.catalog.create_form().is_none(),
            Overlay::Edit(_) => self.catalog.edit_form().is_none(),
            Overlay::Delete => self.catalog.delete_confirm().is_none(),
            Overlay::TagFilter { .. } => !self.catalog.is_authenticated(),
            Overlay::None => false,
        };
        if gone {
            self.overlay = Overlay::None;
        }
        if !self.catalog.is_authenticated() {
            self.search_focused = false;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.catalog.visible().len();
        self.selected = if len == 0 { 0 } else { self.selected.min(len - 1) };
    }

    pub fn selected_id(&self) -> Option<ComponentId> {
        self.catalog
            .visible()
            .get(self.selected)
            .map(|component| component.id.clone())
    }

    /// Sign-in field with focus; the email is fixed once a link is sent.
    pub fn active_sign_in_field(&self) -> SignInField {
        if self.catalog.sign_in().sent_to().is_some() {
            SignInField::Code
        } else {
            self.sign_in_field
        }
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }

        if !self.catalog.is_authenticated() {
            self.handle_sign_in_key(key);
        } else {
            match self.overlay {
                Overlay::None if self.search_focused => self.handle_search_key(key),
                Overlay::None => self.handle_catalog_key(key),
                Overlay::Create(field) => self.handle_create_key(field, key),
                Overlay::Edit(field) => self.handle_edit_key(field, key),
                Overlay::Delete => self.handle_delete_key(key),
                Overlay::TagFilter { cursor } => self.handle_tag_filter_key(cursor, key),
            }
        }

        self.refresh(Instant::now());
    }

    fn handle_sign_in_key(&mut self, key: KeyEvent) {
        let field = self.active_sign_in_field();
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.sign_in_field = match field {
                    SignInField::Email => SignInField::Code,
                    SignInField::Code => SignInField::Email,
                };
            }
            KeyCode::Enter => {
                let result = match field {
                    SignInField::Email => self.catalog.begin_request_sign_in(),
                    SignInField::Code => self.catalog.begin_verify_code(),
                };
                self.spawn_result(result);
            }
            KeyCode::Backspace => {
                let form = self.catalog.sign_in_mut();
                match field {
                    SignInField::Email => form.email.pop(),
                    SignInField::Code => form.code.pop(),
                };
            }
            KeyCode::Char(c) => {
                let form = self.catalog.sign_in_mut();
                match field {
                    SignInField::Email => form.email.push(c),
                    SignInField::Code => form.code.push(c),
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down => self.search_focused = false,
            KeyCode::Backspace => {
                self.catalog.query_mut().search.pop();
                self.selected = 0;
            }
            KeyCode::Char(c) => {
                self.catalog.query_mut().search.push(c);
                self.selected = 0;
            }
            _ => {}
        }
    }

    fn handle_catalog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = self.selected.saturating_add(1);
            }
            KeyCode::Char('/') => self.search_focused = true,
            KeyCode::Char('t') => self.overlay = Overlay::TagFilter { cursor: 0 },
            KeyCode::Char('n') => match self.catalog.open_create_form() {
                Ok(_) => {
                    self.image_path.clear();
                    self.overlay = Overlay::Create(FormField::Name);
                }
                Err(err) => self.set_status(err.to_string(), true),
            },
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_id() {
                    if self.catalog.open_edit_form(&id).is_ok() {
                        self.overlay = Overlay::Edit(FormField::Name);
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    if self.catalog.open_delete(&id).is_ok() {
                        self.overlay = Overlay::Delete;
                    }
                }
            }
            KeyCode::Enter | KeyCode::Char('v') => {
                if let Some(id) = self.selected_id() {
                    self.catalog.toggle_display_mode(&id);
                }
            }
            KeyCode::Char('p') => {
                if let Some(id) = self.selected_id() {
                    self.catalog.set_display_mode(&id, DisplayMode::Preview);
                }
            }
            KeyCode::Char('y') => {
                if let Some(id) = self.selected_id() {
                    // failures already produce a notice
                    let _ = self
                        .catalog
                        .copy_code(&id, self.clipboard.as_mut(), Instant::now());
                }
            }
            KeyCode::Char('r') => {
                let result = self.catalog.begin_reload();
                self.spawn_result(result);
            }
            KeyCode::Char('o') => {
                let task = self.catalog.begin_sign_out();
                self.spawn(task);
                self.selected = 0;
                self.sign_in_field = SignInField::Email;
            }
            KeyCode::Esc => {
                if !self.catalog.query().is_empty() {
                    self.catalog.query_mut().clear();
                    self.selected = 0;
                }
            }
            _ => {}
        }
    }

    fn handle_create_key(&mut self, field: FormField, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.catalog.close_create_form();
            self.overlay = Overlay::None;
            return;
        }
        if is_submit(&key) {
            let result = self.catalog.begin_create();
            self.spawn_result(result);
            return;
        }
        match key.code {
            KeyCode::Tab => {
                self.overlay = Overlay::Create(field.step(true, true));
                return;
            }
            KeyCode::BackTab => {
                self.overlay = Overlay::Create(field.step(true, false));
                return;
            }
            _ => {}
        }

        if field == FormField::Image {
            self.handle_image_key(key);
            return;
        }

        let vocabulary = self.catalog.tag_vocabulary();
        let Some(form) = self.catalog.create_form_mut() else {
            return;
        };
        if form.is_busy() {
            return;
        }
        let input = type_into(field, key, &mut form.name, &mut form.code, &mut form.tags, &vocabulary);
        if matches!(input, FieldInput::NextField) {
            self.overlay = Overlay::Create(field.step(true, true));
        }
    }

    fn handle_image_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Backspace => {
                self.image_path.pop();
            }
            KeyCode::Char(c) => self.image_path.push(c),
            KeyCode::Enter => {
                let path = expand_home(self.image_path.trim());
                let Some(form) = self.catalog.create_form_mut() else {
                    return;
                };
                match form.select_image_path(&path) {
                    Ok(()) => {
                        let name = form.image().map(|i| i.name.clone()).unwrap_or_default();
                        self.set_status(format!("Selected {}", name), false);
                        self.overlay = Overlay::Create(FormField::Tags);
                    }
                    Err(err) => self.set_status(err.to_string(), true),
                }
            }
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, field: FormField, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.catalog.close_edit_form();
            self.overlay = Overlay::None;
            return;
        }
        if is_submit(&key) {
            let result = self.catalog.begin_update();
            self.spawn_result(result);
            return;
        }
        match key.code {
            KeyCode::Tab => {
                self.overlay = Overlay::Edit(field.step(false, true));
                return;
            }
            KeyCode::BackTab => {
                self.overlay = Overlay::Edit(field.step(false, false));
                return;
            }
            _ => {}
        }

        let vocabulary = self.catalog.tag_vocabulary();
        let Some(form) = self.catalog.edit_form_mut() else {
            return;
        };
        if form.is_busy() {
            return;
        }
        let input = type_into(field, key, &mut form.name, &mut form.code, &mut form.tags, &vocabulary);
        if matches!(input, FieldInput::NextField) {
            self.overlay = Overlay::Edit(field.step(false, true));
        }
    }

    fn handle_delete_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.catalog.close_delete();
                self.overlay = Overlay::None;
            }
            KeyCode::Enter => {
                let result = self.catalog.begin_delete();
                self.spawn_result(result);
            }
            KeyCode::Backspace => {
                if let Some(confirm) = self.catalog.delete_confirm_mut() {
                    confirm.typed.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(confirm) = self.catalog.delete_confirm_mut() {
                    confirm.typed.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_tag_filter_key(&mut self, cursor: usize, key: KeyEvent) {
        let vocabulary = self.catalog.tag_vocabulary();
        match key.code {
            KeyCode::Esc | KeyCode::Char('t') | KeyCode::Char('q') => {
                self.overlay = Overlay::None;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.overlay = Overlay::TagFilter {
                    cursor: cursor.saturating_sub(1),
                };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let last = vocabulary.len().saturating_sub(1);
                self.overlay = Overlay::TagFilter {
                    cursor: (cursor + 1).min(last),
                };
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(tag) = vocabulary.get(cursor) {
                    self.catalog.query_mut().toggle_tag(tag);
                    self.selected = 0;
                }
            }
            KeyCode::Char('c') => {
                let selected = self.catalog.query().selected_tags().to_vec();
                for tag in selected {
                    self.catalog.query_mut().toggle_tag(&tag);
                }
                self.selected = 0;
            }
            _ => {}
        }
    }
}

fn is_submit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s')
}

fn type_into(
    field: FormField,
    key: KeyEvent,
    name: &mut String,
    code: &mut String,
    tags: &mut TagEditor,
    vocabulary: &[String],
) -> FieldInput {
    match (field, key.code) {
        (FormField::Name, KeyCode::Enter) => FieldInput::NextField,
        (FormField::Name, KeyCode::Char(c)) => {
            name.push(c);
            FieldInput::Handled
        }
        (FormField::Name, KeyCode::Backspace) => {
            name.pop();
            FieldInput::Handled
        }
        (FormField::Code, KeyCode::Enter) => {
            code.push('\n');
            FieldInput::Handled
        }
        (FormField::Code, KeyCode::Char(c)) => {
            code.push(c);
            FieldInput::Handled
        }
        (FormField::Code, KeyCode::Backspace) => {
            code.pop();
            FieldInput::Handled
        }
        (FormField::Tags, KeyCode::Enter) => {
            tags.commit_input();
            FieldInput::Handled
        }
        (FormField::Tags, KeyCode::Right) => {
            if let Some(first) = tags.suggestions(vocabulary).first().cloned() {
                tags.accept_suggestion(&first);
            }
            FieldInput::Handled
        }
        (FormField::Tags, KeyCode::Char(c)) => {
            tags.push_char(c);
            FieldInput::Handled
        }
        (FormField::Tags, KeyCode::Backspace) => {
            tags.backspace();
            FieldInput::Handled
        }
        _ => FieldInput::Ignored,
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use complib::catalog::RecordingClipboard;
    use complib::gateway::MemoryGateway;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn new_app() -> (Arc<MemoryGateway>, App) {
        let gateway = Arc::new(MemoryGateway::new());
        let app = App::new(gateway.clone(), Box::new(RecordingClipboard::default()));
        (gateway, app)
    }

    async fn signed_in_app() -> (Arc<MemoryGateway>, App) {
        let (gateway, mut app) = new_app();
        app.start();
        app.settle().await;
        type_str(&mut app, "user@example.com");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;
        type_str(&mut app, "000000");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;
        (gateway, app)
    }

    fn image_file(len: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; len]).unwrap();
        file
    }

    #[tokio::test]
    async fn test_sign_in_via_keys() {
        let (gateway, app) = signed_in_app().await;
        assert!(app.catalog.is_authenticated());
        assert!(app.catalog.visible().is_empty());
        assert_eq!(gateway.calls().authenticate, 1);
        assert_eq!(gateway.calls().verify_otp, 1);
    }

    #[tokio::test]
    async fn test_link_confirmation_is_picked_up_by_polling() {
        let (gateway, mut app) = new_app();
        type_str(&mut app, "user@example.com");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;
        assert_eq!(app.active_sign_in_field(), SignInField::Code);
        assert!(app.status.as_ref().unwrap().message.starts_with("Magic Link Sent"));

        gateway.confirm_link("user@example.com").unwrap();
        app.last_session_poll = None;
        app.tick();
        app.settle().await;
        assert!(app.catalog.is_authenticated());
    }

    #[tokio::test]
    async fn test_create_via_keys() {
        let (gateway, mut app) = signed_in_app().await;
        let image = image_file(2 * 1024 * 1024);

        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.overlay, Overlay::Create(FormField::Name));
        type_str(&mut app, "Navbar");
        app.handle_key(key(KeyCode::Enter));
        type_str(&mut app, "<nav>...</nav>");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, &image.path().display().to_string());
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.overlay, Overlay::Create(FormField::Tags));
        for tag in ["navigation", "layout"] {
            type_str(&mut app, tag);
            app.handle_key(key(KeyCode::Enter));
        }
        app.handle_key(ctrl('s'));
        app.settle().await;

        assert_eq!(app.overlay, Overlay::None);
        let visible = app.catalog.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Navbar");
        assert_eq!(visible[0].tags, vec!["navigation", "layout"]);
        assert_eq!(gateway.calls().upload, 1);
    }

    #[tokio::test]
    async fn test_oversize_image_keeps_dialog_open() {
        let (gateway, mut app) = signed_in_app().await;
        let image = image_file(6 * 1024 * 1024);

        app.handle_key(key(KeyCode::Char('n')));
        type_str(&mut app, "Navbar");
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, &image.path().display().to_string());
        app.handle_key(key(KeyCode::Enter));

        let status = app.status.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.message.contains("less than 5MB"));
        assert_eq!(app.overlay, Overlay::Create(FormField::Image));
        assert_eq!(app.catalog.create_form().unwrap().name, "Navbar");
        assert_eq!(gateway.calls().upload, 0);
    }

    #[tokio::test]
    async fn test_delete_and_copy_via_keys() {
        let (gateway, mut app) = signed_in_app().await;
        let image = image_file(16);
        app.handle_key(key(KeyCode::Char('n')));
        type_str(&mut app, "Card");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "<div/>");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, &image.path().display().to_string());
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(ctrl('s'));
        app.settle().await;

        let id = app.selected_id().unwrap();
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.catalog.is_copy_acknowledged(&id, Instant::now()));

        app.handle_key(key(KeyCode::Char('d')));
        type_str(&mut app, "card");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;
        assert_eq!(gateway.calls().delete, 0);
        assert_eq!(app.overlay, Overlay::Delete);

        for _ in 0..4 {
            app.handle_key(key(KeyCode::Backspace));
        }
        type_str(&mut app, "Card");
        app.handle_key(key(KeyCode::Enter));
        app.settle().await;
        assert_eq!(gateway.calls().delete, 1);
        assert!(app.catalog.visible().is_empty());
        assert_eq!(app.overlay, Overlay::None);
    }

    #[tokio::test]
    async fn test_notices_are_shown_in_order() {
        let (gateway, mut app) = signed_in_app().await;
        let image = image_file(16);
        let now = Instant::now();
        app.refresh(now + STATUS_DURATION * 4);
        app.status = None;
        app.queued_status.clear();

        gateway.fail_next_list(complib::gateway::GatewayError::Network("offline".into()));
        app.handle_key(key(KeyCode::Char('n')));
        type_str(&mut app, "Card");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, "<div/>");
        app.handle_key(key(KeyCode::Tab));
        type_str(&mut app, &image.path().display().to_string());
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(ctrl('s'));
        app.settle().await;

        let selected = app.status.clone().unwrap();
        assert!(selected.message.starts_with("Selected"));

        app.refresh(selected.expires_at);
        let status = app.status.clone().unwrap();
        assert!(!status.is_error);
        assert!(status.message.contains("Card has been added"));

        app.refresh(status.expires_at);
        let status = app.status.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.message.contains("Failed to load components"));
        assert!(app.queued_status.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_returns_to_sign_in() {
        let (_gateway, mut app) = signed_in_app().await;
        app.handle_key(key(KeyCode::Char('o')));
        app.settle().await;
        assert!(!app.catalog.is_authenticated());
        assert_eq!(app.active_sign_in_field(), SignInField::Email);
    }

    #[test]
    fn test_form_field_cycle() {
        assert_eq!(FormField::Tags.step(true, true), FormField::Name);
        assert_eq!(FormField::Code.step(false, true), FormField::Tags);
        assert_eq!(FormField::Name.step(false, false), FormField::Tags);
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
    }
}
