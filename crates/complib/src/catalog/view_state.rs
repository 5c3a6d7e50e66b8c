//! Per-component transient view state: display mode and copy acknowledgment.
//!
//! Keyed by component id and rebuilt wholesale on every reload.

use complib_gateway::Component;
use complib_ids::ComponentId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a "copied" acknowledgment stays visible.
pub const COPY_ACK_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Render the stored preview image.
    #[default]
    Preview,
    /// Render the stored code as preformatted text.
    Code,
}

impl DisplayMode {
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Preview => DisplayMode::Code,
            DisplayMode::Code => DisplayMode::Preview,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Preview => "Preview",
            DisplayMode::Code => "Code",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryViewState {
    pub mode: DisplayMode,
    copied_until: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    entries: HashMap<ComponentId, EntryViewState>,
}

impl ViewState {
    /// Forget everything and default each component to preview.
    pub fn reset_for(&mut self, components: &[Component]) {
        self.entries = components
            .iter()
            .map(|component| (component.id.clone(), EntryViewState::default()))
            .collect();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mode(&self, id: &ComponentId) -> DisplayMode {
        self.entries
            .get(id)
            .map(|entry| entry.mode)
            .unwrap_or_default()
    }

    pub fn set_mode(&mut self, id: &ComponentId, mode: DisplayMode) {
        self.entries.entry(id.clone()).or_default().mode = mode;
    }

    pub fn toggle_mode(&mut self, id: &ComponentId) -> DisplayMode {
        let entry = self.entries.entry(id.clone()).or_default();
        entry.mode = entry.mode.toggled();
        entry.mode
    }

    pub fn mark_copied(&mut self, id: &ComponentId, now: Instant) {
        self.entries.entry(id.clone()).or_default().copied_until = Some(now + COPY_ACK_DURATION);
    }

    pub fn is_copy_acknowledged(&self, id: &ComponentId, now: Instant) -> bool {
        self.entries
            .get(id)
            .and_then(|entry| entry.copied_until)
            .map_or(false, |until| now < until)
    }

    /// Drop acknowledgments whose time has passed. Returns how many reverted.
    pub fn expire(&mut self, now: Instant) -> usize {
        let mut reverted = 0;
        for entry in self.entries.values_mut() {
            if matches!(entry.copied_until, Some(until) if until <= now) {
                entry.copied_until = None;
                reverted += 1;
            }
        }
        reverted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ComponentId {
        ComponentId::parse(value).unwrap()
    }

    #[test]
    fn test_unknown_id_defaults_to_preview() {
        let state = ViewState::default();
        assert_eq!(state.mode(&id("x")), DisplayMode::Preview);
    }

    #[test]
    fn test_toggle_mode() {
        let mut state = ViewState::default();
        assert_eq!(state.toggle_mode(&id("a")), DisplayMode::Code);
        assert_eq!(state.toggle_mode(&id("a")), DisplayMode::Preview);
        state.set_mode(&id("b"), DisplayMode::Code);
        assert_eq!(state.mode(&id("b")), DisplayMode::Code);
    }

    #[test]
    fn test_copy_ack_reverts_after_two_seconds() {
        let mut state = ViewState::default();
        let start = Instant::now();
        state.mark_copied(&id("a"), start);

        assert!(state.is_copy_acknowledged(&id("a"), start));
        assert!(state.is_copy_acknowledged(&id("a"), start + Duration::from_millis(1999)));
        assert_eq!(state.expire(start + Duration::from_millis(1999)), 0);

        assert_eq!(state.expire(start + COPY_ACK_DURATION), 1);
        assert!(!state.is_copy_acknowledged(&id("a"), start + COPY_ACK_DURATION));
    }

    #[test]
    fn test_copy_ack_is_per_entity() {
        let mut state = ViewState::default();
        let now = Instant::now();
        state.mark_copied(&id("a"), now);
        assert!(!state.is_copy_acknowledged(&id("b"), now));
    }
}
