//! Tag editor for one component under construction or edit.
//!
//! Purely local list manipulation; nothing here talks to the backend.
//! Tags compare case-sensitively, so "nav" and "Nav" are distinct.

/// Editable ordered tag set plus the text currently being typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEditor {
    tags: Vec<String>,
    input: String,
    focus_requested: bool,
}

impl TagEditor {
    pub fn new(tags: Vec<String>) -> Self {
        let mut editor = Self::default();
        for tag in tags {
            editor.insert(tag);
        }
        editor
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn into_tags(self) -> Vec<String> {
        self.tags
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    fn insert(&mut self, tag: String) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Append `tag` unless it is empty or already present.
    ///
    /// A successful add clears the input and requests focus back on it.
    pub fn add(&mut self, tag: &str) -> bool {
        if !self.insert(tag.to_string()) {
            return false;
        }
        self.input.clear();
        self.focus_requested = true;
        true
    }

    /// Commit the typed text (Enter). A comma-separated entry adds each tag.
    pub fn commit_input(&mut self) -> bool {
        let input = std::mem::take(&mut self.input);
        let mut added = false;
        for tag in parse_tag_list(&input) {
            added |= self.add(&tag);
        }
        if !added {
            self.input = input;
        }
        added
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Backspace key.
    ///
    /// Deletes the last typed character; on an empty input removes the most
    /// recently added tag instead and returns it.
    pub fn backspace(&mut self) -> Option<String> {
        if self.input.pop().is_some() {
            return None;
        }
        self.tags.pop()
    }

    /// Vocabulary entries containing the typed fragment (case-insensitive)
    /// that are not already in the set. Empty input suggests nothing.
    pub fn suggestions(&self, vocabulary: &[String]) -> Vec<String> {
        if self.input.is_empty() {
            return Vec::new();
        }
        let fragment = self.input.to_lowercase();
        vocabulary
            .iter()
            .filter(|candidate| candidate.to_lowercase().contains(&fragment))
            .filter(|candidate| !self.contains(candidate))
            .cloned()
            .collect()
    }

    /// Selecting a suggestion behaves exactly like a manual add.
    pub fn accept_suggestion(&mut self, suggestion: &str) -> bool {
        self.add(suggestion)
    }

    /// Returns and clears the pending refocus request.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    pub fn clear(&mut self) {
        self.tags.clear();
        self.input.clear();
        self.focus_requested = false;
    }
}

/// Parse comma-separated tag entry ("a, b ,,c") into trimmed, non-empty,
/// de-duplicated tags.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    let mut editor = TagEditor::default();
    for part in input.split(',') {
        editor.insert(part.to_string());
    }
    editor.into_tags()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut editor = TagEditor::default();
        assert!(editor.add("nav"));
        assert!(!editor.add("nav"));
        assert_eq!(editor.tags(), ["nav"]);
    }

    #[test]
    fn test_add_is_case_sensitive() {
        let mut editor = TagEditor::default();
        editor.add("nav");
        editor.add("Nav");
        assert_eq!(editor.tags(), ["nav", "Nav"]);
    }

    #[test]
    fn test_add_rejects_empty_and_whitespace() {
        let mut editor = TagEditor::default();
        assert!(!editor.add(""));
        assert!(!editor.add("   "));
        assert!(editor.tags().is_empty());
    }

    #[test]
    fn test_commit_clears_input_and_requests_focus() {
        let mut editor = TagEditor::default();
        editor.set_input("layout");
        assert!(editor.commit_input());
        assert_eq!(editor.input(), "");
        assert!(editor.take_focus_request());
        assert!(!editor.take_focus_request());
    }

    #[test]
    fn test_commit_of_duplicate_keeps_input() {
        let mut editor = TagEditor::new(vocab(&["layout"]));
        editor.set_input("layout");
        assert!(!editor.commit_input());
        assert_eq!(editor.input(), "layout");
        assert_eq!(editor.tags(), ["layout"]);
    }

    #[test]
    fn test_commit_of_comma_list_adds_each_new_tag() {
        let mut editor = TagEditor::new(vocab(&["layout"]));
        editor.set_input("nav, layout ,, footer");
        assert!(editor.commit_input());
        assert_eq!(editor.tags(), ["layout", "nav", "footer"]);
        assert_eq!(editor.input(), "");
    }

    #[test]
    fn test_backspace_walks_tags_backward() {
        let mut editor = TagEditor::new(vocab(&["a", "b", "c"]));
        assert_eq!(editor.backspace().as_deref(), Some("c"));
        assert_eq!(editor.backspace().as_deref(), Some("b"));
        assert_eq!(editor.backspace().as_deref(), Some("a"));
        assert_eq!(editor.backspace(), None);
    }

    #[test]
    fn test_backspace_edits_input_first() {
        let mut editor = TagEditor::new(vocab(&["a"]));
        editor.set_input("xy");
        assert_eq!(editor.backspace(), None);
        assert_eq!(editor.input(), "x");
        assert_eq!(editor.tags(), ["a"]);
    }

    #[test]
    fn test_remove_by_value() {
        let mut editor = TagEditor::new(vocab(&["a", "b", "c"]));
        assert!(editor.remove("b"));
        assert!(!editor.remove("z"));
        assert_eq!(editor.tags(), ["a", "c"]);
    }

    #[test]
    fn test_suggestions_filter_vocabulary() {
        let vocabulary = vocab(&["navigation", "Nav", "layout", "form"]);
        let mut editor = TagEditor::new(vocab(&["Nav"]));
        assert!(editor.suggestions(&vocabulary).is_empty());

        editor.set_input("NA");
        assert_eq!(editor.suggestions(&vocabulary), vec!["navigation"]);
    }

    #[test]
    fn test_accepting_suggestion_matches_manual_add() {
        let mut editor = TagEditor::default();
        editor.set_input("lay");
        assert!(editor.accept_suggestion("layout"));
        assert_eq!(editor.input(), "");
        assert!(editor.take_focus_request());
        assert!(!editor.accept_suggestion("layout"));
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list(" navigation, layout ,,global,layout"), vec![
            "navigation",
            "layout",
            "global"
        ]);
        assert!(parse_tag_list("").is_empty());
    }
}
