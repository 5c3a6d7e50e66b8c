//! Search and tag filtering over the loaded catalog.

use complib_gateway::Component;
use std::collections::HashSet;

/// Components whose name contains `query` (case-insensitive) and that carry
/// every tag in `required_tags`.
///
/// Input order is preserved. An empty query and an empty tag set both
/// match everything.
pub fn filter_components<'a>(
    components: &'a [Component],
    query: &str,
    required_tags: &[String],
) -> Vec<&'a Component> {
    let needle = query.to_lowercase();
    components
        .iter()
        .filter(|component| needle.is_empty() || component.name.to_lowercase().contains(&needle))
        .filter(|component| required_tags.iter().all(|tag| component.has_tag(tag)))
        .collect()
}

/// Distinct tags across all components, in first-seen order.
pub fn all_tags(components: &[Component]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for tag in components.iter().flat_map(|component| component.tags.iter()) {
        if seen.insert(tag.as_str()) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// Search text plus required-tag selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    selected_tags: Vec<String>,
}

impl CatalogQuery {
    pub fn selected_tags(&self) -> &[String] {
        &self.selected_tags
    }

    pub fn is_selected(&self, tag: &str) -> bool {
        self.selected_tags.iter().any(|t| t == tag)
    }

    /// Select `tag` if absent, deselect it otherwise.
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.selected_tags.iter().position(|t| t == tag) {
            self.selected_tags.remove(pos);
        } else {
            self.selected_tags.push(tag.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.search.clear();
        self.selected_tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.selected_tags.is_empty()
    }

    pub fn apply<'a>(&self, components: &'a [Component]) -> Vec<&'a Component> {
        filter_components(components, &self.search, &self.selected_tags)
    }
}
