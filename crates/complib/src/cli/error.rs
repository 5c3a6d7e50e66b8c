//! Helpful error type for CLI failures
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    pub fn config_unreadable(path: &Path, reason: impl fmt::Display) -> Self {
        Self::new(format!("Cannot read config file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check file permissions: ls -la {}", path.display()),
                "TRY: Set COMPLIB_HOME to use a different config directory".to_string(),
            ])
    }

    pub fn config_invalid(path: &Path, reason: impl fmt::Display) -> Self {
        Self::new(format!("Invalid config file: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Compare against the example in `complib config`".to_string(),
                format!("TRY: Move the file aside to fall back to defaults: mv {0} {0}.bak", path.display()),
            ])
    }

    pub fn backend_incomplete(missing: &str) -> Self {
        Self::new(format!("Backend setting `{}` is not configured", missing))
            .with_context("The supabase backend needs a project URL and an API key")
            .with_suggestions([
                "TRY: Set [backend] url and api_key in ~/.complib/config.toml".to_string(),
                "TRY: Export COMPLIB_BACKEND_URL and COMPLIB_API_KEY".to_string(),
                "TRY: Use kind = \"memory\" for an offline catalog".to_string(),
            ])
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While loading config")
            .with_suggestions(["TRY: again"]);

        let output = err.to_string();
        assert!(output.contains("ERROR: Something went wrong"));
        assert!(output.contains("CONTEXT: While loading config"));
        assert!(output.contains("  TRY: again"));
    }

    #[test]
    fn test_backend_incomplete_names_setting() {
        let err = HelpfulError::backend_incomplete("api_key");
        assert!(err.message.contains("api_key"));
        assert_eq!(err.suggestions.len(), 3);
    }

    #[test]
    fn test_config_invalid_mentions_path() {
        let path = PathBuf::from("/tmp/complib/config.toml");
        let err = HelpfulError::config_invalid(&path, "expected `=`");
        assert!(err.to_string().contains("/tmp/complib/config.toml"));
    }
}
