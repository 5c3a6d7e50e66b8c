//! Authentication state and the sign-in form.

use complib_gateway::Session;

/// Who the catalog is acting for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            AuthState::Unauthenticated => None,
        }
    }
}

/// Email entry plus the emailed one-time code.
///
/// After a successful request the form stays in the "sent" state and will
/// not send again until it is reset.
#[derive(Debug, Clone, Default)]
pub struct SignInForm {
    pub email: String,
    pub code: String,
    sending: bool,
    sent_to: Option<String>,
    verifying: bool,
}

impl SignInForm {
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_verifying(&self) -> bool {
        self.verifying
    }

    /// Address the last link went to.
    pub fn sent_to(&self) -> Option<&str> {
        self.sent_to.as_deref()
    }

    pub fn can_request(&self) -> bool {
        !self.sending && self.sent_to.is_none()
    }

    pub fn can_verify(&self) -> bool {
        self.sent_to.is_some() && !self.verifying
    }

    pub(crate) fn set_sending(&mut self, sending: bool) {
        self.sending = sending;
    }

    pub(crate) fn mark_sent(&mut self, email: String) {
        self.sending = false;
        self.sent_to = Some(email);
    }

    pub(crate) fn set_verifying(&mut self, verifying: bool) {
        self.verifying = verifying;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_disabled_after_send() {
        let mut form = SignInForm::default();
        assert!(form.can_request());
        assert!(!form.can_verify());

        form.set_sending(true);
        assert!(!form.can_request());

        form.mark_sent("user@example.com".into());
        assert!(!form.is_sending());
        assert!(!form.can_request());
        assert!(form.can_verify());
        assert_eq!(form.sent_to(), Some("user@example.com"));

        form.reset();
        assert!(form.can_request());
    }

    #[test]
    fn test_default_state_is_unauthenticated() {
        let state = AuthState::default();
        assert!(!state.is_authenticated());
        assert!(state.session().is_none());
    }
}
