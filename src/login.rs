//! Form-state controller for the multi-step login form.

use askama::Template;
use validator::Validate;

use crate::{
    email_step::{EmailStep, FieldChange, LoginFormController, EMAIL_FIELD},
    models::{FormErrors, LoginForm},
    session::MemoryStorage,
};

pub const BACK_ACTION: &str = "/login/back";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginStep {
    #[default]
    Email,
    Password,
}

/// Owns the login form's values, its validation errors and the current step.
#[derive(Debug, Default)]
pub struct LoginFlow {
    form: LoginForm,
    errors: FormErrors,
    step: LoginStep,
}

impl LoginFlow {
    pub fn step(&self) -> LoginStep {
        self.step
    }

    /// Drop shown errors but keep the typed value, as a page reload does.
    pub fn clear_errors(&mut self) {
        self.errors = FormErrors::default();
    }

    fn validate(&mut self) {
        self.errors = match self.form.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from_validation(&e),
        };
    }
}

impl LoginFormController for LoginFlow {
    fn form(&self) -> &LoginForm {
        &self.form
    }

    fn errors(&self) -> &FormErrors {
        &self.errors
    }

    fn on_submit(&mut self) {
        self.validate();
        if self.errors.is_empty() {
            self.step = LoginStep::Password;
        }
    }

    fn on_change(&mut self, change: FieldChange) {
        if change.name == EMAIL_FIELD {
            self.form.email = change.value;
            self.validate();
        }
    }

    fn on_back(&mut self) {
        self.step = LoginStep::Email;
    }
}

#[derive(Template)]
#[template(path = "login_password.html")]
pub struct PasswordStepView {
    pub email: String,
    pub back_action: &'static str,
}

impl PasswordStepView {
    pub fn new(flow: &LoginFlow) -> Self {
        Self {
            email: flow.form().email.clone(),
            back_action: BACK_ACTION,
        }
    }
}

#[derive(Template)]
#[template(path = "forgot_password.html")]
pub struct ForgotPasswordView {
    pub email: String,
}

/// Everything one browser session carries for the login pages.
#[derive(Debug, Default)]
pub struct LoginSession {
    pub storage: MemoryStorage,
    pub flow: LoginFlow,
    pub email_step: EmailStep,
}

impl LoginSession {
    /// Mount a fresh email step, as a full page load does. Errors from an
    /// earlier submit are not carried into the new mount.
    pub fn remount(&mut self) {
        self.email_step = EmailStep::new();
        self.flow.clear_errors();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_validates_immediately() {
        let mut flow = LoginFlow::default();

        flow.on_change(FieldChange {
            name: EMAIL_FIELD,
            value: "jordan".to_string(),
        });
        assert_eq!(flow.errors().email.as_deref(), Some("Must be a valid email address."));

        flow.on_change(FieldChange {
            name: EMAIL_FIELD,
            value: "jordan@example.com".to_string(),
        });
        assert!(flow.errors().is_empty());
        assert_eq!(flow.form().email, "jordan@example.com");
    }

    #[test]
    fn test_unknown_field_ignored() {
        let mut flow = LoginFlow::default();
        flow.on_change(FieldChange {
            name: "password",
            value: "hunter2".to_string(),
        });
        assert_eq!(flow.form(), &LoginForm::default());
        assert!(flow.errors().is_empty());
    }

    #[test]
    fn test_submit_advances_only_when_valid() {
        let mut flow = LoginFlow::default();
        flow.on_submit();
        assert_eq!(flow.step(), LoginStep::Email);
        assert_eq!(flow.errors().email.as_deref(), Some("Email is required"));

        flow.on_change(FieldChange {
            name: EMAIL_FIELD,
            value: "jordan@example.com".to_string(),
        });
        flow.on_submit();
        assert_eq!(flow.step(), LoginStep::Password);
    }

    #[test]
    fn test_back_returns_to_email_step() {
        let mut flow = LoginFlow::default();
        flow.on_change(FieldChange {
            name: EMAIL_FIELD,
            value: "jordan@example.com".to_string(),
        });
        flow.on_submit();
        flow.on_back();
        assert_eq!(flow.step(), LoginStep::Email);
        assert_eq!(flow.form().email, "jordan@example.com");
    }

    #[test]
    fn test_email_step_drives_flow() {
        let mut session = LoginSession::default();
        let LoginSession {
            flow, email_step, ..
        } = &mut session;

        email_step.input("Jordan@Example.COM", flow);
        assert!(email_step.submit(flow));
        assert_eq!(flow.form().email, "jordan@example.com");
        assert_eq!(flow.step(), LoginStep::Password);
    }

    #[test]
    fn test_remount_clears_stale_error() {
        let mut session = LoginSession::default();
        let LoginSession {
            flow, email_step, ..
        } = &mut session;
        email_step.input("jordan", flow);
        assert!(!email_step.submit(flow));
        assert!(EmailStep::submit_disabled(flow.errors()));

        session.remount();

        assert!(!EmailStep::submit_disabled(session.flow.errors()));
        assert_eq!(session.flow.form().email, "jordan");
        assert_eq!(session.flow.step(), LoginStep::Email);
    }

    #[test]
    fn test_remount_restores_focus() {
        let mut session = LoginSession::default();
        assert!(session.email_step.take_focus().is_some());
        assert!(session.email_step.take_focus().is_none());
        session.remount();
        assert!(session.email_step.take_focus().is_some());
    }
}
