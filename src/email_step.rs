//! First step of the login form: collect an email address.
//!
//! The step owns no form state. Values, errors and every mutation belong to a
//! [`LoginFormController`]; the step only normalizes input, gates submission
//! on the email error, asks for focus once per mount, and hands the address
//! to the password-recovery flow through session storage.

use askama::Template;

use crate::{
    models::{FormErrors, LoginForm},
    session::SessionStorage,
};

pub const EMAIL_FIELD: &str = "email";

/// Session storage key read by the password-recovery flow.
pub const SESSION_EMAIL_KEY: &str = "email";

pub const FORGOT_PASSWORD_PATH: &str = "/forgot-password";

pub const SUBMIT_ACTION: &str = "/login/email";
pub const RESET_PASSWORD_ACTION: &str = "/login/reset-password";

/// A single field update sent to the form controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub name: &'static str,
    pub value: String,
}

/// The form-state owner a login step is mounted under.
pub trait LoginFormController {
    fn form(&self) -> &LoginForm;
    fn errors(&self) -> &FormErrors;
    fn on_submit(&mut self);
    fn on_change(&mut self, change: FieldChange);
    /// Part of the shared step contract. The email step has no back affordance
    /// and never calls it.
    fn on_back(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    To(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    EmailInput,
}

#[derive(Template)]
#[template(path = "login_email.html")]
pub struct EmailStepView {
    pub email: String,
    pub error: Option<String>,
    pub submit_disabled: bool,
    pub autofocus: bool,
    pub submit_action: &'static str,
    pub reset_action: &'static str,
}

/// One mounted instance of the email step.
#[derive(Debug, Default)]
pub struct EmailStep {
    focused: bool,
}

impl EmailStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount-time focus effect. Yields a target on the first call only.
    pub fn take_focus(&mut self) -> Option<FocusTarget> {
        if self.focused {
            return None;
        }
        self.focused = true;
        Some(FocusTarget::EmailInput)
    }

    pub fn submit_disabled(errors: &FormErrors) -> bool {
        errors.email.is_some()
    }

    pub fn render<C: LoginFormController>(&mut self, controller: &C) -> EmailStepView {
        let autofocus = self.take_focus().is_some();
        let errors = controller.errors();
        EmailStepView {
            email: controller.form().email.clone(),
            error: errors.email.clone(),
            submit_disabled: Self::submit_disabled(errors),
            autofocus,
            submit_action: SUBMIT_ACTION,
            reset_action: RESET_PASSWORD_ACTION,
        }
    }

    /// Keystroke handler. The value reaches the controller already lower-cased.
    pub fn input<C: LoginFormController>(&self, raw: &str, controller: &mut C) {
        controller.on_change(FieldChange {
            name: EMAIL_FIELD,
            value: raw.to_lowercase(),
        });
    }

    /// Forward a submit to the controller unless an email error is showing.
    /// Returns whether the controller was called.
    pub fn submit<C: LoginFormController>(&self, controller: &mut C) -> bool {
        if Self::submit_disabled(controller.errors()) {
            return false;
        }
        controller.on_submit();
        true
    }

    /// "Reset password": hand a clean, non-empty address to the recovery flow
    /// as-is, then navigate there regardless.
    pub fn reset_password<C, S>(&self, controller: &C, storage: &mut S) -> Navigation
    where
        C: LoginFormController,
        S: SessionStorage + ?Sized,
    {
        let email = &controller.form().email;
        if !email.is_empty() && controller.errors().email.is_none() {
            storage.set_item(SESSION_EMAIL_KEY, email);
        }
        Navigation::To(FORGOT_PASSWORD_PATH)
    }
}
