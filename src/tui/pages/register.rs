use crate::api::ApiError;
use crate::models::{AuthResponse, NewUser, Preferences, Session, User};
use crate::tui::dispatch::{ApiCommand, SaveOrigin};
use crate::tui::pages::preferences::PreferencesForm;
use crate::tui::widgets::editor::Editor;

pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const FIELDS_REQUIRED: &str = "All fields are required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterStep {
    BasicInfo,
    Preferences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountField {
    Username,
    Email,
    Name,
    Password,
    ConfirmPassword,
}

impl AccountField {
    pub const ALL: [AccountField; 5] = [
        AccountField::Username,
        AccountField::Email,
        AccountField::Name,
        AccountField::Password,
        AccountField::ConfirmPassword,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AccountField::Username => "Username",
            AccountField::Email => "Email",
            AccountField::Name => "Full Name",
            AccountField::Password => "Password",
            AccountField::ConfirmPassword => "Confirm Password",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, AccountField::Password | AccountField::ConfirmPassword)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// What the wizard wants the app to do after a save settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardOutcome {
    Stay,
    Finished,
}

/// Two-step sign-up: account details create the user and session, then an
/// optional preferences step.
#[derive(Debug, Clone)]
pub struct RegisterPage {
    pub step: RegisterStep,
    pub username: Editor,
    pub email: Editor,
    pub name: Editor,
    pub password: Editor,
    pub confirm_password: Editor,
    pub current_field: AccountField,
    pub preferences: PreferencesForm,
    pub error: Option<String>,
    pub pending: bool,
}

impl Default for RegisterPage {
    fn default() -> Self {
        Self {
            step: RegisterStep::BasicInfo,
            username: Editor::single_line(),
            email: Editor::single_line(),
            name: Editor::single_line(),
            password: Editor::single_line(),
            confirm_password: Editor::single_line(),
            current_field: AccountField::Username,
            preferences: PreferencesForm::from_preferences(&Preferences::onboarding_defaults()),
            error: None,
            pending: false,
        }
    }
}

impl RegisterPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editor_mut(&mut self, field: AccountField) -> &mut Editor {
        match field {
            AccountField::Username => &mut self.username,
            AccountField::Email => &mut self.email,
            AccountField::Name => &mut self.name,
            AccountField::Password => &mut self.password,
            AccountField::ConfirmPassword => &mut self.confirm_password,
        }
    }

    pub fn active_editor_mut(&mut self) -> Option<&mut Editor> {
        match self.step {
            RegisterStep::BasicInfo => Some(self.editor_mut(self.current_field)),
            RegisterStep::Preferences => self.preferences.active_editor_mut(),
        }
    }

    pub fn next_field(&mut self) {
        match self.step {
            RegisterStep::BasicInfo => {
                let idx = (self.current_field.index() + 1) % AccountField::ALL.len();
                self.current_field = AccountField::ALL[idx];
            }
            RegisterStep::Preferences => self.preferences.next_field(),
        }
    }

    pub fn previous_field(&mut self) {
        match self.step {
            RegisterStep::BasicInfo => {
                let len = AccountField::ALL.len();
                let idx = (self.current_field.index() + len - 1) % len;
                self.current_field = AccountField::ALL[idx];
            }
            RegisterStep::Preferences => self.preferences.previous_field(),
        }
    }

    pub fn is_last_field(&self) -> bool {
        match self.step {
            RegisterStep::BasicInfo => self.current_field == AccountField::ConfirmPassword,
            RegisterStep::Preferences => self.preferences.is_last_field(),
        }
    }

    /// Step 1: validate locally and queue account creation. A mismatch or
    /// missing field never reaches the network.
    pub fn submit_account(&mut self) -> Option<ApiCommand> {
        if self.pending || self.step != RegisterStep::BasicInfo {
            return None;
        }
        let user = NewUser {
            username: self.username.text().trim().to_string(),
            email: self.email.text().trim().to_string(),
            name: self.name.text().trim().to_string(),
            password: self.password.text(),
        };
        if user.username.is_empty() || user.email.is_empty() || user.name.is_empty() || user.password.is_empty() {
            self.error = Some(FIELDS_REQUIRED.to_string());
            return None;
        }
        if user.password != self.confirm_password.text() {
            self.error = Some(PASSWORD_MISMATCH.to_string());
            return None;
        }
        self.error = None;
        self.pending = true;
        Some(ApiCommand::Register { user })
    }

    /// Settle account creation. On success the wizard advances to the
    /// preferences step and the granted session is returned.
    pub fn on_registered(&mut self, result: Result<AuthResponse, ApiError>) -> Option<(Session, User)> {
        if !self.pending || self.step != RegisterStep::BasicInfo {
            tracing::debug!("dropping registration result with no request in flight");
            return None;
        }
        self.pending = false;
        match result {
            Ok(response) => {
                let server_error = response.error.clone();
                match response.into_session() {
                    Some(granted) => {
                        self.error = None;
                        self.password.clear();
                        self.confirm_password.clear();
                        self.step = RegisterStep::Preferences;
                        Some(granted)
                    }
                    None => {
                        self.error = Some(
                            server_error.unwrap_or_else(|| "Registration failed. Please try again.".to_string()),
                        );
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "registration failed");
                self.error = Some(match e.server_message() {
                    Some(message) => format!("Registration failed: {}", message),
                    None => "Registration failed. Please try again.".to_string(),
                });
                None
            }
        }
    }

    /// Step 2: queue the preferences save for the new account
    pub fn submit_preferences(&mut self, user_id: Option<&str>) -> Option<ApiCommand> {
        if self.pending || self.step != RegisterStep::Preferences {
            return None;
        }
        let Some(user_id) = user_id else {
            self.error = Some("Your session has expired. Please sign in again.".to_string());
            return None;
        };
        match self.preferences.to_preferences() {
            Ok(preferences) => {
                self.error = None;
                self.pending = true;
                Some(ApiCommand::SavePreferences {
                    user_id: user_id.to_string(),
                    preferences,
                    origin: SaveOrigin::Registration,
                })
            }
            Err(message) => {
                self.error = Some(message);
                None
            }
        }
    }

    /// Settle the step-2 save. Failures keep the user on the step.
    pub fn on_preferences_saved(&mut self, result: Result<Preferences, ApiError>) -> WizardOutcome {
        if !self.pending || self.step != RegisterStep::Preferences {
            tracing::debug!("dropping onboarding save with no request in flight");
            return WizardOutcome::Stay;
        }
        self.pending = false;
        match result {
            Ok(_) => WizardOutcome::Finished,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save onboarding preferences");
                self.error = Some(format!("Could not save your preferences: {}", e));
                WizardOutcome::Stay
            }
        }
    }

    /// Leave the wizard without saving preferences
    pub fn skip_preferences(&mut self) -> WizardOutcome {
        if self.step == RegisterStep::Preferences && !self.pending {
            WizardOutcome::Finished
        } else {
            WizardOutcome::Stay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled(password: &str, confirm: &str) -> RegisterPage {
        let mut page = RegisterPage::new();
        page.username.insert_str("alice");
        page.email.insert_str("alice@example.com");
        page.name.insert_str("Alice");
        page.password.insert_str(password);
        page.confirm_password.insert_str(confirm);
        page
    }

    fn granted() -> AuthResponse {
        serde_json::from_value(json!({
            "success": true,
            "token": "jwt",
            "user": { "id": "u9", "username": "alice", "name": "Alice" }
        }))
        .unwrap()
    }

    #[test]
    fn mismatched_passwords_never_queue_request() {
        let mut page = filled("a", "b");
        assert!(page.submit_account().is_none());
        assert_eq!(page.error.as_deref(), Some(PASSWORD_MISMATCH));
        assert!(!page.pending);
        assert_eq!(page.step, RegisterStep::BasicInfo);
    }

    #[test]
    fn missing_fields_are_reported() {
        let mut page = filled("a", "a");
        page.email.clear();
        assert!(page.submit_account().is_none());
        assert_eq!(page.error.as_deref(), Some(FIELDS_REQUIRED));
    }

    #[test]
    fn account_step_advances_on_success() {
        let mut page = filled("pw", "pw");
        let command = page.submit_account().unwrap();
        match command {
            ApiCommand::Register { user } => {
                assert_eq!(user.username, "alice");
                assert_eq!(user.password, "pw");
            }
            other => panic!("unexpected command {:?}", other),
        }

        let (session, user) = page.on_registered(Ok(granted())).unwrap();
        assert_eq!(session.user_id, "u9");
        assert_eq!(user.name, "Alice");
        assert_eq!(page.step, RegisterStep::Preferences);
        assert!(page.password.is_blank());
        assert_eq!(
            page.preferences.to_preferences().unwrap(),
            Preferences::onboarding_defaults()
        );
    }

    #[test]
    fn server_rejection_keeps_step_one() {
        let mut page = filled("pw", "pw");
        page.submit_account();
        let error = ApiError::RequestFailed {
            status: 400,
            message: "Username already registered".to_string(),
        };
        assert!(page.on_registered(Err(error)).is_none());
        assert_eq!(page.step, RegisterStep::BasicInfo);
        assert_eq!(
            page.error.as_deref(),
            Some("Registration failed: Username already registered")
        );
    }

    #[test]
    fn preferences_step_finishes_only_after_save() {
        let mut page = filled("pw", "pw");
        page.submit_account();
        page.on_registered(Ok(granted()));

        let command = page.submit_preferences(Some("u9")).unwrap();
        assert!(matches!(
            command,
            ApiCommand::SavePreferences { origin: SaveOrigin::Registration, .. }
        ));

        let error = ApiError::Decode("bad".to_string());
        assert_eq!(page.on_preferences_saved(Err(error)), WizardOutcome::Stay);
        assert!(page.error.is_some());

        page.submit_preferences(Some("u9")).unwrap();
        let outcome = page.on_preferences_saved(Ok(Preferences::onboarding_defaults()));
        assert_eq!(outcome, WizardOutcome::Finished);
    }

    #[test]
    fn skip_is_only_offered_on_step_two() {
        let mut page = filled("pw", "pw");
        assert_eq!(page.skip_preferences(), WizardOutcome::Stay);
        page.submit_account();
        page.on_registered(Ok(granted()));
        assert_eq!(page.skip_preferences(), WizardOutcome::Finished);
    }
}
