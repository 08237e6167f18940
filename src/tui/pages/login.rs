use crate::api::ApiError;
use crate::models::{AuthResponse, Session, User};
use crate::tui::dispatch::ApiCommand;
use crate::tui::widgets::editor::Editor;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginPage {
    pub username: Editor,
    pub password: Editor,
    pub current_field: LoginField,
    pub error: Option<String>,
    pub pending: bool,
}

impl LoginPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub fn previous_field(&mut self) {
        self.next_field();
    }

    pub fn is_last_field(&self) -> bool {
        self.current_field == LoginField::Password
    }

    pub fn active_editor_mut(&mut self) -> &mut Editor {
        match self.current_field {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    /// Validate and queue the login request. `None` while a request is in
    /// flight or when a field is empty.
    pub fn submit(&mut self) -> Option<ApiCommand> {
        if self.pending {
            return None;
        }
        let username = self.username.text().trim().to_string();
        let password = self.password.text();
        if username.is_empty() || password.is_empty() {
            self.error = Some("Username and password are required".to_string());
            return None;
        }
        self.error = None;
        self.pending = true;
        Some(ApiCommand::Login { username, password })
    }

    /// Settle the in-flight login. Returns the granted session, if any.
    pub fn on_result(&mut self, result: Result<AuthResponse, ApiError>) -> Option<(Session, User)> {
        if !self.pending {
            tracing::debug!("dropping login result with no request in flight");
            return None;
        }
        self.pending = false;
        match result {
            Ok(response) => match response.into_session() {
                Some(granted) => {
                    self.error = None;
                    self.password.clear();
                    Some(granted)
                }
                None => {
                    self.error = Some(INVALID_CREDENTIALS.to_string());
                    None
                }
            },
            Err(e) if e.is_auth_error() => {
                self.error = Some(INVALID_CREDENTIALS.to_string());
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                let detail = e.server_message().unwrap_or("could not reach the server");
                self.error = Some(format!("Login failed: {}", detail));
                None
            }
        }
    }
}
