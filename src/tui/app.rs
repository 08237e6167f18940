use crate::Config;
use crate::api::ApiError;
use crate::auth::AuthContext;
use crate::models::{Session, User};
use crate::router::{Route, Router};
use crate::tui::dispatch::{ApiCommand, ApiEvent, SaveOrigin};
use crate::tui::pages::{JournalPage, LoginPage, PreferencesPage, RegisterPage, RegisterStep, WizardOutcome};
use crate::tui::widgets::editor::Editor;
use std::time::Instant;

pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Help,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    // Core infrastructure
    pub config: Config,
    pub auth: AuthContext,
    pub router: Router,
    pub mode: Mode,

    // One state per route
    pub login: LoginPage,
    pub register: RegisterPage,
    pub journal: JournalPage,
    pub preferences: PreferencesPage,

    pub status: StatusState,

    // Remote work requested since the last drain
    outbox: Vec<ApiCommand>,
}

impl App {
    /// Build the app on `initial`, applying the route guard and running the
    /// landing page's mount hook
    pub fn new(config: Config, auth: AuthContext, initial: Route) -> Self {
        let router = Router::new(initial, auth.is_authenticated());
        let mut app = Self {
            config,
            auth,
            router,
            mode: Mode::Normal,
            login: LoginPage::new(),
            register: RegisterPage::new(),
            journal: JournalPage::default(),
            preferences: PreferencesPage::default(),
            status: StatusState::default(),
            outbox: Vec::new(),
        };
        app.mount(app.router.current());
        if app.auth.is_authenticated() {
            app.queue(ApiCommand::FetchProfile);
        }
        app
    }

    pub fn route(&self) -> Route {
        self.router.current()
    }

    /// Commands queued since the last call, in request order
    pub fn take_commands(&mut self) -> Vec<ApiCommand> {
        std::mem::take(&mut self.outbox)
    }

    fn queue(&mut self, command: ApiCommand) {
        tracing::debug!(command = command.name(), "queued api command");
        self.outbox.push(command);
    }

    pub fn navigate(&mut self, requested: Route) {
        let transition = self.router.navigate(requested, self.auth.is_authenticated());
        if transition.changed() {
            tracing::info!(from = %transition.from, to = %transition.to, "navigated");
            self.mount(transition.to);
        }
    }

    /// Re-run the guard after the auth state changed
    fn sync_route(&mut self) {
        let transition = self.router.refresh(self.auth.is_authenticated());
        if transition.changed() {
            tracing::info!(from = %transition.from, to = %transition.to, "auth change moved route");
            self.mount(transition.to);
        }
    }

    fn mount(&mut self, route: Route) {
        match route {
            Route::Login => self.login = LoginPage::new(),
            Route::Register => self.register = RegisterPage::new(),
            Route::Journal => {
                let commands = self.journal.on_mount(self.auth.user_id());
                for command in commands {
                    self.queue(command);
                }
            }
            Route::Preferences => {
                if let Some(command) = self.preferences.on_mount(self.auth.user_id()) {
                    self.queue(command);
                }
            }
        }
    }

    /// Submit whatever the current page is editing
    pub fn submit(&mut self) {
        let command = match self.route() {
            Route::Login => self.login.submit(),
            Route::Register => match self.register.step {
                RegisterStep::BasicInfo => self.register.submit_account(),
                RegisterStep::Preferences => self.register.submit_preferences(self.auth.user_id()),
            },
            Route::Journal => self.journal.submit(self.auth.user_id()),
            Route::Preferences => match self.preferences.submit(self.auth.user_id()) {
                Ok(command) => command,
                Err(message) => {
                    self.set_status_message(message);
                    None
                }
            },
        };
        if let Some(command) = command {
            self.queue(command);
        }
    }

    /// Leave the registration wizard's preferences step without saving
    pub fn skip_registration_step(&mut self) {
        if self.route() == Route::Register && self.register.skip_preferences() == WizardOutcome::Finished {
            self.finish_registration();
        }
    }

    fn finish_registration(&mut self) {
        tracing::info!("registration complete");
        self.register = RegisterPage::new();
        // The login route sends signed-in users to the journal
        self.navigate(Route::Login);
    }

    fn sign_in(&mut self, session: Session, user: User) {
        match self.auth.login(session, user) {
            Ok(()) => {
                self.queue(ApiCommand::FetchProfile);
                self.sync_route();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to persist session");
                self.set_status_message(format!("Could not save your session: {}", e));
            }
        }
    }

    /// Clear the session and return to the login page
    pub fn logout(&mut self) {
        if let Err(e) = self.auth.logout() {
            self.set_status_message(format!("Signed out, but the stored session could not be removed: {}", e));
        }
        self.journal.discard();
        self.preferences = PreferencesPage::default();
        self.register = RegisterPage::new();
        self.navigate(Route::Login);
    }

    /// Apply a finished API call to the page that asked for it
    pub fn handle_api_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::LoggedIn(result) => {
                if let Some((session, user)) = self.login.on_result(result) {
                    self.sign_in(session, user);
                }
            }
            ApiEvent::Registered(result) => {
                if let Some((session, user)) = self.register.on_registered(result) {
                    self.sign_in(session, user);
                }
            }
            ApiEvent::EntryReplied { entry_id, result } => self.journal.on_reply(entry_id, result),
            ApiEvent::HistoryLoaded(result) => {
                if let Some(message) = self.journal.on_history(result) {
                    self.set_status_message(message);
                }
            }
            ApiEvent::UserContextLoaded(result) => {
                if self.route() == Route::Journal {
                    self.journal.on_context(result);
                }
            }
            ApiEvent::PreferencesLoaded(result) => {
                if let Some(message) = self.preferences.on_loaded(result) {
                    self.set_status_message(message);
                }
            }
            ApiEvent::PreferencesSaved {
                origin: SaveOrigin::Registration,
                result,
            } => {
                if self.register.on_preferences_saved(result) == WizardOutcome::Finished {
                    self.finish_registration();
                }
            }
            ApiEvent::PreferencesSaved {
                origin: SaveOrigin::PreferencesPage,
                result,
            } => {
                if let Some(message) = self.preferences.on_saved(result) {
                    self.set_status_message(message);
                }
            }
            ApiEvent::ProfileLoaded(Ok(profile)) => self.auth.set_profile(profile),
            ApiEvent::ProfileLoaded(Err(e)) => {
                if matches!(e, ApiError::RequestFailed { status: 401, .. }) && self.auth.is_authenticated() {
                    tracing::warn!("stored session rejected by server");
                    self.logout();
                    self.set_status_message(SESSION_EXPIRED);
                } else {
                    tracing::warn!(error = %e, "failed to load profile");
                }
            }
        }
    }

    /// Editor that receives typed characters on the current page, if any
    pub fn active_editor_mut(&mut self) -> Option<&mut Editor> {
        match self.router.current() {
            Route::Login => Some(self.login.active_editor_mut()),
            Route::Register => self.register.active_editor_mut(),
            Route::Journal => {
                if self.journal.loading {
                    None
                } else {
                    Some(&mut self.journal.composer)
                }
            }
            Route::Preferences => {
                if self.preferences.loading {
                    None
                } else {
                    self.preferences.form.active_editor_mut()
                }
            }
        }
    }

    pub fn next_field(&mut self) {
        match self.route() {
            Route::Login => self.login.next_field(),
            Route::Register => self.register.next_field(),
            Route::Preferences => self.preferences.form.next_field(),
            Route::Journal => {}
        }
    }

    pub fn previous_field(&mut self) {
        match self.route() {
            Route::Login => self.login.previous_field(),
            Route::Register => self.register.previous_field(),
            Route::Preferences => self.preferences.form.previous_field(),
            Route::Journal => {}
        }
    }

    /// Enter on the last field of a form submits it
    pub fn is_last_field(&self) -> bool {
        match self.route() {
            Route::Login => self.login.is_last_field(),
            Route::Register => self.register.is_last_field(),
            Route::Preferences => self.preferences.form.is_last_field(),
            Route::Journal => false,
        }
    }

    /// Show the nav bar (signed in and not on an auth page)
    pub fn shows_nav(&self) -> bool {
        self.auth.is_authenticated() && self.route().is_protected()
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared (after 3 seconds)
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.mode = Mode::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthResponse, ChatResponse, Preferences, UserContext};
    use crate::session::SessionStore;
    use crate::tui::pages::journal::FALLBACK_REPLY;
    use crate::tui::pages::preferences::{SAVE_FAILED, SAVE_SUCCEEDED};
    use serde_json::json;

    fn anonymous_app(initial: Route) -> App {
        let store = SessionStore::open_in_memory().unwrap();
        let auth = AuthContext::restore(store).unwrap();
        App::new(Config::default(), auth, initial)
    }

    fn signed_in_app(initial: Route) -> App {
        let mut store = SessionStore::open_in_memory().unwrap();
        store
            .save(&Session {
                token: "jwt".to_string(),
                user_id: "u1".to_string(),
            })
            .unwrap();
        let auth = AuthContext::restore(store).unwrap();
        App::new(Config::default(), auth, initial)
    }

    fn granted(id: &str) -> AuthResponse {
        serde_json::from_value(json!({
            "success": true,
            "token": "fresh",
            "user": { "id": id, "username": "alice", "email": "a@x.io", "name": "Alice" }
        }))
        .unwrap()
    }

    fn type_into(app: &mut App, text: &str) {
        app.active_editor_mut().unwrap().insert_str(text);
    }

    /// Type and send a journal entry, returning its id
    fn write_entry(app: &mut App, text: &str) -> u64 {
        type_into(app, text);
        app.submit();
        app.take_commands()
            .into_iter()
            .find_map(|command| match command {
                ApiCommand::PostEntry { entry_id, .. } => Some(entry_id),
                _ => None,
            })
            .unwrap()
    }

    fn replied(entry_id: u64, text: &str) -> ApiEvent {
        ApiEvent::EntryReplied {
            entry_id,
            result: Ok(ChatResponse {
                response: text.to_string(),
                context: UserContext::default(),
            }),
        }
    }

    fn journal_contents(app: &App) -> Vec<&str> {
        app.journal.messages.iter().map(|m| m.content.as_str()).collect()
    }

    #[test]
    fn leaving_the_journal_mid_reply_keeps_entries_paired() {
        let mut app = signed_in_app(Route::Journal);
        app.take_commands();

        let first = write_entry(&mut app, "A");
        app.navigate(Route::Preferences);
        app.navigate(Route::Journal);
        assert_eq!(journal_contents(&app), vec!["A"]);
        assert!(app.journal.loading);

        // Still locked until A's reply lands
        app.journal.composer.insert_str("B");
        app.submit();
        assert!(app.take_commands().iter().all(|c| c.name() != "post_entry"));
        app.journal.composer.clear();

        app.handle_api_event(replied(first, "reply-to-A"));
        let second = write_entry(&mut app, "B");
        app.handle_api_event(replied(first, "reply-to-A again"));
        app.handle_api_event(replied(second, "reply-to-B"));

        assert_eq!(journal_contents(&app), vec!["A", "reply-to-A", "B", "reply-to-B"]);
        assert!(!app.journal.loading);
    }

    #[test]
    fn anonymous_user_is_kept_off_protected_pages() {
        let mut app = anonymous_app(Route::Journal);
        assert_eq!(app.route(), Route::Login);
        assert!(app.take_commands().is_empty());

        app.navigate(Route::Preferences);
        assert_eq!(app.route(), Route::Login);
        app.navigate(Route::Register);
        assert_eq!(app.route(), Route::Register);
    }

    #[test]
    fn restored_session_lands_on_journal_and_loads_data() {
        let mut app = signed_in_app(Route::Login);
        assert_eq!(app.route(), Route::Journal);
        let names: Vec<&str> = app.take_commands().iter().map(ApiCommand::name).collect();
        assert_eq!(names, vec!["fetch_history", "fetch_user_context", "fetch_profile"]);
        assert!(app.shows_nav());
    }

    #[test]
    fn signed_in_user_may_stay_on_register() {
        let mut app = signed_in_app(Route::Register);
        assert_eq!(app.route(), Route::Register);
        assert!(!app.shows_nav());
        app.navigate(Route::Login);
        assert_eq!(app.route(), Route::Journal);
    }

    #[test]
    fn successful_login_persists_session_and_opens_journal() {
        let mut app = anonymous_app(Route::Login);
        type_into(&mut app, "alice");
        app.next_field();
        type_into(&mut app, "pw");
        app.submit();
        let commands = app.take_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].name(), "login");

        app.handle_api_event(ApiEvent::LoggedIn(Ok(granted("u1"))));
        assert_eq!(app.route(), Route::Journal);
        assert_eq!(app.auth.user_id(), Some("u1"));
        let stored = app.auth.store().load().unwrap().unwrap();
        assert_eq!(stored.token, "fresh");

        let names: Vec<&str> = app.take_commands().iter().map(ApiCommand::name).collect();
        assert_eq!(names, vec!["fetch_profile", "fetch_history", "fetch_user_context"]);
    }

    #[test]
    fn rejected_login_stays_on_login_page() {
        let mut app = anonymous_app(Route::Login);
        type_into(&mut app, "alice");
        app.next_field();
        type_into(&mut app, "wrong");
        app.submit();
        let refused: AuthResponse = serde_json::from_value(json!({ "success": false })).unwrap();
        app.handle_api_event(ApiEvent::LoggedIn(Ok(refused)));

        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.login.error.as_deref(), Some("Invalid username or password"));
        assert!(!app.auth.is_authenticated());
        assert!(app.auth.store().load().unwrap().is_none());
    }

    #[test]
    fn registration_wizard_ends_on_journal() {
        let mut app = anonymous_app(Route::Register);
        for text in ["alice", "alice@example.com", "Alice", "pw", "pw"] {
            type_into(&mut app, text);
            app.next_field();
        }
        app.submit();
        assert_eq!(app.take_commands()[0].name(), "register");

        app.handle_api_event(ApiEvent::Registered(Ok(granted("u7"))));
        assert_eq!(app.route(), Route::Register);
        assert_eq!(app.register.step, RegisterStep::Preferences);
        assert!(app.auth.is_authenticated());
        app.take_commands();

        app.submit();
        let commands = app.take_commands();
        assert!(matches!(
            &commands[0],
            ApiCommand::SavePreferences { user_id, origin: SaveOrigin::Registration, .. } if user_id == "u7"
        ));

        app.handle_api_event(ApiEvent::PreferencesSaved {
            origin: SaveOrigin::Registration,
            result: Ok(Preferences::onboarding_defaults()),
        });
        assert_eq!(app.route(), Route::Journal);
        assert_eq!(app.register.step, RegisterStep::BasicInfo);
    }

    #[test]
    fn password_mismatch_issues_no_request() {
        let mut app = anonymous_app(Route::Register);
        for text in ["alice", "alice@example.com", "Alice", "one", "two"] {
            type_into(&mut app, text);
            app.next_field();
        }
        app.submit();
        assert!(app.take_commands().is_empty());
        assert_eq!(app.register.error.as_deref(), Some("Passwords do not match"));
    }

    #[test]
    fn skipping_onboarding_opens_journal() {
        let mut app = anonymous_app(Route::Register);
        for text in ["bob", "bob@example.com", "Bob", "pw", "pw"] {
            type_into(&mut app, text);
            app.next_field();
        }
        app.submit();
        app.handle_api_event(ApiEvent::Registered(Ok(granted("u8"))));
        app.skip_registration_step();
        assert_eq!(app.route(), Route::Journal);
    }

    #[test]
    fn journal_round_trip_and_fallback() {
        let mut app = signed_in_app(Route::Journal);
        app.take_commands();

        app.submit();
        assert!(app.take_commands().is_empty());

        let walk = write_entry(&mut app, "Had a lovely walk");
        assert!(app.active_editor_mut().is_none());

        app.handle_api_event(ApiEvent::EntryReplied {
            entry_id: walk,
            result: Ok(ChatResponse {
                response: "Walks are great!".to_string(),
                context: UserContext::default(),
            }),
        });
        assert_eq!(app.journal.messages.len(), 2);

        let rain = write_entry(&mut app, "Then it rained");
        app.handle_api_event(ApiEvent::EntryReplied {
            entry_id: rain,
            result: Err(ApiError::Decode("x".to_string())),
        });
        assert_eq!(app.journal.messages.len(), 4);
        assert_eq!(app.journal.messages[3].content, FALLBACK_REPLY);
    }

    #[test]
    fn preferences_page_reports_outcomes_in_status_bar() {
        let mut app = signed_in_app(Route::Preferences);
        let commands = app.take_commands();
        assert_eq!(commands[0].name(), "fetch_preferences");

        app.handle_api_event(ApiEvent::PreferencesLoaded(Ok(Preferences::default())));
        app.submit();
        assert_eq!(app.take_commands()[0].name(), "save_preferences");
        app.handle_api_event(ApiEvent::PreferencesSaved {
            origin: SaveOrigin::PreferencesPage,
            result: Ok(Preferences::default()),
        });
        assert_eq!(app.status.message.as_deref(), Some(SAVE_SUCCEEDED));

        app.submit();
        app.handle_api_event(ApiEvent::PreferencesSaved {
            origin: SaveOrigin::PreferencesPage,
            result: Err(ApiError::Decode("x".to_string())),
        });
        assert_eq!(app.status.message.as_deref(), Some(SAVE_FAILED));
    }

    #[test]
    fn logout_clears_session_and_guards_routes() {
        let mut app = signed_in_app(Route::Journal);
        app.logout();
        assert_eq!(app.route(), Route::Login);
        assert!(!app.auth.is_authenticated());
        assert!(app.auth.store().load().unwrap().is_none());
        app.navigate(Route::Journal);
        assert_eq!(app.route(), Route::Login);
    }

    #[test]
    fn stale_reply_after_logout_is_dropped() {
        let mut app = signed_in_app(Route::Journal);
        let entry = write_entry(&mut app, "entry");
        app.logout();
        app.handle_api_event(ApiEvent::EntryReplied {
            entry_id: entry,
            result: Err(ApiError::Decode("x".to_string())),
        });
        assert!(app.journal.messages.is_empty());
    }

    #[test]
    fn expired_token_signs_out() {
        let mut app = signed_in_app(Route::Journal);
        app.handle_api_event(ApiEvent::ProfileLoaded(Err(ApiError::RequestFailed {
            status: 401,
            message: "Invalid token".to_string(),
        })));
        assert_eq!(app.route(), Route::Login);
        assert_eq!(app.status.message.as_deref(), Some(SESSION_EXPIRED));
    }

    #[test]
    fn profile_fills_in_display_name() {
        let mut app = signed_in_app(Route::Journal);
        app.handle_api_event(ApiEvent::ProfileLoaded(Ok(User {
            id: "u1".to_string(),
            username: "alice".to_string(),
            email: "a@x.io".to_string(),
            name: "Alice".to_string(),
        })));
        assert_eq!(app.auth.display_name(), Some("Alice"));
    }
}
