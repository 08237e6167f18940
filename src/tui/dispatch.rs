//! Bridge between the synchronous event loop and the async API client.
//!
//! Pages describe remote work as `ApiCommand`s; the loop hands them to the
//! `Dispatcher`, which runs each on the tokio runtime and posts the outcome
//! back as an `ApiEvent`. Completions are drained once per frame, so page
//! state is only ever touched from the UI thread.

use std::fmt;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ApiClient, ApiError};
use crate::models::{AuthResponse, ChatResponse, Message, NewUser, Preferences, User, UserContext};

/// Which screen asked for a preferences save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOrigin {
    Registration,
    PreferencesPage,
}

#[derive(Clone, PartialEq)]
pub enum ApiCommand {
    Login { username: String, password: String },
    Register { user: NewUser },
    /// `entry_id` ties the reply back to the entry that asked for it
    PostEntry { entry_id: u64, user_id: String, content: String, timestamp: String },
    FetchHistory { user_id: String },
    FetchUserContext { user_id: String },
    FetchPreferences { user_id: String },
    SavePreferences { user_id: String, preferences: Preferences, origin: SaveOrigin },
    FetchProfile,
}

impl ApiCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ApiCommand::Login { .. } => "login",
            ApiCommand::Register { .. } => "register",
            ApiCommand::PostEntry { .. } => "post_entry",
            ApiCommand::FetchHistory { .. } => "fetch_history",
            ApiCommand::FetchUserContext { .. } => "fetch_user_context",
            ApiCommand::FetchPreferences { .. } => "fetch_preferences",
            ApiCommand::SavePreferences { .. } => "save_preferences",
            ApiCommand::FetchProfile => "fetch_profile",
        }
    }
}

// Passwords never reach the logs
impl fmt::Debug for ApiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiCommand::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .finish_non_exhaustive(),
            ApiCommand::Register { user } => f
                .debug_struct("Register")
                .field("username", &user.username)
                .field("email", &user.email)
                .finish_non_exhaustive(),
            ApiCommand::PostEntry { entry_id, user_id, timestamp, .. } => f
                .debug_struct("PostEntry")
                .field("entry_id", entry_id)
                .field("user_id", user_id)
                .field("timestamp", timestamp)
                .finish_non_exhaustive(),
            ApiCommand::FetchHistory { user_id } => f.debug_struct("FetchHistory").field("user_id", user_id).finish(),
            ApiCommand::FetchUserContext { user_id } => {
                f.debug_struct("FetchUserContext").field("user_id", user_id).finish()
            }
            ApiCommand::FetchPreferences { user_id } => {
                f.debug_struct("FetchPreferences").field("user_id", user_id).finish()
            }
            ApiCommand::SavePreferences { user_id, origin, .. } => f
                .debug_struct("SavePreferences")
                .field("user_id", user_id)
                .field("origin", origin)
                .finish_non_exhaustive(),
            ApiCommand::FetchProfile => f.write_str("FetchProfile"),
        }
    }
}

#[derive(Debug)]
pub enum ApiEvent {
    LoggedIn(Result<AuthResponse, ApiError>),
    Registered(Result<AuthResponse, ApiError>),
    EntryReplied { entry_id: u64, result: Result<ChatResponse, ApiError> },
    HistoryLoaded(Result<Vec<Message>, ApiError>),
    UserContextLoaded(Result<UserContext, ApiError>),
    PreferencesLoaded(Result<Preferences, ApiError>),
    PreferencesSaved { origin: SaveOrigin, result: Result<Preferences, ApiError> },
    ProfileLoaded(Result<User, ApiError>),
}

/// Run one command against the backend
pub async fn execute(client: &ApiClient, command: ApiCommand) -> ApiEvent {
    match command {
        ApiCommand::Login { username, password } => {
            ApiEvent::LoggedIn(client.authenticate(&username, &password).await)
        }
        ApiCommand::Register { user } => ApiEvent::Registered(client.register(&user, None).await),
        ApiCommand::PostEntry { entry_id, user_id, content, timestamp } => ApiEvent::EntryReplied {
            entry_id,
            result: client.post_diary_entry(&user_id, &content, &timestamp).await,
        },
        ApiCommand::FetchHistory { user_id } => ApiEvent::HistoryLoaded(client.fetch_history(&user_id).await),
        ApiCommand::FetchUserContext { user_id } => {
            ApiEvent::UserContextLoaded(client.fetch_user_context(&user_id).await)
        }
        ApiCommand::FetchPreferences { user_id } => {
            ApiEvent::PreferencesLoaded(client.fetch_preferences(&user_id).await)
        }
        ApiCommand::SavePreferences { user_id, preferences, origin } => ApiEvent::PreferencesSaved {
            origin,
            result: client.update_preferences(&user_id, &preferences).await,
        },
        ApiCommand::FetchProfile => ApiEvent::ProfileLoaded(client.fetch_profile().await),
    }
}

pub struct Dispatcher {
    runtime: Handle,
    tx: UnboundedSender<ApiEvent>,
    rx: UnboundedReceiver<ApiEvent>,
}

impl Dispatcher {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { runtime, tx, rx }
    }

    /// Spawn `command` with `client`; its event arrives on a later `try_recv`
    pub fn dispatch(&self, client: ApiClient, command: ApiCommand) {
        tracing::debug!(command = command.name(), "dispatching api command");
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let event = execute(&client, command).await;
            // The receiver only goes away when the UI is shutting down
            let _ = tx.send(event);
        });
    }

    pub fn try_recv(&mut self) -> Option<ApiEvent> {
        self.rx.try_recv().ok()
    }
}
