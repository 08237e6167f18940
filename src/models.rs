use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential pair held by the client while signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

/// Identity of the signed-in user. Never carries a password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl User {
    /// A user known only by id, as restored from the session store
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Registration payload (step 1 of the wizard, confirm field already checked)
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

// Passwords never reach the logs
impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body returned by `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AuthResponse {
    /// The session and user granted by this response, if it grants one.
    /// Requires `success`, a non-empty token, and a user with an id.
    pub fn into_session(self) -> Option<(Session, User)> {
        if !self.success {
            return None;
        }
        let token = self.token.filter(|t| !t.is_empty())?;
        let user = self.user.filter(|u| !u.id.is_empty())?;
        let session = Session {
            token,
            user_id: user.id.clone(),
        };
        Some((session, user))
    }
}

/// One diary entry as sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub user_id: String,
    pub content: String,
    pub timestamp: String, // ISO 8601
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A display-only message in the journal history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Some(timestamp.into()),
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Some(timestamp.into()),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// What the backend has learned about the user, returned with each reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub recent_activities: Vec<String>,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub watched_movies: Vec<String>,
    #[serde(default)]
    pub stress_level: Option<f64>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub recommended_genres: Vec<String>,
}

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self.mood.is_none()
            && self.stress_level.is_none()
            && self.recent_activities.is_empty()
            && self.goals.is_empty()
            && self.recommended_genres.is_empty()
    }
}

/// Body returned by `/diary-entry`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub context: UserContext,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] = [ActivityLevel::Low, ActivityLevel::Medium, ActivityLevel::High];

    pub fn next(self) -> Self {
        match self {
            ActivityLevel::Low => ActivityLevel::Medium,
            ActivityLevel::Medium => ActivityLevel::High,
            ActivityLevel::High => ActivityLevel::Low,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            ActivityLevel::Low => ActivityLevel::High,
            ActivityLevel::Medium => ActivityLevel::Low,
            ActivityLevel::High => ActivityLevel::Medium,
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityLevel::Low => "low",
            ActivityLevel::Medium => "medium",
            ActivityLevel::High => "high",
        };
        f.write_str(label)
    }
}

/// Personalization attributes, always replaced wholesale
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub dislikes: Vec<String>,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    // Unset values go out as null so a save clears them on the server
    #[serde(default)]
    pub preferred_meditation_time: Option<u32>, // minutes
    #[serde(default)]
    pub preferred_notification_time: Option<String>, // HH:MM
}

impl Preferences {
    /// Defaults offered by the registration wizard's second step
    pub fn onboarding_defaults() -> Self {
        Self {
            preferred_meditation_time: Some(15),
            preferred_notification_time: Some("09:00".to_string()),
            ..Self::default()
        }
    }
}

/// Genres suggested in the preference forms
pub const KNOWN_GENRES: &[&str] = &["action", "comedy", "drama", "scifi", "documentary"];
