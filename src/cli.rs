use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::auth::AuthContext;
use crate::session::SessionError;
use crate::tui::pages::login::INVALID_CREDENTIALS;
use crate::tui::widgets::message_list::{ASSISTANT_LABEL, USER_LABEL};
use crate::utils::{current_timestamp, format_entry_timestamp};

pub const PASSWORD_ENV: &str = "MOODSCRIBE_PASSWORD";

#[derive(Parser)]
#[command(name = "moodscribe")]
#[command(about = "MoodScribe - an empathetic digital journal in your terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (separate dev config and session)
    #[arg(long)]
    pub dev: bool,

    /// Backend base URL, e.g. http://localhost:8000/api
    #[arg(long)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui {
        /// Path to open, e.g. /journal or /register
        #[arg(long, default_value = "/")]
        route: String,
    },
    /// Sign in and store the session
    Login {
        username: String,
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Post a journal entry and print the reply
    Write {
        content: String,
    },
    /// Print the conversation history
    History,
    /// Print your preferences as JSON
    Preferences,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),
    #[error("{0}")]
    ApiError(#[from] ApiError),
    #[error("{0}")]
    LoginRejected(String),
    #[error("Not signed in. Run `moodscribe login <username>` first.")]
    NotSignedIn,
    #[error("Journal entry is empty")]
    EmptyEntry,
    #[error("Failed to format output: {0}")]
    OutputError(#[from] serde_json::Error),
}

/// The signed-in user's id and a client carrying their token
fn signed_in(client: &ApiClient, auth: &AuthContext) -> Result<(String, ApiClient), CliError> {
    let user_id = auth.user_id().ok_or(CliError::NotSignedIn)?.to_string();
    Ok((user_id, client.with_token(auth.token())))
}

/// Handle the login command
pub async fn handle_login(
    username: String,
    password: String,
    client: &ApiClient,
    auth: &mut AuthContext,
) -> Result<(), CliError> {
    let response = match client.authenticate(&username, &password).await {
        Ok(response) => response,
        Err(e) if e.is_auth_error() => return Err(CliError::LoginRejected(INVALID_CREDENTIALS.to_string())),
        Err(e) => return Err(e.into()),
    };
    let (session, user) = response
        .into_session()
        .ok_or_else(|| CliError::LoginRejected(INVALID_CREDENTIALS.to_string()))?;
    auth.login(session, user)?;
    println!("Signed in as {}", username);
    Ok(())
}

/// Handle the logout command
pub fn handle_logout(auth: &mut AuthContext) -> Result<(), CliError> {
    auth.logout()?;
    println!("Signed out");
    Ok(())
}

/// Handle the write command
pub async fn handle_write(content: String, client: &ApiClient, auth: &AuthContext) -> Result<(), CliError> {
    if content.trim().is_empty() {
        return Err(CliError::EmptyEntry);
    }
    let (user_id, client) = signed_in(client, auth)?;
    let reply = client.post_diary_entry(&user_id, &content, &current_timestamp()).await?;
    println!("{}: {}", ASSISTANT_LABEL, reply.response);
    Ok(())
}

/// Handle the history command
pub async fn handle_history(client: &ApiClient, auth: &AuthContext) -> Result<(), CliError> {
    let (user_id, client) = signed_in(client, auth)?;
    let messages = client.fetch_history(&user_id).await?;
    if messages.is_empty() {
        println!("No journal entries yet");
        return Ok(());
    }
    for message in messages {
        let (date, time) = format_entry_timestamp(message.timestamp.as_deref());
        let label = if message.is_user() { USER_LABEL } else { ASSISTANT_LABEL };
        println!("[{} {}] {}: {}", date, time, label, message.content);
    }
    Ok(())
}

/// Handle the preferences command
pub async fn handle_preferences(client: &ApiClient, auth: &AuthContext) -> Result<(), CliError> {
    let (user_id, client) = signed_in(client, auth)?;
    let preferences = client.fetch_preferences(&user_id).await?;
    println!("{}", serde_json::to_string_pretty(&preferences)?);
    Ok(())
}
