//! Session-lifetime authentication state.
//!
//! `AuthContext` is the single owner of the login/logout side effects: it
//! writes the durable session store and the in-memory user together, so the
//! router and nav bar only ever read `is_authenticated()`.

use crate::models::{Session, User};
use crate::session::{SessionError, SessionStore};

pub struct AuthContext {
    store: SessionStore,
    user: Option<User>,
    token: Option<String>,
}

impl AuthContext {
    /// Build the context from durable storage.
    ///
    /// A stored token + user id pair restores the signed-in user (id only).
    /// A half-written session is cleared so the client starts anonymous.
    pub fn restore(store: SessionStore) -> Result<Self, SessionError> {
        let mut auth = Self {
            store,
            user: None,
            token: None,
        };
        match auth.store.load()? {
            Some(session) => {
                tracing::info!(user_id = %session.user_id, "restored stored session");
                auth.user = Some(User::with_id(session.user_id));
                auth.token = Some(session.token);
            }
            None => {
                if auth.store.token()?.is_some() {
                    tracing::warn!("stored token has no user id, discarding it");
                    auth.store.clear()?;
                }
            }
        }
        Ok(auth)
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// True iff a user is present
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Persist the session, then make `user` current
    pub fn login(&mut self, session: Session, user: User) -> Result<(), SessionError> {
        self.store.save(&session)?;
        tracing::info!(user_id = %session.user_id, "signed in");
        self.token = Some(session.token);
        self.user = Some(user);
        Ok(())
    }

    /// Forget the user in memory and in storage.
    ///
    /// The in-memory state is always cleared, even when the store fails.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = %user.id, "signed out");
        }
        self.token = None;
        self.store.clear().inspect_err(|e| {
            tracing::error!(error = %e, "failed to clear stored session");
        })
    }

    /// Merge the `/auth/me` profile into the current user
    pub fn set_profile(&mut self, profile: User) {
        if let Some(current) = self.user.as_mut() {
            if profile.id.is_empty() || profile.id == current.id {
                let id = std::mem::take(&mut current.id);
                *current = User { id, ..profile };
            } else {
                tracing::warn!(current = %current.id, profile = %profile.id, "ignoring profile for another user");
            }
        }
    }

    /// Display name for greetings, if the profile has been loaded
    pub fn display_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
