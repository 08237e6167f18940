//! Path-based routing with an authentication guard.
//!
//! The guard is the only place protected pages are gated: pages never check
//! the session themselves.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Journal,
    Preferences,
}

impl Route {
    pub const ALL: [Route; 4] = [Route::Login, Route::Register, Route::Journal, Route::Preferences];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Register => "/register",
            Route::Journal => "/journal",
            Route::Preferences => "/preferences",
        }
    }

    /// Map a path to a route. Trailing slashes are ignored; unknown paths
    /// fall back to the login route.
    pub fn from_path(path: &str) -> Route {
        let trimmed = path.trim().trim_end_matches('/');
        Route::ALL
            .into_iter()
            .find(|route| route.path().trim_end_matches('/') == trimmed)
            .unwrap_or(Route::Login)
    }

    /// Reachable only with a session
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Journal | Route::Preferences)
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Sign In",
            Route::Register => "Create Account",
            Route::Journal => "Journal",
            Route::Preferences => "Preferences",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Where a request for `requested` actually lands.
///
/// Protected routes redirect anonymous users to the login route, and the
/// login route redirects signed-in users to the journal. The original
/// destination is not remembered.
pub fn resolve(requested: Route, authenticated: bool) -> Route {
    match (requested, authenticated) {
        (route, false) if route.is_protected() => Route::Login,
        (Route::Login, true) => Route::Journal,
        (route, _) => route,
    }
}

/// Result of a navigation, used by the app to run page mount hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Route,
    pub to: Route,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    current: Route,
}

impl Router {
    pub fn new(initial: Route, authenticated: bool) -> Self {
        Self {
            current: resolve(initial, authenticated),
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Navigate to `requested`, applying the guard
    pub fn navigate(&mut self, requested: Route, authenticated: bool) -> Transition {
        let from = self.current;
        let to = resolve(requested, authenticated);
        if to != requested {
            tracing::debug!(%requested, %to, "route redirected");
        }
        self.current = to;
        Transition { from, to }
    }

    /// Re-apply the guard to the current route after the auth state changed
    pub fn refresh(&mut self, authenticated: bool) -> Transition {
        self.navigate(self.current, authenticated)
    }
}
