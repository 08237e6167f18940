pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod router;
pub mod session;
pub mod tui;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::AuthContext;
pub use config::Config;
pub use router::Route;
pub use utils::Profile;
