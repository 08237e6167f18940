//! Per-route page state. Pages never talk to the network: submits return
//! the `ApiCommand` to run and `on_*` methods settle the outcome.

pub mod journal;
pub mod login;
pub mod preferences;
pub mod register;

pub use journal::JournalPage;
pub use login::LoginPage;
pub use preferences::{PreferencesForm, PreferencesPage};
pub use register::{RegisterPage, RegisterStep, WizardOutcome};
