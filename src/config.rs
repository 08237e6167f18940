use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Environment variable that overrides `api_base_url`
pub const API_URL_ENV: &str = "MOODSCRIBE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_session_path")]
    pub session_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_submit")]
    pub submit: String,
    #[serde(default = "default_logout")]
    pub logout: String,
    #[serde(default = "default_journal")]
    pub journal: String,
    #[serde(default = "default_preferences")]
    pub preferences: String,
    #[serde(default = "default_switch_auth_page")]
    pub switch_auth_page: String,
    #[serde(default = "default_skip_step")]
    pub skip_step: String,
    #[serde(default = "default_paste")]
    pub paste: String,
    #[serde(default = "default_copy_reply")]
    pub copy_reply: String,
    #[serde(default = "default_scroll_up")]
    pub scroll_up: String,
    #[serde(default = "default_scroll_down")]
    pub scroll_down: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_accent")]
    pub accent: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_error_fg")]
    pub error_fg: String,
    #[serde(default = "default_muted_fg")]
    pub muted_fg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            session_path: default_session_path(),
            log_level: default_log_level(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes: HashMap::new(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            help: default_help(),
            submit: default_submit(),
            logout: default_logout(),
            journal: default_journal(),
            preferences: default_preferences(),
            switch_auth_page: default_switch_auth_page(),
            skip_step: default_skip_step(),
            paste: default_paste(),
            copy_reply: default_copy_reply(),
            scroll_up: default_scroll_up(),
            scroll_down: default_scroll_down(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            accent: default_accent(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            error_fg: default_error_fg(),
            muted_fg: default_muted_fg(),
        }
    }
}

impl Theme {
    /// Preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            accent: "#7C3AED".to_string(),
            highlight_bg: "#7C3AED".to_string(),
            highlight_fg: "white".to_string(),
            error_fg: "red".to_string(),
            muted_fg: "darkgray".to_string(),
        });

        themes.insert("monochrome".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            accent: "white".to_string(),
            highlight_bg: "white".to_string(),
            highlight_fg: "black".to_string(),
            error_fg: "white".to_string(),
            muted_fg: "gray".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_api_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_session_path() -> String {
    // Fallback only; the profile's data dir is applied at load time
    Config::default_session_path_for_profile(utils::Profile::Prod)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_quit() -> String {
    "Ctrl+q".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_submit() -> String {
    "Ctrl+s".to_string()
}

fn default_logout() -> String {
    "Ctrl+l".to_string()
}

fn default_journal() -> String {
    "F2".to_string()
}

fn default_preferences() -> String {
    "F3".to_string()
}

fn default_switch_auth_page() -> String {
    "Ctrl+r".to_string()
}

fn default_skip_step() -> String {
    "Ctrl+k".to_string()
}

fn default_paste() -> String {
    "Ctrl+v".to_string()
}

fn default_copy_reply() -> String {
    "Ctrl+y".to_string()
}

fn default_scroll_up() -> String {
    "PageUp".to_string()
}

fn default_scroll_down() -> String {
    "PageDown".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_accent() -> String {
    "lightmagenta".to_string()
}

fn default_highlight_bg() -> String {
    "magenta".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_error_fg() -> String {
    "lightred".to_string()
}

fn default_muted_fg() -> String {
    "gray".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid key binding for '{field}': {reason}")]
    KeyBindingError { field: String, reason: String },
}

impl Config {
    /// Load configuration from the profile's config file, or create it with
    /// defaults if missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path, profile)
    }

    /// Load configuration from an explicit path, creating it if missing
    pub fn load_from_path(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        let config = if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;
            if config.config_version != Some(CURRENT_CONFIG_VERSION) {
                tracing::warn!(found = ?config.config_version, "config version differs, using defaults for new fields");
                config.config_version = Some(CURRENT_CONFIG_VERSION);
            }
            config
        } else {
            let mut config = Config::default();
            config.session_path = Self::default_session_path_for_profile(profile);
            config.save_to_path(config_path)?;
            config
        };
        config.validate_key_bindings()?;
        Ok(config)
    }

    /// Save configuration to an explicit path
    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Default session store path for a specific profile
    fn default_session_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("session.db").to_string_lossy().to_string()
        } else {
            format!("~/.local/share/{}/session.db", profile.app_name())
        }
    }

    /// Apply the `--api-url` flag, then the environment, over the file value.
    /// The flag wins over the environment.
    pub fn apply_api_url_override(&mut self, flag: Option<String>) {
        let env = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        if let Some(url) = flag.or(env) {
            self.api_base_url = url;
        }
    }

    /// Get the expanded session store path (with ~ expansion)
    pub fn get_session_path(&self) -> PathBuf {
        utils::expand_path(&self.session_path)
    }

    /// Log file lives next to the session store
    pub fn get_log_path(&self) -> PathBuf {
        let session_path = self.get_session_path();
        session_path
            .parent()
            .map(|dir| dir.join("moodscribe.log"))
            .unwrap_or_else(|| PathBuf::from("moodscribe.log"))
    }

    /// Get the currently active theme. User themes shadow presets; unknown
    /// names fall back to the default preset.
    pub fn get_active_theme(&self) -> Theme {
        self.themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().remove(&self.current_theme))
            .unwrap_or_default()
    }

    /// Every binding must parse, so a typo is reported at startup instead of
    /// silently disabling a key
    fn validate_key_bindings(&self) -> Result<(), ConfigError> {
        let kb = &self.key_bindings;
        let bindings = [
            ("quit", &kb.quit),
            ("help", &kb.help),
            ("submit", &kb.submit),
            ("logout", &kb.logout),
            ("journal", &kb.journal),
            ("preferences", &kb.preferences),
            ("switch_auth_page", &kb.switch_auth_page),
            ("skip_step", &kb.skip_step),
            ("paste", &kb.paste),
            ("copy_reply", &kb.copy_reply),
            ("scroll_up", &kb.scroll_up),
            ("scroll_down", &kb.scroll_down),
        ];
        for (field, binding) in bindings {
            utils::parse_key_binding(binding).map_err(|reason| ConfigError::KeyBindingError {
                field: field.to_string(),
                reason,
            })?;
        }
        Ok(())
    }
}
