use crate::api::ApiError;
use crate::models::{ActivityLevel, Preferences};
use crate::tui::dispatch::{ApiCommand, SaveOrigin};
use crate::tui::widgets::editor::Editor;
use crate::utils::{join_list, parse_notification_time, split_list};

pub const SAVE_SUCCEEDED: &str = "Preferences updated successfully!";
pub const SAVE_FAILED: &str = "Error updating preferences";
pub const LOAD_FAILED: &str = "Error loading preferences";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceField {
    Location,
    Hobbies,
    Likes,
    Dislikes,
    FavoriteGenres,
    ActivityLevel,
    MeditationTime,
    NotificationTime,
}

impl PreferenceField {
    pub const ALL: [PreferenceField; 8] = [
        PreferenceField::Location,
        PreferenceField::Hobbies,
        PreferenceField::Likes,
        PreferenceField::Dislikes,
        PreferenceField::FavoriteGenres,
        PreferenceField::ActivityLevel,
        PreferenceField::MeditationTime,
        PreferenceField::NotificationTime,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PreferenceField::Location => "Location",
            PreferenceField::Hobbies => "Hobbies (comma separated)",
            PreferenceField::Likes => "Likes (comma separated)",
            PreferenceField::Dislikes => "Dislikes (comma separated)",
            PreferenceField::FavoriteGenres => "Favorite Genres (comma separated)",
            PreferenceField::ActivityLevel => "Activity Level (←/→)",
            PreferenceField::MeditationTime => "Preferred Meditation Time (minutes)",
            PreferenceField::NotificationTime => "Preferred Notification Time (HH:MM)",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Editable form over a `Preferences` value. List fields are edited as
/// comma-separated text and parsed on submit.
#[derive(Debug, Clone)]
pub struct PreferencesForm {
    pub location: Editor,
    pub hobbies: Editor,
    pub likes: Editor,
    pub dislikes: Editor,
    pub favorite_genres: Editor,
    pub activity_level: ActivityLevel,
    pub meditation_time: Editor,
    pub notification_time: Editor,
    pub current_field: PreferenceField,
}

impl Default for PreferencesForm {
    fn default() -> Self {
        Self::from_preferences(&Preferences::default())
    }
}

impl PreferencesForm {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            location: Editor::from_string(&prefs.location),
            hobbies: Editor::from_string(&join_list(&prefs.hobbies)),
            likes: Editor::from_string(&join_list(&prefs.likes)),
            dislikes: Editor::from_string(&join_list(&prefs.dislikes)),
            favorite_genres: Editor::from_string(&join_list(&prefs.favorite_genres)),
            activity_level: prefs.activity_level,
            meditation_time: Editor::from_string(
                &prefs.preferred_meditation_time.map(|m| m.to_string()).unwrap_or_default(),
            ),
            notification_time: Editor::from_string(prefs.preferred_notification_time.as_deref().unwrap_or("")),
            current_field: PreferenceField::Location,
        }
    }

    /// Parse the form back into a full preference set
    pub fn to_preferences(&self) -> Result<Preferences, String> {
        let meditation = self.meditation_time.text();
        let preferred_meditation_time = match meditation.trim() {
            "" => None,
            value => Some(
                value
                    .parse::<u32>()
                    .map_err(|_| "Meditation time must be a whole number of minutes".to_string())?,
            ),
        };

        let notification = self.notification_time.text();
        let preferred_notification_time = match notification.trim() {
            "" => None,
            value => Some(parse_notification_time(value)?),
        };

        Ok(Preferences {
            location: self.location.text().trim().to_string(),
            hobbies: split_list(&self.hobbies.text()),
            likes: split_list(&self.likes.text()),
            dislikes: split_list(&self.dislikes.text()),
            favorite_genres: split_list(&self.favorite_genres.text().to_lowercase()),
            activity_level: self.activity_level,
            preferred_meditation_time,
            preferred_notification_time,
        })
    }

    pub fn next_field(&mut self) {
        let idx = (self.current_field.index() + 1) % PreferenceField::ALL.len();
        self.current_field = PreferenceField::ALL[idx];
    }

    pub fn previous_field(&mut self) {
        let len = PreferenceField::ALL.len();
        let idx = (self.current_field.index() + len - 1) % len;
        self.current_field = PreferenceField::ALL[idx];
    }

    pub fn is_last_field(&self) -> bool {
        self.current_field == PreferenceField::NotificationTime
    }

    /// Editor behind `field`; `None` for the activity selector
    pub fn editor_mut(&mut self, field: PreferenceField) -> Option<&mut Editor> {
        match field {
            PreferenceField::Location => Some(&mut self.location),
            PreferenceField::Hobbies => Some(&mut self.hobbies),
            PreferenceField::Likes => Some(&mut self.likes),
            PreferenceField::Dislikes => Some(&mut self.dislikes),
            PreferenceField::FavoriteGenres => Some(&mut self.favorite_genres),
            PreferenceField::ActivityLevel => None,
            PreferenceField::MeditationTime => Some(&mut self.meditation_time),
            PreferenceField::NotificationTime => Some(&mut self.notification_time),
        }
    }

    pub fn active_editor_mut(&mut self) -> Option<&mut Editor> {
        self.editor_mut(self.current_field)
    }

    pub fn next_activity_level(&mut self) {
        self.activity_level = self.activity_level.next();
    }

    pub fn previous_activity_level(&mut self) {
        self.activity_level = self.activity_level.previous();
    }
}

/// The standalone preferences screen: load on mount, save on submit
#[derive(Debug, Clone, Default)]
pub struct PreferencesPage {
    pub form: PreferencesForm,
    pub loading: bool,
    pub saving: bool,
}

impl PreferencesPage {
    /// Reset the page and request the stored preferences
    pub fn on_mount(&mut self, user_id: Option<&str>) -> Option<ApiCommand> {
        *self = Self::default();
        let user_id = user_id?;
        self.loading = true;
        Some(ApiCommand::FetchPreferences {
            user_id: user_id.to_string(),
        })
    }

    /// Returns a status message when loading failed
    pub fn on_loaded(&mut self, result: Result<Preferences, ApiError>) -> Option<String> {
        if !self.loading {
            tracing::debug!("dropping preferences load with no request in flight");
            return None;
        }
        self.loading = false;
        match result {
            Ok(prefs) => {
                self.form = PreferencesForm::from_preferences(&prefs);
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load preferences");
                Some(LOAD_FAILED.to_string())
            }
        }
    }

    /// `Ok(None)` while busy or signed out; `Err` carries a validation message
    pub fn submit(&mut self, user_id: Option<&str>) -> Result<Option<ApiCommand>, String> {
        if self.loading || self.saving {
            return Ok(None);
        }
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        let preferences = self.form.to_preferences()?;
        self.saving = true;
        Ok(Some(ApiCommand::SavePreferences {
            user_id: user_id.to_string(),
            preferences,
            origin: SaveOrigin::PreferencesPage,
        }))
    }

    /// Returns the status message describing the save outcome
    pub fn on_saved(&mut self, result: Result<Preferences, ApiError>) -> Option<String> {
        if !self.saving {
            tracing::debug!("dropping preferences save with no request in flight");
            return None;
        }
        self.saving = false;
        match result {
            Ok(saved) => {
                let current_field = self.form.current_field;
                self.form = PreferencesForm::from_preferences(&saved);
                self.form.current_field = current_field;
                Some(SAVE_SUCCEEDED.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save preferences");
                Some(SAVE_FAILED.to_string())
            }
        }
    }
}
