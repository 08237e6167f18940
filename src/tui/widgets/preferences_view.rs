use ratatui::Frame;
use ratatui::layout::{Rect, Constraint, Layout};
use crate::Config;
use crate::models::KNOWN_GENRES;
use crate::tui::pages::preferences::{PreferenceField, PreferencesForm, PreferencesPage};
use crate::tui::widgets::form::{
    render_choice_field, render_form_message, render_heading, render_text_field, FormStyles,
};

/// Both preference columns, four fields each. Returns the cursor position
/// of the focused text field.
pub fn render_preferences_form(
    f: &mut Frame,
    area: Rect,
    form: &mut PreferencesForm,
    styles: &FormStyles,
) -> Option<(u16, u16)> {
    let [left, right] = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
    let rows = |column: Rect| -> [Rect; 4] { Layout::vertical([Constraint::Length(3); 4]).areas(column) };

    let mut field_areas = Vec::with_capacity(PreferenceField::ALL.len());
    field_areas.extend(rows(left));
    field_areas.extend(rows(right));

    let current = form.current_field;
    let mut cursor = None;
    for (field, field_area) in PreferenceField::ALL.into_iter().zip(field_areas) {
        let is_active = field == current;
        if field == PreferenceField::ActivityLevel {
            let level = form.activity_level.to_string();
            render_choice_field(f, field_area, field.label(), &level, is_active, styles);
        } else if let Some(editor) = form.editor_mut(field) {
            if let Some(position) = render_text_field(f, field_area, field.label(), editor, is_active, false, styles) {
                cursor = Some(position);
            }
        }
    }
    cursor
}

pub fn render_preferences_page(f: &mut Frame, area: Rect, page: &mut PreferencesPage, config: &Config) {
    let styles = FormStyles::from_theme(&config.get_active_theme());

    let [heading_area, form_area, message_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(12),
        Constraint::Length(2),
    ])
    .areas(area);

    render_heading(
        f,
        heading_area,
        "Your Preferences",
        Some("Help MoodScribe tailor its suggestions to you"),
        &styles,
    );

    if page.loading {
        render_form_message(f, form_area, None, "Loading...", &styles);
        return;
    }

    let cursor = render_preferences_form(f, form_area, &mut page.form, &styles);

    let hint = if page.saving {
        "Saving...".to_string()
    } else {
        format!("Known genres: {}", KNOWN_GENRES.join(", "))
    };
    render_form_message(f, message_area, None, &hint, &styles);

    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}
