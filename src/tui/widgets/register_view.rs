use ratatui::Frame;
use ratatui::layout::{Rect, Constraint, Layout};
use crate::Config;
use crate::tui::pages::register::{AccountField, RegisterPage, RegisterStep};
use crate::tui::widgets::form::{
    centered_column, render_form_message, render_heading, render_text_field, FormStyles, FORM_MAX_WIDTH,
};
use crate::tui::widgets::preferences_view::render_preferences_form;
use crate::utils::format_key_binding_for_display;

pub fn render_register_page(f: &mut Frame, area: Rect, page: &mut RegisterPage, config: &Config) {
    let styles = FormStyles::from_theme(&config.get_active_theme());
    match page.step {
        RegisterStep::BasicInfo => render_account_step(f, area, page, config, &styles),
        RegisterStep::Preferences => render_preferences_step(f, area, page, config, &styles),
    }
}

fn render_account_step(f: &mut Frame, area: Rect, page: &mut RegisterPage, config: &Config, styles: &FormStyles) {
    let column = centered_column(area, FORM_MAX_WIDTH);
    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend([Constraint::Length(3); 5]);
    constraints.push(Constraint::Min(1));
    let areas = Layout::vertical(constraints).split(column);

    render_heading(f, areas[0], "Create Account (step 1 of 2)", None, styles);

    let current = page.current_field;
    let mut cursor = None;
    for (idx, field) in AccountField::ALL.into_iter().enumerate() {
        let editor = page.editor_mut(field);
        let position = render_text_field(
            f,
            areas[idx + 1],
            field.label(),
            editor,
            field == current,
            field.is_secret(),
            styles,
        );
        cursor = cursor.or(position);
    }

    let hint = if page.pending {
        "Creating your account...".to_string()
    } else {
        format!(
            "Already registered? {}: Sign in",
            format_key_binding_for_display(&config.key_bindings.switch_auth_page)
        )
    };
    render_form_message(f, areas[6], page.error.as_deref(), &hint, styles);

    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}

fn render_preferences_step(
    f: &mut Frame,
    area: Rect,
    page: &mut RegisterPage,
    config: &Config,
    styles: &FormStyles,
) {
    let [heading_area, form_area, message_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(12),
        Constraint::Min(1),
    ])
    .areas(area);

    render_heading(
        f,
        heading_area,
        "Tell us about yourself (step 2 of 2)",
        Some("These help personalize your journal. You can change them later."),
        styles,
    );

    let cursor = render_preferences_form(f, form_area, &mut page.preferences, styles);

    let hint = if page.pending {
        "Saving your preferences...".to_string()
    } else {
        format!(
            "{}: Finish • {}: Skip for now",
            format_key_binding_for_display(&config.key_bindings.submit),
            format_key_binding_for_display(&config.key_bindings.skip_step)
        )
    };
    render_form_message(f, message_area, page.error.as_deref(), &hint, styles);

    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}
