use ratatui::Frame;
use ratatui::layout::{Rect, Constraint, Layout};
use crate::Config;
use crate::tui::pages::login::{LoginField, LoginPage};
use crate::tui::widgets::form::{
    centered_column, render_form_message, render_heading, render_text_field, FormStyles, FORM_MAX_WIDTH,
};
use crate::utils::format_key_binding_for_display;

pub fn render_login_page(f: &mut Frame, area: Rect, page: &mut LoginPage, config: &Config) {
    let styles = FormStyles::from_theme(&config.get_active_theme());
    let column = centered_column(area, FORM_MAX_WIDTH);

    let [heading_area, username_area, password_area, message_area, hint_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(2),
        Constraint::Min(0),
    ])
    .areas(column);

    render_heading(f, heading_area, "Welcome to MoodScribe", Some("Sign in to continue your journal"), &styles);

    let username_cursor = render_text_field(
        f,
        username_area,
        "Username",
        &mut page.username,
        page.current_field == LoginField::Username,
        false,
        &styles,
    );
    let password_cursor = render_text_field(
        f,
        password_area,
        "Password",
        &mut page.password,
        page.current_field == LoginField::Password,
        true,
        &styles,
    );

    let status = if page.pending { "Signing in..." } else { "Enter on the last field signs in" };
    render_form_message(f, message_area, page.error.as_deref(), status, &styles);

    let hint = format!(
        "No account yet? {}: Create one",
        format_key_binding_for_display(&config.key_bindings.switch_auth_page)
    );
    render_form_message(f, hint_area, None, &hint, &styles);

    if let Some(position) = username_cursor.or(password_cursor) {
        f.set_cursor_position(position);
    }
}
