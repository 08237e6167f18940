use ratatui::Frame;
use ratatui::widgets::{Block, Borders};
use ratatui::style::Style;
use ratatui::layout::Alignment;
use crate::router::Route;
use crate::tui::{App, Layout, Mode};
use crate::tui::pages::RegisterStep;
use crate::tui::widgets::{
    color::parse_color,
    help::render_help,
    journal_view::render_journal_page,
    login_view::render_login_page,
    nav_bar::render_nav_bar,
    preferences_view::render_preferences_page,
    register_view::render_register_page,
    status_bar::render_status_bar,
};
use crate::utils::format_key_binding_for_display as display;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("MoodScribe")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    if app.shows_nav() {
        render_nav_bar(f, layout.nav_area, app.route(), app.auth.display_name(), &app.config);
    }

    match app.route() {
        Route::Login => render_login_page(f, layout.main_area, &mut app.login, &app.config),
        Route::Register => render_register_page(f, layout.main_area, &mut app.register, &app.config),
        Route::Journal => render_journal_page(f, layout.main_area, &mut app.journal, &app.config),
        Route::Preferences => render_preferences_page(f, layout.main_area, &mut app.preferences, &app.config),
    }

    if app.mode == Mode::Help {
        render_help(f, f.area(), &app.config);
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_deref(), &key_hints, &app.config);
}

pub fn get_key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    if app.mode == Mode::Help {
        return vec![format!("Esc or {}: Exit help", display(&keys.help))];
    }

    let mut hints = match app.route() {
        Route::Login => vec![
            "Tab: Next field".to_string(),
            format!("{}: Sign in", display(&keys.submit)),
            format!("{}: Create account", display(&keys.switch_auth_page)),
        ],
        Route::Register => match app.register.step {
            RegisterStep::BasicInfo => vec![
                "Tab: Next field".to_string(),
                format!("{}: Continue", display(&keys.submit)),
                format!("{}: Sign in instead", display(&keys.switch_auth_page)),
            ],
            RegisterStep::Preferences => vec![
                "Tab: Next field".to_string(),
                format!("{}: Finish", display(&keys.submit)),
                format!("{}: Skip", display(&keys.skip_step)),
            ],
        },
        Route::Journal => vec![
            format!("{}: Send", display(&keys.submit)),
            format!("{}/{}: Scroll", display(&keys.scroll_up), display(&keys.scroll_down)),
            format!("{}: Copy reply", display(&keys.copy_reply)),
            format!("{}: Preferences", display(&keys.preferences)),
            format!("{}: Logout", display(&keys.logout)),
        ],
        Route::Preferences => vec![
            "Tab: Next field".to_string(),
            format!("{}: Save", display(&keys.submit)),
            format!("{}: Journal", display(&keys.journal)),
            format!("{}: Logout", display(&keys.logout)),
        ],
    };

    hints.push(format!("{}: Help", display(&keys.help)));
    hints.push(format!("{}: Quit", display(&keys.quit)));
    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::session::SessionStore;
    use crate::Config;

    fn signed_out_app() -> App {
        let store = SessionStore::open_in_memory().unwrap();
        let auth = AuthContext::restore(store).unwrap();
        App::new(Config::default(), auth, Route::Login)
    }

    #[test]
    fn login_hints_offer_account_creation() {
        let app = signed_out_app();
        let hints = get_key_hints(&app);
        assert!(hints.iter().any(|h| h.ends_with("Create account")));
        assert!(hints.last().is_some_and(|h| h.ends_with("Quit")));
    }

    #[test]
    fn help_mode_only_offers_exit() {
        let mut app = signed_out_app();
        app.enter_help_mode();
        assert_eq!(get_key_hints(&app).len(), 1);
    }
}
