use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use crate::api::ApiClient;
use crate::config::KeyBindings;
use crate::router::Route;
use crate::tui::App;
use crate::tui::app::Mode;
use crate::tui::dispatch::Dispatcher;
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::pages::preferences::PreferenceField;
use crate::tui::pages::{PreferencesForm, RegisterStep};
use crate::utils::{has_primary_modifier, parse_key_binding, ParsedKeyBinding};

/// Lines moved per scroll key press in the conversation view
const SCROLL_STEP: usize = 5;

/// Guard that ensures terminal state is restored even on panic
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore terminal state on normal exit; drop becomes a no-op afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Ignore errors in drop - we're already in a cleanup path
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Key bindings parsed once per key event
struct Bindings {
    quit: ParsedKeyBinding,
    help: ParsedKeyBinding,
    submit: ParsedKeyBinding,
    logout: ParsedKeyBinding,
    journal: ParsedKeyBinding,
    preferences: ParsedKeyBinding,
    switch_auth_page: ParsedKeyBinding,
    skip_step: ParsedKeyBinding,
    paste: ParsedKeyBinding,
    copy_reply: ParsedKeyBinding,
    scroll_up: ParsedKeyBinding,
    scroll_down: ParsedKeyBinding,
}

impl Bindings {
    fn parse(kb: &KeyBindings) -> Result<Self, TuiError> {
        fn parse(binding: &str) -> Result<ParsedKeyBinding, TuiError> {
            parse_key_binding(binding).map_err(TuiError::KeyBindingError)
        }
        Ok(Self {
            quit: parse(&kb.quit)?,
            help: parse(&kb.help)?,
            submit: parse(&kb.submit)?,
            logout: parse(&kb.logout)?,
            journal: parse(&kb.journal)?,
            preferences: parse(&kb.preferences)?,
            switch_auth_page: parse(&kb.switch_auth_page)?,
            skip_step: parse(&kb.skip_step)?,
            paste: parse(&kb.paste)?,
            copy_reply: parse(&kb.copy_reply)?,
            scroll_up: parse(&kb.scroll_up)?,
            scroll_down: parse(&kb.scroll_down)?,
        })
    }
}

pub fn run_event_loop(mut app: App, client: ApiClient, mut dispatcher: Dispatcher) -> Result<(), TuiError> {
    // Check terminal size before entering alternate screen so the error is
    // readable in the normal terminal
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        // Apply finished requests, then start the ones pages asked for
        while let Some(api_event) = dispatcher.try_recv() {
            app.handle_api_event(api_event);
        }
        for command in app.take_commands() {
            dispatcher.dispatch(client.with_token(app.auth.token()), command);
        }

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect, app.shows_nav());
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only process Press events to avoid duplicate processing on Windows
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;

    Ok(())
}

/// Returns `Ok(true)` when the user asked to quit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let bindings = Bindings::parse(&app.config.key_bindings)?;

    if matches_key_event(key_event, &bindings.quit) {
        return Ok(true);
    }

    if app.mode == Mode::Help {
        if key_event.code == KeyCode::Esc || matches_key_event(key_event, &bindings.help) {
            app.exit_help_mode();
        }
        return Ok(false);
    }

    if matches_key_event(key_event, &bindings.help) {
        app.enter_help_mode();
        return Ok(false);
    }

    if matches_key_event(key_event, &bindings.submit) {
        app.submit();
        return Ok(false);
    }

    if app.auth.is_authenticated() {
        if matches_key_event(key_event, &bindings.journal) {
            app.navigate(Route::Journal);
            return Ok(false);
        }
        if matches_key_event(key_event, &bindings.preferences) {
            app.navigate(Route::Preferences);
            return Ok(false);
        }
        if matches_key_event(key_event, &bindings.logout) {
            app.logout();
            return Ok(false);
        }
    }

    if matches_key_event(key_event, &bindings.switch_auth_page) {
        match app.route() {
            Route::Login => app.navigate(Route::Register),
            Route::Register if app.register.step == RegisterStep::BasicInfo => app.navigate(Route::Login),
            _ => {}
        }
        return Ok(false);
    }

    if matches_key_event(key_event, &bindings.skip_step) {
        app.skip_registration_step();
        return Ok(false);
    }

    if matches_key_event(key_event, &bindings.paste) {
        paste_from_clipboard(app);
        return Ok(false);
    }

    if app.route() == Route::Journal {
        if matches_key_event(key_event, &bindings.copy_reply) {
            copy_latest_reply(app);
            return Ok(false);
        }
        if matches_key_event(key_event, &bindings.scroll_up) {
            app.journal.scroll_up(SCROLL_STEP);
            return Ok(false);
        }
        if matches_key_event(key_event, &bindings.scroll_down) {
            app.journal.scroll_down(SCROLL_STEP);
            return Ok(false);
        }
        handle_composer_key(app, key_event);
        return Ok(false);
    }

    handle_form_key(app, key_event);
    Ok(false)
}

/// Multi-line composer: Enter inserts a newline, submit has its own binding
fn handle_composer_key(app: &mut App, key_event: KeyEvent) {
    if has_primary_modifier(key_event.modifiers) {
        return;
    }
    let Some(editor) = app.active_editor_mut() else {
        return;
    };
    match key_event.code {
        KeyCode::Char(ch) => editor.insert_char(ch),
        KeyCode::Enter => editor.insert_newline(),
        KeyCode::Backspace => editor.delete_char(),
        KeyCode::Delete => editor.delete_forward(),
        KeyCode::Left => editor.move_cursor_left(),
        KeyCode::Right => editor.move_cursor_right(),
        KeyCode::Up => editor.move_cursor_up(),
        KeyCode::Down => editor.move_cursor_down(),
        KeyCode::Home => editor.move_cursor_home(),
        KeyCode::End => editor.move_cursor_end(),
        KeyCode::Tab => editor.insert_str("    "),
        _ => {}
    }
}

/// Single-line form fields: Tab/arrows move between fields, Enter advances
/// and submits from the last field
fn handle_form_key(app: &mut App, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Tab | KeyCode::Down => {
            app.next_field();
            return;
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.previous_field();
            return;
        }
        KeyCode::Enter => {
            if app.is_last_field() {
                app.submit();
            } else {
                app.next_field();
            }
            return;
        }
        _ => {}
    }

    if let Some(form) = active_form(app) {
        if form.current_field == PreferenceField::ActivityLevel {
            match key_event.code {
                KeyCode::Left => form.previous_activity_level(),
                KeyCode::Right | KeyCode::Char(' ') => form.next_activity_level(),
                _ => {}
            }
            return;
        }
    }

    if has_primary_modifier(key_event.modifiers) {
        return;
    }
    let Some(editor) = app.active_editor_mut() else {
        return;
    };
    match key_event.code {
        KeyCode::Char(ch) => editor.insert_char(ch),
        KeyCode::Backspace => editor.delete_char(),
        KeyCode::Delete => editor.delete_forward(),
        KeyCode::Left => editor.move_cursor_left(),
        KeyCode::Right => editor.move_cursor_right(),
        KeyCode::Home => editor.move_cursor_home(),
        KeyCode::End => editor.move_cursor_end(),
        _ => {}
    }
}

/// Preferences form currently on screen, if any
fn active_form(app: &mut App) -> Option<&mut PreferencesForm> {
    match app.route() {
        Route::Preferences if !app.preferences.loading => Some(&mut app.preferences.form),
        Route::Register if app.register.step == RegisterStep::Preferences => Some(&mut app.register.preferences),
        _ => None,
    }
}

fn paste_from_clipboard(app: &mut App) {
    let text = match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
        Ok(text) => text,
        Err(e) => {
            app.set_status_message(format!("Failed to paste from clipboard: {}", e));
            return;
        }
    };
    match app.active_editor_mut() {
        Some(editor) => editor.insert_str(&text),
        None => app.set_status_message("Nothing to paste into"),
    }
}

fn copy_latest_reply(app: &mut App) {
    let Some(reply) = app.journal.latest_reply().map(str::to_string) else {
        app.set_status_message("No reply to copy yet");
        return;
    };
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(reply)) {
        Ok(()) => app.set_status_message("Copied reply to clipboard"),
        Err(e) => app.set_status_message(format!("Failed to copy to clipboard: {}", e)),
    }
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    // Primary modifier is Ctrl on Windows/Linux, Option/Alt on macOS
    let has_primary_mod = has_primary_modifier(key_event.modifiers);
    if binding.requires_ctrl != has_primary_mod {
        return false;
    }
    binding.key_code == key_event.code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::models::Session;
    use crate::session::SessionStore;
    use crate::Config;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn app(signed_in: bool, route: Route) -> App {
        let mut store = SessionStore::open_in_memory().unwrap();
        if signed_in {
            store
                .save(&Session {
                    token: "jwt".to_string(),
                    user_id: "u1".to_string(),
                })
                .unwrap();
        }
        App::new(Config::default(), AuthContext::restore(store).unwrap(), route)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            handle_key_event(app, key(KeyCode::Char(ch))).unwrap();
        }
    }

    #[test]
    fn quit_binding_exits() {
        let mut app = app(false, Route::Login);
        assert!(handle_key_event(&mut app, ctrl('q')).unwrap());
        assert!(!handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
    }

    #[test]
    fn enter_on_last_login_field_submits() {
        let mut app = app(false, Route::Login);
        type_text(&mut app, "alice");
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        type_text(&mut app, "pw");
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        let commands = app.take_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].name(), "login");
    }

    #[test]
    fn switch_binding_toggles_auth_pages() {
        let mut app = app(false, Route::Login);
        handle_key_event(&mut app, ctrl('r')).unwrap();
        assert_eq!(app.route(), Route::Register);
        handle_key_event(&mut app, ctrl('r')).unwrap();
        assert_eq!(app.route(), Route::Login);
    }

    #[test]
    fn navigation_keys_require_session() {
        let mut anonymous = app(false, Route::Login);
        handle_key_event(&mut anonymous, key(KeyCode::F(3))).unwrap();
        assert_eq!(anonymous.route(), Route::Login);

        let mut signed_in = app(true, Route::Journal);
        handle_key_event(&mut signed_in, key(KeyCode::F(3))).unwrap();
        assert_eq!(signed_in.route(), Route::Preferences);
        handle_key_event(&mut signed_in, ctrl('l')).unwrap();
        assert_eq!(signed_in.route(), Route::Login);
    }

    #[test]
    fn composer_accepts_newlines_and_submits_with_binding() {
        let mut app = app(true, Route::Journal);
        app.take_commands();
        type_text(&mut app, "line one");
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        type_text(&mut app, "line two");
        assert_eq!(app.journal.composer.text(), "line one\nline two");
        assert!(app.take_commands().is_empty());

        handle_key_event(&mut app, ctrl('s')).unwrap();
        assert_eq!(app.take_commands()[0].name(), "post_entry");
        // Locked while the reply is outstanding
        type_text(&mut app, "more");
        assert!(app.journal.composer.is_blank());
    }

    #[test]
    fn activity_level_cycles_with_arrows() {
        let mut app = app(true, Route::Preferences);
        app.preferences.loading = false;
        for _ in 0..5 {
            handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        }
        assert_eq!(app.preferences.form.current_field, PreferenceField::ActivityLevel);
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        assert_eq!(app.preferences.form.activity_level, crate::models::ActivityLevel::High);
    }

    #[test]
    fn help_mode_swallows_keys() {
        let mut app = app(false, Route::Login);
        handle_key_event(&mut app, key(KeyCode::F(1))).unwrap();
        assert_eq!(app.mode, Mode::Help);
        type_text(&mut app, "abc");
        assert!(app.login.username.is_blank());
        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.mode, Mode::Normal);
    }
}
