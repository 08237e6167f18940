use ratatui::widgets::{Paragraph, Tabs};
use ratatui::style::{Style, Modifier};
use ratatui::text::{Line, Span};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use crate::Config;
use crate::router::Route;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};
use crate::utils::format_key_binding_for_display;

/// Routes reachable from the nav bar, in display order
const NAV_ROUTES: [Route; 2] = [Route::Journal, Route::Preferences];

fn tab_index(route: Route) -> Option<usize> {
    NAV_ROUTES.iter().position(|r| *r == route)
}

/// Top bar for signed-in pages: a tab per protected page plus the
/// greeting and logout hint on the right.
pub fn render_nav_bar(f: &mut Frame, area: Rect, current: Route, display_name: Option<&str>, config: &Config) {
    let active_theme = config.get_active_theme();
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let muted = parse_color(&active_theme.muted_fg);

    let keys = [&config.key_bindings.journal, &config.key_bindings.preferences];
    let titles: Vec<Line> = NAV_ROUTES
        .iter()
        .zip(keys)
        .map(|(route, key)| {
            Line::from(vec![
                Span::raw(" "),
                Span::raw(route.title()),
                Span::styled(format!(" ({})", format_key_binding_for_display(key)), Style::default().fg(muted)),
                Span::raw(" "),
            ])
        })
        .collect();

    let greeting = match display_name {
        Some(name) => format!("Hi, {} • {}: Logout ", name, format_key_binding_for_display(&config.key_bindings.logout)),
        None => format!("{}: Logout ", format_key_binding_for_display(&config.key_bindings.logout)),
    };
    let greeting_width = (greeting.chars().count() as u16).min(area.width / 2);
    let [tabs_area, greeting_area] =
        Layout::horizontal([Constraint::Min(1), Constraint::Length(greeting_width)]).areas(area);

    let highlight_fg = get_contrast_text_color(highlight_bg);
    let mut tabs = Tabs::new(titles)
        .style(Style::default().fg(fg_color).bg(bg_color))
        .highlight_style(
            Style::default()
                .fg(highlight_fg)
                .bg(highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .divider("  ")
        .padding("", "");
    if let Some(index) = tab_index(current) {
        tabs = tabs.select(index);
    }
    f.render_widget(tabs, tabs_area);

    let paragraph = Paragraph::new(greeting)
        .style(Style::default().fg(muted).bg(bg_color))
        .alignment(Alignment::Right);
    f.render_widget(paragraph, greeting_area);
}
