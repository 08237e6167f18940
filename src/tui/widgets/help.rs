use ratatui::widgets::{Block, Borders, Paragraph, Clear, Wrap};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment, Constraint, Layout, Flex};
use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::utils::format_key_binding_for_display as display;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(fg_color).bg(bg_color)))
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

/// Centered rect taking the given percentages of `area`
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}

pub fn build_help_text(config: &Config) -> String {
    let keys = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Forms:\n");
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  Enter: Next field, submits on the last one\n");
    text.push_str("  ← / →: Change activity level\n");
    text.push_str(&format!("  {}: Submit\n", display(&keys.submit)));
    text.push_str(&format!("  {}: Switch between sign in and create account\n", display(&keys.switch_auth_page)));
    text.push_str(&format!("  {}: Skip the preferences step when registering\n", display(&keys.skip_step)));
    text.push_str(&format!("  {}: Paste\n", display(&keys.paste)));
    text.push('\n');

    text.push_str("Journal:\n");
    text.push_str(&format!("  {}: Send entry\n", display(&keys.submit)));
    text.push_str("  Enter: New line\n");
    text.push_str(&format!("  {} / {}: Scroll conversation\n", display(&keys.scroll_up), display(&keys.scroll_down)));
    text.push_str(&format!("  {}: Copy latest reply\n", display(&keys.copy_reply)));
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Journal\n", display(&keys.journal)));
    text.push_str(&format!("  {}: Preferences\n", display(&keys.preferences)));
    text.push_str(&format!("  {}: Logout\n", display(&keys.logout)));
    text.push_str(&format!("  {}: Show/hide help\n", display(&keys.help)));
    text.push_str(&format!("  {}: Quit\n", display(&keys.quit)));

    text
}
