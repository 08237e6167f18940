use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::style::{Style, Modifier};
use ratatui::Frame;
use ratatui::layout::{Rect, Constraint, Layout, Flex};
use ratatui::text::{Line, Span};
use crate::config::Theme;
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::color::{parse_color, get_contrast_text_color};

/// Widest a form column grows on large terminals
pub const FORM_MAX_WIDTH: u16 = 64;

/// Styles shared by every form, derived from the active theme
#[derive(Debug, Clone, Copy)]
pub struct FormStyles {
    pub base: Style,
    pub active: Style,
    pub inactive: Style,
    pub title: Style,
    pub muted: Style,
    pub error: Style,
}

impl FormStyles {
    pub fn from_theme(theme: &Theme) -> Self {
        let fg = parse_color(&theme.fg);
        let bg = parse_color(&theme.bg);
        let highlight_bg = parse_color(&theme.highlight_bg);
        let highlight_fg = if theme.highlight_fg.is_empty() {
            get_contrast_text_color(highlight_bg)
        } else {
            parse_color(&theme.highlight_fg)
        };
        Self {
            base: Style::default().fg(fg).bg(bg),
            active: Style::default().fg(highlight_fg).bg(highlight_bg),
            inactive: Style::default().fg(fg).add_modifier(Modifier::DIM),
            title: Style::default().fg(parse_color(&theme.accent)).add_modifier(Modifier::BOLD),
            muted: Style::default().fg(parse_color(&theme.muted_fg)),
            error: Style::default().fg(parse_color(&theme.error_fg)).add_modifier(Modifier::BOLD),
        }
    }
}

/// Horizontally centered column no wider than `max_width`
pub fn centered_column(area: Rect, max_width: u16) -> Rect {
    let width = area.width.min(max_width);
    let [column] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    column
}

/// Bordered single-line input. Returns the cursor position when active.
/// `masked` fields show one bullet per character.
pub fn render_text_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    editor: &mut Editor,
    is_active: bool,
    masked: bool,
    styles: &FormStyles,
) -> Option<(u16, u16)> {
    if area.width < 3 || area.height < 3 {
        return None;
    }
    let inner_width = area.width.saturating_sub(2) as usize;
    editor.update_horizontal_scroll(inner_width);

    let visible = editor
        .visible_lines(1, inner_width)
        .into_iter()
        .next()
        .unwrap_or_default();
    let shown = if masked {
        "•".repeat(visible.chars().count())
    } else {
        visible
    };

    let style = if is_active { styles.active } else { styles.inactive };
    let paragraph = Paragraph::new(Line::from(Span::styled(shown, style)))
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(label.to_string()));
    f.render_widget(paragraph, area);

    if is_active {
        editor.get_cursor_screen_pos(area)
    } else {
        None
    }
}

/// Bordered selector showing the current choice between arrows
pub fn render_choice_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    is_active: bool,
    styles: &FormStyles,
) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let style = if is_active { styles.active } else { styles.inactive };
    let paragraph = Paragraph::new(format!("◀ {} ▶", value))
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(label.to_string()));
    f.render_widget(paragraph, area);
}

/// One line under a form: the error if there is one, otherwise `hint`
pub fn render_form_message(f: &mut Frame, area: Rect, error: Option<&str>, hint: &str, styles: &FormStyles) {
    let line = match error {
        Some(message) => Line::from(Span::styled(message.to_string(), styles.error)),
        None => Line::from(Span::styled(hint.to_string(), styles.muted)),
    };
    f.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

/// Bold heading with an optional muted subtitle on the next line
pub fn render_heading(f: &mut Frame, area: Rect, title: &str, subtitle: Option<&str>, styles: &FormStyles) {
    let mut lines = vec![Line::from(Span::styled(title.to_string(), styles.title))];
    if let Some(subtitle) = subtitle {
        lines.push(Line::from(Span::styled(subtitle.to_string(), styles.muted)));
    }
    f.render_widget(Paragraph::new(lines), area);
}
