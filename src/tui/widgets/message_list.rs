use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::style::{Style, Modifier};
use ratatui::Frame;
use ratatui::layout::{Rect, Layout as RatLayout, Direction, Constraint};
use ratatui::text::{Text, Line, Span};
use ratskin::RatSkin;
use termimad::minimad::Text as MinimadText;
use std::cmp;
use crate::models::Message;
use crate::tui::widgets::form::FormStyles;
use crate::utils::format_entry_timestamp;

pub const ASSISTANT_LABEL: &str = "Joy 🌟";
pub const USER_LABEL: &str = "You";

/// Word-wrap plain text to `width` columns, breaking long words
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    let mut wrapped = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let word_len = word.chars().count();
            let current_len = current.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                wrapped.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            while current.chars().count() > width {
                let head: String = current.chars().take(width).collect();
                let tail: String = current.chars().skip(width).collect();
                wrapped.push(head);
                current = tail;
            }
        }
        wrapped.push(current);
    }
    wrapped
}

/// Assistant replies are markdown; render them with the terminal skin
fn markdown_lines(content: &str, width: u16) -> Vec<Line<'static>> {
    let parsed = RatSkin::default().parse(MinimadText::from(content), width);
    parsed
        .into_iter()
        .map(|line| {
            let spans: Vec<Span<'static>> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.to_string(), span.style))
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Every message as display lines, with a date separator whenever the day
/// changes
pub fn build_conversation_lines(messages: &[Message], width: u16, styles: &FormStyles) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut last_date: Option<String> = None;

    for message in messages {
        let (date, time) = format_entry_timestamp(message.timestamp.as_deref());
        if last_date.as_deref() != Some(date.as_str()) {
            lines.push(Line::from(Span::styled(format!("── {} ──", date), styles.muted)));
            lines.push(Line::default());
            last_date = Some(date);
        }

        let (label, label_style) = if message.is_user() {
            (USER_LABEL, styles.base.add_modifier(Modifier::BOLD))
        } else {
            (ASSISTANT_LABEL, styles.title)
        };
        lines.push(Line::from(vec![
            Span::styled(label.to_string(), label_style),
            Span::styled(format!("  {}", time), styles.muted),
        ]));

        if message.is_user() {
            for row in wrap_text(&message.content, width as usize) {
                lines.push(Line::from(Span::styled(row, styles.base)));
            }
        } else {
            lines.extend(markdown_lines(&message.content, width));
        }
        lines.push(Line::default());
    }
    lines
}

/// Scrollable conversation. `scroll_from_bottom` counts lines up from the
/// newest message so new replies stay in view by default.
pub fn render_message_list(
    f: &mut Frame,
    area: Rect,
    messages: &[Message],
    thinking: bool,
    scroll_from_bottom: usize,
    styles: &FormStyles,
) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let horizontal = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let content_area = horizontal[0];
    let scrollbar_area = horizontal[1];

    let viewport_height = area.height.saturating_sub(2) as usize;
    let text_width = content_area.width.saturating_sub(2);

    let mut lines = build_conversation_lines(messages, text_width, styles);
    if thinking {
        lines.push(Line::from(Span::styled(
            format!("{} is thinking...", ASSISTANT_LABEL),
            styles.muted.add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = lines.len();
    let max_scroll = total_lines.saturating_sub(viewport_height);
    let top = max_scroll.saturating_sub(cmp::min(scroll_from_bottom, max_scroll));
    let end = cmp::min(top + viewport_height, total_lines);
    let visible = Text::from(lines[top..end].to_vec());

    let paragraph = Paragraph::new(visible)
        .style(styles.base)
        .block(Block::default().borders(Borders::ALL).title("Conversation"));
    f.render_widget(paragraph, content_area);

    if total_lines > viewport_height && scrollbar_area.width > 0 {
        let scrollbar_inner = Rect::new(
            scrollbar_area.x,
            content_area.y + 1,
            scrollbar_area.width,
            content_area.height.saturating_sub(2),
        );
        let mut state = ScrollbarState::new(max_scroll).position(top);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .style(Style::default());
        f.render_stateful_widget(scrollbar, scrollbar_inner, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;

    #[test]
    fn wrap_breaks_on_words_and_long_runs() {
        assert_eq!(wrap_text("a quiet morning walk", 8), vec!["a quiet", "morning", "walk"]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
    }

    #[test]
    fn conversation_lines_label_each_speaker_once_per_message() {
        let styles = FormStyles::from_theme(&Theme::default());
        let messages = vec![
            Message::user("Felt calm today", "2024-05-01T09:30:00.000Z"),
            Message::assistant("That's **great** to hear.", "2024-05-01T09:30:05.000Z"),
        ];
        let lines = build_conversation_lines(&messages, 40, &styles);
        let rendered: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        let separators = rendered.iter().filter(|l| l.starts_with("──")).count();
        assert_eq!(separators, 1);
        assert!(rendered.iter().any(|l| l.starts_with(USER_LABEL)));
        assert!(rendered.iter().any(|l| l.starts_with(ASSISTANT_LABEL)));
        assert!(rendered.iter().any(|l| l.contains("Felt calm today")));
    }
}
