use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect, Constraint, Layout};
use ratatui::text::{Line, Span};
use crate::Config;
use crate::models::UserContext;
use crate::tui::pages::JournalPage;
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::form::FormStyles;
use crate::tui::widgets::message_list::render_message_list;
use crate::utils::{format_key_binding_for_display, todays_long_date};

/// Insight panel is only shown when the terminal is at least this wide
const INSIGHTS_MIN_WIDTH: u16 = 90;
const INSIGHTS_WIDTH: u16 = 32;

pub fn render_journal_page(f: &mut Frame, area: Rect, page: &mut JournalPage, config: &Config) {
    let styles = FormStyles::from_theme(&config.get_active_theme());

    let [header_area, body_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(1)]).areas(area);
    render_header(f, header_area, &styles);

    let (journal_area, insights_area) = match page.context {
        Some(_) if body_area.width >= INSIGHTS_MIN_WIDTH => {
            let [journal, insights] =
                Layout::horizontal([Constraint::Min(1), Constraint::Length(INSIGHTS_WIDTH)]).areas(body_area);
            (journal, Some(insights))
        }
        _ => (body_area, None),
    };

    if let (Some(insights_area), Some(context)) = (insights_area, page.context.as_ref()) {
        render_insights(f, insights_area, context, &styles);
    }

    let submit_key = format_key_binding_for_display(&config.key_bindings.submit);
    let cursor = if page.shows_conversation() {
        let [messages_area, composer_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(5)]).areas(journal_area);
        render_message_list(
            f,
            messages_area,
            &page.messages,
            page.loading,
            page.scroll_from_bottom,
            &styles,
        );
        let title = format!("Write your entry ({}: send)", submit_key);
        render_composer(f, composer_area, &mut page.composer, &title, page.loading, &styles)
    } else {
        let [prompt_area, composer_area, _] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)]).areas(journal_area);
        let prompt = vec![
            Line::from(Span::styled(todays_long_date(), styles.muted)),
            Line::from(Span::styled("How are you feeling today?", styles.title)),
        ];
        f.render_widget(Paragraph::new(prompt).alignment(Alignment::Center), prompt_area);
        let title = format!("Dear diary... ({}: send)", submit_key);
        render_composer(f, composer_area, &mut page.composer, &title, page.loading, &styles)
    };

    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}

fn render_header(f: &mut Frame, area: Rect, styles: &FormStyles) {
    let lines = vec![
        Line::from(Span::styled("MoodScribe", styles.title)),
        Line::from(Span::styled("Empathetic Digital Journal", styles.muted)),
    ];
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

/// Multi-line entry box. Locked (dimmed, no cursor) while a reply is
/// outstanding.
fn render_composer(
    f: &mut Frame,
    area: Rect,
    editor: &mut Editor,
    title: &str,
    locked: bool,
    styles: &FormStyles,
) -> Option<(u16, u16)> {
    if area.width < 3 || area.height < 3 {
        return None;
    }
    let inner_height = area.height.saturating_sub(2) as usize;
    let inner_width = area.width.saturating_sub(2) as usize;
    editor.update_scroll(inner_height);
    editor.update_horizontal_scroll(inner_width);

    let lines: Vec<Line> = editor
        .visible_lines(inner_height, inner_width)
        .into_iter()
        .map(Line::from)
        .collect();
    let style = if locked { styles.inactive } else { styles.base };
    let paragraph = Paragraph::new(lines)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(paragraph, area);

    if locked {
        None
    } else {
        editor.get_cursor_screen_pos(area)
    }
}

fn render_insights(f: &mut Frame, area: Rect, context: &UserContext, styles: &FormStyles) {
    let mut lines = Vec::new();
    let mut section = |title: &str, body: String| {
        lines.push(Line::from(Span::styled(title.to_string(), styles.title)));
        lines.push(Line::from(Span::styled(body, styles.base)));
        lines.push(Line::default());
    };

    if let Some(mood) = context.mood.as_deref() {
        section("Mood", mood.to_string());
    }
    if let Some(stress) = context.stress_level {
        section("Stress level", format!("{:.1}", stress));
    }
    if !context.recent_activities.is_empty() {
        section("Recent activities", context.recent_activities.join(", "));
    }
    if !context.goals.is_empty() {
        section("Goals", context.goals.join(", "));
    }
    if !context.recommended_genres.is_empty() {
        section("You might enjoy", context.recommended_genres.join(", "));
    }

    let paragraph = Paragraph::new(lines)
        .style(styles.base)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Insights"));
    f.render_widget(paragraph, area);
}
