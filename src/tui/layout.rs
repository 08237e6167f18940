use ratatui::layout::{Rect, Layout as RatLayout, Direction, Constraint};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub nav_area: Rect,
    pub main_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application.
    /// Height fits the five-field registration form plus title and status.
    pub const MIN_WIDTH: u16 = 40;
    pub const MIN_HEIGHT: u16 = 18;

    pub fn calculate(size: Rect, show_nav: bool) -> Self {
        let min_width_with_border = Self::MIN_WIDTH + 2;
        let min_height_with_border = Self::MIN_HEIGHT + 2;
        let width = size.width.max(min_width_with_border);
        let height = size.height.max(min_height_with_border);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // Nav bar (1 line, only when signed in), content, status (1 line)
        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(if show_nav { 1 } else { 0 }),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner_area);

        Self {
            inner_area,
            nav_area: vertical[0],
            main_area: vertical[1],
            status_area: vertical[2],
        }
    }
}
