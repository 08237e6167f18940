use ratatui::layout::Rect;
use std::cmp;

/// Text buffer behind every input field: form fields are single-line, the
/// journal composer is multi-line.
#[derive(Debug, Clone)]
pub struct Editor {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    pub scroll_offset: usize, // Vertical scroll (line offset)
    pub scroll_col: usize,    // Horizontal scroll (column offset)
    multiline: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::single_line()
    }
}

impl Editor {
    pub fn single_line() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            scroll_col: 0,
            multiline: false,
        }
    }

    pub fn multi_line() -> Self {
        Self {
            multiline: true,
            ..Self::single_line()
        }
    }

    /// Single-line editor pre-filled with `content`, cursor at the end
    pub fn from_string(content: &str) -> Self {
        let mut editor = Self::single_line();
        editor.insert_str(content);
        editor
    }

    /// Ensure cursor_line is within valid bounds
    fn ensure_cursor_valid(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        if self.cursor_line >= self.lines.len() {
            self.cursor_line = self.lines.len().saturating_sub(1);
        }
        let line_len = self.current_line_len();
        self.cursor_col = cmp::min(self.cursor_col, line_len);
    }

    fn current_line_len(&self) -> usize {
        self.lines
            .get(self.cursor_line)
            .map(|l| l.chars().count())
            .unwrap_or(0)
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline();
            return;
        }
        self.ensure_cursor_valid();
        let col = self.cursor_col;
        if let Some(line) = self.lines.get_mut(self.cursor_line) {
            let byte_idx = char_to_byte(line, col);
            line.insert(byte_idx, ch);
            self.cursor_col += 1;
        }
    }

    /// Insert pasted text. Single-line editors flatten newlines to spaces.
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n");
        for ch in text.chars() {
            match ch {
                '\n' if !self.multiline => self.insert_char(' '),
                '\r' => {}
                _ => self.insert_char(ch),
            }
        }
    }

    /// Backspace: delete the character before the cursor, merging lines at
    /// the start of a line
    pub fn delete_char(&mut self) {
        self.ensure_cursor_valid();
        if self.cursor_col > 0 {
            let col = self.cursor_col - 1;
            if let Some(line) = self.lines.get_mut(self.cursor_line) {
                let byte_idx = char_to_byte(line, col);
                line.remove(byte_idx);
                self.cursor_col = col;
            }
        } else if self.cursor_line > 0 {
            let current_line = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            if let Some(prev_line) = self.lines.get_mut(self.cursor_line) {
                self.cursor_col = prev_line.chars().count();
                prev_line.push_str(&current_line);
            }
        }
    }

    /// Delete: remove the character under the cursor
    pub fn delete_forward(&mut self) {
        self.ensure_cursor_valid();
        let line_len = self.current_line_len();
        if self.cursor_col < line_len {
            let col = self.cursor_col;
            if let Some(line) = self.lines.get_mut(self.cursor_line) {
                let byte_idx = char_to_byte(line, col);
                line.remove(byte_idx);
            }
        } else if self.cursor_line + 1 < self.lines.len() {
            let next_line = self.lines.remove(self.cursor_line + 1);
            if let Some(line) = self.lines.get_mut(self.cursor_line) {
                line.push_str(&next_line);
            }
        }
    }

    pub fn insert_newline(&mut self) {
        if !self.multiline {
            return;
        }
        self.ensure_cursor_valid();
        let col = self.cursor_col;
        if let Some(line) = self.lines.get_mut(self.cursor_line) {
            let byte_idx = char_to_byte(line, col);
            let remainder = line.split_off(byte_idx);
            self.lines.insert(self.cursor_line + 1, remainder);
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line < self.lines.len().saturating_sub(1) {
            self.cursor_line += 1;
            self.cursor_col = cmp::min(self.cursor_col, self.current_line_len());
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line < self.lines.len().saturating_sub(1) {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.current_line_len();
    }

    pub fn clear(&mut self) {
        self.lines = vec![String::new()];
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.scroll_offset = 0;
        self.scroll_col = 0;
    }

    /// Full contents, lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// True when the buffer holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn update_scroll(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if self.cursor_line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor_line.saturating_sub(viewport_height - 1);
        }
    }

    /// `viewport_width` excludes borders
    pub fn update_horizontal_scroll(&mut self, viewport_width: usize) {
        if viewport_width == 0 {
            return;
        }
        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if self.cursor_col >= self.scroll_col + viewport_width {
            self.scroll_col = self.cursor_col.saturating_sub(viewport_width - 1);
        }
    }

    /// Lines currently in view, horizontally scrolled and clipped
    pub fn visible_lines(&self, viewport_height: usize, viewport_width: usize) -> Vec<String> {
        let start = cmp::min(self.scroll_offset, self.lines.len());
        let end = cmp::min(start + viewport_height, self.lines.len());
        self.lines[start..end]
            .iter()
            .map(|line| line.chars().skip(self.scroll_col).take(viewport_width).collect())
            .collect()
    }

    /// Screen position of the cursor inside a bordered `area`
    pub fn get_cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let inner_height = area.height.saturating_sub(2) as usize;
        let inner_width = area.width.saturating_sub(2) as usize;
        if self.cursor_line < self.scroll_offset || self.cursor_line >= self.scroll_offset + inner_height {
            return None;
        }
        if self.cursor_col < self.scroll_col || self.cursor_col - self.scroll_col >= inner_width {
            return None;
        }
        let x = area.x + 1 + (self.cursor_col - self.scroll_col) as u16;
        let y = area.y + 1 + (self.cursor_line - self.scroll_offset) as u16;
        Some((x, y))
    }
}

/// Byte index of the `col`-th character (or the end of the string)
fn char_to_byte(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}
