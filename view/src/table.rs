use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

/// Gap between columns.
const COLUMN_GAP: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortMark {
    Ascending,
    Descending,
}

impl SortMark {
    fn glyph(self) -> char {
        match self {
            SortMark::Ascending => '▲',
            SortMark::Descending => '▼',
        }
    }
}

/// Header definition for one column.
pub struct TableColumn<'a> {
    pub title: &'a str,
    pub width: u16,
    pub align: Align,
    pub sort: Option<SortMark>,
    /// Cells in this column get the search highlight.
    pub searchable: bool,
}

/// Row cursor, scroll offset and header cursor for a [`Table`].
#[derive(Default, Clone, Debug)]
pub struct TableState {
    pub selected: usize,
    pub offset: usize,
    pub len: usize,
    /// Header column picked for sorting.
    pub column: usize,
}

impl TableState {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    /// Update the row count after the rows were replaced. The cursor is
    /// clamped to the new range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.selected = self.selected.min(len.saturating_sub(1));
        self.offset = self.offset.min(self.selected);
    }

    pub fn selected_row(&self) -> Option<usize> {
        (self.selected < self.len).then_some(self.selected)
    }

    pub fn down(&mut self) -> bool {
        if self.selected + 1 < self.len {
            self.selected += 1;
            true
        } else {
            false
        }
    }

    pub fn up(&mut self) -> bool {
        if self.selected > 0 {
            self.selected -= 1;
            true
        } else {
            false
        }
    }

    pub fn page_down(&mut self, n: usize) {
        self.selected = (self.selected + n).min(self.len.saturating_sub(1));
    }

    pub fn page_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.len.saturating_sub(1);
    }

    pub fn next_column(&mut self, count: usize) {
        if count > 0 {
            self.column = (self.column + 1) % count;
        }
    }

    pub fn prev_column(&mut self, count: usize) {
        if count > 0 {
            self.column = (self.column + count - 1) % count;
        }
    }

    /// Scroll so the cursor row is inside a body of `visible` rows.
    pub fn ensure_visible(&mut self, visible: usize) {
        if visible == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + visible {
            self.offset = self.selected + 1 - visible;
        }
    }

    /// Select the row under a click at terminal row `y`. `area` is the full
    /// table area including the header row.
    pub fn click_at(&mut self, y: u16, area: Rect) -> bool {
        let body_top = area.y + 1;
        if y < body_top || y >= area.bottom() {
            return false;
        }
        let idx = self.offset + (y - body_top) as usize;
        if idx < self.len {
            self.selected = idx;
            true
        } else {
            false
        }
    }

    /// Header column under a click at `(x, y)`.
    pub fn column_at(x: u16, y: u16, area: Rect, columns: &[TableColumn<'_>]) -> Option<usize> {
        if y != area.y || x < area.x {
            return None;
        }
        let mut left = area.x;
        for (i, col) in columns.iter().enumerate() {
            let right = left + col.width;
            if x >= left && x < right {
                return Some(i);
            }
            left = right + COLUMN_GAP;
        }
        None
    }
}

/// Column-aligned rows under a header line, with zebra striping and an
/// optional highlighted search term.
pub struct Table<'a, R> {
    state: &'a TableState,
    columns: &'a [TableColumn<'a>],
    rows: &'a [R],
    focused: bool,
    highlight: Option<&'a str>,
    empty_text: &'a str,
    style: Style,
    stripe_style: Style,
    selected_style: Style,
    header_style: Style,
    match_style: Style,
}

impl<'a, R: AsRef<[String]>> Table<'a, R> {
    pub fn new(state: &'a TableState, columns: &'a [TableColumn<'a>], rows: &'a [R]) -> Self {
        Self {
            state,
            columns,
            rows,
            focused: false,
            highlight: None,
            empty_text: "",
            style: Style::default(),
            stripe_style: Style::default().bg(Color::Rgb(28, 28, 28)),
            selected_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::UNDERLINED),
            match_style: Style::default().fg(Color::Yellow),
        }
    }

    /// Show the row cursor and header cursor.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Highlight case-insensitive occurrences of `term` in searchable columns.
    pub fn highlight(mut self, term: Option<&'a str>) -> Self {
        self.highlight = term.filter(|t| !t.is_empty());
        self
    }

    /// Message drawn when there are no rows.
    pub fn empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = text;
        self
    }

    pub fn selected_style(mut self, style: Style) -> Self {
        self.selected_style = style;
        self
    }
}

fn put_str(buf: &mut Buffer, x: u16, y: u16, right: u16, text: &str, style: Style) {
    let mut cx = x;
    for ch in text.chars() {
        if cx >= right {
            break;
        }
        if let Some(cell) = buf.cell_mut((cx, y)) {
            cell.set_char(ch);
            cell.set_style(style);
        }
        cx += 1;
    }
}

/// Char range of the first case-insensitive match of `term` in `text`.
fn match_range(text: &str, term: &str) -> Option<(usize, usize)> {
    let hay: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    let needle: Vec<char> = term.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() || needle.len() > hay.len() || hay.len() != text.chars().count() {
        return None;
    }
    (0..=hay.len() - needle.len())
        .find(|&i| hay[i..i + needle.len()] == needle[..])
        .map(|i| (i, i + needle.len()))
}

impl<R: AsRef<[String]>> Widget for Table<'_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        // Header row.
        let mut x = area.x;
        for (i, col) in self.columns.iter().enumerate() {
            if x >= area.right() {
                break;
            }
            let right = (x + col.width).min(area.right());
            let mut style = self.header_style;
            if self.focused && i == self.state.column {
                style = style.fg(Color::White).add_modifier(Modifier::BOLD);
            }
            let mut title = col.title.to_string();
            if let Some(mark) = col.sort {
                title.push(' ');
                title.push(mark.glyph());
            }
            let pad = col.width.saturating_sub(title.chars().count() as u16);
            let start = if col.align == Align::Right { x + pad } else { x };
            put_str(buf, start, area.y, right, &title, style);
            x = right + COLUMN_GAP;
        }

        let body_height = area.height.saturating_sub(1) as usize;
        if self.rows.is_empty() {
            if body_height > 0 {
                let style = Style::default().fg(Color::DarkGray);
                put_str(buf, area.x, area.y + 1, area.right(), self.empty_text, style);
            }
            return;
        }

        for line in 0..body_height {
            let idx = self.state.offset + line;
            let Some(row) = self.rows.get(idx) else {
                break;
            };
            let y = area.y + 1 + line as u16;
            let is_selected = self.focused && idx == self.state.selected;
            let base = if is_selected {
                self.selected_style
            } else if idx % 2 == 1 {
                self.stripe_style
            } else {
                self.style
            };

            // Fill the whole line so stripes and the cursor span the width.
            for cx in area.x..area.right() {
                if let Some(cell) = buf.cell_mut((cx, y)) {
                    cell.set_char(' ');
                    cell.set_style(base);
                }
            }

            let cells = row.as_ref();
            let mut x = area.x;
            for (i, col) in self.columns.iter().enumerate() {
                if x >= area.right() {
                    break;
                }
                let right = (x + col.width).min(area.right());
                let text = cells.get(i).map(String::as_str).unwrap_or("");
                let len = text.chars().count() as u16;
                let text: String = if len > col.width && col.width > 0 {
                    let keep = col.width as usize - 1;
                    text.chars().take(keep).chain(std::iter::once('…')).collect()
                } else {
                    text.to_string()
                };
                let pad = col.width.saturating_sub(text.chars().count() as u16);
                let start = if col.align == Align::Right { x + pad } else { x };

                let matched = if is_selected || !col.searchable {
                    None
                } else {
                    self.highlight.and_then(|t| match_range(&text, t))
                };
                let mut cx = start;
                for (ci, ch) in text.chars().enumerate() {
                    if cx >= right {
                        break;
                    }
                    let style = match matched {
                        Some((s, e)) if ci >= s && ci < e => base.patch(self.match_style),
                        _ => base,
                    };
                    if let Some(cell) = buf.cell_mut((cx, y)) {
                        cell.set_char(ch);
                        cell.set_style(style);
                    }
                    cx += 1;
                }
                x = right + COLUMN_GAP;
            }
        }
    }
}
