use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

/// One row of a [`CheckList`].
pub struct CheckEntry<'a> {
    pub label: &'a str,
    pub checked: bool,
}

/// A vertical list of `[x] label` rows with an optional focus cursor.
///
/// Stateless: the caller owns the checked values and the focused index.
/// The view scrolls just enough to keep the anchor row visible; the anchor
/// follows the cursor and must match what [`CheckList::entry_at`] is given.
pub struct CheckList<'a> {
    entries: &'a [CheckEntry<'a>],
    anchor: usize,
    focused: Option<usize>,
    style: Style,
    focused_style: Style,
    checked_style: Style,
}

impl<'a> CheckList<'a> {
    pub fn new(entries: &'a [CheckEntry<'a>]) -> Self {
        Self {
            entries,
            anchor: 0,
            focused: None,
            style: Style::default(),
            focused_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            checked_style: Style::default().fg(Color::Green),
        }
    }

    /// Row kept in view, with or without a cursor drawn on it.
    pub fn anchor(mut self, index: usize) -> Self {
        self.anchor = index;
        self
    }

    /// Draw the cursor on `index` (pass `None` when the pane is inactive).
    /// A cursor also becomes the anchor.
    pub fn focused(mut self, index: Option<usize>) -> Self {
        if let Some(index) = index {
            self.anchor = index;
        }
        self.focused = index;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// First visible row when `focused` must fit in `visible` rows.
    pub fn scroll_offset(focused: usize, visible: usize) -> usize {
        if visible == 0 {
            0
        } else {
            focused.saturating_sub(visible - 1)
        }
    }

    /// Entry index under a click at terminal row `y`, for a list drawn
    /// with `anchor`.
    pub fn entry_at(y: u16, area: Rect, len: usize, anchor: usize) -> Option<usize> {
        if y < area.y || y >= area.bottom() {
            return None;
        }
        let offset = Self::scroll_offset(anchor, area.height as usize);
        let idx = offset + (y - area.y) as usize;
        (idx < len).then_some(idx)
    }
}

impl Widget for CheckList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let visible = area.height as usize;
        let offset = Self::scroll_offset(self.anchor, visible);

        for (row, (idx, entry)) in self
            .entries
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .enumerate()
        {
            let y = area.y + row as u16;
            let is_focused = self.focused == Some(idx);
            let box_style = if entry.checked {
                self.style.patch(self.checked_style)
            } else {
                self.style
            };
            let label_style = if is_focused {
                self.style.patch(self.focused_style)
            } else {
                self.style
            };

            let mark = if entry.checked { "[x] " } else { "[ ] " };
            let mut x = area.x;
            for (ch, style) in mark
                .chars()
                .map(|c| (c, box_style))
                .chain(entry.label.chars().map(|c| (c, label_style)))
            {
                if x >= area.right() {
                    break;
                }
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(ch);
                    cell.set_style(style);
                }
                x += 1;
            }
        }
    }
}
