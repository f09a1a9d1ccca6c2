use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

/// Editable single-line text. The cursor is a char index.
#[derive(Clone, Debug, Default)]
pub struct TextInputState {
    pub value: String,
    cursor: usize,
}

impl TextInputState {
    pub fn new(initial: &str) -> Self {
        Self {
            value: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// Prompted single-line input, e.g. `/ glass`.
///
/// The cursor block is only drawn while `editing` is set; otherwise the
/// value (or the placeholder when empty) is shown dimmed.
pub struct TextInput<'a> {
    state: &'a TextInputState,
    prompt: &'a str,
    placeholder: &'a str,
    editing: bool,
    style: Style,
    cursor_style: Style,
}

impl<'a> TextInput<'a> {
    pub fn new(state: &'a TextInputState) -> Self {
        Self {
            state,
            prompt: "",
            placeholder: "",
            editing: true,
            style: Style::default().fg(Color::White),
            cursor_style: Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn prompt(mut self, prompt: &'a str) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let y = area.y;
        let dim = Style::default().fg(Color::DarkGray);
        let mut x = area.x;

        let mut put = |x: &mut u16, ch: char, style: Style| {
            if *x < area.right() {
                if let Some(cell) = buf.cell_mut((*x, y)) {
                    cell.set_char(ch);
                    cell.set_style(style);
                }
                *x += 1;
            }
        };

        for ch in self.prompt.chars() {
            put(&mut x, ch, dim);
        }

        if self.state.value.is_empty() && !self.editing {
            for ch in self.placeholder.chars() {
                put(&mut x, ch, dim);
            }
            return;
        }

        let text_style = if self.editing { self.style } else { dim };
        for (i, ch) in self.state.value.chars().enumerate() {
            let style = if self.editing && i == self.state.cursor {
                self.cursor_style
            } else {
                text_style
            };
            put(&mut x, ch, style);
        }
        if self.editing && self.state.cursor >= self.state.value.chars().count() {
            put(&mut x, ' ', self.cursor_style);
        }
    }
}
