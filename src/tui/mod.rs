use std::io;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use view::{
    Align, CheckEntry, CheckList, SortMark, Table, TableColumn, TableState, TextInput,
    TextInputState, centered_rect,
};

use crate::catalog::{Catalog, Field};
use crate::checkbox::{CheckItem, Checkbox, CheckboxGroup, Control, SelectionChanged};
use crate::config::Config;
use crate::enumerate;
use crate::filter::Dimension;
use crate::focus::{Direction, FocusPolicy, FocusRing};
use crate::midi::{self, MidiOut, MidirOut, PortSelector};
use crate::query::{self, Column, Justify, QuerySession, Row, RowSink};

/// Focus ring slots for the two filter groups.
const PACK_GROUP: usize = 0;
const TYPE_GROUP: usize = 1;

/// Room for the " ▲" sort mark after a header title.
const SORT_MARK_WIDTH: usize = 2;

// ---------------------------------------------------------------------------
// Panes
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pane {
    Port,
    Pack,
    Type,
    Presets,
}

impl Pane {
    const ALL: [Pane; 4] = [Pane::Port, Pane::Pack, Pane::Type, Pane::Presets];

    fn title(self) -> &'static str {
        match self {
            Pane::Port => " (1) midi port ",
            Pane::Pack => " (2) pack ",
            Pane::Type => " (3) type ",
            Pane::Presets => " (4) presets ",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|&p| p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn group(self) -> Option<usize> {
        match self {
            Pane::Pack => Some(PACK_GROUP),
            Pane::Type => Some(TYPE_GROUP),
            _ => None,
        }
    }

    fn from_group(group: usize) -> Self {
        if group == TYPE_GROUP {
            Pane::Type
        } else {
            Pane::Pack
        }
    }
}

fn actions_for(pane: Pane) -> Vec<(&'static str, &'static str)> {
    let mut actions = match pane {
        Pane::Port => vec![("<", "prev port"), (">", "next port")],
        Pane::Pack | Pane::Type => vec![("␣", "toggle")],
        Pane::Presets => vec![("⏎", "send"), ("s", "sort"), ("x", "unsort")],
    };
    actions.extend([("/", "search"), ("?", "help"), ("q", "quit")]);
    actions
}

/// Key an action bar entry stands for.
fn action_key(key: &str) -> Option<KeyCode> {
    match key {
        "⏎" => Some(KeyCode::Enter),
        "␣" => Some(KeyCode::Char(' ')),
        _ => key.chars().next().map(KeyCode::Char),
    }
}

// ---------------------------------------------------------------------------
// Preset grid
// ---------------------------------------------------------------------------

/// Rows as last published by the query session.
#[derive(Default)]
struct Grid {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl RowSink for Grid {
    fn set_columns(&mut self, columns: &[Column]) {
        self.columns = columns.to_vec();
    }

    fn replace_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }
}

#[derive(Default, Clone)]
struct Areas {
    port: Rect,
    search: Rect,
    pack_inner: Rect,
    type_inner: Rect,
    table_inner: Rect,
    action_bar: Rect,
}

struct Status {
    text: String,
    error: bool,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

struct State<'c> {
    session: QuerySession<'c>,
    packs: CheckboxGroup<CheckItem>,
    types: CheckboxGroup<CheckItem>,
    focus: FocusRing,
    pane: Pane,
    ports: PortSelector,
    config: Config,
    midi: Box<dyn MidiOut>,
    grid: Grid,
    table: TableState,
    page: usize,
    search_input: TextInputState,
    searching: bool,
    status: Option<Status>,
    show_help: bool,
    help_lines: Vec<String>,
    areas: Areas,
    quit: bool,
}

impl<'c> State<'c> {
    fn new(catalog: &'c Catalog, config: Config, midi: Box<dyn MidiOut>, ports: Vec<String>) -> Self {
        let packs = CheckboxGroup::from_labels(catalog.distinct_packs());
        let types = CheckboxGroup::from_labels(catalog.distinct_types(None));
        let policy = config.focus_policy();
        let focus = FocusRing::new(&[packs.len(), types.len()], policy);
        let ports = PortSelector::new(ports, config.selected_midi_port());

        let mut grid = Grid::default();
        grid.set_columns(&query::columns(catalog));

        let mut session = QuerySession::new(catalog);
        session.refresh();

        let mut s = Self {
            session,
            packs,
            types,
            focus,
            pane: Pane::Pack,
            ports,
            config,
            midi,
            grid,
            table: TableState::default(),
            page: 10,
            search_input: TextInputState::default(),
            searching: false,
            status: None,
            show_help: false,
            help_lines: build_help_lines(policy),
            areas: Areas::default(),
            quit: false,
        };
        s.publish();
        s
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: false,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: true,
        });
    }

    fn publish(&mut self) {
        self.session.publish(&mut self.grid);
        self.table.set_len(self.grid.rows.len());
    }

    fn set_pane(&mut self, pane: Pane) {
        self.pane = pane;
        if let Some(group) = pane.group() {
            self.focus.activate(group);
        }
    }

    fn group(&self, group: usize) -> &CheckboxGroup<CheckItem> {
        if group == TYPE_GROUP {
            &self.types
        } else {
            &self.packs
        }
    }

    /// Toggle the control at display `index` of `group` and refilter.
    fn toggle_check(&mut self, group: usize, index: usize) {
        let control = Control::from_position(index);
        let (dimension, change) = if group == TYPE_GROUP {
            (Dimension::Type, self.types.toggle(control))
        } else {
            (Dimension::Pack, self.packs.toggle(control))
        };
        if let Some(change) = change {
            self.apply_selection(dimension, &change);
        }
    }

    fn apply_selection(&mut self, dimension: Dimension, change: &SelectionChanged) {
        self.session.apply_selection(dimension, change);
        self.publish();
    }

    fn step_focus(&mut self, dir: Direction) {
        let (group, _) = self.focus.step(dir);
        self.pane = Pane::from_group(group);
    }

    fn shift_port(&mut self, forward: bool) {
        let changed = if forward {
            self.ports.next()
        } else {
            self.ports.prev()
        };
        let Some(port) = changed.map(str::to_string) else {
            return;
        };
        match self.config.set_selected_midi_port(&port) {
            Ok(()) => self.info(format!("MIDI port: {port}")),
            Err(e) => {
                log::warn!("Cannot save config: {e:#}");
                self.error(format!("MIDI port: {port} (not saved: {e:#})"));
            }
        }
    }

    fn sort_by_column(&mut self, column: usize) {
        let Some(field) = self.grid.columns.get(column).map(|c| c.field) else {
            return;
        };
        self.table.column = column;
        self.session.toggle_sort(field);
        self.publish();
        let order: Vec<String> = self
            .session
            .sort()
            .keys()
            .iter()
            .map(|k| format!("{} {}", k.field.name(), if k.ascending { "▲" } else { "▼" }))
            .collect();
        self.info(format!("Sorted by {}", order.join(", ")));
    }

    fn clear_sort(&mut self) {
        self.session.clear_sort();
        self.publish();
        self.info("Catalog order");
    }

    fn start_search(&mut self) {
        self.searching = true;
        self.search_input.end();
    }

    fn apply_search(&mut self) {
        self.searching = false;
        self.session.set_search(Some(self.search_input.value.clone()));
        self.publish();
        self.table.first();
    }

    fn clear_search(&mut self) {
        self.searching = false;
        self.search_input.clear();
        if self.session.search().is_some() {
            self.session.set_search(None);
            self.publish();
        }
    }

    fn send_selected(&mut self) {
        let Some(preset) = self
            .table
            .selected_row()
            .and_then(|i| self.session.results().get(i).copied())
        else {
            return;
        };
        let Some(port) = self.ports.current().map(str::to_string) else {
            self.error("No MIDI output port available");
            return;
        };
        match midi::send_preset_change(self.midi.as_ref(), &port, preset, self.config.settle_delay()) {
            Ok(()) => self.info(format!(
                "Sent '{}' (cc0 {}, pgm {}) to {port}",
                preset.name, preset.cc0, preset.pgm
            )),
            Err(e) => {
                log::warn!("{e}");
                self.error(e.to_string());
            }
        }
    }
}

pub fn run(catalog: &Catalog, config: Config) -> anyhow::Result<()> {
    let midi = MidirOut::new();
    let ports = enumerate::output_ports(&midi);
    let mut s = State::new(catalog, config, Box::new(midi), ports);
    if s.ports.current().is_none() {
        s.error("No MIDI output ports found");
    }

    // Set up terminal.
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Logging would draw over the alternate screen unless stderr is
    // redirected somewhere else.
    let prev_log_level = log::max_level();
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        log::set_max_level(log::LevelFilter::Off);
    }

    let result = event_loop(&mut terminal, &mut s);

    log::set_max_level(prev_log_level);

    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    crossterm::terminal::disable_raw_mode()?;

    result.map_err(Into::into)
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    s: &mut State,
) -> io::Result<()> {
    loop {
        render(terminal, s)?;
        if s.quit {
            break;
        }
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let ev = event::read()?;
        process_event(s, ev);
        while event::poll(Duration::ZERO)? {
            process_event(s, event::read()?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Event processing
// ---------------------------------------------------------------------------

fn process_event(s: &mut State, ev: Event) {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if s.show_help {
                s.show_help = false;
            } else if s.searching {
                handle_search_key(s, key.code);
            } else {
                handle_key(s, key.code, key.modifiers);
            }
        }
        Event::Mouse(mouse) => {
            if s.show_help {
                if let MouseEventKind::Down(_) = mouse.kind {
                    s.show_help = false;
                }
                return;
            }
            handle_mouse(s, mouse.kind, mouse.column, mouse.row);
        }
        _ => {}
    }
}

fn handle_search_key(s: &mut State, code: KeyCode) {
    let input = &mut s.search_input;
    match code {
        KeyCode::Enter => s.apply_search(),
        KeyCode::Esc => s.clear_search(),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) => input.insert(c),
        _ => {}
    }
}

fn handle_key(s: &mut State, code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') | KeyCode::Char('q') = code {
            s.quit = true;
        }
        return;
    }

    // Global keys.
    match code {
        KeyCode::Char('q') => {
            s.quit = true;
            return;
        }
        KeyCode::Char('?') => {
            s.show_help = true;
            return;
        }
        KeyCode::Tab => {
            s.set_pane(s.pane.next());
            return;
        }
        KeyCode::BackTab => {
            s.set_pane(s.pane.prev());
            return;
        }
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            s.set_pane(Pane::ALL[idx]);
            return;
        }
        KeyCode::Char('/') => {
            s.start_search();
            return;
        }
        KeyCode::Char('<') | KeyCode::Char(',') => {
            s.shift_port(false);
            return;
        }
        KeyCode::Char('>') | KeyCode::Char('.') => {
            s.shift_port(true);
            return;
        }
        KeyCode::Esc => {
            s.clear_search();
            s.status = None;
            return;
        }
        _ => {}
    }

    match s.pane {
        Pane::Port => match code {
            KeyCode::Left => s.shift_port(false),
            KeyCode::Right => s.shift_port(true),
            _ => {}
        },
        Pane::Pack | Pane::Type => match code {
            KeyCode::Up => s.step_focus(Direction::Up),
            KeyCode::Down => s.step_focus(Direction::Down),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let group = s.focus.active();
                s.toggle_check(group, s.focus.index_in(group));
            }
            _ => {}
        },
        Pane::Presets => match code {
            KeyCode::Up => {
                s.table.up();
            }
            KeyCode::Down => {
                s.table.down();
            }
            KeyCode::PageUp => s.table.page_up(s.page),
            KeyCode::PageDown => s.table.page_down(s.page),
            KeyCode::Home => s.table.first(),
            KeyCode::End => s.table.last(),
            KeyCode::Left => s.table.prev_column(s.grid.columns.len()),
            KeyCode::Right => s.table.next_column(s.grid.columns.len()),
            KeyCode::Char('s') => s.sort_by_column(s.table.column),
            KeyCode::Char('x') => s.clear_sort(),
            KeyCode::Enter => s.send_selected(),
            _ => {}
        },
    }
}

fn handle_mouse(s: &mut State, kind: MouseEventKind, x: u16, y: u16) {
    match kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let actions = actions_for(s.pane);
            if let Some(key) = action_bar_hit(x, y, s.areas.action_bar, &actions) {
                if let Some(code) = action_key(key) {
                    handle_key(s, code, KeyModifiers::NONE);
                }
                return;
            }

            let areas = s.areas.clone();
            if areas.port.contains((x, y).into()) {
                s.set_pane(Pane::Port);
                let mid = areas.port.x + areas.port.width / 2;
                s.shift_port(x >= mid);
            } else if areas.search.contains((x, y).into()) {
                s.start_search();
            } else if let Some((group, inner)) = [
                (PACK_GROUP, areas.pack_inner),
                (TYPE_GROUP, areas.type_inner),
            ]
            .into_iter()
            .find(|(_, r)| r.contains((x, y).into()))
            {
                let len = s.group(group).len();
                let anchor = s.focus.index_in(group);
                if let Some(idx) = CheckList::entry_at(y, inner, len, anchor) {
                    s.focus.focus(group, idx);
                    s.pane = Pane::from_group(group);
                    s.toggle_check(group, idx);
                }
            } else if areas.table_inner.contains((x, y).into()) {
                s.set_pane(Pane::Presets);
                let columns = table_columns(s);
                if let Some(col) = TableState::column_at(x, y, areas.table_inner, &columns) {
                    s.sort_by_column(col);
                } else {
                    s.table.click_at(y, areas.table_inner);
                }
            }
        }
        MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
            let down = kind == MouseEventKind::ScrollDown;
            let areas = &s.areas;
            if areas.table_inner.contains((x, y).into()) {
                if down {
                    s.table.down();
                } else {
                    s.table.up();
                }
            } else if let Some(group) = [(PACK_GROUP, areas.pack_inner), (TYPE_GROUP, areas.type_inner)]
                .into_iter()
                .find(|(_, r)| r.contains((x, y).into()))
                .map(|(g, _)| g)
            {
                let idx = s.focus.index_in(group);
                let target = if down { idx + 1 } else { idx.saturating_sub(1) };
                s.focus.focus(group, target);
                s.pane = Pane::from_group(group);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn pane_block(pane: Pane, active: Pane) -> Block<'static> {
    let style = if pane == active {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default().borders(Borders::ALL).border_style(style)
}

fn table_columns<'a>(s: &'a State) -> Vec<TableColumn<'a>> {
    s.grid
        .columns
        .iter()
        .map(|c| TableColumn {
            title: c.name,
            width: (c.width + SORT_MARK_WIDTH) as u16,
            align: match c.justify {
                Justify::Left => Align::Left,
                Justify::Right => Align::Right,
            },
            sort: s.session.sort().direction_of(c.field).map(|ascending| {
                if ascending {
                    SortMark::Ascending
                } else {
                    SortMark::Descending
                }
            }),
            searchable: matches!(c.field, Field::Name | Field::Characters),
        })
        .collect()
}

fn check_entries(group: &CheckboxGroup<CheckItem>) -> Vec<CheckEntry<'_>> {
    std::iter::once(group.all())
        .chain(group.items())
        .map(|c| CheckEntry {
            label: c.label(),
            checked: c.is_checked(),
        })
        .collect()
}

fn render(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    s: &mut State,
) -> io::Result<()> {
    terminal.draw(|frame| {
        let area = frame.area();
        let [top, middle, status_area, action_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let filter_width = s
            .packs
            .items()
            .iter()
            .chain(s.types.items())
            .map(|c| c.label().chars().count())
            .max()
            .unwrap_or(0)
            .max(12) as u16
            + 6;
        let filter_width = filter_width.min(area.width / 3);

        let [port_area, search_area] =
            Layout::horizontal([Constraint::Length(filter_width.max(24)), Constraint::Fill(1)])
                .areas(top);
        let [filters_area, presets_area] =
            Layout::horizontal([Constraint::Length(filter_width), Constraint::Fill(1)])
                .areas(middle);
        let [pack_area, type_area] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Fill(1)]).areas(filters_area);

        // Port.
        let block = pane_block(Pane::Port, s.pane).title(Pane::Port.title());
        let inner = block.inner(port_area);
        frame.render_widget(block, port_area);
        let port_text = match s.ports.current() {
            Some(p) if s.ports.ports().len() > 1 => format!("◀ {p} ▶"),
            Some(p) => p.to_string(),
            None => "(no MIDI outputs)".to_string(),
        };
        frame.render_widget(Paragraph::new(port_text), inner);
        s.areas.port = port_area;

        // Search.
        let search_style = if s.searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(search_style)
            .title(" search ");
        let inner = block.inner(search_area);
        frame.render_widget(block, search_area);
        frame.render_widget(
            TextInput::new(&s.search_input)
                .prompt("/ ")
                .placeholder("name or character")
                .editing(s.searching),
            inner,
        );
        s.areas.search = search_area;

        // Filters.
        for (pane, group_area) in [(Pane::Pack, pack_area), (Pane::Type, type_area)] {
            let Some(group) = pane.group() else {
                continue;
            };
            let block = pane_block(pane, s.pane).title(pane.title());
            let inner = block.inner(group_area);
            frame.render_widget(block, group_area);
            let entries = check_entries(s.group(group));
            let anchor = s.focus.index_in(group);
            let focused = (s.pane == pane).then_some(anchor);
            frame.render_widget(
                CheckList::new(&entries).anchor(anchor).focused(focused),
                inner,
            );
            if group == PACK_GROUP {
                s.areas.pack_inner = inner;
            } else {
                s.areas.type_inner = inner;
            }
        }

        // Presets.
        let title = format!(
            "{}[{}/{}] ",
            Pane::Presets.title(),
            s.grid.rows.len(),
            s.session.catalog().len()
        );
        let block = pane_block(Pane::Presets, s.pane).title(title);
        let inner = block.inner(presets_area);
        frame.render_widget(block, presets_area);
        s.page = inner.height.saturating_sub(1).max(1) as usize;
        s.table.ensure_visible(s.page);
        s.areas.table_inner = inner;

        let columns = table_columns(s);
        let empty_text = if s.session.filters().is_active() {
            "No presets match"
        } else {
            "Check at least one pack and one type"
        };
        frame.render_widget(
            Table::new(&s.table, &columns, &s.grid.rows)
                .focused(s.pane == Pane::Presets)
                .highlight(s.session.search())
                .empty_text(empty_text),
            inner,
        );

        // Status line.
        if let Some(status) = &s.status {
            let style = if status.error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            frame.render_widget(Paragraph::new(status.text.as_str()).style(style), status_area);
        }

        render_action_bar(frame, action_area, s.pane, s.searching);
        s.areas.action_bar = action_area;

        if s.show_help {
            render_help(frame, area, &s.help_lines);
        }
    })?;
    Ok(())
}

fn render_action_bar(frame: &mut ratatui::Frame, area: Rect, pane: Pane, searching: bool) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let actions = actions_for(pane);

    let key_style = Style::default().fg(Color::Black).bg(Color::DarkGray).add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(Color::DarkGray);
    let active_key_style = Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD);
    let active_label_style = Style::default().fg(Color::White);

    let (ks, ls) = if searching {
        (key_style, label_style)
    } else {
        (active_key_style, active_label_style)
    };

    let y = area.y;
    let mut x = area.x;
    for &(key, desc) in &actions {
        if x > area.x {
            x += 1;
        }
        for (ch, style) in format!(" {key} ")
            .chars()
            .map(|c| (c, ks))
            .chain(format!(" {desc}").chars().map(|c| (c, ls)))
        {
            if x >= area.right() {
                break;
            }
            if let Some(c) = frame.buffer_mut().cell_mut((x, y)) {
                c.set_char(ch);
                c.set_style(style);
            }
            x += 1;
        }
    }
}

fn render_help(frame: &mut ratatui::Frame, area: Rect, lines: &[String]) {
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
    let popup = centered_rect(width, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" help ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    for (i, line) in lines.iter().take(inner.height as usize).enumerate() {
        let style = if line.starts_with("  ") || line.is_empty() {
            Style::default()
        } else {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        };
        frame.render_widget(
            Paragraph::new(line.as_str()).style(style),
            Rect::new(inner.x + 1, inner.y + i as u16, inner.width.saturating_sub(1), 1),
        );
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn action_bar_hit<'a>(x: u16, y: u16, area: Rect, actions: &[(&'a str, &str)]) -> Option<&'a str> {
    if y != area.y || x < area.x || x >= area.right() {
        return None;
    }
    let rel_x = (x - area.x) as usize;
    let mut pos = 0;
    for &(key, desc) in actions {
        if pos > 0 {
            pos += 1;
        }
        let total = key.chars().count() + 2 + desc.chars().count() + 1;
        if rel_x >= pos && rel_x < pos + total {
            return Some(key);
        }
        pos += total;
    }
    None
}

fn build_help_lines(policy: FocusPolicy) -> Vec<String> {
    let arrows = match policy {
        FocusPolicy::HandOff => "  Up/Down     Move (crosses into the other list)",
        FocusPolicy::Wrap => "  Up/Down     Move (wraps within the list)",
    };
    vec![
        "Osmose preset browser".into(),
        "".into(),
        "Global:".into(),
        "  1 2 3 4     Focus pane by number".into(),
        "  Tab         Next pane".into(),
        "  Shift+Tab   Previous pane".into(),
        "  < ,  > .    Previous / next MIDI port".into(),
        "  /           Search name and characters".into(),
        "  Esc         Clear search".into(),
        "  ?           This help".into(),
        "  q           Quit".into(),
        "".into(),
        "Pack and type filters:".into(),
        arrows.into(),
        "  Space/Enter Toggle checkbox".into(),
        "".into(),
        "Presets:".into(),
        "  Up/Down     Select row".into(),
        "  PgUp/PgDn   Page".into(),
        "  Left/Right  Pick column".into(),
        "  s           Sort by column (again to reverse)".into(),
        "  x           Clear sort".into(),
        "  Enter       Send preset to the device".into(),
        "".into(),
        "Mouse:".into(),
        "  Click       Toggle checkboxes, select rows, sort headers".into(),
        "  Scroll      Move through lists".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::preset;
    use crate::midi::{MidiConnection, PortError};
    use crate::query::SortKey;
    use crossterm::event::MouseEvent;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingOut {
        sent: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    struct RecordingConn {
        sent: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl MidiConnection for RecordingConn {
        fn send(&mut self, message: &[u8]) -> Result<(), PortError> {
            self.sent.borrow_mut().push(message.to_vec());
            Ok(())
        }

        fn close(self: Box<Self>) {}
    }

    impl MidiOut for RecordingOut {
        fn list_outputs(&self) -> Result<Vec<String>, PortError> {
            Ok(vec!["Osmose".into(), "Thru".into()])
        }

        fn open(&self, _port_name: &str) -> Result<Box<dyn MidiConnection>, PortError> {
            Ok(Box::new(RecordingConn {
                sent: self.sent.clone(),
            }))
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_presets(vec![
            preset("factory", "keys", 30, 4, "aerials"),
            preset("factory", "pads", 30, 9, "drift"),
            preset("exp", "pads", 7, 112, "glow"),
        ])
    }

    fn state<'c>(
        catalog: &'c Catalog,
        dir: &tempfile::TempDir,
    ) -> (State<'c>, Rc<RefCell<Vec<Vec<u8>>>>) {
        state_with_config(catalog, dir, "settle_delay_ms = 0\n")
    }

    fn state_with_config<'c>(
        catalog: &'c Catalog,
        dir: &tempfile::TempDir,
        config: &str,
    ) -> (State<'c>, Rc<RefCell<Vec<Vec<u8>>>>) {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, config).unwrap();
        let sent = Rc::new(RefCell::new(Vec::new()));
        let out = RecordingOut { sent: sent.clone() };
        let ports = out.list_outputs().unwrap();
        let s = State::new(catalog, Config::load(&path), Box::new(out), ports);
        (s, sent)
    }

    fn press(s: &mut State, code: KeyCode) {
        process_event(
            s,
            Event::Key(crossterm::event::KeyEvent::new(code, KeyModifiers::NONE)),
        );
    }

    fn mouse(s: &mut State, kind: MouseEventKind, column: u16, row: u16) {
        process_event(
            s,
            Event::Mouse(MouseEvent {
                kind,
                column,
                row,
                modifiers: KeyModifiers::NONE,
            }),
        );
    }

    fn click(s: &mut State, column: u16, row: u16) {
        mouse(s, MouseEventKind::Down(MouseButton::Left), column, row);
    }

    /// One pack, eight types: taller than a three-row filter pane.
    fn many_types() -> Catalog {
        Catalog::from_presets(
            (0..8u8)
                .map(|i| preset("factory", &format!("t{i}"), 1, i, &format!("p{i}")))
                .collect(),
        )
    }

    #[test]
    fn starts_with_nothing_checked_and_no_rows() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (s, _) = state(&catalog, &dir);
        assert!(s.grid.rows.is_empty());
        assert_eq!(s.pane, Pane::Pack);
        assert_eq!(s.ports.current(), Some("Osmose"));
    }

    #[test]
    fn checking_all_in_both_groups_shows_every_preset() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (mut s, _) = state(&catalog, &dir);

        // "all" of pack, then hand off down through the pack items into type.
        press(&mut s, KeyCode::Char(' '));
        assert!(s.grid.rows.is_empty());
        for _ in 0..s.packs.len() {
            press(&mut s, KeyCode::Down);
        }
        assert_eq!(s.pane, Pane::Type);
        assert_eq!(
            Control::from_position(s.focus.index_in(TYPE_GROUP)),
            Control::All
        );
        press(&mut s, KeyCode::Char(' '));
        assert_eq!(s.grid.rows.len(), 3);

        // Uncheck "keys".
        press(&mut s, KeyCode::Down);
        press(&mut s, KeyCode::Enter);
        assert!(!s.types.all().is_checked());
        let names: Vec<&str> = s.grid.rows.iter().map(|r| r[4].as_str()).collect();
        assert_eq!(names, ["drift", "glow"]);
    }

    #[test]
    fn sort_and_search_keys_update_rows() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (mut s, _) = state(&catalog, &dir);
        s.toggle_check(PACK_GROUP, 0);
        s.toggle_check(TYPE_GROUP, 0);

        press(&mut s, KeyCode::Char('4'));
        assert_eq!(s.pane, Pane::Presets);
        for _ in 0..3 {
            press(&mut s, KeyCode::Right);
        }
        press(&mut s, KeyCode::Char('s'));
        press(&mut s, KeyCode::Char('s'));
        let pgms: Vec<&str> = s.grid.rows.iter().map(|r| r[3].as_str()).collect();
        assert_eq!(pgms, ["112", "9", "4"]);
        press(&mut s, KeyCode::Char('x'));
        assert!(s.session.sort().is_empty());

        press(&mut s, KeyCode::Char('/'));
        for c in "GL".chars() {
            press(&mut s, KeyCode::Char(c));
        }
        assert_eq!(s.grid.rows.len(), 3);
        press(&mut s, KeyCode::Enter);
        assert!(!s.searching);
        assert_eq!(s.grid.rows.len(), 1);
        press(&mut s, KeyCode::Esc);
        assert_eq!(s.grid.rows.len(), 3);
    }

    #[test]
    fn enter_sends_bank_then_program() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (mut s, sent) = state(&catalog, &dir);
        s.toggle_check(PACK_GROUP, 0);
        s.toggle_check(TYPE_GROUP, 0);
        s.set_pane(Pane::Presets);
        press(&mut s, KeyCode::Down);
        press(&mut s, KeyCode::Enter);

        assert_eq!(*sent.borrow(), vec![vec![0xB0, 0x00, 30], vec![0xC0, 9]]);
        assert!(s.status.as_ref().is_some_and(|st| !st.error));
    }

    #[test]
    fn port_change_is_saved() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (mut s, _) = state(&catalog, &dir);
        press(&mut s, KeyCode::Char('>'));
        assert_eq!(s.ports.current(), Some("Thru"));

        let reloaded = Config::load(&dir.path().join("config.toml"));
        assert_eq!(reloaded.selected_midi_port(), Some("Thru"));
        assert_eq!(reloaded.settle_delay(), Duration::ZERO);
    }

    #[test]
    fn action_bar_hit_counts_chars() {
        let actions = [("⏎", "send"), ("s", "sort")];
        let area = Rect::new(0, 5, 80, 1);
        assert_eq!(action_bar_hit(0, 5, area, &actions), Some("⏎"));
        assert_eq!(action_bar_hit(7, 5, area, &actions), Some("⏎"));
        assert_eq!(action_bar_hit(8, 5, area, &actions), None);
        assert_eq!(action_bar_hit(10, 5, area, &actions), Some("s"));
        assert_eq!(action_bar_hit(10, 4, area, &actions), None);
    }

    #[test]
    fn click_in_scrolled_inactive_filter_toggles_the_drawn_row() {
        let catalog = many_types();
        let dir = tempfile::tempdir().unwrap();
        let (mut s, _) = state(&catalog, &dir);

        // Leave the type cursor low in the list, then move to the pack pane.
        s.focus.focus(TYPE_GROUP, 6);
        s.set_pane(Pane::Pack);
        let inner = Rect::new(0, 10, 20, 3);
        s.areas.type_inner = inner;

        let entries = check_entries(&s.types);
        let mut buf = ratatui::buffer::Buffer::empty(inner);
        ratatui::widgets::Widget::render(
            CheckList::new(&entries)
                .anchor(s.focus.index_in(TYPE_GROUP))
                .focused(None),
            inner,
            &mut buf,
        );
        let drawn: String = (inner.x..inner.right())
            .map(|x| buf[(x, inner.y)].symbol().to_string())
            .collect();
        assert!(drawn.starts_with("[ ] t3"), "{drawn}");

        click(&mut s, 2, inner.y);
        let checked: Vec<&str> = s
            .types
            .items()
            .iter()
            .filter(|c| c.is_checked())
            .map(|c| c.label())
            .collect();
        assert_eq!(checked, ["t3"]);
        assert_eq!(s.pane, Pane::Type);
        assert_eq!(s.session.filters().types(), ["t3"]);
    }

    #[test]
    fn header_click_toggles_sort_and_body_click_selects() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (mut s, _) = state(&catalog, &dir);
        s.toggle_check(PACK_GROUP, 0);
        s.toggle_check(TYPE_GROUP, 0);
        s.areas.table_inner = Rect::new(0, 20, 80, 10);

        click(&mut s, 1, 20);
        assert_eq!(s.pane, Pane::Presets);
        assert_eq!(s.session.sort().keys(), [SortKey::asc(Field::Pack)]);
        click(&mut s, 1, 20);
        assert_eq!(s.session.sort().keys(), [SortKey::desc(Field::Pack)]);
        let packs: Vec<&str> = s.grid.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(packs, ["factory", "factory", "exp"]);

        click(&mut s, 1, 23);
        assert_eq!(s.table.selected_row(), Some(2));
        mouse(&mut s, MouseEventKind::ScrollUp, 1, 23);
        assert_eq!(s.table.selected_row(), Some(1));
    }

    #[test]
    fn wheel_over_filter_moves_its_cursor() {
        let catalog = many_types();
        let dir = tempfile::tempdir().unwrap();
        let (mut s, _) = state(&catalog, &dir);
        s.areas.type_inner = Rect::new(0, 10, 20, 3);

        mouse(&mut s, MouseEventKind::ScrollDown, 2, 11);
        mouse(&mut s, MouseEventKind::ScrollDown, 2, 11);
        assert_eq!(s.pane, Pane::Type);
        assert_eq!(s.focus.index_in(TYPE_GROUP), 2);
        assert!(s.types.selected_labels().is_empty());
    }

    #[test]
    fn help_describes_configured_focus_policy() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (s, _) = state_with_config(&catalog, &dir, "focus_policy = \"wrap\"\n");
        assert!(s.help_lines.iter().any(|l| l.contains("wraps within the list")));
        assert!(!s.help_lines.iter().any(|l| l.contains("crosses")));

        let (s, _) = state(&catalog, &dir);
        assert!(s.help_lines.iter().any(|l| l.contains("crosses into the other list")));
    }

    #[test]
    fn only_name_and_characters_columns_are_searchable() {
        let catalog = catalog();
        let dir = tempfile::tempdir().unwrap();
        let (s, _) = state(&catalog, &dir);
        let searchable: Vec<&str> = table_columns(&s)
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.title)
            .collect();
        assert_eq!(searchable, [Field::Name.name(), Field::Characters.name()]);
    }
}
