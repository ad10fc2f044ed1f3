#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::config::Config;
use crate::core::date;
use crate::task::model::{Priority, Task};
use crate::task::storage::TaskStore;
use crate::tui;
use crate::tui::theme::Theme;

const DEADLINE_HINT: &str = "Examples: today, tomorrow, next week, Jan 2";

#[derive(Debug, Clone)]
struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    fn new(initial: impl Into<String>) -> Self {
        let text = initial.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn as_str(&self) -> &str {
        &self.text
    }

    fn insert_char(&mut self, c: char) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        chars.insert(cur, c);
        self.text = chars.into_iter().collect();
        self.cursor = cur + 1;
    }

    fn backspace(&mut self) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur == 0 {
            return;
        }
        chars.remove(cur - 1);
        self.text = chars.into_iter().collect();
        self.cursor = cur - 1;
    }

    fn delete(&mut self) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur >= chars.len() {
            return;
        }
        chars.remove(cur);
        self.text = chars.into_iter().collect();
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        let len = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(len);
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Cursor position as (line, column), for multi-line buffers.
    fn line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for (i, c) in self.text.chars().enumerate() {
            if i == self.cursor {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    until: Instant,
}

impl Toast {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            until: Instant::now() + Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputKind {
    New,
    // Edit targets reference the task by id and re-fetch on confirm, so the
    // dialog never aliases the cached list entry.
    Edit { id: String },
}

#[derive(Debug, Clone)]
struct InputDialog {
    kind: InputKind,
    input: TextInput,
}

impl InputDialog {
    fn new_task() -> Self {
        Self {
            kind: InputKind::New,
            input: TextInput::new(""),
        }
    }

    fn edit_task(task: &Task) -> Self {
        Self {
            kind: InputKind::Edit {
                id: task.id.clone(),
            },
            input: TextInput::new(task.content.clone()),
        }
    }
}

#[derive(Debug, Clone)]
struct DeadlineDialog {
    task_id: String,
    input: TextInput,
}

#[derive(Debug, Clone)]
struct PriorityDialog {
    task_id: String,
    cursor: usize,
}

impl PriorityDialog {
    fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            cursor: usize::from(task.priority.rank()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineChoice {
    Today,
    Tomorrow,
    NextWeek,
    Custom,
    Clear,
}

impl DeadlineChoice {
    fn label(self) -> &'static str {
        match self {
            DeadlineChoice::Today => "Today",
            DeadlineChoice::Tomorrow => "Tomorrow",
            DeadlineChoice::NextWeek => "Next week",
            DeadlineChoice::Custom => "Custom...",
            DeadlineChoice::Clear => "Clear deadline",
        }
    }

    fn keyword(self) -> Option<&'static str> {
        match self {
            DeadlineChoice::Today => Some("today"),
            DeadlineChoice::Tomorrow => Some("tomorrow"),
            DeadlineChoice::NextWeek => Some("next week"),
            DeadlineChoice::Custom | DeadlineChoice::Clear => None,
        }
    }
}

#[derive(Debug, Clone)]
struct DeadlineMenuDialog {
    task_id: String,
    cursor: usize,
    options: Vec<DeadlineChoice>,
}

impl DeadlineMenuDialog {
    /// The option list is computed once from the task: the clear entry only
    /// exists when there is a deadline to clear.
    fn for_task(task: &Task) -> Self {
        let mut options = vec![
            DeadlineChoice::Today,
            DeadlineChoice::Tomorrow,
            DeadlineChoice::NextWeek,
            DeadlineChoice::Custom,
        ];
        if task.deadline.is_some() {
            options.push(DeadlineChoice::Clear);
        }
        Self {
            task_id: task.id.clone(),
            cursor: 0,
            options,
        }
    }
}

#[derive(Debug, Clone)]
enum Mode {
    List,
    Input(InputDialog),
    DeadlineInput(DeadlineDialog),
    PriorityMenu(PriorityDialog),
    DeadlineMenu(DeadlineMenuDialog),
}

struct AppState {
    cfg: Config,
    theme: Theme,
    store: TaskStore,

    show_archived: bool,
    tasks: Vec<Task>,
    cursor: usize,
    scroll: usize,
    // Rows that fit the list area; updated during draw so key handlers can
    // keep the cursor inside the visible window.
    visible_rows: usize,

    mode: Mode,

    toast: Option<Toast>,
    last_error: Option<String>,
    should_quit: bool,
}

impl AppState {
    fn new(cfg: Config, store: TaskStore) -> Self {
        let theme = Theme::from_ui(&cfg.ui);
        Self {
            cfg,
            theme,
            store,
            show_archived: false,
            tasks: Vec::new(),
            cursor: 0,
            scroll: 0,
            visible_rows: 1,
            mode: Mode::List,
            toast: None,
            last_error: None,
            should_quit: false,
        }
    }

    /// Rebuilds the in-memory cache from the store and re-derives the sort
    /// order. The cache is never written back; the store is the only
    /// persistence authority.
    fn reload(&mut self) {
        match self.store.list(self.show_archived) {
            Ok(mut tasks) => {
                sort_tasks(&mut tasks);
                self.tasks = tasks;
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
        self.clamp_view();
    }

    fn clamp_view(&mut self) {
        self.cursor = clamp_index(self.cursor, self.tasks.len());
        if self.scroll > self.cursor {
            self.scroll = self.cursor;
        }
    }

    fn selected(&self) -> Option<&Task> {
        self.tasks.get(self.cursor)
    }

    fn selected_id(&self) -> Option<String> {
        self.selected().map(|t| t.id.clone())
    }

    fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.scroll = adjust_scroll(self.cursor, self.scroll, self.visible_rows);
        }
    }

    fn move_down(&mut self) {
        if self.cursor + 1 < self.tasks.len() {
            self.cursor += 1;
            self.scroll = adjust_scroll(self.cursor, self.scroll, self.visible_rows);
        }
    }

    fn fail(&mut self, err: impl ToString) {
        self.last_error = Some(err.to_string());
    }
}

/// Display order: incomplete before completed, then priority (High first),
/// then earlier deadlines before later ones before none, then most recently
/// created first. Re-derived from scratch on every load, never persisted.
fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.completed_at
            .is_some()
            .cmp(&b.completed_at.is_some())
            .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
            .then_with(|| match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn clamp_index(cursor: usize, len: usize) -> usize {
    if len == 0 { 0 } else { cursor.min(len - 1) }
}

/// Minimal shift that brings the cursor back into the visible window; the
/// scroll offset never changes on in-window movement.
fn adjust_scroll(cursor: usize, scroll: usize, visible: usize) -> usize {
    let visible = visible.max(1);
    if cursor < scroll {
        cursor
    } else if cursor >= scroll + visible {
        cursor + 1 - visible
    } else {
        scroll
    }
}

pub fn run(cfg: Config, store: TaskStore) -> anyhow::Result<()> {
    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard::new(terminal);

    let mut app = AppState::new(cfg, store);
    app.reload();

    loop {
        if let Some(toast) = &app.toast
            && Instant::now() >= toast.until
        {
            app.toast = None;
        }

        {
            let Some(terminal) = guard.terminal.as_mut() else {
                anyhow::bail!("terminal unavailable");
            };
            terminal.draw(|f| draw(f, &mut app))?;
        }

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
        {
            handle_key(key, &mut app);
        }
    }

    Ok(())
}

fn handle_key(key: KeyEvent, app: &mut AppState) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        app.should_quit = true;
        return;
    }

    // Taking the mode out lets handlers both consume the dialog and put it
    // (or a successor) back.
    let mode = std::mem::replace(&mut app.mode, Mode::List);
    match mode {
        Mode::List => handle_list_key(key, app),
        Mode::Input(dialog) => handle_input_key(key, app, dialog),
        Mode::DeadlineInput(dialog) => handle_deadline_input_key(key, app, dialog),
        Mode::PriorityMenu(dialog) => handle_priority_menu_key(key, app, dialog),
        Mode::DeadlineMenu(dialog) => handle_deadline_menu_key(key, app, dialog),
    }
}

fn handle_list_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Char('n') => app.mode = Mode::Input(InputDialog::new_task()),
        KeyCode::Char('e') => {
            if let Some(task) = app.selected() {
                app.mode = Mode::Input(InputDialog::edit_task(task));
            }
        }
        KeyCode::Char(' ') => {
            if let Some(id) = app.selected_id() {
                with_task(app, &id, |t| {
                    if t.completed_at.is_some() {
                        t.uncomplete();
                    } else {
                        t.complete();
                    }
                });
            }
        }
        KeyCode::Char('a') => {
            if let Some(id) = app.selected_id() {
                let unarchive = app.show_archived;
                with_task(app, &id, |t| {
                    if unarchive {
                        t.unarchive();
                    } else {
                        t.archive();
                    }
                });
            }
        }
        KeyCode::Char('D') => {
            if let Some(id) = app.selected_id() {
                match app.store.delete(&id) {
                    Ok(()) => {
                        app.last_error = None;
                        app.toast = Some(Toast::info("task deleted"));
                    }
                    Err(e) => app.fail(e),
                }
                app.reload();
            }
        }
        KeyCode::Char('p') => {
            if let Some(task) = app.selected() {
                app.mode = Mode::PriorityMenu(PriorityDialog::for_task(task));
            }
        }
        KeyCode::Char('d') => {
            if let Some(task) = app.selected() {
                app.mode = Mode::DeadlineMenu(DeadlineMenuDialog::for_task(task));
            }
        }
        KeyCode::Tab => {
            app.show_archived = !app.show_archived;
            app.cursor = 0;
            app.scroll = 0;
            app.reload();
        }
        _ => {}
    }
}

fn handle_input_key(key: KeyEvent, app: &mut AppState, mut dialog: InputDialog) {
    match key.code {
        KeyCode::Esc => {} // discard, back to the list
        KeyCode::Enter
            if key.modifiers.contains(KeyModifiers::SHIFT)
                || key.modifiers.contains(KeyModifiers::ALT) =>
        {
            dialog.input.insert_char('\n');
            app.mode = Mode::Input(dialog);
        }
        KeyCode::Enter => {
            let content = dialog.input.as_str();
            // Empty content is a no-op, not a delete.
            if !content.trim().is_empty() {
                match &dialog.kind {
                    InputKind::New => {
                        let task = Task::new(content);
                        if let Err(e) = app.store.save(&task) {
                            app.fail(e);
                        } else {
                            app.last_error = None;
                        }
                        app.reload();
                    }
                    InputKind::Edit { id } => {
                        let id = id.clone();
                        with_task(app, &id, |t| t.set_content(content));
                    }
                }
            }
        }
        _ => {
            handle_text_input_key(key, &mut dialog.input);
            app.mode = Mode::Input(dialog);
        }
    }
}

fn handle_deadline_input_key(key: KeyEvent, app: &mut AppState, mut dialog: DeadlineDialog) {
    match key.code {
        KeyCode::Esc => {}
        KeyCode::Enter => {
            let text = dialog.input.as_str().trim().to_owned();
            let now = OffsetDateTime::now_utc();
            let parsed = date::parse(&text, now);
            if parsed.is_none() && !text.is_empty() && !text.eq_ignore_ascii_case("none") {
                app.toast = Some(Toast::info(format!("deadline '{text}' not understood")));
            }
            with_task(app, &dialog.task_id.clone(), |t| t.set_deadline(parsed));
        }
        _ => {
            handle_text_input_key(key, &mut dialog.input);
            app.mode = Mode::DeadlineInput(dialog);
        }
    }
}

fn handle_priority_menu_key(key: KeyEvent, app: &mut AppState, mut dialog: PriorityDialog) {
    match key.code {
        KeyCode::Esc => {}
        KeyCode::Up | KeyCode::Char('k') => {
            dialog.cursor = dialog.cursor.saturating_sub(1);
            app.mode = Mode::PriorityMenu(dialog);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            dialog.cursor = (dialog.cursor + 1).min(Priority::ALL.len() - 1);
            app.mode = Mode::PriorityMenu(dialog);
        }
        KeyCode::Enter => {
            let priority = Priority::ALL[dialog.cursor.min(Priority::ALL.len() - 1)];
            with_task(app, &dialog.task_id.clone(), |t| t.set_priority(priority));
        }
        _ => app.mode = Mode::PriorityMenu(dialog),
    }
}

fn handle_deadline_menu_key(key: KeyEvent, app: &mut AppState, mut dialog: DeadlineMenuDialog) {
    let max = dialog.options.len().saturating_sub(1);
    match key.code {
        KeyCode::Esc => {}
        KeyCode::Up | KeyCode::Char('k') => {
            dialog.cursor = dialog.cursor.saturating_sub(1);
            app.mode = Mode::DeadlineMenu(dialog);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            dialog.cursor = (dialog.cursor + 1).min(max);
            app.mode = Mode::DeadlineMenu(dialog);
        }
        KeyCode::Enter => match dialog.options[dialog.cursor.min(max)] {
            choice @ (DeadlineChoice::Today | DeadlineChoice::Tomorrow | DeadlineChoice::NextWeek) => {
                let now = OffsetDateTime::now_utc();
                let deadline = choice.keyword().and_then(|kw| date::parse(kw, now));
                with_task(app, &dialog.task_id.clone(), |t| t.set_deadline(deadline));
            }
            DeadlineChoice::Custom => {
                app.mode = Mode::DeadlineInput(DeadlineDialog {
                    task_id: dialog.task_id,
                    input: TextInput::new(""),
                });
            }
            DeadlineChoice::Clear => {
                with_task(app, &dialog.task_id.clone(), |t| t.set_deadline(None));
            }
        },
        _ => app.mode = Mode::DeadlineMenu(dialog),
    }
}

fn handle_text_input_key(key: KeyEvent, input: &mut TextInput) {
    match key.code {
        KeyCode::Char(c) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT)
            {
                input.insert_char(c);
            }
        }
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        _ => {}
    }
}

/// Re-fetches the task from the store, applies the mutation, persists, and
/// rebuilds the cache. Every store result is observed: failures land in the
/// footer instead of being dropped.
fn with_task(app: &mut AppState, id: &str, mutate: impl FnOnce(&mut Task)) {
    match app.store.load(id) {
        Ok(mut task) => {
            mutate(&mut task);
            match app.store.save(&task) {
                Ok(()) => app.last_error = None,
                Err(e) => app.fail(e),
            }
        }
        Err(e) => app.fail(e),
    }
    app.reload();
}

fn draw(f: &mut Frame<'_>, app: &mut AppState) {
    let area = f.area();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, root[0], app);
    draw_list(f, root[1], app);
    draw_stats(f, root[2], app);
    draw_footer(f, root[3], app);

    match &app.mode {
        Mode::List => {}
        Mode::Input(dialog) => draw_input_popup(f, area, app, dialog),
        Mode::DeadlineInput(dialog) => draw_deadline_popup(f, area, app, dialog),
        Mode::PriorityMenu(dialog) => draw_priority_popup(f, area, app, dialog),
        Mode::DeadlineMenu(dialog) => draw_deadline_menu_popup(f, area, app, dialog),
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let title = "◆ invar";
    let (active_style, archived_style) = if app.show_archived {
        (
            Style::default().fg(theme.muted),
            Style::default()
                .fg(theme.dark)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Style::default()
                .fg(theme.dark)
                .bg(theme.accent)
                .add_modifier(Modifier::BOLD),
            Style::default().fg(theme.muted),
        )
    };

    let right_len = " Active ".len() + " Archived ".len() + 1;
    let gap = (area.width as usize)
        .saturating_sub(title.chars().count() + 1 + right_len)
        .max(1);

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(gap)),
        Span::styled(" Active ", active_style),
        Span::raw(" "),
        Span::styled(" Archived ", archived_style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_list(f: &mut Frame<'_>, area: Rect, app: &mut AppState) {
    // Each task card is two content lines plus a spacer.
    app.visible_rows = (area.height as usize / 3).max(1);
    app.scroll = adjust_scroll(app.cursor, app.scroll, app.visible_rows);

    let theme = app.theme;
    if app.tasks.is_empty() {
        let msg = if app.show_archived {
            "No archived tasks."
        } else {
            "No tasks. Press n to create one."
        };
        let p = Paragraph::new(Line::from(Span::styled(
            msg,
            Style::default().fg(theme.muted),
        )));
        f.render_widget(p, area);
        return;
    }

    let now = OffsetDateTime::now_utc();
    let width = area.width as usize;
    let end = (app.scroll + app.visible_rows).min(app.tasks.len());

    let mut lines: Vec<Line> = Vec::new();
    for i in app.scroll..end {
        let task = &app.tasks[i];
        let selected = i == app.cursor;
        let completed = task.completed_at.is_some();
        let overdue = task.is_overdue(now);

        let bullet = if completed {
            Span::styled("✓", Style::default().fg(theme.low))
        } else if selected {
            Span::styled("●", Style::default().fg(theme.accent))
        } else {
            Span::styled("○", Style::default().fg(theme.muted))
        };

        let deadline_text = task.deadline.map(format_deadline).map(|d| {
            if overdue { format!("! {d}") } else { d }
        });
        let deadline_len = deadline_text.as_deref().map_or(0, |d| d.chars().count());

        let content_max = width.saturating_sub(2 + deadline_len + 3).max(8);
        let content = truncate(task.first_line(), content_max);
        let content_style = if completed {
            Style::default()
                .fg(theme.muted)
                .add_modifier(Modifier::CROSSED_OUT)
        } else if selected {
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.fg)
        };

        let used = 2 + content.chars().count();
        let gap = width.saturating_sub(used + deadline_len).max(1);

        let mut line1 = vec![bullet, Span::raw(" "), Span::styled(content, content_style)];
        if let Some(d) = deadline_text {
            line1.push(Span::raw(" ".repeat(gap)));
            let style = if overdue {
                Style::default().fg(theme.high).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.muted)
            };
            line1.push(Span::styled(d, style));
        }
        lines.push(Line::from(line1));

        let pill = Span::styled(
            priority_label(task.priority),
            Style::default()
                .fg(theme.dark)
                .bg(theme.priority_color(task.priority))
                .add_modifier(Modifier::BOLD),
        );
        let mut line2 = vec![Span::raw("  "), pill];
        if overdue {
            line2.push(Span::raw("  "));
            line2.push(Span::styled(
                "overdue",
                Style::default().fg(theme.high).add_modifier(Modifier::BOLD),
            ));
        }
        lines.push(Line::from(line2));
        lines.push(Line::default());
    }

    f.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn draw_stats(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let now = OffsetDateTime::now_utc();
    let total = app.tasks.len();
    let pending = app
        .tasks
        .iter()
        .filter(|t| t.completed_at.is_none())
        .count();
    let overdue = app.tasks.iter().filter(|t| t.is_overdue(now)).count();

    let text = format!("{total} tasks · {pending} pending · {overdue} overdue");
    let p = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(app.theme.muted),
    )));
    f.render_widget(p, area);
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let line = if let Some(err) = &app.last_error {
        Line::from(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(theme.high).add_modifier(Modifier::BOLD),
        ))
    } else if let Some(toast) = &app.toast {
        Line::from(Span::styled(
            toast.message.clone(),
            Style::default().fg(theme.accent),
        ))
    } else if app.cfg.ui.help_bar {
        let help = match &app.mode {
            Mode::List => {
                "n new  e edit  space complete  p priority  d deadline  a archive  D delete  tab switch  q quit"
            }
            Mode::Input(_) => "Enter save · Shift+Enter newline · Esc cancel",
            Mode::DeadlineInput(_) => "Enter save · Esc cancel",
            Mode::PriorityMenu(_) | Mode::DeadlineMenu(_) => {
                "↑/↓ navigate · Enter select · Esc cancel"
            }
        };
        Line::from(Span::styled(help, Style::default().fg(theme.muted)))
    } else {
        Line::default()
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_input_popup(f: &mut Frame<'_>, area: Rect, app: &AppState, dialog: &InputDialog) {
    let title = match dialog.kind {
        InputKind::New => "New Task",
        InputKind::Edit { .. } => "Edit Task",
    };
    let popup = popup_rect(60, 9, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.accent))
        .title(title);
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let text = Paragraph::new(dialog.input.as_str()).style(Style::default().fg(app.theme.fg));
    f.render_widget(text, chunks[0]);

    let hint = Paragraph::new(Span::styled(
        "Enter to save · Shift+Enter for new line · Esc to cancel",
        Style::default().fg(app.theme.muted),
    ));
    f.render_widget(hint, chunks[1]);

    set_input_cursor(f, chunks[0], &dialog.input);
}

fn draw_deadline_popup(f: &mut Frame<'_>, area: Rect, app: &AppState, dialog: &DeadlineDialog) {
    let popup = popup_rect(60, 7, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.accent))
        .title("Set Deadline");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let hint = Paragraph::new(Span::styled(
        DEADLINE_HINT,
        Style::default().fg(app.theme.muted),
    ));
    f.render_widget(hint, chunks[0]);

    let text = Paragraph::new(dialog.input.as_str()).style(Style::default().fg(app.theme.fg));
    f.render_widget(text, chunks[2]);

    set_input_cursor(f, chunks[2], &dialog.input);
}

fn draw_priority_popup(f: &mut Frame<'_>, area: Rect, app: &AppState, dialog: &PriorityDialog) {
    let popup = popup_rect(30, 7, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.accent))
        .title("Priority");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::new();
    for (i, priority) in Priority::ALL.iter().enumerate() {
        let pill = Span::styled(
            priority_label(*priority),
            Style::default()
                .fg(app.theme.dark)
                .bg(app.theme.priority_color(*priority))
                .add_modifier(Modifier::BOLD),
        );
        let marker = if i == dialog.cursor { "▸ " } else { "  " };
        lines.push(Line::from(vec![Span::raw(marker), pill]));
    }
    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn draw_deadline_menu_popup(
    f: &mut Frame<'_>,
    area: Rect,
    app: &AppState,
    dialog: &DeadlineMenuDialog,
) {
    let height = u16::try_from(dialog.options.len()).unwrap_or(5) + 2;
    let popup = popup_rect(30, height, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.accent))
        .title("Deadline");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::new();
    for (i, choice) in dialog.options.iter().enumerate() {
        let line = if i == dialog.cursor {
            Line::from(Span::styled(
                format!("▸ {}", choice.label()),
                Style::default()
                    .fg(app.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                format!("  {}", choice.label()),
                Style::default().fg(app.theme.fg),
            ))
        };
        lines.push(line);
    }
    f.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn set_input_cursor(f: &mut Frame<'_>, area: Rect, input: &TextInput) {
    let (line, col) = input.line_col();
    let x = area.x.saturating_add(u16::try_from(col).unwrap_or(u16::MAX));
    let y = area.y.saturating_add(u16::try_from(line).unwrap_or(u16::MAX));
    if x < area.x + area.width && y < area.y + area.height {
        f.set_cursor_position((x, y));
    }
}

fn popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => " HIGH ",
        Priority::Medium => " MED ",
        Priority::Low => " LOW ",
    }
}

fn format_deadline(deadline: OffsetDateTime) -> String {
    let format = format_description!("[month repr:short] [day]");
    deadline.format(&format).unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_owned();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

struct TerminalGuard {
    terminal: Option<ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>>,
}

impl TerminalGuard {
    fn new(
        terminal: ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> Self {
        Self {
            terminal: Some(terminal),
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = tui::restore_terminal(terminal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn task_at(content: &str, created: OffsetDateTime) -> Task {
        let mut task = Task::new(content);
        task.created_at = created;
        task.updated_at = created;
        task
    }

    #[test]
    fn sort_puts_completed_last_then_priority_then_deadline() {
        let t0 = datetime!(2026-08-20 10:00 UTC);
        let today = datetime!(2026-08-23 23:59 UTC);
        let tomorrow = datetime!(2026-08-24 23:59 UTC);

        let a = task_at("a medium no deadline", t0);

        let mut b = task_at("b high tomorrow", t0);
        b.priority = Priority::High;
        b.deadline = Some(tomorrow);

        let mut c = task_at("c high today", t0);
        c.priority = Priority::High;
        c.deadline = Some(today);

        let mut d = task_at("d completed high", t0);
        d.priority = Priority::High;
        d.completed_at = Some(t0);

        let mut tasks = vec![a.clone(), b.clone(), c.clone(), d.clone()];
        sort_tasks(&mut tasks);

        let order: Vec<&str> = tasks.iter().map(|t| t.first_line()).collect();
        assert_eq!(
            order,
            vec![
                "c high today",
                "b high tomorrow",
                "a medium no deadline",
                "d completed high"
            ]
        );
    }

    #[test]
    fn sort_breaks_remaining_ties_by_newest_created_first() {
        let older = task_at("older", datetime!(2026-08-20 10:00 UTC));
        let newer = task_at("newer", datetime!(2026-08-22 10:00 UTC));

        let mut tasks = vec![older, newer];
        sort_tasks(&mut tasks);
        assert_eq!(tasks[0].first_line(), "newer");
        assert_eq!(tasks[1].first_line(), "older");
    }

    #[test]
    fn sort_puts_deadlined_before_undeadlined_within_priority() {
        let t0 = datetime!(2026-08-20 10:00 UTC);
        let no_deadline = task_at("none", t0);
        let mut with_deadline = task_at("soon", t0);
        with_deadline.deadline = Some(datetime!(2026-08-25 09:00 UTC));

        let mut tasks = vec![no_deadline, with_deadline];
        sort_tasks(&mut tasks);
        assert_eq!(tasks[0].first_line(), "soon");
    }

    #[test]
    fn cursor_clamps_to_last_index_or_zero() {
        assert_eq!(clamp_index(5, 3), 2);
        assert_eq!(clamp_index(2, 3), 2);
        assert_eq!(clamp_index(0, 3), 0);
        assert_eq!(clamp_index(4, 0), 0);
    }

    #[test]
    fn scroll_moves_only_when_cursor_leaves_window() {
        // in-window movement leaves the offset alone
        assert_eq!(adjust_scroll(3, 2, 4), 2);
        assert_eq!(adjust_scroll(5, 2, 4), 2);
        // cursor above the window pulls it up exactly to the cursor
        assert_eq!(adjust_scroll(1, 2, 4), 1);
        // cursor below the window shifts by the minimal amount
        assert_eq!(adjust_scroll(6, 2, 4), 3);
    }

    #[test]
    fn deadline_menu_has_four_options_without_deadline_and_five_with() {
        let mut task = Task::new("t");
        let menu = DeadlineMenuDialog::for_task(&task);
        assert_eq!(menu.options.len(), 4);
        assert!(!menu.options.contains(&DeadlineChoice::Clear));

        task.deadline = Some(datetime!(2026-09-01 00:00 UTC));
        let menu = DeadlineMenuDialog::for_task(&task);
        assert_eq!(menu.options.len(), 5);
        assert_eq!(menu.options[4], DeadlineChoice::Clear);
    }

    #[test]
    fn priority_menu_cursor_starts_on_current_priority() {
        let mut task = Task::new("t");
        task.priority = Priority::Low;
        assert_eq!(PriorityDialog::for_task(&task).cursor, 2);
        task.priority = Priority::High;
        assert_eq!(PriorityDialog::for_task(&task).cursor, 0);
    }

    #[test]
    fn text_input_handles_multiline_cursor() {
        let mut input = TextInput::new("");
        for c in "ab".chars() {
            input.insert_char(c);
        }
        input.insert_char('\n');
        input.insert_char('c');
        assert_eq!(input.as_str(), "ab\nc");
        assert_eq!(input.line_col(), (1, 1));

        input.move_home();
        assert_eq!(input.line_col(), (0, 0));
        input.backspace(); // at start, no-op
        assert_eq!(input.as_str(), "ab\nc");
    }

    #[test]
    fn deadline_hint_only_advertises_inputs_the_parser_accepts() {
        let now = datetime!(2026-08-23 12:00 UTC);
        let examples = DEADLINE_HINT
            .trim_start_matches("Examples: ")
            .split(", ");
        for example in examples {
            assert!(
                date::parse(example, now).is_some(),
                "hint example '{example}' must parse"
            );
        }
    }

    #[test]
    fn edit_dialog_targets_the_task_by_id_and_prefills_content() {
        let task = Task::new("first line\nsecond line");
        let dialog = InputDialog::edit_task(&task);
        assert_eq!(dialog.kind, InputKind::Edit { id: task.id.clone() });
        assert_eq!(dialog.input.as_str(), task.content);

        let dialog = InputDialog::new_task();
        assert_eq!(dialog.kind, InputKind::New);
        assert_eq!(dialog.input.as_str(), "");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long line", 7), "a rath…");
    }
}
