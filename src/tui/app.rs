use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::gesture::{BoardAction, KanbanBoard, PointerEvent};
use crate::io::config_io;
use crate::io::storage::LocalStorage;
use crate::model::{Column, Todo, UiConfig, ViewMode};
use crate::ops::validate;
use crate::service;
use crate::store::{AuthSnapshot, AuthStore, ThemeStore, TodoSnapshot, TodoStore, ViewStore};

use super::input;
use super::render;
use super::text_field::TextField;
use super::theme::Theme;

/// Poll interval while something animates or a request is in flight
const FRAME: Duration = Duration::from_millis(16);
/// Poll interval when idle
const IDLE: Duration = Duration::from_millis(250);
/// Longest frame step fed to the animations, so a stall doesn't teleport cards
const MAX_FRAME_STEP: Duration = Duration::from_millis(50);

/// Which top-level screen is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// The persisted session is still being checked
    Loading,
    Auth,
    Todos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Email,
    Password,
    Confirm,
}

/// Sign-in / sign-up form state
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: TextField,
    pub password: TextField,
    pub confirm: TextField,
    pub focus: AuthField,
    /// Inline validation message; service errors come from the auth store
    pub error: Option<String>,
}

impl Default for AuthForm {
    fn default() -> Self {
        AuthForm {
            mode: AuthMode::SignIn,
            email: TextField::new(),
            password: TextField::masked(),
            confirm: TextField::masked(),
            focus: AuthField::Email,
            error: None,
        }
    }
}

impl AuthForm {
    /// Fields shown in the current mode, top to bottom
    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::SignIn => &[AuthField::Email, AuthField::Password],
            AuthMode::SignUp => &[AuthField::Email, AuthField::Password, AuthField::Confirm],
        }
    }

    pub fn field(&self, field: AuthField) -> &TextField {
        match field {
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
            AuthField::Confirm => &self.confirm,
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextField {
        match self.focus {
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
            AuthField::Confirm => &mut self.confirm,
        }
    }

    pub fn focus_next(&mut self) {
        self.move_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(self.fields().len() - 1);
    }

    fn move_focus(&mut self, step: usize) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + step) % fields.len()];
    }

    /// Flip between sign-in and sign-up, keeping the email
    pub fn switch_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.password.clear();
        self.confirm.clear();
        self.focus = AuthField::Email;
        self.error = None;
    }
}

/// Modal dialog over the todo screen
#[derive(Debug, Clone)]
pub enum Dialog {
    Add {
        field: TextField,
        error: Option<String>,
    },
    Edit {
        id: String,
        field: TextField,
        error: Option<String>,
    },
    /// Delete confirmation. `on_board` dialogs belong to a kanban card's
    /// delete animation; the board decides what confirm/cancel do.
    Delete {
        id: String,
        title: String,
        on_board: bool,
    },
}

/// Clickable region recorded during the last render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    /// Kanban card; receives the whole pointer gesture
    Card(String),
    /// List row body: opens the edit dialog
    Row(String),
    Checkbox(String),
    RemoveButton(String),
    AddButton,
    ViewMode(ViewMode),
    ThemeToggle,
    SignOut,
    DialogConfirm,
    DialogCancel,
    AuthField(AuthField),
    AuthSubmit,
    AuthSwitch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hitbox {
    pub area: Rect,
    pub target: HitTarget,
}

/// Store operation requested by the UI, run on the async runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    SignIn { email: String, password: String },
    SignUp { email: String, password: String, confirm: String },
    SignOut,
    Fetch,
    Add(String),
    Toggle(String),
    Remove(String),
    Edit { id: String, title: String },
    ClearTodoError,
    ClearAuthError,
    /// Forget the previous user's todos
    ClearTodos,
}

/// Outcome of a spawned request the UI has to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    RemoveFailed(String),
}

/// Main application state
pub struct App {
    pub auth: AuthSnapshot,
    pub todos: TodoSnapshot,
    pub form: AuthForm,
    pub dialog: Option<Dialog>,
    pub board: KanbanBoard,
    /// Id of the todo under the keyboard cursor
    pub selected: Option<String>,
    pub view_store: ViewStore,
    pub theme_store: ThemeStore,
    pub theme: Theme,
    pub ui: UiConfig,
    /// Rebuilt on every render, topmost last
    pub hitboxes: Vec<Hitbox>,
    pub should_quit: bool,
    requests: Vec<Request>,
}

impl App {
    pub fn new(ui: UiConfig, view_store: ViewStore, theme_store: ThemeStore) -> Self {
        let theme = Theme::from_config(&ui, theme_store.is_dark());
        App {
            auth: AuthSnapshot::default(),
            todos: TodoSnapshot::default(),
            form: AuthForm::default(),
            dialog: None,
            board: KanbanBoard::new(),
            selected: None,
            view_store,
            theme_store,
            theme,
            ui,
            hitboxes: Vec::new(),
            should_quit: false,
            requests: Vec::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        if !self.auth.initialized {
            Screen::Loading
        } else if self.auth.session.is_some() {
            Screen::Todos
        } else {
            Screen::Auth
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_store.view_mode()
    }

    pub fn is_dark(&self) -> bool {
        self.theme_store.is_dark()
    }

    pub fn is_loading(&self) -> bool {
        self.auth.is_loading || self.todos.is_loading
    }

    /// True while the loop should run at frame rate
    pub fn needs_frames(&self) -> bool {
        self.is_loading() || self.board.is_animating()
    }

    pub fn push(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    // -----------------------------------------------------------------------
    // Store snapshots
    // -----------------------------------------------------------------------

    pub fn set_auth(&mut self, snapshot: AuthSnapshot) {
        let before = self.auth.user().map(|u| u.id.clone());
        let after = snapshot.user().map(|u| u.id.clone());
        self.auth = snapshot;
        if before == after {
            return;
        }
        tracing::debug!(?before, ?after, "session user changed");
        self.board = KanbanBoard::new();
        self.dialog = None;
        self.selected = None;
        self.push(Request::ClearTodos);
        if after.is_some() {
            self.form = AuthForm::default();
            self.push(Request::Fetch);
        }
    }

    pub fn set_todos(&mut self, snapshot: TodoSnapshot) {
        self.todos = snapshot;
        self.board
            .retain_cards(self.todos.todos.iter().map(|t| t.id.as_str()));

        // Dialogs about todos that are gone close with them
        let stale = match &self.dialog {
            Some(Dialog::Edit { id, .. }) | Some(Dialog::Delete { id, .. }) => {
                self.todos.find(id).is_none()
            }
            _ => false,
        };
        if stale {
            self.dialog = None;
        }
        self.fix_selection();
    }

    pub fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::RemoveFailed(id) => self.board.restore(&id),
        }
    }

    // -----------------------------------------------------------------------
    // Frame clock and pointer
    // -----------------------------------------------------------------------

    pub fn tick(&mut self, now: Instant, dt: Duration) {
        let actions = self.board.tick(now, dt.min(MAX_FRAME_STEP));
        self.apply_board_actions(actions);
    }

    /// Feed one pointer event to the kanban board
    pub fn pointer(&mut self, target: Option<&str>, event: PointerEvent, now: Instant) {
        if let (Some(id), PointerEvent::Down(_)) = (target, event) {
            self.selected = Some(id.to_string());
        }
        let actions = self.board.pointer(target, event, now);
        self.apply_board_actions(actions);
    }

    /// Abort any gesture in progress (focus loss, resize)
    pub fn cancel_pointer(&mut self, now: Instant) {
        self.pointer(None, PointerEvent::Cancel, now);
    }

    fn apply_board_actions(&mut self, actions: Vec<BoardAction>) {
        for action in actions {
            match action {
                BoardAction::Toggle(id) => self.push(Request::Toggle(id)),
                BoardAction::Remove(id) => self.push(Request::Remove(id)),
                BoardAction::Edit(id) => self.open_edit(&id),
            }
        }
        self.sync_board_dialog();
    }

    /// Mirror the board's pending delete confirmation into the dialog slot
    fn sync_board_dialog(&mut self) {
        match (self.board.pending_delete(), &self.dialog) {
            (Some(id), None) => {
                let title = self
                    .todos
                    .find(id)
                    .map(|t| t.title.clone())
                    .unwrap_or_default();
                self.dialog = Some(Dialog::Delete {
                    id: id.to_string(),
                    title,
                    on_board: true,
                });
            }
            (None, Some(Dialog::Delete { on_board: true, .. })) => self.dialog = None,
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Dialogs
    // -----------------------------------------------------------------------

    pub fn open_add(&mut self) {
        self.dialog = Some(Dialog::Add {
            field: TextField::new(),
            error: None,
        });
    }

    pub fn open_edit(&mut self, id: &str) {
        let Some(todo) = self.todos.find(id) else {
            return;
        };
        self.dialog = Some(Dialog::Edit {
            id: id.to_string(),
            field: TextField::with_text(&todo.title),
            error: None,
        });
    }

    /// Ask before deleting. In the kanban view the card animates out after
    /// confirmation; in the list view the row is removed directly.
    pub fn open_delete(&mut self, id: &str) {
        let Some(todo) = self.todos.find(id) else {
            return;
        };
        match self.view_mode() {
            ViewMode::Kanban => {
                self.board.request_delete(id);
                self.sync_board_dialog();
            }
            ViewMode::List => {
                self.dialog = Some(Dialog::Delete {
                    id: id.to_string(),
                    title: todo.title.clone(),
                    on_board: false,
                });
            }
        }
    }

    /// Enter / the primary dialog button
    pub fn submit_dialog(&mut self) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        match dialog {
            Dialog::Add { field, .. } => match validate::todo_title(field.text()) {
                Ok(title) => self.push(Request::Add(title)),
                Err(e) => {
                    self.dialog = Some(Dialog::Add {
                        field,
                        error: Some(e.to_string()),
                    })
                }
            },
            Dialog::Edit { id, field, .. } => match validate::todo_title(field.text()) {
                Ok(title) => self.push(Request::Edit { id, title }),
                Err(e) => {
                    self.dialog = Some(Dialog::Edit {
                        id,
                        field,
                        error: Some(e.to_string()),
                    })
                }
            },
            Dialog::Delete { id, on_board, .. } => {
                if on_board {
                    self.board.confirm_delete();
                } else {
                    self.push(Request::Remove(id));
                }
            }
        }
    }

    /// Esc / the Cancel button
    pub fn cancel_dialog(&mut self) {
        if let Some(Dialog::Delete { on_board: true, .. }) = self.dialog {
            self.board.cancel_delete();
        }
        self.dialog = None;
    }

    /// The text field of an open add/edit dialog
    pub fn dialog_field_mut(&mut self) -> Option<&mut TextField> {
        match &mut self.dialog {
            Some(Dialog::Add { field, error }) | Some(Dialog::Edit { field, error, .. }) => {
                *error = None;
                Some(field)
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Auth form
    // -----------------------------------------------------------------------

    pub fn submit_auth(&mut self) {
        let form = &self.form;
        let result = match form.mode {
            AuthMode::SignIn => validate::sign_in_form(form.email.text(), form.password.text())
                .map(|email| Request::SignIn {
                    email,
                    password: form.password.text().to_string(),
                }),
            AuthMode::SignUp => validate::sign_up_form(
                form.email.text(),
                form.password.text(),
                form.confirm.text(),
            )
            .map(|email| Request::SignUp {
                email,
                password: form.password.text().to_string(),
                confirm: form.confirm.text().to_string(),
            }),
        };
        match result {
            Ok(request) => {
                self.form.error = None;
                self.push(request);
            }
            Err(e) => self.form.error = Some(e.to_string()),
        }
    }

    pub fn switch_auth_mode(&mut self) {
        self.form.switch_mode();
        self.push(Request::ClearAuthError);
    }

    /// Inline validation first, then the auth store's last failure
    pub fn auth_error(&self) -> Option<&str> {
        self.form.error.as_deref().or(self.auth.error.as_deref())
    }

    // -----------------------------------------------------------------------
    // Todo screen actions
    // -----------------------------------------------------------------------

    pub fn toggle_view(&mut self) {
        match self.view_store.toggle_view_mode() {
            Ok(mode) => tracing::debug!(view = mode.as_str(), "view mode changed"),
            Err(e) => tracing::warn!(error = %e, "failed to save view preference"),
        }
        self.fix_selection();
    }

    pub fn set_view(&mut self, mode: ViewMode) {
        if let Err(e) = self.view_store.set_view_mode(mode) {
            tracing::warn!(error = %e, "failed to save view preference");
        }
        self.fix_selection();
    }

    pub fn toggle_theme(&mut self) {
        if let Err(e) = self.theme_store.toggle_theme() {
            tracing::warn!(error = %e, "failed to save theme preference");
        }
        self.theme = Theme::from_config(&self.ui, self.is_dark());
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected.clone() {
            self.push(Request::Toggle(id));
        }
    }

    pub fn edit_selected(&mut self) {
        if let Some(id) = self.selected.clone() {
            self.open_edit(&id);
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected.clone() {
            self.open_delete(&id);
        }
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Todos of one kanban column, newest first
    pub fn column_todos(&self, column: Column) -> Vec<&Todo> {
        self.todos
            .todos
            .iter()
            .filter(|t| t.column() == column)
            .collect()
    }

    /// Cursor order for the current view
    fn navigation_order(&self) -> Vec<&Todo> {
        match self.view_mode() {
            ViewMode::List => self.todos.todos.iter().collect(),
            ViewMode::Kanban => match self.selected_column() {
                Some(column) => self.column_todos(column),
                None => Vec::new(),
            },
        }
    }

    pub fn selected_todo(&self) -> Option<&Todo> {
        self.selected.as_deref().and_then(|id| self.todos.find(id))
    }

    pub fn selected_column(&self) -> Option<Column> {
        self.selected_todo().map(Todo::column)
    }

    /// Move the cursor by `delta` rows within the current list or column
    pub fn move_selection(&mut self, delta: isize) {
        let order = self.navigation_order();
        if order.is_empty() {
            return;
        }
        let idx = self
            .selected
            .as_deref()
            .and_then(|id| order.iter().position(|t| t.id == id))
            .unwrap_or(0);
        let next = idx.saturating_add_signed(delta).min(order.len() - 1);
        self.selected = Some(order[next].id.clone());
    }

    /// Jump to the other kanban column, keeping the row where possible
    pub fn select_column(&mut self, column: Column) {
        let row = self
            .selected_column()
            .zip(self.selected.as_deref())
            .and_then(|(current, id)| {
                self.column_todos(current).iter().position(|t| t.id == id)
            })
            .unwrap_or(0);
        let target = self.column_todos(column);
        if let Some(todo) = target.get(row).or(target.last()) {
            self.selected = Some(todo.id.clone());
        }
    }

    fn fix_selection(&mut self) {
        if self.selected_todo().is_some() {
            return;
        }
        self.selected = match self.view_mode() {
            ViewMode::List => self.todos.todos.first(),
            ViewMode::Kanban => self
                .column_todos(Column::Pending)
                .first()
                .or(self.column_todos(Column::Completed).first())
                .copied(),
        }
        .map(|t| t.id.clone());
    }

    /// Convert a terminal cell to gesture coordinates
    pub fn cell_to_point(&self, column: u16, row: u16) -> crate::gesture::Point {
        crate::gesture::Point::new(
            f32::from(column) * self.ui.cell_width,
            f32::from(row) * self.ui.cell_height,
        )
    }

    /// Topmost hitbox containing the cell
    pub fn hit_test(&self, column: u16, row: u16) -> Option<&HitTarget> {
        self.hitboxes
            .iter()
            .rev()
            .find(|h| {
                column >= h.area.x
                    && column < h.area.x + h.area.width
                    && row >= h.area.y
                    && row < h.area.y + h.area.height
            })
            .map(|h| &h.target)
    }
}

// ---------------------------------------------------------------------------
// Runtime wiring
// ---------------------------------------------------------------------------

/// Runs requests against the stores on the tokio runtime
struct Workers {
    handle: Handle,
    auth: Arc<AuthStore>,
    todos: Arc<TodoStore>,
    done: mpsc::UnboundedSender<Completion>,
    in_flight: Arc<AtomicUsize>,
}

impl Workers {
    fn busy(&self) -> bool {
        self.in_flight.load(Ordering::Relaxed) > 0
    }

    fn dispatch(&self, request: Request) {
        match request {
            Request::ClearTodoError => self.todos.clear_error(),
            Request::ClearAuthError => self.auth.clear_error(),
            Request::ClearTodos => self.todos.clear(),
            request => self.spawn(request),
        }
    }

    /// Run an async store operation. Failures are recorded in the store
    /// snapshots; only a failed removal needs a reply.
    fn spawn(&self, request: Request) {
        let auth = Arc::clone(&self.auth);
        let todos = Arc::clone(&self.todos);
        let done = self.done.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(?request, "dispatching");
        self.handle.spawn(async move {
            match request {
                Request::SignIn { email, password } => {
                    let _ = auth.sign_in(&email, &password).await;
                }
                Request::SignUp {
                    email,
                    password,
                    confirm,
                } => {
                    let _ = auth.sign_up(&email, &password, &confirm).await;
                }
                Request::SignOut => {
                    let _ = auth.sign_out().await;
                }
                Request::Fetch => {
                    let _ = todos.fetch_all().await;
                }
                Request::Add(title) => {
                    let _ = todos.add(&title).await;
                }
                Request::Toggle(id) => {
                    let _ = todos.toggle(&id).await;
                }
                Request::Remove(id) => {
                    if todos.remove(&id).await.is_err() {
                        let _ = done.send(Completion::RemoveFailed(id));
                    }
                }
                Request::Edit { id, title } => {
                    let _ = todos.edit(&id, &title).await;
                }
                Request::ClearTodoError | Request::ClearAuthError | Request::ClearTodos => {}
            }
            in_flight.fetch_sub(1, Ordering::Relaxed);
        });
    }
}

pub fn run(home: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_io::load_config(home)?;
    let services = service::connect(&config, home)?;
    let runtime = crate::runtime()?;

    let auth = Arc::new(AuthStore::new(Arc::clone(&services.auth)));
    let todos = Arc::new(TodoStore::new(Arc::clone(&services.todos)));
    let storage = LocalStorage::new(home);
    let mut app = App::new(
        config.ui.clone(),
        ViewStore::open(Some(storage.clone())),
        ThemeStore::open(Some(storage)),
    );

    // Session restore runs behind the loading screen
    {
        let auth = Arc::clone(&auth);
        runtime.spawn(async move { auth.initialize().await });
    }

    let (done_tx, done_rx) = mpsc::unbounded_channel();
    let workers = Workers {
        handle: runtime.handle().clone(),
        auth,
        todos,
        done: done_tx,
        in_flight: Arc::new(AtomicUsize::new(0)),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &workers, done_rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    workers: &Workers,
    mut done_rx: mpsc::UnboundedReceiver<Completion>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut auth_rx = workers.auth.subscribe();
    let mut todo_rx = workers.todos.subscribe();
    let mut last_frame = Instant::now();

    loop {
        if auth_rx.has_changed().unwrap_or(false) {
            let snapshot = auth_rx.borrow_and_update().clone();
            app.set_auth(snapshot);
        }
        if todo_rx.has_changed().unwrap_or(false) {
            let snapshot = todo_rx.borrow_and_update().clone();
            app.set_todos(snapshot);
        }
        while let Ok(completion) = done_rx.try_recv() {
            app.on_completion(completion);
        }

        let now = Instant::now();
        app.tick(now, now - last_frame);
        last_frame = now;

        for request in app.take_requests() {
            workers.dispatch(request);
        }

        terminal.draw(|frame| render::render(frame, app))?;

        let timeout = if app.needs_frames() || workers.busy() {
            FRAME
        } else {
            IDLE
        };
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse, Instant::now()),
                Event::Paste(text) => input::handle_paste(app, &text),
                Event::FocusLost | Event::Resize(..) => app.cancel_pointer(Instant::now()),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Session, User};
    use crate::tui::render::test_helpers::{app_with_todos, signed_in, todo};
    use chrono::Utc;

    #[test]
    fn screen_follows_auth_state() {
        let mut app = App::new(UiConfig::default(), ViewStore::open(None), ThemeStore::open(None));
        assert_eq!(app.screen(), Screen::Loading);

        app.set_auth(AuthSnapshot {
            initialized: true,
            ..Default::default()
        });
        assert_eq!(app.screen(), Screen::Auth);
        // Signed-out startup has nothing to fetch
        assert!(app.take_requests().is_empty());

        app.set_auth(signed_in("u1"));
        assert_eq!(app.screen(), Screen::Todos);
        assert_eq!(app.take_requests(), vec![Request::ClearTodos, Request::Fetch]);

        // Token refresh for the same user refetches nothing
        let mut refreshed = signed_in("u1");
        if let Some(session) = refreshed.session.as_mut() {
            session.access_token = "new".into();
        }
        app.set_auth(refreshed);
        assert!(app.take_requests().is_empty());
    }

    #[test]
    fn sign_out_resets_todo_screen() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        app.open_edit("a");
        app.set_auth(AuthSnapshot {
            initialized: true,
            ..Default::default()
        });
        assert!(app.dialog.is_none());
        assert!(app.selected.is_none());
        assert_eq!(app.take_requests(), vec![Request::ClearTodos]);
        assert_eq!(app.screen(), Screen::Auth);
    }

    #[test]
    fn add_dialog_validates_before_requesting() {
        let mut app = app_with_todos(vec![]);
        app.open_add();
        app.submit_dialog();
        match &app.dialog {
            Some(Dialog::Add { error, .. }) => {
                assert_eq!(error.as_deref(), Some("Todo title cannot be empty"))
            }
            other => panic!("expected add dialog, got {:?}", other),
        }
        assert!(app.take_requests().is_empty());

        if let Some(field) = app.dialog_field_mut() {
            field.insert_str("  Buy milk  ");
        }
        app.submit_dialog();
        assert!(app.dialog.is_none());
        assert_eq!(app.take_requests(), vec![Request::Add("Buy milk".into())]);
    }

    #[test]
    fn edit_dialog_is_prefilled() {
        let mut app = app_with_todos(vec![todo("a", "Walk dog", false)]);
        app.open_edit("a");
        match &app.dialog {
            Some(Dialog::Edit { field, .. }) => assert_eq!(field.text(), "Walk dog"),
            other => panic!("expected edit dialog, got {:?}", other),
        }
        if let Some(field) = app.dialog_field_mut() {
            field.insert_str(" twice");
        }
        app.submit_dialog();
        assert_eq!(
            app.take_requests(),
            vec![Request::Edit {
                id: "a".into(),
                title: "Walk dog twice".into()
            }]
        );
    }

    #[test]
    fn list_delete_removes_after_confirm() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        app.open_delete("a");
        assert!(matches!(
            app.dialog,
            Some(Dialog::Delete { on_board: false, .. })
        ));
        app.cancel_dialog();
        assert!(app.take_requests().is_empty());

        app.open_delete("a");
        app.submit_dialog();
        assert_eq!(app.take_requests(), vec![Request::Remove("a".into())]);
    }

    #[test]
    fn kanban_delete_fades_then_removes() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        app.set_view(ViewMode::Kanban);
        app.open_delete("a");
        match &app.dialog {
            Some(Dialog::Delete { title, on_board, .. }) => {
                assert_eq!(title, "Buy milk");
                assert!(on_board);
            }
            other => panic!("expected delete dialog, got {:?}", other),
        }
        app.submit_dialog();
        assert!(app.dialog.is_none());
        // Nothing is removed until the fade finishes
        assert!(app.take_requests().is_empty());

        let mut now = Instant::now();
        for _ in 0..30 {
            now += FRAME;
            app.tick(now, FRAME);
        }
        assert_eq!(app.take_requests(), vec![Request::Remove("a".into())]);

        // A failed removal brings the card back
        app.on_completion(Completion::RemoveFailed("a".into()));
        for _ in 0..60 {
            now += FRAME;
            app.tick(now, FRAME);
        }
        assert!(!app.board.transform("a").deleting);
    }

    #[test]
    fn kanban_cancel_closes_board_dialog() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        app.set_view(ViewMode::Kanban);
        app.open_delete("a");
        app.cancel_dialog();
        assert!(app.dialog.is_none());
        assert_eq!(app.board.pending_delete(), None);
    }

    #[test]
    fn vanished_todo_closes_its_dialog() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        app.open_edit("a");
        app.set_todos(TodoSnapshot::default());
        assert!(app.dialog.is_none());
        assert!(app.selected.is_none());
    }

    #[test]
    fn kanban_selection_moves_between_columns() {
        let mut app = app_with_todos(vec![
            todo("p1", "one", false),
            todo("c1", "two", true),
            todo("p2", "three", false),
        ]);
        app.set_view(ViewMode::Kanban);
        app.selected = Some("p2".into());
        app.select_column(Column::Completed);
        assert_eq!(app.selected.as_deref(), Some("c1"));
        app.move_selection(1);
        assert_eq!(app.selected.as_deref(), Some("c1"));
        app.select_column(Column::Pending);
        assert_eq!(app.selected.as_deref(), Some("p1"));
        app.move_selection(1);
        assert_eq!(app.selected.as_deref(), Some("p2"));
    }

    #[test]
    fn auth_form_validates_inline() {
        let mut app = App::new(UiConfig::default(), ViewStore::open(None), ThemeStore::open(None));
        app.form.switch_mode();
        app.form.email.insert_str("ada@example.com");
        app.form.password.insert_str("secret1");
        app.form.confirm.insert_str("secret2");
        app.submit_auth();
        assert_eq!(app.auth_error(), Some("Passwords don't match"));
        assert_eq!(app.take_requests(), vec![Request::ClearAuthError]);

        app.form.confirm.clear();
        app.form.confirm.insert_str("secret1");
        app.submit_auth();
        assert_eq!(app.auth_error(), None);
        assert_eq!(
            app.take_requests(),
            vec![Request::SignUp {
                email: "ada@example.com".into(),
                password: "secret1".into(),
                confirm: "secret1".into(),
            }]
        );
    }

    #[test]
    fn store_error_shows_on_auth_form() {
        let mut app = App::new(UiConfig::default(), ViewStore::open(None), ThemeStore::open(None));
        app.set_auth(AuthSnapshot {
            initialized: true,
            error: Some("Invalid login credentials".into()),
            ..Default::default()
        });
        assert_eq!(app.auth_error(), Some("Invalid login credentials"));
    }

    #[test]
    fn focus_cycles_through_visible_fields() {
        let mut form = AuthForm::default();
        form.focus_next();
        assert_eq!(form.focus, AuthField::Password);
        form.focus_next();
        assert_eq!(form.focus, AuthField::Email);
        form.focus_prev();
        assert_eq!(form.focus, AuthField::Password);
        form.switch_mode();
        form.focus_prev();
        assert_eq!(form.focus, AuthField::Confirm);
    }

    #[test]
    fn theme_toggle_swaps_palette() {
        let mut app = app_with_todos(vec![]);
        assert!(app.is_dark());
        app.toggle_theme();
        assert!(!app.is_dark());
        assert_eq!(app.theme, Theme::light());
    }

    #[test]
    fn session_with_other_user_refetches() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        app.take_requests();
        let session = Session {
            access_token: "t".into(),
            refresh_token: "r".into(),
            expires_at: Utc::now(),
            user: User {
                id: "u2".into(),
                email: None,
            },
        };
        app.set_auth(AuthSnapshot {
            session: Some(session),
            initialized: true,
            ..Default::default()
        });
        assert_eq!(app.take_requests(), vec![Request::ClearTodos, Request::Fetch]);
    }
}
