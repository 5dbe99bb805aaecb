use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::watcher::TreeWatcher;
use crate::io::{config_io, logging, paths};
use crate::model::{Pane, Topic, Workspace};
use crate::ops::{Hangar, OpsError};
use crate::session::{SessionControl, TmuxSessions};
use crate::worker::Worker;

use super::input;
use super::render;
use super::theme::Theme;

/// What a text prompt will do with its input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    NewTopic,
    NewWorkspace(Topic),
    RenameTopic(Topic),
    RenameWorkspace(Workspace),
    MoveWorkspace(Workspace),
    Describe(Workspace),
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::NewTopic => "new topic",
            PromptKind::NewWorkspace(_) => "new workspace",
            PromptKind::RenameTopic(_) => "rename topic",
            PromptKind::RenameWorkspace(_) => "rename workspace",
            PromptKind::MoveWorkspace(_) => "move to topic",
            PromptKind::Describe(_) => "description",
        }
    }
}

/// What a y/n confirmation will delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmKind {
    DeleteTopic(Topic),
    DeleteWorkspace(Workspace),
}

/// Current interaction mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Prompt { kind: PromptKind, input: String },
    Confirm(ConfirmKind),
}

/// Messages from background work back to the event loop
#[derive(Debug)]
pub enum UiEvent {
    /// Live session window counts, by short path
    Sessions(HashMap<String, usize>),
    /// A refresh is taking a while
    Loading,
    /// Refreshing has gone quiet
    Settled,
    /// The tree was re-read from disk
    Reloaded,
    /// A mutation finished
    Done {
        message: String,
        warnings: Vec<String>,
    },
    /// A session is ready to attach
    Attach(String),
    Failed(String),
}

/// Bottom-row message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct App {
    pub hangar: Hangar,
    worker: Worker,
    tx: Sender<UiEvent>,
    rx: Receiver<UiEvent>,
    pub theme: Theme,
    pub mode: Mode,
    pub pane: Pane,
    pub topics: Vec<Topic>,
    pub workspaces: Vec<Workspace>,
    pub topic_cursor: usize,
    pub workspace_cursor: usize,
    /// Window counts of live sessions, by short path
    pub sessions: HashMap<String, usize>,
    pub loading: bool,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    /// Session to attach once the terminal is released
    pub attach: Option<String>,
}

impl App {
    pub fn new(hangar: Hangar, worker: Worker, theme: Theme) -> Self {
        let (tx, rx) = mpsc::channel();
        let local = hangar.local.get();
        let mut app = App {
            hangar,
            worker,
            tx,
            rx,
            theme,
            mode: Mode::Navigate,
            pane: local.last_pane,
            topics: Vec::new(),
            workspaces: Vec::new(),
            topic_cursor: 0,
            workspace_cursor: 0,
            sessions: HashMap::new(),
            loading: false,
            status: None,
            should_quit: false,
            attach: None,
        };
        app.refresh_lists();
        if let Some(last) = local.last_topic
            && let Some(idx) = app.topics.iter().position(|t| t.name == last)
        {
            app.topic_cursor = idx;
            app.refresh_lists();
        }
        if let Some(selected) = app.hangar.workspaces.selected()
            && let Some(idx) = app.workspaces.iter().position(|w| *w == selected)
        {
            app.workspace_cursor = idx;
        }
        app.request_sessions();
        app
    }

    pub fn current_topic(&self) -> Option<&Topic> {
        self.topics.get(self.topic_cursor)
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.workspaces.get(self.workspace_cursor)
    }

    /// Re-read both lists from the in-memory indexes, keeping cursors in range.
    pub fn refresh_lists(&mut self) {
        self.topics = self.hangar.topics.all();
        self.topic_cursor = self.topic_cursor.min(self.topics.len().saturating_sub(1));
        self.workspaces = match self.topics.get(self.topic_cursor) {
            Some(topic) => self.hangar.workspaces.for_topic(&topic.name),
            None => Vec::new(),
        };
        self.workspace_cursor = self
            .workspace_cursor
            .min(self.workspaces.len().saturating_sub(1));
    }

    /// Move the cursor in the focused pane and schedule a session refresh.
    pub fn move_cursor(&mut self, delta: isize) {
        match self.pane {
            Pane::Topics => {
                let next = step(self.topic_cursor, delta, self.topics.len());
                if next != self.topic_cursor {
                    self.topic_cursor = next;
                    self.workspace_cursor = 0;
                    self.refresh_lists();
                }
            }
            Pane::Workspaces => {
                self.workspace_cursor = step(self.workspace_cursor, delta, self.workspaces.len());
            }
        }
        self.request_sessions();
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Topics => Pane::Workspaces,
            Pane::Workspaces => Pane::Topics,
        };
    }

    /// Ask the worker for fresh session state. Bursts of navigation collapse
    /// into a few refreshes.
    pub fn request_sessions(&self) {
        let workspaces = self.hangar.workspaces.clone();
        let refresh_tx = self.tx.clone();
        let finish_tx = self.tx.clone();
        let load_tx = self.tx.clone();
        self.worker.debounce_load(
            move || {
                let outcome = workspaces.status(None);
                let counts = outcome
                    .value
                    .into_iter()
                    .filter_map(|s| Some((s.workspace.short_path(), s.session?.windows)))
                    .collect();
                let _ = refresh_tx.send(UiEvent::Sessions(counts));
            },
            move || {
                let _ = finish_tx.send(UiEvent::Settled);
            },
            move || {
                let _ = load_tx.send(UiEvent::Loading);
            },
        );
    }

    /// Re-scan the tree once external changes stop arriving.
    pub fn request_reload(&self) {
        let workspaces = self.hangar.workspaces.clone();
        let tx = self.tx.clone();
        self.worker.debounce(move || {
            let event = match workspaces.reload() {
                Ok(()) => UiEvent::Reloaded,
                Err(e) => UiEvent::Failed(e.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    /// Run a mutation on the worker; its result comes back as an event.
    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce(&Hangar) -> Result<(String, Vec<String>), OpsError> + Send + 'static,
    {
        let hangar = self.hangar.clone();
        let tx = self.tx.clone();
        self.worker.queue(move || {
            let event = match f(&hangar) {
                Ok((message, warnings)) => UiEvent::Done { message, warnings },
                Err(e) => UiEvent::Failed(e.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    /// Start (or reuse) the workspace's session, then leave the loop to attach.
    pub fn open_session(&self, ws: Workspace) {
        let hangar = self.hangar.clone();
        let tx = self.tx.clone();
        self.worker.queue(move || {
            let event = match hangar.workspaces.ensure_session(&ws) {
                Ok(name) => UiEvent::Attach(name),
                Err(e) => UiEvent::Failed(e.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    /// Apply every event that background work has sent so far.
    pub fn process_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            count += 1;
        }
        count
    }

    /// Block for at most `timeout` waiting for one event, then apply it.
    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(event);
                true
            }
            Err(_) => false,
        }
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Sessions(counts) => self.sessions = counts,
            UiEvent::Loading => self.loading = true,
            UiEvent::Settled => self.loading = false,
            UiEvent::Reloaded => {
                self.refresh_lists();
                self.request_sessions();
            }
            UiEvent::Done { message, warnings } => {
                self.refresh_lists();
                self.request_sessions();
                self.status = Some(match warnings.first() {
                    Some(w) => StatusMessage {
                        text: format!("{} (warning: {})", message, w),
                        is_error: true,
                    },
                    None => StatusMessage {
                        text: message,
                        is_error: false,
                    },
                });
            }
            UiEvent::Attach(name) => {
                self.attach = Some(name);
                self.should_quit = true;
            }
            UiEvent::Failed(text) => {
                self.status = Some(StatusMessage {
                    text,
                    is_error: true,
                });
            }
        }
    }

    /// Remember the focused topic, pane and workspace for next time.
    pub fn save_local_state(&self) {
        if self.pane == Pane::Workspaces
            && let Some(ws) = self.current_workspace()
            && let Err(e) = self.hangar.workspaces.select(ws)
        {
            tracing::warn!(error = %e, "could not save selection");
        }
        let last_topic = self.current_topic().map(|t| t.name.clone());
        let pane = self.pane;
        if let Err(e) = self.hangar.local.update(|c| {
            c.last_topic = last_topic;
            c.last_pane = pane;
        }) {
            tracing::warn!(error = %e, "could not save local state");
        }
    }
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}

pub fn run(root_flag: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let global = config_io::global_config()?;
    let ui = global.get().ui;
    let root = paths::resolve_root(root_flag, global.get().root.as_deref());
    let _log_guard = logging::init_file(&root, &ui.log_level);
    if let Err(e) = config_io::touch_update_check(&global) {
        tracing::warn!(error = %e, "could not record update check");
    }

    let sessions: std::sync::Arc<dyn SessionControl> = std::sync::Arc::new(TmuxSessions::new());
    let hangar = Hangar::open(&root, sessions)?;
    let worker = Worker::from_config(&ui)?;
    let mut app = App::new(hangar, worker, Theme::from_config(&ui));

    let mut watcher = match TreeWatcher::start(&root) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "file watching disabled");
            None
        }
    };

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    loop {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = run_event_loop(&mut terminal, &mut app, watcher.as_mut());

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result?;

        match app.attach.take() {
            Some(session) => {
                if let Err(e) = app.hangar.workspaces.attach(&session) {
                    app.status = Some(StatusMessage {
                        text: e.to_string(),
                        is_error: true,
                    });
                }
                app.should_quit = false;
                app.request_sessions();
            }
            None => break,
        }
    }

    app.save_local_state();
    Ok(())
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut watcher: Option<&mut TreeWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.process_events();
        if let Some(w) = watcher.as_deref_mut() {
            if !w.poll().is_empty() {
                app.request_reload();
            }
            let topic_dirs: Vec<_> = app.topics.iter().map(Topic::path).collect();
            w.rewatch(&app.hangar.root, &topic_dirs);
        }

        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
