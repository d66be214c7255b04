pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use qpace::{
    app_dirs::AppDirs,
    clock::MonotonicClock,
    export::{self, ExportFormat},
    feedback::{ChannelListener, TerminalBell},
    history::{HistoryError, HistoryStore, MemoryHistory, SqliteHistory},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, PaceEvent, Runner},
    settings::{FileSettingsStore, Settings, SettingsStore},
    util::format_mmss,
    Phase, QuestionResult, Session, SessionController,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
};
use time_humanize::{Accuracy, HumanTime, Tense};

/// per-question exam pacing timer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Times each question of a practice exam, classifies your pace against a target, and keeps a history you can export as CSV or Markdown."
)]
pub struct Cli {
    /// target seconds per question for this run (defaults to the saved setting)
    #[clap(short = 't', long, value_parser = clap::value_parser!(u32).range(1..))]
    target: Option<u32>,

    /// seconds before the target at which an answer stops counting as fast
    #[clap(short = 'w', long, value_parser = clap::value_parser!(u32).range(1..))]
    warning: Option<u32>,

    /// exam name to use instead of the dated default
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// keep history in memory only; nothing is written to disk
    #[clap(long)]
    ephemeral: bool,

    /// history database to use instead of the default location
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// settings file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// list stored sessions, oldest first
    History,
    /// write a stored session as CSV or Markdown
    Export {
        /// index shown by `history`
        index: usize,
        #[clap(short = 'f', long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// output file; defaults to a dated name in the current directory
        #[clap(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// rename a stored session
    Rename { index: usize, name: String },
    /// delete a stored session
    Delete { index: usize },
    /// show or change the saved pacing settings
    Settings {
        /// new target seconds; non-numeric values are ignored
        #[clap(long)]
        target: Option<String>,
        /// new warning margin; non-numeric values are ignored
        #[clap(long)]
        warning: Option<String>,
    },
}

impl Cli {
    fn settings_store(&self) -> FileSettingsStore {
        match &self.config {
            Some(path) => FileSettingsStore::with_path(path),
            None => FileSettingsStore::new(),
        }
    }

    fn open_history(&self) -> Result<Box<dyn HistoryStore>, HistoryError> {
        if self.ephemeral {
            return Ok(Box::new(MemoryHistory::new()));
        }
        let store = match &self.db {
            Some(path) => SqliteHistory::open(path)?,
            None => SqliteHistory::open_default()?,
        };
        Ok(Box::new(store))
    }

    /// Saved settings with this run's flags laid over them
    fn effective_settings(&self, saved: Settings) -> Settings {
        Settings {
            target_seconds: self.target.unwrap_or(saved.target_seconds),
            warning_margin: self.warning.unwrap_or(saved.warning_margin),
        }
    }
}

pub type Controller = SessionController<MonotonicClock, Box<dyn HistoryStore>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Timer,
    Summary,
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    Note(u32),
    ExamName,
    HistoryName(usize),
    Target,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    pub target: EditTarget,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct HistoryState {
    pub sessions: Vec<Session>,
    pub selected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub controller: Controller,
    pub state: AppState,
    pub recorded: Receiver<QuestionResult>,
    pub last_recorded: Option<QuestionResult>,
    pub selected_row: usize,
    pub history: HistoryState,
    pub edit: Option<EditBuffer>,
    pub message: Option<String>,
    pub export_dir: PathBuf,
    /// Where in-app settings edits are saved; `None` keeps them for this run only
    pub settings_store: Option<Box<dyn SettingsStore>>,
}

impl App {
    pub fn new(controller: Controller, recorded: Receiver<QuestionResult>) -> Self {
        Self {
            controller,
            state: AppState::Timer,
            recorded,
            last_recorded: None,
            selected_row: 0,
            history: HistoryState::default(),
            edit: None,
            message: None,
            export_dir: PathBuf::from("."),
            settings_store: None,
        }
    }

    pub fn with_settings_store(mut self, store: impl SettingsStore + 'static) -> Self {
        self.settings_store = Some(Box::new(store));
        self
    }

    /// Pick up results the controller announced since the last frame
    pub fn drain_recorded(&mut self) {
        if let Some(latest) = self.recorded.try_iter().last() {
            self.last_recorded = Some(latest);
        }
    }

    pub fn on_tick(&mut self) {
        self.controller.on_tick();
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        if self.edit.is_some() {
            self.on_edit_key(key);
            return Flow::Continue;
        }
        match self.state {
            AppState::Timer => self.on_timer_key(key),
            AppState::Summary => self.on_summary_key(key),
            AppState::History => self.on_history_key(key),
        }
    }

    fn on_timer_key(&mut self, key: KeyEvent) -> Flow {
        let c = &mut self.controller;
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.last_recorded = None;
                c.toggle_pause();
            }
            KeyCode::Char(' ') => match c.phase() {
                Phase::Idle | Phase::Ended => c.start(),
                _ if c.elapsed() > 0 => c.advance(),
                _ => {}
            },
            KeyCode::Enter | KeyCode::Char('n') | KeyCode::Char('N') => c.advance(),
            KeyCode::Char('s') | KeyCode::Char('S') => c.skip(),
            KeyCode::Char('m') | KeyCode::Char('M') => c.toggle_mark(),
            KeyCode::Char('r') if key.modifiers.is_empty() => c.reset_elapsed(),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                c.end();
                if c.phase() == Phase::Ended {
                    self.show_summary();
                }
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                c.reset();
                self.last_recorded = None;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => self.show_history(),
            KeyCode::Char('t') | KeyCode::Char('w') => self.edit_setting(key.code),
            _ => {}
        }
        Flow::Continue
    }

    fn on_summary_key(&mut self, key: KeyEvent) -> Flow {
        let rows = self.controller.results().len();
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Up => self.selected_row = self.selected_row.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_row + 1 < rows {
                    self.selected_row += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(r) = self.controller.results().get(self.selected_row) {
                    self.edit = Some(EditBuffer {
                        target: EditTarget::Note(r.number),
                        text: r.note.clone(),
                    });
                }
            }
            KeyCode::Char('n') => {
                self.edit = Some(EditBuffer {
                    target: EditTarget::ExamName,
                    text: self.controller.exam_name().to_string(),
                });
            }
            KeyCode::Char('c') => self.export_current(ExportFormat::Csv),
            KeyCode::Char('d') => self.export_current(ExportFormat::Markdown),
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.controller.start();
                self.last_recorded = None;
                self.state = AppState::Timer;
            }
            KeyCode::Char('x') => {
                self.controller.reset();
                self.last_recorded = None;
                self.state = AppState::Timer;
            }
            KeyCode::Char('h') => self.show_history(),
            KeyCode::Char('t') | KeyCode::Char('w') => self.edit_setting(key.code),
            _ => {}
        }
        Flow::Continue
    }

    fn on_history_key(&mut self, key: KeyEvent) -> Flow {
        let count = self.history.sessions.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                self.state = if self.controller.phase() == Phase::Ended {
                    AppState::Summary
                } else {
                    AppState::Timer
                };
            }
            KeyCode::Up => self.history.selected = self.history.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.history.selected + 1 < count {
                    self.history.selected += 1;
                }
            }
            KeyCode::Char('d') => {
                let index = self.selected_history_index();
                if let Some(index) = index {
                    match self.controller.history_mut().delete_at(index) {
                        Ok(_) => self.message = Some(format!("deleted session {index}")),
                        Err(e) => self.report_history_error(e),
                    }
                    self.reload_history();
                }
            }
            KeyCode::Char('r') => {
                if let Some(index) = self.selected_history_index() {
                    self.edit = Some(EditBuffer {
                        target: EditTarget::HistoryName(index),
                        text: self.history.sessions[index].exam_name.clone(),
                    });
                }
            }
            KeyCode::Char('c') => self.export_history(ExportFormat::Csv),
            KeyCode::Char('k') => self.export_history(ExportFormat::Markdown),
            _ => {}
        }
        Flow::Continue
    }

    fn on_edit_key(&mut self, key: KeyEvent) {
        let Some(edit) = self.edit.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.edit = None,
            KeyCode::Backspace => {
                edit.text.pop();
            }
            KeyCode::Char(c) => edit.text.push(c),
            KeyCode::Enter => {
                if let Some(edit) = self.edit.take() {
                    self.commit_edit(edit);
                }
            }
            _ => {}
        }
    }

    fn edit_setting(&mut self, code: KeyCode) {
        let settings = self.controller.settings();
        let (target, value) = match code {
            KeyCode::Char('t') => (EditTarget::Target, settings.target_seconds),
            _ => (EditTarget::Warning, settings.warning_margin),
        };
        self.edit = Some(EditBuffer {
            target,
            text: value.to_string(),
        });
    }

    /// Apply a typed target or warning margin to the next session and save it.
    /// Input that is not a positive number is ignored.
    fn commit_setting(&mut self, target: Option<&str>, warning: Option<&str>) {
        let mut settings = self.controller.settings();
        if !settings.apply_input(target, warning) {
            self.message = Some("not a positive number; settings unchanged".into());
            return;
        }
        self.controller.apply_settings(settings);

        if let Some(store) = &self.settings_store {
            // only the edited field is written over the saved file, so
            // one-off command line overrides stay one-off
            let mut saved = store.load();
            saved.apply_input(target, warning);
            if let Err(e) = store.save(&saved) {
                tracing::warn!("settings not saved: {e}");
                self.message = Some(format!("settings not saved: {e}"));
                return;
            }
        }
        self.message = Some(format!(
            "target {} sec, warning {} sec from the next test",
            settings.target_seconds, settings.warning_margin
        ));
    }

    fn commit_edit(&mut self, edit: EditBuffer) {
        match edit.target {
            EditTarget::Target => return self.commit_setting(Some(&edit.text), None),
            EditTarget::Warning => return self.commit_setting(None, Some(&edit.text)),
            EditTarget::Note(number) => {
                self.controller.set_note(number, edit.text);
            }
            EditTarget::ExamName => self.controller.set_exam_name(edit.text),
            EditTarget::HistoryName(index) => {
                if let Err(e) = self.controller.history_mut().rename_at(index, &edit.text) {
                    self.report_history_error(e);
                }
                self.reload_history();
            }
        }
        if self.controller.last_persist_failed() {
            self.message = Some("history could not be updated; changes kept in memory".into());
        }
    }

    fn show_summary(&mut self) {
        self.selected_row = 0;
        self.state = AppState::Summary;
        if self.controller.last_persist_failed() {
            self.message = Some("history could not be saved; export to keep this session".into());
        }
    }

    fn show_history(&mut self) {
        self.reload_history();
        // newest first on screen
        self.history.selected = 0;
        self.state = AppState::History;
    }

    fn reload_history(&mut self) {
        match self.controller.history().list() {
            Ok(sessions) => self.history.sessions = sessions,
            Err(e) => self.report_history_error(e),
        }
        let count = self.history.sessions.len();
        if self.history.selected >= count {
            self.history.selected = count.saturating_sub(1);
        }
    }

    /// Storage index of the highlighted row; the list is drawn newest first
    pub fn selected_history_index(&self) -> Option<usize> {
        let count = self.history.sessions.len();
        (self.history.selected < count).then(|| count - 1 - self.history.selected)
    }

    fn export_current(&mut self, format: ExportFormat) {
        let session = self.controller.session();
        self.export(&session, format);
    }

    fn export_history(&mut self, format: ExportFormat) {
        if let Some(session) = self
            .selected_history_index()
            .and_then(|i| self.history.sessions.get(i))
            .cloned()
        {
            self.export(&session, format);
        }
    }

    fn export(&mut self, session: &Session, format: ExportFormat) {
        self.message = Some(match export::write_to_dir(session, format, &self.export_dir) {
            Ok(path) => format!("saved {}", path.display()),
            Err(e) => {
                tracing::warn!("export failed: {e}");
                format!("export failed: {e}")
            }
        });
    }

    fn report_history_error(&mut self, e: HistoryError) {
        tracing::warn!("history error: {e}");
        self.message = Some(format!("history error: {e}"));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init_file_logging(&dir));

    match cli.command.clone() {
        Some(command) => run_command(&cli, command),
        None => run_tui(&cli),
    }
}

fn run_command(cli: &Cli, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Settings { target, warning } => {
            let store = cli.settings_store();
            let mut settings = store.load();
            let changed = settings.apply_input(target.as_deref(), warning.as_deref());
            if changed {
                store.save(&settings)?;
            } else if target.is_some() || warning.is_some() {
                println!("no valid values given; settings unchanged");
            }
            println!("target:  {} sec", settings.target_seconds);
            println!("warning: {} sec", settings.warning_margin);
            println!("file:    {}", store.path().display());
        }
        Command::History => {
            let sessions = cli.open_history()?.list()?;
            if sessions.is_empty() {
                println!("No past tests found.");
            }
            for (index, session) in sessions.iter().enumerate() {
                println!("{}", history_line(index, session));
            }
        }
        Command::Export {
            index,
            format,
            output,
        } => {
            let sessions = cli.open_history()?.list()?;
            let session = sessions
                .get(index)
                .ok_or_else(|| format!("no stored session at index {index}"))?;
            let path = match output {
                Some(path) => {
                    export::write_to_path(session, format, &path)?;
                    path
                }
                None => export::write_to_dir(session, format, Path::new("."))?,
            };
            println!("{}", path.display());
        }
        Command::Rename { index, name } => {
            if !cli.open_history()?.rename_at(index, &name)? {
                return Err(format!("no stored session at index {index}").into());
            }
        }
        Command::Delete { index } => {
            if !cli.open_history()?.delete_at(index)? {
                return Err(format!("no stored session at index {index}").into());
            }
        }
    }
    Ok(())
}

/// One line of the `history` listing
fn history_line(index: usize, session: &Session) -> String {
    let stats = session.stats();
    let age = (chrono::Local::now() - session.started_at)
        .to_std()
        .unwrap_or_default();
    format!(
        "{index:>3}  {:<24} {}  ({})  {} questions  total {}  avg {}",
        session.exam_name,
        session.started_at.format("%Y-%m-%d %H:%M"),
        HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past),
        stats.total_questions,
        format_mmss(u32::try_from(stats.total_seconds).unwrap_or(u32::MAX)),
        format_mmss(u32::try_from(stats.average_seconds).unwrap_or(u32::MAX)),
    )
}

fn build_app(cli: &Cli) -> Result<App, Box<dyn Error>> {
    let settings = cli.effective_settings(cli.settings_store().load());
    let (tx, rx) = mpsc::channel();
    let mut controller =
        SessionController::new(settings, MonotonicClock::new(), cli.open_history()?)
            .with_listener(ChannelListener::new(tx))
            .with_chime(TerminalBell);
    if let Some(name) = &cli.name {
        controller = controller.with_exam_name(name.clone());
    }
    Ok(App::new(controller, rx).with_settings_store(cli.settings_store()))
}

fn run_tui(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = build_app(cli)?;
    tracing::info!("starting timer");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| ui(app, f))?;
    loop {
        match runner.step() {
            PaceEvent::Tick => app.on_tick(),
            PaceEvent::Resize => {}
            PaceEvent::Key(key) => {
                app.on_tick();
                if app.on_key(key) == Flow::Quit {
                    break;
                }
            }
        }
        app.drain_recorded();
        terminal.draw(|f| ui(app, f))?;
    }

    // leaving mid-session still keeps what was answered
    if matches!(app.controller.phase(), Phase::Running | Phase::Paused) {
        app.controller.end();
    }
    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    ui::screen::current_screen(&app.state).render(app, f);
}
