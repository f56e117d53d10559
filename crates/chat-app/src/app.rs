use std::io::{self, Write};
use std::sync::Arc;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize, style};
use crossterm::terminal::{self, Clear, ClearType};
use doodle_api::HttpMessageStore;
use doodle_sync::{ScrollIntent, SendResult, SyncEngine, SyncSnapshot};
use snafu::ResultExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::chat::events::HELP_TEXT;
use crate::chat::{
    InputCommand, LineKind, MessageInput, TranscriptLine, TranscriptViewport,
    render_transcript,
};
use crate::error::{AppError, BuildStoreSnafu, DrawSnafu, ReadInputSnafu};
use crate::settings::SettingsStore;

pub const APP_TITLE: &str = "Doodle Chat";
const PROMPT: &str = "> ";
const DEFAULT_WIDTH: usize = 80;

/// What the event loop should do after one prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    None,
    Send(String),
    Retry,
    Quit,
}

/// Terminal shell around one sync engine: renders its snapshots, routes prompt
/// input and tracks the transcript viewport.
pub struct ChatApp {
    engine: SyncEngine,
    settings: Arc<SettingsStore>,
    viewport: TranscriptViewport,
    input: MessageInput,
    snapshot: SyncSnapshot,
    status: Option<String>,
    width: usize,
}

impl ChatApp {
    pub fn new(engine: SyncEngine, settings: Arc<SettingsStore>) -> Self {
        let current = settings.settings();
        let viewport = TranscriptViewport::new(
            usize::from(current.viewport_rows),
            current.near_bottom_threshold_px,
        );
        let snapshot = engine.snapshot();

        Self {
            engine,
            settings,
            viewport,
            input: MessageInput::new(),
            snapshot,
            status: None,
            width: DEFAULT_WIDTH,
        }
    }

    pub fn viewport(&self) -> &TranscriptViewport {
        &self.viewport
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Adopts a new engine snapshot and lets the follow controller react to
    /// its collection change.
    pub fn apply_snapshot(&mut self, snapshot: SyncSnapshot) -> ScrollIntent {
        self.snapshot = snapshot;
        let lines = self.render_lines();
        let intent = self.viewport.sync(&self.snapshot, lines);
        if intent.scrolls() {
            tracing::debug!(intent = ?intent, revision = self.snapshot.revision(), "following new messages");
        }
        intent
    }

    pub fn handle_line(&mut self, line: &str) -> AppAction {
        self.status = None;

        match InputCommand::parse(line) {
            InputCommand::Submit(content) => match self.input.submit(&content) {
                Some(text) => AppAction::Send(text),
                None => {
                    if self.input.is_sending() {
                        self.status = Some("Still sending the previous message".to_string());
                    }
                    AppAction::None
                }
            },
            InputCommand::Retry => {
                if self.snapshot.error().is_some_and(|error| error.is_load()) {
                    AppAction::Retry
                } else {
                    self.status = Some("Nothing to retry".to_string());
                    AppAction::None
                }
            }
            InputCommand::ScrollUp(rows) => {
                self.viewport.scroll_up(rows.unwrap_or_else(|| self.half_page()));
                AppAction::None
            }
            InputCommand::ScrollDown(rows) => {
                self.viewport.scroll_down(rows.unwrap_or_else(|| self.half_page()));
                AppAction::None
            }
            InputCommand::Bottom => {
                self.viewport.scroll_to_bottom();
                AppAction::None
            }
            InputCommand::Nick(name) => {
                self.change_author(&name);
                AppAction::None
            }
            InputCommand::Quit => AppAction::Quit,
            InputCommand::Help => {
                self.status = Some(HELP_TEXT.to_string());
                AppAction::None
            }
            InputCommand::Invalid(hint) => {
                self.status = Some(hint);
                AppAction::None
            }
        }
    }

    pub fn finish_send(&mut self, result: SendResult<()>) {
        match result {
            Ok(()) => self.input.finish_sent(),
            Err(error) => {
                tracing::debug!(error = %error, "send finished with an error");
                self.input.finish_failed();
                if error.is_local_rejection() {
                    self.status = Some(error.to_string());
                }
            }
        }
    }

    /// Re-renders the transcript when the terminal width changed.
    pub fn resize(&mut self, width: usize) {
        let width = width.max(1);
        if width != self.width {
            self.width = width;
            let lines = self.render_lines();
            self.viewport.set_lines(lines);
        }
    }

    pub fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        queue!(out, PrintStyledContent(APP_TITLE.bold()), Print("\r\n"))?;

        if let Some(error) = self.snapshot.error() {
            let banner = if error.is_load() {
                format!("{error} (/retry to try again)")
            } else {
                error.to_string()
            };
            queue!(out, PrintStyledContent(banner.white().on_red()), Print("\r\n"))?;
        }

        let visible = self.viewport.visible();
        for line in visible {
            self.draw_line(out, line)?;
        }
        for _ in visible.len()..self.viewport.rows() {
            queue!(out, Print("\r\n"))?;
        }

        if !self.viewport.is_following() {
            queue!(
                out,
                PrintStyledContent("-- more below, /bottom to follow --".dark_grey()),
                Print("\r\n")
            )?;
        }
        if let Some(status) = &self.status {
            queue!(out, PrintStyledContent(status.as_str().dark_yellow()), Print("\r\n"))?;
        } else if let Some(draft) = self.input.restored_draft() {
            let hint = format!("Unsent: \"{draft}\" (Enter to resend)");
            queue!(out, PrintStyledContent(hint.dark_yellow()), Print("\r\n"))?;
        }
        if self.input.is_sending() {
            queue!(out, PrintStyledContent("Sending...".dark_grey()), Print("\r\n"))?;
        }

        queue!(out, Print(PROMPT))?;
        out.flush()
    }

    fn draw_line(&self, out: &mut impl Write, line: &TranscriptLine) -> io::Result<()> {
        let pad = line.leading_padding(self.width);
        let text = line.text.as_str();
        let styled = match line.kind {
            LineKind::Author => text.bold().dark_grey(),
            LineKind::Body if line.own => text.cyan(),
            LineKind::Timestamp | LineKind::Placeholder => text.dark_grey(),
            LineKind::Body | LineKind::Gap => style(text),
        };

        queue!(
            out,
            Print(" ".repeat(pad)),
            PrintStyledContent(styled),
            Print("\r\n")
        )
    }

    fn change_author(&mut self, name: &str) {
        let next = self.settings.settings().as_ref().clone().with_author(name);
        let author = next.author.clone();

        self.status = match self.settings.update(next) {
            Ok(()) => Some(format!("Now posting as {author}")),
            Err(error) => {
                tracing::warn!(error = %error, "failed to persist author");
                Some(format!("Posting as {author} for this session only: {error}"))
            }
        };
        self.engine.set_current_user(author);

        let lines = self.render_lines();
        self.viewport.set_lines(lines);
    }

    fn render_lines(&self) -> Vec<TranscriptLine> {
        render_transcript(
            self.snapshot.messages(),
            self.snapshot.is_loading(),
            self.engine.current_user().as_str(),
            self.width,
        )
    }

    fn half_page(&self) -> usize {
        (self.viewport.rows() / 2).max(1)
    }
}

/// Runs the terminal client until `/quit` or end of input.
pub async fn run(settings: SettingsStore) -> Result<(), AppError> {
    let settings = Arc::new(settings);
    let current = settings.settings();
    if !current.has_token() {
        tracing::warn!(
            "no API token configured; set DOODLE_API_TOKEN or api_token in {:?}",
            settings.config_path()
        );
    }

    let store = HttpMessageStore::new(current.store_config()).context(BuildStoreSnafu {
        stage: "build-message-store",
    })?;
    let engine = SyncEngine::new(Arc::new(store), current.sync_config());
    let mut app = ChatApp::new(engine.clone(), settings.clone());
    let mut updates = engine.subscribe();
    let handle = engine.start();

    let (sent_tx, mut sent_rx) = mpsc::unbounded_channel::<SendResult<()>>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    app.resize(terminal_width());
    let snapshot = updates.borrow_and_update().clone();
    app.apply_snapshot(snapshot);
    app.draw(&mut stdout).context(DrawSnafu {
        stage: "draw-initial-screen",
    })?;

    let result = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = updates.borrow_and_update().clone();
                app.apply_snapshot(snapshot);
            }
            Some(sent) = sent_rx.recv() => app.finish_send(sent),
            line = lines.next_line() => {
                let line = match line.context(ReadInputSnafu { stage: "read-prompt-line" }) {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(error) => break Err(error),
                };

                match app.handle_line(&line) {
                    AppAction::None => {}
                    AppAction::Quit => break Ok(()),
                    AppAction::Send(text) => {
                        let engine = engine.clone();
                        let sent_tx = sent_tx.clone();
                        tokio::spawn(async move {
                            let result = engine.send_message(&text).await.map(|_| ());
                            let _ = sent_tx.send(result);
                        });
                    }
                    AppAction::Retry => {
                        let engine = engine.clone();
                        tokio::spawn(async move {
                            engine.retry().await;
                        });
                    }
                }
            }
        }

        app.resize(terminal_width());
        if let Err(error) = app.draw(&mut stdout).context(DrawSnafu {
            stage: "redraw-screen",
        }) {
            break Err(error);
        }
    };

    handle.stop().await;
    tracing::info!("chat client stopped");
    result
}

fn terminal_width() -> usize {
    terminal::size()
        .map(|(width, _)| usize::from(width))
        .unwrap_or(DEFAULT_WIDTH)
}
