//! Front-end state: routes keys to the engine or the active prompt and renders engine events.

use std::{
    io::{self, Write},
    mem,
};

use crossterm::{event::KeyEvent, style::Color};
use futures::future::LocalBoxFuture;
use terminal_engine::{HistoryDirection, SubmitError, TerminalEngine, TerminalEvent, UiState};

use crate::{
    editor::{Completion, EditorAction, LineEditor},
    forms::{read_selected, split_paths, FormStep, LeadForm},
    screen::Screen,
};

const LEAD_HINT: &str = "Project inquiry: answer each question, Esc to cancel.";
const UPLOAD_HINT: &str = "Type file paths separated by spaces, Enter to upload, Esc to cancel.";
const UPLOAD_PROMPT: &str = "Files to upload: ";
const PASSWORD_PROMPT: &str = "Password: ";

/// Which prompt owns the input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Regular command input.
    Command,
    /// Lead-capture questions.
    Lead(LeadForm),
    /// Upload path entry.
    Upload,
}

/// Interactive terminal bound to one engine.
pub struct App<W: Write> {
    engine: TerminalEngine,
    screen: Screen<W>,
    editor: LineEditor,
    mode: Mode,
    ui: UiState,
    ready: bool,
    quit: bool,
    tasks: Vec<LocalBoxFuture<'static, ()>>,
}

impl<W: Write> App<W> {
    /// Creates the front end; feed it [`TerminalEvent`]s from [`TerminalEngine::subscribe`].
    pub fn new(engine: TerminalEngine, out: W) -> Self {
        Self {
            ready: engine.is_ready(),
            ui: engine.ui_state(),
            engine,
            screen: Screen::new(out),
            editor: LineEditor::new(),
            mode: Mode::Command,
            quit: false,
            tasks: Vec::new(),
        }
    }

    /// Active prompt.
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Whether the user asked to leave.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// The renderer.
    pub fn screen(&self) -> &Screen<W> {
        &self.screen
    }

    /// Mutable access to the renderer.
    pub fn screen_mut(&mut self) -> &mut Screen<W> {
        &mut self.screen
    }

    /// Backend work started by the last keys; the caller spawns them on its local executor.
    pub fn take_tasks(&mut self) -> Vec<LocalBoxFuture<'static, ()>> {
        mem::take(&mut self.tasks)
    }

    fn awaiting_password(&self) -> bool {
        self.mode == Mode::Command && self.ui.awaiting_admin_password
    }

    /// Redraws the prompt row.
    pub fn redraw(&mut self) -> io::Result<()> {
        let prompt = match &self.mode {
            _ if !self.ready => String::new(),
            Mode::Command if self.ui.awaiting_admin_password => PASSWORD_PROMPT.to_string(),
            Mode::Command => format!("{} ", self.engine.config().prompt),
            Mode::Lead(form) => form.prompt(),
            Mode::Upload => UPLOAD_PROMPT.to_string(),
        };
        let masked = self.awaiting_password();
        self.screen.prompt(
            &prompt,
            self.editor.buffer(),
            self.editor.cursor(),
            masked,
        )
    }

    /// Applies one engine notification.
    pub fn on_event(&mut self, event: TerminalEvent) -> io::Result<()> {
        match event {
            TerminalEvent::Ready => self.ready = true,
            TerminalEvent::Line(line) => self.screen.line(&line)?,
            TerminalEvent::Cleared => self.screen.clear()?,
            TerminalEvent::Input(text) => {
                if self.mode == Mode::Command && !self.ui.awaiting_admin_password {
                    self.editor.set(&text);
                }
            }
            TerminalEvent::Ui(ui) => self.apply_ui(ui)?,
        }
        self.redraw()
    }

    fn apply_ui(&mut self, ui: UiState) -> io::Result<()> {
        let next = match (&self.mode, &ui) {
            (Mode::Command, UiState { lead_capture: Some(lead), .. }) => {
                self.screen.note(LEAD_HINT, Some(Color::Yellow))?;
                Some(Mode::Lead(LeadForm::new(lead.service.clone())))
            }
            (Mode::Command, UiState { upload_dialog: true, .. }) => {
                self.screen.note(UPLOAD_HINT, Some(Color::Yellow))?;
                Some(Mode::Upload)
            }
            (Mode::Lead(_), UiState { lead_capture: None, .. }) => Some(Mode::Command),
            (Mode::Upload, UiState { upload_dialog: false, .. }) => Some(Mode::Command),
            _ => None,
        };
        if let Some(next) = next {
            self.mode = next;
            self.editor.take();
        }
        self.quit |= ui.exit_requested;
        self.ui = ui;
        Ok(())
    }

    /// Applies one key press.
    pub fn on_key(&mut self, key: KeyEvent) -> io::Result<()> {
        match self.editor.handle_key(key) {
            EditorAction::Ignored => return Ok(()),
            EditorAction::Quit => {
                self.quit = true;
                return Ok(());
            }
            EditorAction::ClearScreen => self.engine.clear(),
            EditorAction::Cancel => self.cancel(),
            EditorAction::Edited => self.sync_input(),
            EditorAction::HistoryOlder => self.recall(HistoryDirection::Older),
            EditorAction::HistoryNewer => self.recall(HistoryDirection::Newer),
            EditorAction::Complete => self.complete()?,
            EditorAction::Submit(line) => self.submit(line)?,
        }
        self.redraw()
    }

    fn sync_input(&self) {
        if self.mode == Mode::Command && !self.awaiting_password() {
            self.engine.set_input(self.editor.buffer());
        }
    }

    fn recall(&self, direction: HistoryDirection) {
        if self.mode == Mode::Command && !self.awaiting_password() {
            self.engine.navigate_history(direction);
        }
    }

    fn cancel(&mut self) {
        self.editor.take();
        match self.mode {
            Mode::Command if self.awaiting_password() => {
                // An empty answer makes the engine cancel the login.
                if let Err(SubmitError::Closed) = self.engine.submit(String::new()) {
                    self.quit = true;
                }
            }
            Mode::Command => self.engine.set_input(""),
            Mode::Lead(_) => self.engine.dismiss_lead_capture(),
            Mode::Upload => self.engine.dismiss_upload_dialog(),
        }
    }

    fn complete(&mut self) -> io::Result<()> {
        if self.mode != Mode::Command || self.awaiting_password() {
            return Ok(());
        }
        let names = self.engine.command_names();
        if let Completion::Ambiguous(matches) = self.editor.complete(&names) {
            self.screen.note(&matches.join("  "), None)?;
        }
        self.sync_input();
        Ok(())
    }

    fn submit(&mut self, line: String) -> io::Result<()> {
        match &mut self.mode {
            Mode::Command => match self.engine.submit(line.clone()) {
                Ok(()) => {}
                Err(SubmitError::NotReady) => self.editor.set(&line),
                Err(SubmitError::Closed) => self.quit = true,
            },
            Mode::Lead(form) => match form.answer(&line) {
                Ok(FormStep::Next) => {}
                Ok(FormStep::Done(lead)) => {
                    // Start over in case the server rejects the inquiry.
                    *form = LeadForm::new(lead.project_type.clone());
                    let engine = self.engine.clone();
                    self.tasks
                        .push(Box::pin(async move { engine.submit_lead(lead).await }));
                }
                Err(err) => self.screen.note(&err.to_string(), Some(Color::Red))?,
            },
            Mode::Upload => {
                let (present, missing): (Vec<_>, Vec<_>) =
                    split_paths(&line).into_iter().partition(|path| path.is_file());
                for path in &missing {
                    self.screen.note(
                        &format!("Skipping {}: not a readable file", path.display()),
                        Some(Color::Red),
                    )?;
                }
                let engine = self.engine.clone();
                self.tasks.push(Box::pin(async move {
                    let (files, failures) = read_selected(&present).await;
                    for (path, err) in failures {
                        tracing::warn!(path = %path.display(), error = %err, "could not read upload");
                    }
                    engine.upload_files(files).await;
                }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crossterm::event::{KeyCode, KeyModifiers};
    use futures::{
        channel::mpsc::UnboundedReceiver,
        executor::LocalPool,
        task::LocalSpawnExt,
    };
    use site_host::{ManualClock, MemorySiteApi};
    use terminal_engine::{builtin_registry, EngineConfig};

    use super::*;

    struct Harness {
        app: App<Vec<u8>>,
        api: MemorySiteApi,
        events: UnboundedReceiver<TerminalEvent>,
        pool: LocalPool,
    }

    impl Harness {
        fn new(api: MemorySiteApi) -> Self {
            let engine = TerminalEngine::new(
                builtin_registry(),
                Rc::new(api.clone()),
                Rc::new(ManualClock::new()),
                EngineConfig::instant(),
            );
            let events = engine.subscribe();
            let mut pool = LocalPool::new();
            pool.run_until(engine.boot());
            let runner = engine.clone();
            pool.spawner()
                .spawn_local(async move { runner.run().await })
                .expect("spawn engine");
            let mut harness = Self {
                app: App::new(engine, Vec::new()),
                api,
                events,
                pool,
            };
            harness.pump();
            harness
        }

        fn pump(&mut self) {
            loop {
                for task in self.app.take_tasks() {
                    self.pool.spawner().spawn_local(task).expect("spawn task");
                }
                self.pool.run_until_stalled();
                let mut progressed = false;
                while let Ok(Some(event)) = self.events.try_next() {
                    self.app.on_event(event).expect("render");
                    progressed = true;
                }
                if !progressed {
                    break;
                }
            }
        }

        fn type_line(&mut self, text: &str) {
            for ch in text.chars() {
                self.key(KeyCode::Char(ch));
            }
            self.key(KeyCode::Enter);
        }

        fn key(&mut self, code: KeyCode) {
            self.app
                .on_key(KeyEvent::new(code, KeyModifiers::NONE))
                .expect("key");
            self.pump();
        }

        fn output(&self) -> String {
            String::from_utf8_lossy(self.app.screen().writer()).into_owned()
        }
    }

    #[test]
    fn typed_commands_render_engine_output() {
        let mut harness = Harness::new(MemorySiteApi::new());
        assert!(harness.output().contains("Type 'help' to list commands."));
        harness.type_line("help");
        let output = harness.output();
        assert!(output.contains("visitor@studio:~$ help"));
        assert!(output.contains("Available commands:"));
    }

    #[test]
    fn quote_walks_through_the_lead_form() {
        let mut harness = Harness::new(MemorySiteApi::new());
        harness.type_line("quote(ai)");
        assert!(matches!(harness.app.mode(), Mode::Lead(_)));

        for answer in ["Ada", "ada@example.com", "Engines", "", "10k"] {
            harness.type_line(answer);
        }

        assert_eq!(harness.app.mode(), &Mode::Command);
        assert!(harness.output().contains("Inquiry received from Engines"));
        let leads = harness.api.leads();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].project_type.as_deref(), Some("ai"));
    }

    #[test]
    fn escape_closes_the_upload_prompt() {
        let mut harness = Harness::new(MemorySiteApi::new());
        harness.type_line("upload");
        assert_eq!(harness.app.mode(), &Mode::Upload);
        harness.key(KeyCode::Esc);
        assert_eq!(harness.app.mode(), &Mode::Command);
        assert!(!harness.app.engine.ui_state().upload_dialog);
    }

    #[test]
    fn admin_password_is_never_drawn() {
        let mut harness = Harness::new(MemorySiteApi::new().with_admin_password("hunter2"));
        harness.type_line("admin login");
        harness.type_line("hunter2");
        let output = harness.output();
        assert!(!output.contains("hunter2"));
        assert!(output.contains("Admin access granted"));
        assert!(harness.app.engine.is_admin());
    }

    #[test]
    fn cancelling_the_password_prompt_after_shutdown_quits() {
        let mut harness = Harness::new(MemorySiteApi::new().with_admin_password("hunter2"));
        harness.type_line("admin login");
        assert!(harness.app.engine.ui_state().awaiting_admin_password);
        harness.app.engine.shutdown();
        harness.pump();
        harness.key(KeyCode::Esc);
        assert!(harness.app.should_quit());
    }

    #[test]
    fn up_arrow_recalls_history_into_the_editor() {
        let mut harness = Harness::new(MemorySiteApi::new());
        harness.type_line("about");
        harness.key(KeyCode::Up);
        assert_eq!(harness.app.editor.buffer(), "about");
    }

    #[test]
    fn exit_command_requests_quit() {
        let mut harness = Harness::new(MemorySiteApi::new());
        harness.type_line("exit");
        assert!(harness.app.should_quit());
    }
}
