//! Session-scoped terminal engine: boot gate, FIFO command queue, and backend synchronisation.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::LazyLock,
    time::Duration,
};

use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    future::{self, Either},
    StreamExt,
};
use regex::Regex;
use site_contract::{LeadRequest, LineKind, OutputLine, SessionId, TrackCommandRequest};
use site_host::{AdminCredential, SiteApi, TerminalClock, UploadFile};
use thiserror::Error;

use crate::{
    history::{CommandHistory, HistoryDirection},
    registry::{CommandContext, CommandHandler, CommandOutcome, CommandRegistry, UiEffect},
};

static CALL_SYNTAX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\((.*)\)$").ok());

/// Splits `name(argument)` into a lowercase name and its trimmed argument.
pub fn parse_call(input: &str) -> Option<(String, String)> {
    let captures = CALL_SYNTAX.as_ref()?.captures(input)?;
    Some((
        captures.get(1)?.as_str().to_lowercase(),
        captures.get(2)?.as_str().trim().to_string(),
    ))
}

/// Default boot sequence.
pub const DEFAULT_BOOT_LINES: [&str; 6] = [
    "Initializing studio terminal...",
    "Loading modules: pages, quote, upload, admin",
    "Opening session...",
    "Connection established.",
    "",
    "Type 'help' to list commands.",
];

/// Timing and text knobs for [`TerminalEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prompt shown before echoed commands.
    pub prompt: String,
    /// Delay between boot lines.
    pub boot_tick: Duration,
    /// Pause after the last boot line before input is accepted.
    pub settle_delay: Duration,
    /// Upper bound for one command handler.
    pub command_timeout: Duration,
    /// Lines played during boot.
    pub boot_lines: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prompt: "visitor@studio:~$".to_string(),
            boot_tick: Duration::from_millis(100),
            settle_delay: Duration::from_millis(500),
            command_timeout: Duration::from_secs(10),
            boot_lines: DEFAULT_BOOT_LINES.iter().map(|line| line.to_string()).collect(),
        }
    }
}

impl EngineConfig {
    /// Default configuration with boot pacing disabled.
    pub fn instant() -> Self {
        Self {
            boot_tick: Duration::ZERO,
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Open lead-capture form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadCapture {
    /// Service preselected through `quote(<service>)`.
    pub service: Option<String>,
}

/// Visibility flags the host renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Lead-capture form, when open.
    pub lead_capture: Option<LeadCapture>,
    /// Upload dialog visibility.
    pub upload_dialog: bool,
    /// Next submission is the admin password.
    pub awaiting_admin_password: bool,
    /// The user asked to leave.
    pub exit_requested: bool,
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Boot finished and input is accepted.
    Ready,
    /// A line was appended.
    Line(OutputLine),
    /// The scrollback was emptied.
    Cleared,
    /// UI flags changed.
    Ui(UiState),
    /// The input buffer changed.
    Input(String),
}

/// Rejected submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Boot has not finished.
    #[error("terminal is still booting")]
    NotReady,
    /// The command loop was shut down.
    #[error("terminal is closed")]
    Closed,
}

#[derive(Default)]
struct EngineState {
    ready: bool,
    session_id: Option<SessionId>,
    scrollback: Vec<OutputLine>,
    history: CommandHistory,
    input: String,
    ui: UiState,
    admin: Option<AdminCredential>,
    uploaded_files: usize,
    subscribers: Vec<UnboundedSender<TerminalEvent>>,
}

impl EngineState {
    fn emit(&mut self, event: TerminalEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.unbounded_send(event.clone()).is_ok());
    }

    fn push_line(&mut self, line: OutputLine) {
        self.scrollback.push(line.clone());
        self.emit(TerminalEvent::Line(line));
    }

    fn update_ui(&mut self, update: impl FnOnce(&mut UiState)) {
        update(&mut self.ui);
        let ui = self.ui.clone();
        self.emit(TerminalEvent::Ui(ui));
    }
}

struct EngineInner {
    registry: CommandRegistry,
    api: Rc<dyn SiteApi>,
    clock: Rc<dyn TerminalClock>,
    config: EngineConfig,
    state: RefCell<EngineState>,
    commands: UnboundedSender<String>,
    pending_commands: RefCell<Option<UnboundedReceiver<String>>>,
    telemetry: UnboundedSender<TrackCommandRequest>,
    pending_telemetry: RefCell<Option<UnboundedReceiver<TrackCommandRequest>>>,
}

/// Cheaply cloneable handle to one terminal session.
#[derive(Clone)]
pub struct TerminalEngine {
    inner: Rc<EngineInner>,
}

impl TerminalEngine {
    /// Creates an engine; call [`Self::boot`] and drive [`Self::run`] to start it.
    pub fn new(
        registry: CommandRegistry,
        api: Rc<dyn SiteApi>,
        clock: Rc<dyn TerminalClock>,
        config: EngineConfig,
    ) -> Self {
        let (commands, pending_commands) = mpsc::unbounded();
        let (telemetry, pending_telemetry) = mpsc::unbounded();
        Self {
            inner: Rc::new(EngineInner {
                registry,
                api,
                clock,
                config,
                state: RefCell::new(EngineState::default()),
                commands,
                pending_commands: RefCell::new(Some(pending_commands)),
                telemetry,
                pending_telemetry: RefCell::new(Some(pending_telemetry)),
            }),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Registered command names, for completion.
    pub fn command_names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Streams future changes.
    pub fn subscribe(&self) -> UnboundedReceiver<TerminalEvent> {
        let (sender, receiver) = mpsc::unbounded();
        self.inner.state.borrow_mut().subscribers.push(sender);
        receiver
    }

    /// Whether boot has finished.
    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().ready
    }

    /// Session created during boot, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.state.borrow().session_id.clone()
    }

    /// Whether an admin credential is held.
    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().admin.is_some()
    }

    /// Scrollback snapshot.
    pub fn scrollback(&self) -> Vec<OutputLine> {
        self.inner.state.borrow().scrollback.clone()
    }

    /// History snapshot, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.inner.state.borrow().history.entries().to_vec()
    }

    /// Current input buffer.
    pub fn input(&self) -> String {
        self.inner.state.borrow().input.clone()
    }

    /// Current UI flags.
    pub fn ui_state(&self) -> UiState {
        self.inner.state.borrow().ui.clone()
    }

    /// Replaces the input buffer.
    pub fn set_input(&self, input: impl Into<String>) {
        let mut state = self.inner.state.borrow_mut();
        state.input = input.into();
        let input = state.input.clone();
        state.emit(TerminalEvent::Input(input));
    }

    /// Creates the session and plays the boot sequence, then opens the input gate.
    ///
    /// Session creation runs alongside the boot lines; a failure leaves the terminal usable
    /// without a session.
    pub async fn boot(&self) {
        future::join(self.open_session(), self.play_boot_lines()).await;
    }

    async fn open_session(&self) {
        match self.inner.api.create_session().await {
            Ok(session_id) => {
                tracing::info!(session = %session_id, "terminal session created");
                self.inner.state.borrow_mut().session_id = Some(session_id);
            }
            Err(err) => {
                tracing::warn!(error = %err, "session creation failed; telemetry disabled");
            }
        }
    }

    async fn play_boot_lines(&self) {
        let config = &self.inner.config;
        for (index, line) in config.boot_lines.iter().enumerate() {
            if index > 0 {
                self.inner.clock.sleep(config.boot_tick).await;
            }
            self.append(OutputLine::new(LineKind::Boot, line.clone()));
        }
        self.inner.clock.sleep(config.settle_delay).await;

        let mut state = self.inner.state.borrow_mut();
        state.ready = true;
        state.emit(TerminalEvent::Ready);
    }

    /// Accepts one line of input for processing.
    ///
    /// The input buffer is cleared and the line is queued behind earlier submissions. Whether
    /// it is a command or the answer to the admin password prompt is decided when it reaches
    /// the front of the queue; only commands enter history.
    pub fn submit(&self, line: impl Into<String>) -> Result<(), SubmitError> {
        let raw = line.into();
        let mut state = self.inner.state.borrow_mut();
        if !state.ready {
            return Err(SubmitError::NotReady);
        }
        state.history.reset_cursor();
        state.input.clear();
        state.emit(TerminalEvent::Input(String::new()));
        drop(state);

        self.inner
            .commands
            .unbounded_send(raw)
            .map_err(|_| SubmitError::Closed)
    }

    /// Replays history into the input buffer.
    pub fn navigate_history(&self, direction: HistoryDirection) {
        let mut state = self.inner.state.borrow_mut();
        if let Some(recalled) = state.history.navigate(direction) {
            state.input = recalled.clone();
            state.emit(TerminalEvent::Input(recalled));
        }
    }

    /// Empties the scrollback.
    pub fn clear(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.scrollback.clear();
        state.emit(TerminalEvent::Cleared);
    }

    /// Hides the lead-capture form without submitting.
    pub fn dismiss_lead_capture(&self) {
        self.inner
            .state
            .borrow_mut()
            .update_ui(|ui| ui.lead_capture = None);
    }

    /// Hides the upload dialog without uploading.
    pub fn dismiss_upload_dialog(&self) {
        self.inner
            .state
            .borrow_mut()
            .update_ui(|ui| ui.upload_dialog = false);
    }

    /// Stops accepting submissions; [`Self::run`] returns once queued work drains.
    pub fn shutdown(&self) {
        self.inner.commands.close_channel();
        self.inner.telemetry.close_channel();
    }

    /// Processes queued submissions and telemetry until [`Self::shutdown`].
    pub async fn run(&self) {
        let commands = self.inner.pending_commands.borrow_mut().take();
        let telemetry = self.inner.pending_telemetry.borrow_mut().take();
        let (Some(commands), Some(telemetry)) = (commands, telemetry) else {
            tracing::warn!("terminal engine is already running");
            return;
        };
        future::join(self.command_loop(commands), self.telemetry_loop(telemetry)).await;
    }

    async fn command_loop(&self, mut commands: UnboundedReceiver<String>) {
        while let Some(raw) = commands.next().await {
            if self.take_password_prompt() {
                self.process_admin_password(&raw).await;
            } else {
                self.inner.state.borrow_mut().history.push(raw.clone());
                self.process_command(&raw).await;
            }
        }
    }

    fn take_password_prompt(&self) -> bool {
        let mut state = self.inner.state.borrow_mut();
        if !state.ui.awaiting_admin_password {
            return false;
        }
        state.update_ui(|ui| ui.awaiting_admin_password = false);
        true
    }

    async fn telemetry_loop(&self, mut requests: UnboundedReceiver<TrackCommandRequest>) {
        while let Some(request) = requests.next().await {
            // Best-effort: the outcome is intentionally discarded here and nowhere else.
            if let Err(err) = self.inner.api.track_command(&request).await {
                tracing::debug!(error = %err, "command telemetry dropped");
            }
        }
    }

    fn append(&self, line: OutputLine) {
        self.inner.state.borrow_mut().push_line(line);
    }

    fn echo(&self, shown: &str) {
        self.append(OutputLine::new(
            LineKind::Command,
            format!("{} {shown}", self.inner.config.prompt),
        ));
    }

    fn track(&self, command: &str) {
        let Some(session_id) = self.session_id() else {
            return;
        };
        let request = TrackCommandRequest {
            session_id: Some(session_id),
            command: Some(command.to_string()),
        };
        if self.inner.telemetry.unbounded_send(request).is_err() {
            tracing::debug!("telemetry queue closed");
        }
    }

    fn context(&self, args: Vec<String>) -> CommandContext {
        let state = self.inner.state.borrow();
        CommandContext {
            args,
            session_id: state.session_id.clone(),
            admin: state.admin.clone(),
            api: self.inner.api.clone(),
            history: state.history.entries().to_vec(),
            uploaded_files: state.uploaded_files,
        }
    }

    fn resolve(&self, input: &str) -> (String, Option<(CommandHandler, Vec<String>)>) {
        let mut tokens = input.split_whitespace();
        let token = tokens.next().unwrap_or_default().to_lowercase();
        if let Some(handler) = self.inner.registry.command(&token) {
            let args = tokens.map(str::to_string).collect();
            return (token, Some((handler, args)));
        }
        let call = parse_call(input)
            .and_then(|(name, argument)| Some((self.inner.registry.call(&name)?, vec![argument])));
        (token, call)
    }

    async fn process_command(&self, raw: &str) {
        self.echo(raw);
        let input = raw.trim();
        if input.is_empty() {
            return;
        }

        let (token, resolved) = self.resolve(input);
        self.track(&token);
        let Some((handler, args)) = resolved else {
            tracing::debug!(command = %token, "unrecognized command");
            self.append(OutputLine::error(format!("Command not recognized: {input}")));
            self.append(OutputLine::error("Type 'help' for available commands."));
            self.append(OutputLine::output(""));
            return;
        };

        let context = self.context(args);
        let timeout = self.inner.config.command_timeout;
        match future::select(handler(context), self.inner.clock.sleep(timeout)).await {
            Either::Left((Ok(outcome), _)) => self.apply(outcome),
            Either::Left((Err(err), _)) => self.append(OutputLine::error(err.message)),
            Either::Right(((), _)) => {
                tracing::warn!(command = %token, "command timed out");
                self.append(OutputLine::error(format!(
                    "Request timed out after {}s",
                    timeout.as_secs()
                )));
            }
        }
    }

    async fn process_admin_password(&self, raw: &str) {
        self.echo(&"*".repeat(raw.chars().count()));
        let password = raw.trim();
        if password.is_empty() {
            self.append(OutputLine::error("Admin login cancelled"));
            return;
        }

        let api = self.inner.api.clone();
        let timeout = self.inner.config.command_timeout;
        let login = api.admin_login(password);
        let result = future::select(login, self.inner.clock.sleep(timeout)).await;
        match result {
            Either::Left((Ok(()), _)) => {
                self.inner.state.borrow_mut().admin = Some(AdminCredential::new(password));
                tracing::info!("admin access granted");
                self.append(OutputLine::success("Admin access granted"));
            }
            Either::Left((Err(err), _)) => {
                tracing::warn!(status = ?err.status_code(), "admin login rejected");
                self.append(OutputLine::error(format!(
                    "Admin login failed: {}",
                    err.user_message()
                )));
            }
            Either::Right(((), _)) => {
                self.append(OutputLine::error(format!(
                    "Request timed out after {}s",
                    timeout.as_secs()
                )));
            }
        }
    }

    fn apply(&self, outcome: CommandOutcome) {
        for line in outcome.lines {
            self.append(line);
        }
        for effect in outcome.effects {
            match effect {
                UiEffect::ClearScrollback => self.clear(),
                UiEffect::AdminLogout => self.inner.state.borrow_mut().admin = None,
                UiEffect::OpenLeadCapture { service } => self
                    .inner
                    .state
                    .borrow_mut()
                    .update_ui(|ui| ui.lead_capture = Some(LeadCapture { service })),
                UiEffect::OpenUploadDialog => self
                    .inner
                    .state
                    .borrow_mut()
                    .update_ui(|ui| ui.upload_dialog = true),
                UiEffect::AwaitAdminPassword => self
                    .inner
                    .state
                    .borrow_mut()
                    .update_ui(|ui| ui.awaiting_admin_password = true),
                UiEffect::RequestExit => self
                    .inner
                    .state
                    .borrow_mut()
                    .update_ui(|ui| ui.exit_requested = true),
            }
        }
    }

    /// Submits the lead-capture form for the current session.
    ///
    /// Success closes the form; failures leave it open and append one error line.
    pub async fn submit_lead(&self, mut lead: LeadRequest) {
        lead.session_id = self.session_id();
        let api = self.inner.api.clone();
        match api.create_lead(&lead).await {
            Ok(_) => {
                let unspecified = || "unspecified".to_string();
                let company = lead.company.clone().unwrap_or_default();
                let project = lead.project_type.clone().unwrap_or_else(unspecified);
                let budget = lead.budget.clone().unwrap_or_else(unspecified);
                self.append(OutputLine::success(format!("Inquiry received from {company}")));
                self.append(OutputLine::success(format!(
                    "Project: {project} | Budget: {budget}"
                )));
                self.append(OutputLine::success(
                    "We reply within one business day.",
                ));
                self.dismiss_lead_capture();
            }
            Err(err) => {
                tracing::warn!(error = %err, "lead submission failed");
                self.append(OutputLine::error(err.user_message()));
            }
        }
    }

    /// Uploads user-selected files on behalf of the session and closes the dialog.
    ///
    /// Failures are logged only.
    pub async fn upload_files(&self, files: Vec<UploadFile>) {
        self.dismiss_upload_dialog();
        if files.is_empty() {
            return;
        }
        let Some(session_id) = self.session_id() else {
            tracing::warn!("upload skipped: no session");
            return;
        };
        let api = self.inner.api.clone();
        match api.upload_files(&session_id, &files).await {
            Ok(response) => {
                self.inner.state.borrow_mut().uploaded_files += response.count;
                self.append(OutputLine::success(format!(
                    "Uploaded {} file(s)",
                    response.count
                )));
            }
            Err(err) => {
                tracing::warn!(error = %err, files = files.len(), "upload failed");
            }
        }
    }
}
