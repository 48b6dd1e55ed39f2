//! `site_terminal`: interactive client for the studio site backend.

use std::{io, process::ExitCode, rc::Rc};

use anyhow::Context;
use crossterm::{
    event::{Event, EventStream},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use futures::{channel::mpsc::UnboundedReceiver, StreamExt};
use site_host_http::{HttpSiteApi, TokioClock, DEFAULT_API_BASE};
use site_terminal::App;
use terminal_engine::{builtin_registry, EngineConfig, TerminalEngine, TerminalEvent};
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr only when `RUST_LOG` is set.
fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            tracing::warn!(%err, "failed to restore terminal mode");
        }
    }
}

async fn drive(
    app: &mut App<io::Stdout>,
    events: &mut UnboundedReceiver<TerminalEvent>,
) -> anyhow::Result<()> {
    let mut keys = EventStream::new();
    app.redraw()?;
    loop {
        for task in app.take_tasks() {
            tokio::task::spawn_local(task);
        }
        if app.should_quit() {
            return Ok(());
        }
        tokio::select! {
            event = events.next() => match event {
                Some(event) => app.on_event(event)?,
                None => return Ok(()),
            },
            input = keys.next() => match input {
                Some(Ok(Event::Key(key))) => app.on_key(key)?,
                Some(Ok(Event::Resize(..))) => app.redraw()?,
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("failed to read terminal input"),
                None => return Ok(()),
            },
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let base = std::env::var("SITE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
    let api = HttpSiteApi::new(&base).with_context(|| format!("invalid SITE_API_BASE {base:?}"))?;
    tracing::info!(%base, "connecting to site backend");

    let engine = TerminalEngine::new(
        builtin_registry(),
        Rc::new(api),
        Rc::new(TokioClock),
        EngineConfig::default(),
    );
    let mut events = engine.subscribe();
    let runner = tokio::task::spawn_local({
        let engine = engine.clone();
        async move {
            engine.boot().await;
            engine.run().await;
        }
    });

    let raw_mode = RawModeGuard::enable().context("failed to enter raw mode")?;
    let mut app = App::new(engine.clone(), io::stdout());
    let result = drive(&mut app, &mut events).await;
    app.screen_mut().finish()?;
    drop(raw_mode);

    engine.shutdown();
    if let Err(err) = runner.await {
        tracing::warn!(%err, "terminal engine task failed");
    }
    result
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    match LocalSet::new().run_until(run()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("site_terminal: {err:#}");
            ExitCode::FAILURE
        }
    }
}
