//! Drives one launch through the lifecycle stages.
//!
//! The health probe and browser opener are injected so the stages can run
//! against a mock server in tests. Whatever happens after the server has
//! been spawned, [`Launcher::run`] shuts it down before returning.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::config::LauncherConfig;
use crate::error::LaunchError;
use crate::lifecycle::{LaunchReport, Lifecycle, RunEnd, Stage, StageOutcome};
use crate::supervisor::{
    BrowserOpener, DepsStatus, HealthProbe, HttpProbe, RetryPolicy, ServerProcess,
    ShutdownOutcome, StreamEnd, SystemBrowser, check_runtime, ensure_dependencies,
    wait_until_ready,
};
use crate::ui::{Console, ReadinessProgress};

/// Outcome of racing a stage against the interrupt.
enum Raced<T> {
    Done(T),
    Interrupted,
}

async fn race<T, F, I>(stage: F, interrupt: &mut Pin<&mut I>) -> Raced<T>
where
    F: Future<Output = T>,
    I: Future<Output = ()>,
{
    tokio::select! {
        biased;
        () = interrupt.as_mut() => Raced::Interrupted,
        out = stage => Raced::Done(out),
    }
}

pub struct Launcher<P = HttpProbe, B = SystemBrowser> {
    config: LauncherConfig,
    probe: P,
    browser: B,
    open_browser: bool,
    console: Console,
    lifecycle: Lifecycle,
    started_at: DateTime<Utc>,
    readiness_attempts: u32,
    shutdown_outcome: Option<ShutdownOutcome>,
}

impl Launcher {
    /// Launcher probing the configured health URL and opening the system browser.
    pub fn new(config: LauncherConfig) -> Result<Self, LaunchError> {
        let probe = HttpProbe::new(config.health_url(), config.request_timeout())?;
        Ok(Self::with_parts(config, probe, SystemBrowser))
    }
}

impl<P: HealthProbe, B: BrowserOpener> Launcher<P, B> {
    pub fn with_parts(config: LauncherConfig, probe: P, browser: B) -> Self {
        Self {
            config,
            probe,
            browser,
            open_browser: true,
            console: Console::new(),
            lifecycle: Lifecycle::new(),
            started_at: Utc::now(),
            readiness_attempts: 0,
            shutdown_outcome: None,
        }
    }

    /// Skips `OPEN_BROWSER` when `false`.
    pub fn open_browser(mut self, open: bool) -> Self {
        self.open_browser = open;
        self
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Record of a run that returned an error, up to where it stopped.
    pub fn failure_report(&self) -> LaunchReport {
        self.report(RunEnd::Failed)
    }

    /// Runs the whole launch. `interrupt` resolving means the user asked to stop.
    ///
    /// Errors are returned after cleanup; the caller only has to report them.
    pub async fn run<I>(&mut self, interrupt: I) -> Result<LaunchReport, LaunchError>
    where
        I: Future<Output = ()>,
    {
        self.started_at = Utc::now();
        tokio::pin!(interrupt);

        self.console.section("Checking prerequisites...");
        self.prepare(&mut interrupt).await?;

        self.console.section("Starting server...");
        let mut server = self.spawn_server()?;

        let end = self.supervise(&mut server, &mut interrupt).await;
        self.shutdown_outcome = self.shutdown(&mut server).await;

        Ok(self.report(end?))
    }

    fn report(&self, end: RunEnd) -> LaunchReport {
        LaunchReport::new(
            &self.lifecycle,
            self.config.server_url(),
            self.readiness_attempts,
            end,
            self.shutdown_outcome,
            self.started_at,
        )
    }

    /// CHECK_RUNTIME and CHECK_DEPS.
    async fn prepare<I>(&mut self, interrupt: &mut Pin<&mut I>) -> Result<(), LaunchError>
    where
        I: Future<Output = ()>,
    {
        let version = match race(check_runtime(&self.config.runtime), interrupt).await {
            Raced::Done(result) => self.conclude(result)?,
            Raced::Interrupted => return Err(self.interrupted()),
        };
        self.console
            .ok(&format!("{} is installed: {version}", self.config.runtime));

        match race(ensure_dependencies(&self.config), interrupt).await {
            Raced::Done(result) => match self.conclude(result)? {
                DepsStatus::Present => self.console.ok("Backend dependencies are installed"),
                DepsStatus::Installed => self.console.ok("Dependencies installed successfully"),
            },
            Raced::Interrupted => return Err(self.interrupted()),
        }
        Ok(())
    }

    /// First half of START_SERVER: locate the entry point and spawn it.
    fn spawn_server(&mut self) -> Result<ServerProcess, LaunchError> {
        let entry = self.config.entry_path();
        let spawned = if entry.is_file() {
            ServerProcess::spawn(
                &self.config.runtime,
                std::slice::from_ref(&self.config.entry_point),
                &self.config.backend_dir,
            )
        } else {
            Err(LaunchError::EntryPointMissing { path: entry })
        };

        match spawned {
            Ok(server) => {
                self.lifecycle.mark_child_spawned();
                Ok(server)
            }
            Err(e) => {
                self.lifecycle.advance(StageOutcome::Failure);
                Err(e)
            }
        }
    }

    /// Settle check through STREAM_OUTPUT. Leaves the lifecycle at SHUTDOWN.
    async fn supervise<I>(
        &mut self,
        server: &mut ServerProcess,
        interrupt: &mut Pin<&mut I>,
    ) -> Result<RunEnd, LaunchError>
    where
        I: Future<Output = ()>,
    {
        // START_SERVER: let early crashes surface.
        match race(server.settle(self.config.settle_delay()), interrupt).await {
            Raced::Done(result) => self.conclude(result)?,
            Raced::Interrupted => {
                self.interrupted();
                return Ok(RunEnd::Interrupted);
            }
        }
        self.console.ok("Server started successfully!");

        // AWAIT_READY
        self.console.section("Waiting for server to be ready...");
        let policy = RetryPolicy {
            max_attempts: self.config.max_attempts,
            interval: self.config.retry_interval(),
        };
        let progress = ReadinessProgress::start(&self.config.health_url());
        let attempts = Cell::new(0);
        let waited = race(
            wait_until_ready(&self.probe, policy, |attempt, result| {
                attempts.set(attempt);
                progress.attempt(attempt, policy.max_attempts, result)
            }),
            interrupt,
        )
        .await;
        progress.finish();
        self.readiness_attempts = attempts.get();
        match waited {
            Raced::Done(result) => {
                self.conclude(result)?;
            }
            Raced::Interrupted => {
                self.interrupted();
                return Ok(RunEnd::Interrupted);
            }
        }
        let url = self.config.server_url();
        self.console
            .ok(&format!("Server is responding on {url}"));

        // OPEN_BROWSER
        if self.open_browser {
            self.console.section(&format!("Opening {url} in your browser..."));
            match self.browser.open(&url) {
                Ok(()) => self.console.ok("Browser opened!"),
                Err(e) => {
                    tracing::warn!("could not open browser: {e}");
                    self.console.warn(&format!("Could not open a browser, visit {url} manually"));
                }
            }
        }
        self.lifecycle.advance(StageOutcome::Success);

        // STREAM_OUTPUT
        self.console.running(&url);
        let console = &self.console;
        let streamed = server
            .relay_output(self.config.output_poll(), interrupt.as_mut(), |source, line| {
                console.server_line(source, &line)
            })
            .await;

        match streamed {
            Ok(StreamEnd::Exited(status)) => {
                tracing::debug!(%status, "server exited while streaming");
                self.console.fail("Server stopped unexpectedly");
                self.lifecycle.advance(StageOutcome::Success);
                Ok(RunEnd::ServerExited)
            }
            Ok(StreamEnd::Interrupted) => {
                self.interrupted();
                Ok(RunEnd::Interrupted)
            }
            Err(e) => {
                self.lifecycle.advance(StageOutcome::Failure);
                Err(e.into())
            }
        }
    }

    /// SHUTDOWN: stop the server and finish the lifecycle.
    async fn shutdown(&mut self, server: &mut ServerProcess) -> Option<ShutdownOutcome> {
        debug_assert_eq!(self.lifecycle.stage(), Stage::Shutdown);

        if matches!(server.try_wait(), Ok(None)) {
            self.console.section("Stopping server...");
        }
        let outcome = match server.shutdown(self.config.shutdown_timeout()).await {
            Ok(outcome) => {
                match outcome {
                    ShutdownOutcome::AlreadyStopped => {}
                    ShutdownOutcome::Terminated => self.console.ok("Server stopped"),
                    ShutdownOutcome::Killed => self.console.warn("Server force killed"),
                }
                Some(outcome)
            }
            Err(e) => {
                // kill_on_drop still reaps it when `server` goes out of scope.
                tracing::warn!("failed to stop server: {e}");
                None
            }
        };
        self.lifecycle.advance(StageOutcome::Success);
        outcome
    }

    /// Feeds a stage result into the lifecycle and passes it through.
    fn conclude<T>(&mut self, result: Result<T, LaunchError>) -> Result<T, LaunchError> {
        let outcome = if result.is_ok() {
            StageOutcome::Success
        } else {
            StageOutcome::Failure
        };
        self.lifecycle.advance(outcome);
        result
    }

    fn interrupted(&mut self) -> LaunchError {
        self.console.warn("Received interrupt signal. Shutting down...");
        self.lifecycle.interrupt();
        LaunchError::Interrupted
    }
}
