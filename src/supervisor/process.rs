//! The supervised server process.
//!
//! [`ServerProcess`] owns the child for its whole life: spawn, the settle
//! check, output relaying, and the terminate-then-kill shutdown. The child is
//! also registered kill-on-drop, so an early return can never orphan it.

use std::future::Future;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::{sleep, timeout};

use crate::error::LaunchError;

/// Upper bound on draining a crashed child's pipes; a grandchild may still hold them.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// How a shutdown request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownOutcome {
    /// The process had already exited.
    AlreadyStopped,
    /// The process exited after the graceful termination request.
    Terminated,
    /// The process ignored termination and was force-killed.
    Killed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    Stdout,
    Stderr,
}

/// Why [`ServerProcess::relay_output`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Exited(ExitStatus),
    Interrupted,
}

/// Line reader over one child pipe.
///
/// The partial line lives in `buf` between calls, so a read dropped by
/// `select!` loses nothing.
struct LineStream<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: AsyncRead + Unpin> LineStream<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
            done: false,
        }
    }

    /// Next line with the terminator stripped, or `None` at end of stream.
    async fn next_line(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        match self.reader.read_until(b'\n', &mut self.buf).await {
            Ok(0) if self.buf.is_empty() => {
                self.done = true;
                None
            }
            Ok(_) => Some(self.take_line()),
            Err(e) => {
                tracing::warn!("error reading server output: {e}");
                self.done = true;
                (!self.buf.is_empty()).then(|| self.take_line())
            }
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(['\r', '\n'])
            .to_string();
        self.buf.clear();
        line
    }

    /// Everything still buffered or unread, decoded lossily.
    async fn drain(&mut self) -> String {
        let mut rest = std::mem::take(&mut self.buf);
        if !self.done {
            if let Err(e) = self.reader.read_to_end(&mut rest).await {
                tracing::debug!("error draining server output: {e}");
            }
            self.done = true;
        }
        String::from_utf8_lossy(&rest).into_owned()
    }
}

async fn next_line<R: AsyncRead + Unpin>(stream: &mut Option<LineStream<R>>) -> Option<String> {
    match stream {
        Some(stream) => stream.next_line().await,
        None => None,
    }
}

async fn drain<R: AsyncRead + Unpin>(stream: &mut Option<LineStream<R>>) -> String {
    match stream {
        Some(stream) => stream.drain().await,
        None => String::new(),
    }
}

fn is_open<R>(stream: &Option<LineStream<R>>) -> bool {
    stream.as_ref().is_some_and(|s| !s.done)
}

/// A running server child with piped stdout and stderr.
pub struct ServerProcess {
    child: Child,
    stdout: Option<LineStream<ChildStdout>>,
    stderr: Option<LineStream<ChildStderr>>,
}

impl ServerProcess {
    /// Spawns `program args..` in `working_dir`.
    pub fn spawn(program: &str, args: &[String], working_dir: &Path) -> Result<Self, LaunchError> {
        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.to_string(),
                source,
            })?;

        tracing::debug!(program, ?args, pid = ?child.id(), "server process spawned");

        let stdout = child.stdout.take().map(LineStream::new);
        let stderr = child.stderr.take().map(LineStream::new);
        Ok(Self {
            child,
            stdout,
            stderr,
        })
    }

    /// OS process id, until the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Non-blocking exit check.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Waits `delay`, then fails with the child's captured output if it has
    /// already exited.
    pub async fn settle(&mut self, delay: Duration) -> Result<(), LaunchError> {
        sleep(delay).await;

        let Some(status) = self.child.try_wait()? else {
            return Ok(());
        };

        let drained = timeout(DRAIN_TIMEOUT, async {
            tokio::join!(drain(&mut self.stdout), drain(&mut self.stderr))
        })
        .await;
        let (stdout, stderr) = drained.unwrap_or_else(|_| {
            tracing::debug!("timed out draining output of exited server");
            (String::new(), String::new())
        });

        Err(LaunchError::StartupFailed {
            status,
            stdout,
            stderr,
        })
    }

    /// Relays output lines to `sink` until the child exits or `interrupt` fires.
    ///
    /// Blank lines are skipped. Once both pipes are closed the exit status is
    /// polled every `idle`.
    pub async fn relay_output<I, F>(
        &mut self,
        idle: Duration,
        interrupt: I,
        mut sink: F,
    ) -> io::Result<StreamEnd>
    where
        I: Future<Output = ()>,
        F: FnMut(OutputSource, String),
    {
        tokio::pin!(interrupt);
        let Self {
            child,
            stdout,
            stderr,
        } = self;

        loop {
            let out_open = is_open(stdout);
            let err_open = is_open(stderr);

            tokio::select! {
                biased;
                () = &mut interrupt => return Ok(StreamEnd::Interrupted),
                line = next_line(stdout), if out_open => {
                    if let Some(line) = line.filter(|l| !l.trim().is_empty()) {
                        sink(OutputSource::Stdout, line);
                    }
                }
                line = next_line(stderr), if err_open => {
                    if let Some(line) = line.filter(|l| !l.trim().is_empty()) {
                        sink(OutputSource::Stderr, line);
                    }
                }
                () = sleep(idle) => {}
            }

            if !is_open(stdout) && !is_open(stderr) {
                if let Some(status) = child.try_wait()? {
                    return Ok(StreamEnd::Exited(status));
                }
            }
        }
    }

    /// Stops the child: SIGTERM, up to `grace` to exit, then SIGKILL.
    ///
    /// Safe to call on a child that already exited, and more than once.
    pub async fn shutdown(&mut self, grace: Duration) -> io::Result<ShutdownOutcome> {
        if self.child.try_wait()?.is_some() {
            return Ok(ShutdownOutcome::AlreadyStopped);
        }

        if let Err(e) = self.terminate() {
            tracing::debug!("graceful termination failed, killing: {e}");
            self.child.kill().await?;
            return Ok(ShutdownOutcome::Killed);
        }

        match timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                tracing::debug!(%status, "server exited after termination request");
                Ok(ShutdownOutcome::Terminated)
            }
            Err(_) => {
                tracing::debug!(?grace, "server ignored termination, killing");
                self.child.kill().await?;
                Ok(ShutdownOutcome::Killed)
            }
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            // ESRCH: exited between the liveness check and the signal.
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(io::Error::from(e)),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}
