//! Subprocess runner shared by the shell, python and dev-server tools.
//!
//! stdout and stderr are merged line by line in arrival order. On unix the
//! child leads its own process group, and a timeout, a line limit or a
//! dropped future (Ctrl-C, an abandoned turn) kills the whole group, so
//! anything the command started in the background goes with it.
//!
//! At most [`MAX_OUTPUT_BYTES`] of output is ever held in memory. Past that
//! the pipes are still read, so the child never stalls on a full pipe, but
//! the bytes are discarded.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use blitzcoder_core::error::ToolError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Output beyond this is dropped and a truncation marker appended.
pub const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// How long to keep collecting after the child exits.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Lines in flight between the pipe readers and the collector.
const LINE_BUFFER: usize = 256;

/// When to stop waiting on a process.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub timeout: Duration,

    /// Kill the process once this many lines have been collected
    pub max_lines: Option<usize>,
}

impl Limits {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            max_lines: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub output: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub truncated: bool,

    /// The process was killed after `max_lines` lines
    pub line_limit_reached: bool,

    /// Lines received, including any dropped by the byte cap
    pub lines: usize,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Text shown to the model.
    pub fn render(&self, timeout: Duration) -> String {
        let mut text = self.output.trim_end().to_string();
        if text.is_empty() {
            text.push_str("(no output)");
        }
        if self.truncated {
            text.push_str("\n[output truncated]");
        }
        if self.timed_out {
            text.push_str(&format!(
                "\n[timed out after {}s; process killed]",
                timeout.as_secs()
            ));
        } else if self.line_limit_reached {
            text.push_str(&format!("\n[stopped after {} lines; process killed]", self.lines));
        } else if let Some(code) = self.exit_code
            && code != 0
        {
            text = format!("[exit code: {code}]\n{text}");
        } else if self.exit_code.is_none() {
            text = format!("[terminated by signal]\n{text}");
        }
        text
    }

    fn push(&mut self, line: String) {
        self.lines += 1;
        let room = MAX_OUTPUT_BYTES.saturating_sub(self.output.len());
        if line.len() <= room {
            self.output.push_str(&line);
            return;
        }
        self.truncated = true;
        let mut end = room;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        self.output.push_str(&line[..end]);
    }
}

/// Run `cmd` to completion or until `timeout` elapses.
pub async fn run(cmd: Command, timeout: Duration, tool_name: &str) -> Result<ProcessOutput, ToolError> {
    run_with(cmd, Limits::timeout(timeout), tool_name).await
}

enum Stop {
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
    LineLimit,
}

/// Run `cmd` until it exits or one of `limits` is hit.
pub async fn run_with(mut cmd: Command, limits: Limits, tool_name: &str) -> Result<ProcessOutput, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|e| ToolError::failed(tool_name, format!("failed to spawn: {e}")))?;
    // Declared after `child` so it drops first, while the group id is still reserved.
    let mut group = GroupGuard { pgid: child.id() };

    let budget = Arc::new(Budget::default());
    let (tx, mut rx) = mpsc::channel::<String>(LINE_BUFFER);
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(stdout, tx.clone(), budget.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(stderr, tx.clone(), budget.clone())));
    }
    drop(tx);

    let mut out = ProcessOutput::default();
    let deadline = tokio::time::sleep(limits.timeout);
    tokio::pin!(deadline);
    let mut pipes_open = true;

    let stop = loop {
        tokio::select! {
            line = rx.recv(), if pipes_open => match line {
                Some(line) => {
                    out.push(line);
                    if limits.max_lines.is_some_and(|max| out.lines >= max) {
                        break Stop::LineLimit;
                    }
                }
                None => pipes_open = false,
            },
            status = child.wait() => break Stop::Exited(status),
            () = &mut deadline => break Stop::TimedOut,
        }
    };

    match stop {
        Stop::Exited(Ok(status)) => {
            group.disarm();
            out.exit_code = status.code();
            // Background children may hold the pipes open; don't wait on them forever.
            let _ = tokio::time::timeout(DRAIN_GRACE, async {
                while let Some(line) = rx.recv().await {
                    out.push(line);
                }
            })
            .await;
        }
        Stop::Exited(Err(e)) => {
            return Err(ToolError::failed(tool_name, format!("wait failed: {e}")));
        }
        Stop::TimedOut => {
            warn!(tool = tool_name, timeout_secs = limits.timeout.as_secs(), "Process timed out, killing");
            terminate(&mut child, &mut group).await;
            out.timed_out = true;
            while let Ok(line) = rx.try_recv() {
                out.push(line);
            }
        }
        Stop::LineLimit => {
            debug!(tool = tool_name, lines = out.lines, "Line limit reached, killing");
            terminate(&mut child, &mut group).await;
            out.line_limit_reached = true;
        }
    }

    drop(rx);
    for reader in &readers {
        reader.abort();
    }
    out.truncated |= budget.truncated.load(Ordering::Relaxed);

    debug!(
        tool = tool_name,
        exit_code = ?out.exit_code,
        timed_out = out.timed_out,
        bytes = out.output.len(),
        "Process finished"
    );
    Ok(out)
}

async fn terminate(child: &mut Child, group: &mut GroupGuard) {
    group.kill();
    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill failed");
    }
}

/// Kills the child's process group when dropped, unless disarmed.
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }

    /// The leader exited normally; its group id may be reused from here on.
    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal. An empty group yields ESRCH.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Bytes forwarded so far, shared by the stdout and stderr readers.
#[derive(Default)]
struct Budget {
    used: AtomicUsize,
    truncated: AtomicBool,
}

async fn forward_lines<R: AsyncRead + Unpin>(stream: R, tx: mpsc::Sender<String>, budget: Arc<Budget>) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        let remaining = MAX_OUTPUT_BYTES.saturating_sub(budget.used.load(Ordering::Relaxed));
        if remaining == 0 {
            break;
        }
        buf.clear();
        // `take` bounds a single line too, newline or not.
        match (&mut reader).take(remaining as u64).read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                let before = budget.used.fetch_add(n, Ordering::Relaxed);
                if before + n > MAX_OUTPUT_BYTES {
                    budget.truncated.store(true, Ordering::Relaxed);
                    buf.truncate(MAX_OUTPUT_BYTES.saturating_sub(before));
                    if buf.is_empty() {
                        break;
                    }
                }
                let mut line = String::from_utf8_lossy(&buf).into_owned();
                if !line.ends_with('\n') {
                    line.push('\n');
                }
                if tx.send(line).await.is_err() {
                    return;
                }
            }
        }
    }

    if reader.fill_buf().await.is_ok_and(|rest| !rest.is_empty()) {
        budget.truncated.store(true, Ordering::Relaxed);
        let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
    }
}
