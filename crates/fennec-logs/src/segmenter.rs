//! Session segmentation engine.
//!
//! Splits a logcat stream into sessions. A line containing the begin sentinel
//! opens a session file named after the line's timestamp; every line is
//! appended while a session is open; a line containing the end sentinel
//! closes it. A session whose file already exists is skipped, so replaying a
//! capture never overwrites earlier output.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::SegmenterConfig;
use crate::sink::{DirectoryMedium, OutputMedium};
use crate::timestamp::{derive_timestamp, log_filename, Clock, SystemClock};

/// Why a begin sentinel did not open a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// A file with the derived name already exists
    #[error("already captured")]
    AlreadyCaptured,
    /// The file could not be created
    #[error("couldn't create file: {0}")]
    CreateFailed(String),
}

/// What processing a line did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmenterAction {
    Opened(PathBuf),
    Skipped { path: PathBuf, reason: SkipReason },
    Appended,
    Closed { path: PathBuf, lines: usize },
    /// Writing or flushing failed; the session ended with `lines` written
    Dropped {
        path: PathBuf,
        lines: usize,
        error: String,
    },
}

/// Errors from the driver.
#[derive(Debug, Error)]
pub enum SegmenterError {
    /// Reading the input stream failed
    #[error("Read error: {0}")]
    Read(#[from] io::Error),
}

struct Session<S> {
    path: PathBuf,
    sink: S,
    lines: usize,
}

/// Two-state (idle/recording) segmenter owning at most one open session.
pub struct Segmenter<M: OutputMedium = DirectoryMedium, C: Clock = SystemClock> {
    config: SegmenterConfig,
    medium: M,
    clock: C,
    current: Option<Session<M::Sink>>,
}

impl Segmenter<DirectoryMedium, SystemClock> {
    /// Segmenter writing to the configured directory, using the wall clock.
    pub fn new(config: SegmenterConfig) -> Self {
        Self::with_parts(config, DirectoryMedium, SystemClock)
    }
}

impl<M: OutputMedium, C: Clock> Segmenter<M, C> {
    pub fn with_parts(config: SegmenterConfig, medium: M, clock: C) -> Self {
        Self {
            config,
            medium,
            clock,
            current: None,
        }
    }

    /// Whether a session is open.
    pub fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    /// Path of the open session, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|s| s.path.as_path())
    }

    /// Process one raw line, including its trailing newline if it had one.
    ///
    /// The begin check runs first, so a begin line lands in the session it
    /// opens. The end check runs after the append, so an end line is the
    /// last line of its session. Failures are reported as actions and never
    /// discard the actions that came before them.
    pub fn process_line(&mut self, line: &str) -> Vec<SegmenterAction> {
        let mut actions = Vec::new();

        if line.contains(self.config.begin_sentinel.as_str()) {
            self.begin_session(line, &mut actions);
        }

        if let Some(session) = self.current.as_mut() {
            match session.sink.write_all(line.as_bytes()) {
                Ok(()) => {
                    session.lines += 1;
                    trace!(path = %session.path.display(), lines = session.lines, "Appended line");
                    actions.push(SegmenterAction::Appended);
                }
                Err(err) => {
                    if let Some(session) = self.current.take() {
                        actions.push(drop_session(session, &err));
                    }
                }
            }
        }

        if line.contains(self.config.end_sentinel.as_str()) {
            if let Some(session) = self.current.take() {
                actions.push(close_session(session));
            }
        }

        actions
    }

    /// Close a session left open at end of input.
    pub fn finish(&mut self) -> Option<SegmenterAction> {
        let session = self.current.take()?;
        debug!(path = %session.path.display(), "Input ended inside a session");
        Some(close_session(session))
    }

    fn begin_session(&mut self, line: &str, actions: &mut Vec<SegmenterAction>) {
        let timestamp = derive_timestamp(line, &self.config.level_delimiter, &self.clock);
        let path = log_filename(&self.config.directory, &self.config.prefix, timestamp);

        if self.medium.exists(&path) {
            info!(path = %path.display(), "Session already captured, skipping");
            actions.push(SegmenterAction::Skipped {
                path,
                reason: SkipReason::AlreadyCaptured,
            });
            return;
        }

        let sink = match self.medium.create(&path) {
            Ok(sink) => sink,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                info!(path = %path.display(), "Session already captured, skipping");
                actions.push(SegmenterAction::Skipped {
                    path,
                    reason: SkipReason::AlreadyCaptured,
                });
                return;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Could not create session file");
                actions.push(SegmenterAction::Skipped {
                    path,
                    reason: SkipReason::CreateFailed(err.to_string()),
                });
                return;
            }
        };

        // A new begin sentinel supersedes a session that never saw its end.
        // The new session opens even if the old one fails to flush.
        if let Some(previous) = self.current.take() {
            actions.push(close_session(previous));
        }

        info!(path = %path.display(), timestamp, "Opened session");
        self.current = Some(Session {
            path: path.clone(),
            sink,
            lines: 0,
        });
        actions.push(SegmenterAction::Opened(path));
    }
}

fn close_session<S: Write>(mut session: Session<S>) -> SegmenterAction {
    if let Err(err) = session.sink.flush() {
        return drop_session(session, &err);
    }
    info!(path = %session.path.display(), lines = session.lines, "Closed session");
    SegmenterAction::Closed {
        path: session.path,
        lines: session.lines,
    }
}

fn drop_session<S>(session: Session<S>, err: &io::Error) -> SegmenterAction {
    warn!(
        path = %session.path.display(),
        lines = session.lines,
        error = %err,
        "Dropped session after write failure"
    );
    SegmenterAction::Dropped {
        path: session.path,
        lines: session.lines,
        error: err.to_string(),
    }
}

/// Totals from a [`segment_lines`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentSummary {
    /// Lines read from the input
    pub lines: usize,
    /// Session files opened, in order
    pub sessions: Vec<PathBuf>,
    /// Begin sentinels that did not open a session
    pub skipped: usize,
    /// Sessions dropped after a write failure
    pub write_errors: usize,
    /// Reading stopped early on request
    pub interrupted: bool,
}

impl SegmentSummary {
    fn record(&mut self, action: &SegmenterAction) {
        match action {
            SegmenterAction::Opened(path) => self.sessions.push(path.clone()),
            SegmenterAction::Skipped { .. } => self.skipped += 1,
            SegmenterAction::Dropped { .. } => self.write_errors += 1,
            SegmenterAction::Appended | SegmenterAction::Closed { .. } => {}
        }
    }
}

/// Feed every line of `reader` through `segmenter`, then finish it.
///
/// Lines are read as raw bytes and decoded lossily, so stray non-UTF-8 bytes
/// in device output do not stop the capture. Write failures drop the
/// affected session and processing continues; read failures are returned.
pub fn segment_lines<R, M, C, F>(
    reader: R,
    segmenter: &mut Segmenter<M, C>,
    on_action: F,
) -> Result<SegmentSummary, SegmenterError>
where
    R: BufRead,
    M: OutputMedium,
    C: Clock,
    F: FnMut(&SegmenterAction),
{
    segment_lines_until(reader, segmenter, &AtomicBool::new(false), on_action)
}

/// Like [`segment_lines`], but stops reading once `stop` is set.
///
/// `stop` is checked before each line, so a line already being read is
/// still processed. The segmenter is finished either way.
pub fn segment_lines_until<R, M, C, F>(
    mut reader: R,
    segmenter: &mut Segmenter<M, C>,
    stop: &AtomicBool,
    mut on_action: F,
) -> Result<SegmentSummary, SegmenterError>
where
    R: BufRead,
    M: OutputMedium,
    C: Clock,
    F: FnMut(&SegmenterAction),
{
    let mut summary = SegmentSummary::default();
    let mut buf = Vec::new();

    loop {
        if stop.load(Ordering::SeqCst) {
            info!(lines = summary.lines, "Interrupted, finishing");
            summary.interrupted = true;
            break;
        }

        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        summary.lines += 1;

        let line = String::from_utf8_lossy(&buf);
        for action in &segmenter.process_line(&line) {
            summary.record(action);
            on_action(action);
        }
    }

    if let Some(action) = segmenter.finish() {
        summary.record(&action);
        on_action(&action);
    }

    debug!(
        lines = summary.lines,
        sessions = summary.sessions.len(),
        skipped = summary.skipped,
        "Finished segmenting input"
    );

    Ok(summary)
}
