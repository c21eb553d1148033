//! Stack trace capture.
//!
//! Capturing is best-effort: a [`StackTraceCapture`] returns `None` when no
//! trace is available and the report is sent without one.

use std::backtrace::{Backtrace, BacktraceStatus};

/// Path prefix shared by every frame of this crate.
const CRATE_FRAME_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

/// Frames of this module are capture machinery, not caller code.
const CAPTURE_MODULE: &str = module_path!();

/// Produces a display-ready stack trace for a report.
pub trait StackTraceCapture: Send + Sync {
    fn capture(&self) -> Option<String>;
}

/// Captures the current thread's backtrace with `std::backtrace`.
///
/// The trace is trimmed to start at the first frame of this crate, see
/// [`trim_to_crate_frames`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceCapture;

impl StackTraceCapture for BacktraceCapture {
    fn capture(&self) -> Option<String> {
        let backtrace = Backtrace::force_capture();
        match backtrace.status() {
            BacktraceStatus::Captured => Some(trim_to_crate_frames(&backtrace.to_string())),
            _ => None,
        }
    }
}

/// Never captures anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCapture;

impl StackTraceCapture for NoopCapture {
    fn capture(&self) -> Option<String> {
        None
    }
}

/// Drop the frames above the first frame of this crate.
///
/// Frames of the capture module itself are skipped. When no frame matches the
/// whole trace is returned unchanged.
pub fn trim_to_crate_frames(raw: &str) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let start = lines
        .iter()
        .position(|line| line.contains(CRATE_FRAME_PREFIX) && !line.contains(CAPTURE_MODULE));

    match start {
        Some(start) => lines[start..].join("\n"),
        None => raw.to_string(),
    }
}
