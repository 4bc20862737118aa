//! Media capture lifecycle
//!
//! Tracks recorder state, elapsed time and collected chunks. The browser
//! layer feeds it timestamps (ms) and data chunks; everything here is
//! deterministic so the lifecycle can be tested without a device.

use thiserror::Error;

use super::upload::MediaCategory;

/// What a capture session records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Camera plus microphone
    Video,
    /// Microphone only
    Audio,
}

impl CaptureKind {
    pub fn category(&self) -> MediaCategory {
        match self {
            CaptureKind::Video => MediaCategory::Video,
            CaptureKind::Audio => MediaCategory::Audio,
        }
    }

    pub fn wants_video(&self) -> bool {
        matches!(self, CaptureKind::Video)
    }

    /// Container formats to try, most preferred first
    pub fn mime_candidates(&self) -> &'static [&'static str] {
        match self {
            CaptureKind::Video => &[
                "video/webm;codecs=vp9,opus",
                "video/webm;codecs=vp8,opus",
                "video/webm",
                "video/mp4",
            ],
            CaptureKind::Audio => &["audio/webm;codecs=opus", "audio/webm", "audio/ogg", "audio/mp4"],
        }
    }

    /// First candidate the platform supports; `None` leaves the choice to it
    pub fn pick_mime(&self, supported: impl Fn(&str) -> bool) -> Option<&'static str> {
        self.mime_candidates().iter().copied().find(|mime| supported(mime))
    }

    /// Type of the assembled blob when the platform reports none
    pub fn fallback_mime(&self) -> &'static str {
        match self {
            CaptureKind::Video => "video/webm",
            CaptureKind::Audio => "audio/webm",
        }
    }
}

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
    Stopped,
}

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    User,
    MaxDuration,
}

/// Capture failures (Display is shown to the visitor)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("Permission to use the camera or microphone was denied.")]
    PermissionDenied,
    #[error("No camera or microphone was found.")]
    NoDevice,
    #[error("Recording is not supported in this browser.")]
    NotSupported,
    #[error("Cannot {action} while the recorder is {state:?}.")]
    InvalidState {
        action: &'static str,
        state: RecorderState,
    },
    #[error("Nothing was recorded.")]
    Empty,
    #[error("The recorder has been closed.")]
    Closed,
}

impl RecorderError {
    /// Map a `getUserMedia` DOMException name
    pub fn from_dom_exception(name: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" => RecorderError::PermissionDenied,
            "NotFoundError" | "OverconstrainedError" | "NotReadableError" => {
                RecorderError::NoDevice
            }
            _ => RecorderError::NotSupported,
        }
    }
}

/// Finished recording
#[derive(Debug, Clone, PartialEq)]
pub struct Recording<C> {
    pub chunks: Vec<C>,
    /// Seconds of recorded (unpaused) time
    pub duration: f64,
    pub reason: StopReason,
}

/// Recording session state machine
#[derive(Debug, Clone)]
pub struct Recorder<C> {
    state: RecorderState,
    max_duration_ms: f64,
    /// Recorded time banked before the current run
    banked_ms: f64,
    /// Start of the current unpaused run
    run_started_at: Option<f64>,
    chunks: Vec<C>,
    reason: Option<StopReason>,
}

impl<C> Recorder<C> {
    /// New recorder that stops itself after `max_duration_secs`
    pub fn new(max_duration_secs: f64) -> Self {
        Self {
            state: RecorderState::Idle,
            max_duration_ms: max_duration_secs.max(0.0) * 1000.0,
            banked_ms: 0.0,
            run_started_at: None,
            chunks: Vec::new(),
            reason: None,
        }
    }

    #[inline]
    pub fn state(&self) -> RecorderState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, RecorderState::Recording | RecorderState::Paused)
    }

    fn invalid(&self, action: &'static str) -> RecorderError {
        RecorderError::InvalidState {
            action,
            state: self.state,
        }
    }

    pub fn start(&mut self, now_ms: f64) -> Result<(), RecorderError> {
        if self.is_active() {
            return Err(self.invalid("start"));
        }
        self.state = RecorderState::Recording;
        self.banked_ms = 0.0;
        self.run_started_at = Some(now_ms);
        self.chunks.clear();
        self.reason = None;
        log::debug!("Recording started");
        Ok(())
    }

    pub fn pause(&mut self, now_ms: f64) -> Result<(), RecorderError> {
        if self.state != RecorderState::Recording {
            return Err(self.invalid("pause"));
        }
        self.bank(now_ms);
        self.state = RecorderState::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now_ms: f64) -> Result<(), RecorderError> {
        if self.state != RecorderState::Paused {
            return Err(self.invalid("resume"));
        }
        self.run_started_at = Some(now_ms);
        self.state = RecorderState::Recording;
        Ok(())
    }

    pub fn stop(&mut self, now_ms: f64) -> Result<(), RecorderError> {
        if !self.is_active() {
            return Err(self.invalid("stop"));
        }
        self.finish_run(now_ms, StopReason::User);
        Ok(())
    }

    /// Seconds recorded so far (paused spans excluded)
    pub fn elapsed_secs(&self, now_ms: f64) -> f64 {
        let running = self
            .run_started_at
            .map(|start| (now_ms - start).max(0.0))
            .unwrap_or(0.0);
        (self.banked_ms + running).min(self.max_duration_ms) / 1000.0
    }

    /// Periodic timer hook. Returns `true` when this call auto-stopped.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.state != RecorderState::Recording {
            return false;
        }
        if self.elapsed_secs(now_ms) * 1000.0 >= self.max_duration_ms {
            log::info!("Recording reached its {}s limit", self.max_duration_ms / 1000.0);
            self.finish_run(now_ms, StopReason::MaxDuration);
            return true;
        }
        false
    }

    /// Data delivered by the platform recorder
    pub fn push_chunk(&mut self, chunk: C) {
        // The final chunk usually arrives just after stop
        if self.state != RecorderState::Idle {
            self.chunks.push(chunk);
        }
    }

    /// Hand over the recording and return to idle
    pub fn finish(&mut self) -> Result<Recording<C>, RecorderError> {
        if self.state != RecorderState::Stopped {
            return Err(self.invalid("finish"));
        }
        let chunks = std::mem::take(&mut self.chunks);
        self.state = RecorderState::Idle;
        if chunks.is_empty() {
            return Err(RecorderError::Empty);
        }
        Ok(Recording {
            chunks,
            duration: self.banked_ms / 1000.0,
            reason: self.reason.take().unwrap_or(StopReason::User),
        })
    }

    /// Abandon the session and drop collected data
    pub fn reset(&mut self) {
        *self = Self {
            max_duration_ms: self.max_duration_ms,
            ..Self::new(0.0)
        };
    }

    fn bank(&mut self, now_ms: f64) {
        if let Some(start) = self.run_started_at.take() {
            self.banked_ms = (self.banked_ms + (now_ms - start).max(0.0)).min(self.max_duration_ms);
        }
    }

    fn finish_run(&mut self, now_ms: f64, reason: StopReason) {
        self.bank(now_ms);
        self.state = RecorderState::Stopped;
        self.reason = Some(reason);
        log::debug!("Recording stopped after {:.1}s ({reason:?})", self.banked_ms / 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_pause_resume_stop() {
        let mut rec: Recorder<u8> = Recorder::new(60.0);
        rec.start(0.0).unwrap();
        rec.push_chunk(1);
        rec.pause(4_000.0).unwrap();
        assert_eq!(rec.elapsed_secs(10_000.0), 4.0);
        rec.resume(10_000.0).unwrap();
        rec.push_chunk(2);
        rec.stop(12_000.0).unwrap();
        rec.push_chunk(3);

        let recording = rec.finish().unwrap();
        assert_eq!(recording.chunks, vec![1, 2, 3]);
        assert_eq!(recording.duration, 6.0);
        assert_eq!(recording.reason, StopReason::User);
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[test]
    fn test_auto_stop_at_max_duration() {
        let mut rec: Recorder<u8> = Recorder::new(30.0);
        rec.start(1_000.0).unwrap();
        rec.push_chunk(9);
        assert!(!rec.tick(20_000.0));
        assert!(rec.tick(31_000.0));
        assert_eq!(rec.state(), RecorderState::Stopped);
        // Only the edge reports
        assert!(!rec.tick(32_000.0));

        let recording = rec.finish().unwrap();
        assert_eq!(recording.duration, 30.0);
        assert_eq!(recording.reason, StopReason::MaxDuration);
    }

    #[test]
    fn test_elapsed_capped_at_max() {
        let mut rec: Recorder<u8> = Recorder::new(5.0);
        rec.start(0.0).unwrap();
        assert_eq!(rec.elapsed_secs(9_000.0), 5.0);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut rec: Recorder<u8> = Recorder::new(10.0);
        assert!(matches!(
            rec.pause(0.0),
            Err(RecorderError::InvalidState { action: "pause", .. })
        ));
        assert!(rec.stop(0.0).is_err());
        rec.start(0.0).unwrap();
        assert!(rec.start(1.0).is_err());
        assert!(rec.resume(1.0).is_err());
        assert!(rec.finish().is_err());
    }

    #[test]
    fn test_empty_recording() {
        let mut rec: Recorder<u8> = Recorder::new(10.0);
        rec.start(0.0).unwrap();
        rec.stop(500.0).unwrap();
        assert_eq!(rec.finish(), Err(RecorderError::Empty));
    }

    #[test]
    fn test_restart_clears_previous_take() {
        let mut rec: Recorder<u8> = Recorder::new(10.0);
        rec.start(0.0).unwrap();
        rec.push_chunk(1);
        rec.stop(1_000.0).unwrap();
        rec.start(2_000.0).unwrap();
        rec.push_chunk(2);
        rec.stop(2_500.0).unwrap();
        let recording = rec.finish().unwrap();
        assert_eq!(recording.chunks, vec![2]);
        assert_eq!(recording.duration, 0.5);
    }

    #[test]
    fn test_dom_exception_messages() {
        let err = RecorderError::from_dom_exception("NotAllowedError");
        assert_eq!(err, RecorderError::PermissionDenied);
        assert_eq!(
            err.to_string(),
            "Permission to use the camera or microphone was denied."
        );
        assert_eq!(RecorderError::from_dom_exception("NotFoundError"), RecorderError::NoDevice);
        assert_eq!(RecorderError::from_dom_exception("Weird"), RecorderError::NotSupported);
    }

    #[test]
    fn test_pick_mime_prefers_first_supported() {
        let safari = |mime: &str| mime == "video/mp4" || mime == "audio/mp4";
        assert_eq!(CaptureKind::Video.pick_mime(safari), Some("video/mp4"));
        assert_eq!(CaptureKind::Audio.pick_mime(safari), Some("audio/mp4"));

        let chrome = |mime: &str| mime.starts_with("video/webm") || mime.starts_with("audio/webm");
        assert_eq!(
            CaptureKind::Video.pick_mime(chrome),
            Some("video/webm;codecs=vp9,opus")
        );
        assert_eq!(CaptureKind::Audio.pick_mime(|_| false), None);
        assert_eq!(CaptureKind::Audio.category(), MediaCategory::Audio);
        assert!(!CaptureKind::Audio.wants_video());
    }

    #[test]
    fn test_reset_keeps_limit() {
        let mut rec: Recorder<u8> = Recorder::new(10.0);
        rec.start(0.0).unwrap();
        rec.push_chunk(1);
        rec.reset();
        assert_eq!(rec.state(), RecorderState::Idle);
        rec.start(0.0).unwrap();
        assert!(rec.tick(10_000.0));
    }
}
