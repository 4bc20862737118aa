//! Camera and microphone capture
//!
//! Drives the pure [`Recorder`] from `getUserMedia` and `MediaRecorder`.
//! A session owns the live stream until it is closed (or dropped); the
//! finished recording is delivered as a single `Blob`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobEvent, BlobPropertyBag, DomException, Event, MediaRecorder, MediaRecorderOptions,
    MediaStream, MediaStreamConstraints, MediaStreamTrack,
};

use super::events::{EventListener, clear_interval, set_interval};
use crate::media::{CaptureKind, Recorder, RecorderError, RecorderState, StopReason};

/// How often the duration limit is checked
const TICK_MS: i32 = 250;
/// `MediaRecorder` delivers data at this interval
const TIMESLICE_MS: i32 = 1000;

/// A finished capture, ready for upload
#[derive(Debug, Clone)]
pub struct CapturedMedia {
    pub blob: Blob,
    pub kind: CaptureKind,
    /// Seconds of recorded (unpaused) time
    pub duration: f64,
    pub reason: StopReason,
}

type FinishHandler = Box<dyn FnMut(Result<CapturedMedia, RecorderError>)>;

struct CaptureState {
    kind: CaptureKind,
    stream: MediaStream,
    media_recorder: MediaRecorder,
    recorder: RefCell<Recorder<Blob>>,
    tick_timer: Cell<Option<i32>>,
    tick_callback: RefCell<Option<Closure<dyn FnMut()>>>,
    listeners: RefCell<Vec<EventListener>>,
    on_finish: RefCell<Option<FinishHandler>>,
}

fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Map a rejected browser call to visitor-facing text
fn capture_error(value: &JsValue) -> RecorderError {
    match value.dyn_ref::<DomException>() {
        Some(e) => {
            log::warn!("Capture failed: {} ({})", e.name(), e.message());
            RecorderError::from_dom_exception(&e.name())
        }
        None => {
            log::warn!("Capture failed: {value:?}");
            RecorderError::NotSupported
        }
    }
}

fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

/// Join recorded chunks into one blob of type `mime`
fn assemble(chunks: &[Blob], mime: &str) -> Result<Blob, RecorderError> {
    let parts = Array::new();
    for chunk in chunks {
        parts.push(chunk);
    }
    let options = BlobPropertyBag::new();
    options.set_type(mime);
    Blob::new_with_blob_sequence_and_options(&parts, &options).map_err(|e| capture_error(&e))
}

impl CaptureState {
    fn on_data(&self, event: &Event) {
        let Some(blob) = event.dyn_ref::<BlobEvent>().and_then(|e| e.data()) else {
            return;
        };
        if blob.size() > 0.0 {
            self.recorder.borrow_mut().push_chunk(blob);
        }
    }

    fn on_tick(&self) {
        let limit_reached = self.recorder.borrow_mut().tick(now_ms());
        if limit_reached {
            self.stop_timer();
            // The final chunk and the stop event follow asynchronously
            let _ = self.media_recorder.stop();
        }
    }

    fn on_stop(&self) {
        self.stop_timer();
        {
            let mut recorder = self.recorder.borrow_mut();
            if recorder.is_active() {
                log::warn!("Recording ended by the device");
                let _ = recorder.stop(now_ms());
            }
        }

        let mime = match self.media_recorder.mime_type() {
            m if m.is_empty() => self.kind.fallback_mime().to_string(),
            m => m,
        };
        let result = self.recorder.borrow_mut().finish().and_then(|recording| {
            Ok(CapturedMedia {
                blob: assemble(&recording.chunks, &mime)?,
                kind: self.kind,
                duration: recording.duration,
                reason: recording.reason,
            })
        });
        match &result {
            Ok(media) => log::info!(
                "Captured {:.1}s of {} ({} bytes)",
                media.duration,
                mime,
                media.blob.size()
            ),
            Err(e) => log::warn!("Capture produced no recording: {e}"),
        }

        // Called outside the borrow so the handler may start a new take
        let handler = self.on_finish.borrow_mut().take();
        if let Some(mut handler) = handler {
            handler(result);
            let mut slot = self.on_finish.borrow_mut();
            if slot.is_none() {
                *slot = Some(handler);
            }
        }
    }

    fn start_timer(&self) {
        self.stop_timer();
        if let Some(callback) = self.tick_callback.borrow().as_ref() {
            self.tick_timer.set(set_interval(callback, TICK_MS));
        }
    }

    fn stop_timer(&self) {
        if let Some(id) = self.tick_timer.take() {
            clear_interval(id);
        }
    }
}

fn with_state(
    weak: &Weak<CaptureState>,
    f: impl Fn(&CaptureState, Event) + 'static,
) -> impl FnMut(Event) + 'static {
    let weak = weak.clone();
    move |event| {
        if let Some(state) = weak.upgrade() {
            f(&state, event);
        }
    }
}

/// An open camera/microphone with its recorder
pub struct CaptureSession {
    state: Option<Rc<CaptureState>>,
}

impl CaptureSession {
    /// Ask for device access and prepare a recorder that stops itself after
    /// `max_duration_secs`. Permission and device failures come back as
    /// [`RecorderError`] with visitor-facing text.
    pub async fn open(kind: CaptureKind, max_duration_secs: f64) -> Result<Self, RecorderError> {
        let window = web_sys::window().ok_or(RecorderError::NotSupported)?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|_| RecorderError::NotSupported)?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        constraints.set_video(&JsValue::from_bool(kind.wants_video()));
        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| capture_error(&e))?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| capture_error(&e))?
            .dyn_into()
            .map_err(|_| RecorderError::NotSupported)?;

        let options = MediaRecorderOptions::new();
        if let Some(mime) = kind.pick_mime(MediaRecorder::is_type_supported) {
            options.set_mime_type(mime);
        }
        let media_recorder =
            match MediaRecorder::new_with_media_stream_and_media_recorder_options(&stream, &options)
            {
                Ok(recorder) => recorder,
                Err(e) => {
                    stop_tracks(&stream);
                    return Err(capture_error(&e));
                }
            };

        let state = Rc::new(CaptureState {
            kind,
            stream,
            media_recorder,
            recorder: RefCell::new(Recorder::new(max_duration_secs)),
            tick_timer: Cell::new(None),
            tick_callback: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            on_finish: RefCell::new(None),
        });

        let weak = Rc::downgrade(&state);
        *state.tick_callback.borrow_mut() = Some(Closure::new({
            let weak = weak.clone();
            move || {
                if let Some(s) = weak.upgrade() {
                    s.on_tick();
                }
            }
        }));
        {
            let target = &state.media_recorder;
            let mut listeners = state.listeners.borrow_mut();
            listeners.push(EventListener::new(
                target,
                "dataavailable",
                true,
                with_state(&weak, |s, event| s.on_data(&event)),
            ));
            listeners.push(EventListener::new(
                target,
                "stop",
                true,
                with_state(&weak, |s, _| s.on_stop()),
            ));
            listeners.push(EventListener::new(target, "error", true, |event| {
                log::warn!("MediaRecorder error: {:?}", event.type_());
            }));
        }

        log::info!("Capture ready ({kind:?}, limit {max_duration_secs}s)");
        Ok(Self { state: Some(state) })
    }

    fn live(&self) -> Result<&CaptureState, RecorderError> {
        self.state.as_deref().ok_or(RecorderError::Closed)
    }

    /// Live camera/microphone stream for a preview element
    pub fn stream(&self) -> Option<&MediaStream> {
        self.state.as_deref().map(|s| &s.stream)
    }

    /// Receives every finished take (or why there is none)
    pub fn on_finish(&self, handler: impl FnMut(Result<CapturedMedia, RecorderError>) + 'static) {
        if let Some(state) = self.state.as_deref() {
            *state.on_finish.borrow_mut() = Some(Box::new(handler));
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
            .as_deref()
            .map(|s| s.recorder.borrow().state())
            .unwrap_or(RecorderState::Idle)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.state
            .as_deref()
            .map(|s| s.recorder.borrow().elapsed_secs(now_ms()))
            .unwrap_or(0.0)
    }

    pub fn start(&self) -> Result<(), RecorderError> {
        let s = self.live()?;
        s.recorder.borrow_mut().start(now_ms())?;
        if let Err(e) = s.media_recorder.start_with_time_slice(TIMESLICE_MS) {
            s.recorder.borrow_mut().reset();
            return Err(capture_error(&e));
        }
        s.start_timer();
        Ok(())
    }

    pub fn pause(&self) -> Result<(), RecorderError> {
        let s = self.live()?;
        s.recorder.borrow_mut().pause(now_ms())?;
        s.media_recorder.pause().map_err(|e| capture_error(&e))
    }

    pub fn resume(&self) -> Result<(), RecorderError> {
        let s = self.live()?;
        s.recorder.borrow_mut().resume(now_ms())?;
        s.media_recorder.resume().map_err(|e| capture_error(&e))
    }

    /// Stop recording; the result arrives through [`on_finish`](Self::on_finish)
    pub fn stop(&self) -> Result<(), RecorderError> {
        let s = self.live()?;
        s.recorder.borrow_mut().stop(now_ms())?;
        s.stop_timer();
        s.media_recorder.stop().map_err(|e| capture_error(&e))
    }

    /// Discard any take in progress and release the devices
    pub fn close(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        state.on_finish.borrow_mut().take();
        state.listeners.borrow_mut().clear();
        state.stop_timer();
        state.tick_callback.borrow_mut().take();
        // Throws when already inactive
        let _ = state.media_recorder.stop();
        stop_tracks(&state.stream);
        state.recorder.borrow_mut().reset();
        log::info!("Capture closed");
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
