//! Wish media: capture lifecycle and upload planning
//!
//! Browser bindings live in `platform::capture` and `platform::upload`.

pub mod recorder;
pub mod upload;

pub use recorder::{CaptureKind, Recorder, RecorderError, RecorderState, Recording, StopReason};
pub use upload::{
    CHUNK_SIZE, ChunkRange, HostResponse, MediaCategory, MediaDescriptor, UploadError, UploadPlan,
};
