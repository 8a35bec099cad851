//! Publishing an audio asset to the marketplace.
//!
//! [`PublishOrchestrator`] is the entry point: it validates a
//! [`PublishBeatPayload`], downloads the asset into a scratch file, runs the
//! [`PublishSequencer`] against a fresh browser session and always cleans
//! both up before returning a [`PublishOutcome`].

mod orchestrator;
mod sequencer;
mod types;

pub use orchestrator::PublishOrchestrator;
pub use sequencer::{
    format_bpm, Credentials, PublishError, PublishSequencer, PublishStage, SequencerSettings,
    StageError,
};
pub use types::{
    FailureReason, PublishBeatPayload, PublishOutcome, PublishRequest, ValidationError,
};
