//! # Posting workflow
//!
//! The retry-and-fallback engine: per group, open the composer, resolve the
//! editor, type, attach media, submit and capture evidence, recreating the
//! session between attempts.
//!
//! ## Module structure
//! - `model`: groups, content, media, attempt records and reports
//! - `wait`: settle points and the swappable `Sleeper`
//! - `composer`: composer overlay lookup
//! - `editor`: editor fallback chain and typing
//! - `media`: upload-control fallback chain
//! - `submit`: submit strategies
//! - `evidence`: screenshots
//! - `orchestrator`: the per-group retry loop

pub mod model;
pub mod wait;
pub mod composer;
pub mod editor;
pub mod media;
pub mod submit;
pub mod evidence;
pub mod orchestrator;

pub use model::{
    AttemptOutcome, AttemptRecord, GroupOutcome, GroupReport, GroupTarget,
    MediaAsset, MediaKind, PostContent, RunReport,
};
pub use wait::{Pause, RecordingSleeper, Settle, Sleeper, TokioSleeper, WaitPolicy};
pub use composer::ComposerLocator;
pub use editor::{EditorKind, EditorProbe, EditorResolver, ResolvedEditor};
pub use media::MediaUploader;
pub use submit::{PostSubmitter, SubmitStrategy};
pub use evidence::{Artifact, EvidenceRecorder};
pub use orchestrator::{GroupPostOrchestrator, RetryPolicy};
