//! Structured audit logging for scoring jobs.
//!
//! Events are emitted through `tracing` with the dedicated target
//! `scorepipe::audit`, so subscribers can route them separately from
//! diagnostic logs. This is structured logging, not a metrics exporter;
//! wiring a metrics sink is the caller's concern.

mod events;

pub use events::{
    emit_batch_completed, emit_score_completed, emit_score_failed, emit_score_started,
    AuditEvent, ScoreAuditEvent,
};
