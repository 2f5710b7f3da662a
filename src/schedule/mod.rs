//! Scheduling conflict detection.
//!
//! This module answers one question for rehearsal planning: who on a
//! production's roster has a competing commitment when a given agenda
//! item or production event is scheduled. Commitments are drawn from
//! four sources — audition-slot signups, accepted callback invitations,
//! other rehearsal agenda items, and personal calendar events
//! (recurring ones expanded on the fly).
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    ConflictResolver                        │
//! │  - resolve: one target, eligible members, sparse report    │
//! │  - resolve_batch: fetch once per member, replay per target │
//! └────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │                 CommitmentAggregator                       │
//! │  - four source reads joined concurrently per member        │
//! │  - partial failures absorbed into warnings                 │
//! └────────────────────────────────────────────────────────────┘
//!              │                           │
//!              ▼                           ▼
//! ┌──────────────────────────┐  ┌──────────────────────────────┐
//! │    RecurrenceRule        │  │       ScheduleStore          │
//! │  - expand() into window  │  │  (external data layer reads) │
//! └──────────────────────────┘  └──────────────────────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────┐
//! │      TimeInterval        │
//! │  - half-open overlap     │
//! └──────────────────────────┘
//! ```
//!
//! Reports are recomputed from live data on every call; nothing here is
//! cached or persisted.

pub mod aggregator;
pub mod interval;
pub mod recurrence;
pub mod resolver;
pub mod types;

pub use aggregator::{CommitmentAggregator, MemberCommitments};
pub use interval::{all_day, civil_interval, combine_civil, TimeInterval};
pub use recurrence::{
    CustomFrequency, EndCondition, Expansion, Frequency, RecurrenceRule, MAX_EXPANSION_STEPS,
};
pub use resolver::{eligible_members_for, ConflictResolver};
pub use types::{
    BatchConflictReport, Commitment, CommitmentKind, ConflictReport, MemberConflicts,
    ReportWarning,
};
