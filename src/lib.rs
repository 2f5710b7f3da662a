//! Callboard: scheduling conflict detection for theater production
//! management.
//!
//! A library crate that determines, for a rehearsal agenda item or
//! production event, which cast and crew members have a competing
//! commitment at an overlapping time — across audition signups,
//! callback invitations, other rehearsals, and personal calendars with
//! recurring events.

pub mod config;
pub mod error;
pub mod schedule;
pub mod store;

pub use config::{Config, SchedulingConfig};
pub use error::{CallboardError, ConfigError, Result, StoreError};
pub use schedule::{
    eligible_members_for, BatchConflictReport, Commitment, CommitmentAggregator, CommitmentKind,
    ConflictReport, ConflictResolver, CustomFrequency, EndCondition, Expansion, Frequency,
    MemberCommitments, MemberConflicts, RecurrenceRule, ReportWarning, TimeInterval,
};
pub use store::{
    AgendaItemRecord, CallbackRecord, Member, MemoryScheduleStore, PersonalEventRecord,
    RosterRole, ScheduleStore, SchedulingTarget, SignupRecord, SourceRead, StoreResult,
    TargetKind,
};
