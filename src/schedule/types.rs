//! Commitments, conflict reports, and the structured warning channel.
//!
//! Everything here is transient: commitments and reports are built
//! fresh for one conflict-detection call and discarded with it. The
//! only persisted entities (members, recurrence rules) live behind the
//! [`ScheduleStore`](crate::store::ScheduleStore) boundary.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::Member;

use super::interval::TimeInterval;

/// Which of the four commitment sources a commitment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentKind {
    /// An audition-slot signup.
    AuditionSignup,
    /// An accepted callback-slot invitation.
    Callback,
    /// An agenda item inside another rehearsal.
    RehearsalAgendaItem,
    /// A personal calendar event, possibly a recurrence instance.
    PersonalEvent,
}

impl CommitmentKind {
    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            CommitmentKind::AuditionSignup => "Audition Signup",
            CommitmentKind::Callback => "Callback",
            CommitmentKind::RehearsalAgendaItem => "Rehearsal",
            CommitmentKind::PersonalEvent => "Personal Event",
        }
    }
}

/// One calendar-occupying record for a member, normalized from any of
/// the four sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Commitment {
    /// Source the commitment was drawn from.
    pub kind: CommitmentKind,
    /// Identifier of the originating record (slot id, agenda item id,
    /// personal event id).
    pub source_id: String,
    /// Human-readable title ("Dentist", show title, agenda item name).
    pub title: String,
    /// The occupied interval.
    pub interval: TimeInterval,
}

impl Commitment {
    /// Identity key for merging duplicate entries: the same underlying
    /// event reported through several expanded occurrences collapses to
    /// one conflict line.
    pub fn dedup_key(&self) -> (CommitmentKind, &str) {
        (self.kind, self.title.as_str())
    }
}

/// A member together with every commitment of theirs that overlaps one
/// scheduling target.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MemberConflicts {
    /// The conflicted member.
    pub member: Member,
    /// All overlapping commitments, not just the first.
    pub commitments: Vec<Commitment>,
}

/// Structured warnings accompanying a report.
///
/// Soft failures degrade a report instead of aborting it; the UI can
/// render "could not fully verify conflicts for N members" instead of
/// implying certainty it doesn't have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// One commitment source could not be read for a member; the
    /// member's entry covers the remaining sources only.
    SourceUnavailable {
        member_id: String,
        source: CommitmentKind,
        detail: String,
    },
    /// A record carried `end < start` or missing times and was excluded
    /// from overlap testing.
    MalformedInterval {
        member_id: String,
        source: CommitmentKind,
        source_id: String,
    },
    /// A recurrence rule hit the expansion cap; its in-window instances
    /// may be incomplete.
    RecurrenceTruncated {
        member_id: String,
        event_id: String,
    },
    /// Every source failed for this member; "no conflicts" must not be
    /// inferred for them.
    MemberUnverified { member_id: String },
    /// The target's civil times produced no usable interval, so no
    /// member could be checked against it.
    TargetUnverifiable { target_id: String },
}

impl ReportWarning {
    /// The member or target a warning concerns.
    pub fn subject_id(&self) -> &str {
        match self {
            ReportWarning::SourceUnavailable { member_id, .. }
            | ReportWarning::MalformedInterval { member_id, .. }
            | ReportWarning::RecurrenceTruncated { member_id, .. }
            | ReportWarning::MemberUnverified { member_id } => member_id,
            ReportWarning::TargetUnverifiable { target_id } => target_id,
        }
    }
}

/// Conflict report for a single scheduling target.
///
/// Sparse: members with zero overlapping commitments are omitted.
/// Recomputed on every call over live commitment data, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConflictReport {
    /// The target that was checked.
    pub target_id: String,
    /// Conflicted members, sorted by display name.
    pub entries: Vec<MemberConflicts>,
    /// Soft failures encountered while building the report.
    pub warnings: Vec<ReportWarning>,
}

impl ConflictReport {
    /// Whether any member has a conflict.
    pub fn has_conflicts(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Whether the report is complete. A degraded report must be
    /// distinguishable from a clean "no conflicts".
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Members whose commitments could not be fully verified.
    pub fn unverified_member_ids(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter_map(|w| match w {
                ReportWarning::MemberUnverified { member_id } => Some(member_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Conflict reports for a batch of scheduling targets over one window.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchConflictReport {
    /// Per-target conflict entries, keyed by target id. Every requested
    /// target has a key, conflicted or not.
    pub by_target: HashMap<String, Vec<MemberConflicts>>,
    /// Soft failures, collected once per member rather than per target.
    pub warnings: Vec<ReportWarning>,
}

impl BatchConflictReport {
    /// Conflict entries for one target, empty if it had none.
    pub fn conflicts_for(&self, target_id: &str) -> &[MemberConflicts] {
        self.by_target
            .get(target_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the batch is complete.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
