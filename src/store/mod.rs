//! Read contracts against the external data layer.
//!
//! The data layer proper (schema, CRUD wrappers, auth) lives outside
//! this crate; conflict detection only needs the narrow reads defined
//! here. Records are typed at this boundary — nothing dynamically
//! shaped flows past it into the aggregator.

mod memory;

pub use memory::{MemoryScheduleStore, SourceRead};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::schedule::interval::{civil_interval, TimeInterval};
use crate::schedule::recurrence::RecurrenceRule;

/// Result type for store reads. Per-source failures are absorbed by
/// the aggregator; structural reads (roster, target) propagate.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Boundary Records
// ============================================================================

/// An audition-slot signup held by a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignupRecord {
    /// Identifier of the audition slot.
    pub slot_id: String,
    /// Start of the audition slot.
    pub slot_start: DateTime<Utc>,
    /// End of the audition slot.
    pub slot_end: DateTime<Utc>,
    /// Title of the show holding the audition.
    pub show_title: String,
}

impl SignupRecord {
    /// Create a signup with a generated slot id.
    pub fn new(show_title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            slot_id: uuid::Uuid::new_v4().to_string(),
            slot_start: start,
            slot_end: end,
            show_title: show_title.into(),
        }
    }
}

/// An accepted callback-slot invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CallbackRecord {
    /// Identifier of the callback slot.
    pub slot_id: String,
    /// Start of the callback slot.
    pub slot_start: DateTime<Utc>,
    /// End of the callback slot.
    pub slot_end: DateTime<Utc>,
    /// Title of the show running callbacks.
    pub show_title: String,
}

impl CallbackRecord {
    /// Create a callback with a generated slot id.
    pub fn new(show_title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            slot_id: uuid::Uuid::new_v4().to_string(),
            slot_start: start,
            slot_end: end,
            show_title: show_title.into(),
        }
    }
}

/// A rehearsal agenda item a member is eligible for, in any production
/// they belong to. Times are civil (venue wall clock).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AgendaItemRecord {
    /// Identifier of the agenda item.
    pub item_id: String,
    /// Date of the parent rehearsal event.
    pub date: NaiveDate,
    /// Start time-of-day in the venue zone.
    pub start_time: NaiveTime,
    /// End time-of-day in the venue zone.
    pub end_time: NaiveTime,
    /// Title of the show the rehearsal belongs to.
    pub show_title: String,
}

impl AgendaItemRecord {
    /// The item's absolute interval in the venue zone.
    pub fn interval(&self, zone: Tz) -> Option<TimeInterval> {
        civil_interval(self.date, self.start_time, self.end_time, zone)
    }
}

/// A personal calendar event. Timed events carry true instants;
/// all-day events are normalized to the full venue-zone day by the
/// aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonalEventRecord {
    /// Identifier of the event (or of the recurring definition).
    pub id: String,
    /// Event title.
    pub title: String,
    /// Start instant.
    pub start: DateTime<Utc>,
    /// End instant. `None` for records with missing times; such
    /// records are excluded from overlap testing with a warning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Whether this is an all-day event.
    #[serde(default)]
    pub all_day: bool,
    /// Recurrence rule, present only on recurring definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

impl PersonalEventRecord {
    /// Create a timed event with a generated id.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            start,
            end: Some(end),
            all_day: false,
            recurrence: None,
        }
    }

    /// Create an all-day event with a generated id. `start` marks the
    /// day; the aggregator expands it to `[00:00, 24:00)` venue time.
    pub fn all_day(title: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            start,
            end: None,
            all_day: true,
            recurrence: None,
        }
    }

    /// Attach a recurrence rule, making this a recurring definition.
    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }
}

// ============================================================================
// Roster and Targets
// ============================================================================

/// How a member belongs to a production's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RosterRole {
    /// Accepted role or ensemble slot.
    Cast,
    /// Production owner.
    Owner,
    /// Production team (stage management, design, crew).
    ProductionTeam,
}

/// A person on a production's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Member {
    /// Member identifier.
    pub id: String,
    /// Display name for reports.
    pub display_name: String,
    /// Profile photo, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Roster membership.
    pub role: RosterRole,
}

/// What kind of thing is being checked for conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A titled, timed sub-segment of a rehearsal event.
    AgendaItem,
    /// A production-level event (tech, performance, photo call).
    ProductionEvent,
}

/// The thing being checked for conflicts: one agenda item or one
/// production event. Times are civil (venue wall clock).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchedulingTarget {
    /// Target identifier.
    pub id: String,
    /// Agenda item title or production event type name.
    pub title: String,
    /// Kind of target.
    pub kind: TargetKind,
    /// Date of the parent event.
    pub date: NaiveDate,
    /// Start time-of-day in the venue zone.
    pub start_time: NaiveTime,
    /// End time-of-day in the venue zone.
    pub end_time: NaiveTime,
    /// Explicitly assigned members. Empty means full-call: the target
    /// is owed to the entire eligible roster.
    #[serde(default)]
    pub assigned_member_ids: Vec<String>,
}

impl SchedulingTarget {
    /// The target's absolute interval in the venue zone.
    pub fn interval(&self, zone: Tz) -> Option<TimeInterval> {
        civil_interval(self.date, self.start_time, self.end_time, zone)
    }
}

// ============================================================================
// ScheduleStore Trait
// ============================================================================

/// Read-only access to the commitment data this crate checks against.
///
/// Implementations wrap the hosted data layer. All reads are async;
/// none mutate. Unknown production or target ids should surface as
/// `StoreError::NotFound` / `Ok(None)` respectively so callers can
/// distinguish "no data" from "no record".
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Audition-slot signups for a member, unfiltered.
    async fn member_signups(&self, member_id: &str) -> StoreResult<Vec<SignupRecord>>;

    /// Accepted callback-slot invitations for a member, unfiltered.
    async fn member_accepted_callbacks(&self, member_id: &str)
        -> StoreResult<Vec<CallbackRecord>>;

    /// Agenda items a member is eligible for across all their
    /// productions, unfiltered.
    async fn member_agenda_items(&self, member_id: &str) -> StoreResult<Vec<AgendaItemRecord>>;

    /// Non-recurring personal events for a member, filtered server-side
    /// to those touching the window.
    async fn member_personal_events(
        &self,
        member_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> StoreResult<Vec<PersonalEventRecord>>;

    /// All of a member's recurring event definitions, unfiltered; the
    /// aggregator expands them against the query window.
    async fn member_recurring_events(
        &self,
        member_id: &str,
    ) -> StoreResult<Vec<PersonalEventRecord>>;

    /// The full roster (cast, owner, production team) of a production.
    async fn production_roster(&self, production_id: &str) -> StoreResult<Vec<Member>>;

    /// A scheduling target by id, `None` when no record backs the id.
    async fn scheduling_target(&self, target_id: &str) -> StoreResult<Option<SchedulingTarget>>;
}
