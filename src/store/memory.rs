//! In-memory schedule store for tests and demos.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;

use super::{
    AgendaItemRecord, CallbackRecord, Member, PersonalEventRecord, ScheduleStore,
    SchedulingTarget, SignupRecord, StoreResult,
};

/// Which store read to fail, for injecting partial failures in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceRead {
    Signups,
    Callbacks,
    AgendaItems,
    PersonalEvents,
    RecurringEvents,
}

#[derive(Default)]
struct Inner {
    signups: HashMap<String, Vec<SignupRecord>>,
    callbacks: HashMap<String, Vec<CallbackRecord>>,
    agenda_items: HashMap<String, Vec<AgendaItemRecord>>,
    personal_events: HashMap<String, Vec<PersonalEventRecord>>,
    rosters: HashMap<String, Vec<Member>>,
    targets: HashMap<String, SchedulingTarget>,
    failing: HashSet<(String, SourceRead)>,
}

/// In-memory [`ScheduleStore`] backend.
///
/// Seeded through builder-style `add_*` methods; individual reads can
/// be made to fail per member via [`fail_read`](Self::fail_read) so
/// degraded-report behavior is testable.
#[derive(Default)]
pub struct MemoryScheduleStore {
    inner: RwLock<Inner>,
}

impl MemoryScheduleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an audition signup for a member.
    pub async fn add_signup(&self, member_id: &str, record: SignupRecord) {
        let mut inner = self.inner.write().await;
        inner
            .signups
            .entry(member_id.to_string())
            .or_default()
            .push(record);
    }

    /// Seed an accepted callback for a member.
    pub async fn add_callback(&self, member_id: &str, record: CallbackRecord) {
        let mut inner = self.inner.write().await;
        inner
            .callbacks
            .entry(member_id.to_string())
            .or_default()
            .push(record);
    }

    /// Seed an eligible agenda item for a member.
    pub async fn add_agenda_item(&self, member_id: &str, record: AgendaItemRecord) {
        let mut inner = self.inner.write().await;
        inner
            .agenda_items
            .entry(member_id.to_string())
            .or_default()
            .push(record);
    }

    /// Seed a personal event (recurring or not) for a member.
    pub async fn add_personal_event(&self, member_id: &str, record: PersonalEventRecord) {
        debug!("Seeded personal event: {} ({})", record.title, record.id);
        let mut inner = self.inner.write().await;
        inner
            .personal_events
            .entry(member_id.to_string())
            .or_default()
            .push(record);
    }

    /// Add a member to a production's roster.
    pub async fn add_roster_member(&self, production_id: &str, member: Member) {
        let mut inner = self.inner.write().await;
        inner
            .rosters
            .entry(production_id.to_string())
            .or_default()
            .push(member);
    }

    /// Register a scheduling target.
    pub async fn add_target(&self, target: SchedulingTarget) {
        let mut inner = self.inner.write().await;
        inner.targets.insert(target.id.clone(), target);
    }

    /// Make one read fail for one member with a simulated timeout.
    pub async fn fail_read(&self, member_id: &str, read: SourceRead) {
        let mut inner = self.inner.write().await;
        inner.failing.insert((member_id.to_string(), read));
    }

    async fn check_failure(&self, member_id: &str, read: SourceRead) -> StoreResult<()> {
        let inner = self.inner.read().await;
        if inner.failing.contains(&(member_id.to_string(), read)) {
            return Err(StoreError::Timeout(5000));
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn member_signups(&self, member_id: &str) -> StoreResult<Vec<SignupRecord>> {
        self.check_failure(member_id, SourceRead::Signups).await?;
        let inner = self.inner.read().await;
        Ok(inner.signups.get(member_id).cloned().unwrap_or_default())
    }

    async fn member_accepted_callbacks(
        &self,
        member_id: &str,
    ) -> StoreResult<Vec<CallbackRecord>> {
        self.check_failure(member_id, SourceRead::Callbacks).await?;
        let inner = self.inner.read().await;
        Ok(inner.callbacks.get(member_id).cloned().unwrap_or_default())
    }

    async fn member_agenda_items(&self, member_id: &str) -> StoreResult<Vec<AgendaItemRecord>> {
        self.check_failure(member_id, SourceRead::AgendaItems).await?;
        let inner = self.inner.read().await;
        Ok(inner
            .agenda_items
            .get(member_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn member_personal_events(
        &self,
        member_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> StoreResult<Vec<PersonalEventRecord>> {
        self.check_failure(member_id, SourceRead::PersonalEvents)
            .await?;
        let inner = self.inner.read().await;
        // Server-side window filter, non-recurring records only.
        Ok(inner
            .personal_events
            .get(member_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.recurrence.is_none())
                    .filter(|e| {
                        let end = e.end.unwrap_or(e.start);
                        e.start < window_end && end >= window_start
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn member_recurring_events(
        &self,
        member_id: &str,
    ) -> StoreResult<Vec<PersonalEventRecord>> {
        self.check_failure(member_id, SourceRead::RecurringEvents)
            .await?;
        let inner = self.inner.read().await;
        Ok(inner
            .personal_events
            .get(member_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.recurrence.is_some())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn production_roster(&self, production_id: &str) -> StoreResult<Vec<Member>> {
        let inner = self.inner.read().await;
        inner
            .rosters
            .get(production_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("production {production_id}")))
    }

    async fn scheduling_target(&self, target_id: &str) -> StoreResult<Option<SchedulingTarget>> {
        let inner = self.inner.read().await;
        Ok(inner.targets.get(target_id).cloned())
    }
}
