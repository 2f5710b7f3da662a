//! Single-event and batch conflict resolution.
//!
//! The single resolver checks one scheduling target against its
//! eligible members. The batch resolver exists because running the
//! single path once per target over a date range would re-fetch every
//! member's commitments once per target; instead it fetches each
//! member's commitments for the whole window exactly once and replays
//! the overlap check per target in memory. Both paths funnel through
//! the same filter so batching cannot change results, only cost.
//!
//! Cancellation is cooperative: dropping a returned future cancels all
//! outstanding store fetches with it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::config::SchedulingConfig;
use crate::error::{CallboardError, Result, StoreError};
use crate::store::{Member, ScheduleStore, SchedulingTarget, TargetKind};

use super::aggregator::{CommitmentAggregator, MemberCommitments};
use super::interval::TimeInterval;
use super::types::{
    BatchConflictReport, Commitment, CommitmentKind, ConflictReport, MemberConflicts,
    ReportWarning,
};

/// Resolves scheduling conflicts against a [`ScheduleStore`].
pub struct ConflictResolver<S: ScheduleStore> {
    store: Arc<S>,
    aggregator: CommitmentAggregator<S>,
    config: SchedulingConfig,
}

impl<S: ScheduleStore> ConflictResolver<S> {
    /// Create a resolver over a store.
    pub fn new(store: Arc<S>, config: SchedulingConfig) -> Self {
        Self {
            aggregator: CommitmentAggregator::new(store.clone(), config.clone()),
            store,
            config,
        }
    }

    // ========================================================================
    // Single-Event Resolution
    // ========================================================================

    /// Check one target against a roster.
    ///
    /// Commitments for each eligible member are fetched concurrently
    /// (capped by `max_concurrent_fetches`) and tested against the
    /// target's interval. The report is sparse: members with no
    /// overlapping commitment are omitted. A target whose civil times
    /// produce no usable interval conflicts with nothing, but the
    /// report carries a [`ReportWarning::TargetUnverifiable`] so that
    /// is distinguishable from a clean "no conflicts".
    pub async fn resolve(
        &self,
        target: &SchedulingTarget,
        roster: &[Member],
    ) -> Result<ConflictReport> {
        debug!("Resolving conflicts for target: {}", target.id);

        let eligible = eligible_members_for(target, roster)?;
        let mut report = ConflictReport {
            target_id: target.id.clone(),
            entries: Vec::new(),
            warnings: Vec::new(),
        };

        let interval = target
            .interval(self.config.venue_zone)
            .filter(|i| i.is_well_formed() && !i.is_empty());
        let Some(target_interval) = interval else {
            report.warnings.push(ReportWarning::TargetUnverifiable {
                target_id: target.id.clone(),
            });
            return Ok(report);
        };

        let exclude = self_exclusion_id(target);
        let fetched: Vec<(Member, MemberCommitments)> = stream::iter(eligible)
            .map(|member| {
                let aggregator = &self.aggregator;
                async move {
                    let commitments = aggregator
                        .commitments_for(&member.id, target_interval, exclude)
                        .await;
                    (member, commitments)
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect()
            .await;

        for (member, mut gathered) in fetched {
            report.warnings.append(&mut gathered.warnings);
            let conflicts =
                conflicting_commitments(target, &target_interval, &gathered.commitments);
            if !conflicts.is_empty() {
                report.entries.push(MemberConflicts {
                    member,
                    commitments: conflicts,
                });
            }
        }
        sort_report(&mut report);

        Ok(report)
    }

    /// Check a target by id, resolving the roster of its production.
    ///
    /// Fails with [`CallboardError::TargetNotFound`] when no record
    /// backs the id — an empty report and a missing target must be
    /// distinguishable.
    pub async fn resolve_by_id(
        &self,
        target_id: &str,
        production_id: &str,
    ) -> Result<ConflictReport> {
        let target = self
            .store
            .scheduling_target(target_id)
            .await?
            .ok_or_else(|| CallboardError::TargetNotFound(target_id.to_string()))?;

        let roster = self
            .store
            .production_roster(production_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => {
                    CallboardError::ProductionNotFound(production_id.to_string())
                }
                other => other.into(),
            })?;

        self.resolve(&target, &roster).await
    }

    // ========================================================================
    // Batch Resolution
    // ========================================================================

    /// Check many targets over one window with O(members) fetches.
    ///
    /// Each roster member's commitments for the whole window are
    /// fetched exactly once; every target is then replayed against the
    /// cached lists in memory. Targets must lie within `window` for
    /// their conflicts to be complete. Warnings are collected once per
    /// member, not once per target; targets with no usable interval
    /// each contribute a [`ReportWarning::TargetUnverifiable`].
    pub async fn resolve_batch(
        &self,
        targets: &[SchedulingTarget],
        roster: &[Member],
        window: TimeInterval,
    ) -> Result<BatchConflictReport> {
        debug!(
            "Batch-resolving {} targets across {} members",
            targets.len(),
            roster.len()
        );

        let mut seen = HashSet::new();
        let members: Vec<&Member> = roster.iter().filter(|m| seen.insert(m.id.as_str())).collect();

        // Fetch once per member; no self-exclusion here, it is applied
        // per target at replay time.
        let fetched: Vec<(String, MemberCommitments)> = stream::iter(&members)
            .map(|member| {
                let aggregator = &self.aggregator;
                async move {
                    let commitments = aggregator.commitments_for(&member.id, window, None).await;
                    (member.id.clone(), commitments)
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect()
            .await;

        let mut warnings = Vec::new();
        let mut cache: HashMap<String, Vec<Commitment>> = HashMap::new();
        for (member_id, mut gathered) in fetched {
            warnings.append(&mut gathered.warnings);
            cache.insert(member_id, gathered.commitments);
        }
        let mut by_target = HashMap::with_capacity(targets.len());
        for target in targets {
            let mut entries = Vec::new();
            let interval = target
                .interval(self.config.venue_zone)
                .filter(|i| i.is_well_formed() && !i.is_empty());
            match interval {
                Some(target_interval) => {
                    for member in eligible_members_for(target, roster)? {
                        let Some(commitments) = cache.get(&member.id) else {
                            continue;
                        };
                        let conflicts =
                            conflicting_commitments(target, &target_interval, commitments);
                        if !conflicts.is_empty() {
                            entries.push(MemberConflicts {
                                member,
                                commitments: conflicts,
                            });
                        }
                    }
                }
                None => warnings.push(ReportWarning::TargetUnverifiable {
                    target_id: target.id.clone(),
                }),
            }
            sort_entries(&mut entries);
            by_target.insert(target.id.clone(), entries);
        }
        warnings.sort_by(|a, b| a.subject_id().cmp(b.subject_id()));

        Ok(BatchConflictReport { by_target, warnings })
    }
}

// ============================================================================
// Eligibility Policy
// ============================================================================

/// The members a target is owed to.
///
/// An explicit assignment list is resolved against the roster; an
/// assigned id with no roster backing is a hard error, so callers can
/// distinguish "no conflicts" from a dangling id. An empty assignment
/// list means full-call: the entire roster — cast, owner, and
/// production team alike — deduplicated by member id. This is the one
/// place the full-call policy lives; both resolution paths use it.
pub fn eligible_members_for(target: &SchedulingTarget, roster: &[Member]) -> Result<Vec<Member>> {
    let mut seen = HashSet::new();
    if target.assigned_member_ids.is_empty() {
        return Ok(roster
            .iter()
            .filter(|m| seen.insert(m.id.clone()))
            .cloned()
            .collect());
    }

    let by_id: HashMap<&str, &Member> = roster.iter().map(|m| (m.id.as_str(), m)).collect();
    let mut eligible = Vec::with_capacity(target.assigned_member_ids.len());
    for id in &target.assigned_member_ids {
        let member = by_id
            .get(id.as_str())
            .ok_or_else(|| CallboardError::MemberNotFound(id.clone()))?;
        if seen.insert(id.clone()) {
            eligible.push((*member).clone());
        }
    }
    Ok(eligible)
}

/// Agenda items must not conflict with themselves; production events
/// have no agenda-item counterpart to exclude.
fn self_exclusion_id(target: &SchedulingTarget) -> Option<&str> {
    match target.kind {
        TargetKind::AgendaItem => Some(target.id.as_str()),
        TargetKind::ProductionEvent => None,
    }
}

/// The shared conflict filter: self-exclusion, overlap against the
/// target's interval, and merging of duplicate entries by the
/// `(kind, title)` identity key. Both resolution paths use this, which
/// is what keeps batch results identical to single-path results.
fn conflicting_commitments(
    target: &SchedulingTarget,
    target_interval: &TimeInterval,
    commitments: &[Commitment],
) -> Vec<Commitment> {
    let exclude = self_exclusion_id(target);
    let mut seen = HashSet::new();
    commitments
        .iter()
        .filter(|c| {
            !(c.kind == CommitmentKind::RehearsalAgendaItem
                && exclude == Some(c.source_id.as_str()))
        })
        .filter(|c| c.interval.overlaps(target_interval))
        .filter(|c| seen.insert((c.kind, c.title.clone())))
        .cloned()
        .collect()
}

fn sort_entries(entries: &mut [MemberConflicts]) {
    entries.sort_by(|a, b| {
        a.member
            .display_name
            .cmp(&b.member.display_name)
            .then_with(|| a.member.id.cmp(&b.member.id))
    });
}

fn sort_report(report: &mut ConflictReport) {
    sort_entries(&mut report.entries);
    report
        .warnings
        .sort_by(|a, b| a.subject_id().cmp(b.subject_id()));
}
