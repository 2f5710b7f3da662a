//! Commitment aggregation across the four sources.
//!
//! For one member and one window, the aggregator issues the source
//! reads concurrently and folds everything into a normalized commitment
//! list. A source failing does not abort the aggregation: the member's
//! list simply covers fewer sources and the gap is recorded as a
//! warning. Only when every source fails is the member marked
//! unverified — "no data" must never masquerade as "no conflict".

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::config::SchedulingConfig;
use crate::error::StoreError;
use crate::store::{PersonalEventRecord, ScheduleStore};

use super::interval::{all_day, TimeInterval};
use super::types::{Commitment, CommitmentKind, ReportWarning};

/// A member's aggregated commitments plus any soft failures hit while
/// gathering them.
#[derive(Debug, Clone, Default)]
pub struct MemberCommitments {
    /// Normalized commitments overlapping the query window.
    pub commitments: Vec<Commitment>,
    /// Soft failures: unavailable sources, malformed records, truncated
    /// recurrence expansions.
    pub warnings: Vec<ReportWarning>,
}

/// Gathers commitments for members from a [`ScheduleStore`].
pub struct CommitmentAggregator<S: ScheduleStore> {
    store: Arc<S>,
    config: SchedulingConfig,
}

impl<S: ScheduleStore> CommitmentAggregator<S> {
    /// Create an aggregator over a store.
    pub fn new(store: Arc<S>, config: SchedulingConfig) -> Self {
        Self { store, config }
    }

    /// Gather all of a member's commitments overlapping `window`.
    ///
    /// `exclude_agenda_item` removes the agenda item currently being
    /// checked; an item cannot conflict with itself.
    pub async fn commitments_for(
        &self,
        member_id: &str,
        window: TimeInterval,
        exclude_agenda_item: Option<&str>,
    ) -> MemberCommitments {
        debug!("Aggregating commitments for member: {}", member_id);

        let (signups, callbacks, agenda_items, personal, recurring) = tokio::join!(
            self.store.member_signups(member_id),
            self.store.member_accepted_callbacks(member_id),
            self.store.member_agenda_items(member_id),
            self.store
                .member_personal_events(member_id, window.start, window.end),
            self.store.member_recurring_events(member_id),
        );

        let mut out = MemberCommitments::default();
        let mut failed_sources = 0usize;

        match signups {
            Ok(records) => {
                for record in records {
                    self.push_commitment(
                        &mut out,
                        member_id,
                        window,
                        CommitmentKind::AuditionSignup,
                        record.slot_id,
                        record.show_title,
                        TimeInterval::new(record.slot_start, record.slot_end),
                    );
                }
            }
            Err(err) => {
                failed_sources += 1;
                self.source_failed(&mut out, member_id, CommitmentKind::AuditionSignup, &err);
            }
        }

        match callbacks {
            Ok(records) => {
                for record in records {
                    self.push_commitment(
                        &mut out,
                        member_id,
                        window,
                        CommitmentKind::Callback,
                        record.slot_id,
                        record.show_title,
                        TimeInterval::new(record.slot_start, record.slot_end),
                    );
                }
            }
            Err(err) => {
                failed_sources += 1;
                self.source_failed(&mut out, member_id, CommitmentKind::Callback, &err);
            }
        }

        match agenda_items {
            Ok(records) => {
                for record in records {
                    if exclude_agenda_item == Some(record.item_id.as_str()) {
                        continue;
                    }
                    match record.interval(self.config.venue_zone) {
                        Some(interval) => self.push_commitment(
                            &mut out,
                            member_id,
                            window,
                            CommitmentKind::RehearsalAgendaItem,
                            record.item_id,
                            record.show_title,
                            interval,
                        ),
                        None => out.warnings.push(ReportWarning::MalformedInterval {
                            member_id: member_id.to_string(),
                            source: CommitmentKind::RehearsalAgendaItem,
                            source_id: record.item_id,
                        }),
                    }
                }
            }
            Err(err) => {
                failed_sources += 1;
                self.source_failed(
                    &mut out,
                    member_id,
                    CommitmentKind::RehearsalAgendaItem,
                    &err,
                );
            }
        }

        // The two personal-event reads form one source: the member is
        // only unverified on that source if both fail.
        let mut personal_failed = 0usize;
        match personal {
            Ok(records) => {
                for record in records {
                    self.push_personal(&mut out, member_id, window, &record);
                }
            }
            Err(err) => {
                personal_failed += 1;
                self.source_failed(&mut out, member_id, CommitmentKind::PersonalEvent, &err);
            }
        }
        match recurring {
            Ok(records) => {
                for record in records {
                    self.push_recurring(&mut out, member_id, window, &record);
                }
            }
            Err(err) => {
                personal_failed += 1;
                self.source_failed(&mut out, member_id, CommitmentKind::PersonalEvent, &err);
            }
        }
        if personal_failed == 2 {
            failed_sources += 1;
        }

        if failed_sources == 4 {
            warn!("All commitment sources failed for member: {}", member_id);
            out.warnings.push(ReportWarning::MemberUnverified {
                member_id: member_id.to_string(),
            });
        }

        out
    }

    /// Normalize, overlap-filter, and record one commitment.
    fn push_commitment(
        &self,
        out: &mut MemberCommitments,
        member_id: &str,
        window: TimeInterval,
        kind: CommitmentKind,
        source_id: String,
        title: String,
        interval: TimeInterval,
    ) {
        if !interval.is_well_formed() {
            out.warnings.push(ReportWarning::MalformedInterval {
                member_id: member_id.to_string(),
                source: kind,
                source_id,
            });
            return;
        }
        let interval = interval.with_min_duration(self.min_duration());
        if interval.overlaps(&window) {
            out.commitments.push(Commitment {
                kind,
                source_id,
                title,
                interval,
            });
        }
    }

    fn push_personal(
        &self,
        out: &mut MemberCommitments,
        member_id: &str,
        window: TimeInterval,
        record: &PersonalEventRecord,
    ) {
        let interval = match self.personal_interval(record) {
            Some(interval) => interval,
            None => {
                out.warnings.push(ReportWarning::MalformedInterval {
                    member_id: member_id.to_string(),
                    source: CommitmentKind::PersonalEvent,
                    source_id: record.id.clone(),
                });
                return;
            }
        };
        self.push_commitment(
            out,
            member_id,
            window,
            CommitmentKind::PersonalEvent,
            record.id.clone(),
            record.title.clone(),
            interval,
        );
    }

    fn push_recurring(
        &self,
        out: &mut MemberCommitments,
        member_id: &str,
        window: TimeInterval,
        record: &PersonalEventRecord,
    ) {
        let Some(rule) = record.recurrence.as_ref() else {
            // Non-recurring definitions are served by the direct read.
            return;
        };
        let first = match self.personal_interval(record) {
            Some(first) => first,
            None => {
                out.warnings.push(ReportWarning::MalformedInterval {
                    member_id: member_id.to_string(),
                    source: CommitmentKind::PersonalEvent,
                    source_id: record.id.clone(),
                });
                return;
            }
        };

        let expansion = rule.expand(first, window, self.config.max_expansion_steps);
        if expansion.truncated {
            warn!(
                "Recurrence expansion truncated for event: {} ({})",
                record.title, record.id
            );
            out.warnings.push(ReportWarning::RecurrenceTruncated {
                member_id: member_id.to_string(),
                event_id: record.id.clone(),
            });
        }
        for occurrence in expansion.occurrences {
            self.push_commitment(
                out,
                member_id,
                window,
                CommitmentKind::PersonalEvent,
                record.id.clone(),
                record.title.clone(),
                occurrence,
            );
        }
    }

    /// A personal event's concrete interval: all-day events span the
    /// full venue-zone day; timed events need an end instant.
    fn personal_interval(&self, record: &PersonalEventRecord) -> Option<TimeInterval> {
        if record.all_day {
            let date = record
                .start
                .with_timezone(&self.config.venue_zone)
                .date_naive();
            all_day(date, self.config.venue_zone)
        } else {
            let end = record.end?;
            Some(TimeInterval::new(record.start, end))
        }
    }

    fn source_failed(
        &self,
        out: &mut MemberCommitments,
        member_id: &str,
        source: CommitmentKind,
        err: &StoreError,
    ) {
        warn!(
            "Commitment source {} unavailable for member {}: {}",
            source.display_name(),
            member_id,
            err
        );
        out.warnings.push(ReportWarning::SourceUnavailable {
            member_id: member_id.to_string(),
            source,
            detail: err.to_string(),
        });
    }

    fn min_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.config.min_event_duration_minutes))
    }
}
