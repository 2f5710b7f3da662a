//! End-to-end conflict detection tests over the in-memory store.
//!
//! These exercise the full path: store reads, commitment aggregation,
//! recurrence expansion, and both resolution paths, including the
//! batch-equivalence and partial-failure guarantees.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use callboard::{
    AgendaItemRecord, CallbackRecord, CommitmentKind, ConflictResolver, Member,
    MemoryScheduleStore, PersonalEventRecord, RecurrenceRule, ReportWarning, RosterRole,
    SchedulingConfig, SchedulingTarget, SignupRecord, SourceRead, TargetKind, TimeInterval,
};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn member(id: &str, name: &str, role: RosterRole) -> Member {
    Member {
        id: id.to_string(),
        display_name: name.to_string(),
        photo_url: None,
        role,
    }
}

fn target(
    id: &str,
    title: &str,
    date: (i32, u32, u32),
    start: (u32, u32),
    end: (u32, u32),
    assigned: &[&str],
) -> SchedulingTarget {
    SchedulingTarget {
        id: id.to_string(),
        title: title.to_string(),
        kind: TargetKind::AgendaItem,
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        assigned_member_ids: assigned.iter().map(|s| s.to_string()).collect(),
    }
}

fn roster() -> Vec<Member> {
    vec![
        member("m1", "Ada", RosterRole::Cast),
        member("m2", "Ben", RosterRole::Cast),
        member("m3", "Cyn", RosterRole::Owner),
        member("m4", "Dee", RosterRole::ProductionTeam),
    ]
}

async fn seeded_store() -> Arc<MemoryScheduleStore> {
    let store = Arc::new(MemoryScheduleStore::new());

    // Ada: audition signup on March 5, 13:45-14:00.
    store
        .add_signup(
            "m1",
            SignupRecord::new("Hamlet", utc(2024, 3, 5, 13, 45), utc(2024, 3, 5, 14, 0)),
        )
        .await;

    // Ben: weekly band practice, Wednesdays 18:00-20:00 since January.
    store
        .add_personal_event(
            "m2",
            PersonalEventRecord::new(
                "Band Practice",
                utc(2024, 1, 3, 18, 0),
                utc(2024, 1, 3, 20, 0),
            )
            .with_recurrence(RecurrenceRule::weekly_on([Weekday::Wed])),
        )
        .await;

    // Cyn: callback slot on March 6, 18:30-19:00.
    store
        .add_callback(
            "m3",
            CallbackRecord::new("Macbeth", utc(2024, 3, 6, 18, 30), utc(2024, 3, 6, 19, 0)),
        )
        .await;

    // Dee: agenda item in another production, March 5, 13:00-15:00.
    store
        .add_agenda_item(
            "m4",
            AgendaItemRecord {
                item_id: "other-item".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                start_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                show_title: "As You Like It".to_string(),
            },
        )
        .await;

    store
}

fn resolver(store: Arc<MemoryScheduleStore>) -> ConflictResolver<MemoryScheduleStore> {
    ConflictResolver::new(store, SchedulingConfig::default())
}

#[tokio::test]
async fn full_call_blocking_session_flags_overlapping_members() {
    let store = seeded_store().await;
    let resolver = resolver(store);

    // March 5, 13:30-14:30, full call: Ada (signup), Dee (other
    // rehearsal) conflict; Ben and Cyn are free at that time.
    let t = target("t1", "Act 2 Blocking", (2024, 3, 5), (13, 30), (14, 30), &[]);
    let report = resolver.resolve(&t, &roster()).await.unwrap();

    let ids: Vec<_> = report.entries.iter().map(|e| e.member.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m4"]);
    assert_eq!(report.entries[0].commitments[0].kind, CommitmentKind::AuditionSignup);
    assert_eq!(
        report.entries[1].commitments[0].kind,
        CommitmentKind::RehearsalAgendaItem
    );
    assert!(!report.is_degraded());
}

#[tokio::test]
async fn recurring_event_conflicts_on_the_right_wednesday() {
    let store = seeded_store().await;
    let resolver = resolver(store);

    // Wednesday March 6, 19:00-20:30 overlaps Ben's band practice and
    // Cyn's callback.
    let t = target("t2", "Music Rehearsal", (2024, 3, 6), (19, 0), (20, 30), &[]);
    let report = resolver.resolve(&t, &roster()).await.unwrap();

    let ids: Vec<_> = report.entries.iter().map(|e| e.member.id.as_str()).collect();
    assert_eq!(ids, vec!["m2"]);
    assert_eq!(report.entries[0].commitments[0].title, "Band Practice");

    // Tuesday the 5th at the same hour is clear for Ben.
    let t = target("t3", "Music Rehearsal", (2024, 3, 5), (19, 0), (20, 30), &["m2"]);
    let report = resolver.resolve(&t, &roster()).await.unwrap();
    assert!(!report.has_conflicts());
}

#[tokio::test]
async fn agenda_item_does_not_conflict_with_itself() {
    let store = Arc::new(MemoryScheduleStore::new());
    // Ada's eligible agenda items include the very item being checked.
    store
        .add_agenda_item(
            "m1",
            AgendaItemRecord {
                item_id: "t1".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                start_time: NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                show_title: "Hamlet".to_string(),
            },
        )
        .await;
    let resolver = resolver(store);

    let t = target("t1", "Act 2 Blocking", (2024, 3, 5), (13, 30), (14, 30), &[]);
    let report = resolver
        .resolve(&t, &[member("m1", "Ada", RosterRole::Cast)])
        .await
        .unwrap();
    assert!(!report.has_conflicts());
}

#[tokio::test]
async fn batch_matches_single_resolution_per_target() {
    let store = seeded_store().await;
    let resolver = resolver(store);
    let roster = roster();

    let targets = vec![
        target("t1", "Act 2 Blocking", (2024, 3, 5), (13, 30), (14, 30), &[]),
        target("t2", "Music Rehearsal", (2024, 3, 6), (19, 0), (20, 30), &[]),
        target("t3", "Fight Call", (2024, 3, 6), (18, 0), (18, 45), &["m3", "m2"]),
        target("t4", "Notes", (2024, 3, 7), (10, 0), (11, 0), &[]),
    ];
    let window = TimeInterval::new(utc(2024, 3, 1, 0, 0), utc(2024, 3, 31, 23, 59));

    let batch = resolver
        .resolve_batch(&targets, &roster, window)
        .await
        .unwrap();

    for t in &targets {
        let single = resolver.resolve(t, &roster).await.unwrap();
        let batch_entries = batch.conflicts_for(&t.id);

        assert_eq!(
            batch_entries.len(),
            single.entries.len(),
            "member count differs for target {}",
            t.id
        );
        for (b, s) in batch_entries.iter().zip(&single.entries) {
            assert_eq!(b.member.id, s.member.id, "member order differs for {}", t.id);
            let b_keys: HashSet<_> = b
                .commitments
                .iter()
                .map(|c| (c.kind, c.title.clone()))
                .collect();
            let s_keys: HashSet<_> = s
                .commitments
                .iter()
                .map(|c| (c.kind, c.title.clone()))
                .collect();
            assert_eq!(b_keys, s_keys, "conflict set differs for {}", t.id);
        }
    }

    // Every requested target has an entry, conflicted or not.
    assert_eq!(batch.by_target.len(), targets.len());
    assert!(batch.conflicts_for("t4").is_empty());
}

#[tokio::test]
async fn duplicate_commitments_merge_by_identity() {
    let store = Arc::new(MemoryScheduleStore::new());
    // Two adjacent audition slots for the same show, both overlapping
    // the target: one conflict line, not two.
    store
        .add_signup(
            "m1",
            SignupRecord::new("Hamlet", utc(2024, 3, 5, 13, 40), utc(2024, 3, 5, 13, 50)),
        )
        .await;
    store
        .add_signup(
            "m1",
            SignupRecord::new("Hamlet", utc(2024, 3, 5, 13, 55), utc(2024, 3, 5, 14, 5)),
        )
        .await;
    let resolver = resolver(store);
    let roster = vec![member("m1", "Ada", RosterRole::Cast)];

    let t = target("t1", "Act 2 Blocking", (2024, 3, 5), (13, 30), (14, 30), &[]);
    let report = resolver.resolve(&t, &roster).await.unwrap();

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].commitments.len(), 1);
    assert_eq!(report.entries[0].commitments[0].title, "Hamlet");

    let window = TimeInterval::new(utc(2024, 3, 1, 0, 0), utc(2024, 3, 31, 23, 59));
    let batch = resolver
        .resolve_batch(std::slice::from_ref(&t), &roster, window)
        .await
        .unwrap();
    assert_eq!(batch.conflicts_for("t1")[0].commitments.len(), 1);
}

#[tokio::test]
async fn partial_failure_still_reports_other_sources() {
    let store = seeded_store().await;
    // Ada's personal-event reads fail; her signup conflict must survive.
    store.fail_read("m1", SourceRead::PersonalEvents).await;
    store.fail_read("m1", SourceRead::RecurringEvents).await;
    let resolver = resolver(store);

    let t = target("t1", "Act 2 Blocking", (2024, 3, 5), (13, 30), (14, 30), &[]);
    let report = resolver.resolve(&t, &roster()).await.unwrap();

    let ada = report
        .entries
        .iter()
        .find(|e| e.member.id == "m1")
        .expect("Ada's signup conflict should still be detected");
    assert_eq!(ada.commitments[0].kind, CommitmentKind::AuditionSignup);

    assert!(report.is_degraded());
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        ReportWarning::SourceUnavailable { member_id, .. } if member_id == "m1"
    )));
}

#[tokio::test]
async fn fully_unreachable_member_is_reported_unverified() {
    let store = seeded_store().await;
    for read in [
        SourceRead::Signups,
        SourceRead::Callbacks,
        SourceRead::AgendaItems,
        SourceRead::PersonalEvents,
        SourceRead::RecurringEvents,
    ] {
        store.fail_read("m2", read).await;
    }
    let resolver = resolver(store);

    let t = target("t2", "Music Rehearsal", (2024, 3, 6), (19, 0), (20, 30), &[]);
    let report = resolver.resolve(&t, &roster()).await.unwrap();

    // Ben's conflicts are unknown, not absent.
    assert!(report.entries.iter().all(|e| e.member.id != "m2"));
    assert_eq!(report.unverified_member_ids(), vec!["m2"]);
    assert!(report.is_degraded());
}

#[tokio::test]
async fn resolve_by_id_round_trip() {
    let store = seeded_store().await;
    for m in roster() {
        store.add_roster_member("prod-1", m).await;
    }
    store
        .add_target(target("t1", "Act 2 Blocking", (2024, 3, 5), (13, 30), (14, 30), &[]))
        .await;
    let resolver = resolver(store);

    let report = resolver.resolve_by_id("t1", "prod-1").await.unwrap();
    assert_eq!(report.target_id, "t1");
    assert_eq!(report.entries.len(), 2);

    let err = resolver.resolve_by_id("nope", "prod-1").await.unwrap_err();
    assert!(matches!(err, callboard::CallboardError::TargetNotFound(_)));
}

#[tokio::test]
async fn batch_warnings_are_per_member_not_per_target() {
    let store = seeded_store().await;
    store.fail_read("m1", SourceRead::Signups).await;
    let resolver = resolver(store);
    let roster = roster();

    let targets = vec![
        target("t1", "Act 2 Blocking", (2024, 3, 5), (13, 30), (14, 30), &[]),
        target("t2", "Music Rehearsal", (2024, 3, 6), (19, 0), (20, 30), &[]),
        target("t3", "Notes", (2024, 3, 7), (10, 0), (11, 0), &[]),
    ];
    let window = TimeInterval::new(utc(2024, 3, 1, 0, 0), utc(2024, 3, 31, 23, 59));
    let batch = resolver
        .resolve_batch(&targets, &roster, window)
        .await
        .unwrap();

    let unavailable = batch
        .warnings
        .iter()
        .filter(|w| matches!(w, ReportWarning::SourceUnavailable { member_id, .. } if member_id == "m1"))
        .count();
    assert_eq!(unavailable, 1);
}
