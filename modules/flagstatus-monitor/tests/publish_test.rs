//! Publisher and full-run tests against temp-dir sinks.
//!
//! Covers multi-sink writes, byte-level idempotence, and the guarantee that a
//! failed run leaves a failure record behind rather than its own output.

use std::fs;
use std::path::Path;

use flagstatus_common::{validate_json, BadgeSummary, FlagStatus, StatusRecord};
use flagstatus_monitor::{Publisher, ResolutionKind, Resolver, Sink, StatusRun};
use flagstatus_sources::testing::MockSource;

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn badge_at(sink: &Sink) -> BadgeSummary {
    serde_json::from_str(&read(sink.badge_path())).unwrap()
}

fn record_at(sink: &Sink) -> StatusRecord {
    validate_json(&read(sink.status_path())).into_record().unwrap()
}

fn half_staff_record() -> StatusRecord {
    let mut record = StatusRecord::default_status("National Day of Mourning");
    record.status = FlagStatus::HalfStaff;
    record.source = "HalfStaff.org".into();
    record
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[test]
fn every_sink_receives_the_same_record_and_badge() {
    let dir = tempfile::tempdir().unwrap();
    let primary = Sink::new(dir.path().join("flag_status.json"));
    let mirror = Sink::new(dir.path().join("docs/flag_status.json"));
    let publisher = Publisher::new(vec![primary.clone(), mirror.clone()]);
    let record = half_staff_record();

    publisher
        .publish(&record, &BadgeSummary::for_status(record.status))
        .unwrap();

    assert_eq!(read(primary.status_path()), read(mirror.status_path()));
    assert_eq!(record_at(&mirror), record);
    assert_eq!(badge_at(&primary).color, "orange");
    assert_eq!(badge_at(&mirror).message, "half-staff");
}

#[test]
fn publishing_the_same_record_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));
    let publisher = Publisher::new(vec![sink.clone()]);
    let record = half_staff_record();
    let badge = BadgeSummary::for_status(record.status);

    publisher.publish(&record, &badge).unwrap();
    let first = (read(sink.status_path()), read(sink.badge_path()));
    publisher.publish(&record, &badge).unwrap();
    let second = (read(sink.status_path()), read(sink.badge_path()));

    assert_eq!(first, second);
}

#[test]
fn document_has_canonical_field_order() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));
    Publisher::new(vec![sink.clone()])
        .publish(&half_staff_record(), &BadgeSummary::unknown())
        .unwrap();

    let raw = read(sink.status_path());
    let positions: Vec<usize> = ["\"status\"", "\"last_updated\"", "\"source\"", "\"reason\"", "\"expires\""]
        .iter()
        .map(|key| raw.find(key).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{raw}");
    assert!(raw.contains("\"expires\": null"));
}

#[test]
fn invalid_record_is_replaced_with_default_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));
    let mut record = half_staff_record();
    record.source = "  ".into();

    Publisher::new(vec![sink.clone()])
        .publish(&record, &BadgeSummary::for_status(record.status))
        .unwrap();

    let written = record_at(&sink);
    assert_eq!(written.source, "Default");
    assert_eq!(written.status, FlagStatus::FullStaff);
    assert_eq!(badge_at(&sink), BadgeSummary::unknown());
}

#[test]
fn one_failing_sink_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file in the way").unwrap();
    let broken = Sink::new(blocker.join("flag_status.json"));
    let healthy = Sink::new(dir.path().join("flag_status.json"));
    let publisher = Publisher::new(vec![broken, healthy.clone()]);

    let err = publisher
        .publish(&half_staff_record(), &BadgeSummary::for_status(FlagStatus::HalfStaff))
        .unwrap_err();

    assert_eq!(err.attempted, 2);
    assert_eq!(err.failures.len(), 1);
    assert_eq!(record_at(&healthy).source, "HalfStaff.org");
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

fn status_run(sources: &[&MockSource], sinks: Vec<Sink>) -> StatusRun {
    let publisher = Publisher::new(sinks);
    let mut resolver = Resolver::new(sources.iter().map(|s| s.boxed()).collect());
    if let Some(primary) = publisher.primary() {
        resolver = resolver.with_last_known(primary.clone());
    }
    StatusRun::new(resolver, publisher)
}

#[tokio::test]
async fn successful_run_publishes_live_record() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));
    let source = MockSource::status("HalfStaff.org", FlagStatus::FullStaff, "no active notices");

    let report = status_run(&[&source], vec![sink.clone()]).run().await.unwrap();

    assert_eq!(report.resolution.kind, ResolutionKind::Live { source_index: 0 });
    assert_eq!(record_at(&sink).reason, "no active notices");
    assert_eq!(badge_at(&sink).color, "brightgreen");
}

#[tokio::test]
async fn next_run_falls_back_to_previous_live_record() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));

    let live = MockSource::status("Presidential Proclamation", FlagStatus::HalfStaff, "Honoring the fallen");
    status_run(&[&live], vec![sink.clone()]).run().await.unwrap();

    let down = MockSource::no_result("Presidential Proclamation");
    let report = status_run(&[&down], vec![sink.clone()]).run().await.unwrap();

    assert_eq!(report.resolution.kind, ResolutionKind::LastKnown);
    let written = record_at(&sink);
    assert_eq!(written.source, "Presidential Proclamation");
    assert_eq!(written.status, FlagStatus::HalfStaff);
    assert_eq!(badge_at(&sink).color, "orange");
}

#[tokio::test]
async fn default_run_badges_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));
    let down = MockSource::no_result("HalfStaff.org");

    let report = status_run(&[&down], vec![sink.clone()]).run().await.unwrap();

    assert_eq!(report.resolution.kind, ResolutionKind::Default);
    assert_eq!(record_at(&sink).source, "Default");
    assert_eq!(badge_at(&sink), BadgeSummary::unknown());
}

#[tokio::test]
async fn failed_publish_leaves_failure_record_in_every_writable_sink() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocked");
    fs::write(&blocker, "").unwrap();
    let healthy = Sink::new(dir.path().join("flag_status.json"));
    let broken = Sink::new(blocker.join("flag_status.json"));
    let source = MockSource::status("HalfStaff.org", FlagStatus::HalfStaff, "State funeral");

    let result = status_run(&[&source], vec![healthy.clone(), broken]).run().await;

    assert!(result.is_err());
    let written = record_at(&healthy);
    assert_eq!(written.source, "Error");
    assert_eq!(written.status, FlagStatus::HalfStaff);
    assert!(written.reason.starts_with("Publishing failed"));
    assert_eq!(badge_at(&healthy), BadgeSummary::unknown());
}

#[tokio::test]
async fn failure_record_is_never_reused_as_last_known() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));
    Publisher::new(vec![sink.clone()])
        .publish(
            &StatusRecord::failure(FlagStatus::HalfStaff, "Publishing failed: disk full"),
            &BadgeSummary::unknown(),
        )
        .unwrap();

    let down = MockSource::no_result("HalfStaff.org");
    let report = status_run(&[&down], vec![sink.clone()]).run().await.unwrap();

    assert_eq!(report.resolution.kind, ResolutionKind::Default);
    assert_eq!(record_at(&sink).source, "Default");
}

#[tokio::test]
async fn consecutive_outages_keep_publishing_the_unknown_badge() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Sink::new(dir.path().join("flag_status.json"));
    let down = MockSource::no_result("HalfStaff.org");

    let first = status_run(&[&down], vec![sink.clone()]).run().await.unwrap();
    let second = status_run(&[&down], vec![sink.clone()]).run().await.unwrap();

    assert_eq!(first.resolution.kind, ResolutionKind::Default);
    assert_eq!(second.resolution.kind, ResolutionKind::Default);
    assert_eq!(second.badge, BadgeSummary::unknown());
    assert_eq!(record_at(&sink).reason, "Unable to fetch current status");
    assert_eq!(badge_at(&sink), BadgeSummary::unknown());
}
