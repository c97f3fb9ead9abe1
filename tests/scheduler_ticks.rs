mod support;

use kestrel_autosave::scheduler::Hook;
use kestrel_autosave::status::StatusKind;
use kestrel_autosave::{HostEvent, TickOutcome};
use support::{controller, document, settings, FakeHost};
use tempfile::tempdir;

fn dirtied() -> HostEvent {
    HostEvent::DocumentDirtied { name: "D".into() }
}

#[test]
fn clean_window_still_consumes_the_interval() {
    let root = tempdir().expect("temp dir");
    let host = FakeHost::with_documents(vec![document("D", false)], "D");
    let (mut ctrl, clock) = controller(root.path(), host, settings());

    clock.advance(61.0);
    assert_eq!(ctrl.tick(), TickOutcome::Clean);
    assert_eq!(ctrl.scheduler().state().last_trigger, 61.0);

    ctrl.host_mut().set_dirty("D", true);
    ctrl.handle_event(dirtied());
    clock.advance(30.0);
    assert_eq!(ctrl.tick(), TickOutcome::Waiting, "the clean tick restarted the window");
    clock.advance(31.0);
    assert!(matches!(ctrl.tick(), TickOutcome::Saved(_)));
    assert_eq!(ctrl.host().saves, vec!["D".to_string()]);
}

#[test]
fn disabled_controller_ignores_ticks_and_events() {
    let root = tempdir().expect("temp dir");
    let host = FakeHost::with_documents(vec![document("D", true)], "D");
    let (mut ctrl, clock) = controller(root.path(), host, settings());

    ctrl.disable();
    assert!(!ctrl.is_enabled());
    assert!(ctrl.scheduler().subscriptions().is_empty());
    assert!(!ctrl.port().settings.auto_save, "toggle is persisted");
    let status = ctrl.status().expect("toggle status");
    assert_eq!((status.kind, status.message.as_str()), (StatusKind::Info, "Autosave OFF"));

    ctrl.handle_event(dirtied());
    ctrl.handle_event(HostEvent::EnteringPlayMode);
    assert!(!ctrl.is_dirty());
    clock.advance(600.0);
    assert_eq!(ctrl.tick(), TickOutcome::Disabled);
    assert!(ctrl.host().saves.is_empty());
    assert_eq!(ctrl.countdown_label(), None);
}

#[test]
fn enabling_twice_delivers_play_mode_once() {
    let root = tempdir().expect("temp dir");
    let host = FakeHost::with_documents(vec![document("D", true)], "D");
    let (mut ctrl, _clock) = controller(root.path(), host, settings());

    ctrl.enable();
    ctrl.enable();
    assert_eq!(ctrl.scheduler().subscriptions().len(), Hook::ALL.len());

    ctrl.handle_event(HostEvent::EnteringPlayMode);
    assert_eq!(ctrl.host().saves, vec!["D".to_string()]);
    assert_eq!(ctrl.host().copies.len(), 1, "one cycle, one backup");
    assert_eq!(ctrl.scheduler().state().last_trigger, 0.0, "play mode leaves the window alone");
}

#[test]
fn play_mode_save_can_be_turned_off() {
    let root = tempdir().expect("temp dir");
    let host = FakeHost::with_documents(vec![document("D", true)], "D");
    let (mut ctrl, _clock) = controller(root.path(), host, settings());
    ctrl.update_settings(|settings| settings.save_on_play = false);

    ctrl.handle_event(HostEvent::EnteringPlayMode);
    assert!(ctrl.host().saves.is_empty());
    assert!(ctrl.host().copies.is_empty());
}

#[test]
fn manual_save_recomputes_dirty_from_host_documents() {
    let root = tempdir().expect("temp dir");
    let host = FakeHost::with_documents(vec![document("D", false), document("E", false)], "D");
    let (mut ctrl, _clock) = controller(root.path(), host, settings());

    ctrl.handle_event(dirtied());
    assert!(ctrl.is_dirty());
    ctrl.handle_event(HostEvent::DocumentSaved { name: "D".into() });
    assert!(!ctrl.is_dirty());

    ctrl.host_mut().set_dirty("E", true);
    ctrl.handle_event(dirtied());
    ctrl.handle_event(HostEvent::DocumentSaved { name: "D".into() });
    assert!(ctrl.is_dirty(), "E is still modified");
}

#[test]
fn countdown_tracks_the_window() {
    let root = tempdir().expect("temp dir");
    let host = FakeHost::with_documents(vec![document("D", false)], "D");
    let (mut ctrl, clock) = controller(root.path(), host, settings());

    clock.advance(15.0);
    assert_eq!(ctrl.countdown_label().as_deref(), Some("Next autosave in: 00:45"));
    clock.advance(120.0);
    assert_eq!(ctrl.countdown_label().as_deref(), Some("Next autosave in: 00:00"));
    assert_eq!(ctrl.scheduler().state().last_trigger, 0.0, "reading the countdown never moves the window");
}

#[test]
fn interval_changes_are_clamped_and_persisted() {
    let root = tempdir().expect("temp dir");
    let host = FakeHost::default();
    let (mut ctrl, _clock) = controller(root.path(), host, settings());

    assert_eq!(ctrl.set_interval_minutes(45), 30);
    assert_eq!(ctrl.port().settings.interval_minutes, 30);
    assert_eq!(ctrl.set_interval_minutes(0), 1);
    assert_eq!(ctrl.settings().interval_minutes, 1);
    assert_eq!(ctrl.set_backup_count(500), 100);
    assert_eq!(ctrl.port().settings.backup_count, 100);
    assert_eq!(ctrl.port().store_count, 3);
}
