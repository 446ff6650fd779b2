//! End-to-end session tests for the engine crate.
//!
//! Timing tests run on tokio's paused clock, so a full four-phase session
//! completes without real waits.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::{self, Instant};

use super::*;

fn arrival_participant(intensity: u8) -> ParticipantState {
    let needs: BTreeSet<String> = ["listening".to_string()].into_iter().collect();
    ParticipantState::new("loneliness", intensity, 50, needs, Readiness::ShareLittle).unwrap()
}

fn scripted_controller(
    sink: Arc<MemoryModerationSink>,
) -> RoomLifecycleController<SequenceRandom> {
    let room = GroupComposer::with_random(SequenceRandom::new(vec![0.5]))
        .compose(&arrival_participant(70));
    RoomLifecycleController::start(
        room,
        SessionSettings::default(),
        SafetyScanner::new(),
        sink,
        SequenceRandom::new(vec![0.0]),
        Instant::now(),
        SystemTime::now(),
    )
}

fn poster() -> ParticipantId {
    ParticipantId::new("me").unwrap()
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<RoomEvent>) -> Vec<RoomEvent> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

#[tokio::test(start_paused = true)]
async fn full_session_runs_the_fixed_phase_sequence() {
    let controller = scripted_controller(Arc::new(MemoryModerationSink::new()));
    let mut events = controller.subscribe();
    let runtime = RoomRuntime::spawn(controller);

    time::sleep(Duration::from_secs(600)).await;

    let collected = drain(&mut events);
    let phases: Vec<PhaseId> = collected
        .iter()
        .filter_map(|event| match event {
            RoomEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    // ARRIVAL was entered at spawn, before this subscription could see it
    assert_eq!(
        phases,
        vec![PhaseId::Sharing, PhaseId::Reflection, PhaseId::Close]
    );

    let nudges = collected
        .iter()
        .filter(|event| matches!(event, RoomEvent::Nudge { .. }))
        .count();
    // SHARING spans 30s..150s: nudges at 75s and 120s, never a third at 165s
    assert_eq!(nudges, 2);

    let transcript = runtime.handle().transcript().await.unwrap();
    // Arrival prompt + 3 phase prompts + 2 nudges, in decision order
    assert_eq!(transcript.len(), 6);
    let seqs: Vec<u64> = transcript.iter().map(|entry| entry.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4, 5]);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn immediate_teardown_leaks_no_timer_callbacks() {
    let controller = scripted_controller(Arc::new(MemoryModerationSink::new()));
    let mut events = controller.subscribe();
    let runtime = RoomRuntime::spawn(controller);

    runtime.shutdown().await;
    let drained = drain(&mut events);
    assert!(drained.is_empty(), "unexpected events: {drained:?}");

    // Push the clock well past every would-be deadline
    time::advance(Duration::from_secs(600)).await;
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn teardown_during_sharing_cancels_the_nudge_timer() {
    let controller = scripted_controller(Arc::new(MemoryModerationSink::new()));
    let mut events = controller.subscribe();
    let runtime = RoomRuntime::spawn(controller);

    // 30s in, SHARING has just begun; the first nudge would land at 75s
    time::sleep(Duration::from_secs(40)).await;
    runtime.shutdown().await;

    let before = drain(&mut events);
    assert!(before.iter().any(
        |event| matches!(event, RoomEvent::PhaseChanged { phase: PhaseId::Sharing, .. })
    ));
    assert!(!before.iter().any(|event| matches!(event, RoomEvent::Nudge { .. })));

    time::advance(Duration::from_secs(600)).await;
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn high_severity_message_is_suppressed_and_logged_once() {
    let sink = Arc::new(MemoryModerationSink::new());
    let runtime = RoomRuntime::spawn(scripted_controller(Arc::clone(&sink)));
    let handle = runtime.handle();

    let outcome = handle
        .post_message(poster(), "I want to end it all")
        .await
        .unwrap();
    assert!(!outcome.admitted);
    assert_eq!(outcome.notice.unwrap().kind, FlagKind::SelfHarm);

    let transcript = handle.transcript().await.unwrap();
    assert!(
        transcript
            .iter()
            .all(|entry| !entry.text.contains("end it all"))
    );

    let flagged = sink.events();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].trigger_word, "end it all");

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn despair_message_is_admitted_with_notice() {
    let sink = Arc::new(MemoryModerationSink::new());
    let runtime = RoomRuntime::spawn(scripted_controller(Arc::clone(&sink)));
    let handle = runtime.handle();
    let mut events = handle.subscribe();

    let outcome = handle
        .post_message(poster(), "things are hopeless lately")
        .await
        .unwrap();
    assert!(outcome.admitted);
    assert_eq!(outcome.notice.unwrap().kind, FlagKind::Despair);
    assert!(sink.events().is_empty());

    let collected = drain(&mut events);
    assert!(collected.iter().any(|event| matches!(
        event,
        RoomEvent::MessageAdmitted { entry } if entry.text == "things are hopeless lately"
    )));
    assert!(collected.iter().any(|event| matches!(
        event,
        RoomEvent::Notice { recipient, .. } if *recipient == poster()
    )));

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn graphic_message_is_suppressed_without_moderation_event() {
    let sink = Arc::new(MemoryModerationSink::new());
    let runtime = RoomRuntime::spawn(scripted_controller(Arc::clone(&sink)));
    let handle = runtime.handle();

    let outcome = handle
        .post_message(poster(), "I've been cutting vegetables")
        .await
        .unwrap();
    assert!(!outcome.admitted);
    assert_eq!(outcome.notice.unwrap().kind, FlagKind::Graphic);
    assert!(sink.events().is_empty());
    assert_eq!(handle.transcript().await.unwrap().len(), 1);

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn posting_after_shutdown_fails_with_room_closed() {
    let runtime = RoomRuntime::spawn(scripted_controller(Arc::new(MemoryModerationSink::new())));
    let handle = runtime.handle();
    runtime.shutdown().await;

    let error = handle.post_message(poster(), "anyone there?").await.unwrap_err();
    assert_eq!(error, RoomClosedError);
    assert!(handle.transcript().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn messages_interleave_with_system_entries_in_decision_order() {
    let runtime = RoomRuntime::spawn(scripted_controller(Arc::new(MemoryModerationSink::new())));
    let handle = runtime.handle();

    handle.post_message(poster(), "checking in").await.unwrap();
    time::sleep(Duration::from_secs(80)).await; // past SHARING entry and first nudge
    handle.post_message(poster(), "still here").await.unwrap();

    let transcript = handle.transcript().await.unwrap();
    let texts: Vec<&str> = transcript.iter().map(|entry| entry.text.as_str()).collect();
    let first_message = texts.iter().position(|t| *t == "checking in").unwrap();
    let second_message = texts.iter().position(|t| *t == "still here").unwrap();
    let sharing_prompt = texts
        .iter()
        .position(|t| t.starts_with("We are now moving into sharing time"))
        .unwrap();
    assert!(first_message < sharing_prompt);
    assert!(sharing_prompt < second_message);

    // Sequence numbers are dense and increasing
    let seqs: Vec<u64> = transcript.iter().map(|entry| entry.seq).collect();
    assert_eq!(seqs, (0..transcript.len() as u64).collect::<Vec<u64>>());

    runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rooms_in_one_process_are_independent() {
    let sink_a = Arc::new(MemoryModerationSink::new());
    let sink_b = Arc::new(MemoryModerationSink::new());
    let runtime_a = RoomRuntime::spawn(scripted_controller(Arc::clone(&sink_a)));
    let runtime_b = RoomRuntime::spawn(scripted_controller(Arc::clone(&sink_b)));

    runtime_a
        .handle()
        .post_message(poster(), "I want to end it all")
        .await
        .unwrap();

    assert_eq!(sink_a.events().len(), 1);
    assert!(sink_b.events().is_empty());
    assert_eq!(runtime_b.handle().transcript().await.unwrap().len(), 1);

    runtime_a.shutdown().await;
    runtime_b.shutdown().await;
}
