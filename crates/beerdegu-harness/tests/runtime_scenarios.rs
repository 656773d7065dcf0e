//! End-to-end room scenarios.
//!
//! The production [`Runtime`] runs against [`SimDriver`] on tokio's paused
//! clock. The test plays the server through [`SimServer`]: it pushes frames,
//! drops the socket and reads back every command the client wrote.
//!
//! # Oracle Pattern
//!
//! Scenarios end with checks on:
//! - the commands the client sent, in order
//! - the snapshot every subscriber sees
//! - whether the runtime stopped

use std::time::Duration;

use beerdegu_app::{DispatchError, FormState, RoomHandle, Runtime, RuntimeError, SessionConfig};
use beerdegu_core::{ConnectionStatus, Role, RoomEndpoint};
use beerdegu_harness::{DriverCall, SimDriver, SimDriverError, SimServer, frames};
use beerdegu_proto::{ClientCommand, DraftField, RatingDraft, RoomState};
use tokio::task::JoinHandle;

type RunResult = Result<(), SimDriverError>;

fn endpoint() -> RoomEndpoint {
    RoomEndpoint::new("ws://sim:8000", "ABCD", Some("t0k")).unwrap()
}

/// Spawn a runtime over a fresh simulated socket.
fn spawn_room(role: Role) -> (RoomHandle, SimServer, JoinHandle<RunResult>) {
    let (driver, server) = SimDriver::new();
    let (runtime, handle) = Runtime::new(driver, endpoint(), role, SessionConfig::default());
    let task = tokio::spawn(runtime.run());
    (handle, server, task)
}

/// Let the runtime drain everything queued so far.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[tokio::test(start_paused = true)]
async fn first_open_sends_nothing() {
    let (handle, server, _task) = spawn_room(Role::Participant);
    settle().await;

    assert_eq!(server.calls(), vec![DriverCall::Dial(
        "ws://sim:8000/ws/room/ABCD/?token=t0k".to_string()
    )]);
    assert_eq!(handle.snapshot().connection_status, ConnectionStatus::Open);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_and_roster_run_on_their_periods() {
    let (_handle, server, _task) = spawn_room(Role::Participant);
    settle().await;

    advance(Duration::from_secs(15)).await;
    let sent = server.sent_commands();
    assert_eq!(sent, vec![ClientCommand::RequestRoster, ClientCommand::Heartbeat]);

    advance(Duration::from_secs(14)).await;
    let heartbeats =
        server.sent_commands().iter().filter(|c| **c == ClientCommand::Heartbeat).count();
    assert_eq!(heartbeats, 2);
}

#[tokio::test(start_paused = true)]
async fn leave_stops_every_timer() {
    let (handle, server, task) = spawn_room(Role::Participant);
    settle().await;

    handle.leave().await.unwrap();
    handle.closed().await;
    assert!(task.await.unwrap().is_ok());
    assert_eq!(server.calls().last(), Some(&DriverCall::Disconnect));
    assert_eq!(handle.snapshot().connection_status, ConnectionStatus::Closed);

    server.clear();
    advance(Duration::from_secs(120)).await;
    assert!(server.calls().is_empty());

    let error = handle.send_chat("anyone?").await.unwrap_err();
    assert!(matches!(error, RuntimeError::SessionEnded));
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_leaves_the_room() {
    let (handle, server, task) = spawn_room(Role::Participant);
    let second = handle.clone();
    settle().await;

    drop(handle);
    settle().await;
    assert!(!task.is_finished());

    drop(second);
    assert!(task.await.unwrap().is_ok());
    assert_eq!(server.calls().last(), Some(&DriverCall::Disconnect));
}

#[tokio::test(start_paused = true)]
async fn reconnect_resynchronizes_room() {
    let (handle, server, _task) = spawn_room(Role::Participant);
    settle().await;

    server.drop_connection();
    settle().await;
    assert_eq!(handle.snapshot().connection_status, ConnectionStatus::Connecting);
    assert_eq!(server.dial_count(), 1);

    advance(Duration::from_secs(6)).await;
    assert_eq!(server.dial_count(), 2);
    assert_eq!(handle.snapshot().connection_status, ConnectionStatus::Open);
    assert_eq!(server.sent_commands(), vec![
        ClientCommand::RequestRoomState,
        ClientCommand::RequestRoster,
        ClientCommand::RequestCatalog,
    ]);
}

#[tokio::test(start_paused = true)]
async fn reconnection_gives_up_after_five_attempts() {
    let (handle, server, task) = spawn_room(Role::Participant);
    settle().await;

    server.refuse_dials(true);
    server.drop_connection();

    assert!(task.await.unwrap().is_ok());
    assert_eq!(server.dial_count(), 6);
    assert_eq!(handle.snapshot().connection_status, ConnectionStatus::Closed);

    server.clear();
    advance(Duration::from_secs(60)).await;
    assert_eq!(server.dial_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stage_transitions_fetch_catalog_then_results() {
    let (handle, server, _task) = spawn_room(Role::Participant);
    settle().await;

    server.push(&frames::lifecycle(RoomState::Starting)).unwrap();
    server.push(&frames::lifecycle(RoomState::InProgress)).unwrap();
    settle().await;
    assert_eq!(server.sent_commands(), vec![ClientCommand::LoadCatalog]);

    server.push(&frames::catalog(&[(1, "Pils"), (2, "Porter")])).unwrap();
    settle().await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.room_state, RoomState::InProgress);
    assert_eq!(snapshot.beer(2).map(|beer| beer.name.as_str()), Some("Porter"));

    server.clear();
    server.push(&frames::lifecycle(RoomState::Finished)).unwrap();
    server.push(&frames::user_results(vec![RatingDraft::default()])).unwrap();
    settle().await;

    assert_eq!(server.sent_commands(), vec![
        ClientCommand::RequestUserResults,
        ClientCommand::RequestAggregateResults,
    ]);
    assert_eq!(handle.snapshot().user_results.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn only_the_host_moves_the_room() {
    let (participant, _, _participant_task) = spawn_room(Role::Participant);
    let (host, host_server, _host_task) = spawn_room(Role::Host);
    settle().await;

    let error = participant.change_stage(RoomState::Starting).await.unwrap_err();
    assert!(matches!(error, RuntimeError::Dispatch(DispatchError::NotHost)));

    host.change_stage(RoomState::Starting).await.unwrap();
    assert_eq!(host_server.sent_commands(), vec![ClientCommand::ChangeRoomState {
        state: RoomState::Starting
    }]);

    host_server.push(&frames::lifecycle(RoomState::InProgress)).unwrap();
    settle().await;
    let error = host.change_stage(RoomState::Starting).await.unwrap_err();
    assert!(matches!(error, RuntimeError::Dispatch(DispatchError::InvalidStageChange { .. })));
}

#[tokio::test(start_paused = true)]
async fn chat_round_trip_reaches_every_handle() {
    let (handle, server, _task) = spawn_room(Role::Participant);
    let other = handle.clone();
    let mut events = handle.events();
    let mut other_events = other.events();
    settle().await;

    assert!(matches!(
        handle.send_chat("   ").await,
        Err(RuntimeError::Dispatch(DispatchError::EmptyMessage))
    ));
    handle.send_chat("cheers").await.unwrap();
    assert_eq!(server.sent_commands(), vec![ClientCommand::SendChatMessage {
        text: "cheers".into()
    }]);

    let line = frames::chat("ola", "cheers");
    server.push(&line).unwrap();
    settle().await;

    assert_eq!(events.recv().await.unwrap(), line);
    assert_eq!(other_events.recv().await.unwrap(), line);
    assert_eq!(other.snapshot().chat_log.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn switching_beers_flushes_dirty_draft_first() {
    let (handle, server, _task) = spawn_room(Role::Participant);
    settle().await;

    handle.activate_beer(1).await.unwrap();
    settle().await;
    server.push(&frames::draft(1, RatingDraft::default())).unwrap();
    settle().await;
    assert_eq!(handle.snapshot().form.as_ref().map(|form| form.state), Some(FormState::Ready));

    handle.edit_draft(DraftField::Color("amber".into())).await.unwrap();
    handle.activate_beer(2).await.unwrap();
    settle().await;

    let saved = RatingDraft { color: "amber".into(), ..RatingDraft::default() };
    assert_eq!(server.sent_commands(), vec![
        ClientCommand::RequestDraft { beer_id: 1 },
        ClientCommand::SaveDraft { beer_id: 1, draft: saved },
        ClientCommand::RequestDraft { beer_id: 2 },
    ]);

    let form = handle.snapshot().form.clone().unwrap();
    assert_eq!((form.beer_id, form.state), (2, FormState::Loading));
}

#[tokio::test(start_paused = true)]
async fn dirty_draft_autosaves_and_flushes_on_leave() {
    let (handle, server, task) = spawn_room(Role::Participant);
    settle().await;

    handle.activate_beer(7).await.unwrap();
    handle.edit_draft(DraftField::Smell("hops".into())).await.unwrap();
    server.clear();

    advance(Duration::from_secs(6)).await;
    let saves = server
        .sent_commands()
        .into_iter()
        .filter(|command| matches!(command, ClientCommand::SaveDraft { beer_id: 7, .. }))
        .count();
    assert_eq!(saves, 1);

    handle.edit_draft(DraftField::Taste("bitter".into())).await.unwrap();
    server.clear();
    handle.leave().await.unwrap();
    assert!(task.await.unwrap().is_ok());

    let expected = RatingDraft {
        smell: "hops".into(),
        taste: "bitter".into(),
        ..RatingDraft::default()
    };
    assert_eq!(server.sent_commands(), vec![ClientCommand::SaveDraft {
        beer_id: 7,
        draft: expected
    }]);
}

#[tokio::test(start_paused = true)]
async fn malformed_frames_are_dropped() {
    let (handle, server, _task) = spawn_room(Role::Participant);
    settle().await;

    server.push_raw("not json");
    server.push_raw(r#"{"command":"new_feature","data":{}}"#);
    server.push(&frames::roster(&[(1, "ola")])).unwrap();
    settle().await;

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.participants.len(), 1);
    assert_eq!(snapshot.connection_status, ConnectionStatus::Open);
}
