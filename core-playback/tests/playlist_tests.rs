//! Playlist controller behavior: cursor semantics, dedupe, end-of-list.

use bridge_traits::track::TrackRef;
use core_playback::PlaylistController;
use core_runtime::events::{CoreEvent, EventBus, PlaylistEvent};

fn track(id: &str, title: &str) -> TrackRef {
    TrackRef::remote(id, title, "netease")
}

fn controller() -> (PlaylistController, core_runtime::events::Receiver<CoreEvent>) {
    let events = EventBus::new(64);
    let receiver = events.subscribe();
    (PlaylistController::new(events), receiver)
}

fn drain_playlist_events(
    receiver: &mut core_runtime::events::Receiver<CoreEvent>,
) -> Vec<PlaylistEvent> {
    let mut out = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if let CoreEvent::Playlist(e) = event {
            out.push(e);
        }
    }
    out
}

#[tokio::test]
async fn walking_a_three_track_list_to_the_end() {
    let (playlist, mut receiver) = controller();
    playlist.set(vec![track("a", "A"), track("b", "B"), track("c", "C")]);

    // Cursor starts unset; the first next() selects index 0.
    assert_eq!(playlist.current_index(), None);
    assert_eq!(playlist.next(), Some(0));
    assert_eq!(playlist.next(), Some(1));
    assert_eq!(playlist.next(), Some(2));

    // At the last entry every further next() reports the end and leaves the
    // cursor alone.
    assert_eq!(playlist.next(), None);
    assert_eq!(playlist.next(), None);
    assert_eq!(playlist.current_index(), Some(2));

    let events = drain_playlist_events(&mut receiver);
    let selected: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            PlaylistEvent::TrackSelected { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(selected, vec![0, 1, 2]);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, PlaylistEvent::EndReached))
            .count(),
        2
    );
}

#[tokio::test]
async fn previous_at_the_start_is_a_silent_no_op() {
    let (playlist, mut receiver) = controller();
    playlist.set(vec![track("a", "A"), track("b", "B")]);

    // No selection yet: previous() does nothing.
    assert_eq!(playlist.previous(), None);

    playlist.next();
    assert_eq!(playlist.current_index(), Some(0));
    assert_eq!(playlist.previous(), None);
    assert_eq!(playlist.current_index(), Some(0));

    let events = drain_playlist_events(&mut receiver);
    assert!(events
        .iter()
        .all(|e| !matches!(e, PlaylistEvent::EndReached)));
}

#[tokio::test]
async fn next_and_previous_on_an_empty_list() {
    let (playlist, mut receiver) = controller();
    assert_eq!(playlist.next(), None);
    assert_eq!(playlist.previous(), None);
    assert!(drain_playlist_events(&mut receiver).is_empty());
}

#[tokio::test]
async fn duplicate_ids_are_rejected_at_insertion() {
    let (playlist, _receiver) = controller();
    assert!(playlist.add(track("a", "A")));
    assert!(!playlist.add(track("a", "A again")));
    assert_eq!(playlist.len(), 1);

    // set() dedupes too, preserving first occurrence order.
    playlist.set(vec![track("x", "X"), track("y", "Y"), track("x", "X dup")]);
    let titles: Vec<String> = playlist.tracks().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["X", "Y"]);
}

#[tokio::test]
async fn local_tracks_with_empty_ids_dedupe_by_path() {
    let (playlist, _receiver) = controller();
    assert!(playlist.add(TrackRef::local("/music/a.flac", "A")));
    assert!(playlist.add(TrackRef::local("/music/b.flac", "B")));
    assert!(!playlist.add(TrackRef::local("/music/a.flac", "A again")));
    assert_eq!(playlist.len(), 2);
}

#[tokio::test]
async fn play_specific_finds_or_appends_and_moves_the_cursor() {
    let (playlist, mut receiver) = controller();
    playlist.set(vec![track("a", "A"), track("b", "B")]);

    // Existing entry: cursor jumps to it.
    assert_eq!(playlist.play_specific(&track("b", "B")), 1);
    assert_eq!(playlist.current_index(), Some(1));

    // Unknown entry: appended and selected.
    assert_eq!(playlist.play_specific(&track("z", "Z")), 2);
    assert_eq!(playlist.len(), 3);
    assert_eq!(playlist.current_track().unwrap().id, "z");

    let events = drain_playlist_events(&mut receiver);
    let selected: Vec<(usize, String)> = events
        .into_iter()
        .filter_map(|e| match e {
            PlaylistEvent::TrackSelected {
                index, track_id, ..
            } => Some((index, track_id)),
            _ => None,
        })
        .collect();
    assert_eq!(selected, vec![(1, "b".to_string()), (2, "z".to_string())]);
}

#[tokio::test]
async fn batch_remove_shifts_the_cursor_consistently() {
    let (playlist, _receiver) = controller();
    playlist.set(vec![
        track("a", "A"),
        track("b", "B"),
        track("c", "C"),
        track("d", "D"),
    ]);
    playlist.play_specific(&track("c", "C"));
    assert_eq!(playlist.current_index(), Some(2));

    // Removing entries before the cursor shifts it down.
    playlist.remove(&[0, 1]);
    assert_eq!(playlist.current_index(), Some(0));
    assert_eq!(playlist.current_track().unwrap().id, "c");

    // Removing the current entry invalidates the cursor.
    playlist.remove(&[0]);
    assert_eq!(playlist.current_index(), None);
    assert_eq!(playlist.len(), 1);
    assert_eq!(playlist.tracks()[0].id, "d");
}

#[tokio::test]
async fn remove_ignores_out_of_range_and_duplicate_indices() {
    let (playlist, _receiver) = controller();
    playlist.set(vec![track("a", "A"), track("b", "B"), track("c", "C")]);

    playlist.remove(&[99, 1, 1, 42]);
    let ids: Vec<String> = playlist.tracks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn clear_resets_list_and_cursor() {
    let (playlist, _receiver) = controller();
    playlist.set(vec![track("a", "A")]);
    playlist.play_specific(&track("a", "A"));

    playlist.clear();
    assert!(playlist.is_empty());
    assert_eq!(playlist.current_index(), None);
    assert_eq!(playlist.next(), None);
}
