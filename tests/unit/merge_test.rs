//! Unit tests for recording-tail merging

use intone::reanalysis::{merge_notes, merge_pitch_track, NoteMerge};
use intone::track::Event;

#[test]
fn overlapping_first_note_is_joined() {
    let existing = vec![Event::note(0, 50, 200.0), Event::note(100, 50, 220.0)];
    let incoming = vec![Event::note(20, 40, 230.0), Event::note(80, 10, 250.0)];

    let merge = merge_notes(&existing, &incoming, 100);

    assert_eq!(merge.remove, Some(Event::note(100, 50, 220.0)));
    assert_eq!(
        merge.add,
        vec![Event::note(100, 60, 220.0), Event::note(180, 10, 250.0)]
    );
}

#[test]
fn touching_note_is_kept_separate() {
    let existing = vec![Event::note(100, 50, 220.0)];
    let incoming = vec![Event::note(50, 20, 230.0)];

    let merge = merge_notes(&existing, &incoming, 100);

    assert_eq!(merge.remove, None);
    assert_eq!(merge.add, vec![Event::note(150, 20, 230.0)]);
}

#[test]
fn note_starting_with_previous_is_kept_separate() {
    let existing = vec![Event::note(100, 50, 220.0)];
    let incoming = vec![Event::note(0, 20, 230.0)];

    let merge = merge_notes(&existing, &incoming, 100);

    assert_eq!(merge.remove, None);
    assert_eq!(merge.add[0].frame, 100);
}

#[test]
fn nothing_existing_only_shifts() {
    let merge = merge_notes(&[], &[Event::note(10, 5, 100.0)], 2500);
    assert_eq!(
        merge,
        NoteMerge {
            remove: None,
            add: vec![Event::note(2510, 5, 100.0)],
        }
    );
}

#[test]
fn nothing_incoming_is_empty() {
    let merge = merge_notes(&[Event::note(0, 100, 100.0)], &[], 0);
    assert_eq!(merge, NoteMerge::default());
}

#[test]
fn pitch_events_pass_through() {
    let incoming = vec![Event::pitch(7500, 200.0), Event::pitch(7500, 200.0)];
    assert_eq!(merge_pitch_track(&incoming), incoming);
}
