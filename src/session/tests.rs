use std::fs;
use std::time::Duration;

use super::*;
use crate::library::lock_catalog;

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "BD1\n0\n").unwrap();
    path
}

fn snapshot(selected: Option<usize>) -> PlayerSnapshot {
    PlayerSnapshot {
        selected,
        shuffle: true,
        loop_playlist: false,
        exclusions: ExclusionSet::from_names(["spc1", "spc2.acm"], true),
    }
}

#[test]
fn entries_carry_optional_durations() {
    assert_eq!(
        encode_entry(Path::new("/m/a.mus"), Some(Duration::from_millis(1500))),
        "/m/a.mus;1500"
    );
    assert_eq!(encode_entry(Path::new("/m/a.mus"), None), "/m/a.mus");
    assert_eq!(
        decode_entry("/m/a.mus;1500"),
        (PathBuf::from("/m/a.mus"), Some(Duration::from_millis(1500)))
    );
    // A semicolon that is not followed by a number belongs to the path.
    assert_eq!(decode_entry("/m/odd;name.mus"), (PathBuf::from("/m/odd;name.mus"), None));
}

#[test]
fn capture_then_restore_rebuilds_the_engine_state() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.mus");
    let b = touch(dir.path(), "b.mus");

    let mut catalog = Catalog::new();
    let ia = catalog.add(&a, Some(Duration::from_secs(3))).unwrap().unwrap();
    let ib = catalog.add(&b, None).unwrap().unwrap();
    catalog.set_playlist([ib, ia, ib]).unwrap();

    let state = SessionState::capture(&catalog, &snapshot(Some(1)));
    assert_eq!(state.playlist, vec![1, 0, 1]);
    assert_eq!(state.exclusions, vec!["SPC1".to_string(), "SPC2".to_string()]);

    let restored = state.restore(Scheduler::seeded(0));
    let c = &restored.catalog;
    assert_eq!(c.available().len(), 2);
    assert_eq!(c.available()[0].path, a);
    assert_eq!(c.available()[0].duration, Some(Duration::from_secs(3)));
    assert_eq!(c.available()[1].duration, None);
    let names: Vec<String> = (0..c.playlist_len())
        .map(|i| c.playlist_track(i).unwrap().name())
        .collect();
    assert_eq!(names, vec!["b", "a", "b"]);

    assert_eq!(restored.scheduler.current(), Some(1));
    assert!(restored.scheduler.is_shuffle());
    assert!(!restored.scheduler.is_loop());
    assert!(restored.exclusions.excludes("spc2"));

    // Capturing the restored state gives back the same document.
    let again = SessionState::capture(
        &restored.catalog,
        &PlayerSnapshot {
            selected: restored.scheduler.current(),
            shuffle: restored.scheduler.is_shuffle(),
            loop_playlist: restored.scheduler.is_loop(),
            exclusions: restored.exclusions.clone(),
        },
    );
    assert_eq!(again, state);
}

#[test]
fn restore_drops_missing_files_and_remaps_the_playlist() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.mus");
    let c = touch(dir.path(), "c.mus");
    let gone = dir.path().join("gone.mus");

    let state = SessionState {
        available: vec![
            a.to_string_lossy().into_owned(),
            format!("{};2000", gone.display()),
            format!("{};4000", c.display()),
        ],
        playlist: vec![2, 1, 0],
        selected: Some(2),
        loop_playlist: true,
        ..SessionState::default()
    };

    let restored = state.restore(Scheduler::seeded(0));
    let catalog = &restored.catalog;
    assert_eq!(catalog.available().len(), 2);
    assert_eq!(catalog.playlist_len(), 2);
    assert_eq!(catalog.playlist_track(0).unwrap().path, c);
    assert_eq!(catalog.playlist_track(1).unwrap().path, a);
    // The selected entry (a) moved from position 2 to 1.
    assert_eq!(restored.scheduler.current(), Some(1));
    assert!(restored.scheduler.is_loop());
}

#[test]
fn restore_clears_a_selection_that_was_dropped() {
    let state = SessionState {
        available: vec!["/definitely/not/here.mus".to_string()],
        playlist: vec![0, 7],
        selected: Some(0),
        ..SessionState::default()
    };
    let restored = state.restore(Scheduler::seeded(0));
    assert!(restored.catalog.is_empty());
    assert_eq!(restored.catalog.playlist_len(), 0);
    assert_eq!(restored.scheduler.current(), None);
}

#[test]
fn save_and_load_through_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("session.toml");
    let state = SessionState {
        available: vec!["/m/a.mus;1000".to_string()],
        playlist: vec![0],
        selected: Some(0),
        loop_playlist: true,
        shuffle: false,
        exclusion_enabled: true,
        exclusions: vec!["SPC1".to_string()],
    };

    state.save(&path).unwrap();
    assert!(!path.with_extension("toml.tmp").exists());
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("exclusion_enabled = true"));

    assert_eq!(SessionState::load(&path).unwrap(), Some(state));
}

#[test]
fn load_missing_file_is_none_and_garbage_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(SessionState::load(&dir.path().join("none.toml")).unwrap(), None);

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "playlist = \"oops\"").unwrap();
    assert!(matches!(SessionState::load(&bad), Err(Error::Session(_))));
}

#[test]
fn restored_catalog_accepts_changes() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.mus");
    let state = SessionState {
        available: vec![a.to_string_lossy().into_owned()],
        ..SessionState::default()
    };
    let handle = state.restore(Scheduler::seeded(0)).catalog.into_handle();
    let mut catalog = lock_catalog(&handle);
    assert!(!catalog.is_mutation_locked());
    assert!(catalog.add(dir.path().join("b.mus"), None).unwrap().is_some());
}

#[test]
fn restore_drops_duplicate_tracks_and_keeps_a_valid_selection() {
    let dir = tempfile::tempdir().unwrap();
    let a = touch(dir.path(), "a.mus");
    let state = SessionState {
        available: vec![a.to_string_lossy().into_owned(), a.to_string_lossy().into_owned()],
        playlist: vec![1, 0],
        selected: Some(1),
        ..SessionState::default()
    };
    let restored = state.restore(Scheduler::seeded(0));
    assert_eq!(restored.catalog.available().len(), 1);
    assert_eq!(restored.catalog.playlist_len(), 1);
    assert_eq!(restored.scheduler.current(), Some(0));
}
