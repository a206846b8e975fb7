// Loading and saving songs on disk

use songclick::song::{Bar, BarEdit, Song, SongError};

fn practice_song() -> Song {
    let mut song = Song::new("Etude");
    song.push_bar(Bar::starter());
    song.apply(BarEdit::AddAfter {
        index: 0,
        bar: Bar::new("Allegro", 132, 3, 2),
    })
    .unwrap();
    song.toggle_favorite();
    song
}

#[test]
fn test_ron_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etude.ron");
    let song = practice_song();

    song.save(&path).unwrap();
    let loaded = Song::load(&path).unwrap();
    assert_eq!(loaded, song);
    assert_eq!(loaded.total_length(), 32 + 6);
}

#[test]
fn test_json_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etude.json");
    let song = practice_song();

    song.save(&path).unwrap();
    assert_eq!(Song::load(&path).unwrap(), song);
}

#[test]
fn test_hand_written_ron_without_optional_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hand.ron");
    std::fs::write(
        &path,
        r#"(
            id: "6f1c5a4e-5d0c-4a53-9d52-2f1b8f0c2a11",
            name: "Hand written",
            instrument: "Guitar",
            created_at: "2024-03-01T10:00:00Z",
            bars: [
                (id: 0, name: "Intro", tempo: 90, beats_per_bar: 4, subdivisions: 2, repeat_count: 1),
            ],
        )"#,
    )
    .unwrap();

    let song = Song::load(&path).unwrap();
    assert!(!song.favorite);
    assert_eq!(song.bars[0].delay, 0);
    assert_eq!(song.total_length(), 8);
}

#[test]
fn test_invalid_song_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    let mut song = practice_song();
    song.bars[1].tempo = 0;
    std::fs::write(&path, song.to_json_string().unwrap()).unwrap();

    assert!(matches!(
        Song::load(&path),
        Err(SongError::InvalidTempo { index: 1, value: 0 })
    ));
}

#[test]
fn test_unknown_extension_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Song::load(dir.path().join("song.txt")),
        Err(SongError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        Song::load(dir.path().join("missing.ron")),
        Err(SongError::Io(_))
    ));
}
