// Resolver properties over randomly generated songs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use songclick::sequencer::{CachedResolver, Resolution, resolve};
use songclick::song::{Bar, Song};

fn random_song(rng: &mut StdRng) -> Song {
    let count = rng.gen_range(1..=8);
    let bars = (0..count)
        .map(|i| {
            Bar::new(
                format!("Bar {}", i),
                rng.gen_range(20..=300),
                rng.gen_range(1..=7),
                rng.gen_range(1..=4),
            )
            .with_repeat_count(rng.gen_range(1..=3))
        })
        .collect();
    Song::with_bars("Random", bars)
}

#[test]
fn test_every_tick_resolves_inside_its_bar() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..200 {
        let song = random_song(&mut rng);
        let total = song.total_length();

        let mut expected_start = 0u64;
        let mut expected_index = 0usize;
        for tick in 0..total {
            let bar_end = expected_start + song.bars[expected_index].block_length();
            if tick >= bar_end {
                expected_start = bar_end;
                expected_index += 1;
            }
            let bar = &song.bars[expected_index];

            let Resolution::Bar(pos) = resolve(tick, &song.bars) else {
                panic!("tick {} of {} did not resolve", tick, total);
            };
            assert_eq!(pos.bar_index, expected_index);
            assert_eq!(pos.bar_start, expected_start);
            assert!(tick >= pos.bar_start && tick < pos.bar_start + bar.block_length());

            let offset = tick - pos.bar_start;
            let sub = bar.subdivisions as u64;
            let beats = bar.beats_per_bar as u64;
            assert_eq!(pos.beat as u64, (offset / sub) % beats);
            assert_eq!(pos.sub_beat as u64, offset % sub);
            assert_eq!(pos.repeat as u64, offset / (beats * sub));
            assert_eq!(pos.tempo, bar.tempo);
        }

        assert_eq!(resolve(total, &song.bars), Resolution::EndOfSong);
        assert_eq!(resolve(total + 17, &song.bars), Resolution::EndOfSong);
    }
}

#[test]
fn test_cached_resolver_agrees_with_full_scan() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..100 {
        let song = random_song(&mut rng);
        let total = song.total_length();
        let mut cached = CachedResolver::new();

        // Sequential pass, then random seeks including past the end
        for tick in 0..=total {
            assert_eq!(cached.resolve(tick, &song.bars), resolve(tick, &song.bars));
        }
        for _ in 0..50 {
            let tick = rng.gen_range(0..total + 4);
            assert_eq!(cached.resolve(tick, &song.bars), resolve(tick, &song.bars));
        }
    }
}

#[test]
fn test_cache_follows_edited_bars_after_invalidate() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut song = random_song(&mut rng);
    let mut cached = CachedResolver::new();
    cached.resolve(0, &song.bars);

    song.insert_bar_before(0, Bar::new("Intro", 90, 2, 2)).unwrap();
    cached.invalidate();
    for tick in 0..song.total_length() {
        assert_eq!(cached.resolve(tick, &song.bars), resolve(tick, &song.bars));
    }
}

#[test]
fn test_empty_and_degenerate_sequences() {
    assert_eq!(resolve(0, &[]), Resolution::Empty);

    let mut bar = Bar::new("Zero", 120, 4, 1);
    bar.subdivisions = 0;
    assert_eq!(resolve(0, &[bar.clone()]), Resolution::Empty);

    let mut cached = CachedResolver::new();
    assert_eq!(cached.resolve(3, &[bar]), Resolution::Empty);
}
