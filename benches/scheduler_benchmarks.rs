use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use songclick::audio::render_song;
use songclick::sequencer::{
    CachedResolver, ClickKit, ClickSink, ClickType, ManualTransport, Scheduler, resolve,
};
use songclick::song::{Bar, Song};

struct NullSink;

impl ClickSink for NullSink {
    fn is_loaded(&self) -> bool {
        true
    }

    fn trigger(&mut self, click: ClickType, at: f64) {
        black_box((click, at));
    }
}

fn song_with_bars(count: usize) -> Song {
    let bars = (0..count)
        .map(|i| {
            let i = i as u32;
            Bar::new(format!("Bar {}", i), 60 + i % 120, 4, 1 + i % 4)
        })
        .collect();
    Song::with_bars("Bench", bars)
}

/// Full scan against the cached lookup used by the scheduler
fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for bar_count in [8, 64, 512] {
        let song = song_with_bars(bar_count);
        let total = song.total_length();

        group.bench_with_input(BenchmarkId::new("full_scan", bar_count), &song, |b, song| {
            b.iter(|| {
                for tick in 0..total {
                    black_box(resolve(tick, &song.bars));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("cached", bar_count), &song, |b, song| {
            b.iter(|| {
                let mut resolver = CachedResolver::new();
                for tick in 0..total {
                    black_box(resolver.resolve(tick, &song.bars));
                }
            });
        });
    }
    group.finish();
}

/// Ticks handled per second on virtual time
fn bench_scheduler_throughput(c: &mut Criterion) {
    let song = song_with_bars(64);

    c.bench_function("scheduler_whole_song", |b| {
        b.iter(|| {
            let mut scheduler = Scheduler::new(ManualTransport::new(), NullSink);
            let _ = scheduler.set_song(song.clone());
            scheduler.start();
            black_box(scheduler.run_until_stopped(None))
        });
    });

    c.bench_function("scheduler_free_meter_1000_ticks", |b| {
        b.iter(|| {
            let mut scheduler = Scheduler::new(ManualTransport::new(), NullSink);
            scheduler.set_beats_and_subdivisions(7, 3);
            scheduler.start();
            black_box(scheduler.run_until_stopped(Some(1000)))
        });
    });
}

fn bench_offline_render(c: &mut Criterion) {
    let song = song_with_bars(8);
    let kit = ClickKit::synthesized(48000.0);

    c.bench_function("render_8_bars_48k", |b| {
        b.iter(|| black_box(render_song(&song, kit.clone(), 48000, 0.8)));
    });
}

criterion_group!(
    benches,
    bench_resolution,
    bench_scheduler_throughput,
    bench_offline_render
);
criterion_main!(benches);
