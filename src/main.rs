use env_logger::Env;
use songclick::{
    AppConfig, Bar, ChannelSink, ClickKit, ClickOutput, Meter, Scheduler, Song, SystemTransport,
    TempoMarking, render_song, write_wav,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Time left for the last click to ring out before the stream closes
const TAIL: Duration = Duration::from_millis(300);

const USAGE: &str = "usage: songclick [--config PATH] <command>

commands:
  play <song.ron|song.json>                       play a song through the default output
  render <song> <out.wav>                         bounce the click track to a WAV file
  click [<bpm> <beats> <subdivisions>] <ticks>    run the free metronome";

#[derive(Debug)]
enum Command {
    Play(PathBuf),
    Render(PathBuf, PathBuf),
    /// Free metronome; without an explicit meter the configured one is used
    Click { meter: Option<Meter>, ticks: u64 },
}

fn number<N: std::str::FromStr>(text: &str, what: &str) -> Result<N, String> {
    text.parse::<N>()
        .map_err(|_| format!("{} must be a whole number, got '{}'", what, text))
}

fn parse_args(mut args: Vec<String>) -> Result<(Option<PathBuf>, Command), String> {
    let mut config = None;
    if args.first().map(String::as_str) == Some("--config") {
        if args.len() < 2 {
            return Err("--config needs a path".to_string());
        }
        config = Some(PathBuf::from(args.remove(1)));
        args.remove(0);
    }

    let command = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["play", song] => Command::Play(song.into()),
        ["render", song, out] => Command::Render(song.into(), out.into()),
        ["click", bpm, beats, subdivisions, ticks] => Command::Click {
            meter: Some(Meter {
                bpm: number(bpm, "bpm")?,
                beats: number(beats, "beats")?,
                subdivisions: number(subdivisions, "subdivisions")?,
            }),
            ticks: number(ticks, "ticks")?,
        },
        ["click", ticks] => Command::Click {
            meter: None,
            ticks: number(ticks, "ticks")?,
        },
        _ => return Err(USAGE.to_string()),
    };
    Ok((config, command))
}

/// Pump the scheduler, logging a display line on every downbeat
fn drive(scheduler: &mut Scheduler<SystemTransport, ChannelSink>, max_ticks: Option<u64>) -> u64 {
    let mut handled = 0;
    while scheduler.is_playing() && max_ticks.is_none_or(|max| handled < max) {
        if !scheduler.pump() {
            break;
        }
        handled += 1;

        let state = scheduler.snapshot();
        if state.playing && state.beat == 0 && state.sub_beat == 0 {
            match state.bar_index {
                Some(bar) => log::info!(
                    "bar {} | {} BPM ({}) | {} beats x{} | tick {}",
                    bar + 1,
                    state.tempo,
                    TempoMarking::for_bpm(state.tempo).name,
                    state.beats_per_bar,
                    state.subdivisions,
                    state.counter
                ),
                None => log::info!(
                    "{} BPM ({}) | {} beats x{} | tick {}",
                    state.tempo,
                    TempoMarking::for_bpm(state.tempo).name,
                    state.beats_per_bar,
                    state.subdivisions,
                    state.counter
                ),
            }
        }
    }
    handled
}

/// A song without bars gets the starter bar, as a new song does in the editor
fn with_starter_bar(mut song: Song) -> Song {
    if song.is_empty() {
        log::warn!("Song '{}' has no bars, using the starter bar", song.name);
        song.push_bar(Bar::starter());
    }
    song
}

fn play(config: &AppConfig, song_path: &Path) -> Result<(), Box<dyn Error>> {
    let song = with_starter_bar(Song::load(song_path)?);
    let (output, sink) = ClickOutput::open(config.click_samples.as_ref(), config.volume)?;
    log::info!(
        "Playing '{}' ({} bars, {:.1}s) at {} Hz",
        song.name,
        song.bars.len(),
        song.duration_seconds(),
        output.sample_rate()
    );

    let mut scheduler = Scheduler::new(SystemTransport::new(), sink);
    scheduler.set_song(song)?;
    scheduler.start();
    drive(&mut scheduler, None);

    std::thread::sleep(TAIL);
    if scheduler.sink().dropped() > 0 {
        log::warn!("{} clicks were dropped", scheduler.sink().dropped());
    }
    Ok(())
}

fn render(config: &AppConfig, song_path: &Path, out: &Path) -> Result<(), Box<dyn Error>> {
    let song = with_starter_bar(Song::load(song_path)?);
    let sample_rate = config.render_sample_rate;
    let kit = match &config.click_samples {
        Some(paths) => ClickKit::from_files(paths, sample_rate)?,
        None => ClickKit::synthesized(sample_rate as f32),
    };

    let samples = render_song(&song, kit, sample_rate, config.volume)?;
    write_wav(out, &samples, sample_rate)?;
    Ok(())
}

fn click(config: &AppConfig, meter: Option<Meter>, ticks: u64) -> Result<(), Box<dyn Error>> {
    let meter = meter.unwrap_or(config.meter);
    let (_output, sink) = ClickOutput::open(config.click_samples.as_ref(), config.volume)?;

    let mut scheduler = Scheduler::new(SystemTransport::new(), sink);
    scheduler.set_tempo(meter.bpm);
    scheduler.set_beats_and_subdivisions(meter.beats, meter.subdivisions);
    scheduler.start();
    drive(&mut scheduler, Some(ticks));
    scheduler.stop();

    std::thread::sleep(TAIL);
    Ok(())
}

fn run(args: Vec<String>) -> Result<(), Box<dyn Error>> {
    let (config_path, command) = parse_args(args)?;
    let config = AppConfig::load_or_default(config_path.as_deref())?;

    match command {
        Command::Play(song) => play(&config, &song),
        Command::Render(song, out) => render(&config, &song, &out),
        Command::Click { meter, ticks } => click(&config, meter, ticks),
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(std::env::args().skip(1).collect()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
