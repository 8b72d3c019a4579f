//! Headless host for Reverbulizer.
//!
//! Plays the host's role without a plugin format: an audio thread feeds a
//! pulsed sine through the processor at real-time block cadence, while the
//! main thread acts as the remote UI. It listens to push events, polls the
//! `levels` endpoint, and scripts a few remote commands.
//!
//! ```text
//! cargo run -p headless-host -- --seconds 5
//! RUST_LOG=debug cargo run -p headless-host
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel;
use reverbulizer::prelude::*;
use serde_json::{json, Value};

const SAMPLE_RATE: f64 = 48000.0;
const BLOCK_SIZE: usize = 512;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let seconds = parse_seconds().unwrap_or(3);
    log::info!("headless host running for {} s", seconds);

    let plugin = Reverbulizer::new(PluginConfig::DEFAULT);
    let bridge = Bridge::start(Arc::clone(plugin.shared()), BridgeConfig::new())?;
    let (sink, events) = ChannelSink::bounded(256);
    bridge.connect(sink);

    let setup = AudioSetup {
        sample_rate: SAMPLE_RATE,
        max_buffer_size: BLOCK_SIZE,
        layout: BusLayout::stereo(),
    };
    let mut processor = plugin.prepare(setup)?;
    processor.set_active(true);

    let (done_tx, done_rx) = channel::bounded::<()>(1);
    let run_for = Duration::from_secs(seconds);
    let audio = thread::Builder::new()
        .name("audio".to_string())
        .spawn(move || {
            run_audio(&mut processor, run_for);
            let _ = done_tx.send(());
            processor
        })?;

    let poll = channel::tick(POLL_INTERVAL);
    let mut polls = 0_u32;
    let mut received = 0_u64;
    let mut frozen = false;

    loop {
        crossbeam::select! {
            recv(events) -> event => match event {
                Ok(event) => {
                    received += 1;
                    if let PushEvent::IsFrozen(now) = event {
                        if now != frozen {
                            log::info!("freeze {}", if now { "engaged" } else { "released" });
                            frozen = now;
                        }
                    }
                }
                Err(_) => break,
            },
            recv(poll) -> _ => {
                polls += 1;
                report(&bridge);
                script(&bridge, polls);
            }
            recv(done_rx) -> _ => break,
        }
    }

    let processor = audio.join().map_err(|_| "audio thread panicked")?;
    let telemetry = processor.shared().telemetry.snapshot();
    log::info!(
        "{} blocks processed, {} push events received, {} spectrum frames dropped",
        telemetry.blocks_processed,
        received,
        telemetry.dropped_spectrum_frames
    );

    bridge.shutdown();
    let _plugin = processor.unprepare();
    Ok(())
}

fn parse_seconds() -> Option<u64> {
    let args: Vec<String> = std::env::args().collect();
    let index = args.iter().position(|arg| arg == "--seconds")?;
    args.get(index + 1)?.parse().ok()
}

/// Process blocks at the pace a sound card would ask for them.
fn run_audio(processor: &mut ReverbProcessor, run_for: Duration) {
    let block_duration = Duration::from_secs_f64(BLOCK_SIZE as f64 / SAMPLE_RATE);
    let start = Instant::now();
    let mut left = vec![0.0_f32; BLOCK_SIZE];
    let mut right = vec![0.0_f32; BLOCK_SIZE];
    let mut position = 0_usize;
    let mut next = start;

    while start.elapsed() < run_for {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            *l = pulsed_sine(position);
            *r = *l;
            position += 1;
        }
        processor.process(&mut Buffer::new([&mut left[..], &mut right[..]], 2, BLOCK_SIZE));

        next += block_duration;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }
}

/// 440 Hz, 100 ms on / 400 ms off.
fn pulsed_sine(n: usize) -> f32 {
    let period = (SAMPLE_RATE * 0.5) as usize;
    if n % period > period / 5 {
        return 0.0;
    }
    let t = n as f32 / SAMPLE_RATE as f32;
    0.5 * (std::f32::consts::TAU * 440.0 * t).sin()
}

fn report(bridge: &Bridge) {
    let level = match bridge.query(Endpoint::OutputLevel) {
        Ok(Record::OutputLevel { left }) => left,
        _ => MINUS_INFINITY_DB,
    };
    match bridge.query(Endpoint::Levels) {
        Ok(Record::Levels { levels }) => {
            let peak = levels
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(bin, _)| bin)
                .unwrap_or(0);
            log::info!("level {:6.1} dB, spectrum peak at bin {}", level, peak);
        }
        Ok(_) => {}
        Err(err) => log::info!("level {:6.1} dB, spectrum {}", level, err),
    }
}

/// Remote UI actions keyed by poll count.
fn script(bridge: &Bridge, poll: u32) {
    match poll {
        2 => call(bridge, "setParameter", vec![json!("SIZE"), json!(0.9)]),
        4 => call(bridge, "setParameter", vec![json!("FREEZE"), json!(1.0)]),
        7 => call(bridge, "undo", vec![]),
        8 => call(bridge, "webUndoRedo", vec![json!("Y")]),
        10 => {
            bridge.handle_key(KeyPress::command('z'));
        }
        11 => call(bridge, "bogus", vec![]),
        _ => {}
    }
}

fn call(bridge: &Bridge, name: &str, args: Vec<Value>) {
    match bridge.invoke(name, args).blocking_recv() {
        Ok(Ok(value)) => log::info!("{} -> {}", name, value),
        Ok(Err(err)) => log::warn!("{} failed: {}", name, err),
        Err(_) => log::warn!("{} was dropped", name),
    }
}
