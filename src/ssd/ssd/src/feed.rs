use ssd_peripherals::replay::ReplayReader;
use ssd_peripherals::sim::{Glitch, SimulatedPanel};
use ssd_peripherals::Capture;

use crossbeam_channel::Sender;
use log::{error, info, warn};
use std::io::{self, BufRead};
use std::thread::JoinHandle;
use std::time::Duration;

// Streams a capture file until it ends or the decoder goes away
fn replay_thread<R: BufRead>(reader: ReplayReader<R>, captures: Sender<Capture>) {
    let mut count: u64 = 0;
    for item in reader {
        match item {
            Ok(capture) => {
                if captures.send(capture).is_err() {
                    return;
                }
                count += 1;
            }
            Err(e) => {
                error!("{}", e);
                break;
            }
        }
    }
    info!("Replay finished after {} captures", count);
}

pub fn spawn_replay<R: BufRead + Send + 'static>(
    reader: ReplayReader<R>,
    captures: Sender<Capture>,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("ssd-replay".into())
        .spawn(move || replay_thread(reader, captures))
}

// Picks the fault for the n-th glitch: overlaps and ghosts take turns across positions
fn glitch_for(n: u32, positions: usize) -> Glitch {
    let position = (n as usize / 2) % positions.max(1);
    if n % 2 == 0 {
        Glitch::Overlap(position)
    } else {
        Glitch::Ghost(position)
    }
}

fn simulator_thread(
    mut panel: SimulatedPanel,
    positions: Vec<usize>,
    glitch_every: Option<u32>,
    scan_period: Duration,
    captures: Sender<Capture>,
) {
    let mut scans: u32 = 0;
    let mut glitches: u32 = 0;
    loop {
        scans = scans.wrapping_add(1);
        if let Some(every) = glitch_every {
            if scans % every == 0 {
                let display = glitches as usize % positions.len().max(1);
                let glitch = glitch_for(glitches, positions.get(display).copied().unwrap_or(0));
                warn!("Injecting {:?} on display {}", glitch, display);
                panel.inject(display, glitch);
                glitches = glitches.wrapping_add(1);
            }
        }

        for capture in panel.scan() {
            if captures.send(capture).is_err() {
                return;
            }
        }
        std::thread::sleep(scan_period);
    }
}

/// Drives `panel` forever; `positions` lists the position count of each display
pub fn spawn_simulator(
    panel: SimulatedPanel,
    positions: Vec<usize>,
    glitch_every: Option<u32>,
    pulse_micros: u32,
    captures: Sender<Capture>,
) -> io::Result<JoinHandle<()>> {
    // Three bus/select changes per strobed position
    let strobes: usize = positions.iter().sum::<usize>() * 3;
    let scan_period = Duration::from_micros(pulse_micros as u64 * strobes as u64);
    std::thread::Builder::new()
        .name("ssd-simulator".into())
        .spawn(move || simulator_thread(panel, positions, glitch_every, scan_period, captures))
}
