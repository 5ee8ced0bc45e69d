use crossbeam_channel::{bounded, unbounded, RecvTimeoutError, TryRecvError};
use log::{error, info};

use ssd_core::{EdgeHandler, SegmentTable};
use ssd_peripherals::board::ReadingBoard;
use ssd_peripherals::publish::ReportPublisher;
use ssd_peripherals::replay::ReplayReader;
use ssd_peripherals::sim::SimulatedPanel;
use ssd_peripherals::worker::spawn_decoder;
use ssd_protocol::report::serialize_report;

use std::fs::File;
use std::io::{self, BufRead, BufReader};

mod feed;
mod settings;

use settings::{get_cli_config, Settings, Source};

// Setup failures print the usage and exit non-zero
fn setup_failed(message: &str, usage: &str) -> ! {
    error!("{}", message);
    eprintln!("{}", usage);
    std::process::exit(1);
}

fn open_replay(path: &Option<std::path::PathBuf>) -> io::Result<Box<dyn BufRead + Send>> {
    match path {
        Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn emit(board: &ReadingBoard, publisher: &Option<ReportPublisher>) {
    let line = serialize_report(&board.report());
    println!("{}", line);
    if let Some(publisher) = publisher {
        publisher.publish(&line);
    }
}

/// Main entry point for the display reader
fn main() {
    env_logger::init();

    // Ctrl-C asks the report loop for a last report; a second one exits at once
    let (signal_sender, signal_receiver) = bounded(1);
    let handler_result = ctrlc::set_handler(move || {
        if signal_sender.is_full() {
            std::process::exit(-1);
        }
        let _ = signal_sender.send(());
    });

    if let Err(e) = handler_result {
        error!("Signal handler failed: {:?}", e);
        return;
    }

    // Parse command-line arguments
    let cli_matches = get_cli_config().get_matches();
    let usage = cli_matches.usage().to_owned();
    let settings = match Settings::from_matches(&cli_matches) {
        Ok(settings) => settings,
        Err(e) => setup_failed(&e, &usage),
    };

    let table = SegmentTable::new(settings.mapping);
    table.log_summary();

    let mut handler = EdgeHandler::new(table, settings.wiring);
    for config in settings.displays.iter() {
        if let Err(e) = handler.add_display(config) {
            setup_failed(e, &usage);
        }
    }
    info!(
        "Monitoring gpios (mask 0x{:08x}), refresh {:?}, sampling {}us",
        handler.select_mask(),
        settings.refresh,
        settings.sample_micros
    );

    let (capture_tx, capture_rx) = unbounded();
    let (reading_tx, reading_rx) = unbounded();

    // Start the capture feed
    let feed_result = match &settings.source {
        Source::Replay(path) => {
            let reader = match open_replay(path) {
                Ok(reader) => reader,
                Err(e) => setup_failed(&format!("Cannot open capture: {}", e), &usage),
            };
            feed::spawn_replay(ReplayReader::new(reader), capture_tx)
        }
        Source::Simulate {
            values,
            glitch_every,
        } => {
            let mut panel = SimulatedPanel::new(table, settings.wiring)
                .with_timing(settings.pulse_micros, settings.sample_micros);
            let mut positions = Vec::new();
            for (config, value) in settings.displays.iter().zip(values.iter()) {
                let index = panel.add_display(config.lines());
                if let Err(e) = panel.show(index, value) {
                    setup_failed(&format!("Cannot show {}: {}", value, e), &usage);
                }
                positions.push(config.lines().len());
            }
            feed::spawn_simulator(
                panel,
                positions,
                *glitch_every,
                settings.pulse_micros,
                capture_tx,
            )
        }
    };
    if let Err(e) = feed_result {
        error!("Cannot start capture feed: {}", e);
        return;
    }

    let decoder = match spawn_decoder(handler, capture_rx, reading_tx) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Cannot start decoder: {}", e);
            return;
        }
    };

    let publisher = match &settings.listen {
        Some(addr) => match ReportPublisher::bind(addr.as_str()) {
            Ok(publisher) => Some(publisher),
            Err(e) => {
                error!("Cannot publish on {}: {}", addr, e);
                return;
            }
        },
        None => None,
    };

    // Report loop
    let mut board = ReadingBoard::new(settings.displays.len());
    loop {
        match signal_receiver.recv_timeout(settings.refresh) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("Interrupted, stopping");
                board.drain(&reading_rx);
                emit(&board, &publisher);
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        board.drain(&reading_rx);
        let finished = match reading_rx.try_recv() {
            Ok((index, reading)) => {
                board.update(index, reading);
                false
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        };
        emit(&board, &publisher);

        if finished {
            break;
        }
    }

    // Capture feed is exhausted
    match decoder.join() {
        Ok(handler) => {
            for (index, display) in handler.displays().iter().enumerate() {
                info!(
                    "Display {} ended {} at {} (repeat {})",
                    index,
                    display.error_state(),
                    display.value(),
                    display.repeat()
                );
            }
        }
        Err(_) => error!("Decoder thread panicked"),
    }
}
