use crossbeam_channel::unbounded;
use ssd_core::{CycleTrigger, DisplayConfig, EdgeHandler, ErrorState, SegmentTable, Wiring};
use ssd_peripherals::board::ReadingBoard;
use ssd_peripherals::replay::{format_capture, ReplayReader};
use ssd_peripherals::sim::{Glitch, SimulatedPanel};
use ssd_peripherals::worker::spawn_decoder;
use ssd_protocol::report::{parse_report, serialize_report};
use std::io::Cursor;

const LEFT: [u8; 3] = [4, 7, 8];
const RIGHT: [u8; 3] = [9, 10, 11];

fn handler(trigger: CycleTrigger) -> EdgeHandler {
    let mut handler = EdgeHandler::new(SegmentTable::default(), Wiring::default());
    for lines in [LEFT, RIGHT].iter() {
        let config = DisplayConfig::new(lines).unwrap().with_trigger(trigger);
        handler.add_display(&config).unwrap();
    }
    handler
}

fn panel() -> SimulatedPanel {
    let mut panel = SimulatedPanel::new(SegmentTable::default(), Wiring::default());
    panel.add_display(&LEFT);
    panel.add_display(&RIGHT);
    panel.show(0, "12.3").unwrap();
    panel.show(1, "7").unwrap();
    panel
}

#[test]
fn test_worker_confirms_both_displays() {
    let (capture_tx, capture_rx) = unbounded();
    let (reading_tx, reading_rx) = unbounded();
    let decoder = spawn_decoder(handler(CycleTrigger::AllRefreshed), capture_rx, reading_tx).unwrap();

    let mut panel = panel();
    for cycle in 0..8 {
        if cycle == 2 {
            panel.inject(1, Glitch::Overlap(0));
        }
        for capture in panel.scan() {
            capture_tx.send(capture).unwrap();
        }
    }
    drop(capture_tx);
    let handler = decoder.join().unwrap();

    let mut board = ReadingBoard::new(2);
    assert_eq!(board.drain(&reading_rx), 16);
    assert_eq!(board.get(0).unwrap().trusted(), Some(12.3));
    // The overlap cost the right display its early lead but it recovers
    assert_eq!(board.get(1).unwrap().error, ErrorState::Ok);
    assert_eq!(handler.display(1).unwrap().value(), 7.0);

    let line = serialize_report(&board.report());
    let report = parse_report(&line).unwrap();
    assert_eq!(report.displays[0].value, Some(12.3));
    assert_eq!(report.displays[1].value, Some(7.0));
}

#[test]
fn test_replayed_capture_matches_live_decode() {
    let mut panel = panel();
    let mut text = String::from("# simulated capture\n");
    for _ in 0..6 {
        for capture in panel.scan() {
            text.push_str(&format_capture(&capture));
            text.push('\n');
        }
    }

    let (capture_tx, capture_rx) = unbounded();
    let (reading_tx, reading_rx) = unbounded();
    let decoder = spawn_decoder(handler(CycleTrigger::LastLine), capture_rx, reading_tx).unwrap();
    for capture in ReplayReader::new(Cursor::new(text)) {
        capture_tx.send(capture.unwrap()).unwrap();
    }
    drop(capture_tx);
    decoder.join().unwrap();

    let mut board = ReadingBoard::new(2);
    board.drain(&reading_rx);
    assert_eq!(board.get(0).unwrap().error, ErrorState::Ok);
    assert_eq!(board.get(1).unwrap().trusted(), Some(7.0));
}

#[test]
fn test_skipped_strobe_delays_aggregation() {
    let mut handler = handler(CycleTrigger::AllRefreshed);
    let mut panel = panel();
    let captures = panel.scan();

    // Drop the middle strobe of the left display
    let mut completed = Vec::new();
    for capture in captures.iter().filter(|c| c.edge.line != 7) {
        if let Some(update) = handler.on_edge(&capture.edge, capture) {
            completed.push(update.0);
        }
    }
    assert_eq!(completed, vec![1]);
    assert_eq!(handler.display(0).unwrap().error_state(), ErrorState::Uninitialized);
}
