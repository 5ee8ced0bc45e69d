use ssd_core::Reading;
use ssd_protocol::report::{DisplayReport, Report};

#[cfg(feature = "host-peripherals")]
use crossbeam_channel::Receiver;

/// Latest published reading of every display, as seen by the reporter
pub struct ReadingBoard {
    readings: Vec<Option<Reading>>,
    tick: u32, // Tick of the reading received last, from any display
}

impl ReadingBoard {
    pub fn new(displays: usize) -> Self {
        ReadingBoard {
            readings: vec![None; displays],
            tick: 0,
        }
    }

    pub fn update(&mut self, index: usize, reading: Reading) {
        if let Some(slot) = self.readings.get_mut(index) {
            *slot = Some(reading);
            self.tick = reading.tick;
        }
    }

    pub fn get(&self, index: usize) -> Option<&Reading> {
        self.readings.get(index).and_then(|r| r.as_ref())
    }

    /// Takes every reading queued by the decoder; returns how many arrived
    #[cfg(feature = "host-peripherals")]
    pub fn drain(&mut self, rx: &Receiver<(usize, Reading)>) -> usize {
        let mut count = 0;
        for (index, reading) in rx.try_iter() {
            self.update(index, reading);
            count += 1;
        }
        count
    }

    pub fn report(&self) -> Report {
        let displays = self
            .readings
            .iter()
            .enumerate()
            .map(|(index, reading)| match reading {
                Some(r) => DisplayReport::from_reading(index, r),
                None => DisplayReport::uninitialized(index),
            })
            .collect();
        Report {
            tick: self.tick,
            displays,
        }
    }
}

#[cfg(test)]
mod board_tests {
    use super::*;
    use ssd_core::ErrorState;
    use ssd_protocol::report::serialize_report;

    #[test]
    fn test_report_keeps_latest() {
        let mut board = ReadingBoard::new(2);
        assert_eq!(serialize_report(&board.report()), "tick=0 d0=!uninitialized d1=!uninitialized");

        let mut reading = Reading {
            value: 1.5,
            error: ErrorState::Unconfirmed,
            repeat: 0,
            tick: 10,
        };
        board.update(1, reading);
        reading.error = ErrorState::Ok;
        reading.tick = 20;
        board.update(1, reading);
        board.update(5, reading);

        assert_eq!(board.get(1).unwrap().error, ErrorState::Ok);
        assert!(board.get(0).is_none());
        assert_eq!(serialize_report(&board.report()), "tick=20 d0=!uninitialized d1=1.5");
    }

    #[cfg(feature = "host-peripherals")]
    #[test]
    fn test_drain_channel() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut board = ReadingBoard::new(1);
        for tick in 0..3 {
            let reading = Reading {
                value: tick as f64,
                error: ErrorState::Unconfirmed,
                repeat: 0,
                tick,
            };
            tx.send((0, reading)).unwrap();
        }
        assert_eq!(board.drain(&rx), 3);
        assert_eq!(board.get(0).unwrap().value, 2.0);
        assert_eq!(board.drain(&rx), 0);
    }
}
