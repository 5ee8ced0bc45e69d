use crate::capture::Capture;
use ssd_core::constants::segments::{ROLE_A, ROLE_D};
use ssd_core::utils::line_bit;
use ssd_core::{EdgeEvent, EdgeHandler, Level, LineSource, Polarity, Reading, SegmentTable, Wiring};

use log::trace;

/// Content of one display position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub digit: Option<u8>, // None leaves the position dark
    pub dp: bool,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        digit: None,
        dp: false,
    };
}

/// Lays out a number such as "12.3" right-aligned over `positions` cells
pub fn layout(text: &str, positions: usize) -> Result<Vec<Cell>, &'static str> {
    let mut cells: Vec<Cell> = Vec::new();
    for ch in text.chars() {
        match ch {
            '0'..='9' => cells.push(Cell {
                digit: Some(ch as u8 - b'0'),
                dp: false,
            }),
            '.' => match cells.last_mut() {
                Some(cell) if !cell.dp => cell.dp = true,
                _ => cells.push(Cell {
                    digit: None,
                    dp: true,
                }),
            },
            _ => return Err("Only digits and '.' can be shown"),
        }
    }

    if cells.is_empty() {
        return Err("Nothing to show");
    }
    if cells.len() > positions {
        return Err("Value does not fit the display");
    }

    let mut laid_out = vec![Cell::BLANK; positions - cells.len()];
    laid_out.extend(cells);
    Ok(laid_out)
}

/// Faults the simulated panel can produce on its next scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glitch {
    Overlap(usize), // Neighbouring select line still asserted while this position strobes
    Ghost(usize),   // Bus caught mid-change, lit segments match no digit
}

struct PanelDisplay {
    lines: Vec<u8>,
    cells: Vec<Cell>,
    glitches: Vec<Glitch>,
}

/// Multiplexed displays sharing one segment bus, as a driver would see them
pub struct SimulatedPanel {
    table: SegmentTable,
    wiring: Wiring,
    displays: Vec<PanelDisplay>,
    select_mask: u32,
    bank: u32,
    tick: u32,
    strobe_micros: u32, // Time between bus/select changes
    sample_micros: u32, // Timestamp granularity
}

impl SimulatedPanel {
    pub fn new(table: SegmentTable, wiring: Wiring) -> Self {
        let mut panel = SimulatedPanel {
            table,
            wiring,
            displays: Vec::new(),
            select_mask: 0,
            bank: 0,
            tick: 0,
            strobe_micros: 20,
            sample_micros: 5,
        };
        panel.drive_bus(0);
        panel
    }

    pub fn with_timing(mut self, strobe_micros: u32, sample_micros: u32) -> Self {
        self.strobe_micros = strobe_micros.max(1);
        self.sample_micros = sample_micros.max(1);
        self
    }

    /// Adds a dark display strobed through `lines`, most significant first
    pub fn add_display(&mut self, lines: &[u8]) -> usize {
        for &line in lines {
            self.select_mask |= line_bit(line);
            self.release(line);
        }
        self.displays.push(PanelDisplay {
            lines: lines.to_vec(),
            cells: vec![Cell::BLANK; lines.len()],
            glitches: Vec::new(),
        });
        self.displays.len() - 1
    }

    pub fn show(&mut self, display: usize, text: &str) -> Result<(), &'static str> {
        let target = self.displays.get_mut(display).ok_or("No such display")?;
        target.cells = layout(text, target.lines.len())?;
        Ok(())
    }

    /// Arms a fault for the next scan of `display`
    pub fn inject(&mut self, display: usize, glitch: Glitch) {
        if let Some(target) = self.displays.get_mut(display) {
            target.glitches.push(glitch);
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// One full multiplexing pass over every display, as captured edges
    pub fn scan(&mut self) -> Vec<Capture> {
        let mut captures = Vec::new();
        self.run(|edge, bank| {
            captures.push(Capture {
                edge: *edge,
                snapshot: bank.read_bank(),
            })
        });
        captures
    }

    /// One full pass delivered live to `handler`, which reads the bank itself
    pub fn scan_into(&mut self, handler: &mut EdgeHandler) -> Vec<(usize, Reading)> {
        let mut readings = Vec::new();
        self.run(|edge, bank| {
            if let Some(reading) = handler.on_edge(edge, bank) {
                readings.push(reading);
            }
        });
        readings
    }

    fn run<F: FnMut(&EdgeEvent, &dyn LineSource)>(&mut self, mut deliver: F) {
        for d in 0..self.displays.len() {
            let glitches = std::mem::take(&mut self.displays[d].glitches);
            let count = self.displays[d].lines.len();

            for p in 0..count {
                let line = self.displays[d].lines[p];
                let mut segments = self.encode(self.displays[d].cells[p]);
                if glitches.contains(&Glitch::Ghost(p)) {
                    segments = (segments & self.table.dp_mask()) | self.ghost_pattern();
                }
                let overlap = if glitches.contains(&Glitch::Overlap(p)) && count > 1 {
                    Some(self.displays[d].lines[(p + 1) % count])
                } else {
                    None
                };

                // Bus settles first, then the position is selected
                self.advance();
                self.drive_bus(segments);
                self.advance();
                self.assert(line);
                if let Some(other) = overlap {
                    self.assert(other);
                }
                trace!("strobe line {} bank 0x{:08x}", line, self.bank);
                let edge = EdgeEvent::new(line, self.asserting_level(), self.stamp());
                deliver(&edge, &*self);

                self.advance();
                self.release(line);
                if let Some(other) = overlap {
                    self.release(other);
                }
                let edge = EdgeEvent::new(line, self.releasing_level(), self.stamp());
                deliver(&edge, &*self);
            }
        }
    }

    // Active-high segment bits for a cell
    fn encode(&self, cell: Cell) -> u32 {
        let digit = cell.digit.and_then(|d| self.table.pattern(d)).unwrap_or(0);
        if cell.dp {
            digit | self.table.dp_mask()
        } else {
            digit
        }
    }

    // Segments a and d together match no digit
    fn ghost_pattern(&self) -> u32 {
        let mapping = self.table.mapping();
        line_bit(mapping.line(ROLE_A)) | line_bit(mapping.line(ROLE_D))
    }

    fn drive_bus(&mut self, segments: u32) {
        let bus = self.table.bus_mask();
        let levels = match self.wiring.segments {
            Polarity::ActiveHigh => segments & bus,
            Polarity::ActiveLow => !segments & bus,
        };
        self.bank = (self.bank & !bus) | levels;
    }

    fn assert(&mut self, line: u8) {
        match self.wiring.select {
            Polarity::ActiveLow => self.bank &= !line_bit(line),
            Polarity::ActiveHigh => self.bank |= line_bit(line),
        }
    }

    fn release(&mut self, line: u8) {
        match self.wiring.select {
            Polarity::ActiveLow => self.bank |= line_bit(line),
            Polarity::ActiveHigh => self.bank &= !line_bit(line),
        }
    }

    fn asserting_level(&self) -> Level {
        match self.wiring.select {
            Polarity::ActiveLow => Level::Low,
            Polarity::ActiveHigh => Level::High,
        }
    }

    fn releasing_level(&self) -> Level {
        match self.asserting_level() {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    fn advance(&mut self) {
        self.tick = self.tick.wrapping_add(self.strobe_micros);
    }

    // Timestamp as the driver would report it
    fn stamp(&self) -> u32 {
        self.tick - self.tick % self.sample_micros
    }
}

impl LineSource for SimulatedPanel {
    fn read_bank(&self) -> u32 {
        self.bank
    }
}
