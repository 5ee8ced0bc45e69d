use crate::constants::MAX_DISPLAYS;
use crate::display::{Display, DisplayConfig, Reading};
use crate::lines::{EdgeEvent, LineSource};
use crate::segments::SegmentTable;
use crate::wiring::Wiring;

use log::{debug, info};

/// Routes select-line transitions to the displays that own the lines
pub struct EdgeHandler {
    table: SegmentTable,
    wiring: Wiring,
    displays: heapless::Vec<Display, MAX_DISPLAYS>,
    claimed: u32, // Select lines of every registered display
}

impl EdgeHandler {
    pub fn new(table: SegmentTable, wiring: Wiring) -> Self {
        Self {
            table,
            wiring,
            displays: heapless::Vec::new(),
            claimed: 0,
        }
    }

    /// Registers a display; its select lines must be free and off the segment bus
    pub fn add_display(&mut self, config: &DisplayConfig) -> Result<usize, &'static str> {
        let mask = config.select_mask();
        if mask & self.table.bus_mask() != 0 {
            return Err("Select line overlaps a segment line");
        }
        if mask & self.claimed != 0 {
            return Err("Select line already used by another display");
        }

        self.displays
            .push(Display::new(config))
            .map_err(|_| "Too many displays")?;
        self.claimed |= mask;

        let index = self.displays.len() - 1;
        info!(
            "Display {}: select lines {:?}, mask 0x{:08x}",
            index,
            config.lines(),
            mask
        );
        Ok(index)
    }

    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    /// Select lines of every registered display
    pub fn select_mask(&self) -> u32 {
        self.claimed
    }

    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    pub fn display(&self, index: usize) -> Option<&Display> {
        self.displays.get(index)
    }

    /// Handles one transition with the bank state captured alongside it.
    /// Returns the display index and its reading when a scan cycle completed.
    pub fn on_transition(&mut self, edge: &EdgeEvent, snapshot: u32) -> Option<(usize, Reading)> {
        if !self.wiring.select.is_asserting(edge.level) {
            return None;
        }

        let index = match self
            .displays
            .iter()
            .position(|d| d.position_of(edge.line).is_some())
        {
            Some(i) => i,
            None => {
                debug!("Ignoring edge on unassigned line {}", edge.line);
                return None;
            }
        };

        let table = &self.table;
        let wiring = self.wiring;
        self.displays[index]
            .sample(table, wiring, edge.line, snapshot, edge.tick)
            .map(|reading| (index, reading))
    }

    /// Handles one transition, taking the snapshot from `source`
    pub fn on_edge(&mut self, edge: &EdgeEvent, source: &dyn LineSource) -> Option<(usize, Reading)> {
        if !self.wiring.select.is_asserting(edge.level) {
            return None;
        }
        self.on_transition(edge, source.read_bank())
    }
}
