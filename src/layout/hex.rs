//! Hexagonal cell layout: a set of hex cells, each owning an ordered ring
//! of LED strand indices, assembled in a spiral at setup time.

use super::{HexDescriptor, Layout, LayoutDescriptor, LayoutKind};
use serde::{Deserialize, Serialize};

/// One hex cell: its axial position (y may be a half-integer for an offset
/// row) and the strand indices that light it, in ring order.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HexCell {
    pub x: f64,
    pub y: f64,
    pub ordered_leds: Vec<usize>,
}

pub struct HexLayout {
    cells: Vec<HexCell>,
    /// Inverse map, built once at construction: strand index -> cell index.
    led_to_cell: Vec<Option<usize>>,
    pixel_count: usize,
    center: (f64, f64),
}

impl HexLayout {
    pub fn new(cells: Vec<HexCell>) -> Self {
        let pixel_count = cells
            .iter()
            .flat_map(|c| c.ordered_leds.iter())
            .copied()
            .map(|i| i + 1)
            .max()
            .unwrap_or(0);

        let mut led_to_cell = vec![None; pixel_count];
        for (cell_idx, cell) in cells.iter().enumerate() {
            for &led in &cell.ordered_leds {
                if led < pixel_count {
                    led_to_cell[led] = Some(cell_idx);
                }
            }
        }

        let center = if cells.is_empty() {
            (0.0, 0.0)
        } else {
            let (sx, sy) = cells.iter().fold((0.0, 0.0), |(sx, sy), c| (sx + c.x, sy + c.y));
            (sx / cells.len() as f64, sy / cells.len() as f64)
        };

        Self {
            cells,
            led_to_cell,
            pixel_count,
            center,
        }
    }

    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl Layout for HexLayout {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn kind(&self) -> LayoutKind {
        LayoutKind::Hex
    }

    fn coord_of(&self, index: usize) -> Option<(f64, f64)> {
        let cell_idx = *self.led_to_cell.get(index)?;
        let cell_idx = cell_idx?;
        let cell = &self.cells[cell_idx];
        Some((cell.x, cell.y))
    }

    fn cell_of(&self, index: usize) -> Option<usize> {
        *self.led_to_cell.get(index)?
    }

    fn center(&self) -> (f64, f64) {
        self.center
    }

    fn descriptor(&self) -> LayoutDescriptor {
        LayoutDescriptor::Hex {
            hexagons: self
                .cells
                .iter()
                .map(|c| HexDescriptor {
                    x: c.x,
                    y: c.y,
                    ordered_leds: c.ordered_leds.clone(),
                })
                .collect(),
        }
    }
}

// ── Setup mode ───────────────────────────────────────────────────────────

/// Interactive assignment of LEDs to cells, one at a time, used when wiring
/// a fresh hex array. Not used by the render loop; exposed for the tooling
/// that builds a `HexLayout` from scratch.
pub struct HexSetup {
    led_count: usize,
    current_led: usize,
    /// `cells[i]` accumulates the LEDs assigned to cell `i` so far.
    cells: Vec<Vec<usize>>,
    positions: Vec<(f64, f64)>,
}

impl HexSetup {
    pub fn new(led_count: usize, cell_positions: Vec<(f64, f64)>) -> Self {
        let cell_count = cell_positions.len();
        Self {
            led_count,
            current_led: 0,
            cells: vec![Vec::new(); cell_count],
            positions: cell_positions,
        }
    }

    pub fn current_led(&self) -> usize {
        self.current_led
    }

    pub fn is_complete(&self) -> bool {
        self.current_led >= self.led_count
    }

    /// Assign the cursor's current LED to `cell`, then advance the cursor.
    /// Returns `false` if setup is already complete or `cell` is out of range.
    pub fn assign(&mut self, cell: usize) -> bool {
        if self.is_complete() || cell >= self.cells.len() {
            return false;
        }
        self.cells[cell].push(self.current_led);
        self.current_led += 1;
        true
    }

    /// Advance the cursor without assigning the current LED to any cell
    /// (used to skip a dead/unused LED position).
    pub fn next(&mut self) {
        if !self.is_complete() {
            self.current_led += 1;
        }
    }

    pub fn reset(&mut self) {
        self.current_led = 0;
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Produce the finished cell → LEDs table.
    pub fn export(&self) -> Vec<HexCell> {
        self.positions
            .iter()
            .zip(self.cells.iter())
            .map(|(&(x, y), leds)| HexCell {
                x,
                y,
                ordered_leds: leds.clone(),
            })
            .collect()
    }
}
