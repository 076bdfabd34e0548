//! Rectangular "scale panel" layout: a boustrophedon (zig-zag) wiring of
//! main LED columns interleaved with interstitial columns.
//!
//! Physical order within one panel, per spec: for each main column
//! `x` in `[0, x_count)`, traverse rows `y` in `[0, y_count)` bottom-to-top;
//! then, if `x != x_count - 1`, traverse the interstitial column between
//! `x` and `x + 1` top-to-bottom. Panels are concatenated end to end.

use super::{Layout, LayoutDescriptor, LayoutKind};
use serde::{Deserialize, Serialize};

/// Which kind of column a within-panel slot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// A real LED column at integer x.
    Main(u32),
    /// The wiring run between column `x` and `x + 1`, drawn at x + 0.5.
    Interstitial(u32),
}

/// The exact (non-floating-point) logical position of one LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleCoord {
    pub panel: u32,
    pub column: ColumnKind,
    pub row: u32,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ScaleConfig {
    pub x_count: u32,
    pub y_count: u32,
    pub panel_count: u32,
    pub spacing: f64,
    pub scale_length: f64,
    pub scale_width: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            x_count: 3,
            y_count: 3,
            panel_count: 1,
            spacing: 1.0,
            scale_length: 1.0,
            scale_width: 1.0,
        }
    }
}

pub struct ScaleLayout {
    config: ScaleConfig,
    /// Number of column-slots per panel: `2 * x_count - 1` (main +
    /// interstitial), each holding exactly `y_count` LEDs.
    slots_per_panel: u32,
    per_panel: usize,
    pixel_count: usize,
}

impl ScaleLayout {
    pub fn new(config: ScaleConfig) -> Self {
        let x_count = config.x_count.max(1);
        let y_count = config.y_count.max(1);
        let panel_count = config.panel_count.max(1);
        let slots_per_panel = 2 * x_count - 1;
        let per_panel = (slots_per_panel as usize) * (y_count as usize);
        let pixel_count = per_panel * panel_count as usize;
        Self {
            config: ScaleConfig {
                x_count,
                y_count,
                panel_count,
                ..config
            },
            slots_per_panel,
            per_panel,
            pixel_count,
        }
    }

    fn y_count(&self) -> u32 {
        self.config.y_count
    }

    /// Exact logical coordinate of global strand index `index`.
    pub fn logical_of(&self, index: usize) -> Option<ScaleCoord> {
        if index >= self.pixel_count {
            return None;
        }
        let panel = (index / self.per_panel) as u32;
        let within = index % self.per_panel;
        let y_count = self.y_count() as usize;
        let slot = (within / y_count) as u32;
        let row_in_column = (within % y_count) as u32;

        let column = if slot % 2 == 0 {
            ColumnKind::Main(slot / 2)
        } else {
            ColumnKind::Interstitial(slot / 2)
        };
        let row = match column {
            ColumnKind::Main(_) => row_in_column,
            ColumnKind::Interstitial(_) => self.y_count() - 1 - row_in_column,
        };
        Some(ScaleCoord { panel, column, row })
    }

    /// Inverse of [`Self::logical_of`]: the global strand index for a given
    /// logical coordinate, or `None` if it is out of range.
    pub fn index_of(&self, coord: ScaleCoord) -> Option<usize> {
        if coord.panel >= self.config.panel_count || coord.row >= self.y_count() {
            return None;
        }
        let (slot, row_in_column) = match coord.column {
            ColumnKind::Main(x) => {
                if x >= self.config.x_count {
                    return None;
                }
                (2 * x, coord.row)
            }
            ColumnKind::Interstitial(x) => {
                if x + 1 >= self.config.x_count {
                    return None;
                }
                (2 * x + 1, self.y_count() - 1 - coord.row)
            }
        };
        if slot >= self.slots_per_panel {
            return None;
        }
        let within = (slot as usize) * (self.y_count() as usize) + row_in_column as usize;
        Some(coord.panel as usize * self.per_panel + within)
    }

    fn panel_x_offset(&self, panel: u32) -> f64 {
        panel as f64 * (self.config.x_count as f64 - 1.0 + self.config.spacing)
    }
}

impl Layout for ScaleLayout {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn kind(&self) -> LayoutKind {
        LayoutKind::Scale
    }

    fn coord_of(&self, index: usize) -> Option<(f64, f64)> {
        let coord = self.logical_of(index)?;
        let x = match coord.column {
            ColumnKind::Main(x) => x as f64,
            ColumnKind::Interstitial(x) => x as f64 + 0.5,
        } + self.panel_x_offset(coord.panel);
        Some((x, coord.row as f64))
    }

    fn center(&self) -> (f64, f64) {
        let width =
            self.panel_x_offset(self.config.panel_count.saturating_sub(1)) + self.config.x_count as f64;
        (width / 2.0, self.y_count() as f64 / 2.0)
    }

    fn descriptor(&self) -> LayoutDescriptor {
        LayoutDescriptor::Scale {
            x_count: self.config.x_count,
            y_count: self.config.y_count,
            panel_count: self.config.panel_count,
            spacing: self.config.spacing,
            scale_length: self.config.scale_length,
            scale_width: self.config.scale_width,
        }
    }
}
