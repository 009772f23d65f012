//! Conversion between rules-file length units and internal board units.

use serde::Serialize;

/// Stateless conversion between file-native length units and the board's
/// integer coordinate units.
///
/// Converting a value to board units and back reproduces it up to the
/// rounding applied when a length is stored on the board; trace half-widths
/// are rounded to the nearest integer board unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoordinateTransform {
    board_units_per_unit: f64,
}

impl CoordinateTransform {
    /// `board_units_per_unit` is the number of internal board units that
    /// make up one length unit of the rules file.
    pub fn new(board_units_per_unit: f64) -> Self {
        Self {
            board_units_per_unit,
        }
    }

    pub fn to_board_units(&self, value: f64) -> f64 {
        value * self.board_units_per_unit
    }

    pub fn to_file_units(&self, value: f64) -> f64 {
        value / self.board_units_per_unit
    }

    /// Half of `value`, converted to board units and rounded to the nearest
    /// integer. This is how trace widths from the file are stored.
    pub fn half_width_to_board(&self, value: f64) -> i32 {
        (self.to_board_units(value) / 2.0).round() as i32
    }
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::new(1.0)
    }
}
