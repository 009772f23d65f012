//! Padstack library shared by the board.
//!
//! Padstacks are stored by name in insertion order. A subset of them is
//! usable as vias; only that subset is serialized with the rules, so a
//! rules file never carries component padstacks it cannot use.

use indexmap::IndexMap;
use serde::Serialize;

/// One pad shape of a padstack, on a single layer, in board units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PadShape {
    Circle {
        layer_no: usize,
        diameter: f64,
        cx: f64,
        cy: f64,
    },
    Rect {
        layer_no: usize,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
}

/// A named stack of pad shapes across layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Padstack {
    pub name: String,
    pub shapes: Vec<PadShape>,
    pub attach_allowed: bool,
}

/// The board's padstack library plus the set of padstacks usable as vias.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardLibrary {
    pub padstacks: IndexMap<String, Padstack>,
    via_padstack_names: Vec<String>,
}

impl BoardLibrary {
    /// Insert a padstack definition; the last definition of a name wins.
    pub fn insert_padstack(&mut self, padstack: Padstack) {
        self.padstacks.insert(padstack.name.clone(), padstack);
    }

    /// Mark a padstack name as usable for vias.
    pub fn insert_via_padstack(&mut self, name: &str) {
        if !self.via_padstack_names.iter().any(|n| n == name) {
            self.via_padstack_names.push(name.to_string());
        }
    }

    pub fn is_via_padstack(&self, name: &str) -> bool {
        self.via_padstack_names.iter().any(|n| n == name)
    }

    /// Look up a padstack by name, but only if it is usable as a via.
    pub fn get_via_padstack(&self, name: &str) -> Option<&Padstack> {
        if self.is_via_padstack(name) {
            self.padstacks.get(name)
        } else {
            None
        }
    }
}
