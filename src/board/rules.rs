//! Board-owned design rule model.
//!
//! This is the mutable rule state the rules-file reader merges into and the
//! writer serializes from: trace widths, the clearance class matrix, the
//! trace angle restriction, via definitions, via sequencing rules and net
//! classes. The model lives as long as the board; the reader mutates it in
//! place, fragment by fragment.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Restriction of trace segment angles on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AngleRestriction {
    #[default]
    None,
    FortyfiveDegree,
    NinetyDegree,
}

impl AngleRestriction {
    /// Parse the rules-file keyword for a snap angle.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "fortyfive_degree" => Some(Self::FortyfiveDegree),
            "ninety_degree" => Some(Self::NinetyDegree),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FortyfiveDegree => "fortyfive_degree",
            Self::NinetyDegree => "ninety_degree",
        }
    }
}

/// One clearance value set: a global value acting as the fallback for all
/// layers, plus per-layer overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClearanceEntry {
    pub global: Option<i32>,
    pub layers: BTreeMap<usize, i32>,
}

/// Symmetric clearance matrix between named clearance classes.
///
/// Classes are registered on first use; `default` is always present. Pair
/// entries are keyed by a canonical `a_b` key with the two class names
/// ordered by registration index, so `(smd, wire)` and `(wire, smd)` address
/// the same entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearanceMatrix {
    class_names: Vec<String>,
    entries: IndexMap<String, ClearanceEntry>,
}

/// Name of the pre-registered default clearance class.
pub const DEFAULT_CLEARANCE_CLASS: &str = "default";

impl ClearanceMatrix {
    pub fn new() -> Self {
        Self {
            class_names: vec![DEFAULT_CLEARANCE_CLASS.to_string()],
            entries: IndexMap::new(),
        }
    }

    /// Registration index of a class name, if registered.
    pub fn class_no(&self, name: &str) -> Option<usize> {
        self.class_names.iter().position(|n| n == name)
    }

    /// Register a class name if it is new; returns its index either way.
    pub fn ensure_class(&mut self, name: &str) -> usize {
        match self.class_no(name) {
            Some(no) => no,
            None => {
                self.class_names.push(name.to_string());
                self.class_names.len() - 1
            }
        }
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.class_names.iter().map(String::as_str)
    }

    fn pair_key(&mut self, class_a: &str, class_b: &str) -> String {
        let a = self.ensure_class(class_a);
        let b = self.ensure_class(class_b);
        if a <= b {
            format!("{}_{}", self.class_names[a], self.class_names[b])
        } else {
            format!("{}_{}", self.class_names[b], self.class_names[a])
        }
    }

    /// Set the clearance between two classes. A negative `layer_no` sets the
    /// global fallback value; otherwise the value applies to that layer only.
    pub fn set_value(&mut self, class_a: &str, class_b: &str, layer_no: i32, value: i32) {
        let key = self.pair_key(class_a, class_b);
        let entry = self.entries.entry(key).or_default();
        if layer_no < 0 {
            entry.global = Some(value);
        } else {
            entry.layers.insert(layer_no as usize, value);
        }
    }

    /// Effective clearance between two classes on a layer: the per-layer
    /// value if present, else the global fallback.
    pub fn value(&self, class_a: &str, class_b: &str, layer_no: usize) -> Option<i32> {
        let a = self.class_no(class_a)?;
        let b = self.class_no(class_b)?;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let key = format!("{}_{}", self.class_names[lo], self.class_names[hi]);
        let entry = self.entries.get(&key)?;
        entry.layers.get(&layer_no).copied().or(entry.global)
    }

    /// Pair entries in insertion order, keyed by the canonical `a_b` key.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ClearanceEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }
}

impl Default for ClearanceMatrix {
    fn default() -> Self {
        Self::new()
    }
}

/// A named via definition: which padstack it uses and which clearance class
/// applies to it. `spare` marks vias kept available for manual rip-up repair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViaInfo {
    pub name: String,
    pub padstack: String,
    pub clearance_class: String,
    pub spare: bool,
}

/// The board's via definitions, unique by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViaInfos {
    infos: IndexMap<String, ViaInfo>,
}

impl ViaInfos {
    pub fn get(&self, name: &str) -> Option<&ViaInfo> {
        self.infos.get(name)
    }

    /// Insert a via info, replacing any existing one with the same name.
    /// Replacement is remove-then-insert: the newest declaration wins in
    /// full and moves to the end of the iteration order.
    pub fn replace(&mut self, via: ViaInfo) {
        self.infos.shift_remove(&via.name);
        self.infos.insert(via.name.clone(), via);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViaInfo> {
        self.infos.values()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// An ordered list of via names tried in sequence by the router. Rules
/// accumulate in declaration order and are never de-duplicated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViaRule {
    pub name: Option<String>,
    pub vias: Vec<String>,
}

/// A named net class stored on the board, with its symbolic references
/// already resolved against the layer structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetClass {
    pub name: String,
    pub nets: Vec<String>,
    pub via_rule: Option<String>,
    pub clearance_class: Option<String>,
    pub trace_half_width: Option<i32>,
    pub layer_half_widths: BTreeMap<usize, i32>,
}

/// The complete rule model of one board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRules {
    default_trace_half_width: i32,
    layer_trace_half_widths: Vec<Option<i32>>,
    pub clearance_matrix: ClearanceMatrix,
    pub trace_angle_restriction: AngleRestriction,
    pub via_infos: ViaInfos,
    pub via_rules: Vec<ViaRule>,
    pub net_classes: IndexMap<String, NetClass>,
}

impl BoardRules {
    pub fn new(layer_count: usize) -> Self {
        Self {
            default_trace_half_width: 0,
            layer_trace_half_widths: vec![None; layer_count],
            clearance_matrix: ClearanceMatrix::new(),
            trace_angle_restriction: AngleRestriction::None,
            via_infos: ViaInfos::default(),
            via_rules: Vec::new(),
            net_classes: IndexMap::new(),
        }
    }

    /// Set the board-wide default trace half-width. Per-layer overrides are
    /// left untouched.
    pub fn set_default_trace_half_width(&mut self, half_width: i32) {
        self.default_trace_half_width = half_width;
    }

    /// Set the trace half-width override for one layer. The board-wide
    /// default is left untouched.
    pub fn set_layer_trace_half_width(&mut self, layer_no: usize, half_width: i32) {
        if let Some(slot) = self.layer_trace_half_widths.get_mut(layer_no) {
            *slot = Some(half_width);
        }
    }

    pub fn default_trace_half_width(&self) -> i32 {
        self.default_trace_half_width
    }

    /// Effective trace half-width on a layer: the layer override if present,
    /// else the board-wide default.
    pub fn trace_half_width(&self, layer_no: usize) -> i32 {
        self.layer_trace_half_widths
            .get(layer_no)
            .copied()
            .flatten()
            .unwrap_or(self.default_trace_half_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearance_pair_key_is_symmetric() {
        let mut matrix = ClearanceMatrix::new();
        matrix.set_value("smd", "wire", -1, 20);
        assert_eq!(matrix.value("wire", "smd", 0), Some(20));
        assert_eq!(matrix.value("smd", "wire", 3), Some(20));
    }

    #[test]
    fn layer_clearance_overrides_global_fallback() {
        let mut matrix = ClearanceMatrix::new();
        matrix.set_value("default", "default", -1, 10);
        matrix.set_value("default", "default", 2, 25);
        assert_eq!(matrix.value("default", "default", 0), Some(10));
        assert_eq!(matrix.value("default", "default", 2), Some(25));
    }

    #[test]
    fn unknown_class_registers_symbolically() {
        let mut matrix = ClearanceMatrix::new();
        assert!(matrix.class_no("power").is_none());
        matrix.set_value("power", "power", -1, 40);
        assert!(matrix.class_no("power").is_some());
        assert_eq!(matrix.value("power", "power", 1), Some(40));
    }

    #[test]
    fn via_replace_keeps_one_entry_with_newest_fields() {
        let mut vias = ViaInfos::default();
        vias.replace(ViaInfo {
            name: "v1".into(),
            padstack: "ps_a".into(),
            clearance_class: "default".into(),
            spare: false,
        });
        vias.replace(ViaInfo {
            name: "v1".into(),
            padstack: "ps_b".into(),
            clearance_class: "default".into(),
            spare: true,
        });
        assert_eq!(vias.len(), 1);
        let via = vias.get("v1").unwrap();
        assert_eq!(via.padstack, "ps_b");
        assert!(via.spare);
    }

    #[test]
    fn layer_width_override_leaves_default_alone() {
        let mut rules = BoardRules::new(2);
        rules.set_default_trace_half_width(50);
        rules.set_layer_trace_half_width(1, 30);
        assert_eq!(rules.trace_half_width(0), 50);
        assert_eq!(rules.trace_half_width(1), 30);
        assert_eq!(rules.default_trace_half_width(), 50);
    }
}
