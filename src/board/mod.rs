//! In-memory board model the rules file is reconciled against.
//!
//! # Submodules
//! - `layer` - layer name/index lookup
//! - `transform` - file-unit to board-unit conversion
//! - `rules` - trace widths, clearance matrix, vias, net classes
//! - `library` - padstack library and the via-padstack set
//! - `settings` - autoroute settings

mod layer;
mod library;
mod rules;
mod settings;
mod transform;

pub use layer::LayerStructure;
pub use library::{BoardLibrary, PadShape, Padstack};
pub use rules::{
    AngleRestriction, BoardRules, ClearanceEntry, ClearanceMatrix, NetClass, ViaInfo, ViaInfos,
    ViaRule, DEFAULT_CLEARANCE_CLASS,
};
pub use settings::{AutorouteLayerSettings, RouterSettings};
pub use transform::CoordinateTransform;

use serde::Serialize;

/// Owning handle for everything the rules reader mutates and the writer
/// serializes: the rule model proper, the padstack library and the active
/// autoroute settings, together with the read-only layer structure and
/// coordinate transform they are resolved against.
///
/// The reader assumes exclusive access for the duration of a call; the host
/// must serialize rule-file loads and saves against any other mutation of
/// the same board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardModel {
    pub layers: LayerStructure,
    pub transform: CoordinateTransform,
    pub rules: BoardRules,
    pub library: BoardLibrary,
    pub router_settings: RouterSettings,
    /// Quote character used when the writer has to quote an identifier.
    pub string_quote: char,
}

impl BoardModel {
    pub fn new(layers: LayerStructure, transform: CoordinateTransform) -> Self {
        let layer_count = layers.len();
        Self {
            layers,
            transform,
            rules: BoardRules::new(layer_count),
            library: BoardLibrary::default(),
            router_settings: RouterSettings::new(layer_count),
            string_quote: '"',
        }
    }
}
