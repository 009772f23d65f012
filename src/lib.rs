//! Reader and writer for Specctra DSN rules scopes.
//!
//! A rules file stores a board's design rules - trace widths, clearances,
//! via definitions, via sequencing rules, net classes and autoroute
//! configuration - as nested-bracket text, so they can be restored after
//! the board is recreated from the host system. This crate parses such a
//! file into a live [`board::BoardModel`] and serializes the model back
//! into a re-readable canonical form.
//!
//! ```ignore
//! let mut model = BoardModel::new(layers, transform);
//! if dsn_rules::read_rules_file("my_board.rules", "my_board", &mut model) {
//!     // model now reflects the file
//! }
//! ```

pub mod board;
pub mod dsn;

pub use board::{
    AngleRestriction, BoardLibrary, BoardModel, BoardRules, ClearanceMatrix, CoordinateTransform,
    LayerStructure, NetClass, PadShape, Padstack, RouterSettings, ViaInfo, ViaRule,
};
pub use dsn::rules_file;

use std::fs::File;
use std::path::Path;

/// Read a rules file from disk into `model`. Returns `true` iff the file
/// was opened and fully consumed without a fatal error; failures are
/// logged, never thrown.
pub fn read_rules_file<P: AsRef<Path>>(path: P, design_name: &str, model: &mut BoardModel) -> bool {
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            log::error!(
                "unable to open rules file {}: {e}",
                path.as_ref().display()
            );
            return false;
        }
    };
    rules_file::read(file, design_name, model)
}

/// Write `model` as a rules file on disk. Best effort: failures are logged
/// and the output is flushed and closed on every exit path.
pub fn write_rules_file<P: AsRef<Path>>(model: &BoardModel, path: P, design_name: &str) {
    let file = match File::create(&path) {
        Ok(file) => file,
        Err(e) => {
            log::error!(
                "unable to create rules file {}: {e}",
                path.as_ref().display()
            );
            return;
        }
    };
    rules_file::write(model, file, design_name);
}
