//! Textual rules format: scanner, keyword table and scope readers/writers.
//!
//! The format is nested-bracket text: `(rules PCB <design_name> ...)` with
//! one child scope per rule kind. Scopes with unrecognized keywords are
//! skipped as balanced units, so files written by newer tools stay
//! readable.
//!
//! # Submodules
//! - `scanner` - token scanner and the balanced scope skipper
//! - `keywords` - closed keyword table driving the dispatch
//! - `indent` - indenting output writer with scoped nesting
//! - `rule` - width/clearance declarations
//! - `via` - via definitions and via sequencing rules
//! - `padstack` - pad shape stacks
//! - `net_class` - net classes
//! - `autoroute` - autoroute settings
//! - `rules_file` - the top-level read/write entry points

pub mod autoroute;
pub mod indent;
pub mod keywords;
pub mod net_class;
pub mod padstack;
pub mod rule;
pub mod rules_file;
pub mod scanner;
pub mod via;

pub use keywords::Keyword;
pub use rule::RuleDecl;
pub use scanner::{skip_scope, Scanner, Token};
