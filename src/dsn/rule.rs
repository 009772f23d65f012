//! `rule` scope: trace width and clearance declarations.
//!
//! A rule scope carries a list of width and clearance declarations. Whether
//! they apply board-wide or to a single layer is decided by the scope that
//! contains them, so the parse result here is a transient declaration list
//! that the engine folds into the model with the proper layer context.

use anyhow::{bail, Result};
use log::warn;
use std::io::{self, Read, Write};

use super::indent::{fmt_number, IndentWriter};
use super::scanner::{skip_open_scopes, skip_scope, Scanner, Token};
use crate::board::{BoardModel, DEFAULT_CLEARANCE_CLASS};

/// One parsed rule declaration, in file units.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDecl {
    /// Trace width.
    Width(f64),
    /// Clearance value with the class pairs it applies to; an empty pair
    /// list addresses the default class pair.
    Clearance { value: f64, class_pairs: Vec<String> },
}

/// Read the body of a `rule` scope (the keyword is already consumed).
/// Unknown child scopes are skipped; malformed declarations are dropped
/// with a warning while the rest of the scope is still collected.
pub fn read_scope<R: Read>(scanner: &mut Scanner<R>) -> Result<Vec<RuleDecl>> {
    let mut decls = Vec::new();
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(decls),
            Token::Open => {
                let inner = scanner.expect_token()?;
                match inner.as_name() {
                    Some("width") => {
                        if let Some(decl) = read_width(scanner)? {
                            decls.push(decl);
                        }
                    }
                    Some("clearance") => {
                        if let Some(decl) = read_clearance(scanner)? {
                            decls.push(decl);
                        }
                    }
                    _ => {
                        let open_count = if inner == Token::Open { 2 } else { 1 };
                        if !skip_open_scopes(scanner, open_count)? {
                            bail!("unexpected end of file at {}", scanner.context());
                        }
                    }
                }
            }
            // Stray atoms between declarations carry no meaning.
            _ => {}
        }
    }
}

fn read_width<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<RuleDecl>> {
    match scanner.expect_token()? {
        Token::Number(value) => {
            if !skip_scope(scanner)? {
                bail!("unexpected end of file at {}", scanner.context());
            }
            Ok(Some(RuleDecl::Width(value)))
        }
        Token::Close => {
            warn!(
                "rules read: number expected in width rule at {}",
                scanner.context()
            );
            Ok(None)
        }
        other => {
            warn!(
                "rules read: number expected in width rule at {}",
                scanner.context()
            );
            let open_count = if other == Token::Open { 2 } else { 1 };
            if !skip_open_scopes(scanner, open_count)? {
                bail!("unexpected end of file at {}", scanner.context());
            }
            Ok(None)
        }
    }
}

fn read_clearance<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<RuleDecl>> {
    let value = match scanner.expect_token()? {
        Token::Number(value) => value,
        Token::Close => {
            warn!(
                "rules read: number expected in clearance rule at {}",
                scanner.context()
            );
            return Ok(None);
        }
        other => {
            warn!(
                "rules read: number expected in clearance rule at {}",
                scanner.context()
            );
            let open_count = if other == Token::Open { 2 } else { 1 };
            if !skip_open_scopes(scanner, open_count)? {
                bail!("unexpected end of file at {}", scanner.context());
            }
            return Ok(None);
        }
    };
    let mut class_pairs = Vec::new();
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => break,
            Token::Open => {
                let inner = scanner.expect_token()?;
                if inner.as_name() == Some("type") {
                    loop {
                        let token = scanner.expect_token()?;
                        match token {
                            Token::Close => break,
                            Token::Open => {
                                if !skip_open_scopes(scanner, 1)? {
                                    bail!("unexpected end of file at {}", scanner.context());
                                }
                            }
                            _ => {
                                if let Some(name) = token.as_name() {
                                    class_pairs.push(name.to_string());
                                }
                            }
                        }
                    }
                } else {
                    let open_count = if inner == Token::Open { 2 } else { 1 };
                    if !skip_open_scopes(scanner, open_count)? {
                        bail!("unexpected end of file at {}", scanner.context());
                    }
                }
            }
            _ => {}
        }
    }
    Ok(Some(RuleDecl::Clearance { value, class_pairs }))
}

/// Write the default rule scope. Board-wide defaults are emitted as the
/// effective values of `sentinel_layer` - the on-disk format has no notion
/// of a layerless default, so layer 0 conventionally stands in for it.
pub(crate) fn write_default_rule<W: Write>(
    file: &mut IndentWriter<W>,
    model: &BoardModel,
    sentinel_layer: usize,
) -> io::Result<()> {
    file.scope(|file| {
        file.write("rule")?;
        let half_width = model.rules.trace_half_width(sentinel_layer);
        let width = model.transform.to_file_units(2.0 * half_width as f64);
        file.line_scope(&format!("width {}", fmt_number(width)))?;
        let default_pair = format!("{0}_{0}", DEFAULT_CLEARANCE_CLASS);
        for (pair_key, entry) in model.rules.clearance_matrix.entries() {
            let Some(value) = entry.global else { continue };
            let value = model.transform.to_file_units(value as f64);
            if pair_key == default_pair {
                file.line_scope(&format!("clearance {}", fmt_number(value)))?;
            } else {
                file.line_scope(&format!(
                    "clearance {} (type {})",
                    fmt_number(value),
                    pair_key
                ))?;
            }
        }
        Ok(())
    })
}
