//! `class` scope: net classes with their own rules and via selection.
//!
//! The parse result is a transient scope value holding symbolic references;
//! inserting it into the board resolves layer names against the layer
//! structure and width values through the coordinate transform.

use anyhow::{bail, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use super::indent::{fmt_number, quote_identifier, IndentWriter};
use super::rule::{self, RuleDecl};
use super::scanner::{skip_open_scopes, Scanner, Token};
use crate::board::{BoardModel, BoardRules, CoordinateTransform, LayerStructure, NetClass};

/// A parsed `class` scope before resolution against the board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetClassScope {
    pub name: String,
    pub nets: Vec<String>,
    pub via_rule: Option<String>,
    pub clearance_class: Option<String>,
    pub rules: Vec<RuleDecl>,
    pub layer_rules: Vec<(Vec<String>, Vec<RuleDecl>)>,
}

/// Read one `class` scope:
/// `(class <name> <net>* (rule ...)* (layer_rule <layer>+ (rule ...))*
/// (via_rule <name>) (clearance_class <name>) ...)`.
pub fn read_scope<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<NetClassScope>> {
    let mut scope = NetClassScope::default();
    let mut name: Option<String> = None;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => break,
            Token::Open => {
                let inner = scanner.expect_token()?;
                match inner.as_name() {
                    Some("rule") => {
                        scope.rules.extend(rule::read_scope(scanner)?);
                    }
                    Some("layer_rule") => {
                        if let Some(layer_rule) = read_layer_rule(scanner)? {
                            scope.layer_rules.push(layer_rule);
                        }
                    }
                    Some("via_rule") => scope.via_rule = read_name_scope(scanner)?,
                    Some("clearance_class") => scope.clearance_class = read_name_scope(scanner)?,
                    _ => {
                        let open_count = if inner == Token::Open { 2 } else { 1 };
                        if !skip_open_scopes(scanner, open_count)? {
                            bail!("unexpected end of file at {}", scanner.context());
                        }
                    }
                }
            }
            _ => {
                if let Some(word) = token.as_name() {
                    if name.is_none() {
                        name = Some(word.to_string());
                    } else {
                        scope.nets.push(word.to_string());
                    }
                }
            }
        }
    }
    let Some(name) = name else {
        warn!(
            "rules read: net class name expected at {}",
            scanner.context()
        );
        return Ok(None);
    };
    scope.name = name;
    Ok(Some(scope))
}

/// Read `(layer_rule <layer>+ (rule ...)*)` - already inside the scope.
fn read_layer_rule<R: Read>(
    scanner: &mut Scanner<R>,
) -> Result<Option<(Vec<String>, Vec<RuleDecl>)>> {
    let mut layer_names = Vec::new();
    let mut decls = Vec::new();
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => break,
            Token::Open => {
                let inner = scanner.expect_token()?;
                if inner.as_name() == Some("rule") {
                    decls.extend(rule::read_scope(scanner)?);
                } else {
                    let open_count = if inner == Token::Open { 2 } else { 1 };
                    if !skip_open_scopes(scanner, open_count)? {
                        bail!("unexpected end of file at {}", scanner.context());
                    }
                }
            }
            _ => {
                if let Some(word) = token.as_name() {
                    layer_names.push(word.to_string());
                }
            }
        }
    }
    if layer_names.is_empty() {
        warn!(
            "rules read: layer name expected in layer_rule at {}",
            scanner.context()
        );
        return Ok(None);
    }
    Ok(Some((layer_names, decls)))
}

/// Read a scope whose payload is a single identifier, e.g. `(via_rule x)`.
fn read_name_scope<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<String>> {
    let mut name = None;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(name),
            Token::Open => {
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
            }
            _ => {
                if name.is_none() {
                    name = token.as_name().map(str::to_string);
                }
            }
        }
    }
}

/// Resolve a parsed class scope against the board and insert it. A class
/// re-declaring an existing name replaces it in full.
pub(crate) fn insert_net_class(
    scope: NetClassScope,
    layers: &LayerStructure,
    transform: &CoordinateTransform,
    rules: &mut BoardRules,
) {
    let mut class = NetClass {
        name: scope.name,
        nets: scope.nets,
        via_rule: scope.via_rule,
        clearance_class: scope.clearance_class,
        trace_half_width: None,
        layer_half_widths: BTreeMap::new(),
    };
    for decl in &scope.rules {
        match decl {
            RuleDecl::Width(width) => {
                class.trace_half_width = Some(transform.half_width_to_board(*width));
            }
            RuleDecl::Clearance { .. } => {
                debug!(
                    "rules read: clearance in class {} handled via its clearance class",
                    class.name
                );
            }
        }
    }
    for (layer_names, decls) in &scope.layer_rules {
        for layer_name in layer_names {
            let Some(layer_no) = layers.index_of(layer_name) else {
                warn!(
                    "rules read: unknown layer {} in class {}",
                    layer_name, class.name
                );
                continue;
            };
            for decl in decls {
                if let RuleDecl::Width(width) = decl {
                    class
                        .layer_half_widths
                        .insert(layer_no, transform.half_width_to_board(*width));
                }
            }
        }
    }
    if let Some(clearance_class) = &class.clearance_class {
        if rules.clearance_matrix.class_no(clearance_class).is_none() {
            warn!(
                "rules read: unknown clearance class {} in class {}",
                clearance_class, class.name
            );
            rules.clearance_matrix.ensure_class(clearance_class);
        }
    }
    rules.net_classes.insert(class.name.clone(), class);
}

pub(crate) fn write_net_classes<W: Write>(
    file: &mut IndentWriter<W>,
    model: &BoardModel,
) -> io::Result<()> {
    let quote = model.string_quote;
    for class in model.rules.net_classes.values() {
        file.scope(|file| {
            file.write("class ")?;
            file.write(&quote_identifier(&class.name, quote))?;
            for net in &class.nets {
                file.write(" ")?;
                file.write(&quote_identifier(net, quote))?;
            }
            if let Some(half_width) = class.trace_half_width {
                let width = model.transform.to_file_units(2.0 * half_width as f64);
                file.scope(|file| {
                    file.write("rule")?;
                    file.line_scope(&format!("width {}", fmt_number(width)))
                })?;
            }
            for (layer_no, half_width) in &class.layer_half_widths {
                let Some(layer) = model.layers.name(*layer_no) else {
                    continue;
                };
                let width = model.transform.to_file_units(2.0 * *half_width as f64);
                file.scope(|file| {
                    file.write("layer_rule ")?;
                    file.write(&quote_identifier(layer, quote))?;
                    file.scope(|file| {
                        file.write("rule")?;
                        file.line_scope(&format!("width {}", fmt_number(width)))
                    })
                })?;
            }
            if let Some(via_rule) = &class.via_rule {
                file.line_scope(&format!("via_rule {}", quote_identifier(via_rule, quote)))?;
            }
            if let Some(clearance_class) = &class.clearance_class {
                file.line_scope(&format!(
                    "clearance_class {}",
                    quote_identifier(clearance_class, quote)
                ))?;
            }
            Ok(())
        })?;
    }
    Ok(())
}
