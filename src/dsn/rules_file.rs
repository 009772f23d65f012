//! Reading and writing the `rules` scope of a board.
//!
//! The rules file stores the board's design rules so they can be restored
//! after the board is created anew from the host system. Reading merges the
//! file into the live rule model scope by scope; mutations applied before a
//! fatal error stay applied, so a failed read leaves a partially updated
//! model rather than rolling back. Writing walks the model and emits the
//! scopes in a fixed order that downstream tools rely on.

use anyhow::{bail, Result};
use log::{error, warn};
use std::io::{self, Read, Write};

use super::autoroute;
use super::indent::{quote_identifier, IndentWriter};
use super::keywords::Keyword;
use super::net_class;
use super::padstack;
use super::rule::{self, RuleDecl};
use super::scanner::{skip_open_scopes, Scanner, Token};
use super::via;
use crate::board::{
    AngleRestriction, BoardModel, BoardRules, CoordinateTransform, LayerStructure,
    DEFAULT_CLEARANCE_CLASS,
};

/// Read a `rules` scope from `input` and merge it into `model`.
///
/// Returns `true` iff the whole scope was consumed without a fatal header
/// or stream error. A mismatched design name, an unresolved layer or
/// clearance class, and a single malformed `padstack`/`via`/`via_rule`/
/// `class` fragment are all non-fatal: they are logged and reading
/// continues. Mutations applied before a fatal error are not rolled back.
pub fn read<R: Read>(input: R, design_name: &str, model: &mut BoardModel) -> bool {
    let mut scanner = Scanner::new(input);
    match read_rules_scope(&mut scanner, design_name, model) {
        Ok(ok) => ok,
        Err(e) => {
            error!("rules read: {e:#}");
            false
        }
    }
}

/// Serialize the rule model to `output` as a `rules` scope.
///
/// Failures are logged and swallowed; a best-effort save must never halt
/// the host application. The output is flushed on every exit path.
pub fn write<W: Write>(model: &BoardModel, output: W, design_name: &str) {
    let mut file = IndentWriter::new(output);
    if let Err(e) = write_rules(model, design_name, &mut file) {
        error!("rules write: unable to write rules: {e}");
    }
    if let Err(e) = file.flush() {
        error!("rules write: unable to flush output: {e}");
    }
}

fn header_keyword(token: Option<&Token>) -> Option<Keyword> {
    token.and_then(Token::as_name).and_then(Keyword::lookup)
}

fn read_rules_scope<R: Read>(
    scanner: &mut Scanner<R>,
    design_name: &str,
    model: &mut BoardModel,
) -> Result<bool> {
    // Header: `(rules PCB <design_name>`. The bracket and the two keywords
    // are hard requirements; the design name is only sanity-checked.
    if !matches!(scanner.next_token()?, Some(Token::Open)) {
        warn!("rules read: open bracket expected at {}", scanner.context());
        return Ok(false);
    }
    if header_keyword(scanner.next_token()?.as_ref()) != Some(Keyword::Rules) {
        warn!("rules read: keyword rules expected at {}", scanner.context());
        return Ok(false);
    }
    if header_keyword(scanner.next_token()?.as_ref()) != Some(Keyword::Pcb) {
        warn!("rules read: keyword pcb expected at {}", scanner.context());
        return Ok(false);
    }
    match scanner.read_identifier()? {
        Some(name) if name == design_name => {}
        Some(name) => warn!("rules read: design name {name} does not match {design_name}"),
        None => warn!("rules read: design name expected at {}", scanner.context()),
    }

    // Body: dispatch every `(`-prefixed keyword, skip everything unknown,
    // stop at the closing bracket of the rules scope.
    let mut prev: Option<Token> = None;
    loop {
        let Some(token) = scanner.next_token()? else {
            warn!(
                "rules read: unexpected end of file at {}",
                scanner.context()
            );
            return Ok(false);
        };
        if token == Token::Close {
            break;
        }
        if prev == Some(Token::Open) {
            dispatch_scope(&token, scanner, model)?;
            // The whole child scope has been consumed.
            prev = None;
        } else {
            prev = Some(token);
        }
    }
    Ok(true)
}

/// Handle one child scope of `rules`, entered right after its keyword
/// token. Fragment-level parse failures are logged by the fragment readers
/// and deliberately do not abort the read; only stream errors propagate.
fn dispatch_scope<R: Read>(
    token: &Token,
    scanner: &mut Scanner<R>,
    model: &mut BoardModel,
) -> Result<()> {
    let BoardModel {
        layers,
        transform,
        rules,
        library,
        router_settings,
        ..
    } = model;
    match token.as_name().and_then(Keyword::lookup) {
        Some(Keyword::Rule) => {
            let decls = rule::read_scope(scanner)?;
            add_rules(&decls, -1, transform, rules);
        }
        Some(Keyword::Layer) => add_layer_rules(scanner, layers, transform, rules)?,
        Some(Keyword::Padstack) => {
            if let Some(padstack) = padstack::read_scope(scanner, layers, transform)? {
                library.insert_padstack(padstack);
            }
        }
        Some(Keyword::Via) => {
            if let Some(via) = via::read_via_info(scanner)? {
                if rules.clearance_matrix.class_no(&via.clearance_class).is_none() {
                    warn!(
                        "rules read: unknown clearance class {} in via {}",
                        via.clearance_class, via.name
                    );
                    rules.clearance_matrix.ensure_class(&via.clearance_class);
                }
                library.insert_via_padstack(&via.padstack);
                rules.via_infos.replace(via);
            }
        }
        Some(Keyword::ViaRule) => {
            if let Some(via_rule) = via::read_via_rule(scanner)? {
                rules.via_rules.push(via_rule);
            }
        }
        Some(Keyword::Class) => {
            if let Some(scope) = net_class::read_scope(scanner)? {
                net_class::insert_net_class(scope, layers, transform, rules);
            }
        }
        Some(Keyword::SnapAngle) => {
            if let Some(angle) = read_snap_angle(scanner)? {
                rules.trace_angle_restriction = angle;
            }
        }
        Some(Keyword::AutorouteSettings) => {
            if let Some(settings) = autoroute::read_scope(scanner, layers)? {
                *router_settings = settings;
            }
        }
        // Unknown scope, or a header keyword in body position: discard the
        // balanced scope so newer file extensions stay readable.
        Some(Keyword::Rules) | Some(Keyword::Pcb) | None => {
            let open_count = if *token == Token::Open { 2 } else { 1 };
            if !skip_open_scopes(scanner, open_count)? {
                bail!("unexpected end of file at {}", scanner.context());
            }
        }
    }
    Ok(())
}

/// Fold rule declarations into the model. A negative `layer_no` applies
/// them board-wide; otherwise they affect only that layer.
fn add_rules(
    decls: &[RuleDecl],
    layer_no: i32,
    transform: &CoordinateTransform,
    rules: &mut BoardRules,
) {
    for decl in decls {
        match decl {
            RuleDecl::Width(width) => {
                let half_width = transform.half_width_to_board(*width);
                if layer_no < 0 {
                    rules.set_default_trace_half_width(half_width);
                } else {
                    rules.set_layer_trace_half_width(layer_no as usize, half_width);
                }
            }
            RuleDecl::Clearance { value, class_pairs } => {
                set_clearance_rule(*value, class_pairs, layer_no, transform, rules);
            }
        }
    }
}

fn set_clearance_rule(
    value: f64,
    class_pairs: &[String],
    layer_no: i32,
    transform: &CoordinateTransform,
    rules: &mut BoardRules,
) {
    let clearance = transform.to_board_units(value).round() as i32;
    if class_pairs.is_empty() {
        rules.clearance_matrix.set_value(
            DEFAULT_CLEARANCE_CLASS,
            DEFAULT_CLEARANCE_CLASS,
            layer_no,
            clearance,
        );
        return;
    }
    for pair in class_pairs {
        // Pair syntax is `a_b`; a bare class name addresses its self-pair.
        let (class_a, class_b) = match pair.split_once('_') {
            Some((a, b)) => (a, b),
            None => (pair.as_str(), pair.as_str()),
        };
        for class in [class_a, class_b] {
            if rules.clearance_matrix.class_no(class).is_none() {
                warn!("rules read: clearance rule introduces new class {class}");
            }
        }
        rules
            .clearance_matrix
            .set_value(class_a, class_b, layer_no, clearance);
    }
}

/// Read a `layer` scope: `(layer <name> (rule ...)*)`. An unresolved layer
/// name is a warning, not an abort; its rule declarations are parsed and
/// dropped because there is no layer to scope them to.
fn add_layer_rules<R: Read>(
    scanner: &mut Scanner<R>,
    layers: &LayerStructure,
    transform: &CoordinateTransform,
    rules: &mut BoardRules,
) -> Result<()> {
    let token = scanner.expect_token()?;
    let layer_name = match &token {
        Token::Close => {
            warn!("rules read: layer name expected at {}", scanner.context());
            return Ok(());
        }
        Token::Open => {
            warn!("rules read: layer name expected at {}", scanner.context());
            if !skip_open_scopes(scanner, 2)? {
                bail!("unexpected end of file at {}", scanner.context());
            }
            return Ok(());
        }
        other => match other.as_name() {
            Some(name) => name.to_string(),
            None => {
                warn!("rules read: layer name expected at {}", scanner.context());
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
                return Ok(());
            }
        },
    };
    let layer_no = layers.index_of(&layer_name);
    if layer_no.is_none() {
        warn!("rules read: layer not found: {layer_name}");
    }
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(()),
            Token::Open => {
                let inner = scanner.expect_token()?;
                if inner.as_name().and_then(Keyword::lookup) == Some(Keyword::Rule) {
                    let decls = rule::read_scope(scanner)?;
                    if let Some(layer_no) = layer_no {
                        add_rules(&decls, layer_no as i32, transform, rules);
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
}

/// Read `(snap_angle none|fortyfive_degree|ninety_degree)`.
fn read_snap_angle<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<AngleRestriction>> {
    let mut angle = None;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(angle),
            Token::Open => {
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
            }
            _ => {
                if angle.is_none() {
                    if let Some(word) = token.as_name() {
                        angle = AngleRestriction::from_keyword(word);
                        if angle.is_none() {
                            warn!("rules read: unknown snap angle {word}");
                        }
                    }
                }
            }
        }
    }
}

fn write_snap_angle<W: Write>(
    file: &mut IndentWriter<W>,
    restriction: AngleRestriction,
) -> io::Result<()> {
    if restriction == AngleRestriction::None {
        return Ok(());
    }
    file.line_scope(&format!("snap_angle {}", restriction.keyword()))
}

/// Emit the canonical scope order: header, snap angle, autoroute settings,
/// default rule (as layer 0), via-usable padstacks, via infos, via rules,
/// net classes.
fn write_rules<W: Write>(
    model: &BoardModel,
    design_name: &str,
    file: &mut IndentWriter<W>,
) -> io::Result<()> {
    file.scope(|file| {
        file.write("rules PCB ")?;
        file.write(&quote_identifier(design_name, model.string_quote))?;
        write_snap_angle(file, model.rules.trace_angle_restriction)?;
        autoroute::write_scope(
            file,
            &model.router_settings,
            &model.layers,
            model.string_quote,
        )?;
        rule::write_default_rule(file, model, 0)?;
        for (name, padstack) in &model.library.padstacks {
            if model.library.get_via_padstack(name).is_some() {
                padstack::write_scope(
                    file,
                    padstack,
                    &model.layers,
                    &model.transform,
                    model.string_quote,
                )?;
            }
        }
        via::write_via_infos(file, &model.rules.via_infos, model.string_quote)?;
        via::write_via_rules(file, &model.rules.via_rules, model.string_quote)?;
        net_class::write_net_classes(file, model)
    })
}
