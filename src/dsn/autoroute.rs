//! `autoroute_settings` scope.
//!
//! Reading produces a complete [`RouterSettings`] value that replaces the
//! session's active settings wholesale; fields missing from the file keep
//! their defaults inside the freshly built value, never the old one.

use anyhow::{bail, Result};
use log::warn;
use std::io::{self, Read, Write};

use super::indent::{fmt_number, quote_identifier, IndentWriter};
use super::padstack::read_on_off;
use super::scanner::{skip_open_scopes, Scanner, Token};
use crate::board::{LayerStructure, RouterSettings};

/// Read one `autoroute_settings` scope.
pub fn read_scope<R: Read>(
    scanner: &mut Scanner<R>,
    layers: &LayerStructure,
) -> Result<Option<RouterSettings>> {
    let mut settings = RouterSettings::new(layers.len());
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(Some(settings)),
            Token::Open => {
                let inner = scanner.expect_token()?;
                match inner.as_name() {
                    Some("fanout") => {
                        if let Some(flag) = read_on_off(scanner)? {
                            settings.fanout_pass = flag;
                        }
                    }
                    Some("autoroute") => {
                        if let Some(flag) = read_on_off(scanner)? {
                            settings.autoroute_pass = flag;
                        }
                    }
                    Some("postroute") => {
                        if let Some(flag) = read_on_off(scanner)? {
                            settings.postroute_pass = flag;
                        }
                    }
                    Some("vias") => {
                        if let Some(flag) = read_on_off(scanner)? {
                            settings.vias_allowed = flag;
                        }
                    }
                    Some("via_costs") => {
                        if let Some(value) = read_int(scanner)? {
                            settings.via_costs = value;
                        }
                    }
                    Some("plane_via_costs") => {
                        if let Some(value) = read_int(scanner)? {
                            settings.plane_via_costs = value;
                        }
                    }
                    Some("start_ripup_costs") => {
                        if let Some(value) = read_int(scanner)? {
                            settings.start_ripup_costs = value;
                        }
                    }
                    Some("start_pass_no") => {
                        if let Some(value) = read_int(scanner)? {
                            settings.start_pass_no = value;
                        }
                    }
                    Some("layer_rule") => read_layer_rule(scanner, layers, &mut settings)?,
                    _ => {
                        let open_count = if inner == Token::Open { 2 } else { 1 };
                        if !skip_open_scopes(scanner, open_count)? {
                            bail!("unexpected end of file at {}", scanner.context());
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn read_int<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<i32>> {
    let mut value = None;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(value),
            Token::Open => {
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
            }
            Token::Number(n) => value = Some(n.round() as i32),
            _ => {}
        }
    }
}

fn read_number<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<f64>> {
    let mut value = None;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(value),
            Token::Open => {
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
            }
            Token::Number(n) => value = Some(n),
            _ => {}
        }
    }
}

/// Read one per-layer settings scope:
/// `(layer_rule <layer> (active on|off) (preferred_direction horizontal|
/// vertical) (preferred_direction_trace_costs <n>)
/// (against_preferred_direction_trace_costs <n>))`.
fn read_layer_rule<R: Read>(
    scanner: &mut Scanner<R>,
    layers: &LayerStructure,
    settings: &mut RouterSettings,
) -> Result<()> {
    let mut layer_name: Option<String> = None;
    let mut active = None;
    let mut horizontal = None;
    let mut with_costs = None;
    let mut against_costs = None;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => break,
            Token::Open => {
                let inner = scanner.expect_token()?;
                match inner.as_name() {
                    Some("active") => active = read_on_off(scanner)?,
                    Some("preferred_direction") => {
                        horizontal = read_direction(scanner)?;
                    }
                    Some("preferred_direction_trace_costs") => {
                        with_costs = read_number(scanner)?;
                    }
                    Some("against_preferred_direction_trace_costs") => {
                        against_costs = read_number(scanner)?;
                    }
                    _ => {
                        let open_count = if inner == Token::Open { 2 } else { 1 };
                        if !skip_open_scopes(scanner, open_count)? {
                            bail!("unexpected end of file at {}", scanner.context());
                        }
                    }
                }
            }
            _ => {
                if layer_name.is_none() {
                    layer_name = token.as_name().map(str::to_string);
                }
            }
        }
    }
    let layer_no = layer_name.as_deref().and_then(|n| layers.index_of(n));
    let Some(layer_no) = layer_no else {
        warn!(
            "rules read: unknown layer {} in autoroute settings",
            layer_name.as_deref().unwrap_or("<missing>")
        );
        return Ok(());
    };
    let layer = &mut settings.layer_settings[layer_no];
    if let Some(flag) = active {
        layer.active = flag;
    }
    if let Some(flag) = horizontal {
        layer.preferred_direction_horizontal = flag;
    }
    if let Some(costs) = with_costs {
        layer.preferred_direction_trace_costs = costs;
    }
    if let Some(costs) = against_costs {
        layer.against_preferred_direction_trace_costs = costs;
    }
    Ok(())
}

fn read_direction<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<bool>> {
    let mut value = None;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(value),
            Token::Open => {
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
            }
            _ => match token.as_name() {
                Some("horizontal") => value = Some(true),
                Some("vertical") => value = Some(false),
                _ => {}
            },
        }
    }
}

pub(crate) fn write_scope<W: Write>(
    file: &mut IndentWriter<W>,
    settings: &RouterSettings,
    layers: &LayerStructure,
    quote: char,
) -> io::Result<()> {
    file.scope(|file| {
        file.write("autoroute_settings")?;
        file.line_scope(&format!("fanout {}", on_off(settings.fanout_pass)))?;
        file.line_scope(&format!("autoroute {}", on_off(settings.autoroute_pass)))?;
        file.line_scope(&format!("postroute {}", on_off(settings.postroute_pass)))?;
        file.line_scope(&format!("vias {}", on_off(settings.vias_allowed)))?;
        file.line_scope(&format!("via_costs {}", settings.via_costs))?;
        file.line_scope(&format!("plane_via_costs {}", settings.plane_via_costs))?;
        file.line_scope(&format!("start_ripup_costs {}", settings.start_ripup_costs))?;
        file.line_scope(&format!("start_pass_no {}", settings.start_pass_no))?;
        for (layer_no, layer) in settings.layer_settings.iter().enumerate() {
            let Some(name) = layers.name(layer_no) else {
                continue;
            };
            file.scope(|file| {
                file.write("layer_rule ")?;
                file.write(&quote_identifier(name, quote))?;
                file.line_scope(&format!("active {}", on_off(layer.active)))?;
                file.line_scope(&format!(
                    "preferred_direction {}",
                    if layer.preferred_direction_horizontal {
                        "horizontal"
                    } else {
                        "vertical"
                    }
                ))?;
                file.line_scope(&format!(
                    "preferred_direction_trace_costs {}",
                    fmt_number(layer.preferred_direction_trace_costs)
                ))?;
                file.line_scope(&format!(
                    "against_preferred_direction_trace_costs {}",
                    fmt_number(layer.against_preferred_direction_trace_costs)
                ))
            })?;
        }
        Ok(())
    })
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
