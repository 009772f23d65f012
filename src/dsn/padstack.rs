//! `padstack` scope: pad shape stacks referenced by via definitions.
//!
//! Shape coordinates are converted to board units while reading and back to
//! file units while writing. Shapes on unknown layers are dropped with a
//! warning; the rest of the padstack is still usable.

use anyhow::{bail, Result};
use log::warn;
use std::io::{self, Read, Write};

use super::indent::{fmt_number, quote_identifier, IndentWriter};
use super::scanner::{skip_open_scopes, Scanner, Token};
use crate::board::{CoordinateTransform, LayerStructure, PadShape, Padstack};

/// Read one `padstack` scope:
/// `(padstack <name> (shape ...)* [(attach on|off)])`.
pub fn read_scope<R: Read>(
    scanner: &mut Scanner<R>,
    layers: &LayerStructure,
    transform: &CoordinateTransform,
) -> Result<Option<Padstack>> {
    let mut name: Option<String> = None;
    let mut shapes = Vec::new();
    let mut attach_allowed = false;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => break,
            Token::Open => {
                let inner = scanner.expect_token()?;
                match inner.as_name() {
                    Some("shape") => read_shape(scanner, layers, transform, &mut shapes)?,
                    Some("attach") => {
                        if let Some(flag) = read_on_off(scanner)? {
                            attach_allowed = flag;
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
            _ => {
                if name.is_none() {
                    name = token.as_name().map(str::to_string);
                }
            }
        }
    }
    let Some(name) = name else {
        warn!(
            "rules read: padstack name expected at {}",
            scanner.context()
        );
        return Ok(None);
    };
    Ok(Some(Padstack {
        name,
        shapes,
        attach_allowed,
    }))
}

/// Read the body of a `shape` scope, collecting its shapes.
fn read_shape<R: Read>(
    scanner: &mut Scanner<R>,
    layers: &LayerStructure,
    transform: &CoordinateTransform,
    shapes: &mut Vec<PadShape>,
) -> Result<()> {
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok(()),
            Token::Open => {
                let inner = scanner.expect_token()?;
                let kind = inner.as_name().map(str::to_string);
                let (layer_name, numbers) = read_shape_operands(scanner)?;
                let Some(layer_no) = layer_name.as_deref().and_then(|n| layers.index_of(n))
                else {
                    warn!(
                        "rules read: unknown layer {} in padstack shape at {}",
                        layer_name.as_deref().unwrap_or("<missing>"),
                        scanner.context()
                    );
                    continue;
                };
                match kind.as_deref() {
                    Some("circle") if !numbers.is_empty() => {
                        shapes.push(PadShape::Circle {
                            layer_no,
                            diameter: transform.to_board_units(numbers[0]),
                            cx: transform.to_board_units(numbers.get(1).copied().unwrap_or(0.0)),
                            cy: transform.to_board_units(numbers.get(2).copied().unwrap_or(0.0)),
                        });
                    }
                    Some("rect") if numbers.len() >= 4 => {
                        shapes.push(PadShape::Rect {
                            layer_no,
                            x1: transform.to_board_units(numbers[0]),
                            y1: transform.to_board_units(numbers[1]),
                            x2: transform.to_board_units(numbers[2]),
                            y2: transform.to_board_units(numbers[3]),
                        });
                    }
                    _ => {
                        warn!(
                            "rules read: unsupported padstack shape at {}",
                            scanner.context()
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

/// Consume one shape form up to its closing bracket, returning the leading
/// layer name and the numeric operands that follow it.
fn read_shape_operands<R: Read>(
    scanner: &mut Scanner<R>,
) -> Result<(Option<String>, Vec<f64>)> {
    let mut layer_name = None;
    let mut numbers = Vec::new();
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => return Ok((layer_name, numbers)),
            Token::Open => {
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
            }
            Token::Number(n) => numbers.push(n),
            _ => {
                if layer_name.is_none() {
                    layer_name = token.as_name().map(str::to_string);
                }
            }
        }
    }
}

/// Read the `on`/`off` word of a switch scope and consume the scope.
pub(crate) fn read_on_off<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<bool>> {
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
                Some("on") => value = Some(true),
                Some("off") => value = Some(false),
                _ => {}
            },
        }
    }
}

pub(crate) fn write_scope<W: Write>(
    file: &mut IndentWriter<W>,
    padstack: &Padstack,
    layers: &LayerStructure,
    transform: &CoordinateTransform,
    quote: char,
) -> io::Result<()> {
    file.scope(|file| {
        file.write("padstack ")?;
        file.write(&quote_identifier(&padstack.name, quote))?;
        for shape in &padstack.shapes {
            let line = match shape {
                PadShape::Circle {
                    layer_no,
                    diameter,
                    cx,
                    cy,
                } => {
                    let Some(layer) = layers.name(*layer_no) else {
                        continue;
                    };
                    let mut line = format!(
                        "circle {} {}",
                        quote_identifier(layer, quote),
                        fmt_number(transform.to_file_units(*diameter))
                    );
                    if *cx != 0.0 || *cy != 0.0 {
                        line.push_str(&format!(
                            " {} {}",
                            fmt_number(transform.to_file_units(*cx)),
                            fmt_number(transform.to_file_units(*cy))
                        ));
                    }
                    line
                }
                PadShape::Rect {
                    layer_no,
                    x1,
                    y1,
                    x2,
                    y2,
                } => {
                    let Some(layer) = layers.name(*layer_no) else {
                        continue;
                    };
                    format!(
                        "rect {} {} {} {} {}",
                        quote_identifier(layer, quote),
                        fmt_number(transform.to_file_units(*x1)),
                        fmt_number(transform.to_file_units(*y1)),
                        fmt_number(transform.to_file_units(*x2)),
                        fmt_number(transform.to_file_units(*y2))
                    )
                }
            };
            file.scope(|file| {
                file.write("shape")?;
                file.line_scope(&line)
            })?;
        }
        file.line_scope(if padstack.attach_allowed {
            "attach on"
        } else {
            "attach off"
        })
    })
}
