//! `via` and `via_rule` scopes.

use anyhow::{bail, Result};
use log::warn;
use std::io::{self, Read, Write};

use super::indent::{quote_identifier, IndentWriter};
use super::scanner::{skip_open_scopes, Scanner, Token};
use crate::board::{ViaInfo, ViaInfos, ViaRule, DEFAULT_CLEARANCE_CLASS};

/// Read one `via` scope: `(via <name> <padstack> [<clearance_class>]
/// [spare])`. Returns `None` (after logging) when the declaration is
/// incomplete; the scope is consumed either way.
pub fn read_via_info<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<ViaInfo>> {
    let mut names: Vec<String> = Vec::new();
    let mut spare = false;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => break,
            Token::Open => {
                if !skip_open_scopes(scanner, 1)? {
                    bail!("unexpected end of file at {}", scanner.context());
                }
            }
            _ => match token.as_name() {
                Some("spare") => spare = true,
                Some(name) => names.push(name.to_string()),
                None => {}
            },
        }
    }
    let mut names = names.into_iter();
    let (Some(name), Some(padstack)) = (names.next(), names.next()) else {
        warn!(
            "rules read: via name and padstack expected at {}",
            scanner.context()
        );
        return Ok(None);
    };
    let clearance_class = names
        .next()
        .unwrap_or_else(|| DEFAULT_CLEARANCE_CLASS.to_string());
    Ok(Some(ViaInfo {
        name,
        padstack,
        clearance_class,
        spare,
    }))
}

/// Read one `via_rule` scope: `(via_rule [<name>] (via_list <via>*)*)`.
/// An optional leading bare word names the rule; every other bare word and
/// the content of `via_list` scopes accumulate as via names, in order.
pub fn read_via_rule<R: Read>(scanner: &mut Scanner<R>) -> Result<Option<ViaRule>> {
    let mut rule = ViaRule::default();
    let mut saw_via_list = false;
    loop {
        let token = scanner.expect_token()?;
        match token {
            Token::Close => break,
            Token::Open => {
                let inner = scanner.expect_token()?;
                if inner.as_name() == Some("via_list") {
                    saw_via_list = true;
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
                                    rule.vias.push(name.to_string());
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
            _ => {
                if let Some(name) = token.as_name() {
                    if rule.name.is_none() && !saw_via_list && rule.vias.is_empty() {
                        rule.name = Some(name.to_string());
                    } else {
                        rule.vias.push(name.to_string());
                    }
                }
            }
        }
    }
    Ok(Some(rule))
}

pub(crate) fn write_via_infos<W: Write>(
    file: &mut IndentWriter<W>,
    via_infos: &ViaInfos,
    quote: char,
) -> io::Result<()> {
    for via in via_infos.iter() {
        let mut line = format!(
            "via {} {} {}",
            quote_identifier(&via.name, quote),
            quote_identifier(&via.padstack, quote),
            quote_identifier(&via.clearance_class, quote)
        );
        if via.spare {
            line.push_str(" spare");
        }
        file.line_scope(&line)?;
    }
    Ok(())
}

pub(crate) fn write_via_rules<W: Write>(
    file: &mut IndentWriter<W>,
    via_rules: &[ViaRule],
    quote: char,
) -> io::Result<()> {
    for rule in via_rules {
        file.scope(|file| {
            file.write("via_rule")?;
            if let Some(name) = &rule.name {
                file.write(" ")?;
                file.write(&quote_identifier(name, quote))?;
            }
            let mut list = String::from("via_list");
            for via in &rule.vias {
                list.push(' ');
                list.push_str(&quote_identifier(via, quote));
            }
            file.line_scope(&list)
        })?;
    }
    Ok(())
}
