//! Indenting writer for the nested-bracket output format.
//!
//! Nesting depth is tracked by the writer itself: [`IndentWriter::scope`]
//! increments the indent, runs the nested write steps and restores the
//! level on every exit path, so a failed write step can never leave the
//! bookkeeping unbalanced.

use std::io::{self, BufWriter, Write};

/// Buffered writer that prefixes each new line with the current indent.
pub struct IndentWriter<W: Write> {
    out: BufWriter<W>,
    indent: usize,
}

impl<W: Write> IndentWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            out: BufWriter::new(output),
            indent: 0,
        }
    }

    pub fn write(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    /// Start a new line at the current indent level.
    pub fn new_line(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n")?;
        for _ in 0..self.indent {
            self.out.write_all(b"  ")?;
        }
        Ok(())
    }

    /// Write one nested scope: opening bracket on a fresh line, the body
    /// produced by `body` one indent level deeper, closing bracket on its
    /// own line. The indent level is restored even when `body` fails.
    pub fn scope<F>(&mut self, body: F) -> io::Result<()>
    where
        F: FnOnce(&mut Self) -> io::Result<()>,
    {
        self.new_line()?;
        self.out.write_all(b"(")?;
        self.indent += 1;
        let result = body(self);
        self.indent = self.indent.saturating_sub(1);
        result?;
        self.new_line()?;
        self.out.write_all(b")")
    }

    /// Write a small scope on a single line: `(text)`.
    pub fn line_scope(&mut self, text: &str) -> io::Result<()> {
        self.new_line()?;
        self.out.write_all(b"(")?;
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b")")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Format a length or cost value the way the rules format expects: integral
/// values without a fraction, everything else in shortest float form.
pub fn fmt_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e12 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Render an identifier, wrapping it in the quote character when it
/// contains characters the scanner would otherwise split on.
pub fn quote_identifier(name: &str, quote: char) -> String {
    let needs_quoting = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\''));
    if needs_quoting {
        format!("{quote}{name}{quote}")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(body: F) -> String
    where
        F: FnOnce(&mut IndentWriter<&mut Vec<u8>>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        {
            let mut file = IndentWriter::new(&mut buf);
            body(&mut file).unwrap();
            file.flush().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn nested_scopes_indent_and_close() {
        let text = render(|file| {
            file.scope(|file| {
                file.write("outer")?;
                file.scope(|file| {
                    file.write("inner value")?;
                    Ok(())
                })
            })
        });
        assert_eq!(text, "\n(outer\n  (inner value\n  )\n)");
    }

    #[test]
    fn indent_is_restored_after_failed_body() {
        let mut buf = Vec::new();
        let mut file = IndentWriter::new(&mut buf);
        let result = file.scope(|file| {
            file.write("broken")?;
            Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"))
        });
        assert!(result.is_err());
        // The level must be back at the root so later writes nest correctly.
        file.scope(|file| file.write("recovered")).unwrap();
        file.flush().unwrap();
        drop(file);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("\n(recovered\n)"));
    }

    #[test]
    fn numbers_print_without_spurious_fractions() {
        assert_eq!(fmt_number(10.0), "10");
        assert_eq!(fmt_number(-3.0), "-3");
        assert_eq!(fmt_number(0.5), "0.5");
    }

    #[test]
    fn identifiers_with_spaces_get_quoted() {
        assert_eq!(quote_identifier("my net", '"'), "\"my net\"");
        assert_eq!(quote_identifier("plain", '"'), "plain");
    }
}
