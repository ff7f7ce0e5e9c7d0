//! Reindenting pipeline
//!
//! Runs the line grammar over a whole document: skip leading horizontal
//! whitespace, match one line, append what its action emitted, and repeat
//! until the input is exhausted. All rules share one memo table for the
//! document, so a heredoc body scanned while matching its introducing line
//! is not scanned again.

use std::io::{BufRead, Write};

use anyhow::Context;
use tracing::debug;

use crate::config::Config;
use crate::error::ParseError;
use crate::format::Indenter;
use crate::grammar::{RubyGrammar, GRAMMAR};
use crate::parser::ParserState;
use crate::Result;

/// Reindent a whole document
///
/// Returns the input unchanged when `config.impose_indent` is off. Empty
/// input succeeds with empty output; any other input must end in a newline.
pub fn reindent(input: &str, config: &Config) -> std::result::Result<String, ParseError> {
    if !config.impose_indent {
        return Ok(input.to_string());
    }
    reindent_with(&GRAMMAR, input, &config.indent_unit)
}

fn reindent_with(
    g: &RubyGrammar,
    input: &str,
    unit: &str,
) -> std::result::Result<String, ParseError> {
    let mut state = ParserState::new(&g.grammar, input, Indenter::new(unit));
    let mut lines = 0usize;

    loop {
        // Leading indentation is dropped; the line's action supplies its own
        let _ = state.apply(g.lexical.spacing);
        if state.is_at_end() {
            break;
        }
        let Some(value) = state.apply(g.lines.line) else {
            return Err(state
                .failure()
                .unwrap_or_else(|| ParseError::at(input, "line", state.pos())));
        };
        let text = state.text(&value).to_string();
        state.context_mut().push(&text);
        lines += 1;
    }

    let stats = state.stats();
    debug!(
        lines,
        bytes = input.len(),
        final_depth = state.context().depth(),
        memo_entries = stats.memo_entries,
        memo_hits = stats.memo_hits,
        growth_rounds = stats.growth_rounds,
        "document reindented"
    );
    Ok(state.into_context().into_output())
}

/// Read a document from `input`, reindent it and write the result to `output`
pub fn format_file<R: BufRead, W: Write>(
    mut input: R,
    output: &mut W,
    config: &Config,
    filename: &str,
) -> Result<()> {
    let mut source = String::new();
    input
        .read_to_string(&mut source)
        .with_context(|| format!("{filename}: input is not valid UTF-8"))?;

    let formatted = reindent(&source, config).map_err(|e| {
        debug!(file = filename, rule = e.rule.as_str(), offset = e.offset, "parse failed");
        anyhow::anyhow!("{filename}: {e}\n{}", e.caret())
    })?;

    output
        .write_all(formatted.as_bytes())
        .with_context(|| format!("{filename}: failed to write output"))?;
    Ok(())
}

/// One line whose text differs between two versions of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange<'a> {
    /// 1-based line number
    pub line: usize,
    pub before: &'a str,
    pub after: &'a str,
}

/// Lines that differ between `before` and `after`, paired by line number
///
/// Reindenting never adds or removes lines, so pairing by position is
/// enough to show what moved.
#[must_use]
pub fn changed_lines<'a>(before: &'a str, after: &'a str) -> Vec<LineChange<'a>> {
    let mut old = before.lines();
    let mut new = after.lines();
    let mut changes = Vec::new();
    let mut line = 0;
    loop {
        line += 1;
        match (old.next(), new.next()) {
            (None, None) => break,
            (b, a) => {
                let (b, a) = (b.unwrap_or_default(), a.unwrap_or_default());
                if b != a {
                    changes.push(LineChange {
                        line,
                        before: b,
                        after: a,
                    });
                }
            }
        }
    }
    changes
}
