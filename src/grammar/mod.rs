//! Ruby line grammar.
//!
//! This module assembles the rules the reindenter runs:
//! - [`patterns`]: Keyword lists and regex sources
//! - [`types`]: [`LineShape`], the classification of one line
//! - [`literals`]: Quoted strings, interpolation and heredocs
//! - [`lines`]: The prioritized line shapes and their depth actions
//!
//! The grammar is built once and shared; all per-document state lives in the
//! [`Indenter`] handed to each parse.

pub mod lines;
pub mod literals;
pub mod patterns;
pub mod types;

use std::sync::LazyLock;

use crate::format::Indenter;
use crate::parser::{
    choice, lit, not, pattern, repeat, Grammar, GrammarBuilder, GrammarError, ParserState, RuleId,
};

pub use lines::LineRules;
pub use literals::LiteralRules;
pub use types::LineShape;

/// Whitespace, newline, end of input and comments
#[derive(Debug, Clone, Copy)]
pub struct Lexical {
    /// Horizontal whitespace, possibly empty
    pub spacing: RuleId,
    pub eol: RuleId,
    pub eof: RuleId,
    pub comment: RuleId,
}

/// The assembled grammar plus the rule ids callers start from
pub struct RubyGrammar {
    pub grammar: Grammar<Indenter>,
    pub lexical: Lexical,
    pub literals: LiteralRules,
    pub lines: LineRules,
}

/// Shared grammar instance
pub static GRAMMAR: LazyLock<RubyGrammar> = LazyLock::new(|| {
    build_grammar().unwrap_or_else(|e| panic!("line grammar is inconsistent: {e}"))
});

/// Build the Ruby line grammar
pub fn build_grammar() -> Result<RubyGrammar, GrammarError> {
    let mut builder = GrammarBuilder::new();

    let lexical = Lexical {
        spacing: builder.add("spacing", repeat(choice(vec![lit(" "), lit("\t")]))),
        eol: builder.add("eol", lit("\n")),
        eof: builder.add("eof", not(pattern(patterns::ANY_CHAR))),
        comment: builder.add("comment", pattern(patterns::COMMENT)),
    };
    let literals = literals::define(&mut builder, &lexical);
    let lines = lines::define(&mut builder, &lexical, &literals);

    Ok(RubyGrammar {
        grammar: builder.build()?,
        lexical,
        literals,
        lines,
    })
}

/// Shape of the first line of `input`, or `None` when no shape matches
///
/// Leading horizontal whitespace is skipped first, as the reindenter does.
#[must_use]
pub fn classify(input: &str) -> Option<LineShape> {
    let g = &*GRAMMAR;
    let mut state = ParserState::new(&g.grammar, input, Indenter::default());
    state.apply(g.lexical.spacing)?;
    g.lines
        .shapes
        .iter()
        .find_map(|&(shape, id)| state.apply(id).map(|_| shape))
}
