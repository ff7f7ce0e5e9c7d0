//! Memoizing backtracking matcher.
//!
//! This module provides the parsing infrastructure the line grammar is built on:
//! - [`expr`]: Combinator expressions, named rules and the [`GrammarBuilder`]
//! - [`engine`]: [`ParserState`], the packrat evaluator with left-recursion growing
//! - [`memo`]: The (rule, position) memo table
//! - [`position`]: Offset to line/column conversion for diagnostics
//!
//! Rules are data rather than code: a grammar is a table of expression trees
//! interpreted by one evaluator, and semantic actions are plain function
//! pointers that receive the rule's captures and a caller-owned context.

pub mod engine;
pub mod expr;
pub mod memo;
pub mod position;

pub use engine::{ParseStats, ParserState};
pub use expr::{
    and, choice, label, lit, not, optional, pattern, predicate, repeat, rule, seq, Action,
    Captures, Expr, Grammar, GrammarBuilder, GrammarError, Predicate, Rule, RuleId, Value,
};
pub use memo::{MemoEntry, MemoTable, Outcome};
