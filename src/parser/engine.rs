/// `ParserState` - memoizing backtracking evaluator
///
/// Interprets [`Expr`] trees over one input document. Every application of a
/// named rule goes through the memo table, so each (rule, position) pair is
/// evaluated at most once regardless of how much the grammar backtracks.
/// Directly left-recursive rules are grown from their seed match until the
/// match stops getting longer.
use tracing::trace;

use super::expr::{Captures, Expr, Grammar, RuleId, Value};
use super::memo::{MemoEntry, MemoTable, Outcome};
use crate::error::ParseError;

/// Bindings collected while evaluating one rule body
struct Frame {
    start: usize,
    labels: Vec<(&'static str, Value)>,
}

impl Frame {
    fn new(start: usize) -> Self {
        Self {
            start,
            labels: Vec::new(),
        }
    }
}

/// Result of consulting the memo table before evaluating a rule
enum Cached {
    Recursing,
    Failed,
    Hit(usize, Value),
}

/// Counters describing the work done by one parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub memo_entries: usize,
    pub memo_hits: usize,
    pub growth_rounds: usize,
}

/// Mutable state of one parse: cursor, memo table, diagnostics and the
/// caller-supplied context that actions and predicates see
pub struct ParserState<'a, C> {
    grammar: &'a Grammar<C>,
    input: &'a str,
    pos: usize,
    memo: MemoTable,
    /// Rule and offset of the furthest failure seen so far
    furthest: Option<(RuleId, usize)>,
    /// Nesting depth of negative lookahead; failures there are expected
    quiet: usize,
    growth_rounds: usize,
    context: C,
}

impl<'a, C> ParserState<'a, C> {
    #[must_use]
    pub fn new(grammar: &'a Grammar<C>, input: &'a str, context: C) -> Self {
        Self {
            grammar,
            input,
            pos: 0,
            memo: MemoTable::new(),
            furthest: None,
            quiet: 0,
            growth_rounds: 0,
            context,
        }
    }

    #[must_use]
    pub fn input(&self) -> &'a str {
        self.input
    }

    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    #[must_use]
    pub fn into_context(self) -> C {
        self.context
    }

    /// Resolve a value produced by this parse to text
    #[must_use]
    pub fn text<'v>(&self, value: &'v Value) -> &'v str
    where
        'a: 'v,
    {
        value.as_str(self.input)
    }

    #[must_use]
    pub fn stats(&self) -> ParseStats {
        ParseStats {
            memo_entries: self.memo.len(),
            memo_hits: self.memo.hits(),
            growth_rounds: self.growth_rounds,
        }
    }

    /// Diagnostic for the furthest failure recorded so far
    #[must_use]
    pub fn failure(&self) -> Option<ParseError> {
        self.furthest
            .map(|(rule, offset)| ParseError::at(self.input, self.grammar.name(rule), offset))
    }

    /// Apply `root` and require it to consume the whole input
    pub fn parse(&mut self, root: RuleId) -> Result<Value, ParseError> {
        match self.apply(root) {
            Some(value) if self.is_at_end() => Ok(value),
            _ => Err(self
                .failure()
                .unwrap_or_else(|| ParseError::at(self.input, self.grammar.name(root), self.pos))),
        }
    }

    /// Apply a named rule at the cursor, through the memo table
    pub fn apply(&mut self, id: RuleId) -> Option<Value> {
        let start = self.pos;

        let cached = self.memo.lookup(id, start).map(|entry| match &mut entry.outcome {
            Outcome::InProgress { detected } => {
                *detected = true;
                Cached::Recursing
            }
            Outcome::Failure => Cached::Failed,
            Outcome::Success { end, value } => Cached::Hit(*end, value.clone()),
        });

        match cached {
            Some(Cached::Recursing) => return None,
            Some(Cached::Failed) => {
                self.record_failure(id, start);
                return None;
            }
            Some(Cached::Hit(end, value)) => {
                self.pos = end;
                return Some(value);
            }
            None => {}
        }

        self.memo.begin(id, start);
        let result = self.invoke(id);
        let outcome = match &result {
            Some(value) => Outcome::Success {
                end: self.pos,
                value: value.clone(),
            },
            None => Outcome::Failure,
        };
        let detected = self.memo.resolve(id, start, outcome);

        // A failing seed has nothing to grow from
        if detected && result.is_some() {
            return self.grow(id, start);
        }
        result
    }

    /// Re-evaluate a left-recursive rule from `start`, each round seeded with
    /// the previous match, until a round no longer ends further right
    fn grow(&mut self, id: RuleId, start: usize) -> Option<Value> {
        loop {
            self.pos = start;
            self.growth_rounds += 1;
            let Some(value) = self.invoke(id) else {
                break;
            };
            let prev_end = match self.memo.get(id, start) {
                Some(MemoEntry {
                    outcome: Outcome::Success { end, .. },
                    ..
                }) => *end,
                _ => break,
            };
            if self.pos <= prev_end {
                break;
            }
            trace!(
                rule = self.grammar.name(id),
                start,
                end = self.pos,
                "left recursion grown"
            );
            self.memo.resolve(
                id,
                start,
                Outcome::Success {
                    end: self.pos,
                    value,
                },
            );
        }

        match self.memo.get(id, start).map(|entry| entry.outcome.clone()) {
            Some(Outcome::Success { end, value }) => {
                self.pos = end;
                Some(value)
            }
            _ => {
                self.pos = start;
                None
            }
        }
    }

    /// Evaluate a rule body and run its action
    fn invoke(&mut self, id: RuleId) -> Option<Value> {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        let start = self.pos;
        let mut frame = Frame::new(start);

        let Some(value) = self.eval(&rule.expr, &mut frame) else {
            self.pos = start;
            self.record_failure(id, start);
            return None;
        };

        Some(match rule.action {
            Some(action) => {
                let caps = Captures {
                    input: self.input,
                    start,
                    end: self.pos,
                    labels: &frame.labels,
                };
                Value::Text(action(&caps, &mut self.context))
            }
            None => value,
        })
    }

    fn eval(&mut self, expr: &'a Expr<C>, frame: &mut Frame) -> Option<Value> {
        let start = self.pos;
        match expr {
            Expr::Literal(s) => {
                if self.input[start..].starts_with(s) {
                    self.pos += s.len();
                    Some(Value::Span(start, self.pos))
                } else {
                    None
                }
            }
            Expr::Pattern(re) => {
                let m = re.find(&self.input[start..])?;
                self.pos += m.end();
                Some(Value::Span(start, self.pos))
            }
            Expr::Sequence(items) => {
                let mark = frame.labels.len();
                for item in items {
                    if self.eval(item, frame).is_none() {
                        self.pos = start;
                        frame.labels.truncate(mark);
                        return None;
                    }
                }
                Some(Value::Span(start, self.pos))
            }
            Expr::Choice(items) => {
                let mark = frame.labels.len();
                for item in items {
                    if let Some(value) = self.eval(item, frame) {
                        return Some(value);
                    }
                    self.pos = start;
                    frame.labels.truncate(mark);
                }
                None
            }
            Expr::Repeat(inner) => {
                loop {
                    let before = self.pos;
                    let mark = frame.labels.len();
                    match self.eval(inner, frame) {
                        Some(_) if self.pos > before => {}
                        // Zero-width success would loop forever
                        Some(_) => break,
                        None => {
                            self.pos = before;
                            frame.labels.truncate(mark);
                            break;
                        }
                    }
                }
                Some(Value::Span(start, self.pos))
            }
            Expr::Optional(inner) => {
                let mark = frame.labels.len();
                if self.eval(inner, frame).is_none() {
                    self.pos = start;
                    frame.labels.truncate(mark);
                }
                Some(Value::Span(start, self.pos))
            }
            Expr::Not(inner) => {
                let mark = frame.labels.len();
                self.quiet += 1;
                let matched = self.eval(inner, frame).is_some();
                self.quiet -= 1;
                self.pos = start;
                frame.labels.truncate(mark);
                if matched {
                    None
                } else {
                    Some(Value::Span(start, start))
                }
            }
            Expr::Predicate(check) => {
                let caps = Captures {
                    input: self.input,
                    start: frame.start,
                    end: self.pos,
                    labels: &frame.labels,
                };
                check(&caps, &self.context).then_some(Value::Span(start, start))
            }
            Expr::Label(name, inner) => {
                let value = self.eval(inner, frame)?;
                frame.labels.push((*name, value.clone()));
                Some(value)
            }
            Expr::Rule(id) => self.apply(*id),
        }
    }

    /// Keep the rightmost failure; ties go to the latest
    fn record_failure(&mut self, id: RuleId, offset: usize) {
        if self.quiet > 0 {
            return;
        }
        match self.furthest {
            Some((_, furthest)) if furthest > offset => {}
            _ => self.furthest = Some((id, offset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::expr::{
        choice, label, lit, not, optional, pattern, predicate, repeat, rule, seq, GrammarBuilder,
    };

    fn subtract(caps: &Captures<'_>, _cx: &mut ()) -> String {
        match (caps.get("l"), caps.get("r")) {
            (Some(l), Some(r)) => {
                let l: i64 = l.parse().unwrap_or_default();
                let r: i64 = r.parse().unwrap_or_default();
                (l - r).to_string()
            }
            _ => caps.text().to_string(),
        }
    }

    /// expr = expr "-" num | num
    fn left_recursive() -> (Grammar<()>, RuleId) {
        let mut b = GrammarBuilder::new();
        let expr = b.declare("expr");
        let num = b.add("num", pattern("[0-9]+"));
        b.define_with_action(
            expr,
            choice(vec![
                seq(vec![label("l", rule(expr)), lit("-"), label("r", rule(num))]),
                rule(num),
            ]),
            subtract,
        );
        (b.build().unwrap(), expr)
    }

    #[test]
    fn test_left_recursion_grows_left_associative() {
        let (grammar, expr) = left_recursive();
        let mut state = ParserState::new(&grammar, "10-2-3", ());
        let value = state.parse(expr).unwrap();
        assert_eq!(state.text(&value), "5");
        assert!(state.stats().growth_rounds >= 3);
    }

    #[test]
    fn test_left_recursion_with_only_seed() {
        let (grammar, expr) = left_recursive();
        let mut state = ParserState::new(&grammar, "42", ());
        let value = state.parse(expr).unwrap();
        assert_eq!(state.text(&value), "42");
    }

    #[test]
    fn test_left_recursion_stops_before_dangling_operator() {
        let (grammar, expr) = left_recursive();
        let mut state = ParserState::new(&grammar, "7-1-", ());
        let value = state.apply(expr).unwrap();
        assert_eq!(state.text(&value), "6");
        assert_eq!(state.pos(), 3);
    }

    #[test]
    fn test_memo_hit_replays_end_position() {
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        let word = b.add("word", pattern("[a-z]+"));
        let grammar = b.build().unwrap();
        let mut state = ParserState::new(&grammar, "hello world", ());

        assert!(state.apply(word).is_some());
        assert_eq!(state.pos(), 5);
        state.pos = 0;
        assert!(state.apply(word).is_some());
        assert_eq!(state.pos(), 5);
        assert_eq!(state.stats().memo_hits, 1);
        assert_eq!(state.stats().memo_entries, 1);
    }

    #[test]
    fn test_sequence_restores_position_on_failure() {
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        let pair = b.add("pair", seq(vec![lit("a"), lit("b")]));
        let either = b.add("either", choice(vec![rule(pair), lit("a")]));
        let grammar = b.build().unwrap();
        let mut state = ParserState::new(&grammar, "ac", ());

        let value = state.apply(either).unwrap();
        assert_eq!(state.text(&value), "a");
        assert_eq!(state.pos(), 1);
    }

    #[test]
    fn test_repeat_and_optional_never_fail() {
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        let many = b.add("many", repeat(lit("x")));
        let maybe = b.add("maybe", optional(lit("y")));
        let grammar = b.build().unwrap();
        let mut state = ParserState::new(&grammar, "xxxz", ());

        assert!(state.apply(many).is_some());
        assert_eq!(state.pos(), 3);
        assert!(state.apply(maybe).is_some());
        assert_eq!(state.pos(), 3);
    }

    #[test]
    fn test_not_consumes_nothing_and_is_not_a_diagnostic() {
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        let kw = b.add("kw", lit("end"));
        let ident = b.add("ident", seq(vec![not(rule(kw)), pattern("[a-z]+")]));
        let grammar = b.build().unwrap();

        let mut state = ParserState::new(&grammar, "ending", ());
        assert!(state.apply(ident).is_none());
        assert_eq!(state.pos(), 0);
        assert_eq!(state.failure().map(|f| f.rule), Some("ident".to_string()));

        let mut state = ParserState::new(&grammar, "begin", ());
        assert!(state.apply(ident).is_some());
        assert!(state.failure().is_none());
    }

    #[test]
    fn test_predicate_sees_labels_and_context() {
        fn matches_context(caps: &Captures<'_>, expected: &String) -> bool {
            caps.get("word") == Some(expected.as_str())
        }
        let mut b: GrammarBuilder<String> = GrammarBuilder::new();
        let word = b.add(
            "word",
            seq(vec![
                label("word", pattern("[A-Z]+")),
                predicate(matches_context),
            ]),
        );
        let grammar = b.build().unwrap();

        let mut state = ParserState::new(&grammar, "EOS", "EOS".to_string());
        assert!(state.apply(word).is_some());
        let mut state = ParserState::new(&grammar, "EOF", "EOS".to_string());
        assert!(state.apply(word).is_none());
    }

    #[test]
    fn test_failed_branch_discards_labels() {
        fn join(caps: &Captures<'_>, _cx: &mut ()) -> String {
            format!("{:?}/{:?}", caps.get("a"), caps.get("b"))
        }
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        let root = b.declare("root");
        b.define_with_action(
            root,
            choice(vec![
                seq(vec![label("a", lit("x")), lit("!")]),
                label("b", lit("x")),
            ]),
            join,
        );
        let grammar = b.build().unwrap();
        let mut state = ParserState::new(&grammar, "x", ());
        let value = state.apply(root).unwrap();
        assert_eq!(state.text(&value), "None/Some(\"x\")");
    }

    #[test]
    fn test_furthest_failure_is_reported() {
        let mut b: GrammarBuilder<()> = GrammarBuilder::new();
        let eol = b.add("eol", lit("\n"));
        let line = b.add("line", seq(vec![pattern("[a-z]*"), rule(eol)]));
        let lines = b.add("lines", seq(vec![repeat(rule(line)), not(pattern("(?s)."))]));
        let grammar = b.build().unwrap();

        let mut state = ParserState::new(&grammar, "ab\ncd", ());
        let err = state.parse(lines).unwrap_err();
        assert_eq!(err.rule, "eol");
        assert_eq!(err.offset, 5);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.to_string(), "line 2, column 3: failed rule 'eol'");
    }
}
