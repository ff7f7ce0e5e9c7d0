/// Structural line rules and their indentation actions
///
/// A line is tried against each [`LineShape`] in priority order; the first
/// shape that matches up to and including the newline decides how the line
/// moves the depth. Matching is purely lexical: keywords count only at the
/// start of a line, and block openers and open brackets only at its end.
use tracing::trace;

use super::literals::{closing, LiteralRules};
use super::patterns::{
    BRACE_BLOCK, BRACE_END, BRACKET_END, DO_BLOCK, DUAL_KEYWORDS, ESCAPE, HEREDOC_AHEAD,
    IDENT_CHAR, INDENT_KEYWORDS, OPEN_BRACKET, OUTDENT_KEYWORD, WORD_OR_CHAR,
};
use super::types::LineShape;
use super::Lexical;
use crate::format::Indenter;
use crate::parser::{
    and, choice, label, lit, not, optional, pattern, repeat, rule, seq, Action, Captures, Expr,
    GrammarBuilder, RuleId,
};

/// Rule ids the driver and tests need
#[derive(Debug, Clone)]
pub struct LineRules {
    /// Any one line, shapes tried in priority order
    pub line: RuleId,
    /// Line content up to, not including, its structural tail
    pub rest: RuleId,
    /// Like `rest`, also stopping before a heredoc start
    pub lead: RuleId,
    /// Everything up to the newline
    pub text: RuleId,
    /// One rule per shape, in priority order
    pub shapes: Vec<(LineShape, RuleId)>,
}

/// `word` as a whole token
///
/// Not followed by an identifier character, nor by a single `:` (which
/// makes it a hash key such as `class:`; `Foo::Bar` stays a keyword).
fn keyword(word: &'static str) -> Expr<Indenter> {
    seq(vec![
        lit(word),
        not(pattern(IDENT_CHAR)),
        not(seq(vec![lit(":"), not(lit(":"))])),
    ])
}

fn keywords(words: &[&'static str]) -> Expr<Indenter> {
    choice(words.iter().map(|&w| keyword(w)).collect())
}

/// Line content up to the newline, never entering a structure `stop` matches
fn scan(lex: &Lexical, lits: &LiteralRules, stop: Option<RuleId>) -> Expr<Indenter> {
    let word = match stop {
        Some(stop) => seq(vec![not(rule(stop)), pattern(WORD_OR_CHAR)]),
        None => pattern(WORD_OR_CHAR),
    };
    repeat(choice(vec![
        pattern(ESCAPE),
        rule(lex.comment),
        rule(lits.dq_string),
        rule(lits.sq_string),
        word,
    ]))
}

/// Add the line rules to `builder`
pub fn define(
    builder: &mut GrammarBuilder<Indenter>,
    lex: &Lexical,
    lits: &LiteralRules,
) -> LineRules {
    let block_opener = builder.add(
        "block_opener",
        choice(vec![pattern(DO_BLOCK), pattern(BRACE_BLOCK)]),
    );
    let tail = |opener: Expr<Indenter>| {
        seq(vec![
            opener,
            rule(lex.spacing),
            optional(rule(lex.comment)),
            and(rule(lex.eol)),
        ])
    };
    let block_tail = builder.add("block_tail", tail(rule(block_opener)));
    let bracket_tail = builder.add("bracket_tail", tail(pattern(OPEN_BRACKET)));
    let any_tail = builder.add(
        "any_tail",
        choice(vec![rule(block_tail), rule(bracket_tail)]),
    );
    let lead_stop = builder.add(
        "lead_stop",
        choice(vec![rule(any_tail), pattern(HEREDOC_AHEAD)]),
    );

    let rest = builder.add("rest", scan(lex, lits, Some(any_tail)));
    let lead = builder.add("lead", scan(lex, lits, Some(lead_stop)));
    let text = builder.add("text", scan(lex, lits, None));

    let eol = || rule(lex.eol);
    let mut shapes = Vec::with_capacity(LineShape::ALL.len());
    for shape in LineShape::ALL {
        let body = match shape {
            LineShape::IndentOpen => seq(vec![keywords(INDENT_KEYWORDS), rule(rest), eol()]),
            LineShape::Outdent => seq(vec![keyword(OUTDENT_KEYWORD), rule(rest), eol()]),
            LineShape::Dual => seq(vec![keywords(DUAL_KEYWORDS), rule(rest), eol()]),
            LineShape::BracketSameLine => seq(vec![
                choice(vec![
                    seq(vec![lit("["), pattern(BRACKET_END)]),
                    seq(vec![lit("{"), pattern(BRACE_END)]),
                ]),
                rule(rest),
                eol(),
            ]),
            LineShape::BracketOpen => {
                seq(vec![choice(vec![lit("["), lit("{")]), rule(rest), eol()])
            }
            LineShape::BracketClose => {
                seq(vec![choice(vec![lit("]"), lit("}")]), rule(rest), eol()])
            }
            LineShape::BlockOpener => seq(vec![rule(lead), rule(block_tail), eol()]),
            LineShape::BracketTail => seq(vec![rule(lead), rule(bracket_tail), eol()]),
            LineShape::HeredocIntro => seq(vec![
                label(
                    "head",
                    seq(vec![
                        rule(lead),
                        rule(lits.heredoc_start),
                        rule(lits.heredoc_label),
                        // A second `<<` on the line is plain text
                        rule(rest),
                        optional(label("opener", rule(any_tail))),
                    ]),
                ),
                eol(),
                label("body", rule(lits.heredoc_body)),
                closing(lits.heredoc_terminator),
                eol(),
            ]),
            LineShape::Plain => seq(vec![rule(text), eol()]),
        };
        let id = builder.declare(shape.rule_name());
        builder.define_with_action(id, body, action_for(shape));
        shapes.push((shape, id));
    }

    let line = builder.add(
        "line",
        choice(shapes.iter().map(|&(_, id)| rule(id)).collect()),
    );

    LineRules {
        line,
        rest,
        lead,
        text,
        shapes,
    }
}

fn action_for(shape: LineShape) -> Action<Indenter> {
    match shape {
        LineShape::IndentOpen => indent_open,
        LineShape::Outdent => outdent,
        LineShape::Dual => dual,
        LineShape::BracketSameLine => bracket_same_line,
        LineShape::BracketOpen => bracket_open,
        LineShape::BracketClose => bracket_close,
        LineShape::BlockOpener => block_opener,
        LineShape::BracketTail => bracket_tail,
        LineShape::HeredocIntro => heredoc,
        LineShape::Plain => plain,
    }
}

fn traced(shape: LineShape, cx: &Indenter, caps: &Captures<'_>) {
    trace!(
        %shape,
        depth = cx.depth(),
        offset = caps.start(),
        "line"
    );
}

fn indent_open(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::IndentOpen, cx, caps);
    cx.emit_open(caps.text())
}

fn outdent(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    let line = cx.emit_close(caps.text());
    traced(LineShape::Outdent, cx, caps);
    line
}

fn dual(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::Dual, cx, caps);
    cx.emit_dual(caps.text())
}

fn bracket_same_line(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::BracketSameLine, cx, caps);
    cx.emit_same(caps.text())
}

fn bracket_open(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::BracketOpen, cx, caps);
    cx.emit_open(caps.text())
}

fn bracket_close(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    let line = cx.emit_close(caps.text());
    traced(LineShape::BracketClose, cx, caps);
    line
}

fn block_opener(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::BlockOpener, cx, caps);
    cx.emit_open(caps.text())
}

fn bracket_tail(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::BracketTail, cx, caps);
    cx.emit_open(caps.text())
}

fn heredoc(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::HeredocIntro, cx, caps);
    let head = caps.get("head").unwrap_or_default();
    let body = caps.get("body").unwrap_or_default();
    let terminator = cx.release_label().unwrap_or_default();
    let text = cx.emit_heredoc(head, body, &terminator);
    // `expect(<<~EOS) do |x|` opens its block after the terminator
    if caps.get("opener").is_some() {
        cx.open_level();
    }
    text
}

fn plain(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    traced(LineShape::Plain, cx, caps);
    cx.emit_same(caps.text())
}
