/// Literal-region rules: quoted strings, interpolation and heredocs
///
/// Everything matched here is copied to the output untouched. The line
/// rules only need to know where a literal ends so that brackets, keywords
/// and comment markers inside it are not mistaken for structure.
use super::patterns::{
    DQ_ESCAPE, DQ_RUN, HEREDOC_LABEL, HEREDOC_START, INTERP_RUN, INTERP_STRAY, PHYSICAL_LINE,
    SQ_BODY,
};
use super::Lexical;
use crate::format::Indenter;
use crate::parser::{
    and, choice, label, lit, not, pattern, predicate, repeat, rule, seq, Captures, Expr,
    GrammarBuilder, RuleId,
};

/// Rule ids of the literal rules the line grammar refers to
#[derive(Debug, Clone, Copy)]
pub struct LiteralRules {
    pub sq_string: RuleId,
    pub dq_string: RuleId,
    pub heredoc_start: RuleId,
    pub heredoc_label: RuleId,
    pub heredoc_body: RuleId,
    pub heredoc_terminator: RuleId,
}

/// Add the literal rules to `builder`
pub fn define(builder: &mut GrammarBuilder<Indenter>, lex: &Lexical) -> LiteralRules {
    let sq_string = builder.add(
        "sq_string",
        seq(vec![lit("'"), pattern(SQ_BODY), lit("'")]),
    );

    let dq_string = builder.declare("dq_string");
    let interp_part = builder.declare("interp_part");

    let brace_group = builder.add(
        "brace_group",
        seq(vec![lit("{"), repeat(rule(interp_part)), lit("}")]),
    );
    builder.define(
        interp_part,
        choice(vec![
            rule(sq_string),
            rule(dq_string),
            lit("\\}"),
            rule(brace_group),
            pattern(INTERP_RUN),
            pattern(INTERP_STRAY),
        ]),
    );

    let interpolation = builder.add(
        "interpolation",
        seq(vec![lit("#{"), repeat(rule(interp_part)), lit("}")]),
    );
    let dq_part = builder.add(
        "dq_part",
        choice(vec![
            rule(interpolation),
            pattern(DQ_ESCAPE),
            pattern(DQ_RUN),
            lit("#"),
        ]),
    );
    builder.define(
        dq_string,
        seq(vec![lit("\""), repeat(rule(dq_part)), lit("\"")]),
    );

    let heredoc_start = builder.add("heredoc_start", pattern(HEREDOC_START));

    let heredoc_label = builder.declare("heredoc_label");
    builder.define_with_action(heredoc_label, pattern(HEREDOC_LABEL), remember_label);

    // The label is checked against the active one outside the rule, so the
    // memoized match stays valid whichever heredoc is open
    let heredoc_terminator = builder.add(
        "heredoc_terminator",
        seq(vec![
            rule(lex.spacing),
            pattern(HEREDOC_LABEL),
            rule(lex.spacing),
            and(choice(vec![rule(lex.eol), rule(lex.eof)])),
        ]),
    );

    let physical_line = builder.add(
        "physical_line",
        seq(vec![pattern(PHYSICAL_LINE), rule(lex.eol)]),
    );
    let heredoc_body = builder.add(
        "heredoc_body",
        repeat(seq(vec![
            not(closing(heredoc_terminator)),
            rule(physical_line),
        ])),
    );

    LiteralRules {
        sq_string,
        dq_string,
        heredoc_start,
        heredoc_label,
        heredoc_body,
        heredoc_terminator,
    }
}

fn remember_label(caps: &Captures<'_>, cx: &mut Indenter) -> String {
    cx.remember_label(caps.text());
    caps.text().to_string()
}

/// The terminator line of the heredoc currently open
pub fn closing(terminator: RuleId) -> Expr<Indenter> {
    seq(vec![
        label("terminator", rule(terminator)),
        predicate(is_active_label),
    ])
}

fn is_active_label(caps: &Captures<'_>, cx: &Indenter) -> bool {
    caps.get("terminator")
        .map(|line| line.trim_matches([' ', '\t']))
        .is_some_and(|label| cx.heredoc_label() == Some(label))
}
