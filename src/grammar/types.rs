/// Line shapes recognized by the structural line grammar
use std::fmt;

/// Classification of one source line, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineShape {
    /// Block keyword at line start: emit, then open a level
    IndentOpen,
    /// `end`: close a level, then emit
    Outdent,
    /// `else`/`when`/...: emit one level out, depth unchanged
    Dual,
    /// `[`...`]` or `{`...`}` closed on the same line
    BracketSameLine,
    /// Line starting with an unclosed `[` or `{`
    BracketOpen,
    /// Line starting with `]` or `}`
    BracketClose,
    /// Content ending in `do |x|` or `{ |x|`
    BlockOpener,
    /// Content ending in an unclosed `[` or `{`
    BracketTail,
    /// Content introducing a heredoc; carries the body and terminator
    HeredocIntro,
    /// Anything else
    Plain,
}

impl LineShape {
    /// All shapes, highest priority first
    pub const ALL: [LineShape; 10] = [
        LineShape::IndentOpen,
        LineShape::Outdent,
        LineShape::Dual,
        LineShape::BracketSameLine,
        LineShape::BracketOpen,
        LineShape::BracketClose,
        LineShape::BlockOpener,
        LineShape::BracketTail,
        LineShape::HeredocIntro,
        LineShape::Plain,
    ];

    /// Name of the grammar rule matching this shape
    #[must_use]
    pub fn rule_name(self) -> &'static str {
        match self {
            LineShape::IndentOpen => "indent_line",
            LineShape::Outdent => "outdent_line",
            LineShape::Dual => "dual_line",
            LineShape::BracketSameLine => "bracket_same_line",
            LineShape::BracketOpen => "bracket_open_line",
            LineShape::BracketClose => "bracket_close_line",
            LineShape::BlockOpener => "block_line",
            LineShape::BracketTail => "bracket_tail_line",
            LineShape::HeredocIntro => "heredoc_line",
            LineShape::Plain => "plain_line",
        }
    }

    /// Depth change the shape applies after emitting its line
    #[must_use]
    pub fn depth_delta(self) -> i64 {
        match self {
            LineShape::IndentOpen
            | LineShape::BracketOpen
            | LineShape::BlockOpener
            | LineShape::BracketTail => 1,
            LineShape::Outdent | LineShape::BracketClose => -1,
            LineShape::Dual
            | LineShape::BracketSameLine
            | LineShape::HeredocIntro
            | LineShape::Plain => 0,
        }
    }
}

impl fmt::Display for LineShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineShape::IndentOpen => "INDENT",
            LineShape::Outdent => "OUTDENT",
            LineShape::Dual => "DUAL",
            LineShape::BracketSameLine => "BRACKET_SAME_LINE",
            LineShape::BracketOpen => "BRACKET_OPEN",
            LineShape::BracketClose => "BRACKET_CLOSE",
            LineShape::BlockOpener => "BLOCK",
            LineShape::BracketTail => "BRACKET_TAIL",
            LineShape::HeredocIntro => "HEREDOC",
            LineShape::Plain => "PLAIN",
        };
        write!(f, "{name}")
    }
}
