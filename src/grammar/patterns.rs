/// Keyword sets and regex sources for the line grammar
///
/// Regexes here are handed to [`crate::parser::pattern`], which anchors them
/// at the cursor; none of them may match across a newline unless noted.

/// Keywords that open a block when they start a line
pub const INDENT_KEYWORDS: &[&str] = &[
    "module", "class", "if", "until", "for", "unless", "while", "begin", "case", "then", "rescue",
    "def", "do",
];

/// Keywords that close a block
pub const OUTDENT_KEYWORD: &str = "end";

/// Keywords that sit one level out without closing the block
pub const DUAL_KEYWORDS: &[&str] = &["rescue", "ensure", "elsif", "else", "when"];

/// A character that would make a keyword part of a longer identifier
pub const IDENT_CHAR: &str = r"[A-Za-z0-9_?!]";

/// A whole word, or any single character that cannot open a literal
pub const WORD_OR_CHAR: &str = r#"[A-Za-z0-9_]+|[^\n"']"#;

/// Backslash escape outside a literal
pub const ESCAPE: &str = r"\\[^\n]";

/// Backslash escape inside a double-quoted literal (may escape a newline)
pub const DQ_ESCAPE: &str = r"(?s)\\.";

/// Comment to end of line
pub const COMMENT: &str = r"#[^\n]*";

// ===== INLINE BLOCK OPENERS =====

pub const DO_BLOCK: &str = r"do(?:[ \t]*\|[^|\n]+\|)?";
pub const BRACE_BLOCK: &str = r"\{[ \t]*\|[^|\n]+\|";
pub const OPEN_BRACKET: &str = r"[\[{]";

// ===== BRACKETS CLOSED ON THE SAME LINE =====

pub const BRACKET_END: &str = r"[^\[\n]*\]";
pub const BRACE_END: &str = r"[^{\n]*\}";

// ===== LITERALS =====

/// Body of a single-quoted literal; escapes are taken as a unit (spans newlines)
pub const SQ_BODY: &str = r"(?s)(?:[^'\\]|\\.)*";

/// Run inside a double-quoted literal that cannot start an interpolation,
/// an escape or the closing quote (spans newlines)
pub const DQ_RUN: &str = r#"[^"\\#]+"#;

/// Run inside an interpolation that cannot start a nested literal, a
/// nested brace group or the closing brace
pub const INTERP_RUN: &str = r#"[^{}'"\\]+"#;

/// Single character inside an interpolation that did not start anything
pub const INTERP_STRAY: &str = r#"['"\\{]"#;

// ===== HEREDOCS =====

pub const HEREDOC_START: &str = r"<<[-~]?";
pub const HEREDOC_LABEL: &str = r"[A-Z][A-Z0-9_]*";
pub const HEREDOC_AHEAD: &str = r"<<[-~]?[A-Z]";

/// Rest of a physical line, without its newline
pub const PHYSICAL_LINE: &str = r"[^\n]*";

pub const ANY_CHAR: &str = r"(?s).";

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn anchored(src: &str) -> Regex {
        Regex::new(&format!("^(?:{src})")).unwrap()
    }

    #[test]
    fn test_all_patterns_compile() {
        for src in [
            IDENT_CHAR,
            WORD_OR_CHAR,
            ESCAPE,
            DQ_ESCAPE,
            COMMENT,
            DO_BLOCK,
            BRACE_BLOCK,
            OPEN_BRACKET,
            BRACKET_END,
            BRACE_END,
            SQ_BODY,
            DQ_RUN,
            INTERP_RUN,
            INTERP_STRAY,
            HEREDOC_START,
            HEREDOC_LABEL,
            HEREDOC_AHEAD,
            PHYSICAL_LINE,
            ANY_CHAR,
        ] {
            assert!(Regex::new(src).is_ok(), "pattern failed to compile: {src}");
        }
    }

    #[test]
    fn test_do_block() {
        let re = anchored(DO_BLOCK);
        assert_eq!(re.find("do |i|").map(|m| m.end()), Some(6));
        assert_eq!(re.find("do |a, b|\n").map(|m| m.end()), Some(9));
        // Without parameters only the keyword is taken
        assert_eq!(re.find("do\n").map(|m| m.end()), Some(2));
        assert!(re.find("x do").is_none());
    }

    #[test]
    fn test_brace_block() {
        let re = anchored(BRACE_BLOCK);
        assert!(re.is_match("{|i|"));
        assert!(re.is_match("{ |k, v|"));
        assert!(!re.is_match("{ a: 1 }"));
    }

    #[test]
    fn test_word_or_char_takes_whole_words() {
        let re = anchored(WORD_OR_CHAR);
        assert_eq!(re.find("undo |x|").map(|m| m.end()), Some(4));
        assert_eq!(re.find(".each").map(|m| m.end()), Some(1));
        assert!(re.find("\n").is_none());
        assert!(re.find("\"x").is_none());
    }

    #[test]
    fn test_sq_body_keeps_escaped_quote() {
        let re = anchored(SQ_BODY);
        assert_eq!(re.find(r"it\'s' rest").map(|m| m.end()), Some(5));
        assert_eq!(re.find("' rest").map(|m| m.end()), Some(0));
    }

    #[test]
    fn test_heredoc_ahead() {
        let re = anchored(HEREDOC_AHEAD);
        assert!(re.is_match("<<EOS"));
        assert!(re.is_match("<<-EOS"));
        assert!(re.is_match("<<~SQL"));
        assert!(!re.is_match("<< EOS"));
        assert!(!re.is_match("<<eos"));
    }

    #[test]
    fn test_bracket_end_stays_on_line() {
        let re = anchored(BRACKET_END);
        assert!(re.is_match("1, 2]"));
        assert!(!re.is_match("1,\n2]"));
        assert!(!re.is_match("[1]"));
    }
}
