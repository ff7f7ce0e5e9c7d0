//! Inline directive parsing for `# rbeautify:` comments
//!
//! Supports in-file configuration overrides via special comments:
//! `# rbeautify: --indent 4` or `# rbeautify: --no-indent`

use std::io::BufReader;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::Result;

/// Pattern to match rbeautify directives
static RBEAUTIFY_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#\s*rbeautify:\s*(.*?)\s*$")
        .unwrap_or_else(|_| panic!("Invalid directive regex"))
});

/// Parsed directive options that can override config
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectiveOverrides {
    /// Spaces per level
    pub indent: Option<usize>,
    /// Indent with tabs
    pub tabs: Option<bool>,
    pub impose_indent: Option<bool>,
}

impl DirectiveOverrides {
    /// Check if any overrides are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indent.is_none() && self.tabs.is_none() && self.impose_indent.is_none()
    }

    /// Apply the overrides to `config`; `source` names the document in logs
    pub fn apply_to(&self, config: &mut Config, source: &str) {
        if let Some(width) = self.indent {
            debug!(source, width, "directive override: indent");
            config.set_indent_width(width);
        }
        if self.tabs == Some(true) {
            debug!(source, "directive override: tabs");
            config.set_tabs();
        }
        if let Some(impose_indent) = self.impose_indent {
            debug!(source, impose_indent, "directive override: impose_indent");
            config.impose_indent = impose_indent;
        }
    }
}

/// Check if a line contains an rbeautify directive
#[must_use]
pub fn is_directive_line(line: &str) -> bool {
    RBEAUTIFY_DIRECTIVE_RE.is_match(line)
}

/// Parse an rbeautify directive line and return option overrides
///
/// # Returns
/// * `Some(DirectiveOverrides)` if the line is a directive with at least one known option
/// * `None` otherwise
#[must_use]
pub fn parse_directive(line: &str) -> Option<DirectiveOverrides> {
    let caps = RBEAUTIFY_DIRECTIVE_RE.captures(line)?;
    let args_str = caps.get(1)?.as_str();
    parse_directive_args(args_str)
}

/// Parse directive arguments into overrides
fn parse_directive_args(args_str: &str) -> Option<DirectiveOverrides> {
    let mut overrides = DirectiveOverrides::default();
    let mut tokens = args_str.split_whitespace();

    while let Some(token) = tokens.next() {
        match token {
            "-i" | "--indent" => {
                overrides.indent = tokens.next().and_then(|t| t.parse().ok());
            }
            "-t" | "--tabs" => {
                overrides.tabs = Some(true);
            }
            "--no-indent" | "--disable-indent" => {
                overrides.impose_indent = Some(false);
            }
            "--enable-indent" => {
                overrides.impose_indent = Some(true);
            }
            _ => {
                // Unknown option, skip
            }
        }
    }

    if overrides.is_empty() {
        None
    } else {
        Some(overrides)
    }
}

/// Scan input for rbeautify directives and return the first found
///
/// Only the first directive is used (subsequent ones are ignored).
pub fn find_directive<R: std::io::BufRead>(input: &mut R) -> Option<DirectiveOverrides> {
    let mut buffer = String::new();

    while input.read_line(&mut buffer).ok()? > 0 {
        if is_directive_line(&buffer) {
            return parse_directive(&buffer);
        }
        buffer.clear();
    }

    None
}

/// `config` as adjusted by the first directive in `contents`
///
/// The adjusted settings are validated again, so a directive cannot smuggle
/// in an indent unit the command line would have refused.
pub fn effective_config(config: &Config, contents: &[u8], source: &str) -> Result<Config> {
    let mut effective = config.clone();
    if let Some(overrides) = find_directive(&mut BufReader::new(contents)) {
        debug!(source, "found file directive");
        overrides.apply_to(&mut effective, source);
        if let Some(problem) = effective.validate() {
            anyhow::bail!("{source}: invalid directive: {problem}");
        }
    }
    Ok(effective)
}
