/// `Indenter` - depth tracker and line emitter
///
/// Holds the per-document state the line grammar's actions mutate: the
/// current depth, the heredoc terminator waiting to be matched, and the
/// accumulated output. Every rendered line gets `unit` repeated `depth`
/// times in front of it.

/// Depth counter plus output buffer for one document
#[derive(Debug, Clone)]
pub struct Indenter {
    /// Indent string repeated once per depth level
    unit: String,
    /// Currently open blocks; not clamped, so unmatched closers drive it negative
    depth: i64,
    /// Terminator label of the heredoc being read, if any
    heredoc_label: Option<String>,
    /// Emitted lines so far
    output: String,
}

impl Indenter {
    /// Create an `Indenter` at depth 0
    #[must_use]
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            depth: 0,
            heredoc_label: None,
            output: String::new(),
        }
    }

    #[must_use]
    pub fn depth(&self) -> i64 {
        self.depth
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Indent prefix for `depth`; empty when depth is zero or negative
    #[must_use]
    pub fn prefix(&self, depth: i64) -> String {
        self.unit.repeat(usize::try_from(depth).unwrap_or(0))
    }

    /// Prefix `text` for `depth`, leaving lines without content unprefixed
    #[must_use]
    pub fn render(&self, depth: i64, text: &str) -> String {
        if text.trim_end_matches(['\n', '\r']).is_empty() {
            return text.to_string();
        }
        let mut line = self.prefix(depth);
        line.push_str(text);
        line
    }

    /// Emit at the current depth
    #[must_use]
    pub fn emit_same(&self, text: &str) -> String {
        self.render(self.depth, text)
    }

    /// Emit at the current depth, then open a level
    pub fn emit_open(&mut self, text: &str) -> String {
        let line = self.render(self.depth, text);
        self.depth += 1;
        line
    }

    /// Close a level, then emit at the new depth
    pub fn emit_close(&mut self, text: &str) -> String {
        self.depth -= 1;
        self.render(self.depth, text)
    }

    /// Emit one level out without changing the depth
    #[must_use]
    pub fn emit_dual(&self, text: &str) -> String {
        self.render(self.depth - 1, text)
    }

    /// Emit a heredoc: the introducing line at the current depth, the body
    /// verbatim, and the terminator realigned to the current depth
    #[must_use]
    pub fn emit_heredoc(&self, head: &str, body: &str, terminator: &str) -> String {
        let mut out = self.render(self.depth, head);
        out.push('\n');
        out.push_str(body);
        out.push_str(&self.render(self.depth, terminator));
        out.push('\n');
        out
    }

    /// Open a level without emitting anything
    pub fn open_level(&mut self) {
        self.depth += 1;
    }

    /// Remember the terminator of a heredoc that was just opened
    pub fn remember_label(&mut self, label: &str) {
        self.heredoc_label = Some(label.to_string());
    }

    #[must_use]
    pub fn heredoc_label(&self) -> Option<&str> {
        self.heredoc_label.as_deref()
    }

    /// Forget the active terminator once its heredoc is closed
    pub fn release_label(&mut self) -> Option<String> {
        self.heredoc_label.take()
    }

    /// Append an emitted line to the document
    pub fn push(&mut self, text: &str) {
        self.output.push_str(text);
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }
}

impl Default for Indenter {
    fn default() -> Self {
        Self::new("  ")
    }
}
