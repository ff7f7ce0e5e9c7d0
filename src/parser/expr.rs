/// Grammar expressions, named rules and the builder that ties them together
///
/// A grammar is a flat list of named rules. Each rule owns one expression
/// tree; expressions refer to other rules by [`RuleId`], which keeps the
/// tree acyclic even when the grammar itself is recursive.
use std::collections::HashMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Index of a named rule inside its [`Grammar`]
pub type RuleId = usize;

/// Side condition checked against the current captures without consuming input
pub type Predicate<C> = fn(&Captures<'_>, &C) -> bool;

/// Semantic action run once when its rule succeeds; the returned text becomes
/// the rule's value
pub type Action<C> = fn(&Captures<'_>, &mut C) -> String;

/// Combinator expression interpreted by [`crate::parser::ParserState`]
pub enum Expr<C> {
    /// Exact string at the cursor
    Literal(&'static str),
    /// Regex anchored at the cursor
    Pattern(Regex),
    /// All children in order; fails atomically
    Sequence(Vec<Expr<C>>),
    /// First child that succeeds, in declaration order
    Choice(Vec<Expr<C>>),
    /// Zero or more, greedy; never fails
    Repeat(Box<Expr<C>>),
    /// Zero or one; never fails
    Optional(Box<Expr<C>>),
    /// Succeeds iff the child fails; never consumes
    Not(Box<Expr<C>>),
    /// Zero-width side condition
    Predicate(Predicate<C>),
    /// Binds the child's value under a name for the enclosing rule's action
    Label(&'static str, Box<Expr<C>>),
    /// Application of a named, memoized rule
    Rule(RuleId),
}

impl<C> fmt::Debug for Expr<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(s) => write!(f, "{s:?}"),
            Expr::Pattern(re) => {
                let src = re.as_str();
                let src = src
                    .strip_prefix("^(?:")
                    .and_then(|s| s.strip_suffix(')'))
                    .unwrap_or(src);
                write!(f, "/{src}/")
            }
            Expr::Sequence(items) => write_list(f, items, " "),
            Expr::Choice(items) => write_list(f, items, " | "),
            Expr::Repeat(inner) => write!(f, "{inner:?}*"),
            Expr::Optional(inner) => write!(f, "{inner:?}?"),
            Expr::Not(inner) => write!(f, "!{inner:?}"),
            Expr::Predicate(_) => write!(f, "&{{ .. }}"),
            Expr::Label(name, inner) => write!(f, "{inner:?}:{name}"),
            Expr::Rule(id) => write!(f, "<{id}>"),
        }
    }
}

fn write_list<C>(f: &mut fmt::Formatter<'_>, items: &[Expr<C>], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{item:?}")?;
    }
    write!(f, ")")
}

/// Build a regex anchored at the start of the haystack.
///
/// # Panics
///
/// Panics if the pattern is invalid. Patterns handed to the grammar are
/// compile-time constants that are exercised by the grammar tests.
fn anchored(pattern: &str) -> Regex {
    RegexBuilder::new(&format!("^(?:{pattern})"))
        .build()
        .unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

#[must_use]
pub fn lit<C>(s: &'static str) -> Expr<C> {
    Expr::Literal(s)
}

#[must_use]
pub fn pattern<C>(src: &str) -> Expr<C> {
    Expr::Pattern(anchored(src))
}

#[must_use]
pub fn seq<C>(items: Vec<Expr<C>>) -> Expr<C> {
    Expr::Sequence(items)
}

#[must_use]
pub fn choice<C>(items: Vec<Expr<C>>) -> Expr<C> {
    Expr::Choice(items)
}

#[must_use]
pub fn repeat<C>(inner: Expr<C>) -> Expr<C> {
    Expr::Repeat(Box::new(inner))
}

#[must_use]
pub fn optional<C>(inner: Expr<C>) -> Expr<C> {
    Expr::Optional(Box::new(inner))
}

#[must_use]
pub fn not<C>(inner: Expr<C>) -> Expr<C> {
    Expr::Not(Box::new(inner))
}

/// Positive lookahead
#[must_use]
pub fn and<C>(inner: Expr<C>) -> Expr<C> {
    not(not(inner))
}

#[must_use]
pub fn predicate<C>(check: Predicate<C>) -> Expr<C> {
    Expr::Predicate(check)
}

#[must_use]
pub fn label<C>(name: &'static str, inner: Expr<C>) -> Expr<C> {
    Expr::Label(name, Box::new(inner))
}

#[must_use]
pub fn rule<C>(id: RuleId) -> Expr<C> {
    Expr::Rule(id)
}

/// A named production
pub struct Rule<C> {
    pub name: &'static str,
    pub expr: Expr<C>,
    pub action: Option<Action<C>>,
}

/// Immutable set of rules shared by every parse over it
pub struct Grammar<C> {
    rules: Vec<Rule<C>>,
}

impl<C> Grammar<C> {
    #[must_use]
    pub fn rule(&self, id: RuleId) -> &Rule<C> {
        &self.rules[id]
    }

    #[must_use]
    pub fn name(&self, id: RuleId) -> &'static str {
        self.rules[id].name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up a rule by name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<RuleId> {
        self.rules.iter().position(|r| r.name == name)
    }

    /// Render a rule as `name = expression`, with rule references resolved
    #[must_use]
    pub fn render(&self, id: RuleId) -> String {
        let mut body = format!("{:?}", self.rules[id].expr);
        // Replace `<id>` references, longest ids first so `<1>` does not eat `<12>`
        let mut ids: Vec<RuleId> = (0..self.rules.len()).collect();
        ids.sort_by_key(|i| std::cmp::Reverse(i.to_string().len()));
        for other in ids {
            body = body.replace(&format!("<{other}>"), self.rules[other].name);
        }
        format!("{} = {}", self.rules[id].name, body)
    }
}

/// Errors raised while assembling a grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("rule '{0}' declared twice")]
    Duplicate(&'static str),

    #[error("rule '{0}' declared but never defined")]
    Undefined(&'static str),

    #[error("rule '{0}' defined twice")]
    Redefined(&'static str),
}

/// Two-phase grammar construction: declare names first, then define bodies,
/// so rules can refer to each other regardless of order.
pub struct GrammarBuilder<C> {
    names: Vec<&'static str>,
    index: HashMap<&'static str, RuleId>,
    bodies: Vec<Option<(Expr<C>, Option<Action<C>>)>>,
    errors: Vec<GrammarError>,
}

impl<C> Default for GrammarBuilder<C> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            index: HashMap::new(),
            bodies: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<C> GrammarBuilder<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a rule id for `name`
    pub fn declare(&mut self, name: &'static str) -> RuleId {
        if let Some(&id) = self.index.get(name) {
            self.errors.push(GrammarError::Duplicate(name));
            return id;
        }
        let id = self.names.len();
        self.names.push(name);
        self.index.insert(name, id);
        self.bodies.push(None);
        id
    }

    pub fn define(&mut self, id: RuleId, expr: Expr<C>) {
        self.set_body(id, expr, None);
    }

    pub fn define_with_action(&mut self, id: RuleId, expr: Expr<C>, action: Action<C>) {
        self.set_body(id, expr, Some(action));
    }

    /// Declare and define in one step
    pub fn add(&mut self, name: &'static str, expr: Expr<C>) -> RuleId {
        let id = self.declare(name);
        self.define(id, expr);
        id
    }

    fn set_body(&mut self, id: RuleId, expr: Expr<C>, action: Option<Action<C>>) {
        if self.bodies[id].is_some() {
            self.errors.push(GrammarError::Redefined(self.names[id]));
        }
        self.bodies[id] = Some((expr, action));
    }

    pub fn build(self) -> Result<Grammar<C>, GrammarError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        let mut rules = Vec::with_capacity(self.names.len());
        for (name, body) in self.names.into_iter().zip(self.bodies) {
            let (expr, action) = body.ok_or(GrammarError::Undefined(name))?;
            rules.push(Rule { name, expr, action });
        }
        Ok(Grammar { rules })
    }
}

/// Value produced by a successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Byte range of the input that was consumed
    Span(usize, usize),
    /// Text produced by an action
    Text(String),
}

impl Value {
    /// Resolve to text against the input the value was produced from
    #[must_use]
    pub fn as_str<'a>(&'a self, input: &'a str) -> &'a str {
        match self {
            Value::Span(start, end) => &input[*start..*end],
            Value::Text(text) => text,
        }
    }
}

/// Bindings visible to a rule's action and predicates
pub struct Captures<'a> {
    pub(crate) input: &'a str,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) labels: &'a [(&'static str, Value)],
}

impl<'a> Captures<'a> {
    /// Text consumed so far by the enclosing rule
    #[must_use]
    pub fn text(&self) -> &'a str {
        &self.input[self.start..self.end]
    }

    /// Most recent value bound under `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let input = self.input;
        self.labels
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str(input))
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }
}
