use std::fmt;

/// What a child step's label must be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelMatcher {
    /// Children carrying exactly this label
    Exact(String),
    /// `*`, any child
    Any,
}

impl LabelMatcher {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelMatcher::Exact(l) => l == label,
            LabelMatcher::Any => true,
        }
    }
}

/// Direction a selecting step moves in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Axis {
    /// `label` or `*`
    Child(LabelMatcher),
    /// `.`
    SelfNode,
    /// `..`
    Parent,
}

/// Left-hand side of a value comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `.` - the candidate's own value
    SelfValue,
    /// `name` - the value of any child labelled `name`
    Child(String),
}

/// A bracketed qualifier narrowing a step's candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[n]`, 1-based. `[0]` is legal and selects nothing.
    Position(u64),

    /// `[last()]` (`back == 0`) or `[last()-back]`
    Last { back: u64 },

    /// `[name='literal']`, `[.='literal']`, or with `!=` when `negated`
    ///
    /// Child comparisons are existential: the test holds when any child with
    /// that label has the literal as its value. A value-less node never
    /// equals a literal.
    Compare {
        operand: Operand,
        literal: String,
        negated: bool,
    },

    /// `[name]` - at least one child labelled `name` exists
    HasChild(String),
}

/// One step of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Selects existing nodes
    Select {
        axis: Axis,
        predicates: Vec<Predicate>,
    },

    /// `label[last()+1]` - a new trailing sibling labelled `label`
    ///
    /// Only ever the final step. Never resolved against existing nodes.
    Append { label: String, offset: usize },
}

impl Step {
    pub fn is_append(&self) -> bool {
        matches!(self, Step::Append { .. })
    }
}

/// A path expression compiled into steps.
///
/// Compiling never looks at a tree, so a compiled path can be kept and reused
/// against any number of trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPath {
    text: String,
    absolute: bool,
    steps: Vec<Step>,
}

impl CompiledPath {
    pub(crate) fn new(text: impl Into<String>, absolute: bool, steps: Vec<Step>) -> Self {
        CompiledPath {
            text: text.into(),
            absolute,
            steps,
        }
    }

    /// The source text the path was compiled from
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether the final step is an append marker
    pub fn is_append(&self) -> bool {
        self.steps.last().is_some_and(Step::is_append)
    }

    /// Anchor a relative path below `base`.
    ///
    /// Absolute paths are returned unchanged.
    pub fn rebase(&self, base: &CompiledPath) -> CompiledPath {
        if self.absolute {
            return self.clone();
        }
        let mut steps = base.steps.clone();
        steps.extend(self.steps.iter().cloned());
        let text = format!("{}/{}", base.text.trim_end_matches('/'), self.text);
        CompiledPath {
            text,
            absolute: base.absolute,
            steps,
        }
    }
}

impl fmt::Display for CompiledPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A path argument: either text still to be compiled, or a compiled path.
#[derive(Debug, Clone, Copy)]
pub enum PathRef<'a> {
    Text(&'a str),
    Compiled(&'a CompiledPath),
}

impl<'a> From<&'a str> for PathRef<'a> {
    fn from(text: &'a str) -> Self {
        PathRef::Text(text)
    }
}

impl<'a> From<&'a String> for PathRef<'a> {
    fn from(text: &'a String) -> Self {
        PathRef::Text(text.as_str())
    }
}

impl<'a> From<&'a CompiledPath> for PathRef<'a> {
    fn from(path: &'a CompiledPath) -> Self {
        PathRef::Compiled(path)
    }
}

impl PathRef<'_> {
    pub fn text(&self) -> &str {
        match self {
            PathRef::Text(t) => t,
            PathRef::Compiled(p) => p.text(),
        }
    }
}
