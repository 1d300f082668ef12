//! Node labels and their expansion state.
//!
//! An opener node's label has two canonical forms: the expanded form is the
//! original line, the collapsed form appends an ellipsis and the matching
//! closing bracket, e.g. `resource "x" {` <-> `resource "x" {...}`.

use std::borrow::Cow;

/// Collapsed suffixes as they appear at the end of a collapsed label.
pub const COLLAPSED_FORMS: [&str; 3] = ["(...)", "[...]", "{...}"];

/// Bracket kind that opened a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    Paren,
    Square,
    Curly,
}

impl Bracket {
    pub fn from_open(c: char) -> Option<Self> {
        match c {
            '(' => Some(Self::Paren),
            '[' => Some(Self::Square),
            '{' => Some(Self::Curly),
            _ => None,
        }
    }

    /// Bracket that ends `line`, if any.
    pub fn trailing(line: &str) -> Option<Self> {
        line.chars().last().and_then(Self::from_open)
    }

    /// Text appended to an expanded label to collapse it.
    pub fn ellipsis(self) -> &'static str {
        match self {
            Self::Paren => "...)",
            Self::Square => "...]",
            Self::Curly => "...}",
        }
    }
}

/// Collapsed form of `expanded`: appends the bracket-specific ellipsis if the
/// text ends with an opening bracket, otherwise returns it unchanged.
pub fn collapsed_text(expanded: &str) -> String {
    match Bracket::trailing(expanded) {
        Some(bracket) => format!("{expanded}{}", bracket.ellipsis()),
        None => expanded.to_string(),
    }
}

/// Expanded form of `collapsed`: strips a trailing `...)`, `...]` or `...}`
/// that follows its opening bracket, otherwise returns it unchanged.
pub fn expanded_text(collapsed: &str) -> String {
    for form in COLLAPSED_FORMS {
        if let Some(stripped) = collapsed.strip_suffix(form) {
            // keep the opening bracket
            return format!("{stripped}{}", &form[..1]);
        }
    }
    collapsed.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    Expanded,
    Collapsed,
}

impl Expansion {
    fn flipped(self) -> Self {
        match self {
            Self::Expanded => Self::Collapsed,
            Self::Collapsed => Self::Expanded,
        }
    }
}

/// Text of a node together with its display state.
///
/// The stored text is never rewritten; [`Label::display`] projects it to the
/// form matching the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// Content line or prompt; always displayed as is.
    Plain(String),
    /// Block opener; starts collapsed.
    Block {
        text: String,
        bracket: Bracket,
        state: Expansion,
    },
}

impl Label {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    pub fn block(text: impl Into<String>, bracket: Bracket) -> Self {
        Self::Block {
            text: text.into(),
            bracket,
            state: Expansion::Collapsed,
        }
    }

    /// Original line, independent of state.
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Block { text, .. } => text,
        }
    }

    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Self::Plain(text) => Cow::Borrowed(text),
            Self::Block {
                text,
                state: Expansion::Expanded,
                ..
            } => Cow::Borrowed(text),
            Self::Block {
                text,
                bracket,
                state: Expansion::Collapsed,
            } => Cow::Owned(format!("{text}{}", bracket.ellipsis())),
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// Plain labels report `false`: they have nothing to expand.
    pub fn is_expanded(&self) -> bool {
        matches!(
            self,
            Self::Block {
                state: Expansion::Expanded,
                ..
            }
        )
    }

    /// Flips a block between expanded and collapsed. No-op for plain labels.
    pub fn toggle(&mut self) {
        if let Self::Block { state, .. } = self {
            *state = state.flipped();
        }
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        if self.is_block() && self.is_expanded() != expanded {
            self.toggle();
        }
    }
}
