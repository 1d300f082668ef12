//! Domain entities: core data structures

/// One line of tool output.
///
/// `raw` has all ANSI escape codes removed and drives classification;
/// `decorated` is the line as received and is what gets displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub raw: String,
    pub decorated: String,
}

impl Line {
    /// Build a line from text as printed by the tool, colors included.
    pub fn from_colored(colored: impl Into<String>) -> Self {
        let decorated = colored.into();
        let raw = strip_ansi(&decorated);
        Self { raw, decorated }
    }
}

/// Remove ANSI escape sequences from `text`.
///
/// Tabs are kept: the stripper drops every control character but newline,
/// and a trailing tab must still keep a line from counting as an opener.
pub fn strip_ansi(text: &str) -> String {
    text.split('\t')
        .map(|part| String::from_utf8_lossy(&strip_ansi_escapes::strip(part.as_bytes())).into_owned())
        .collect::<Vec<_>>()
        .join("\t")
}
