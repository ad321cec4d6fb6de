use crate::region::Region;
use serde::Serialize;
use std::fmt::Display;

/// The language a [`Fragment`] is written in.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum Kind {
    /// Source-language markup, handed to the markup parser.
    Markup,
    /// Plain CSS from a `style` block.
    Stylesheet,
    /// Plain JavaScript from a `script` block.
    Script,
    /// Script-extension syntax from a `script` block, with the literal
    /// script between triggers replaced by placeholder markers.
    ScriptExtension,
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Markup => write!(f, "markup"),
            Kind::Stylesheet => write!(f, "stylesheet"),
            Kind::Script => write!(f, "script"),
            Kind::ScriptExtension => write!(f, "script extension"),
        }
    }
}

/// A typed, positioned slice of source text.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Fragment {
    /// The language of the content.
    pub kind: Kind,
    /// Text belonging to this fragment.
    pub content: String,
    /// Area of the source the fragment was taken from.
    ///
    /// The two fragments produced from a `script` block with extension
    /// syntax both span the whole block body.
    pub region: Region,
    /// Line of the first byte, starting at 1.
    pub start_line: usize,
    /// Line on which the fragment ends.
    pub end_line: usize,
    /// Markup brace depth of the enclosing block, 0 for top-level blocks
    /// and for markup itself.
    pub depth: usize,
    /// Placeholder markers whose literal text this fragment concatenates.
    ///
    /// Only the [`Kind::Script`] fragment lifted out of a block that also
    /// produced a [`Kind::ScriptExtension`] fragment has markers.
    pub markers: Vec<String>,
}

impl Fragment {
    /// Create a new [`Fragment`] over the given region of the source.
    pub(crate) fn new(kind: Kind, source: &str, region: Region, start_line: usize) -> Self {
        let content = source[region].to_string();
        let end_line = start_line + count_lines(&content);

        Self {
            kind,
            content,
            region,
            start_line,
            end_line,
            depth: 0,
            markers: vec![],
        }
    }

    /// Set the depth, returning the [`Fragment`].
    pub(crate) fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;

        self
    }

    /// Return true if the content of this [`Fragment`] is also reachable
    /// through the placeholders of a [`Kind::ScriptExtension`] fragment.
    pub fn is_lifted(&self) -> bool {
        !self.markers.is_empty()
    }
}

/// Return the number of line breaks in the given text.
pub(crate) fn count_lines(text: &str) -> usize {
    text.bytes().filter(|byte| *byte == b'\n').count()
}
