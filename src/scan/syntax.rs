use morel::Syntax;

/// Script-extension keywords recognized inside every `script` block.
pub const KEYWORDS: [&str; 8] = [
    "listen",
    "delegate",
    "animate",
    "vir",
    "router",
    "fileloader",
    "util",
    "ScriptLoader",
];

/// Opening marker of an enhanced element selector, `{{ box }}`.
pub const SELECTOR_OPEN: &str = "{{";

/// Closing marker of an enhanced element selector.
pub const SELECTOR_CLOSE: &str = "}}";

/// Default prefix of the placeholder markers that stand in for literal script text.
pub const PLACEHOLDER_PREFIX: &str = "_CHTL_SCRIPT_";

/// Markers that identify script-extension syntax within a `script` block.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Trigger {
    /// Beginning of an enhanced selector, `{{` by default.
    Selector,
    /// One of the extension keywords, identified by its position in the
    /// keyword list of the [`Builder`] that produced the `Syntax`.
    Keyword(usize),
}

impl From<usize> for Trigger {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::Selector,
            n => Self::Keyword(n - 1),
        }
    }
}

impl From<Trigger> for usize {
    fn from(trigger: Trigger) -> Self {
        match trigger {
            Trigger::Selector => 0,
            Trigger::Keyword(n) => n + 1,
        }
    }
}

/// Provides methods to configure a [`Scanner`][`super::Scanner`].
///
/// # Example
///
/// ```
/// use chtl::{Builder, Scanner};
///
/// let scanner = Scanner::new(
///     Builder::new()
///         .with_placeholder_prefix("__JS_")
///         .with_keyword("printMylove"),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    prefix: String,
    keywords: Vec<String>,
}

impl Builder {
    /// Create a new [`Builder`].
    ///
    /// The `Builder` starts with the default placeholder prefix and the
    /// default extension keywords:
    ///
    /// ```text
    /// Prefix: _CHTL_SCRIPT_
    /// Keywords: listen, delegate, animate, vir, router, fileloader, util,
    ///           ScriptLoader
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            prefix: PLACEHOLDER_PREFIX.to_string(),
            keywords: KEYWORDS.iter().map(|keyword| keyword.to_string()).collect(),
        }
    }

    /// Set the placeholder prefix.
    ///
    /// An empty prefix is ignored.
    #[inline]
    pub fn set_placeholder_prefix(&mut self, prefix: &str) {
        if !prefix.is_empty() {
            self.prefix = prefix.to_string();
        }
    }

    /// Set the placeholder prefix.
    ///
    /// Returns the [`Builder`], so additional methods may be chained.
    #[inline]
    pub fn with_placeholder_prefix(mut self, prefix: &str) -> Self {
        self.set_placeholder_prefix(prefix);

        self
    }

    /// Add an extension keyword.
    ///
    /// Keywords that are empty, already known, or not a valid identifier
    /// are ignored.
    pub fn add_keyword(&mut self, keyword: &str) {
        let mut chars = keyword.chars();
        let is_identifier = chars.next().is_some_and(super::is_ident_start)
            && chars.all(super::is_ident_continue);

        if is_identifier && !self.keywords.iter().any(|known| known == keyword) {
            self.keywords.push(keyword.to_string());
        }
    }

    /// Add an extension keyword.
    ///
    /// Returns the [`Builder`], so additional methods may be chained.
    #[inline]
    pub fn with_keyword(mut self, keyword: &str) -> Self {
        self.add_keyword(keyword);

        self
    }

    /// Return the placeholder prefix.
    pub fn placeholder_prefix(&self) -> &str {
        &self.prefix
    }

    /// Return the extension keywords, in [`Trigger::Keyword`] order.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Return a Syntax instance from the triggers in this [`Builder`].
    pub fn to_syntax(&self) -> Syntax {
        let mut markers = Vec::new();

        markers.push((Trigger::Selector.into(), SELECTOR_OPEN.to_string()));
        for (n, keyword) in self.keywords.iter().enumerate() {
            markers.push((Trigger::Keyword(n).into(), keyword.clone()));
        }

        Syntax::new(markers)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
