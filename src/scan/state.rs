/// The quoting and comment state of a scan position.
///
/// Anything other than [`ScanState::Normal`] is opaque: braces and keywords
/// inside it are never structural.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ScanState {
    /// Structural text.
    Normal,
    /// Inside `'...'`.
    InSingleQuoteString,
    /// Inside `"..."`.
    InDoubleQuoteString,
    /// Inside a script template literal, `` `...` ``.
    InTemplateLiteral,
    /// Inside `// ...`, up to the end of the line.
    InLineComment,
    /// Inside `/* ... */`.
    InBlockComment,
    /// Inside a stylesheet `url(...)`, which may hold `//` unquoted.
    InUrl,
}

/// The kind of text being walked, which decides the opaque runs it has.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Dialect {
    Markup,
    Stylesheet,
    Script,
}

impl ScanState {
    /// Return the state entered by the text at `offset`.
    ///
    /// Outside of script, a `//` directly after `:` is part of a URL scheme
    /// such as `https://`, not a comment.
    pub fn enter(source: &str, offset: usize, dialect: Dialect) -> Self {
        let bytes = source.as_bytes();
        let rest = &bytes[offset..];
        let after_colon = offset > 0 && bytes[offset - 1] == b':';

        match rest {
            [b'/', b'/', ..] if after_colon && dialect != Dialect::Script => Self::Normal,
            [b'/', b'/', ..] => Self::InLineComment,
            [b'/', b'*', ..] => Self::InBlockComment,
            [b'\'', ..] => Self::InSingleQuoteString,
            [b'"', ..] => Self::InDoubleQuoteString,
            [b'`', ..] if dialect == Dialect::Script => Self::InTemplateLiteral,
            [b'u' | b'U', b'r' | b'R', b'l' | b'L', b'(', ..]
                if dialect == Dialect::Stylesheet && !follows_word(source, offset) =>
            {
                Self::InUrl
            }
            _ => Self::Normal,
        }
    }

    /// Return the offset just past the opaque run that begins at `offset`,
    /// never going beyond `end`.
    ///
    /// An unterminated comment or template literal runs to `end`. An
    /// unterminated quoted string stops before the line break, so a stray
    /// apostrophe in markup text hides at most one line.
    pub fn leave(self, source: &str, offset: usize, end: usize) -> usize {
        let text = &source[..end];

        match self {
            Self::Normal => offset,
            Self::InLineComment => text[offset..]
                .find('\n')
                .map_or(end, |found| offset + found),
            Self::InBlockComment => text[offset + 2..]
                .find("*/")
                .map_or(end, |found| offset + 2 + found + 2),
            Self::InSingleQuoteString => leave_quoted(text, offset, '\'', false),
            Self::InDoubleQuoteString => leave_quoted(text, offset, '"', false),
            Self::InTemplateLiteral => leave_quoted(text, offset, '`', true),
            Self::InUrl => leave_url(text, offset),
        }
    }
}

/// Return true if a word character comes right before `offset`.
fn follows_word(source: &str, offset: usize) -> bool {
    source[..offset]
        .chars()
        .next_back()
        .is_some_and(super::is_word_continue)
}

/// Return the offset just past the quoted run opened at `offset`.
fn leave_quoted(text: &str, offset: usize, quote: char, multiline: bool) -> usize {
    let mut iterator = text[offset + 1..]
        .char_indices()
        .map(|(d, c)| (offset + 1 + d, c));

    while let Some((index, char)) = iterator.next() {
        match char {
            '\\' => {
                iterator.next();
            }
            '\n' if !multiline => return index,
            c if c == quote => return index + 1,
            _ => continue,
        }
    }

    text.len()
}

/// Return the offset just past the `url(` run opened at `offset`.
///
/// Quotes inside are honoured. An unclosed `url(` stops before the line break.
fn leave_url(text: &str, offset: usize) -> usize {
    let mut cursor = offset + 4;

    while let Some((c, length)) = char_at(text, cursor) {
        match c {
            '\'' | '"' => cursor = leave_quoted(text, cursor, c, false),
            ')' => return cursor + 1,
            '\n' => return cursor,
            _ => cursor += length,
        }
    }

    text.len()
}

/// If an opaque run begins at `offset`, return the offset just past it.
pub fn skip_opaque(source: &str, offset: usize, end: usize, dialect: Dialect) -> Option<usize> {
    match ScanState::enter(source, offset, dialect) {
        ScanState::Normal => None,
        state => Some(state.leave(source, offset, end)),
    }
}

/// Return the character at `offset` and its length in bytes.
pub fn char_at(source: &str, offset: usize) -> Option<(char, usize)> {
    source[offset..].chars().next().map(|c| (c, c.len_utf8()))
}

/// Return the offset of the `}` matching the `{` at `open`, searching no
/// further than `end`.
pub fn find_closing(source: &str, open: usize, end: usize, dialect: Dialect) -> Option<usize> {
    let mut depth = 0_usize;
    let mut offset = open;

    while offset < end {
        if let Some(next) = skip_opaque(source, offset, end, dialect) {
            offset = next;
            continue;
        }
        let (char, length) = char_at(source, offset)?;
        match char {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
        offset += length;
    }

    None
}

/// Return the offset of the first non-whitespace character at or after `offset`.
pub fn skip_whitespace(source: &str, offset: usize, end: usize) -> usize {
    let rest = &source[offset..end];

    offset + (rest.len() - rest.trim_start().len())
}
