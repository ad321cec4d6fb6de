use super::{Lexeme, Operator, Token};
use crate::{
    log::{expected_operator, Error, INVALID_SYNTAX, UNEXPECTED_TOKEN},
    region::Region,
    scan::{is_ident_continue, is_ident_start},
};

type LexemeResult = Result<Option<Lexeme>, Error>;

/// Provides methods to read a property value as [`Lexeme`] instances.
pub struct Lexer<'source> {
    /// Reference to the source text.
    pub source: &'source str,
    /// Position within source.
    pub cursor: usize,
}

impl<'source> Lexer<'source> {
    /// Create a new [`Lexer`] over the given value text.
    #[inline]
    pub fn new(source: &'source str) -> Self {
        Self { source, cursor: 0 }
    }

    /// Return the next [`Lexeme`].
    ///
    /// Any instance of [`Token::Whitespace`] is ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unexpected character or an unterminated
    /// string is found.
    pub fn next(&mut self) -> LexemeResult {
        loop {
            let from = self.cursor;
            let mut iterator = self.source[from..]
                .char_indices()
                .map(|(d, c)| (from + d, c));
            let Some((index, char)) = iterator.next() else {
                return Ok(None);
            };

            let lexeme = match char {
                '+' => self.advance(index, 1, Token::Operator(Operator::Add)),
                '-' => self.advance(index, 1, Token::Operator(Operator::Subtract)),
                '/' => self.advance(index, 1, Token::Operator(Operator::Divide)),
                '%' => self.advance(index, 1, Token::Operator(Operator::Modulo)),
                '*' => match iterator.next() {
                    Some((_, '*')) => self.advance(index, 2, Token::Operator(Operator::Power)),
                    _ => self.advance(index, 1, Token::Operator(Operator::Multiply)),
                },
                '(' => self.advance(index, 1, Token::OpenParen),
                ')' => self.advance(index, 1, Token::CloseParen),
                '?' => self.advance(index, 1, Token::Question),
                ':' => self.advance(index, 1, Token::Colon),
                '"' | '\'' => self.lex_string(iterator, index, char)?,
                '=' | '!' | '>' | '<' | '|' | '&' => self.lex_operator(iterator, index, char)?,
                '{' => self.lex_selector_reference(index)?,
                '.' => match iterator.next() {
                    Some((_, c)) if c.is_ascii_digit() => self.lex_digit(index),
                    Some((_, c)) if is_ident_start(c) => self.lex_word(index, 1),
                    _ => return Err(self.unexpected(index, char)),
                },
                '#' => match iterator.next() {
                    Some((_, c)) if is_ident_continue(c) => self.lex_word(index, 1),
                    _ => return Err(self.unexpected(index, char)),
                },
                c if c.is_whitespace() => self.lex_whitespace(index),
                c if c.is_ascii_digit() => self.lex_digit(index),
                c if is_ident_start(c) => self.lex_word(index, c.len_utf8()),
                _ => return Err(self.unexpected(index, char)),
            };

            match lexeme.token {
                Token::Whitespace => continue,
                _ => return Ok(Some(lexeme)),
            }
        }
    }

    /// Move the cursor past a [`Lexeme`] of the given length and return it.
    fn advance(&mut self, from: usize, length: usize, token: Token) -> Lexeme {
        self.cursor = from + length;

        Lexeme::new(token, self.source, Region::new(from..self.cursor))
    }

    /// Return an [`Error`] describing an unexpected character.
    fn unexpected(&self, from: usize, char: char) -> Error {
        Error::build(UNEXPECTED_TOKEN)
            .with_pointer(self.source, from..from + char.len_utf8())
            .with_help(
                "expected a number, a unit, an identifier, a reference like `box.width`, \
                a string, an operator, or one of `(`, `)`, `?`, `:`",
            )
    }

    /// Return a [`Lexeme`] based on the previous character.
    ///
    /// Checks the next character via `.next` to ensure the correct `Token` is
    /// returned. All of these are recognized:
    ///
    /// `==`, `!=`, `>=`, `<=`, `||`, `&&`, `!`, `>`, `<`
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when `=`, `|` or `&` stands alone.
    fn lex_operator<T>(&mut self, mut iter: T, from: usize, previous: char) -> Result<Lexeme, Error>
    where
        T: Iterator<Item = (usize, char)>,
    {
        let (length, token) = match (previous, iter.next()) {
            // Double:
            ('=', Some((_, '='))) => (2, Token::Operator(Operator::Equal)),
            ('!', Some((_, '='))) => (2, Token::Operator(Operator::NotEqual)),
            ('>', Some((_, '='))) => (2, Token::Operator(Operator::GreaterOrEqual)),
            ('<', Some((_, '='))) => (2, Token::Operator(Operator::LesserOrEqual)),
            ('|', Some((_, '|'))) => (2, Token::Operator(Operator::Or)),
            ('&', Some((_, '&'))) => (2, Token::Operator(Operator::And)),
            // Single:
            ('!', _) => (1, Token::Exclamation),
            ('>', _) => (1, Token::Operator(Operator::Greater)),
            ('<', _) => (1, Token::Operator(Operator::Lesser)),
            _ => {
                return Err(Error::build(UNEXPECTED_TOKEN)
                    .with_pointer(self.source, from..from + 1)
                    .with_help(expected_operator(previous)));
            }
        };

        Ok(self.advance(from, length, token))
    }

    /// Return a [`Lexeme`] containing [`Token::Number`].
    fn lex_digit(&mut self, from: usize) -> Lexeme {
        let length = self.source[from..]
            .find(|c: char| !is_number(c))
            .unwrap_or(self.source.len() - from);

        self.advance(from, length, Token::Number)
    }

    /// Return a [`Lexeme`] containing [`Token::Whitespace`].
    fn lex_whitespace(&mut self, from: usize) -> Lexeme {
        let length = self.source[from..]
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.source.len() - from);

        self.advance(from, length, Token::Whitespace)
    }

    /// Return a [`Lexeme`] containing [`Token::String`] using the given
    /// iterator, which begins after the opening quote.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the string is never closed.
    fn lex_string<T>(&mut self, mut iter: T, from: usize, quote: char) -> Result<Lexeme, Error>
    where
        T: Iterator<Item = (usize, char)>,
    {
        while let Some((index, char)) = iter.next() {
            match char {
                '\\' => {
                    iter.next();
                }
                c if c == quote => return Ok(self.advance(from, index + 1 - from, Token::String)),
                _ => continue,
            }
        }

        Err(Error::build(INVALID_SYNTAX)
            .with_pointer(self.source, from..from + 1)
            .with_help(format!(
                "this might be an undelimited string, try closing it with `{quote}`"
            )))
    }

    /// Return a [`Lexeme`] containing [`Token::Identifier`],
    /// [`Token::Reference`], [`Token::True`] or [`Token::False`].
    ///
    /// The first character, `length` bytes long, is already known to start a
    /// word. A `-` or `.` continues the word only when an identifier follows
    /// it, so `sans-serif` and `box.width` are one word but `10px-5px` is not.
    fn lex_word(&mut self, from: usize, length: usize) -> Lexeme {
        let mut end = from + length;

        loop {
            let mut rest = self.source[end..].chars();
            match (rest.next(), rest.next()) {
                (Some(c), _) if is_ident_continue(c) => end += c.len_utf8(),
                (Some('-' | '.'), Some(next)) if is_ident_start(next) => end += 1,
                _ => break,
            }
        }

        let text = &self.source[from..end];
        let token = match text {
            "true" => Token::True,
            "false" => Token::False,
            _ if text[length..].contains('.') => Token::Reference,
            _ => Token::Identifier,
        };

        self.advance(from, end - from, token)
    }

    /// Return a [`Lexeme`] containing a [`Token::Reference`] in the
    /// enhanced selector form, `{{.box}}.width`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the selector is never closed or is not
    /// followed by a property name.
    fn lex_selector_reference(&mut self, from: usize) -> Result<Lexeme, Error> {
        let error = || {
            Error::build(UNEXPECTED_TOKEN)
                .with_pointer(self.source, from..from + 1)
                .with_help("a selector reference looks like `{{.box}}.width`")
        };

        let rest = self.source[from..].strip_prefix("{{").ok_or_else(error)?;
        let close = from + 2 + rest.find("}}").ok_or_else(error)? + 2;
        let mut after = self.source[close..].chars();
        match (after.next(), after.next()) {
            (Some('.'), Some(c)) if is_ident_start(c) => {}
            _ => return Err(error()),
        }

        let word = self.lex_word(close, 1);
        let end = word.region.end;

        Ok(self.advance(from, end - from, Token::Reference))
    }
}

/// Read the whole value text as [`Lexeme`] instances, without whitespace.
///
/// # Errors
///
/// Returns an [`Error`] when the text cannot be read.
///
/// # Examples
///
/// ```
/// use chtl::{tokenize, Operator, Token};
///
/// let lexemes = tokenize("10px + box.width").unwrap();
/// let tokens: Vec<Token> = lexemes.iter().map(|lexeme| lexeme.token).collect();
///
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Number,
///         Token::Identifier,
///         Token::Operator(Operator::Add),
///         Token::Reference,
///     ]
/// );
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, Error> {
    let mut lexer = Lexer::new(source);
    let mut lexemes = vec![];
    while let Some(lexeme) = lexer.next()? {
        lexemes.push(lexeme);
    }

    Ok(lexemes)
}

/// Return true if the given character is a number (0-9) or a period.
fn is_number(c: char) -> bool {
    matches!(c, '0'..='9' | '.')
}
