use super::{
    is_word_continue,
    placeholder::PlaceholderTable,
    state::{char_at, find_closing, skip_opaque, skip_whitespace, Dialect},
    syntax::{Trigger, SELECTOR_CLOSE},
};
use crate::region::Region;

use morel::Finder;
use tracing::trace;

/// A run of script block text.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(super) enum Piece {
    /// Plain script text.
    Literal(Region),
    /// Script-extension syntax, beginning with a [`Trigger`].
    Extension(Region),
}

/// Split the body of a `script` block into literal and extension runs.
///
/// The returned runs cover the body without gaps, in order. Empty runs are
/// never returned, so an empty body returns no runs.
pub(super) fn scan(source: &str, body: Region, finder: &Finder, keywords: &[String]) -> Vec<Piece> {
    let mut pieces = vec![];
    let mut flushed = body.begin;
    let mut offset = body.begin;

    while offset < body.end {
        if let Some(next) = skip_opaque(source, offset, body.end, Dialect::Script) {
            offset = next;
            continue;
        }

        let found = finder
            .starts(source, offset)
            .and_then(|(id, marker_end)| match Trigger::from(id) {
                Trigger::Selector => selector_end(source, marker_end, body.end),
                Trigger::Keyword(n) => {
                    if !is_whole_word(source, offset, marker_end) {
                        return None;
                    }
                    trace!(keyword = keywords.get(n).map(String::as_str), offset, "trigger");

                    Some(keyword_end(source, marker_end, body.end))
                }
            });

        match found {
            Some(end) if end <= body.end => {
                if flushed < offset {
                    pieces.push(Piece::Literal(Region::new(flushed..offset)));
                }
                pieces.push(Piece::Extension(Region::new(offset..end)));
                flushed = end;
                offset = end;
            }
            _ => offset += char_at(source, offset).map_or(1, |(_, length)| length),
        }
    }

    if flushed < body.end {
        pieces.push(Piece::Literal(Region::new(flushed..body.end)));
    }

    pieces
}

/// Return true if any of the runs is extension syntax.
pub(super) fn has_extension(pieces: &[Piece]) -> bool {
    pieces
        .iter()
        .any(|piece| matches!(piece, Piece::Extension(_)))
}

/// Lifted contents of a script block with extension syntax.
#[derive(Debug, PartialEq)]
pub(super) struct Lifted {
    /// Every literal run, concatenated.
    pub script: String,
    /// Extension runs, with a marker in place of each literal run.
    pub extension: String,
    /// Markers created for the literal runs, in order.
    pub markers: Vec<String>,
}

/// Replace each literal run with a placeholder marker.
pub(super) fn lift(source: &str, pieces: &[Piece], placeholders: &mut PlaceholderTable) -> Lifted {
    let mut lifted = Lifted {
        script: String::new(),
        extension: String::new(),
        markers: vec![],
    };

    for piece in pieces {
        match *piece {
            Piece::Literal(region) => {
                let text = &source[region];
                let marker = placeholders.insert(text);

                lifted.script.push_str(text);
                lifted.extension.push_str(&marker);
                lifted.markers.push(marker);
            }
            Piece::Extension(region) => lifted.extension.push_str(&source[region]),
        }
    }

    lifted
}

/// Return the offset just past an enhanced selector whose `{{` ends at
/// `from`, including a directly following `->`, or a following `&->` event
/// binding together with its handler.
fn selector_end(source: &str, from: usize, end: usize) -> Option<usize> {
    let close = from + source[from..end].find(SELECTOR_CLOSE)? + SELECTOR_CLOSE.len();
    let arrow = skip_whitespace(source, close, end);
    let rest = &source[arrow..end];

    if rest.starts_with("&->") {
        Some(binding_end(source, arrow + 3, end))
    } else if rest.starts_with("->") {
        Some(arrow + 2)
    } else {
        Some(close)
    }
}

/// Return the offset just past an event binding whose `&->` ends at `from`,
/// `click { .. }` or `click: handler;`.
fn binding_end(source: &str, from: usize, end: usize) -> usize {
    let event = skip_whitespace(source, from, end);
    let word = source[event..end]
        .find(|c: char| !is_word_continue(c))
        .map_or(end, |found| event + found);

    keyword_end(source, word, end)
}

/// Return the offset just past the block or statement that follows an
/// extension keyword ending at `from`.
///
/// A block runs to its matching `}`. A statement runs to a `;`, inclusive,
/// or to a line break outside of any brackets, exclusive. A statement whose
/// next line, or whose text after a closing `}`, begins with `->` continues
/// as a chain, `util a > 1 -> change { .. } -> then { .. }`.
fn keyword_end(source: &str, from: usize, end: usize) -> usize {
    let after = skip_whitespace(source, from, end);
    if source[after..end].starts_with('{') {
        return find_closing(source, after, end, Dialect::Script).map_or(end, |close| close + 1);
    }

    let mut depth = 0_usize;
    let mut cursor = from;

    while cursor < end {
        if let Some(next) = skip_opaque(source, cursor, end, Dialect::Script) {
            cursor = next;
            continue;
        }
        match source.as_bytes()[cursor] {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' if depth == 1 => {
                depth = 0;
                let next = skip_whitespace(source, cursor + 1, end);
                if !continues_chain(source, next, end) && !source[next..end].starts_with(';') {
                    return cursor + 1;
                }
            }
            b'}' | b')' | b']' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return cursor + 1,
            b'\n' if depth == 0 && !continues_chain(source, cursor, end) => return cursor,
            _ => {}
        }
        cursor += char_at(source, cursor).map_or(1, |(_, length)| length);
    }

    end
}

/// Return true if the next text after any whitespace is a `->` link.
fn continues_chain(source: &str, offset: usize, end: usize) -> bool {
    source[skip_whitespace(source, offset, end)..end].starts_with("->")
}

/// Return true if the text between `begin` and `end` is not part of a
/// longer word or a member access.
fn is_whole_word(source: &str, begin: usize, end: usize) -> bool {
    let before = source[..begin]
        .chars()
        .next_back()
        .is_some_and(|c| c == '.' || c == '$' || is_word_continue(c));
    let after = source[end..]
        .chars()
        .next()
        .is_some_and(|c| c == '$' || is_word_continue(c));

    !before && !after
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Builder;
    use pretty_assertions::assert_eq;

    fn pieces(body: &str) -> Vec<(bool, &str)> {
        let builder = Builder::new();
        let finder = Finder::new(builder.to_syntax());

        scan(body, Region::new(0..body.len()), &finder, builder.keywords())
            .into_iter()
            .map(|piece| match piece {
                Piece::Literal(region) => (false, &body[region]),
                Piece::Extension(region) => (true, &body[region]),
            })
            .collect()
    }

    #[test]
    fn test_plain_script() {
        assert_eq!(
            pieces("const a = { b: 1 };\nconsole.log(a);"),
            vec![(false, "const a = { b: 1 };\nconsole.log(a);")]
        );
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(pieces(""), vec![]);
    }

    #[test]
    fn test_selector_with_arrow() {
        assert_eq!(
            pieces("{{.box}}->textContent = 'a';"),
            vec![(true, "{{.box}}->"), (false, "textContent = 'a';")]
        );
    }

    #[test]
    fn test_selector_then_keyword_block() {
        assert_eq!(
            pieces("let a = 1;\n{{box}}->listen {\n  click: () => { a++; }\n}\na--;"),
            vec![
                (false, "let a = 1;\n"),
                (true, "{{box}}->"),
                (true, "listen {\n  click: () => { a++; }\n}"),
                (false, "\na--;"),
            ]
        );
    }

    #[test]
    fn test_keyword_statement() {
        assert_eq!(
            pieces("vir test = listen({ click: f });\nrun();"),
            vec![
                (true, "vir test = listen({ click: f });"),
                (false, "\nrun();"),
            ]
        );
        assert_eq!(
            pieces("router go\nb();"),
            vec![(true, "router go"), (false, "\nb();")]
        );
    }

    #[test]
    fn test_util_chain() {
        assert_eq!(
            pieces("util a > 1 -> change { b(); } -> then { c(); } d();"),
            vec![
                (true, "util a > 1 -> change { b(); } -> then { c(); }"),
                (false, " d();"),
            ]
        );
        assert_eq!(
            pieces("util a > 1\n  -> change { b(); }\n  -> then { c(); }\nd();"),
            vec![
                (true, "util a > 1\n  -> change { b(); }\n  -> then { c(); }"),
                (false, "\nd();"),
            ]
        );
    }

    #[test]
    fn test_statement_ending_in_block() {
        assert_eq!(
            pieces("vir menu = listen { click: f }\nrun();"),
            vec![(true, "vir menu = listen { click: f }"), (false, "\nrun();")]
        );
        assert_eq!(
            pieces("vir menu = { a: 1 };"),
            vec![(true, "vir menu = { a: 1 };")]
        );
    }

    #[test]
    fn test_event_binding() {
        assert_eq!(
            pieces("a();\n{{box}} &-> click { b(); }\nc();"),
            vec![
                (false, "a();\n"),
                (true, "{{box}} &-> click { b(); }"),
                (false, "\nc();"),
            ]
        );
        assert_eq!(
            pieces("{{box}}&->click: handle;"),
            vec![(true, "{{box}}&->click: handle;")]
        );
    }

    #[test]
    fn test_script_loader() {
        assert_eq!(
            pieces("ScriptLoader { load: ./a.js }\nrun();"),
            vec![(true, "ScriptLoader { load: ./a.js }"), (false, "\nrun();")]
        );
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        assert_eq!(
            pieces("el.animate(frames); const virtual = 1; listener();"),
            vec![(false, "el.animate(frames); const virtual = 1; listener();")]
        );
    }

    #[test]
    fn test_triggers_inside_strings_and_comments() {
        let body = "let s = \"{{a}}\"; // listen {\nlet t = `animate ${x}`; /* {{b}} */";

        assert_eq!(pieces(body), vec![(false, body)]);
    }

    #[test]
    fn test_unclosed_selector_is_literal() {
        assert_eq!(pieces("if (a) {{ b(); }"), vec![(false, "if (a) {{ b(); }")]);
    }

    #[test]
    fn test_lift() {
        let body = "a();{{box}}b();";
        let finder = Finder::new(Builder::new().to_syntax());
        let found = scan(body, Region::new(0..body.len()), &finder, &[]);
        let mut placeholders = PlaceholderTable::new("_P_", body);
        let lifted = lift(body, &found, &mut placeholders);

        assert!(has_extension(&found));
        assert_eq!(lifted.script, "a();b();");
        assert_eq!(lifted.extension, "_P_0_{{box}}_P_1_");
        assert_eq!(lifted.markers, vec!["_P_0_", "_P_1_"]);
        assert_eq!(placeholders.resolve(&lifted.extension), body);
    }
}
