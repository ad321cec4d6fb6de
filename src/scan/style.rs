use super::{
    fragment::Kind,
    state::{char_at, find_closing, skip_opaque, Dialect},
};
use crate::region::Region;

/// Keywords that open a template statement inside a style body.
const STATEMENTS: [&str; 2] = ["inherit", "delete"];

/// Split the body of a `style` block into [`Kind::Stylesheet`] and
/// [`Kind::Markup`] regions.
///
/// Template usages (`@Style Name;`, `@Var Theme { .. }`), `inherit` and
/// `delete` statements, and generator comments (`# text`) are markup,
/// everything else is plain CSS. The returned regions cover the body
/// without gaps, in order, and there is always at least one of them.
pub(super) fn scan(source: &str, body: Region) -> Vec<(Kind, Region)> {
    let mut pieces: Vec<(Kind, Region)> = vec![];
    let mut flushed = body.begin;
    let mut offset = body.begin;

    while offset < body.end {
        if let Some(next) = skip_opaque(source, offset, body.end, Dialect::Stylesheet) {
            offset = next;
            continue;
        }

        let construct = match construct_end(source, body.begin, offset, body.end) {
            Some(end) => end,
            None => {
                offset += char_at(source, offset).map_or(1, |(_, length)| length);
                continue;
            }
        };

        push(&mut pieces, Kind::Stylesheet, flushed..offset);
        push(&mut pieces, Kind::Markup, offset..construct);
        flushed = construct;
        offset = construct;
    }

    push(&mut pieces, Kind::Stylesheet, flushed..body.end);
    if pieces.is_empty() {
        pieces.push((Kind::Stylesheet, body));
    }

    pieces
}

/// If a markup construct begins at `offset`, return the offset just past it.
///
/// `begin` is the start of the style body.
fn construct_end(source: &str, begin: usize, offset: usize, end: usize) -> Option<usize> {
    let mut chars = source[offset..end].chars();

    match (chars.next(), chars.next()) {
        (Some('@'), Some(c)) if c.is_ascii_uppercase() => Some(usage_end(source, offset, end)),
        (Some('#'), Some(c)) if c.is_whitespace() => Some(
            source[offset..end]
                .find('\n')
                .map_or(end, |found| offset + found),
        ),
        _ if starts_statement(source, begin, offset, end) => Some(usage_end(source, offset, end)),
        _ => None,
    }
}

/// Return true if an `inherit` or `delete` statement begins at `offset`.
///
/// The keyword must be followed by whitespace and open a declaration, so the
/// value in `color: inherit;` and the selector `.delete` stay CSS.
fn starts_statement(source: &str, begin: usize, offset: usize, end: usize) -> bool {
    let rest = &source[offset..end];
    let Some(keyword) = STATEMENTS.iter().find(|keyword| rest.starts_with(**keyword)) else {
        return false;
    };
    let spaced = rest[keyword.len()..]
        .chars()
        .next()
        .is_some_and(char::is_whitespace);
    let before = source[begin..offset].trim_end();

    spaced && (before.is_empty() || before.ends_with([';', '{', '}']) || before.ends_with("*/"))
}

/// Return the offset just past a template usage that begins at `offset`.
///
/// A usage ends with `;`, with the `}` matching its own `{`, or just before
/// a `}` closing the surrounding rule.
fn usage_end(source: &str, offset: usize, end: usize) -> usize {
    let mut cursor = offset;

    while cursor < end {
        if let Some(next) = skip_opaque(source, cursor, end, Dialect::Stylesheet) {
            cursor = next;
            continue;
        }
        match source.as_bytes()[cursor] {
            b';' => return cursor + 1,
            b'}' => return cursor,
            b'{' => {
                return find_closing(source, cursor, end, Dialect::Stylesheet)
                    .map_or(end, |close| close + 1)
            }
            _ => cursor += char_at(source, cursor).map_or(1, |(_, length)| length),
        }
    }

    end
}

/// Push a non-empty region, merging it into the previous region of the same
/// [`Kind`] when the two touch.
fn push(pieces: &mut Vec<(Kind, Region)>, kind: Kind, range: std::ops::Range<usize>) {
    let region = Region::new(range);
    if region.is_empty() {
        return;
    }

    match pieces.last_mut() {
        Some((last, previous)) if *last == kind && previous.is_neighbor(region) => {
            *previous = previous.combine(region);
        }
        _ => pieces.push((kind, region)),
    }
}
