mod fragment;
mod placeholder;
mod script;
mod state;
mod style;
mod syntax;

pub use fragment::{Fragment, Kind};
pub use placeholder::PlaceholderTable;
pub use syntax::{Builder, KEYWORDS, PLACEHOLDER_PREFIX};

use crate::{
    log::{unclosed_block, Error, UNBALANCED_BRACES},
    region::Region,
};
use fragment::count_lines;
use morel::Finder;
use serde::Serialize;
use state::{char_at, find_closing, skip_opaque, skip_whitespace, Dialect};
use tracing::{debug, trace};

/// Keyword that opens a raw embedding block, which is never scanned.
const ORIGIN: &str = "[Origin]";

/// Partitions source text into [`Fragment`] instances.
///
/// # Examples
///
/// ```
/// use chtl::{Builder, Kind, Scanner};
///
/// let scanner = Scanner::new(Builder::new());
/// let scan = scanner.scan("div { style { color: red; } }").unwrap();
///
/// assert_eq!(scan.fragments[1].kind, Kind::Stylesheet);
/// assert_eq!(scan.fragments[1].content, " color: red; ");
/// ```
pub struct Scanner {
    /// Compiled script-extension triggers.
    finder: Finder,
    /// Preferred prefix of placeholder markers.
    prefix: String,
    /// Extension keywords, in trigger order.
    keywords: Vec<String>,
}

impl Scanner {
    /// Create a new [`Scanner`] from the given [`Builder`].
    pub fn new(builder: Builder) -> Self {
        Self {
            finder: Finder::new(builder.to_syntax()),
            prefix: builder.placeholder_prefix().to_string(),
            keywords: builder.keywords().to_vec(),
        }
    }

    /// Partition the given source into fragments.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a `style` or `script` block is never closed.
    #[tracing::instrument(level = "debug", skip_all, fields(length = source.len()))]
    pub fn scan(&self, source: &str) -> Result<Scan, Error> {
        let mut walk = Walk {
            source,
            fragments: vec![],
            placeholders: PlaceholderTable::new(&self.prefix, source),
            line: 1,
            line_offset: 0,
        };
        let end = source.len();
        let mut flushed = 0;
        let mut offset = 0;
        let mut depth = 0_usize;

        while offset < end {
            if let Some(next) = skip_opaque(source, offset, end, Dialect::Markup) {
                offset = next;
                continue;
            }
            if source[offset..].starts_with(ORIGIN) {
                offset = origin_end(source, offset + ORIGIN.len());
                continue;
            }
            let Some((current, length)) = char_at(source, offset) else {
                break;
            };

            match current {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                c if is_ident_start(c) => {
                    let word_end = word_end(source, offset);
                    let open = block_open(source, offset, word_end);

                    if let Some((keyword, open)) = open {
                        let close = find_closing(source, open, end, keyword.dialect())
                            .ok_or_else(|| {
                                Error::build(UNBALANCED_BRACES)
                                    .with_pointer(source, open..open + 1)
                                    .with_help(unclosed_block(keyword))
                            })?;
                        let body = Region::new(open + 1..close);
                        debug!(%keyword, depth, begin = body.begin, end = body.end, "block");

                        walk.push(Kind::Markup, Region::new(flushed..open + 1), 0);
                        match keyword {
                            Block::Style => walk.style(body, depth),
                            Block::Script => walk.script(body, depth, &self.finder, &self.keywords),
                        }
                        flushed = close;
                        offset = close + 1;
                    } else {
                        offset = word_end;
                    }
                    continue;
                }
                _ => {}
            }
            offset += length;
        }
        walk.push(Kind::Markup, Region::new(flushed..end), 0);

        debug!(
            fragments = walk.fragments.len(),
            placeholders = walk.placeholders.len(),
            "scanned"
        );

        Ok(Scan {
            fragments: walk.fragments,
            placeholders: walk.placeholders,
        })
    }

    /// Partition the given source into fragments, like [`Scanner::scan`],
    /// naming the source file in any [`Error`] returned.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a `style` or `script` block is never closed.
    pub fn scan_named(&self, name: &str, source: &str) -> Result<Scan, Error> {
        self.scan(source).map_err(|error| error.with_name(name))
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(Builder::new())
    }
}

/// Partition the given source into fragments, using the default [`Builder`].
///
/// # Errors
///
/// Returns an [`Error`] when a `style` or `script` block is never closed.
///
/// # Examples
///
/// ```
/// use chtl::Kind;
///
/// let scan = chtl::scan("script { {{box}}->listen { click: f } }").unwrap();
/// let kinds: Vec<Kind> = scan.fragments.iter().map(|fragment| fragment.kind).collect();
///
/// assert_eq!(
///     kinds,
///     vec![Kind::Markup, Kind::Script, Kind::ScriptExtension, Kind::Markup]
/// );
/// ```
pub fn scan(source: &str) -> Result<Scan, Error> {
    Scanner::default().scan(source)
}

/// The result of scanning one source text.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Scan {
    /// Fragments, in source order.
    pub fragments: Vec<Fragment>,
    /// Literal script text behind the markers in
    /// [`Kind::ScriptExtension`] fragments.
    pub placeholders: PlaceholderTable,
}

impl Scan {
    /// Return the source text the fragments were taken from.
    ///
    /// Markers in extension fragments are resolved, and [`Kind::Script`]
    /// fragments whose text is also reachable through markers are skipped.
    pub fn reconstruct(&self) -> String {
        let mut result = String::new();

        for fragment in &self.fragments {
            match fragment.kind {
                Kind::Script if fragment.is_lifted() => continue,
                Kind::ScriptExtension => {
                    result.push_str(&self.placeholders.resolve(&fragment.content))
                }
                _ => result.push_str(&fragment.content),
            }
        }

        result
    }

    /// Iterate over the fragments of the given [`Kind`].
    pub fn of_kind(&self, kind: Kind) -> impl Iterator<Item = &Fragment> + '_ {
        self.fragments
            .iter()
            .filter(move |fragment| fragment.kind == kind)
    }
}

/// Keyword of a block that is handed to a sub-scanner.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Block {
    Style,
    Script,
}

impl Block {
    fn dialect(self) -> Dialect {
        match self {
            Block::Style => Dialect::Stylesheet,
            Block::Script => Dialect::Script,
        }
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Block::Style => write!(f, "style"),
            Block::Script => write!(f, "script"),
        }
    }
}

/// Output of one call to [`Scanner::scan`], under construction.
struct Walk<'source> {
    source: &'source str,
    fragments: Vec<Fragment>,
    placeholders: PlaceholderTable,
    /// Line number at `line_offset`.
    line: usize,
    line_offset: usize,
}

impl<'source> Walk<'source> {
    /// Return the line number of the given offset.
    ///
    /// Offsets must not decrease between calls.
    fn line_at(&mut self, offset: usize) -> usize {
        if offset > self.line_offset {
            self.line += count_lines(&self.source[self.line_offset..offset]);
            self.line_offset = offset;
        }

        self.line
    }

    /// Push a new [`Fragment`] over the given region.
    ///
    /// Empty markup is dropped, block fragments are always kept.
    fn push(&mut self, kind: Kind, region: Region, depth: usize) {
        if kind == Kind::Markup && region.is_empty() {
            return;
        }
        let line = self.line_at(region.begin);
        let fragment = Fragment::new(kind, self.source, region, line).with_depth(depth);
        trace!(%kind, begin = region.begin, end = region.end, "fragment");

        self.fragments.push(fragment);
    }

    fn style(&mut self, body: Region, depth: usize) {
        for (kind, region) in style::scan(self.source, body) {
            self.push(kind, region, depth);
        }
    }

    fn script(&mut self, body: Region, depth: usize, finder: &Finder, keywords: &[String]) {
        let pieces = script::scan(self.source, body, finder, keywords);
        if !script::has_extension(&pieces) {
            self.push(Kind::Script, body, depth);
            return;
        }

        let lifted = script::lift(self.source, &pieces, &mut self.placeholders);
        let line = self.line_at(body.begin);

        let mut literal = Fragment::new(Kind::Script, self.source, body, line).with_depth(depth);
        literal.content = lifted.script;
        literal.markers = lifted.markers;
        let mut extension =
            Fragment::new(Kind::ScriptExtension, self.source, body, line).with_depth(depth);
        extension.content = lifted.extension;

        trace!(
            begin = body.begin,
            end = body.end,
            markers = literal.markers.len(),
            "lifted script"
        );
        self.fragments.push(literal);
        self.fragments.push(extension);
    }
}

/// If the word between `begin` and `end` is `style` or `script`, standing
/// alone and followed by `{`, return the [`Block`] and the offset of the `{`.
fn block_open(source: &str, begin: usize, end: usize) -> Option<(Block, usize)> {
    let keyword = match &source[begin..end] {
        "style" => Block::Style,
        "script" => Block::Script,
        _ => return None,
    };
    let preceded = source[..begin]
        .chars()
        .next_back()
        .is_some_and(is_word_continue);
    if preceded {
        return None;
    }

    let open = skip_whitespace(source, end, source.len());
    source[open..].starts_with('{').then_some((keyword, open))
}

/// Return the offset just past the word that begins at `offset`.
fn word_end(source: &str, offset: usize) -> usize {
    source[offset..]
        .char_indices()
        .find(|(_, c)| !is_word_continue(*c))
        .map_or(source.len(), |(index, _)| offset + index)
}

/// Return the offset just past an `[Origin]` block whose header begins at
/// `offset`.
///
/// A usage without a body, `[Origin] @Html name;`, ends at the `;`.
fn origin_end(source: &str, offset: usize) -> usize {
    let header = source[offset..]
        .find(|c: char| c == '{' || c == ';')
        .map(|found| offset + found);

    match header {
        Some(open) if source.as_bytes()[open] == b'{' => {
            find_closing(source, open, source.len(), Dialect::Markup)
                .map_or(open + 1, |close| close + 1)
        }
        Some(semicolon) => semicolon + 1,
        None => source.len(),
    }
}

/// Return true if the given character is a recognized beginning identifier,
/// meaning '_' or an `xid_start`.
pub(crate) fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Return true if the given character is a recognized continue identifier,
/// meaning an `xid_continue`.
pub(crate) fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

/// Return true if the given character may continue a markup word, which
/// unlike an identifier may contain '-'.
fn is_word_continue(c: char) -> bool {
    c == '-' || is_ident_continue(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn kinds(scan: &Scan) -> Vec<(Kind, &str)> {
        scan.fragments
            .iter()
            .map(|fragment| (fragment.kind, fragment.content.as_str()))
            .collect()
    }

    #[test]
    fn test_markup_only() {
        let source = "html { body { div { text { \"hello\" } } } }";
        let scan = scan(source).unwrap();

        assert_eq!(kinds(&scan), vec![(Kind::Markup, source)]);
        assert!(scan.placeholders.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let scan = scan("").unwrap();

        assert!(scan.fragments.is_empty());
        assert_eq!(scan.reconstruct(), "");
    }

    #[test]
    fn test_global_style() {
        let scan = scan("style {\n  .a { color: red; }\n}\ndiv {}").unwrap();

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "style {"),
                (Kind::Stylesheet, "\n  .a { color: red; }\n"),
                (Kind::Markup, "}\ndiv {}"),
            ]
        );
        assert_eq!(scan.fragments[1].start_line, 1);
        assert_eq!(scan.fragments[1].end_line, 3);
        assert_eq!(scan.fragments[2].start_line, 3);
        assert_eq!(scan.fragments[1].depth, 0);
    }

    #[test]
    fn test_local_blocks_record_depth() {
        let scan = scan("body { div { style { width: 1px; } script { go(); } } }").unwrap();

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "body { div { style {"),
                (Kind::Stylesheet, " width: 1px; "),
                (Kind::Markup, "} script {"),
                (Kind::Script, " go(); "),
                (Kind::Markup, "} } }"),
            ]
        );
        assert_eq!(scan.fragments[1].depth, 2);
        assert_eq!(scan.fragments[3].depth, 2);
    }

    #[test]
    fn test_style_with_template_usage() {
        let scan = scan("style { @Style Theme; color: red; }").unwrap();

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "style {"),
                (Kind::Stylesheet, " "),
                (Kind::Markup, "@Style Theme;"),
                (Kind::Stylesheet, " color: red; "),
                (Kind::Markup, "}"),
            ]
        );
    }

    #[test]
    fn test_script_with_extension() {
        let source = "script {\n  let a = 1;\n  {{box}}->listen { click: () => { a++; } }\n}";
        let scan = scan(source).unwrap();
        let prefix = PLACEHOLDER_PREFIX;

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "script {"),
                (Kind::Script, "\n  let a = 1;\n  \n"),
                (
                    Kind::ScriptExtension,
                    format!("{prefix}0_{{{{box}}}}->listen {{ click: () => {{ a++; }} }}{prefix}1_")
                        .as_str()
                ),
                (Kind::Markup, "}"),
            ]
        );
        assert_eq!(
            scan.fragments[1].markers,
            vec![format!("{prefix}0_"), format!("{prefix}1_")]
        );
        assert_eq!(scan.placeholders.get(&format!("{prefix}0_")), Some("\n  let a = 1;\n  "));
        assert_eq!(scan.fragments[2].start_line, 1);
        assert_eq!(scan.fragments[2].end_line, 4);
        assert_eq!(scan.reconstruct(), source);
    }

    #[test]
    fn test_script_without_extension() {
        let scan = scan("script { console.log('}'); }").unwrap();

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "script {"),
                (Kind::Script, " console.log('}'); "),
                (Kind::Markup, "}"),
            ]
        );
        assert!(scan.fragments[1].markers.is_empty());
        assert!(scan.placeholders.is_empty());
    }

    #[test]
    fn test_empty_blocks_yield_fragments() {
        let scan = scan("style {} script {}").unwrap();

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "style {"),
                (Kind::Stylesheet, ""),
                (Kind::Markup, "} script {"),
                (Kind::Script, ""),
                (Kind::Markup, "}"),
            ]
        );
    }

    #[test]
    fn test_keywords_must_be_whole_words() {
        let source = "my-style { } stylesheet { } nostyle {} div { class: script; }";
        let scan = scan(source).unwrap();

        assert_eq!(kinds(&scan), vec![(Kind::Markup, source)]);
    }

    #[test]
    fn test_comments_and_strings_are_skipped() {
        let source = "// style {\n/* script { */ text { \"style {\" 'script {' }";
        let scan = scan(source).unwrap();

        assert_eq!(kinds(&scan), vec![(Kind::Markup, source)]);
    }

    #[test]
    fn test_urls_in_style_are_not_comments() {
        let source = "style { background: url(http://a.com/b.png); }";
        let scan = scan(source).unwrap();

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "style {"),
                (Kind::Stylesheet, " background: url(http://a.com/b.png); "),
                (Kind::Markup, "}"),
            ]
        );
    }

    #[test]
    fn test_urls_across_lines() {
        let source = "style {\n  .a { background: url(https://x/y.png) }\n}\ndiv { }";
        let scan = scan(source).unwrap();

        assert_eq!(
            kinds(&scan),
            vec![
                (Kind::Markup, "style {"),
                (Kind::Stylesheet, "\n  .a { background: url(https://x/y.png) }\n"),
                (Kind::Markup, "}\ndiv { }"),
            ]
        );
        assert_eq!(scan.fragments[2].start_line, 3);
    }

    #[test]
    fn test_protocol_relative_url() {
        let source = "div { style { .b { background: url(//cdn/x.png) } } }";
        let scan = scan(source).unwrap();

        assert_eq!(
            scan.of_kind(Kind::Stylesheet).next().map(|fragment| fragment.content.as_str()),
            Some(" .b { background: url(//cdn/x.png) } ")
        );
        assert_eq!(scan.reconstruct(), source);
    }

    #[test]
    fn test_origin_is_skipped() {
        let source = "[Origin] @Html raw { <style> a { } </style> script { } }\n[Origin] @Html raw;\nstyle {}";
        let scan = scan(source).unwrap();

        assert_eq!(scan.fragments.len(), 3);
        assert_eq!(scan.fragments[1].kind, Kind::Stylesheet);
        assert_eq!(scan.fragments[1].start_line, 3);
    }

    #[test]
    fn test_unbalanced_braces() {
        let error = scan("div {\n  script {\n    let a = 1;\n").unwrap_err();

        assert_eq!(error.get_reason(), UNBALANCED_BRACES);
        assert_eq!(error.get_help(), Some(unclosed_block("script").as_str()));
    }

    #[test]
    fn test_unbalanced_error_names_file() {
        let scanner = Scanner::default();
        let error = scanner.scan_named("index.chtl", "style {").unwrap_err();

        assert_eq!(error.get_name(), Some("index.chtl"));
        assert!(format!("{error:#}").contains("--> index.chtl:1:7"));
        assert!(scanner.scan_named("index.chtl", "style {}").is_ok());
    }

    #[test]
    fn test_unbalanced_markup_is_not_an_error() {
        assert!(scan("div { span {").is_ok());
    }

    #[test]
    fn test_placeholder_prefix_avoids_source() {
        let source = "script { let _JS_0_ = 1; {{a}} }";
        let scanner = Scanner::new(Builder::new().with_placeholder_prefix("_JS_"));
        let scan = scanner.scan(source).unwrap();

        assert_eq!(scan.placeholders.prefix(), "__JS_");
        assert_eq!(scan.reconstruct(), source);
    }

    #[test]
    fn test_custom_keyword() {
        let scanner = Scanner::new(Builder::new().with_keyword("printMylove"));
        let scan = scanner.scan("script { printMylove { url: a.png } }").unwrap();

        assert_eq!(scan.of_kind(Kind::ScriptExtension).count(), 1);
        assert_eq!(scan.of_kind(Kind::Script).next().map(|f| f.content.as_str()), Some("  "));
    }

    #[test]
    fn test_util_and_event_binding() {
        let source = "script {\n  util a > 1 -> change { b(); } -> then { c(); }\n  {{box}} &-> click { d(); }\n  e();\n}";
        let scan = scan(source).unwrap();
        let script = scan.of_kind(Kind::Script).next().unwrap();

        assert_eq!(script.content, "\n  \n  \n  e();\n");
        assert!(!script.content.contains("->"));
        assert_eq!(scan.of_kind(Kind::ScriptExtension).count(), 1);
        assert_eq!(scan.reconstruct(), source);
    }

    #[test]
    fn test_serialize() {
        let scan = scan("style {a}").unwrap();

        assert_eq!(
            serde_json::to_value(&scan.fragments[1]).unwrap(),
            serde_json::json!({
                "kind": "Stylesheet",
                "content": "a",
                "region": { "begin": 7, "end": 8 },
                "start_line": 1,
                "end_line": 1,
                "depth": 0,
                "markers": [],
            })
        );
    }

    /// Source text built from well-formed pieces.
    fn well_formed() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            "[a-z ]{0,8}".prop_map(|text| format!("div {{ {text} }}")),
            "[a-z:; ]{0,12}".prop_map(|text| format!("style {{ {text} }}")),
            Just("style { @Style A; .a { @Var B } }".to_string()),
            "[a-z=; \n]{0,12}".prop_map(|text| format!("script {{ {text} }}")),
            "[a-z ]{0,6}".prop_map(|text| format!("script {{ {{{{{text}}}}}->listen {{ x }} y; }}")),
            Just("script { vir a = 1;\n`${b}`; animate { c } }".to_string()),
            Just("// style {\n".to_string()),
            Just("text { \"script {\" }".to_string()),
            "[a-z \n]{0,6}",
        ];

        prop::collection::vec(piece, 0..8).prop_map(|pieces| pieces.concat())
    }

    proptest! {
        #[test]
        fn test_reconstruct_is_lossless(source in "\\PC{0,64}") {
            if let Ok(scan) = scan(&source) {
                prop_assert_eq!(scan.reconstruct(), source);
            }
        }

        #[test]
        fn test_reconstruct_well_formed(source in well_formed()) {
            let scan = scan(&source).unwrap();
            prop_assert_eq!(scan.reconstruct(), source);

            let mut line = 1;
            for fragment in &scan.fragments {
                prop_assert!(fragment.start_line >= line);
                prop_assert!(fragment.end_line >= fragment.start_line);
                line = fragment.start_line;
            }
        }

        #[test]
        fn test_well_formed_is_balanced(source in well_formed()) {
            prop_assert!(scan(&source).is_ok());
        }

        #[test]
        fn test_truncated_block_is_unbalanced(source in well_formed(), style in any::<bool>()) {
            let truncated = format!("{source}\n{} {{ a", if style { "style" } else { "script" });
            let error = scan(&truncated).unwrap_err();

            prop_assert_eq!(error.get_reason(), UNBALANCED_BRACES);
        }

        #[test]
        fn test_rescan_markup_is_idempotent(source in well_formed()) {
            let markup: String = scan(&source)
                .unwrap()
                .of_kind(Kind::Markup)
                .map(|fragment| fragment.content.as_str())
                .collect();
            let rescan = scan(&markup).unwrap();

            for fragment in &rescan.fragments {
                prop_assert!(fragment.kind == Kind::Markup || fragment.content.is_empty());
            }
        }
    }
}
