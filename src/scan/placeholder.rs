use serde::Serialize;

/// Maps synthetic placeholder markers back to the literal text they stand for.
///
/// Markers have the shape `{prefix}{n}_`, where `n` counts from zero across
/// one scan. The prefix is chosen so it never occurs in the scanned source,
/// so every occurrence of it in a fragment is a marker.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct PlaceholderTable {
    /// Prefix shared by every marker in this table.
    prefix: String,
    /// Literal text, indexed by marker number.
    entries: Vec<String>,
}

impl PlaceholderTable {
    /// Create a new, empty [`PlaceholderTable`] for the given source.
    ///
    /// The preferred prefix is extended with leading underscores until it
    /// does not occur anywhere in the source.
    pub(crate) fn new(preferred: &str, source: &str) -> Self {
        let mut prefix = preferred.to_string();
        while source.contains(prefix.as_str()) {
            prefix.insert(0, '_');
        }

        Self {
            prefix,
            entries: vec![],
        }
    }

    /// Store the literal text and return the marker that stands for it.
    pub(crate) fn insert(&mut self, text: &str) -> String {
        let marker = format!("{}{}_", self.prefix, self.entries.len());
        self.entries.push(text.to_string());

        marker
    }

    /// Return the literal text behind the given marker, if it is one of ours.
    pub fn get(&self, marker: &str) -> Option<&str> {
        let number = marker
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix('_')?;
        if number.is_empty() || !number.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        self.entries
            .get(number.parse::<usize>().ok()?)
            .map(String::as_str)
    }

    /// Replace every marker in the given text with the literal text it stands for.
    ///
    /// Text that merely starts like a marker is copied through unchanged.
    pub fn resolve(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(at) = rest.find(self.prefix.as_str()) {
            result.push_str(&rest[..at]);
            let after = &rest[at + self.prefix.len()..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            let marker_len = self.prefix.len() + digits + 1;

            match rest.get(at..at + marker_len).and_then(|marker| self.get(marker)) {
                Some(literal) => {
                    result.push_str(literal);
                    rest = &rest[at + marker_len..];
                }
                None => {
                    let skip = self.prefix.chars().next().map_or(1, char::len_utf8);
                    result.push_str(&rest[at..at + skip]);
                    rest = &rest[at + skip..];
                }
            }
        }
        result.push_str(rest);

        result
    }

    /// Return the prefix shared by every marker.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Return the number of markers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true if no markers were created.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(marker, literal text)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(n, text)| (format!("{}{n}_", self.prefix), text.as_str()))
    }
}
