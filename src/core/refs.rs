//! Asset reference extraction.
//!
//! References are found by pattern matching over source text, not by parsing
//! it: every quoted span (`"…"`, `'…'` or `` `…` ``) is searched for the path
//! segment `<prefix>/`, and the sub-path after it becomes the normalized
//! reference. The quoting or templating used to embed the path does not
//! affect the key, so `src="/images/a.png"` and `` src={`/images/a.png`} ``
//! both yield `a.png`.

use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_PREFIX: &str = "images";

const QUOTED_SPAN: &str = r#""([^"\n]*)"|'([^'\n]*)'|`([^`]*)`"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetReference {
    /// Normalized path relative to the asset directory.
    pub path: String,
    /// Relative path of the file the reference was found in.
    pub origin: String,
}

#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    span: Regex,
    segment: Regex,
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

fn ends_reference(c: char) -> bool {
    matches!(
        c,
        '"' | '\'' | '`' | '?' | '#' | '{' | '}' | '$' | ',' | ';' | '<' | '>' | '\\' | '\n' | '\r'
    )
}

/// Length of the sub-path at the start of `rest`. A `)` only ends it when it
/// closes a paren opened before the path, as in `url(/images/a.png)`.
fn sub_path_len(rest: &str) -> usize {
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return i,
            ')' => depth -= 1,
            c if ends_reference(c) => return i,
            _ => {}
        }
    }
    rest.len()
}

/// `srcset` width/density descriptor such as `2x` or `640w`.
fn is_descriptor(token: &str) -> bool {
    token
        .strip_suffix(['w', 'x'])
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit() || c == '.'))
}

fn strip_descriptor(path: &str) -> &str {
    match path.rsplit_once(char::is_whitespace) {
        Some((head, last)) if is_descriptor(last) => head.trim_end(),
        _ => path,
    }
}

impl ReferenceExtractor {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        let span = Regex::new(QUOTED_SPAN).expect("static quoted-span pattern");
        let segment = Regex::new(&format!(r"(?:^|/){}/", regex::escape(prefix)))
            .expect("escaped prefix is a valid pattern");
        ReferenceExtractor { span, segment }
    }

    /// Normalized references in `content`, deduplicated, in order of first
    /// appearance.
    pub fn extract(&self, content: &str) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for caps in self.span.captures_iter(content) {
            let Some(span) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) else {
                continue;
            };
            for reference in self.references_in_span(span.as_str()) {
                if seen.insert(reference.clone()) {
                    out.push(reference);
                }
            }
        }
        out
    }

    /// Extract and tag every reference with its originating file.
    pub fn extract_from(&self, origin: &str, content: &str) -> Vec<AssetReference> {
        self.extract(content)
            .into_iter()
            .map(|path| AssetReference {
                path,
                origin: origin.to_string(),
            })
            .collect()
    }

    fn references_in_span(&self, span: &str) -> Vec<String> {
        let mut refs = Vec::new();
        for m in self.segment.find_iter(span) {
            // Remote URLs are not local assets.
            if span[..m.start()].contains("://") {
                continue;
            }
            let rest = &span[m.end()..];
            let len = sub_path_len(rest);
            // Interpolated paths cannot be resolved statically.
            if rest[len..].starts_with('$') {
                continue;
            }
            let sub_path = strip_descriptor(rest[..len].trim_end());
            if sub_path.is_empty() || sub_path.ends_with('/') {
                continue;
            }
            refs.push(sub_path.trim_start_matches('/').to_string());
        }
        refs
    }
}

/// Aggregated references across all scanned files.
///
/// Keeps one entry per normalized path (in order of first appearance), the
/// set of files referencing each path, and the per-file reference lists.
#[derive(Debug, Default, Clone)]
pub struct ReferenceIndex {
    order: Vec<String>,
    origins: BTreeMap<String, BTreeSet<String>>,
    by_file: BTreeMap<String, Vec<String>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: AssetReference) {
        let AssetReference { path, origin } = reference;
        let per_file = self.by_file.entry(origin.clone()).or_default();
        if !per_file.contains(&path) {
            per_file.push(path.clone());
        }
        let origins = self.origins.entry(path.clone()).or_default();
        if origins.is_empty() {
            self.order.push(path);
        }
        origins.insert(origin);
    }

    pub fn extend<I: IntoIterator<Item = AssetReference>>(&mut self, refs: I) {
        for r in refs {
            self.insert(r);
        }
    }

    /// Distinct normalized paths in order of first appearance.
    pub fn paths(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.origins.contains_key(path)
    }

    /// Files referencing `path`, sorted.
    pub fn origins(&self, path: &str) -> Vec<String> {
        self.origins
            .get(path)
            .map(|o| o.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn by_file(&self) -> &BTreeMap<String, Vec<String>> {
        &self.by_file
    }
}
