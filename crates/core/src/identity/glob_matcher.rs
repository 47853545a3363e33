//! Compiled ignore-glob predicate.
//!
//! An [`IgnoreGlobMatcher`] answers "does this path match *any* of the
//! globs?". It is built once from a glob list and never mutated afterwards,
//! so it can be shared freely between threads.
//!
//! Supported syntax (via `glob-match`):
//! - `*`: any run of characters within one path segment
//! - `**`: zero or more whole path segments
//! - `{a,b}`: alternation; `,` is literal outside braces
//! - `[abc]` / `[!abc]` / `[a-c]`: character classes
//! - `\`: a path separator, the same as `/`
//!
//! Every other character the glob allow-list admits (`!` outside a class,
//! `-` outside a class, `(`, `)`, `:`, `.`, `_`, space) is literal. In
//! particular a leading `!` is *not* negation: `!keep.txt` ignores the file
//! named `!keep.txt` and nothing else.

/// An OR-combination of glob patterns, matched against relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreGlobMatcher {
    /// `(glob, compiled)` pairs. `glob` is the normalized input,
    /// `compiled` is what is handed to `glob_match`.
    patterns: Vec<(String, String)>,
}

impl IgnoreGlobMatcher {
    /// Compile `globs` into a single predicate.
    ///
    /// An empty glob set compiles to a matcher that matches nothing.
    pub fn compile<S: AsRef<str>>(globs: &[S]) -> Self {
        let patterns = globs
            .iter()
            .map(|g| normalize(g.as_ref()))
            .filter(|g| !g.is_empty())
            .map(|g| {
                let compiled = escape_leading_bang(&g);
                (g, compiled)
            })
            .collect();
        Self { patterns }
    }

    /// A matcher that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` if the matcher has no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// `true` iff `path` matches at least one compiled pattern.
    pub fn matches(&self, path: &str) -> bool {
        self.matching_pattern(path).is_some()
    }

    /// The first glob that matches `path`, for diagnostics.
    pub fn matching_pattern(&self, path: &str) -> Option<&str> {
        if self.patterns.is_empty() {
            return None;
        }
        let path = normalize(path);
        self.patterns
            .iter()
            .find(|(_, compiled)| glob_match::glob_match(compiled, &path))
            .map(|(glob, _)| glob.as_str())
    }
}

/// Normalize to forward slashes for consistent matching.
fn normalize(s: &str) -> String {
    s.replace('\\', "/")
}

/// `glob_match` negates a pattern that starts with `!`; escape it so the
/// character matches literally.
fn escape_leading_bang(glob: &str) -> String {
    if glob.starts_with('!') {
        format!("\\{glob}")
    } else {
        glob.to_string()
    }
}
