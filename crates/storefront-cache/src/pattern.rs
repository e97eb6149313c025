//! Glob patterns shared by both tiers' invalidation paths.
//!
//! `*` matches any run of bytes (including none) and `?` matches exactly one
//! byte. Everything else is literal. This is the subset of the Redis `KEYS`
//! glob syntax that callers rely on, matched the way Redis matches it, so the
//! memory tier and the distributed tier always agree on what a pattern
//! selects. A `?` against a multibyte key character consumes one byte of it.

use std::fmt;

/// A key pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    glob: String,
}

impl KeyPattern {
    /// Wrap a glob. Every string is a valid pattern.
    #[must_use]
    pub fn new(glob: impl Into<String>) -> Self {
        Self { glob: glob.into() }
    }

    /// Whether `key` is selected by this pattern
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        glob_match(self.glob.as_bytes(), key.as_bytes())
    }

    /// The glob text as written by the caller
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// The glob in Redis `KEYS` syntax.
    ///
    /// Redis gives `[`, `]` and `\` special meaning; they are literals here.
    #[must_use]
    pub fn to_store_glob(&self) -> String {
        let mut out = String::with_capacity(self.glob.len());
        for ch in self.glob.chars() {
            if matches!(ch, '[' | ']' | '\\') {
                out.push('\\');
            }
            out.push(ch);
        }
        out
    }

    /// Whether the pattern contains no wildcard at all
    #[must_use]
    pub fn is_exact(&self) -> bool {
        !self.glob.contains(['*', '?'])
    }
}

/// Byte-wise wildcard match, backtracking only to the most recent `*`.
fn glob_match(pattern: &[u8], key: &[u8]) -> bool {
    let (mut p, mut k) = (0, 0);
    // Pattern index just past the last `*`, and the key index it resumes from
    let mut resume: Option<(usize, usize)> = None;

    while k < key.len() {
        match pattern.get(p) {
            Some(b'*') => {
                p += 1;
                resume = Some((p, k));
            }
            Some(b'?') => {
                p += 1;
                k += 1;
            }
            Some(&literal) if literal == key[k] => {
                p += 1;
                k += 1;
            }
            _ => match resume {
                Some((star_p, star_k)) => {
                    p = star_p;
                    k = star_k + 1;
                    resume = Some((star_p, k));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

impl From<&str> for KeyPattern {
    fn from(glob: &str) -> Self {
        Self::new(glob)
    }
}
