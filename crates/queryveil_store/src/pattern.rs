// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use regex::Regex;

use crate::{Error, Result};

/// A compiled wildcard pattern for bulk key deletion.
///
/// Patterns use `*` to match any run of characters (including none); every
/// other character matches literally. This mirrors the glob subset that remote
/// key-value stores accept for their scan commands, so a pattern computed once
/// by the invalidation engine behaves identically against an in-process
/// backend and a remote one.
///
/// # Examples
///
/// ```
/// use queryveil_store::Pattern;
///
/// let pattern = Pattern::new("Post~*")?;
/// assert!(pattern.matches("Post~01af"));
/// assert!(!pattern.matches("Comment~01af"));
/// # Ok::<(), queryveil_store::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a wildcard pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern cannot be compiled, e.g. when it
    /// exceeds the regex engine's size limit.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut src = String::with_capacity(pattern.len() + 8);
        src.push('^');
        // A leading or trailing '*' splits into an empty chunk, so every '*'
        // in the source, wherever it sits, becomes exactly one '.*' here.
        for (i, chunk) in pattern.split('*').enumerate() {
            if i > 0 {
                src.push_str(".*");
            }
            src.push_str(&regex::escape(chunk));
        }
        src.push('$');

        let regex = Regex::new(&src).map_err(Error::caused_by)?;
        Ok(Self {
            source: pattern.to_owned(),
            regex,
        })
    }

    /// Returns `true` if the key matches this pattern.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Returns the original pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}
