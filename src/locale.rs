//! Locale resolution
//!
//! Maps the free-form language the user picked ("tamil", "ta", "English")
//! to the locale tag used for both voice selection and recognition.

use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Locale used when a token is not in the map
pub const DEFAULT_LOCALE: &str = "en-US";

/// Built-in language table (lowercase token -> locale tag)
static BUILTIN: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("english", "en-US"),
        ("en", "en-US"),
        ("hindi", "hi-IN"),
        ("hi", "hi-IN"),
        ("tamil", "ta-IN"),
        ("ta", "ta-IN"),
        ("telugu", "te-IN"),
        ("te", "te-IN"),
        ("kannada", "kn-IN"),
        ("kn", "kn-IN"),
        ("malayalam", "ml-IN"),
        ("ml", "ml-IN"),
    ]
    .into_iter()
    .collect()
});

/// A language-region tag such as `ta-IN`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocaleTag(String);

impl LocaleTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The fallback tag (`en-US`)
    pub fn default_locale() -> Self {
        Self::new(DEFAULT_LOCALE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, lowercased (`ta` for `ta-IN`)
    pub fn language(&self) -> String {
        language_subtag(&self.0)
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercased text before the first `-` or `_` of a tag
pub fn language_subtag(tag: &str) -> String {
    tag.split(|c| c == '-' || c == '_')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Token to locale table
///
/// Immutable once built. The config file can layer extra entries on top of
/// the built-in table before the session starts.
#[derive(Debug, Clone)]
pub struct LocaleMap {
    entries: HashMap<String, String>,
}

impl LocaleMap {
    /// The built-in table only
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Built-in table plus extra entries; extras win on conflict
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = Self::builtin();
        for (token, tag) in overrides {
            map.entries
                .insert(token.as_ref().trim().to_lowercase(), tag.into());
        }
        map
    }

    /// Resolve a raw language token, falling back to `en-US`
    pub fn resolve(&self, token: &str) -> LocaleTag {
        match self.get(token) {
            Some(tag) => {
                debug!("Resolved language {:?} to {}", token, tag);
                LocaleTag::new(tag)
            }
            None => {
                debug!(
                    "Language {:?} not mapped, using {}",
                    token, DEFAULT_LOCALE
                );
                LocaleTag::default_locale()
            }
        }
    }

    /// Look up a token without falling back
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .get(&token.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LocaleMap {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolve a token against the built-in table
pub fn resolve(token: &str) -> LocaleTag {
    LocaleMap::builtin().resolve(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tokens() {
        for (token, tag) in BUILTIN.iter() {
            assert_eq!(resolve(token).as_str(), *tag);
        }
    }

    #[test]
    fn test_case_and_whitespace() {
        assert_eq!(resolve("  Tamil ").as_str(), "ta-IN");
        assert_eq!(resolve("HI").as_str(), "hi-IN");
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(resolve("klingon").as_str(), DEFAULT_LOCALE);
        assert_eq!(resolve("").as_str(), DEFAULT_LOCALE);
    }

    #[test]
    fn test_overrides() {
        let map = LocaleMap::with_overrides([("Bengali", "bn-IN"), ("en", "en-GB")]);
        assert_eq!(map.resolve("bengali").as_str(), "bn-IN");
        assert_eq!(map.resolve("en").as_str(), "en-GB");
        assert_eq!(map.resolve("tamil").as_str(), "ta-IN");
    }

    #[test]
    fn test_get_does_not_fall_back() {
        let map = LocaleMap::builtin();
        assert_eq!(map.get(" Kannada"), Some("kn-IN"));
        assert_eq!(map.get("klingon"), None);
    }

    #[test]
    fn test_language_subtag() {
        assert_eq!(LocaleTag::new("ta-IN").language(), "ta");
        assert_eq!(LocaleTag::new("EN_us").language(), "en");
        assert_eq!(LocaleTag::new("fr").language(), "fr");
    }
}
