//! Voice selection

use crate::locale::{language_subtag, LocaleTag, DEFAULT_LOCALE};

/// A synthesis voice as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Engine-specific identifier used to select the voice again
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Locale tag the voice speaks (e.g. `ta-IN`)
    pub lang: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lang: lang.into(),
        }
    }

    /// Primary language subtag of this voice
    pub fn language(&self) -> String {
        language_subtag(&self.lang)
    }
}

/// Pick the best voice for a locale
///
/// Precedence: exact tag (case-insensitive), then same language subtag, then
/// any voice in the default language. Within a tier the first voice in the
/// list wins. `None` leaves the choice to the platform.
pub fn select_voice<'a>(locale: &LocaleTag, voices: &'a [Voice]) -> Option<&'a Voice> {
    let wanted = locale.as_str().to_lowercase();
    if let Some(voice) = voices.iter().find(|v| v.lang.to_lowercase() == wanted) {
        return Some(voice);
    }

    let language = locale.language();
    if let Some(voice) = voices.iter().find(|v| v.language() == language) {
        return Some(voice);
    }

    let fallback = language_subtag(DEFAULT_LOCALE);
    voices.iter().find(|v| v.language() == fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices(langs: &[&str]) -> Vec<Voice> {
        langs
            .iter()
            .enumerate()
            .map(|(i, lang)| Voice::new(format!("v{}", i), format!("Voice {}", i), *lang))
            .collect()
    }

    #[test]
    fn test_exact_match_regardless_of_order() {
        let locale = LocaleTag::new("ta-IN");
        let list = voices(&["en-US", "ta-LK", "TA-in"]);
        assert_eq!(select_voice(&locale, &list).unwrap().id, "v2");

        let list = voices(&["ta-in", "ta-LK", "en-US"]);
        assert_eq!(select_voice(&locale, &list).unwrap().id, "v0");
    }

    #[test]
    fn test_same_language_fallback() {
        let locale = LocaleTag::new("ta-IN");
        let list = voices(&["en-US", "ta-LK"]);
        assert_eq!(select_voice(&locale, &list).unwrap().lang, "ta-LK");
    }

    #[test]
    fn test_language_subtag_not_prefix() {
        // "t" is not the language of "ta-IN"
        let locale = LocaleTag::new("t-XX");
        let list = voices(&["ta-IN"]);
        assert!(select_voice(&locale, &list).is_none());
    }

    #[test]
    fn test_default_language_fallback() {
        let locale = LocaleTag::new("kn-IN");
        let list = voices(&["hi-IN", "en-GB"]);
        assert_eq!(select_voice(&locale, &list).unwrap().lang, "en-GB");
    }

    #[test]
    fn test_no_voice() {
        let locale = LocaleTag::new("kn-IN");
        assert!(select_voice(&locale, &voices(&["hi-IN", "fr-FR"])).is_none());
        assert!(select_voice(&locale, &[]).is_none());
    }
}
