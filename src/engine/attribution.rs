use std::fmt;

use serde::{Deserialize, Serialize};

/// Display locale. Unknown codes normalize to [`Locale::En`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ja];

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ja => "ja",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "ja" => Locale::Ja,
            "en" => Locale::En,
            other => {
                log::debug!("Unsupported locale '{}', falling back to en", other);
                Locale::En
            }
        }
    }

    /// Pick the field to display for this locale.
    pub fn pick<'a>(self, field_en: &'a str, field_jp: Option<&'a str>) -> &'a str {
        match (self, field_jp) {
            (Locale::Ja, Some(jp)) if !jp.trim().is_empty() => jp,
            _ => field_en,
        }
    }
}

impl From<String> for Locale {
    fn from(code: String) -> Self {
        Locale::from_code(&code)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Split a comma-joined attribution field into tokens for `locale`.
///
/// The localized field is used only for [`Locale::Ja`] and only when it has
/// content; otherwise the English field is split. Tokens are trimmed,
/// empty tokens (from trailing or doubled commas) are dropped and repeated
/// tokens are kept once, in first-occurrence order.
pub fn split(field_en: &str, field_jp: Option<&str>, locale: Locale) -> Vec<String> {
    let source = locale.pick(field_en, field_jp);

    let mut tokens: Vec<String> = Vec::new();
    for token in source.split(',').map(str::trim) {
        if token.is_empty() || tokens.iter().any(|t| t == token) {
            continue;
        }
        tokens.push(token.to_string());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_single_token() {
        assert_eq!(split("kz", None, Locale::En), vec!["kz"]);
    }

    #[test]
    fn test_split_trims_and_preserves_order() {
        assert_eq!(
            split(" wowaka ,  DECO*27,kz ", None, Locale::En),
            vec!["wowaka", "DECO*27", "kz"]
        );
    }

    #[test]
    fn test_split_drops_empty_tokens() {
        assert_eq!(split("A,,B,", None, Locale::En), vec!["A", "B"]);
        assert!(split("", None, Locale::En).is_empty());
        assert!(split(" , ", None, Locale::En).is_empty());
    }

    #[test]
    fn test_split_deduplicates_within_field() {
        assert_eq!(split("A, A, B, A", None, Locale::En), vec!["A", "B"]);
    }

    #[test]
    fn test_split_is_case_sensitive() {
        assert_eq!(split("kz, KZ", None, Locale::En), vec!["kz", "KZ"]);
    }

    #[test]
    fn test_split_uses_localized_field_for_ja() {
        assert_eq!(
            split("Hatsune Miku, GUMI", Some("初音ミク, GUMI"), Locale::Ja),
            vec!["初音ミク", "GUMI"]
        );
    }

    #[test]
    fn test_split_ignores_localized_field_for_en() {
        assert_eq!(
            split("Hatsune Miku", Some("初音ミク"), Locale::En),
            vec!["Hatsune Miku"]
        );
    }

    #[test]
    fn test_split_ja_falls_back_when_localized_missing() {
        assert_eq!(split("kz", None, Locale::Ja), vec!["kz"]);
        assert_eq!(split("kz", Some(""), Locale::Ja), vec!["kz"]);
        assert_eq!(split("kz", Some("   "), Locale::Ja), vec!["kz"]);
    }

    #[test]
    fn test_locale_from_code_falls_back_to_en() {
        assert_eq!(Locale::from_code("ja"), Locale::Ja);
        assert_eq!(Locale::from_code(" JA "), Locale::Ja);
        assert_eq!(Locale::from_code("en"), Locale::En);
        assert_eq!(Locale::from_code("fr"), Locale::En);
        assert_eq!(Locale::from_code(""), Locale::En);
    }

    #[test]
    fn test_locale_deserialize_falls_back() {
        #[derive(Deserialize)]
        struct Wrapper {
            locale: Locale,
        }

        let w: Wrapper = serde_json::from_str(r#"{"locale": "ja"}"#).unwrap();
        assert_eq!(w.locale, Locale::Ja);
        let w: Wrapper = serde_json::from_str(r#"{"locale": "de"}"#).unwrap();
        assert_eq!(w.locale, Locale::En);
    }
}
