//! Supported spoken languages and translation code mapping
//!
//! The catalog drives recognition and synthesis language selection; the
//! translation endpoint only accepts two-letter codes, derived with
//! [`to_iso2`].

/// A supported spoken language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Display name in the language itself
    pub label: &'static str,

    /// BCP-47 region tag used by recognition and synthesis
    pub bcp47: &'static str,
}

/// Languages offered for live translation sessions
pub const CATALOG: &[Language] = &[
    Language { label: "English (US)", bcp47: "en-US" },
    Language { label: "Français (France)", bcp47: "fr-FR" },
    Language { label: "Español (España)", bcp47: "es-ES" },
    Language { label: "Deutsch", bcp47: "de-DE" },
    Language { label: "Italiano", bcp47: "it-IT" },
    Language { label: "Português (Brasil)", bcp47: "pt-BR" },
    Language { label: "Português (Portugal)", bcp47: "pt-PT" },
    Language { label: "Русский", bcp47: "ru-RU" },
    Language { label: "中文（简体）", bcp47: "zh-CN" },
    Language { label: "中文（繁體）", bcp47: "zh-TW" },
    Language { label: "日本語", bcp47: "ja-JP" },
    Language { label: "한국어", bcp47: "ko-KR" },
    Language { label: "العربية", bcp47: "ar-SA" },
    Language { label: "हिन्दी", bcp47: "hi-IN" },
    Language { label: "Türkçe", bcp47: "tr-TR" },
    Language { label: "Nederlands", bcp47: "nl-NL" },
    Language { label: "Polski", bcp47: "pl-PL" },
    Language { label: "Svenska", bcp47: "sv-SE" },
    Language { label: "Norsk Bokmål", bcp47: "nb-NO" },
    Language { label: "Dansk", bcp47: "da-DK" },
    Language { label: "Suomi", bcp47: "fi-FI" },
    Language { label: "Ελληνικά", bcp47: "el-GR" },
    Language { label: "עברית", bcp47: "he-IL" },
    Language { label: "ไทย", bcp47: "th-TH" },
    Language { label: "Tiếng Việt", bcp47: "vi-VN" },
    Language { label: "Bahasa Indonesia", bcp47: "id-ID" },
    Language { label: "Română", bcp47: "ro-RO" },
    Language { label: "Čeština", bcp47: "cs-CZ" },
    Language { label: "Slovenčina", bcp47: "sk-SK" },
    Language { label: "Magyar", bcp47: "hu-HU" },
    Language { label: "Українська", bcp47: "uk-UA" },
];

/// Look up a catalog entry by its BCP-47 tag
#[must_use]
pub fn find(tag: &str) -> Option<&'static Language> {
    CATALOG.iter().find(|l| l.bcp47.eq_ignore_ascii_case(tag))
}

/// Whether a tag references a catalog entry
#[must_use]
pub fn is_supported(tag: &str) -> bool {
    find(tag).is_some()
}

/// Derive the two-letter code the translation endpoint expects from a
/// BCP-47 region tag
///
/// Empty input falls back to `"en"`. Norwegian Bokmål (`nb`) maps to `no`,
/// which is the code the endpoint accepts.
#[must_use]
pub fn to_iso2(tag: &str) -> String {
    let base = tag
        .split('-')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if base.is_empty() {
        return "en".to_string();
    }
    if base == "nb" {
        return "no".to_string();
    }
    base
}
