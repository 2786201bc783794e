//! Language code to display name mapping for prompt instructions.

/// Uppercase display name of a language code, as written into prompts.
///
/// Region subtags are honored only for Chinese (`zh-TW`, `zh-Hant` map to
/// traditional). Unknown codes come back uppercased.
pub fn language_display_name(code: &str) -> String {
    let code = code.trim().to_lowercase().replace('_', "-");
    if matches!(code.as_str(), "zh-tw" | "zh-hk" | "zh-hant") {
        return "TRADITIONAL CHINESE".into();
    }

    let primary = code.split('-').next().unwrap_or_default();
    let name = match primary {
        "" | "en" => "ENGLISH",
        "zh" => "SIMPLIFIED CHINESE",
        "es" => "SPANISH",
        "fr" => "FRENCH",
        "de" => "GERMAN",
        "it" => "ITALIAN",
        "pt" => "PORTUGUESE",
        "ja" => "JAPANESE",
        "ko" => "KOREAN",
        "ru" => "RUSSIAN",
        "ar" => "ARABIC",
        "hi" => "HINDI",
        "nl" => "DUTCH",
        "tr" => "TURKISH",
        "pl" => "POLISH",
        "vi" => "VIETNAMESE",
        "th" => "THAI",
        "id" => "INDONESIAN",
        _ => return code.to_uppercase(),
    };
    name.into()
}

/// True when the code selects English output.
pub fn is_english(code: &str) -> bool {
    language_display_name(code) == "ENGLISH"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(language_display_name("en"), "ENGLISH");
        assert_eq!(language_display_name("zh"), "SIMPLIFIED CHINESE");
        assert_eq!(language_display_name("zh-CN"), "SIMPLIFIED CHINESE");
        assert_eq!(language_display_name("zh_TW"), "TRADITIONAL CHINESE");
        assert_eq!(language_display_name(" ES "), "SPANISH");
    }

    #[test]
    fn unknown_code_is_uppercased() {
        assert_eq!(language_display_name("sw"), "SW");
        assert_eq!(language_display_name("xx-yy"), "XX-YY");
    }

    #[test]
    fn english_detection() {
        assert!(is_english("en"));
        assert!(is_english("en-GB"));
        assert!(is_english(""));
        assert!(!is_english("fr"));
    }
}
