use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Target language for generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    UzbekLatin,
    UzbekCyrillic,
    Russian,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::UzbekLatin,
        Language::UzbekCyrillic,
        Language::Russian,
    ];

    /// Resolve a language code. Unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "uz-L" => Language::UzbekLatin,
            "uz-C" => Language::UzbekCyrillic,
            "ru" => Language::Russian,
            _ => Language::English,
        }
    }

    pub fn is_supported(code: &str) -> bool {
        Self::ALL.iter().any(|lang| lang.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::UzbekLatin => "uz-L",
            Language::UzbekCyrillic => "uz-C",
            Language::Russian => "ru",
        }
    }

    /// Label embedded into prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::UzbekLatin => "Uzbek (Latin script)",
            Language::UzbekCyrillic => "Uzbek (Cyrillic script)",
            Language::Russian => "Russian",
        }
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Language::from_code(&code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_codes_map_to_fixed_labels() {
        assert_eq!(Language::from_code("en").label(), "English");
        assert_eq!(Language::from_code("uz-L").label(), "Uzbek (Latin script)");
        assert_eq!(
            Language::from_code("uz-C").label(),
            "Uzbek (Cyrillic script)"
        );
        assert_eq!(Language::from_code("ru").label(), "Russian");
    }

    #[test]
    fn unknown_codes_fall_back_to_english() {
        for code in ["", "de", "EN", "uz", "uz-l", "russian"] {
            assert_eq!(Language::from_code(code), Language::English, "{code}");
        }
        assert!(!Language::is_supported("de"));
    }

    #[test]
    fn codes_round_trip_through_serde() {
        for lang in Language::ALL {
            assert!(Language::is_supported(lang.code()));
            let json = serde_json::to_string(&lang).unwrap();
            let back: Language = serde_json::from_str(&json).unwrap();
            assert_eq!(back, lang);
        }
        let fallback: Language = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(fallback, Language::English);
    }
}
