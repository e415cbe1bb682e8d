//! Letter language. Detected from posting text; drives salutations, date lines and file names.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    De,
    It,
}

impl Language {
    /// Detects the language of `text`. Anything outside the four supported languages is English.
    pub fn detect(text: &str) -> Self {
        match whatlang::detect_lang(text) {
            Some(whatlang::Lang::Fra) => Self::Fr,
            Some(whatlang::Lang::Deu) => Self::De,
            Some(whatlang::Lang::Ita) => Self::It,
            _ => Self::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::De => "de",
            Self::It => "it",
        }
    }

    /// Neutral salutation used when no recipient can be extracted.
    pub fn neutral_recipient(self) -> &'static str {
        match self {
            Self::Fr => "À qui de droit",
            Self::De => "An wen es betrifft",
            Self::It => "A chi di competenza",
            Self::En => "To whom it may concern",
        }
    }

    /// File name prefix for an uploaded cover letter.
    pub fn letter_prefix(self) -> &'static str {
        match self {
            Self::Fr => "Lettre",
            Self::De => "Bewerbungsschreiben",
            Self::It => "Lettera",
            Self::En => "Letter",
        }
    }

    /// Human-readable name used inside prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Fr => "French",
            Self::De => "German",
            Self::It => "Italian",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_french_posting() {
        let text = "Nous recherchons un ingénieur logiciel motivé pour rejoindre notre équipe \
                    à Lausanne. Vous serez responsable du développement de nos applications.";
        assert_eq!(Language::detect(text), Language::Fr);
    }

    #[test]
    fn detects_german_posting() {
        let text = "Wir suchen einen motivierten Softwareentwickler für unser Team in Zürich. \
                    Sie sind verantwortlich für die Entwicklung unserer Anwendungen.";
        assert_eq!(Language::detect(text), Language::De);
    }

    #[test]
    fn unknown_text_falls_back_to_english() {
        assert_eq!(Language::detect(""), Language::En);
    }

    #[test]
    fn letter_prefix_by_language() {
        assert_eq!(Language::Fr.letter_prefix(), "Lettre");
        assert_eq!(Language::En.letter_prefix(), "Letter");
    }
}
