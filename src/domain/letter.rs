//! Cover letter rules: length limits, recipient validation, file names.

use super::{CoverLetterDraft, DomainError, Language, RecipientInfo};
use chrono::{Locale, NaiveDate};

pub const MAX_RECIPIENT_LINE_LENGTH: usize = 26;
pub const MAX_SUBJECT_LENGTH: usize = 52;
pub const MAX_PARAGRAPH_LENGTH: usize = 400;
pub const MAX_TOTAL_LENGTH: usize = 2000;

const FORBIDDEN_RECIPIENT_CHARS: &[char] = &['[', ']', '{', '}', '(', ')', '<', '>', '|', '\\', '~', '^', '°'];
const FORBIDDEN_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Rejects drafts longer than `MAX_TOTAL_LENGTH` characters.
pub fn validate_draft(draft: &CoverLetterDraft) -> Result<(), DomainError> {
    let total = draft.total_len();
    if total > MAX_TOTAL_LENGTH {
        return Err(DomainError::Validation(format!(
            "cover letter is {} chars, limit is {}",
            total, MAX_TOTAL_LENGTH
        )));
    }
    Ok(())
}

/// At least one line must be present; every line fits the recipient column and
/// carries no markup characters.
pub fn is_valid_recipient(info: &RecipientInfo) -> bool {
    let lines: Vec<&str> = info
        .company_name
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(info.recipient.as_str()))
        .chain(info.address.iter().map(String::as_str))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return false;
    }
    lines.iter().all(|line| {
        line.chars().count() <= MAX_RECIPIENT_LINE_LENGTH
            && !line.contains(FORBIDDEN_RECIPIENT_CHARS)
    })
}

pub fn default_recipient(language: Language) -> RecipientInfo {
    RecipientInfo {
        company_name: None,
        recipient: language.neutral_recipient().to_string(),
        address: Vec::new(),
    }
}

/// Company, recipient, then address lines; empty lines dropped.
pub fn format_recipient(info: &RecipientInfo) -> String {
    info.company_name
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(info.recipient.as_str()))
        .chain(info.address.iter().map(String::as_str))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replaces characters most file systems reject and collapses whitespace runs into `_`.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if FORBIDDEN_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join("_")
}

/// `Cover_Letter_{last}_{company}.pdf`
pub fn letter_pdf_filename(last_name: &str, company: Option<&str>) -> String {
    sanitize_filename(&format!(
        "Cover_Letter_{}_{}.pdf",
        last_name,
        company.unwrap_or("company")
    ))
}

/// Name of the letter as uploaded to the application form.
pub fn upload_letter_name(
    language: Language,
    company: Option<&str>,
    first_name: &str,
    last_name: &str,
) -> String {
    let prefix = language.letter_prefix();
    match company.map(str::trim).filter(|c| !c.is_empty()) {
        Some(company) => format!("{}_{}.pdf", prefix, sanitize_filename(company)),
        None => format!(
            "{}_{}_{}.pdf",
            prefix,
            sanitize_filename(first_name),
            sanitize_filename(last_name)
        ),
    }
}

/// Blocks of a rendered letter, top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterLayout {
    /// Document title metadata.
    pub title: String,
    pub sender: String,
    pub recipient: String,
    pub date_line: String,
    pub subject: String,
    /// Paragraphs; blank lines are dropped by the renderer.
    pub body: String,
    pub signature: String,
}

/// City from a sender block: the first line after the name that reads "<zip> <city>".
/// A zip is 4 or 5 digits, optionally behind a country prefix ("CH-1003").
pub fn sender_city(sender: &str) -> Option<String> {
    sender
        .lines()
        .skip(1)
        .filter_map(|line| line.trim().split_once(char::is_whitespace))
        .find(|(zip, _)| is_zip_code(zip))
        .map(|(_, city)| city.trim().to_string())
        .filter(|city| !city.is_empty())
}

fn is_zip_code(token: &str) -> bool {
    let digits = match token.rsplit_once('-') {
        Some((country, digits)) if country.chars().all(|c| c.is_ascii_alphabetic()) => digits,
        Some(_) => return false,
        None => token,
    };
    (4..=5).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Localized place and date line.
pub fn date_line(language: Language, city: Option<&str>, date: NaiveDate) -> String {
    match language {
        Language::Fr => {
            let d = date.format_localized("%-d %B %Y", Locale::fr_FR);
            match city {
                Some(city) => format!("À {}, le {}", city, d),
                None => format!("Le {}", d),
            }
        }
        Language::De => {
            let d = date.format_localized("%-d. %B %Y", Locale::de_DE);
            match city {
                Some(city) => format!("{}, den {}", city, d),
                None => format!("Den {}", d),
            }
        }
        Language::It => {
            let d = date.format_localized("%-d %B %Y", Locale::it_IT);
            match city {
                Some(city) => format!("{}, {}", city, d),
                None => format!("Il {}", d),
            }
        }
        Language::En => {
            let d = date.format_localized("%B %-d, %Y", Locale::en_US);
            match city {
                Some(city) => format!("{}, {}", city, d),
                None => d.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with_intro(intro: String) -> CoverLetterDraft {
        CoverLetterDraft {
            subject: "Subject".into(),
            greeting: "Hello".into(),
            introduction: intro,
            skills_experience: "Skills".into(),
            motivation: "Motivation".into(),
            conclusion: "Conclusion".into(),
            closing: "Regards".into(),
        }
    }

    #[test]
    fn draft_over_limit_is_rejected() {
        assert!(validate_draft(&draft_with_intro("a".repeat(100))).is_ok());
        let err = validate_draft(&draft_with_intro("a".repeat(MAX_TOTAL_LENGTH))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn recipient_requires_short_clean_lines() {
        let ok = RecipientInfo {
            company_name: Some("Nettoyeurs SA".into()),
            recipient: "Monsieur Dupont".into(),
            address: vec!["Rue de la Paix 123".into(), "1009 Pully".into()],
        };
        assert!(is_valid_recipient(&ok));

        let long = RecipientInfo {
            company_name: Some("Bureau d'ingénieur de prestige international".into()),
            ..ok.clone()
        };
        assert!(!is_valid_recipient(&long));

        let markup = RecipientInfo {
            recipient: "[Recipient]".into(),
            ..ok.clone()
        };
        assert!(!is_valid_recipient(&markup));

        assert!(!is_valid_recipient(&RecipientInfo::default()));
    }

    #[test]
    fn neutral_recipient_per_language() {
        assert_eq!(default_recipient(Language::De).recipient, "An wen es betrifft");
        assert_eq!(default_recipient(Language::It).recipient, "A chi di competenza");
    }

    #[test]
    fn recipient_block_order() {
        let info = RecipientInfo {
            company_name: Some("Acme SA".into()),
            recipient: "Madame Müller".into(),
            address: vec!["Rue de l'Industrie 31".into(), "".into(), "1000 Lausanne".into()],
        };
        assert_eq!(
            format_recipient(&info),
            "Acme SA\nMadame Müller\nRue de l'Industrie 31\n1000 Lausanne"
        );
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("  a/b  c:d?.pdf "), "a_b_c_d_.pdf");
        assert_eq!(
            letter_pdf_filename("Doe", Some("Acme  SA / Vaud")),
            "Cover_Letter_Doe_Acme_SA___Vaud.pdf"
        );
    }

    #[test]
    fn city_is_taken_from_the_zip_line() {
        let sender = "Ada Lovelace\nRue du Lac 4\n1009 Pully\nada@example.com";
        assert_eq!(sender_city(sender).as_deref(), Some("Pully"));
        assert_eq!(sender_city("Ada Lovelace\nada@example.com"), None);
    }

    #[test]
    fn city_line_is_found_without_a_street() {
        let sender = "Ada Lovelace\n1009 Pully\n079 123 45 67\nada@example.com";
        assert_eq!(sender_city(sender).as_deref(), Some("Pully"));
        let prefixed = "Ada Lovelace\nRue du Lac 4\nCH-1009 Pully";
        assert_eq!(sender_city(prefixed).as_deref(), Some("Pully"));
        assert_eq!(sender_city("Ada Lovelace\n079 123 45 67\n0791234567 x"), None);
    }

    #[test]
    fn date_lines_follow_local_conventions() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert_eq!(date_line(Language::Fr, Some("Pully"), date), "À Pully, le 14 octobre 2026");
        assert_eq!(date_line(Language::De, Some("Zürich"), date), "Zürich, den 14. Oktober 2026");
        assert_eq!(date_line(Language::It, None, date), "Il 14 ottobre 2026");
        assert_eq!(date_line(Language::En, None, date), "October 14, 2026");
        assert_eq!(date_line(Language::En, Some("Geneva"), date), "Geneva, October 14, 2026");
    }

    #[test]
    fn upload_name_uses_company_or_applicant() {
        assert_eq!(
            upload_letter_name(Language::Fr, Some("Acme SA"), "Ada", "Lovelace"),
            "Lettre_Acme_SA.pdf"
        );
        assert_eq!(
            upload_letter_name(Language::De, None, "Ada", "Lovelace"),
            "Bewerbungsschreiben_Ada_Lovelace.pdf"
        );
    }
}
