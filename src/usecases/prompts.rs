//! Prompt templates for the language model.
//!
//! Every prompt spells out the JSON object it expects back; the LLM adapters request
//! JSON mode and parse the answer into `serde_json::Value`.

use crate::domain::letter::{
    MAX_PARAGRAPH_LENGTH, MAX_RECIPIENT_LINE_LENGTH, MAX_SUBJECT_LENGTH, MAX_TOTAL_LENGTH,
};
use crate::domain::{Language, Preferences};

pub fn letter_system(language: Language) -> String {
    format!(
        "You are an expert Swiss cover letter writer who creates personalized, professional cover letters.\n\
         Follow Swiss business standards and etiquette.\n\
         Key requirements:\n\
         - Formal yet engaging tone\n\
         - Swiss letter structure: subject, greeting, body, closing\n\
         - Content specific to the job and the company\n\
         - At most {total} characters in total\n\
         - Written in {language} following local conventions\n\
         - Relevant and concise, without generic phrases or clichés\n\
         - Genuine interest in the position",
        total = MAX_TOTAL_LENGTH,
        language = language.display_name(),
    )
}

pub fn letter_user(cv_text: &str, job_context: &str, language: Language) -> String {
    format!(
        "Create a cover letter based on the following information.\n\n\
         Candidate profile:\n{cv}\n\n\
         Job description:\n{job}\n\n\
         Structure:\n\
         - subject: clear subject line, max {subject} characters\n\
         - greeting: professional greeting\n\
         - introduction: why this position interests the candidate\n\
         - skills_experience: how the candidate matches the requirements\n\
         - motivation: value the candidate brings to the company\n\
         - conclusion: call to action and availability\n\
         - closing: the customary formal closing in {language}, e.g. \
         \"Je vous prie d'agréer, Madame, Monsieur, mes salutations distinguées.\", \
         \"Mit freundlichen Grüssen\" or \"Yours sincerely\"\n\n\
         Length: each paragraph at most {paragraph} characters, {total} characters in total.\n\
         Be specific about achievements and skills, use active voice and show knowledge of the company.\n\
         Never include placeholders such as [Your Name]; the candidate's name is added separately.\n\n\
         Answer with a JSON object with the string fields \
         \"subject\", \"greeting\", \"introduction\", \"skills_experience\", \"motivation\", \
         \"conclusion\" and \"closing\".",
        cv = cv_text,
        job = job_context,
        subject = MAX_SUBJECT_LENGTH,
        paragraph = MAX_PARAGRAPH_LENGTH,
        total = MAX_TOTAL_LENGTH,
        language = language.display_name(),
    )
}

/// Style sample section prepended to the letter prompt.
pub fn reference_style(reference_letter: &str) -> String {
    format!(
        "Study this reference letter to understand the writer's style:\n\n{}\n\n\
         Mirror its tone, sentence structure, rhythm and the way it presents achievements and \
         connects ideas. Do not copy phrases, examples or structure: write a new letter that reads \
         as if the same person wrote it for this role.\n\n",
        reference_letter.trim()
    )
}

pub fn recipient_system(language: Language) -> String {
    format!(
        "You extract and format recipient information for Swiss business correspondence. \
         The result goes directly into a cover letter written in {}. \
         Never invent or assume details and never write things like \"not specified\".",
        language.display_name()
    )
}

pub fn recipient_user(job_context: &str) -> String {
    format!(
        "Extract the recipient of a cover letter from this job description.\n\n\
         Job description:\n{job}\n\n\
         Guidelines:\n\
         1. Company name exactly as written, shortened if needed to fit {line} characters. \
         Leave it null when no company is named.\n\
         2. Recipient: a named contact person in the traditional form of the posting's language \
         (\"Monsieur Dupont\", \"Herr Müller\", \"Ms. Smith\"); otherwise a neutral term \
         (\"À qui de droit\", \"An wen es betrifft\", \"A chi di competenza\", \"To whom it may concern\").\n\
         3. Address: street and number on the first line (\"Rue de la Paix 123\"), postal code and \
         city on the second (\"1009 Pully\"). Leave it empty when no address is given.\n\
         Every line must fit {line} characters. When in doubt, omit rather than guess.\n\n\
         Answer with a JSON object: {{\"company_name\": string or null, \"recipient\": string, \
         \"address\": [string]}}",
        job = job_context,
        line = MAX_RECIPIENT_LINE_LENGTH,
    )
}

pub fn keywords_system() -> &'static str {
    "You are an expert job title generator. Analyze a CV and the user's preferences and produce \
     the job titles that best match the profile, the experience level and above all the career \
     aspirations. Only output real job titles used by employers, following the regional job \
     market conventions."
}

pub fn keywords_user(cv_text: &str, preferences: &Preferences, language: Language) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            "none".to_string()
        } else {
            items.join(", ")
        }
    };
    format!(
        "Generate exactly 5 job titles for this person.\n\n\
         CV:\n{cv}\n\n\
         Preferences:\n\
         - Desired titles: {titles}\n\
         - Locations: {locations}\n\
         - Avoid: {exclusions}\n\
         - Goals: {notes}\n\n\
         Use standard titles found in real {language} job postings, matching both experience and \
         aspirations.\n\n\
         Answer with a JSON object: {{\"keywords\": [5 strings]}}",
        cv = cv_text,
        titles = list(&preferences.titles),
        locations = list(&preferences.locations),
        exclusions = list(&preferences.exclusions),
        notes = preferences.notes.as_deref().unwrap_or("none"),
        language = language.display_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_name_their_json_shape() {
        assert!(recipient_user("job").contains("\"recipient\""));
        assert!(keywords_user("cv", &Preferences::default(), Language::Fr).contains("\"keywords\""));
        let letter = letter_user("cv", "job", Language::De);
        assert!(letter.contains("\"skills_experience\""));
        assert!(!letter.contains("\"recipient\""));
        assert!(!letter.contains("\"keywords\""));
        assert!(letter_system(Language::De).contains("German"));
    }

    #[test]
    fn keyword_prompt_lists_preferences() {
        let prefs = Preferences {
            titles: vec!["Rust Developer".into(), "SRE".into()],
            exclusions: vec!["Java".into()],
            ..Preferences::default()
        };
        let prompt = keywords_user("cv", &prefs, Language::En);
        assert!(prompt.contains("Desired titles: Rust Developer, SRE"));
        assert!(prompt.contains("Avoid: Java"));
        assert!(prompt.contains("Locations: none"));
    }
}
