//! Selectors and pure planning steps of the jobup application form.

use crate::domain::{DomainError, UploadFile, UploadSection};

pub const EXPIRED_MARKER: &str = "img[data-cy='application-expired-vacancy']";
pub const ALREADY_SENT_MARKER: &str = "img[alt='Application confirmation']";
pub const LOGIN_TEASER: &str = "button[data-cy='login-teaser-trigger']";
pub const LOGIN_LINK: &str = "button[data-cy='login-link']";
pub const COOKIE_ACCEPT: &str = "button[data-cy='cookie-consent-modal-primary']";
pub const AVAILABILITY_TRIGGER: &str = "#availability-trigger";
pub const WORK_PERMIT_TRIGGER: &str = "#workPermit-trigger";
pub const REQUIREMENTS_BLOCK: &str = "div[data-cy='requirements-input']";
pub const REQUIREMENT_ITEMS: &str = "div[data-cy^='requirement-']";
pub const APPLY_BUTTON: &str = ".ml_s0 > .ai_center";
pub const SAVE_BUTTON: &str = ".d_inline-flex > .ai_center";

/// Text inputs as (form field name, input selector).
pub const TEXT_INPUTS: [(&str, &str); 5] = [
    ("firstname", "input[name='firstname']"),
    ("lastname", "input[name='lastname']"),
    ("email", "input[name='email']"),
    ("phone", "input[name='phone']"),
    ("zipCode", "input[name='zipCode']"),
];

pub fn gender_button(gender: &str) -> String {
    format!("button[value='{}']", gender)
}

pub fn gender_pressed(gender: &str) -> String {
    format!("button[value='{}'][aria-pressed='true']", gender)
}

/// The availability menu lists the choices in reverse order.
pub fn availability_item_index(availability: u8) -> Result<u8, DomainError> {
    if availability > 6 {
        return Err(DomainError::Validation(format!(
            "availability {} out of range (0-6)",
            availability
        )));
    }
    Ok(6 - availability)
}

pub fn availability_item(availability: u8) -> Result<String, DomainError> {
    availability_item_index(availability).map(|i| format!("div[data-cy='select-item-{}']", i))
}

pub fn work_permit_item(permit: u8) -> Result<String, DomainError> {
    if !(1..=10).contains(&permit) {
        return Err(DomainError::Validation(format!(
            "work permit {} out of range (1-10)",
            permit
        )));
    }
    Ok(format!("#workPermit div[aria-posinset='{}']", permit))
}

pub fn requirement_yes(index: usize) -> String {
    format!("div[data-cy='requirement-{}'] button[value='true']", index)
}

/// Either answer pressed.
pub fn requirement_answered(index: usize) -> [String; 2] {
    [
        format!("div[data-cy='requirement-{}'] button[value='true'][aria-pressed='true']", index),
        format!("div[data-cy='requirement-{}'] button[value='false'][aria-pressed='true']", index),
    ]
}

pub fn section_head(section: UploadSection) -> String {
    format!("div[data-cy='document-section-head-{}']", section.as_str())
}

pub fn section_input(section: UploadSection) -> String {
    format!("div[data-cy='document-section-{}'] input[type='file']", section.as_str())
}

/// Moves CV and letter files to "other" when the form lacks their section.
pub fn assign_sections(files: &[UploadFile], available: &[UploadSection]) -> Vec<UploadFile> {
    files
        .iter()
        .map(|file| {
            let section = match file.section {
                UploadSection::Cv | UploadSection::Motivation
                    if !available.contains(&file.section) =>
                {
                    UploadSection::Other
                }
                s => s,
            };
            UploadFile {
                section,
                ..file.clone()
            }
        })
        .collect()
}

/// Field names still to fix after a verification pass, in fill order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Verification {
    pub missing_fields: Vec<String>,
    pub missing_files: Vec<String>,
}

impl Verification {
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty() && self.missing_files.is_empty()
    }
}
