//! jobup.ch application form automation over WebDriver.
//!
//! Reuses an existing browser profile for the site session; a login link on the form means that
//! session is gone and the submission fails. Files are written to a temporary directory for the
//! upload and removed when the submission ends.

use super::form_plan::{self, Verification};
use super::urls::application_url;
use crate::domain::{
    DomainError, FormProfile, Platform, SubmissionOutcome, SubmissionRequest, UploadFile,
    UploadSection,
};
use crate::ports::FormSubmitter;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const ELEMENT_TIMEOUT: Duration = Duration::from_secs(5);
const SETTLE_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct WebDriverSettings {
    /// chromedriver / geckodriver endpoint, e.g. http://localhost:9515
    pub webdriver_url: String,
    pub site_url: String,
    pub headless: bool,
    /// Browser profile holding the logged-in site session.
    pub profile_dir: Option<PathBuf>,
    pub max_attempts: u32,
}

impl WebDriverSettings {
    pub fn new(webdriver_url: impl Into<String>, site_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            site_url: site_url.into(),
            headless: true,
            profile_dir: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

pub struct JobUpFormFiller {
    settings: WebDriverSettings,
}

fn automation(context: &'static str) -> impl Fn(CmdError) -> DomainError {
    move |e| DomainError::Automation(format!("{}: {}", context, e))
}

impl JobUpFormFiller {
    pub fn new(settings: WebDriverSettings) -> Self {
        Self { settings }
    }

    fn capabilities(&self) -> Map<String, Value> {
        let mut args = vec![
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            "--window-size=1280,1024".to_string(),
        ];
        if self.settings.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(dir) = &self.settings.profile_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        let mut caps = Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }

    async fn connect(&self) -> Result<Client, DomainError> {
        ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.settings.webdriver_url)
            .await
            .map_err(|e| {
                DomainError::Automation(format!(
                    "WebDriver session at {}: {}",
                    self.settings.webdriver_url, e
                ))
            })
    }

    async fn drive(
        &self,
        client: &Client,
        request: &SubmissionRequest,
    ) -> Result<SubmissionOutcome, DomainError> {
        let url = application_url(&self.settings.site_url, &request.external_id);
        client.goto(&url).await.map_err(automation("open form"))?;
        tokio::time::sleep(SETTLE_DELAY).await;

        if is_visible(client, form_plan::EXPIRED_MARKER).await? {
            info!(job = %request.external_id, "vacancy expired");
            return Ok(SubmissionOutcome::Expired);
        }
        if is_visible(client, form_plan::ALREADY_SENT_MARKER).await? {
            info!(job = %request.external_id, "application already sent");
            return Ok(SubmissionOutcome::AlreadyApplied);
        }

        ensure_session(client).await?;
        if is_visible(client, form_plan::COOKIE_ACCEPT).await? {
            click(client, form_plan::COOKIE_ACCEPT).await?;
        }

        let available = available_sections(client).await?;
        let files = form_plan::assign_sections(&request.files, &available);
        let staging = tempfile::tempdir()
            .map_err(|e| DomainError::Automation(format!("temp upload dir: {}", e)))?;
        let staged = stage_files(staging.path(), &files).await?;

        let mut verification = Verification {
            missing_fields: all_fields(),
            missing_files: files.iter().map(|f| f.name.clone()).collect(),
        };
        for attempt in 1..=self.settings.max_attempts {
            debug!(attempt, ?verification, "filling form");
            fill_fields(client, &request.form, &verification.missing_fields).await;
            upload_files(client, &staged, &verification.missing_files).await;
            tokio::time::sleep(SETTLE_DELAY).await;

            verification = verify(client, &request.form, &files).await?;
            if verification.is_complete() {
                let button = if request.direct_apply {
                    form_plan::APPLY_BUTTON
                } else {
                    form_plan::SAVE_BUTTON
                };
                click(client, button).await?;
                tokio::time::sleep(SETTLE_DELAY).await;
                info!(job = %request.external_id, direct = request.direct_apply, "form submitted");
                return Ok(SubmissionOutcome::Submitted);
            }
            warn!(
                attempt,
                fields = ?verification.missing_fields,
                files = ?verification.missing_files,
                "form incomplete"
            );
        }

        Ok(SubmissionOutcome::Incomplete {
            missing_fields: verification.missing_fields,
            missing_files: verification.missing_files,
        })
        // `staging` drops here and removes the uploaded copies
    }
}

#[async_trait::async_trait]
impl FormSubmitter for JobUpFormFiller {
    fn platform(&self) -> Platform {
        Platform::JobUp
    }

    #[instrument(skip(self, request), fields(job = %request.external_id))]
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionOutcome, DomainError> {
        request.form.validate()?;
        let client = self.connect().await?;
        let outcome = self.drive(&client, request).await;
        if let Err(e) = client.close().await {
            warn!(error = %e, "closing WebDriver session failed");
        }
        outcome
    }
}

/// Staged file with its on-disk path.
struct StagedFile {
    file: UploadFile,
    path: PathBuf,
}

async fn stage_files(dir: &Path, files: &[UploadFile]) -> Result<Vec<StagedFile>, DomainError> {
    let mut staged: Vec<StagedFile> = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        // A clash gets an index prefix; the upload name stays a substring for verification.
        let mut path = dir.join(&file.name);
        if staged.iter().any(|s| s.path == path) {
            path = dir.join(format!("{}_{}", index + 1, file.name));
        }
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| DomainError::Automation(format!("stage {}: {}", file.name, e)))?;
        staged.push(StagedFile {
            file: file.clone(),
            path,
        });
    }
    Ok(staged)
}

fn all_fields() -> Vec<String> {
    form_plan::TEXT_INPUTS
        .iter()
        .map(|(name, _)| name.to_string())
        .chain(
            ["gender", "availability", "work_permit", "requirements"]
                .iter()
                .map(|s| s.to_string()),
        )
        .collect()
}

fn text_value<'a>(form: &'a FormProfile, field: &str) -> &'a str {
    match field {
        "firstname" => &form.first_name,
        "lastname" => &form.last_name,
        "email" => &form.email,
        "phone" => &form.phone,
        "zipCode" => &form.zip_code,
        _ => "",
    }
}

async fn is_visible(client: &Client, selector: &str) -> Result<bool, DomainError> {
    let elements = client
        .find_all(Locator::Css(selector))
        .await
        .map_err(automation("find elements"))?;
    for element in elements {
        if element.is_displayed().await.unwrap_or(false) {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn click(client: &Client, selector: &str) -> Result<(), DomainError> {
    let element = client
        .wait()
        .at_most(ELEMENT_TIMEOUT)
        .for_element(Locator::Css(selector))
        .await
        .map_err(|e| DomainError::Automation(format!("wait for {}: {}", selector, e)))?;
    element
        .click()
        .await
        .map_err(|e| DomainError::Automation(format!("click {}: {}", selector, e)))
}

async fn ensure_session(client: &Client) -> Result<(), DomainError> {
    if is_visible(client, form_plan::LOGIN_TEASER).await? {
        debug!("login teaser shown, opening it");
        click(client, form_plan::LOGIN_TEASER).await?;
        tokio::time::sleep(SETTLE_DELAY).await;
    }
    if is_visible(client, form_plan::LOGIN_LINK).await? {
        return Err(DomainError::Automation(
            "site session expired: log in with the configured browser profile".into(),
        ));
    }
    Ok(())
}

async fn available_sections(client: &Client) -> Result<Vec<UploadSection>, DomainError> {
    let mut sections = Vec::new();
    for section in [
        UploadSection::Cv,
        UploadSection::Motivation,
        UploadSection::Other,
    ] {
        if is_visible(client, &form_plan::section_head(section)).await? {
            sections.push(section);
        }
    }
    Ok(sections)
}

/// Best effort; whatever stays wrong shows up in the next verification.
async fn fill_fields(client: &Client, form: &FormProfile, fields: &[String]) {
    for field in fields {
        let result = match field.as_str() {
            "gender" => select_gender(client, form).await,
            "availability" => select_availability(client, form.availability).await,
            "work_permit" => select_work_permit(client, form.work_permit).await,
            "requirements" => answer_requirements(client, form.auto_answer_requirements).await,
            name => fill_text(client, name, text_value(form, name)).await,
        };
        if let Err(e) = result {
            warn!(field = %field, error = %e, "could not fill field");
        }
    }
}

async fn fill_text(client: &Client, name: &str, value: &str) -> Result<(), DomainError> {
    let Some((_, selector)) = form_plan::TEXT_INPUTS.iter().find(|(n, _)| *n == name) else {
        return Ok(());
    };
    if !is_visible(client, selector).await? {
        return Ok(());
    }
    let input = client
        .find(Locator::Css(selector))
        .await
        .map_err(automation("find input"))?;
    input.clear().await.map_err(automation("clear input"))?;
    input.send_keys(value).await.map_err(automation("type input"))
}

async fn select_gender(client: &Client, form: &FormProfile) -> Result<(), DomainError> {
    let button = form_plan::gender_button(form.gender.as_str());
    if is_visible(client, &button).await? {
        click(client, &button).await?;
    }
    Ok(())
}

async fn select_availability(client: &Client, availability: u8) -> Result<(), DomainError> {
    if !is_visible(client, form_plan::AVAILABILITY_TRIGGER).await? {
        return Ok(());
    }
    let item = form_plan::availability_item(availability)?;
    click(client, form_plan::AVAILABILITY_TRIGGER).await?;
    click(client, &item).await
}

async fn select_work_permit(client: &Client, permit: u8) -> Result<(), DomainError> {
    if !is_visible(client, form_plan::WORK_PERMIT_TRIGGER).await? {
        return Ok(());
    }
    let item = form_plan::work_permit_item(permit)?;
    click(client, form_plan::WORK_PERMIT_TRIGGER).await?;
    click(client, &item).await
}

async fn requirement_count(client: &Client) -> Result<usize, DomainError> {
    if !is_visible(client, form_plan::REQUIREMENTS_BLOCK).await? {
        return Ok(0);
    }
    client
        .find_all(Locator::Css(form_plan::REQUIREMENT_ITEMS))
        .await
        .map(|items| items.len())
        .map_err(automation("find requirements"))
}

async fn answer_requirements(client: &Client, auto_answer: bool) -> Result<(), DomainError> {
    if !auto_answer {
        return Ok(());
    }
    for index in 0..requirement_count(client).await? {
        click(client, &form_plan::requirement_yes(index)).await?;
    }
    Ok(())
}

async fn upload_files(client: &Client, staged: &[StagedFile], names: &[String]) {
    for staged_file in staged.iter().filter(|s| names.contains(&s.file.name)) {
        if let Err(e) = upload_one(client, staged_file).await {
            warn!(file = %staged_file.file.name, error = %e, "upload failed");
        }
    }
}

async fn upload_one(client: &Client, staged: &StagedFile) -> Result<(), DomainError> {
    let section = staged.file.section;
    let head = form_plan::section_head(section);
    if is_visible(client, &head).await? {
        click(client, &head).await?;
    }
    let input = client
        .find(Locator::Css(&form_plan::section_input(section)))
        .await
        .map_err(automation("find file input"))?;
    input
        .send_keys(&staged.path.to_string_lossy())
        .await
        .map_err(automation("send file"))
}

async fn verify(
    client: &Client,
    form: &FormProfile,
    files: &[UploadFile],
) -> Result<Verification, DomainError> {
    let mut result = Verification::default();

    for (name, selector) in form_plan::TEXT_INPUTS {
        if !is_visible(client, selector).await? {
            continue;
        }
        let current = client
            .find(Locator::Css(selector))
            .await
            .map_err(automation("find input"))?
            .prop("value")
            .await
            .map_err(automation("read input"))?
            .unwrap_or_default();
        if current != text_value(form, name) {
            result.missing_fields.push(name.to_string());
        }
    }

    let gender_shown = is_visible(client, &form_plan::gender_button("male")).await?
        || is_visible(client, &form_plan::gender_button("female")).await?;
    if gender_shown && !is_visible(client, &form_plan::gender_pressed(form.gender.as_str())).await?
    {
        result.missing_fields.push("gender".into());
    }

    if is_visible(client, form_plan::AVAILABILITY_TRIGGER).await? {
        let index = form_plan::availability_item_index(form.availability)?;
        if !menu_selected(client, form_plan::AVAILABILITY_TRIGGER, usize::from(index)).await? {
            result.missing_fields.push("availability".into());
        }
    }

    if is_visible(client, form_plan::WORK_PERMIT_TRIGGER).await? {
        let index = usize::from(form.work_permit.saturating_sub(1));
        if !menu_selected(client, form_plan::WORK_PERMIT_TRIGGER, index).await? {
            result.missing_fields.push("work_permit".into());
        }
    }

    for index in 0..requirement_count(client).await? {
        let [yes, no] = form_plan::requirement_answered(index);
        if !is_visible(client, &yes).await? && !is_visible(client, &no).await? {
            result.missing_fields.push("requirements".into());
            break;
        }
    }

    let source = client.source().await.map_err(automation("page source"))?;
    result.missing_files = files
        .iter()
        .filter(|f| !source.contains(&f.name))
        .map(|f| f.name.clone())
        .collect();

    Ok(result)
}

/// Opens the menu, checks the selected item and closes it again.
async fn menu_selected(client: &Client, trigger: &str, index: usize) -> Result<bool, DomainError> {
    click(client, trigger).await?;
    let selected = is_visible(
        client,
        &format!("div[data-cy='select-item-{}'][aria-selected='true']", index),
    )
    .await?;
    click(client, trigger).await?;
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_carry_profile_and_headless_flags() {
        let mut settings = WebDriverSettings::new("http://localhost:9515", "https://www.jobup.ch");
        settings.profile_dir = Some(PathBuf::from("/tmp/jobup-profile"));
        let caps = JobUpFormFiller::new(settings).capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--user-data-dir=/tmp/jobup-profile"));
    }

    #[test]
    fn first_pass_fills_every_field() {
        let fields = all_fields();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], "firstname");
        assert!(fields.contains(&"work_permit".to_string()));
    }

    #[tokio::test]
    async fn staged_files_use_upload_names() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![UploadFile {
            section: UploadSection::Motivation,
            name: "Lettre_Acme_SA.pdf".into(),
            bytes: b"%PDF".to_vec(),
        }];
        let staged = stage_files(dir.path(), &files).await.unwrap();
        assert_eq!(staged[0].path, dir.path().join("Lettre_Acme_SA.pdf"));
        assert_eq!(std::fs::read(&staged[0].path).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn clashing_upload_names_are_staged_apart() {
        let dir = tempfile::tempdir().unwrap();
        let file = |section, bytes: &[u8]| UploadFile {
            section,
            name: "Ada_Lovelace.pdf".into(),
            bytes: bytes.to_vec(),
        };
        let files = vec![
            file(UploadSection::Motivation, b"%PDF letter"),
            file(UploadSection::Cv, b"%PDF cv"),
        ];
        let staged = stage_files(dir.path(), &files).await.unwrap();
        assert_eq!(staged[0].path, dir.path().join("Ada_Lovelace.pdf"));
        assert_eq!(staged[1].path, dir.path().join("2_Ada_Lovelace.pdf"));
        assert_eq!(std::fs::read(&staged[0].path).unwrap(), b"%PDF letter");
        assert_eq!(std::fs::read(&staged[1].path).unwrap(), b"%PDF cv");
    }
}
