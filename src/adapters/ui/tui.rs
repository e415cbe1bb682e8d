//! Implements InputPort. Inquire-based interactive menu over the use cases.
//!
//! Esc on a prompt returns to the menu; Ctrl-C on the menu quits.

use crate::adapters::persistence::csv_export::export_postings;
use crate::domain::{
    DomainError, FormProfile, Gender, JobRecord, Language, NewProfile, Platform, Preferences,
    UserProfile,
};
use crate::ports::{ApplicationRepo, InputPort, JobRepo, ProfileRepo, SettingsPort};
use crate::usecases::{
    ApplyService, CoverLetterService, DocumentService, KeywordScheduler, ScrapeService,
    SearchTermGenerator, search_postings,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, CustomType, Select, Text};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

const PREVIEW_LIMIT: usize = 10;

/// Applies the prompt theme for all subsequent inquire prompts.
pub fn apply_theme() {
    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(Color::LightCyan))
        .with_highlighted_option_prefix(Styled::new("▸").with_fg(Color::LightMagenta));
    inquire::set_global_render_config(config);
}

/// Everything the menu drives.
pub struct UiServices {
    pub jobs: Arc<dyn JobRepo>,
    pub profiles: Arc<dyn ProfileRepo>,
    pub applications: Arc<dyn ApplicationRepo>,
    pub settings: Arc<dyn SettingsPort>,
    pub terms: Arc<SearchTermGenerator>,
    pub scrape: Arc<ScrapeService>,
    pub letters: Arc<CoverLetterService>,
    pub documents: Arc<DocumentService>,
    pub apply: Arc<ApplyService>,
    pub scheduler_interval: Duration,
    pub max_applications: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SelectProfile,
    CreateProfile,
    ImportCv,
    EditPreferences,
    EditFormAnswers,
    GenerateTerms,
    EditFilters,
    Preview,
    Scrape,
    DraftLetter,
    BuildPdf,
    BuildAll,
    AutoApply,
    Approve,
    SubmitApproved,
    ListApplications,
    Scheduler,
    ExportCsv,
    ExportSettings,
    ImportSettings,
    Quit,
}

impl Action {
    const ALL: [Action; 21] = [
        Action::SelectProfile,
        Action::CreateProfile,
        Action::ImportCv,
        Action::EditPreferences,
        Action::EditFormAnswers,
        Action::GenerateTerms,
        Action::EditFilters,
        Action::Preview,
        Action::Scrape,
        Action::DraftLetter,
        Action::BuildPdf,
        Action::BuildAll,
        Action::AutoApply,
        Action::Approve,
        Action::SubmitApproved,
        Action::ListApplications,
        Action::Scheduler,
        Action::ExportCsv,
        Action::ExportSettings,
        Action::ImportSettings,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::SelectProfile => "Select profile",
            Action::CreateProfile => "Create profile",
            Action::ImportCv => "Import CV (PDF)",
            Action::EditPreferences => "Edit preferences",
            Action::EditFormAnswers => "Edit application form answers",
            Action::GenerateTerms => "Generate search keywords",
            Action::EditFilters => "Edit search filters",
            Action::Preview => "Preview search results",
            Action::Scrape => "Scrape postings",
            Action::DraftLetter => "Draft cover letter",
            Action::BuildPdf => "Build letter PDF",
            Action::BuildAll => "Build PDFs for all drafted letters",
            Action::AutoApply => "Auto-apply to quick-apply postings",
            Action::Approve => "Approve posting for review",
            Action::SubmitApproved => "Submit approved application",
            Action::ListApplications => "List applications",
            Action::Scheduler => "Run keyword scheduler",
            Action::ExportCsv => "Export postings to CSV",
            Action::ExportSettings => "Export search settings",
            Action::ImportSettings => "Import search settings",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Select option carrying a value behind its label.
struct Choice<T> {
    label: String,
    value: T,
}

impl<T> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn ui_err(e: InquireError) -> DomainError {
    DomainError::Ui(e.to_string())
}

fn is_cancel(e: &DomainError) -> bool {
    matches!(e, DomainError::Ui(msg) if msg.contains("canceled"))
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn optional(input: String) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Runs `fut` behind a spinner.
async fn with_spinner<T>(message: &str, fut: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = fut.await;
    spinner.finish_and_clear();
    out
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    services: UiServices,
    current_user: Mutex<Option<i64>>,
}

impl TuiInputPort {
    pub fn new(services: UiServices) -> Self {
        Self {
            services,
            current_user: Mutex::new(None),
        }
    }

    fn current(&self) -> Option<i64> {
        self.current_user.lock().ok().and_then(|g| *g)
    }

    fn set_current(&self, id: i64) {
        if let Ok(mut guard) = self.current_user.lock() {
            *guard = Some(id);
        }
    }

    /// The selected profile, prompting for one when none is selected yet.
    async fn user(&self) -> Result<UserProfile, DomainError> {
        if let Some(id) = self.current() {
            if let Some(profile) = self.services.profiles.get_profile(id).await? {
                return Ok(profile);
            }
        }
        self.select_profile().await
    }

    async fn select_profile(&self) -> Result<UserProfile, DomainError> {
        let profiles = self.services.profiles.list_profiles().await?;
        if profiles.is_empty() {
            println!("No profile yet.");
            return self.create_profile().await;
        }
        let options: Vec<Choice<UserProfile>> = profiles
            .into_iter()
            .map(|p| Choice {
                label: format!("{} <{}>", p.full_name(), p.email),
                value: p,
            })
            .collect();
        let chosen = Select::new("Profile:", options).prompt().map_err(ui_err)?;
        self.set_current(chosen.value.id);
        Ok(chosen.value)
    }

    async fn create_profile(&self) -> Result<UserProfile, DomainError> {
        let first_name = Text::new("First name:").prompt().map_err(ui_err)?;
        let last_name = Text::new("Last name:").prompt().map_err(ui_err)?;
        let email = Text::new("Email:").prompt().map_err(ui_err)?;
        let username = Text::new("Username:")
            .with_default(&first_name.to_lowercase())
            .prompt()
            .map_err(ui_err)?;
        let street = Text::new("Street and number:").prompt().map_err(ui_err)?;
        let city = Text::new("Zip code and city (e.g. 1003 Lausanne):")
            .prompt()
            .map_err(ui_err)?;
        let phone = Text::new("Phone:").prompt().map_err(ui_err)?;
        let contact_info = [
            format!("{} {}", first_name.trim(), last_name.trim()),
            street,
            city,
            phone,
            email.clone(),
        ]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
        let reference = Text::new("Reference letter file (optional):")
            .prompt()
            .map_err(ui_err)?;
        let reference_letter = match optional(reference) {
            Some(path) => Some(
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| DomainError::Ui(format!("read {}: {}", path, e)))?,
            ),
            None => None,
        };

        let profile = self
            .services
            .profiles
            .create_profile(&NewProfile {
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                email: email.trim().to_string(),
                username: username.trim().to_string(),
                contact_info: Some(contact_info),
                cv_text: None,
                reference_letter,
                preferences: Preferences::default(),
            })
            .await?;
        self.set_current(profile.id);
        println!("Profile {} created.", profile.id);
        Ok(profile)
    }

    async fn import_cv(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let path = Text::new("CV PDF path:").prompt().map_err(ui_err)?;
        let path = PathBuf::from(path.trim());
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DomainError::Ui(format!("read {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "CV.pdf".to_string());
        let profile = with_spinner(
            "Extracting CV text...",
            self.services.documents.import_cv(user.id, &name, bytes),
        )
        .await?;
        let chars = profile.cv_text.as_deref().map_or(0, |t| t.chars().count());
        println!("CV imported ({} characters of text).", chars);
        Ok(())
    }

    async fn edit_preferences(&self) -> Result<(), DomainError> {
        let mut user = self.user().await?;
        let prefs = &user.preferences;
        let titles = Text::new("Desired job titles (comma separated):")
            .with_default(&prefs.titles.join(", "))
            .prompt()
            .map_err(ui_err)?;
        let locations = Text::new("Locations (comma separated):")
            .with_default(&prefs.locations.join(", "))
            .prompt()
            .map_err(ui_err)?;
        let exclusions = Text::new("Exclude postings mentioning (comma separated):")
            .with_default(&prefs.exclusions.join(", "))
            .prompt()
            .map_err(ui_err)?;
        let notes = Text::new("Career goals (optional):")
            .with_default(prefs.notes.as_deref().unwrap_or(""))
            .prompt()
            .map_err(ui_err)?;
        user.preferences = Preferences {
            titles: split_list(&titles),
            locations: split_list(&locations),
            exclusions: split_list(&exclusions),
            notes: optional(notes),
        };
        self.services.profiles.update_profile(&user).await?;
        println!("Preferences saved.");
        Ok(())
    }

    async fn edit_form_answers(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let current = self
            .services
            .profiles
            .get_form_profile(user.id, Platform::JobUp)
            .await?;
        let default = |pick: fn(&FormProfile) -> String, fallback: String| {
            current.as_ref().map(pick).unwrap_or(fallback)
        };

        let first_name = Text::new("First name:")
            .with_default(&default(|f| f.first_name.clone(), user.first_name.clone()))
            .prompt()
            .map_err(ui_err)?;
        let last_name = Text::new("Last name:")
            .with_default(&default(|f| f.last_name.clone(), user.last_name.clone()))
            .prompt()
            .map_err(ui_err)?;
        let email = Text::new("Email:")
            .with_default(&default(|f| f.email.clone(), user.email.clone()))
            .prompt()
            .map_err(ui_err)?;
        let phone = Text::new("Phone:")
            .with_default(&default(|f| f.phone.clone(), String::new()))
            .prompt()
            .map_err(ui_err)?;
        let zip_code = Text::new("Zip code:")
            .with_default(&default(|f| f.zip_code.clone(), String::new()))
            .prompt()
            .map_err(ui_err)?;
        let genders = [Gender::Female, Gender::Male]
            .into_iter()
            .map(|g| Choice {
                label: g.as_str().to_string(),
                value: g,
            })
            .collect();
        let gender = Select::new("Gender:", genders).prompt().map_err(ui_err)?.value;
        let availability = CustomType::<u8>::new("Availability (0 = immediately ... 6 = by agreement):")
            .with_default(current.as_ref().map_or(0, |f| f.availability))
            .prompt()
            .map_err(ui_err)?;
        let work_permit = CustomType::<u8>::new("Work permit (1-10, position in the site's menu):")
            .with_default(current.as_ref().map_or(1, |f| f.work_permit))
            .prompt()
            .map_err(ui_err)?;
        let auto_answer_requirements = Confirm::new("Answer requirement questions with yes?")
            .with_default(current.as_ref().is_none_or(|f| f.auto_answer_requirements))
            .prompt()
            .map_err(ui_err)?;

        let form = FormProfile {
            first_name,
            last_name,
            email,
            phone,
            zip_code,
            gender,
            availability,
            work_permit,
            auto_answer_requirements,
        };
        form.validate()?;
        self.services
            .profiles
            .save_form_profile(user.id, Platform::JobUp, &form)
            .await?;
        println!("Form answers saved.");
        Ok(())
    }

    async fn pick_language(&self) -> Result<Language, DomainError> {
        let languages = [Language::Fr, Language::De, Language::It, Language::En]
            .into_iter()
            .map(|l| Choice {
                label: l.display_name().to_string(),
                value: l,
            })
            .collect();
        Ok(Select::new("Market language:", languages)
            .prompt()
            .map_err(ui_err)?
            .value)
    }

    async fn generate_terms(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let language = self.pick_language().await?;
        let terms = with_spinner(
            "Asking the model for job titles...",
            self.services.terms.refresh_keywords(user.id, language),
        )
        .await?;
        println!("Scheduler keywords: {}", terms.join(", "));
        Ok(())
    }

    async fn edit_filters(&self) -> Result<(), DomainError> {
        let mut settings = self.services.settings.load().await?;
        let f = &settings.filters;
        let windows: Vec<Choice<Option<u8>>> = [None, Some(1), Some(3), Some(7), Some(14), Some(31)]
            .into_iter()
            .map(|d| Choice {
                label: d.map_or("any time".to_string(), |d| format!("last {} days", d)),
                value: d,
            })
            .collect();
        let window = Select::new("Published:", windows).prompt().map_err(ui_err)?;
        let grade_min = CustomType::<u8>::new("Minimum workload % (0 = none):")
            .with_default(f.employment_grade_min.unwrap_or(0))
            .prompt()
            .map_err(ui_err)?;
        let grade_max = CustomType::<u8>::new("Maximum workload % (0 = none):")
            .with_default(f.employment_grade_max.unwrap_or(0))
            .prompt()
            .map_err(ui_err)?;
        let keywords = Text::new("Scheduler keywords (comma separated):")
            .with_default(&settings.keywords.join(", "))
            .prompt()
            .map_err(ui_err)?;

        settings.filters.publication_date = window.value;
        settings.filters.employment_grade_min = (grade_min > 0).then_some(grade_min);
        settings.filters.employment_grade_max = (grade_max > 0).then_some(grade_max);
        settings.keywords = split_list(&keywords);
        self.services.settings.save(&settings).await?;
        println!("Search settings saved.");
        Ok(())
    }

    async fn ask_term(&self) -> Result<String, DomainError> {
        let settings = self.services.settings.load().await?;
        let mut prompt = Text::new("Search term:");
        if let Some(first) = settings.keywords.first() {
            prompt = prompt.with_default(first);
        }
        prompt.prompt().map_err(ui_err)
    }

    async fn preview(&self) -> Result<(), DomainError> {
        let term = self.ask_term().await?;
        let query = self.services.settings.load().await?.filters.with_term(term);
        let stream = search_postings(self.services.scrape.source(), query).take(PREVIEW_LIMIT);
        futures_util::pin_mut!(stream);
        let mut shown = 0;
        while let Some(item) = stream.next().await {
            match item {
                Ok(posting) => {
                    shown += 1;
                    let marker = if posting.quick_apply { "⚡" } else { " " };
                    println!("{} {}  {}", marker, posting.label(), posting.url);
                }
                Err(e) => {
                    println!("Search stopped: {}", e);
                    break;
                }
            }
        }
        println!("{} posting(s) shown.", shown);
        Ok(())
    }

    async fn scrape(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let term = self.ask_term().await?;
        let query = self.services.settings.load().await?.filters.with_term(term);
        let stats = with_spinner(
            "Scraping jobup.ch...",
            self.services.scrape.scrape(&query, &user.preferences.exclusions),
        )
        .await?;
        println!(
            "{} page(s), {} new, {} known, {} excluded, {} page(s) failed.",
            stats.pages_fetched,
            stats.new_postings,
            stats.known_postings,
            stats.excluded,
            stats.pages_failed
        );
        Ok(())
    }

    async fn pick_posting(&self, quick_apply_only: bool) -> Result<JobRecord, DomainError> {
        let records = if quick_apply_only {
            self.services.jobs.list_quick_apply().await?
        } else {
            self.services.jobs.list_postings().await?
        };
        if records.is_empty() {
            return Err(DomainError::NotFound("no stored postings; scrape first".into()));
        }
        let options: Vec<Choice<JobRecord>> = records
            .into_iter()
            .map(|r| Choice {
                label: format!("#{} {}", r.id, r.posting.label()),
                value: r,
            })
            .collect();
        Ok(Select::new("Posting:", options)
            .with_page_size(15)
            .prompt()
            .map_err(ui_err)?
            .value)
    }

    async fn draft_letter(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let job = self.pick_posting(false).await?;
        let letter = with_spinner(
            "Drafting cover letter...",
            self.services.letters.generate(user.id, job.id),
        )
        .await?;
        println!("\n{}\n", letter.text());
        Ok(())
    }

    async fn build_pdf(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let job = self.pick_posting(false).await?;
        let built = with_spinner(
            "Rendering PDF...",
            self.services.documents.build_letter_pdf(user.id, job.id),
        )
        .await?;
        println!("Letter: {}", built.letter_pdf.display());
        if let Some(cv) = built.cv {
            println!("CV:     {}", cv.display());
        }
        Ok(())
    }

    async fn build_all(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let job_ids: Vec<i64> = self
            .services
            .jobs
            .list_postings()
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let mut drafted = Vec::new();
        for id in job_ids {
            if self.services.documents.has_letter(user.id, id).await? {
                drafted.push(id);
            }
        }
        let report = with_spinner(
            "Rendering PDFs...",
            self.services.documents.build_batch(user.id, &drafted),
        )
        .await;
        println!(
            "{} of {} built, {} failed.",
            report.successful, report.total, report.failed
        );
        Ok(())
    }

    async fn auto_apply(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        if !Confirm::new("Submit applications to every new quick-apply posting?")
            .with_default(false)
            .prompt()
            .map_err(ui_err)?
        {
            return Ok(());
        }
        let report = with_spinner(
            "Applying...",
            self.services.apply.auto_apply(user.id, self.services.max_applications),
        )
        .await?;
        println!(
            "Submitted {}, already applied {}, expired {}, incomplete {}, failed {}, skipped {}.",
            report.submitted,
            report.already_applied,
            report.expired,
            report.incomplete,
            report.failed,
            report.skipped
        );
        Ok(())
    }

    async fn approve(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let job = self.pick_posting(true).await?;
        let app = with_spinner(
            "Preparing letter and PDF...",
            self.services.apply.approve(user.id, job.id),
        )
        .await?;
        println!("\n{}\n", app.cover_letter);
        if let Some(path) = &app.pdf_path {
            println!("PDF: {}", path.display());
        }
        println!("Application {} approved.", app.id);
        Ok(())
    }

    async fn submit_approved(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let approved: Vec<Choice<i64>> = self
            .services
            .applications
            .list_applications(user.id)
            .await?
            .into_iter()
            .filter(|a| !a.is_submitted())
            .map(|a| Choice {
                label: format!("application {} (posting #{})", a.id, a.job_id),
                value: a.id,
            })
            .collect();
        if approved.is_empty() {
            println!("No approved applications waiting.");
            return Ok(());
        }
        let chosen = Select::new("Submit:", approved).prompt().map_err(ui_err)?;
        let outcome = with_spinner(
            "Submitting...",
            self.services.apply.submit_approved(chosen.value),
        )
        .await?;
        println!("Outcome: {:?}", outcome);
        Ok(())
    }

    async fn list_applications(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let apps = self.services.applications.list_applications(user.id).await?;
        if apps.is_empty() {
            println!("No applications yet.");
        }
        for app in apps {
            let label = match self.services.jobs.get_posting(app.job_id).await? {
                Some(job) => job.posting.label(),
                None => format!("posting #{}", app.job_id),
            };
            println!(
                "{:>4}  {:<9}  {}  {}",
                app.id,
                app.status.as_str(),
                app.created_at.format("%Y-%m-%d"),
                label
            );
        }
        Ok(())
    }

    async fn run_scheduler(&self) -> Result<(), DomainError> {
        let user = self.user().await?;
        let scheduler = KeywordScheduler::new(
            Arc::clone(&self.services.scrape),
            Arc::clone(&self.services.apply),
            Arc::clone(&self.services.settings),
            Arc::clone(&self.services.profiles),
            user.id,
            self.services.scheduler_interval,
            self.services.max_applications,
        );
        let (tx, rx) = watch::channel(false);
        let stopper = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("stop requested");
            }
            let _ = tx.send(true);
        });
        println!("Scheduler running; press Ctrl-C to stop.");
        let result = scheduler.run(rx).await;
        stopper.abort();
        result
    }

    async fn export_csv(&self) -> Result<(), DomainError> {
        let path = Text::new("CSV file:")
            .with_default("postings.csv")
            .prompt()
            .map_err(ui_err)?;
        let records = self.services.jobs.list_postings().await?;
        let rows = export_postings(PathBuf::from(path.trim()).as_path(), &records).await?;
        println!("{} posting(s) written.", rows);
        Ok(())
    }

    async fn export_settings(&self) -> Result<(), DomainError> {
        let path = Text::new("Export to:")
            .with_default("search.json")
            .prompt()
            .map_err(ui_err)?;
        self.services
            .settings
            .export_to(PathBuf::from(path.trim()).as_path())
            .await?;
        println!("Search settings exported.");
        Ok(())
    }

    async fn import_settings(&self) -> Result<(), DomainError> {
        let path = Text::new("Import from:").prompt().map_err(ui_err)?;
        let settings = self
            .services
            .settings
            .import_from(PathBuf::from(path.trim()).as_path())
            .await?;
        println!("Imported {} keyword(s).", settings.keywords.len());
        Ok(())
    }

    async fn dispatch(&self, action: Action) -> Result<(), DomainError> {
        match action {
            Action::SelectProfile => self.select_profile().await.map(|_| ()),
            Action::CreateProfile => self.create_profile().await.map(|_| ()),
            Action::ImportCv => self.import_cv().await,
            Action::EditPreferences => self.edit_preferences().await,
            Action::EditFormAnswers => self.edit_form_answers().await,
            Action::GenerateTerms => self.generate_terms().await,
            Action::EditFilters => self.edit_filters().await,
            Action::Preview => self.preview().await,
            Action::Scrape => self.scrape().await,
            Action::DraftLetter => self.draft_letter().await,
            Action::BuildPdf => self.build_pdf().await,
            Action::BuildAll => self.build_all().await,
            Action::AutoApply => self.auto_apply().await,
            Action::Approve => self.approve().await,
            Action::SubmitApproved => self.submit_approved().await,
            Action::ListApplications => self.list_applications().await,
            Action::Scheduler => self.run_scheduler().await,
            Action::ExportCsv => self.export_csv().await,
            Action::ExportSettings => self.export_settings().await,
            Action::ImportSettings => self.import_settings().await,
            Action::Quit => Ok(()),
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let action = match Select::new("What next?", Action::ALL.to_vec())
                .with_page_size(12)
                .prompt()
            {
                Ok(action) => action,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(ui_err(e)),
            };
            if action == Action::Quit {
                return Ok(());
            }
            if let Err(e) = self.dispatch(action).await {
                if is_cancel(&e) {
                    continue;
                }
                warn!(action = %action, error = %e, "action failed");
                println!("Error: {}", e);
            }
        }
    }
}
