//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use jobfinder::adapters::ai::{FallbackLlm, MockLlmAdapter, OpenAiAdapter, ProviderSettings};
use jobfinder::adapters::documents::{LopdfRenderer, PdfTextReader};
use jobfinder::adapters::jobup::{JobUpFormFiller, JobUpSource, WebDriverSettings};
use jobfinder::adapters::persistence::{SearchSettingsFile, SqliteRepo};
use jobfinder::adapters::ui::{TuiInputPort, UiServices};
use jobfinder::ports::{
    ApplicationRepo, CvReader, FormSubmitter, InputPort, JobRepo, JobSource, LetterRepo, LlmPort,
    PdfRenderer, ProfileRepo, SettingsPort,
};
use jobfinder::shared::AppConfig;
use jobfinder::usecases::{
    ApplyService, CoverLetterService, DocumentService, ScrapeService, SearchTermGenerator,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    jobfinder::adapters::ui::init_ui();

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "invalid configuration, using defaults");
        AppConfig::default()
    });
    let data_dir = cfg.data_dir_or_default();
    info!(path = %data_dir.display(), "data directory");

    // --- Stores ---
    let sqlite_repo = Arc::new(
        SqliteRepo::connect(&data_dir)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let jobs: Arc<dyn JobRepo> = Arc::clone(&sqlite_repo) as Arc<dyn JobRepo>;
    let profiles: Arc<dyn ProfileRepo> = Arc::clone(&sqlite_repo) as Arc<dyn ProfileRepo>;
    let letters: Arc<dyn LetterRepo> = Arc::clone(&sqlite_repo) as Arc<dyn LetterRepo>;
    let applications: Arc<dyn ApplicationRepo> =
        Arc::clone(&sqlite_repo) as Arc<dyn ApplicationRepo>;
    let settings: Arc<dyn SettingsPort> =
        Arc::new(SearchSettingsFile::new(cfg.search_settings_path()));

    // --- Language model: primary provider, optional fallback, mock when unconfigured ---
    let llm: Arc<dyn LlmPort> = match cfg.llm_api_key() {
        Some(api_key) => {
            let primary = OpenAiAdapter::new(ProviderSettings {
                name: "openai".into(),
                api_url: cfg.llm_api_url_or_default(),
                api_key,
                model: cfg.llm_model_or_default(),
                temperature: cfg.llm_temperature_or_default(),
                max_tokens: cfg.llm_max_tokens_or_default(),
            });
            info!(
                model = %cfg.llm_model_or_default(),
                url = %cfg.llm_api_url_or_default(),
                "language model enabled"
            );
            match cfg.fallback_api_key() {
                Some(fallback_key) => {
                    info!(model = %cfg.fallback_model_or_default(), "fallback provider enabled");
                    let fallback = OpenAiAdapter::new(ProviderSettings {
                        name: "groq".into(),
                        api_url: cfg.fallback_api_url_or_default(),
                        api_key: fallback_key,
                        model: cfg.fallback_model_or_default(),
                        temperature: cfg.llm_temperature_or_default(),
                        max_tokens: cfg.llm_max_tokens_or_default(),
                    });
                    let providers: Vec<Arc<dyn LlmPort>> = vec![Arc::new(primary), Arc::new(fallback)];
                    Arc::new(FallbackLlm::new(providers))
                }
                None => Arc::new(primary),
            }
        }
        None => {
            warn!("JOBFINDER_LLM_API_KEY not set, using mock language model");
            Arc::new(MockLlmAdapter::new())
        }
    };

    // --- jobup.ch ---
    let source: Arc<dyn JobSource> = Arc::new(JobUpSource::new(
        cfg.jobup_search_url_or_default(),
        cfg.user_agent_or_default(),
    ));
    let mut driver =
        WebDriverSettings::new(cfg.webdriver_url_or_default(), cfg.jobup_site_url_or_default());
    driver.headless = cfg.headless_or_default();
    driver.profile_dir = Some(cfg.browser_profile_dir_or_default());
    let submitter: Arc<dyn FormSubmitter> = Arc::new(JobUpFormFiller::new(driver));

    // --- Documents ---
    let renderer: Arc<dyn PdfRenderer> = Arc::new(LopdfRenderer::new());
    let cv_reader: Arc<dyn CvReader> = Arc::new(PdfTextReader::new());
    let exports_dir = cfg.exports_dir();
    info!(path = %exports_dir.display(), "exports directory");

    // --- Services ---
    let terms = Arc::new(SearchTermGenerator::new(
        Arc::clone(&llm),
        Arc::clone(&profiles),
        Arc::clone(&settings),
    ));
    let scrape = Arc::new(
        ScrapeService::new(Arc::clone(&source), Arc::clone(&jobs))
            .with_limits(cfg.max_concurrent_pages_or_default(), cfg.buffer_size_or_default()),
    );
    let cover_letters = Arc::new(CoverLetterService::new(
        Arc::clone(&llm),
        Arc::clone(&jobs),
        Arc::clone(&profiles),
        Arc::clone(&letters),
    ));
    let documents = Arc::new(DocumentService::new(
        renderer,
        cv_reader,
        Arc::clone(&jobs),
        Arc::clone(&profiles),
        Arc::clone(&letters),
        exports_dir,
    ));
    let direct_apply = cfg.direct_apply_or_default();
    info!(direct_apply, max_applications = ?cfg.max_applications, "application settings");
    let apply = Arc::new(ApplyService::new(
        Arc::clone(&jobs),
        Arc::clone(&profiles),
        Arc::clone(&applications),
        Arc::clone(&cover_letters),
        Arc::clone(&documents),
        submitter,
        direct_apply,
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(UiServices {
        jobs,
        profiles,
        applications,
        settings,
        terms,
        scrape,
        letters: cover_letters,
        documents,
        apply,
        scheduler_interval: cfg.scheduler_interval(),
        max_applications: cfg.max_applications,
    }));

    // --- Run (main menu) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
