use anyhow::Context;
use clap::Parser;
use obit_transcriber::config::PipelineConfig;
use obit_transcriber::correction::CorrectionDictionary;
use obit_transcriber::engines::EngineRegistry;
use obit_transcriber::input;
use obit_transcriber::preprocessing::Preset;
use obit_transcriber::transcription::TranscriptionPipeline;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "obit-transcriber")]
#[command(about = "Transcribe scanned obituary notices into corrected text")]
#[command(version)]
pub struct Args {
    /// Content-store directory holding the notice scans
    #[arg(env = "OBIT_INPUT")]
    pub input: PathBuf,

    /// JSON configuration file
    #[arg(long, env = "OBIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Preprocessing preset (minimal, default, dense-print)
    #[arg(long, env = "OBIT_PRESET")]
    pub preset: Option<Preset>,

    /// Extra word lists merged into the built-in vocabulary (a full English
    /// word list widens what spellchecking accepts as correct)
    #[arg(long = "dictionary", env = "OBIT_DICTIONARY", value_delimiter = ',')]
    pub dictionaries: Vec<PathBuf>,

    /// Proper nouns and archive terms the spellchecker must not touch
    #[arg(long, env = "OBIT_EXCEPTIONS")]
    pub exceptions: Option<PathBuf>,

    /// Run dictionary spellchecking
    #[arg(long, env = "OBIT_SPELLCHECK")]
    pub spellcheck: bool,

    /// Largest edit distance accepted for a spelling correction
    #[arg(long, env = "OBIT_MAX_EDIT_DISTANCE")]
    pub max_edit_distance: Option<usize>,

    /// Items transcribed in parallel
    #[arg(long, env = "OBIT_WORKERS")]
    pub workers: Option<usize>,

    /// Per-item OCR time limit in milliseconds
    #[arg(long, env = "OBIT_OCR_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// OCR engine (ocrs, leptess)
    #[arg(long, env = "OBIT_ENGINE")]
    pub engine: Option<String>,

    /// OCR language (e.g., "eng", "deu", "fra")
    #[arg(long, env = "OBIT_LANGUAGE")]
    pub language: Option<String>,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<PathBuf>,

    /// Record URL template; `{name}` is replaced by the scan's file stem
    #[arg(long, env = "OBIT_URL_TEMPLATE")]
    pub url_template: Option<String>,

    /// Write the JSON summary here instead of stdout
    #[arg(long, short, env = "OBIT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Configuration file (or defaults) with command-line overrides applied
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(preset) = self.preset {
            config.preprocess = preset.config();
        }
        if self.spellcheck {
            config.correction.spellcheck = true;
        }
        if let Some(distance) = self.max_edit_distance {
            config.correction.max_edit_distance = distance;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.ocr_timeout_ms = timeout_ms;
        }
        if let Some(engine) = &self.engine {
            config.engine.name = Some(engine.clone());
        }
        if let Some(language) = &self.language {
            config.engine.language = language.clone();
        }
        if let Some(path) = &self.tessdata_path {
            config.engine.tessdata_path = Some(path.clone());
        }
        if let Some(template) = &self.url_template {
            config.url_template = Some(template.clone());
        }

        config.validate()?;
        Ok(config)
    }

    fn dictionary(&self) -> anyhow::Result<CorrectionDictionary> {
        let mut dictionary = CorrectionDictionary::builtin();
        for path in &self.dictionaries {
            dictionary.extend_from_file(path)?;
        }
        if let Some(path) = &self.exceptions {
            dictionary.add_exceptions_from_file(path)?;
        }
        tracing::info!("Dictionary holds {} words", dictionary.len());
        Ok(dictionary)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting obit-transcriber v{}", env!("CARGO_PKG_VERSION"));

    let config = args.pipeline_config().context("invalid configuration")?;
    let dictionary = args.dictionary().context("failed to load dictionary")?;

    let registry = EngineRegistry::new(&config.engine).context("failed to start OCR engines")?;
    let engine = registry.select(config.engine.name.as_deref())?;
    tracing::info!(
        "Using {} engine: {} (languages: {}; available: {})",
        engine.name(),
        engine.description(),
        engine.supported_languages().join(", "),
        registry.list().join(", ")
    );

    let items = input::collect_images(&args.input)?;
    let pipeline = Arc::new(TranscriptionPipeline::new(config, engine, dictionary)?);
    let report = pipeline.process_batch(items).await;
    let summary = report.summary();

    let json = serde_json::to_string_pretty(&summary)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write summary to {:?}", path))?,
        None => writeln!(std::io::stdout().lock(), "{}", json)?,
    }

    tracing::info!(
        "Transcribed {} of {} notices",
        summary.succeeded.len(),
        summary.total
    );
    Ok(())
}
