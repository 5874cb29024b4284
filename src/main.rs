//! sms-spam-classifier: classify SMS text from the command line or a web form.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sms_spam_classifier::classifier::{self, SpamDetector};
use sms_spam_classifier::config::{Overrides, Settings};
use sms_spam_classifier::encode::MaxLen;
use sms_spam_classifier::{vocab, web};

#[derive(Parser)]
#[command(name = "sms-spam-classifier")]
#[command(about = "Classify SMS messages as SPAM or HAM with a pre-trained sequence model")]
struct Cli {
    /// Optional TOML settings file.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    resources: ResourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ResourceArgs {
    /// Vocabulary JSON file.
    #[arg(long, global = true)]
    vocab: Option<PathBuf>,

    /// Model weights JSON file.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Encoded sequence length.
    #[arg(long, global = true, allow_negative_numbers = true)]
    max_len: Option<MaxLen>,

    /// SPAM threshold in [0, 1].
    #[arg(long, short, global = true)]
    threshold: Option<f32>,
}

#[derive(Subcommand)]
enum Command {
    /// Load vocabulary and model, then serve the web form.
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000.
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Classify one message and print the verdict.
    Classify {
        /// Message text.
        text: String,
    },

    /// Print the encoded sequence of each message as JSON.
    Encode {
        /// Message texts.
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let bind = match &cli.command {
        Command::Serve { bind } => bind.clone(),
        _ => None,
    };
    let settings = Settings::load(cli.config.as_deref())?.apply(Overrides {
        vocab_path: cli.resources.vocab,
        model_path: cli.resources.model,
        max_len: cli.resources.max_len.map(MaxLen::get),
        threshold: cli.resources.threshold,
        bind,
    });
    settings.validate()?;

    match cli.command {
        Command::Serve { .. } => run_serve(&settings),
        Command::Classify { text } => run_classify(&settings, &text),
        Command::Encode { texts } => run_encode(&settings, &texts),
    }
}

fn load_detector(settings: &Settings) -> anyhow::Result<SpamDetector> {
    let vocab = vocab::load_vocabulary(&settings.vocab_path)
        .with_context(|| format!("loading vocabulary {}", settings.vocab_path.display()))?;
    let model = classifier::load_model(&settings.model_path)
        .with_context(|| format!("loading model {}", settings.model_path.display()))?;
    Ok(SpamDetector::new(
        Arc::new(vocab),
        Arc::new(model),
        settings.max_len()?,
    ))
}

fn run_classify(settings: &Settings, text: &str) -> anyhow::Result<()> {
    let detector = load_detector(settings)?;
    let verdict = detector.detect(text, settings.threshold()?)?;
    println!("Prediction: {}", verdict.label);
    println!("Probability of being SPAM: {:.2}%", verdict.probability * 100.0);
    Ok(())
}

fn run_encode(settings: &Settings, texts: &[String]) -> anyhow::Result<()> {
    let vocab = vocab::load_vocabulary(&settings.vocab_path)
        .with_context(|| format!("loading vocabulary {}", settings.vocab_path.display()))?;
    let batch = sms_spam_classifier::preprocess_text(texts, &vocab, settings.max_len()?)?;
    println!("{}", serde_json::to_string(&batch)?);
    Ok(())
}

fn run_serve(settings: &Settings) -> anyhow::Result<()> {
    let detector = load_detector(settings)?;
    let threshold = settings.threshold()?;
    tracing::info!(
        max_len = detector.max_len().get(),
        threshold = threshold.get(),
        "detector ready"
    );
    let state: web::AppState = Arc::new(web::App {
        detector,
        threshold,
    });

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let app = web::router(state);
        tracing::info!("listening on http://{}", settings.bind);
        let listener = tokio::net::TcpListener::bind(&settings.bind)
            .await
            .with_context(|| format!("binding {}", settings.bind))?;
        axum::serve(listener, app).await?;
        Ok::<(), anyhow::Error>(())
    })
}
