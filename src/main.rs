use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, Command};
use i18n_autotranslate::mt::{
    GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator,
};
use i18n_autotranslate::{
    FileStatus, FileStore, LocaleReport, ProviderKind, ResourceSynchronizer, RunSummary,
    TranslationConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

fn cli() -> Command {
    Command::new("i18n-autotranslate")
        .version("0.1.0")
        .about("Machine-translate localization resource files")
        .arg(
            Arg::new("locale")
                .help("Target language code (e.g., fr, es, de)")
                .index(1)
                .required_unless_present_any(["all", "list-languages"])
                .conflicts_with("all"),
        )
        .arg(
            Arg::new("all")
                .long("all")
                .short('a')
                .help("Translate every configured target language")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .short('f')
                .help("Re-translate keys that already have a translation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file (default: autotranslate.toml if present)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("lang-path")
                .long("lang-path")
                .help("Root directory of the language files")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of Google Translate")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Stop after this many seconds, leaving unfinished files untouched")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("list-languages")
                .long("list-languages")
                .help("List the languages the provider supports and exit")
                .action(ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();

    let mut config = TranslationConfig::load(
        matches.get_one::<PathBuf>("config").map(PathBuf::as_path),
    )?;
    if let Some(lang_path) = matches.get_one::<PathBuf>("lang-path") {
        config.lang_path = lang_path.clone();
    }
    if matches.get_flag("mock") {
        config.provider = ProviderKind::Mock;
    }

    if config.log_enabled {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let provider = build_provider(&config)?;

    if matches.get_flag("list-languages") {
        let languages = provider
            .supported_languages(&config.source_locale)
            .await
            .context("Failed to fetch supported languages")?;
        for language in languages {
            println!("{}\t{}", language.code, language.name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancellationToken::new();
    watch_for_interrupt(cancel.clone());
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        cancel_after(cancel.clone(), Duration::from_secs(*secs));
    }

    let force = matches.get_flag("force");
    let store = FileStore::new(&config.lang_path);
    let sync = ResourceSynchronizer::new(Arc::new(config), provider, store)?;

    let summary = if matches.get_flag("all") {
        if force {
            println!("⚠️  Force mode: existing translations will be overwritten");
        }
        sync.translate_all(force, &cancel).await
    } else {
        let locale = matches
            .get_one::<String>("locale")
            .context("A target locale is required unless --all is given")?;
        println!("🌍 Translating to: {}", locale);
        if force {
            println!("⚠️  Force mode: existing translations will be overwritten");
        }

        let mut summary = RunSummary::default();
        summary.push(sync.translate(locale, force, &cancel).await?);
        summary
    };

    print_summary(&summary);

    if run_succeeded(&summary) {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("❌ No translations were written");
        Ok(ExitCode::FAILURE)
    }
}

/// A run fails only when it had locales to translate and wrote nothing
fn run_succeeded(summary: &RunSummary) -> bool {
    summary.locales.is_empty() || summary.has_output()
}

fn build_provider(config: &TranslationConfig) -> Result<Arc<dyn MachineTranslator>> {
    match config.provider {
        ProviderKind::Mock => Ok(Arc::new(MockTranslator::new(MockMode::Suffix))),
        ProviderKind::Google => {
            if !config.is_provider_configured() {
                bail!(
                    "Google Translate is not configured: set GOOGLE_TRANSLATE_API_KEY \
                     or google.api_key, or use --mock"
                );
            }
            let api_key = config
                .google
                .api_key
                .clone()
                .context("Google Translate API key is missing")?;
            Ok(Arc::new(GoogleTranslateProvider::new(api_key)?))
        }
    }
}

fn watch_for_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing without writing incomplete files");
            cancel.cancel();
        }
    });
}

fn cancel_after(cancel: CancellationToken, timeout: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                warn!("Timed out after {:?}; cancelling", timeout);
                cancel.cancel();
            }
        }
    });
}

fn print_summary(summary: &RunSummary) {
    for report in &summary.locales {
        print_locale(report);
    }

    if summary.locales.len() > 1 {
        let stats = summary.stats;
        println!();
        println!(
            "📊 All languages: total {} | translated {} | skipped {} | errors {}",
            stats.total, stats.translated, stats.skipped, stats.errors
        );
    }
}

fn print_locale(report: &LocaleReport) {
    let stats = report.stats;
    println!();
    println!("✅ {}", report.locale);
    println!("   Total:      {}", stats.total);
    println!("   Translated: {}", stats.translated);
    println!("   Skipped:    {}", stats.skipped);
    println!("   Errors:     {}", stats.errors);

    if report.files.is_empty() {
        return;
    }

    println!("   Files:");
    for (name, file) in &report.files {
        let status = match &file.status {
            FileStatus::Written => String::new(),
            FileStatus::SourceMissing => " (no source)".to_string(),
            FileStatus::Failed(reason) => format!(" (failed: {})", reason),
            FileStatus::Cancelled => " (cancelled)".to_string(),
        };
        println!(
            "     {:<28} {}/{}{}",
            name, file.stats.translated, file.stats.total, status
        );
    }
}
