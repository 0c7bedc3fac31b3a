/// Machine Translation Module
///
/// This module holds the provider seam of the pipeline: the
/// `MachineTranslator` trait every backend implements, the Google Translate
/// v2 provider, and a deterministic mock for tests and dry runs.
///
/// # Example
///
/// ```ignore
/// use i18n_autotranslate::mt::{MachineTranslator, GoogleTranslateProvider};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = GoogleTranslateProvider::new(api_key)?;
///     let texts = vec!["Hello ___PLACEHOLDER_0___".to_string()];
///     let translated = provider.translate_batch(&texts, "en", "fr").await?;
///
///     println!("{:?}", translated);
///     Ok(())
/// }
/// ```
pub mod error;
pub mod google_translate;
pub mod mock;
pub mod translator;

pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use mock::{MockMode, MockTranslator};
pub use translator::{LanguageInfo, MachineTranslator, normalize_locale, validate_locale};
