//! Hint backend selected at startup.

use sizefit_core::hint::HintError;
#[cfg(feature = "gemini")]
use sizefit_core::GeminiHintProvider;
use sizefit_core::{HeuristicHintProvider, HintProvider, HintRequest, HintSource, RawHint, SizefitConfig};

pub enum HintBackend {
    #[cfg(feature = "gemini")]
    Gemini(GeminiHintProvider),
    Heuristic(HeuristicHintProvider),
}

impl HintBackend {
    /// Build the backend named by `config.hint_source`.
    ///
    /// Fails with `MissingApiKey` when Gemini is selected without a key.
    pub fn from_config(config: &SizefitConfig) -> Result<Self, HintError> {
        match config.hint_source {
            #[cfg(feature = "gemini")]
            HintSource::Gemini => Ok(Self::Gemini(GeminiHintProvider::new(config.gemini.clone())?)),
            #[cfg(not(feature = "gemini"))]
            HintSource::Gemini => Err(HintError::Request(
                "built without Gemini support; use --hint heuristic".to_string(),
            )),
            HintSource::Heuristic => Ok(Self::Heuristic(HeuristicHintProvider)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "gemini")]
            Self::Gemini(_) => "gemini",
            Self::Heuristic(_) => "heuristic",
        }
    }
}

impl HintProvider for HintBackend {
    async fn fetch_size_hint(&self, request: &HintRequest) -> Result<RawHint, HintError> {
        match self {
            #[cfg(feature = "gemini")]
            Self::Gemini(provider) => provider.fetch_size_hint(request).await,
            Self::Heuristic(provider) => provider.fetch_size_hint(request).await,
        }
    }
}
