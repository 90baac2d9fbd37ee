// SPDX-License-Identifier: MIT
//!
//! Translation provider boundary
//!

/// Any failure reported by a provider
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Translates one piece of text
#[async_trait::async_trait]
pub trait Translate: Send + Sync {
    /// `source` of `None` asks the provider to detect the language.
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ProviderError>;
}

/// DeepL backed provider
pub struct DeeplProvider {
    deepl: deepl_api::Deepl,
}

impl DeeplProvider {
    pub fn new(deepl: deepl_api::Deepl) -> Self {
        Self { deepl }
    }

    /// Provider from default config file or environment
    pub fn from_default_config() -> crate::Result<Self> {
        Ok(Self::new(deepl_api::Deepl::new()?))
    }

    /// Provider from specific config file
    pub fn from_config_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        Ok(Self::new(deepl_api::Deepl::with_config(path)?))
    }

    /// Throttle configured in the config file
    pub fn configured_delay(&self) -> Option<std::time::Duration> {
        self.deepl.delay()
    }
}

#[async_trait::async_trait]
impl Translate for DeeplProvider {
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> Result<String, ProviderError> {
        let translated = self.deepl.translate(source, target, text).await?;
        Ok(translated)
    }
}
