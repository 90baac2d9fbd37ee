// SPDX-License-Identifier: MIT
//!
//! DeepL REST API wrapper
//!

/// Environment variable consulted when no config file is found
pub const API_KEY_ENV: &str = "DEEPL_API_KEY";

#[derive(thiserror::Error, Debug)]
pub enum DeeplError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("DeepL request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("deepl.toml NOT found and DEEPL_API_KEY is not set")]
    ConfigNotFound,

    #[error("DeepL returned no translation")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, DeeplError>;

pub struct Deepl {
    config: DeeplConfig,
    client: reqwest::Client,
}

impl Deepl {
    /// New DeepL instance from default config file (deepl.toml or ~/.deepl.toml),
    /// falling back to the DEEPL_API_KEY environment variable
    pub fn new() -> Result<Self> {
        let deepl_config = DeeplConfig::new()?;

        Ok(Self::from_config(deepl_config))
    }

    /// New DeepL instance from specific config file
    pub fn with_config<P: AsRef<std::path::Path>>(config_path: P) -> Result<Self> {
        let deepl_config = DeeplConfig::with_config(config_path)?;

        Ok(Self::from_config(deepl_config))
    }

    /// New DeepL instance with bare API key and default settings
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self::from_config(DeeplConfig {
            api_key: api_key.into(),
            endpoint: None,
            delay_ms: None,
        })
    }

    fn from_config(config: DeeplConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Throttle between requests, if configured
    pub fn delay(&self) -> Option<std::time::Duration> {
        self.config.delay_ms.map(std::time::Duration::from_millis)
    }

    /// Translate single text string
    ///
    /// `from_lang` of `None` lets DeepL detect the source language.
    pub async fn translate(
        &self,
        from_lang: Option<&str>,
        to_lang: &str,
        body: &str,
    ) -> Result<String> {
        let mut result = self.translate_strings(from_lang, to_lang, &[body]).await?;
        if 0 < result.len() {
            Ok(result.swap_remove(0))
        } else {
            Err(DeeplError::EmptyResponse)
        }
    }

    pub async fn translate_strings(
        &self,
        from_lang: Option<&str>,
        to_lang: &str,
        body: &[&str],
    ) -> Result<Vec<String>> {
        let source_lang = from_lang.map(|l| l.to_ascii_uppercase());
        let target_lang = to_lang.to_ascii_uppercase();

        let mut params = vec![
            ("target_lang", target_lang.as_str()),
            ("preserve_formatting", "1"),
        ];
        if let Some(source_lang) = source_lang.as_deref() {
            params.push(("source_lang", source_lang));
        }

        // add texts to be translated
        for t in body {
            params.push(("text", *t));
        }
        log::trace!("DeepL translate {:?}", params);

        // Make DeepL API request
        let resp = self
            .client
            .post(self.config.endpoint("translate"))
            .header(
                "authorization",
                format!("DeepL-Auth-Key {}", self.config.api_key),
            )
            .form(&params)
            .send()
            .await?;

        // Returns error
        let resp = resp.error_for_status()?;

        // Parse response
        let deepl_resp = resp.json::<DeeplTranslationResponse>().await?;
        Ok(deepl_resp
            .translations
            .into_iter()
            .map(|t| t.text)
            .collect())
    }
}

#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
struct DeeplConfig {
    api_key: String,
    /// Overrides the endpoint derived from the key, e.g. for a proxy
    #[serde(default)]
    endpoint: Option<String>,
    /// Pause between two requests
    #[serde(default)]
    delay_ms: Option<u64>,
}

impl DeeplConfig {
    // Search default config file
    fn new() -> Result<Self> {
        use std::path::PathBuf;
        let config_files = [
            PathBuf::new().join("deepl.toml"),
            dirs::home_dir()
                .unwrap_or(PathBuf::new())
                .join(".deepl.toml"),
        ];

        for config_file in config_files {
            match Self::with_config(&config_file) {
                Ok(conf) => {
                    log::debug!("Read config file {:?}", config_file);
                    return Ok(conf);
                }
                Err(DeeplError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                    log::debug!("Config file {:?} NOT found.", &config_file);
                }
                Err(err) => {
                    // Other err, stop searching
                    log::error!("Can not parse config file {:?} : {}", &config_file, err);
                    return Err(err);
                }
            }
        }

        // Config file not found, try environment
        match std::env::var(API_KEY_ENV) {
            Ok(api_key) if !api_key.trim().is_empty() => {
                log::debug!("Use API key from {}", API_KEY_ENV);
                Ok(Self {
                    api_key: api_key.trim().to_string(),
                    endpoint: None,
                    delay_ms: None,
                })
            }
            _ => Err(DeeplError::ConfigNotFound),
        }
    }

    // Config from specific file
    fn with_config<P: AsRef<std::path::Path>>(config_path: P) -> Result<Self> {
        let config = std::fs::read_to_string(&config_path)?;
        Self::parse(&config)
    }

    fn parse(config: &str) -> Result<Self> {
        let deepl_config: DeeplConfig = toml::from_str(config)?;
        Ok(deepl_config)
    }

    // DeepL endpoint URL
    fn endpoint(&self, api: &str) -> String {
        if let Some(endpoint) = &self.endpoint {
            format!("{}/{}", endpoint.trim_end_matches('/'), api)
        } else if self.api_key.ends_with(":fx") {
            // API free plan key
            format!("https://api-free.deepl.com/v2/{}", api)
        } else {
            // API Pro key
            format!("https://api.deepl.com/v2/{}", api)
        }
    }
}

/// DeepL translation response JSON
#[derive(serde::Deserialize)]
#[serde(rename_all = "snake_case")]
struct DeeplTranslationResponse {
    translations: Vec<DeeplTranslationResponseInner>,
}

/// DeepL response JSON for each translations
#[derive(serde::Deserialize)]
#[serde(rename_all = "snake_case")]
struct DeeplTranslationResponseInner {
    #[allow(dead_code)]
    detected_source_language: String,
    text: String,
}
