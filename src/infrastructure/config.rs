use serde::Deserialize;

const CONFIG_FILE: &str = "config/plant_care";
const ENV_PREFIX: &str = "PLANT_CARE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub detector: DetectorSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub worker_threads: usize,
    pub upload_dir: String,
    pub results_dir: String,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: 10 * 1024 * 1024,
            worker_threads: 3,
            upload_dir: "uploads".to_string(),
            results_dir: "results".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmSettings {
    pub enabled: bool,
    pub base_url: String,
    /// Falls back to OPENAI_API_KEY
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub advice_timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub per_period_analysis: bool,
    pub response_language: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 10,
            advice_timeout_secs: 60,
            max_tokens: 512,
            temperature: 0.6,
            per_period_analysis: false,
            response_language: "Korean".to_string(),
        }
    }
}

impl LlmSettings {
    /// The model is only called when enabled and a key is available
    pub fn is_usable(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierSettings {
    pub primary_url: String,
    pub secondary_url: String,
    pub auto_select_threshold: f64,
    pub low_confidence_threshold: f64,
    pub request_timeout_secs: u64,
    pub translate_names: bool,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            primary_url: "http://localhost:5020/predict".to_string(),
            secondary_url: "https://plantrecog.sarthak.work/predict".to_string(),
            auto_select_threshold: 0.38,
            low_confidence_threshold: 0.1,
            request_timeout_secs: 30,
            translate_names: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DetectorSettings {
    /// Empty disables disease detection
    pub url: String,
    pub default_conf_threshold: f64,
    pub request_timeout_secs: u64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5030/detect".to_string(),
            default_conf_threshold: 0.01,
            request_timeout_secs: 60,
        }
    }
}

impl DetectorSettings {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(CONFIG_FILE)
}

/// Read the optional config file, then apply `PLANT_CARE__SECTION__KEY`
/// environment overrides.
pub fn load_settings_from(path: &str) -> anyhow::Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("server.cors_origins"),
        )
        .build()?;

    let mut settings: Settings = settings.try_deserialize()?;
    if settings.llm.api_key.is_none() {
        settings.llm.api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = load_settings_from("config/does_not_exist").unwrap();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.server.worker_threads, 3);
        assert_eq!(settings.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.classifier.auto_select_threshold, 0.38);
        assert_eq!(settings.detector.default_conf_threshold, 0.01);
        assert_eq!(settings.llm.timeout_secs, 10);
        assert_eq!(settings.storage.data_dir, "data");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
[server]
port = 9100
cors_origins = ["http://localhost:5173"]

[llm]
enabled = false
model = "gpt-4o"
api_key = "sk-test"

[detector]
url = ""
"#,
        );

        let settings = load_settings_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
        assert!(!settings.llm.is_usable());
        assert!(!settings.detector.is_configured());
        assert_eq!(settings.classifier.low_confidence_threshold, 0.1);
    }

    #[test]
    fn test_bind_addr() {
        let server = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..ServerSettings::default()
        };
        assert_eq!(server.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_llm_needs_key() {
        let mut llm = LlmSettings::default();
        assert!(!llm.is_usable());
        llm.api_key = Some("  ".to_string());
        assert!(!llm.is_usable());
        llm.api_key = Some("sk-live".to_string());
        assert!(llm.is_usable());
    }
}
