//! Configuração do draftsmith carregada a partir de `draftsmith.toml`.
//!
//! A struct [`DraftsmithConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `OLLAMA_HOST` e `DRAFTSMITH_MODEL` têm precedência
//! sobre o arquivo; flags da CLI ([`Overrides`]) têm precedência sobre ambos.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::generation::ModelConfig;
use crate::generation::client::DEFAULT_BASE_URL;

pub const CONFIG_FILE: &str = "draftsmith.toml";

/// Configuração de nível superior carregada de `draftsmith.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftsmithConfig {
    /// URL base do servidor Ollama.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Modelo usado para todas as gerações.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperatura de amostragem, em [0, 1].
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling, em [0, 1].
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Exibe a resposta do modelo à medida que ela chega.
    #[serde(default = "default_stream")]
    pub stream: bool,

    /// Máximo de revisões por assignment.
    #[serde(default = "default_max_revisions")]
    pub max_revisions: u32,

    /// Tempo máximo de uma requisição de geração, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Diretório raiz que contém `draftplan/` e `draftwriting/`.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Arquivo JSON com o job corrente entre execuções.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

// Valor padrão para a URL do Ollama: servidor local.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

// Valor padrão para o modelo: "llama3.3".
fn default_model() -> String {
    "llama3.3".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.9
}

fn default_stream() -> bool {
    true
}

// Valor padrão para revisões máximas: 5.
fn default_max_revisions() -> u32 {
    5
}

// Modelos grandes em hardware local podem levar vários minutos.
fn default_request_timeout_secs() -> u64 {
    600
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_session_file() -> PathBuf {
    PathBuf::from(".draftsmith").join("session.json")
}

impl Default for DraftsmithConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            stream: default_stream(),
            max_revisions: default_max_revisions(),
            request_timeout_secs: default_request_timeout_secs(),
            artifacts_dir: default_artifacts_dir(),
            session_file: default_session_file(),
        }
    }
}

/// Valores vindos da linha de comando; `None` mantém o valor configurado.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_revisions: Option<u32>,
    pub no_stream: bool,
}

impl DraftsmithConfig {
    /// Carrega a configuração de `draftsmith.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
    }

    /// Carrega de `path`, consultando o ambiente através de `env`.
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<DraftsmithConfig>(&contents)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        } else {
            Self::default()
        };

        // Variáveis de ambiente têm precedência sobre o arquivo de configuração.
        if let Some(host) = env("OLLAMA_HOST")
            && !host.trim().is_empty()
        {
            config.base_url = normalize_host(&host);
        }
        if let Some(model) = env("DRAFTSMITH_MODEL")
            && !model.trim().is_empty()
        {
            config.model = model.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Aplica as flags da CLI e valida o resultado.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(top_p) = overrides.top_p {
            self.top_p = top_p;
        }
        if let Some(max) = overrides.max_revisions {
            self.max_revisions = max;
        }
        if overrides.no_stream {
            self.stream = false;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            bail!("temperature must be between 0 and 1, got {}", self.temperature);
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            bail!("top_p must be between 0 and 1, got {}", self.top_p);
        }
        if self.max_revisions == 0 {
            bail!("max_revisions must be at least 1");
        }
        if self.model.trim().is_empty() {
            bail!("model must not be empty");
        }
        Ok(())
    }

    /// Parâmetros de geração derivados desta configuração.
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            stream: self.stream,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// `OLLAMA_HOST` costuma vir sem esquema (ex.: "127.0.0.1:11434").
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_config_values() {
        let config = DraftsmithConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.3");
        assert_eq!(config.max_revisions, 5);
        assert_eq!(config.request_timeout_secs, 600);
        assert!(config.stream);
        assert_eq!(config.session_file, PathBuf::from(".draftsmith/session.json"));
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            model = "gemma3:27b"
            max_revisions = 3
        "#;
        let config: DraftsmithConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model, "gemma3:27b");
        assert_eq!(config.max_revisions, 3);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 0.9);
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = DraftsmithConfig::load_from(&dir.path().join(CONFIG_FILE), no_env).unwrap();
        assert_eq!(config.max_revisions, 5);
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "model = \"qwq\"\nbase_url = \"http://gpu:11434\"\n").unwrap();

        let config = DraftsmithConfig::load_from(&path, |key| match key {
            "OLLAMA_HOST" => Some("10.0.0.5:11434".into()),
            "DRAFTSMITH_MODEL" => Some("mistral-small:24b".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:11434");
        assert_eq!(config.model, "mistral-small:24b");
    }

    #[test]
    fn cli_overrides_win() {
        let config = DraftsmithConfig::default()
            .with_overrides(Overrides {
                model: Some("deepseek-r1:32b".into()),
                temperature: Some(0.2),
                max_revisions: Some(2),
                no_stream: true,
                ..Overrides::default()
            })
            .unwrap();
        let model = config.model_config();
        assert_eq!(model.model, "deepseek-r1:32b");
        assert_eq!(model.temperature, 0.2);
        assert_eq!(model.top_p, 0.9);
        assert!(!model.stream);
        assert_eq!(config.max_revisions, 2);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let bad = [
            Overrides {
                temperature: Some(1.5),
                ..Overrides::default()
            },
            Overrides {
                top_p: Some(-0.1),
                ..Overrides::default()
            },
            Overrides {
                max_revisions: Some(0),
                ..Overrides::default()
            },
        ];
        for overrides in bad {
            assert!(DraftsmithConfig::default().with_overrides(overrides).is_err());
        }
    }

    #[test]
    fn invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "temperature = \"hot\"").unwrap();
        assert!(DraftsmithConfig::load_from(&path, no_env).is_err());
    }
}
