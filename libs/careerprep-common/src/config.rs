// Tutor configuration: runner settings and language-model settings
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/careerprep.json";

/// How submitted programs are launched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub command: String,
    /// Flags placed before the script path
    pub args: Vec<String>,
    pub file_extension: String,
    pub timeout_seconds: u64,
    pub max_source_bytes: usize,
    pub max_input_bytes: usize,
    /// Directory for temporary scripts; the system temp dir when unset
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            // isolated mode, no site module, no .pyc files
            args: vec!["-I".to_string(), "-S".to_string(), "-B".to_string()],
            file_extension: ".py".to_string(),
            timeout_seconds: 2,
            max_source_bytes: 1024 * 1024,
            max_input_bytes: 10 * 1024 * 1024,
            scratch_dir: None,
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub request_timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_seconds: 60,
        }
    }
}

impl ModelConfig {
    /// API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub runner: RunnerConfig,
    pub model: ModelConfig,
}

impl TutorConfig {
    /// Load configuration from a JSON file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let mut config: TutorConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config/careerprep.json` if present, built-in defaults otherwise
    pub fn load_default() -> Result<Self> {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load(default_path);
        }

        let mut config = TutorConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// CAREERPREP_PYTHON, CAREERPREP_TIMEOUT_SECS and OPENAI_BASE_URL win over the file
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(command) = std::env::var("CAREERPREP_PYTHON") {
            if !command.trim().is_empty() {
                self.runner.command = command;
            }
        }
        if let Ok(raw) = std::env::var("CAREERPREP_TIMEOUT_SECS") {
            self.runner.timeout_seconds = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid CAREERPREP_TIMEOUT_SECS: {}", raw))?;
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.model.base_url = base_url;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.runner.command.trim().is_empty() {
            bail!("runner.command cannot be empty");
        }
        if self.runner.timeout_seconds == 0 {
            bail!("runner.timeout_seconds must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TutorConfig::default();
        assert_eq!(config.runner.command, "python3");
        assert_eq!(config.runner.args, vec!["-I", "-S", "-B"]);
        assert_eq!(config.runner.timeout_seconds, 2);
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.runner.scratch_dir, None);
    }

    #[test]
    fn test_scratch_dir_and_legacy_temperature_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"runner": {{"scratch_dir": "/tmp/careerprep"}}, "model": {{"temperature": 0.9}}}}"#
        )
        .unwrap();

        let config = TutorConfig::load(file.path()).unwrap();
        assert_eq!(config.runner.scratch_dir, Some(PathBuf::from("/tmp/careerprep")));
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"runner": {{"max_source_bytes": 2048}}}}"#).unwrap();

        let config = TutorConfig::load(file.path()).unwrap();
        assert_eq!(config.runner.max_source_bytes, 2048);
        assert_eq!(config.runner.file_extension, ".py");
        assert_eq!(config.model.model, "gpt-4o-mini");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = TutorConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = TutorConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = TutorConfig::default();
        config.runner.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
