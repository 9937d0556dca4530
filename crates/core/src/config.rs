//! Configuration management.
//!
//! Settings are merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.agro/config.yaml`, or `AGRO_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric: corpora, chunk records and
//! indexes all live under `<workspace>/.agro/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the state directory inside a workspace.
pub const STATE_DIR: &str = ".agro";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .agro/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Corpus used when a command does not name one
    pub corpus: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// External capability providers used at query time
    pub models: ModelsConfig,
}

/// Capability providers for the query pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelsConfig {
    #[serde(default = "default_reranker")]
    pub reranker: CapabilityConfig,

    #[serde(default = "default_reader")]
    pub reader: CapabilityConfig,
}

/// How one external capability is provided.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum CapabilityConfig {
    /// A model server reached over HTTP
    Http {
        endpoint: String,
        model: Option<String>,
        #[serde(rename = "timeoutSecs")]
        timeout_secs: Option<u64>,
    },
    /// In-process term-overlap heuristics
    Lexical,
    /// Capability switched off; the pipeline uses its fallbacks
    None,
}

impl CapabilityConfig {
    pub fn provider_name(&self) -> &'static str {
        match self {
            CapabilityConfig::Http { .. } => "http",
            CapabilityConfig::Lexical => "lexical",
            CapabilityConfig::None => "none",
        }
    }
}

fn default_reranker() -> CapabilityConfig {
    CapabilityConfig::Lexical
}

fn default_reader() -> CapabilityConfig {
    CapabilityConfig::Lexical
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            reranker: default_reranker(),
            reader: default_reader(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    corpus: Option<String>,
    logging: Option<LoggingConfig>,
    models: Option<ModelsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            corpus: "default".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
            models: ModelsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `AGRO_WORKSPACE`: Override workspace path
    /// - `AGRO_CONFIG`: Path to config file
    /// - `AGRO_CORPUS`: Default corpus name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("AGRO_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("AGRO_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let mut config = config.merge_config_file()?;

        if let Ok(corpus) = std::env::var("AGRO_CORPUS") {
            config.corpus = corpus;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge the workspace config file (or the explicit one) into defaults.
    ///
    /// A missing default config file is not an error; a missing explicit
    /// one is.
    pub fn merge_config_file(self) -> AppResult<Self> {
        if !self.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                self.workspace
            )));
        }

        let config_path = match self.config_file {
            Some(ref cf) => {
                if !cf.exists() {
                    return Err(AppError::Config(format!("Config file not found: {:?}", cf)));
                }
                cf.clone()
            }
            None => self.agro_dir().join("config.yaml"),
        };

        if config_path.exists() {
            self.merge_yaml(&config_path)
        } else {
            Ok(self)
        }
    }

    fn merge_yaml(mut self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            self.workspace = PathBuf::from(path);
        }

        if let Some(corpus) = config_file.corpus {
            self.corpus = corpus;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        if let Some(models) = config_file.models {
            self.models = models;
        }

        Ok(self)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        corpus: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(corpus) = corpus {
            self.corpus = corpus;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .agro directory.
    pub fn agro_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .agro directory exists.
    pub fn ensure_agro_dir(&self) -> AppResult<()> {
        let agro_dir = self.agro_dir();
        if !agro_dir.exists() {
            std::fs::create_dir_all(&agro_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Validate corpus naming and capability settings.
    pub fn validate(&self) -> AppResult<()> {
        if self.corpus.is_empty()
            || self
                .corpus
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(AppError::Config(format!(
                "Invalid corpus name '{}': use letters, digits, '-' or '_'",
                self.corpus
            )));
        }

        for (role, capability) in [("reranker", &self.models.reranker), ("reader", &self.models.reader)] {
            if let CapabilityConfig::Http { endpoint, timeout_secs, .. } = capability {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(AppError::Config(format!(
                        "{} endpoint must be an http(s) URL, got '{}'",
                        role, endpoint
                    )));
                }
                if *timeout_secs == Some(0) {
                    return Err(AppError::Config(format!(
                        "{} timeoutSecs must be greater than zero",
                        role
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace_config(dir: &TempDir) -> AppConfig {
        AppConfig {
            workspace: dir.path().to_path_buf(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.corpus, "default");
        assert_eq!(config.models.reranker, CapabilityConfig::Lexical);
        assert_eq!(config.models.reader, CapabilityConfig::Lexical);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_agro_dir() {
        let config = AppConfig::default();
        assert!(config.agro_dir().ends_with(".agro"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            None,
            None,
            Some("hills".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.corpus, "hills");
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_models_and_logging() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".agro")).unwrap();
        std::fs::write(
            dir.path().join(".agro/config.yaml"),
            r#"
corpus: uttarakhand
logging:
  level: warn
  color: false
models:
  reranker:
    provider: http
    endpoint: http://localhost:8080
    model: ms-marco-MiniLM-L-6-v2
    timeoutSecs: 10
  reader:
    provider: none
"#,
        )
        .unwrap();

        let config = workspace_config(&dir).merge_config_file().unwrap();
        assert_eq!(config.corpus, "uttarakhand");
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert!(config.no_color);
        assert_eq!(
            config.models.reranker,
            CapabilityConfig::Http {
                endpoint: "http://localhost:8080".to_string(),
                model: Some("ms-marco-MiniLM-L-6-v2".to_string()),
                timeout_secs: Some(10),
            }
        );
        assert_eq!(config.models.reader, CapabilityConfig::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_models_section_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".agro")).unwrap();
        std::fs::write(dir.path().join(".agro/config.yaml"), "models:\n  reader:\n    provider: none\n").unwrap();

        let config = workspace_config(&dir).merge_config_file().unwrap();
        assert_eq!(config.models.reranker, CapabilityConfig::Lexical);
        assert_eq!(config.models.reader, CapabilityConfig::None);
    }

    #[test]
    fn test_missing_explicit_config_file_is_error() {
        let dir = TempDir::new().unwrap();
        let mut config = workspace_config(&dir);
        config.config_file = Some(dir.path().join("absent.yaml"));
        assert!(matches!(config.merge_config_file(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = AppConfig::default();
        config.models.reader = CapabilityConfig::Http {
            endpoint: "localhost:9000".to_string(),
            model: None,
            timeout_secs: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_corpus_name() {
        let mut config = AppConfig::default();
        config.corpus = "../etc".to_string();
        assert!(config.validate().is_err());
    }
}
