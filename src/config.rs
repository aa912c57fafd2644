use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Verification pipeline thresholds and evidence prefix lengths
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of evidence chunks fetched in the retrieval step.
    pub k_retrieval: usize,
    /// Citations-per-sentence below which coverage is reported as low.
    pub citation_min_coverage: f64,
    /// Best-match similarity below which a sentence is low-support.
    pub support_threshold: f64,
    /// Low-support share above which regeneration and fallback fire.
    pub regen_ratio: f64,
    pub enable_regeneration: bool,
    pub enable_fallback: bool,
    pub append_diagnostics_footer: bool,
    /// Chunk prefix embedded for support scoring.
    pub support_chunk_chars: usize,
    /// Chunk prefix concatenated for citation cross-verification.
    pub citation_context_chars: usize,
    /// Chunk prefix rendered into the baseline prompt and offline dump.
    pub baseline_context_chars: usize,
    /// Chunk prefix quoted in the regeneration prompt.
    pub regen_source_chars: usize,
    /// Chunk prefix quoted in the fallback summarizer prompt.
    pub summary_source_chars: usize,
    /// Length of the offline summarizer excerpt.
    pub offline_summary_chars: usize,
    /// Length of the answer preview in the terminal audit event.
    pub answer_preview_chars: usize,
    /// Sentences of this many characters or fewer are not scored.
    pub min_sentence_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            k_retrieval: 5,
            citation_min_coverage: 0.3,
            support_threshold: 0.58,
            regen_ratio: 0.4,
            enable_regeneration: true,
            enable_fallback: true,
            append_diagnostics_footer: true,
            support_chunk_chars: 800,
            citation_context_chars: 400,
            baseline_context_chars: 600,
            regen_source_chars: 1000,
            summary_source_chars: 800,
            offline_summary_chars: 500,
            answer_preview_chars: 400,
            min_sentence_chars: 20,
        }
    }
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub api_key_env: String,
    pub batch_size: usize,
    /// Requested vector length; the model's native size when unset.
    pub dimensions: Option<usize>,
    pub cache_capacity: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            api_key_env: default_api_key_env(),
            batch_size: 100,
            dimensions: None,
            cache_capacity: 1000,
        }
    }
}

/// Chat completion configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key_env: default_api_key_env(),
            temperature: 0.0,
            max_tokens: 800,
        }
    }
}

/// Structural graph retrieval configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub neighbor_depth: usize,
    pub damping: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub snippet_chars: usize,
    /// Render whole node text instead of a snippet.
    pub full_pages: bool,
    /// Expand common privacy phrasings before anchor retrieval.
    pub rephrase: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            neighbor_depth: 1,
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
            snippet_chars: 400,
            full_pages: false,
            rephrase: true,
        }
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// SQLite file for the audit log; in-memory when unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in REGASSIST_CONFIG environment variable
    /// 2. ./config.toml in current directory
    ///
    /// A missing default config file yields the built-in defaults; an explicitly
    /// named file that cannot be read is an error.
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let (config_path, explicit) = match std::env::var("REGASSIST_CONFIG") {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from("config.toml"), false),
        };

        if !explicit && !config_path.exists() {
            log::info!("No config.toml found, using defaults");
            return Ok(Self::default());
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))
    }

    /// Parse and validate configuration from a TOML document
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let p = &self.pipeline;
        if p.k_retrieval == 0 {
            anyhow::bail!("pipeline.k_retrieval must be greater than 0");
        }
        for (name, value) in [
            ("pipeline.citation_min_coverage", p.citation_min_coverage),
            ("pipeline.support_threshold", p.support_threshold),
            ("pipeline.regen_ratio", p.regen_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be between 0.0 and 1.0", name);
            }
        }

        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than 0");
        }
        if self.embeddings.dimensions == Some(0) {
            anyhow::bail!("embeddings.dimensions must be greater than 0");
        }

        if self.graph.damping <= 0.0 || self.graph.damping >= 1.0 {
            anyhow::bail!("graph.damping must be strictly between 0.0 and 1.0");
        }
        if self.graph.max_iterations == 0 {
            anyhow::bail!("graph.max_iterations must be greater than 0");
        }

        Ok(())
    }

    /// Get audit database path, if one is configured
    pub fn audit_db_path(&self) -> Option<&Path> {
        self.audit.db_path.as_deref()
    }
}
