use crate::adapter::Language;
use crate::builder::{Analysis, BuildOptions, ErrorPolicy};
use crate::export::{EdgeColors, ExportFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProggraphConfig {
    /// Forced language; otherwise taken from the file extension
    pub language: Option<Language>,
    pub on_error: Option<ErrorPolicy>,
    pub analyses: Option<Vec<Analysis>>,
    pub sibling_edges: Option<bool>,
    pub export: ExportConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub format: Option<ExportFormat>,
    pub tokens_only: Option<bool>,
    /// Edge kind name to DOT color
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    pub jobs: Option<usize>,
    pub exclude: Vec<String>,
}

impl ProggraphConfig {
    /// Config written by `proggraph init`, with every default spelled out
    pub fn starter() -> Self {
        Self {
            language: None,
            on_error: Some(ErrorPolicy::Raise),
            analyses: Some(Analysis::all().to_vec()),
            sibling_edges: Some(false),
            export: ExportConfig {
                format: Some(ExportFormat::Dot),
                tokens_only: Some(false),
                colors: BTreeMap::new(),
            },
            batch: BatchConfig {
                jobs: None,
                exclude: Vec::new(),
            },
        }
    }

    /// Build options for `language` with the configured values applied
    pub fn build_options(&self, language: Language) -> BuildOptions {
        let mut options = BuildOptions::new(self.language.unwrap_or(language));
        if let Some(policy) = self.on_error {
            options.on_error = policy;
        }
        if let Some(analyses) = &self.analyses {
            options.analyses = analyses.clone();
        }
        if let Some(sibling_edges) = self.sibling_edges {
            options.sibling_edges = sibling_edges;
        }
        options
    }

    pub fn edge_colors(&self) -> anyhow::Result<EdgeColors> {
        Ok(EdgeColors::from_map(&self.export.colors)?)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("proggraph.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ProggraphConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ProggraphConfig = toml::from_str(&contents)?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ProggraphConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
