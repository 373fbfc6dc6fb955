//! Persisted pipeline configuration.
//!
//! The configuration is a TOML document with a `[main]` section (rendering
//! helper and data directories), a `[params]` section holding the pipeline
//! defaults, and one `[programs.<name>]` table per located engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SetupError};

/// File name of the persisted configuration.
pub const CONFIG_NAME: &str = "motifpipe.toml";

/// Location of one located engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEntry {
    /// Absolute path of the executable.
    pub bin: PathBuf,
    /// Working directory; absent for database pseudo-engines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// `[main]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seqlogo: Option<PathBuf>,

    // Data directories, filled in at install time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motif_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_dir: Option<PathBuf>,
}

impl MainSection {
    /// Point every data directory at its subdirectory of `app_root`.
    pub fn with_data_dirs(self, app_root: &Path) -> Self {
        Self {
            template_dir: Some(app_root.join("templates")),
            gene_dir: Some(app_root.join("genes")),
            score_dir: Some(app_root.join("score_dists")),
            index_dir: Some(app_root.join("genome_index")),
            motif_dir: Some(app_root.join("motif_databases")),
            bg_dir: Some(app_root.join("bg")),
            tools_dir: Some(app_root.join("tools")),
            ..self
        }
    }
}

/// Search thoroughness tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Analysis {
    Small,
    #[default]
    Medium,
    Large,
    Xl,
}

/// `[params]` section: the pipeline defaults.
///
/// Constructed once per run and never mutated in place; stages derive new
/// records with [`DefaultParams::with_tools`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultParams {
    /// Wall-clock limit per engine, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time: Option<u64>,
    pub analysis: Analysis,
    pub fraction: f64,
    pub abs_max: u32,
    pub width: u32,
    pub lwidth: u32,
    pub pvalue: f64,
    pub enrichment: f64,
    #[serde(with = "comma_list")]
    pub background: Vec<String>,
    pub genome: String,
    /// Default-enabled engines.
    #[serde(with = "comma_list")]
    pub tools: Vec<String>,
    /// Every engine located at configure time.
    #[serde(with = "comma_list")]
    pub available_tools: Vec<String>,
    pub cluster_threshold: f64,
    pub use_strand: bool,
    pub markov_model: u8,
    pub motif_db: String,
    pub scan_cutoff: f64,
}

impl Default for DefaultParams {
    fn default() -> Self {
        Self {
            max_time: None,
            analysis: Analysis::Medium,
            fraction: 0.2,
            abs_max: 1000,
            width: 200,
            lwidth: 500,
            pvalue: 0.001,
            enrichment: 1.5,
            background: strings(&["genomic_matched", "random"]),
            genome: "hg19".to_string(),
            tools: strings(&["MDmodule", "Weeder", "MotifSampler"]),
            available_tools: strings(&[
                "Weeder",
                "MDmodule",
                "MotifSampler",
                "GADEM",
                "MEME",
                "trawler",
                "Improbizer",
                "BioProspector",
                "AMD",
                "ChIPMunk",
                "JASPAR",
            ]),
            cluster_threshold: 0.95,
            use_strand: false,
            markov_model: 1,
            motif_db: "vertebrate_motifs.pwm".to_string(),
            scan_cutoff: 0.9,
        }
    }
}

impl DefaultParams {
    /// New record with the located engine lists substituted in.
    pub fn with_tools(&self, available: Vec<String>, enabled: Vec<String>) -> Self {
        Self {
            available_tools: available,
            tools: enabled,
            ..self.clone()
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The persisted configuration artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub main: MainSection,
    pub params: DefaultParams,
    #[serde(default)]
    pub programs: BTreeMap<String, ProgramEntry>,
}

impl Configuration {
    /// Empty configuration carrying the given defaults.
    pub fn new(params: DefaultParams) -> Self {
        Self {
            main: MainSection::default(),
            params,
            programs: BTreeMap::new(),
        }
    }

    /// Whether an engine has a recorded location.
    pub fn is_configured(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn program(&self, name: &str) -> Option<&ProgramEntry> {
        self.programs.get(name)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse from TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save to `path`, creating the parent directory if needed.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let rendered = self.to_toml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| SetupError::config_write(parent, e))?;
        }
        fs::write(path, rendered).map_err(|e| SetupError::config_write(path, e))
    }

    /// Load from `path`.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SetupError::config_read(path, e))?;
        Self::from_toml(&content)
    }
}

/// Serialize `Vec<String>` as a comma-joined string.
mod comma_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&items.join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Configuration {
        let params = DefaultParams::default().with_tools(
            vec!["MEME".to_string(), "GADEM".to_string()],
            vec!["MEME".to_string()],
        );
        let mut config = Configuration::new(params);
        config.programs.insert(
            "MEME".to_string(),
            ProgramEntry {
                bin: PathBuf::from("/build/tools/meme.bin"),
                dir: Some(PathBuf::from("/build/tools")),
            },
        );
        config.programs.insert(
            "JASPAR".to_string(),
            ProgramEntry {
                bin: PathBuf::from("/bin/false"),
                dir: None,
            },
        );
        config.main.seqlogo = Some(PathBuf::from("/build/tools/seqlogo"));
        config
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = sample();
        let rendered = config.to_toml().expect("Should render");
        let parsed = Configuration::from_toml(&rendered).expect("Should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_lists_are_comma_joined() {
        let rendered = sample().to_toml().expect("Should render");
        assert!(rendered.contains("tools = \"MEME\""));
        assert!(rendered.contains("available_tools = \"MEME,GADEM\""));
        assert!(rendered.contains("background = \"genomic_matched,random\""));
    }

    #[test]
    fn test_program_sections() {
        let rendered = sample().to_toml().expect("Should render");
        assert!(rendered.contains("[programs.MEME]"));
        assert!(rendered.contains("bin = \"/build/tools/meme.bin\""));
        // Fixed pseudo-engines have no dir key
        let jaspar = rendered
            .split("[programs.JASPAR]")
            .nth(1)
            .and_then(|rest| rest.split('[').next())
            .expect("JASPAR section");
        assert!(jaspar.contains("bin = \"/bin/false\""));
        assert!(!jaspar.contains("dir"));
    }

    #[test]
    fn test_empty_lists_roundtrip() {
        let config = Configuration::new(DefaultParams::default().with_tools(vec![], vec![]));
        let parsed = Configuration::from_toml(&config.to_toml().expect("render")).expect("parse");
        assert!(parsed.params.tools.is_empty());
        assert!(parsed.params.available_tools.is_empty());
    }

    #[test]
    fn test_with_tools_leaves_original_untouched() {
        let base = DefaultParams::default();
        let derived = base.with_tools(vec!["AMD".to_string()], vec![]);
        assert_eq!(derived.available_tools, vec!["AMD".to_string()]);
        assert_eq!(base, DefaultParams::default());
    }

    #[test]
    fn test_with_data_dirs() {
        let main = MainSection::default().with_data_dirs(Path::new("/usr/share/motifpipe"));
        assert_eq!(main.tools_dir, Some(PathBuf::from("/usr/share/motifpipe/tools")));
        assert_eq!(
            main.motif_dir,
            Some(PathBuf::from("/usr/share/motifpipe/motif_databases"))
        );
        assert!(main.seqlogo.is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg").join(CONFIG_NAME);
        let config = sample();
        config.save_to_file(&path).expect("Should save");
        let loaded = Configuration::load_from_file(&path).expect("Should load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = Configuration::load_from_file("/nonexistent/motifpipe.toml").unwrap_err();
        assert!(matches!(err, SetupError::ConfigRead { .. }));
    }

    #[test]
    fn test_load_garbage_is_parse_error() {
        let err = Configuration::from_toml("not = [valid").unwrap_err();
        assert!(matches!(err, SetupError::ConfigParse(_)));
    }
}
