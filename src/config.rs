use std::path::PathBuf;
use thiserror::Error;

use crate::github::DEFAULT_API_BASE;
use crate::sections::SectionMap;

pub const DEFAULT_ACCOUNT: &str = "jacobmiller9826";
pub const DEFAULT_OUTPUT: &str = "index.html";
pub const DEFAULT_PDF_LINK: &str = "./Jacob_Miller_GitHub_Curriculum.pdf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read section map {}: {source}", path.display())]
    SectionsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid section map {}: {source}", path.display())]
    SectionsParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unknown option: {0}")]
    UnknownFlag(String),

    #[error("Option {0} requires a value")]
    MissingValue(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub account: String,
    pub output: PathBuf,
    pub sections: SectionMap,
    pub api_base: String,
    /// Curriculum download link; an empty `FOLIO_PDF_LINK` turns it off
    pub pdf_link: Option<String>,
    /// Open the particle window; `false` only builds the page
    pub window: bool,
}

impl Config {
    /// Build from process arguments and environment. Call after loading `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Command-line values win over environment values, which win over defaults
    pub fn from_sources<F>(args: &[String], env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            account: env("FOLIO_ACCOUNT").unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
            output: PathBuf::from(env("FOLIO_OUTPUT").unwrap_or_else(|| DEFAULT_OUTPUT.to_string())),
            sections: SectionMap::default(),
            api_base: env("FOLIO_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            pdf_link: match env("FOLIO_PDF_LINK") {
                Some(link) if link.is_empty() => None,
                Some(link) => Some(link),
                None => Some(DEFAULT_PDF_LINK.to_string()),
            },
            window: true,
        };

        let mut sections_path = env("FOLIO_SECTIONS").map(PathBuf::from);

        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--no-window" => config.window = false,
                "--out" | "-o" => {
                    let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    config.output = PathBuf::from(value);
                }
                "--sections" => {
                    let value = args.next().ok_or_else(|| ConfigError::MissingValue(arg.clone()))?;
                    sections_path = Some(PathBuf::from(value));
                }
                flag if flag.starts_with('-') => return Err(ConfigError::UnknownFlag(flag.to_string())),
                account => config.account = account.to_string(),
            }
        }

        if let Some(path) = sections_path {
            config.sections = load_sections(path)?;
        }

        Ok(config)
    }
}

fn load_sections(path: PathBuf) -> Result<SectionMap, ConfigError> {
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(source) => return Err(ConfigError::SectionsRead { path, source }),
    };
    SectionMap::from_json_str(&json).map_err(|source| ConfigError::SectionsParse { path, source })
}
