//! Box label artifacts.
//!
//! A label is a TSPL program that prints the box number as a QR code and as
//! text. Rendered labels are cached on disk as `{number}.tspl`; once a file
//! exists it is served as-is. New files are staged in the cache directory
//! and renamed into place, so a reader sees either no file or a whole one.

use crate::config::LabelConfig;
use cabletrack_print::{placeholders, render, TemplateData, TsplDriver};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Placeholder every label template must reference
pub const NUMBER_PLACEHOLDER: &str = "number";

pub const TSPL_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// 50x30 mm label with the QR code on the left and the number beside it
pub const DEFAULT_TSPL_TEMPLATE: &str = concat!(
    "SIZE 50 mm,30 mm\r\n",
    "GAP 2 mm,0 mm\r\n",
    "DIRECTION 1\r\n",
    "CLS\r\n",
    "QRCODE 20,20,M,6,A,0,\"{{ number }}\"\r\n",
    "TEXT 200,60,\"4\",0,1,1,\"{{ number }}\"\r\n",
    "PRINT 1,1\r\n",
);

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("label file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid label identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("unsupported label language '{0}'")]
    UnsupportedLanguage(String),

    #[error("label template {0} never references {{{{ number }}}}")]
    InvalidTemplate(String),
}

/// Printable bytes plus how to serve them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelArtifact {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Produces the label for a box number; repeated calls return the same artifact
pub trait LabelIssuer: Send + Sync {
    fn issue(&self, identifier: &str) -> Result<LabelArtifact, LabelError>;
}

/// TSPL labels cached under a directory
#[derive(Debug, Clone)]
pub struct TsplLabelIssuer {
    cache_dir: PathBuf,
    template: String,
}

impl TsplLabelIssuer {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            template: DEFAULT_TSPL_TEMPLATE.to_string(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn from_config(config: &LabelConfig) -> Result<Self, LabelError> {
        if !config.language.eq_ignore_ascii_case(TsplDriver::LANGUAGE) {
            return Err(LabelError::UnsupportedLanguage(config.language.clone()));
        }
        let issuer = Self::new(&config.cache_dir);
        match &config.template_path {
            Some(path) => {
                let template = fs::read_to_string(path).map_err(|source| LabelError::Io {
                    path: PathBuf::from(path),
                    source,
                })?;
                if !placeholders(&template).iter().any(|name| name == NUMBER_PLACEHOLDER) {
                    return Err(LabelError::InvalidTemplate(path.clone()));
                }
                Ok(issuer.with_template(template))
            }
            None => Ok(issuer),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cached_path(&self, identifier: &str) -> PathBuf {
        self.cache_dir.join(format!("{identifier}.tspl"))
    }
}

impl LabelIssuer for TsplLabelIssuer {
    fn issue(&self, identifier: &str) -> Result<LabelArtifact, LabelError> {
        // Identifiers become file names.
        if identifier.is_empty() || !identifier.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LabelError::InvalidIdentifier(identifier.to_string()));
        }

        let path = self.cached_path(identifier);
        let io_err = |source| LabelError::Io {
            path: path.clone(),
            source,
        };

        if path.is_file() {
            let bytes = fs::read(&path).map_err(io_err)?;
            return Ok(LabelArtifact {
                content_type: TSPL_CONTENT_TYPE,
                bytes,
            });
        }

        let mut data = TemplateData::new();
        data.insert(NUMBER_PLACEHOLDER.to_string(), Value::String(identifier.to_string()));
        let bytes = render(&self.template, &data).into_bytes();

        fs::create_dir_all(&self.cache_dir).map_err(|source| LabelError::Io {
            path: self.cache_dir.clone(),
            source,
        })?;
        let mut staged = NamedTempFile::new_in(&self.cache_dir).map_err(io_err)?;
        staged.write_all(&bytes).map_err(io_err)?;
        staged.persist(&path).map_err(|e| io_err(e.error))?;
        log::debug!("cached label {}", path.display());

        Ok(LabelArtifact {
            content_type: TSPL_CONTENT_TYPE,
            bytes,
        })
    }
}
