// src/config.rs
use serde::Deserialize;

use crate::error::ConfigError;
use crate::projection::ShiftRules;
use crate::vocabulary::ShiftVocabulary;

pub const ENV_PREFIX: &str = "ROSTERSYNC_";

pub const DEFAULT_NAME_HEADER: &str = "姓名";
pub const DEFAULT_DATE_HEADER: &str = "日     期";
pub const DEFAULT_REST_CODE: &str = "休";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    // Server Configuration
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,

    // Attendance sheet anchors (exact text, internal spacing included)
    #[serde(default = "default_name_header")]
    pub name_header: String,
    #[serde(default = "default_date_header")]
    pub date_header: String,

    // Shift codes
    #[serde(default = "default_rest_code")]
    pub rest_code: String,
    #[serde(default = "default_transfer_code")]
    pub transfer_code: String,
    #[serde(default = "default_overnight_code")]
    pub overnight_code: String,

    /// Extra restriction on parsed names; empty means the attendance sheet's names only.
    #[serde(default)]
    pub allowed_names: Vec<String>,
    /// `keyword=code,...`, replaces the built-in vocabulary when set.
    #[serde(default)]
    pub shift_mappings: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_name_header() -> String {
    DEFAULT_NAME_HEADER.to_string()
}
fn default_date_header() -> String {
    DEFAULT_DATE_HEADER.to_string()
}
fn default_rest_code() -> String {
    DEFAULT_REST_CODE.to_string()
}
fn default_transfer_code() -> String {
    ShiftRules::default().transfer_code
}
fn default_overnight_code() -> String {
    ShiftRules::default().overnight_code
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            name_header: default_name_header(),
            date_header: default_date_header(),
            rest_code: default_rest_code(),
            transfer_code: default_transfer_code(),
            overnight_code: default_overnight_code(),
            allowed_names: Vec::new(),
            shift_mappings: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Ok(envy::prefixed(ENV_PREFIX).from_env::<AppConfig>()?)
    }

    pub fn settings(&self) -> Result<ReconcileSettings, ConfigError> {
        let vocabulary = match self.shift_mappings.as_deref() {
            Some(mappings) if !mappings.trim().is_empty() => ShiftVocabulary::parse(mappings)?,
            _ => ShiftVocabulary::default(),
        };
        Ok(ReconcileSettings {
            vocabulary,
            rules: ShiftRules {
                transfer_code: self.transfer_code.clone(),
                overnight_code: self.overnight_code.clone(),
            },
            headers: SheetHeaders {
                name_header: self.name_header.clone(),
                date_header: self.date_header.clone(),
            },
            rest_code: self.rest_code.clone(),
            allowed_names: self
                .allowed_names
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        })
    }
}

/// Header text the attendance sheet is located by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHeaders {
    pub name_header: String,
    pub date_header: String,
}

impl Default for SheetHeaders {
    fn default() -> Self {
        Self {
            name_header: DEFAULT_NAME_HEADER.to_string(),
            date_header: DEFAULT_DATE_HEADER.to_string(),
        }
    }
}

/// Process-wide, read-only inputs to every reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub vocabulary: ShiftVocabulary,
    pub rules: ShiftRules,
    pub headers: SheetHeaders,
    pub rest_code: String,
    pub allowed_names: Vec<String>,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            vocabulary: ShiftVocabulary::default(),
            rules: ShiftRules::default(),
            headers: SheetHeaders::default(),
            rest_code: DEFAULT_REST_CODE.to_string(),
            allowed_names: Vec::new(),
        }
    }
}
