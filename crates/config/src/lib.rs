//! Configuration models and loaders for occluding bodies and window extraction.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Occluding body parsed from a catalog.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BodyConfig {
    pub name: String,
    pub radius_km: f64,
    /// Clearance above the surface that still blocks the line of sight.
    #[serde(default)]
    pub height_offset_km: f64,
    /// Undershoot below which clamping to the surface is silent; library default when absent.
    #[serde(default)]
    pub surface_tolerance_km: Option<f64>,
}

/// Window extraction settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Mode name, parsed leniently downstream (`der`, `linear`, ...).
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Catalog name of the occluding body.
    #[serde(default)]
    pub body: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            label: None,
            body: None,
        }
    }
}

fn default_mode() -> String {
    "der".to_string()
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("body '{0}' not found in catalog")]
    UnknownBody(String),
    #[error("body '{name}' has invalid dimensions (radius {radius_km} km, offset {height_offset_km} km)")]
    InvalidRadius {
        name: String,
        radius_km: f64,
        height_offset_km: f64,
    },
}

/// Load body records from a YAML list, a single TOML file, or a directory of TOML files.
pub fn load_bodies<P: AsRef<Path>>(path: P) -> Result<Vec<BodyConfig>, ConfigError> {
    let bodies: Vec<BodyConfig> = load_records(path)?;
    for body in &bodies {
        validate_body(body)?;
    }
    Ok(bodies)
}

/// Load extraction settings from a YAML or TOML file.
pub fn load_extraction<P: AsRef<Path>>(path: P) -> Result<ExtractionConfig, ConfigError> {
    let path = path.as_ref();
    if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

/// Case-insensitive catalog lookup.
pub fn find_body<'a>(bodies: &'a [BodyConfig], name: &str) -> Result<&'a BodyConfig, ConfigError> {
    let upper = name.to_uppercase();
    bodies
        .iter()
        .find(|b| b.name.to_uppercase() == upper)
        .ok_or_else(|| ConfigError::UnknownBody(name.to_string()))
}

fn validate_body(body: &BodyConfig) -> Result<(), ConfigError> {
    let valid = body.radius_km.is_finite()
        && body.radius_km >= 0.0
        && body.height_offset_km.is_finite()
        && body.height_offset_km >= 0.0;
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidRadius {
            name: body.name.clone(),
            radius_km: body.radius_km,
            height_offset_km: body.height_offset_km,
        })
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
