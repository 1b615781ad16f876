use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantSetting {
    Simple,
    #[default]
    Advanced,
}

impl VariantSetting {
    pub fn default_threshold(self) -> f32 {
        match self {
            VariantSetting::Simple => 0.5,
            VariantSetting::Advanced => 0.95,
        }
    }

    pub fn default_darkening(self) -> f32 {
        match self {
            VariantSetting::Simple => 0.5,
            VariantSetting::Advanced => 0.95,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VariantSetting::Simple => "simple",
            VariantSetting::Advanced => "advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendSetting {
    #[default]
    Gpu,
    Software,
}

impl BackendSetting {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendSetting::Gpu => "gpu",
            BackendSetting::Software => "software",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresetConfig {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    pub preset: Option<String>,
    #[serde(default, deserialize_with = "deserialize_backend_opt")]
    pub backend: Option<BackendSetting>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Preset {
    #[serde(default, deserialize_with = "deserialize_variant")]
    pub variant: VariantSetting,
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub darkening: Option<f32>,
    #[serde(default)]
    pub clear_every: Option<u32>,
}

/// A preset with every optional value filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPreset {
    pub name: String,
    pub variant: VariantSetting,
    pub threshold: f32,
    pub darkening: f32,
    pub clear_every: Option<u32>,
    pub backend: BackendSetting,
}

fn deserialize_variant<'de, D>(deserializer: D) -> Result<VariantSetting, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_variant(&raw).map_err(de::Error::custom)
}

fn deserialize_backend_opt<'de, D>(deserializer: D) -> Result<Option<BackendSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|raw| parse_backend(&raw).map_err(de::Error::custom))
        .transpose()
}

/// Accepts the canonical names plus the plugin names users tend to type.
pub fn parse_variant(raw: &str) -> Result<VariantSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "simple" | "basic" | "lightbrush" => Ok(VariantSetting::Simple),
        "advanced" | "velocity" | "lightbrush2" | "default" => Ok(VariantSetting::Advanced),
        other => Err(format!("invalid variant '{other}'")),
    }
}

pub fn parse_backend(raw: &str) -> Result<BackendSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "gpu" | "wgpu" | "auto" => Ok(BackendSetting::Gpu),
        "software" | "cpu" => Ok(BackendSetting::Software),
        other => Err(format!("invalid backend '{other}'")),
    }
}

impl PresetConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PresetConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Configured default preset, or the first by name.
    pub fn default_preset(&self) -> Option<&str> {
        self.defaults
            .preset
            .as_deref()
            .or_else(|| self.presets.keys().next().map(String::as_str))
    }

    pub fn resolved_preset(&self, name: &str) -> Option<ResolvedPreset> {
        let preset = self.presets.get(name)?;
        Some(preset.resolve(name, self.defaults.backend.unwrap_or_default()))
    }

    pub fn resolved_presets(&self) -> Vec<ResolvedPreset> {
        let backend = self.defaults.backend.unwrap_or_default();
        self.presets
            .iter()
            .map(|(name, preset)| preset.resolve(name, backend))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.presets.is_empty() {
            return Err(ConfigError::Invalid(
                "config must define at least one preset".into(),
            ));
        }

        for (name, preset) in &self.presets {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("preset name may not be empty".into()));
            }

            for (field, value) in [("threshold", preset.threshold), ("darkening", preset.darkening)] {
                if let Some(value) = value {
                    if !value.is_finite() {
                        return Err(ConfigError::Invalid(format!(
                            "preset '{name}' {field} must be a finite number"
                        )));
                    }
                }
            }

            if preset.clear_every == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "preset '{name}' clear_every must be greater than zero"
                )));
            }
        }

        if let Some(default_preset) = &self.defaults.preset {
            if !self.presets.contains_key(default_preset) {
                return Err(ConfigError::Invalid(format!(
                    "defaults.preset references unknown preset '{default_preset}'"
                )));
            }
        }

        Ok(())
    }
}

impl Preset {
    pub fn resolve(&self, name: &str, backend: BackendSetting) -> ResolvedPreset {
        ResolvedPreset {
            name: name.to_string(),
            variant: self.variant,
            threshold: self.threshold.unwrap_or(self.variant.default_threshold()),
            darkening: self.darkening.unwrap_or(self.variant.default_darkening()),
            clear_every: self.clear_every,
            backend,
        }
    }
}

impl Default for PresetConfig {
    /// The two stock presets, one per variant.
    fn default() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert(
            "brush".to_string(),
            Preset {
                variant: VariantSetting::Simple,
                ..Preset::default()
            },
        );
        presets.insert(
            "trails".to_string(),
            Preset {
                variant: VariantSetting::Advanced,
                ..Preset::default()
            },
        );
        Self {
            version: 1,
            defaults: Defaults {
                preset: Some("trails".to_string()),
                backend: None,
            },
            presets,
        }
    }
}
