use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use lightbrush::Variant;
use presets::{BackendSetting, PresetConfig, ResolvedPreset, VariantSetting};
use tracing::debug;

use crate::cli::RenderArgs;

/// Loads the preset file at `path`, or the stock presets when it does not exist.
pub fn load_config(path: &Path, explicit: bool) -> Result<PresetConfig> {
    if !path.exists() {
        if explicit {
            return Err(anyhow!("config file {} does not exist", path.display()));
        }
        debug!(path = %path.display(), "no preset file; using stock presets");
        return Ok(PresetConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = PresetConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    debug!(path = %path.display(), presets = config.presets.len(), "loaded preset file");
    Ok(config)
}

/// Frame indices before which the canvas is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearSchedule {
    every: Option<u32>,
    at: BTreeSet<u64>,
}

impl ClearSchedule {
    pub fn new(every: Option<u32>, at: impl IntoIterator<Item = u64>) -> Self {
        Self {
            every: every.filter(|every| *every > 0),
            at: at.into_iter().collect(),
        }
    }

    pub fn clears_before(&self, frame: u64) -> bool {
        let periodic = self
            .every
            .is_some_and(|every| frame > 0 && frame % u64::from(every) == 0);
        periodic || self.at.contains(&frame)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub preset: String,
    pub variant: Variant,
    pub threshold: f32,
    pub darkening: f32,
    pub backend: BackendSetting,
    pub clear: ClearSchedule,
}

impl RenderSettings {
    /// Preset values overridden by any flags given on the command line.
    pub fn resolve(config: &PresetConfig, args: &RenderArgs) -> Result<Self> {
        let name = args
            .preset
            .as_deref()
            .or_else(|| config.default_preset())
            .ok_or_else(|| anyhow!("config defines no presets"))?;
        let preset: ResolvedPreset = config
            .resolved_preset(name)
            .ok_or_else(|| anyhow!("unknown preset '{name}'"))?;

        // A variant override changes which defaults apply to unset values.
        let (variant, threshold, darkening) = match args.variant {
            Some(variant) if variant != preset.variant => {
                let source = config.preset(name);
                (
                    variant,
                    source
                        .and_then(|preset| preset.threshold)
                        .unwrap_or(variant.default_threshold()),
                    source
                        .and_then(|preset| preset.darkening)
                        .unwrap_or(variant.default_darkening()),
                )
            }
            _ => (preset.variant, preset.threshold, preset.darkening),
        };

        Ok(Self {
            preset: preset.name,
            variant: map_variant(variant),
            threshold: args.threshold.unwrap_or(threshold),
            darkening: args.darkening.unwrap_or(darkening),
            backend: args.backend.unwrap_or(preset.backend),
            clear: ClearSchedule::new(
                args.clear_every.or(preset.clear_every),
                args.clear_at.iter().copied(),
            ),
        })
    }
}

pub fn map_variant(variant: VariantSetting) -> Variant {
    match variant {
        VariantSetting::Simple => Variant::Simple,
        VariantSetting::Advanced => Variant::Advanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
version = 1

[defaults]
preset = "slow"
backend = "software"

[presets.slow]
variant = "advanced"
darkening = 0.99
clear_every = 100

[presets.quick]
variant = "simple"
"#;

    fn args() -> RenderArgs {
        RenderArgs {
            input: PathBuf::from("in"),
            output: PathBuf::from("out"),
            ..RenderArgs::default()
        }
    }

    #[test]
    fn preset_defaults_match_plugin_defaults() {
        for setting in [VariantSetting::Simple, VariantSetting::Advanced] {
            let variant = map_variant(setting);
            assert_eq!(setting.default_threshold(), variant.default_threshold());
            assert_eq!(setting.default_darkening(), variant.default_darkening());
        }
    }

    #[test]
    fn default_preset_resolves() {
        let config = PresetConfig::from_toml_str(CONFIG).unwrap();
        let settings = RenderSettings::resolve(&config, &args()).unwrap();
        assert_eq!(settings.preset, "slow");
        assert_eq!(settings.variant, Variant::Advanced);
        assert_eq!(settings.threshold, 0.95);
        assert_eq!(settings.darkening, 0.99);
        assert_eq!(settings.backend, BackendSetting::Software);
        assert!(settings.clear.clears_before(200));
        assert!(!settings.clear.clears_before(0));
    }

    #[test]
    fn flags_override_preset_values() {
        let config = PresetConfig::from_toml_str(CONFIG).unwrap();
        let args = RenderArgs {
            preset: Some("slow".into()),
            variant: Some(VariantSetting::Simple),
            threshold: Some(0.7),
            backend: Some(BackendSetting::Gpu),
            clear_every: Some(3),
            clear_at: vec![1],
            ..args()
        };
        let settings = RenderSettings::resolve(&config, &args).unwrap();
        assert_eq!(settings.variant, Variant::Simple);
        assert_eq!(settings.threshold, 0.7);
        // Explicit preset value survives the variant switch.
        assert_eq!(settings.darkening, 0.99);
        assert_eq!(settings.backend, BackendSetting::Gpu);
        assert!(settings.clear.clears_before(1));
        assert!(settings.clear.clears_before(6));
        assert!(!settings.clear.clears_before(100));
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let config = PresetConfig::from_toml_str(CONFIG).unwrap();
        let args = RenderArgs {
            preset: Some("missing".into()),
            ..args()
        };
        let err = RenderSettings::resolve(&config, &args).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn missing_default_file_falls_back_to_stock_presets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("presets.toml");
        let config = load_config(&path, false).unwrap();
        assert_eq!(config.default_preset(), Some("trails"));
        assert!(load_config(&path, true).is_err());

        fs::write(&path, "version = 3\n[presets.a]\n").unwrap();
        let err = load_config(&path, false).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported config version 3"));
    }

    #[test]
    fn zero_interval_never_clears() {
        let schedule = ClearSchedule::new(Some(0), []);
        assert!(!(0..10).any(|frame| schedule.clears_before(frame)));
    }
}
