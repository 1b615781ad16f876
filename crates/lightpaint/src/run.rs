use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use lightbrush::{ParamId, PLUGIN_INFO};
use presets::PresetConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, PresetsArgs, RenderArgs};
use crate::driver::Driver;
use crate::frames::{list_frames, load_frame, save_frame};
use crate::paths::AppPaths;
use crate::settings::{load_config, RenderSettings};

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let config = match cli.config.as_deref() {
        Some(path) => load_config(path, true)?,
        None => {
            let paths = AppPaths::discover()?;
            tracing::debug!(config = %paths.config_dir().display(), "resolved lightpaint paths");
            load_config(&paths.presets_file(), false)?
        }
    };

    match cli.command {
        Command::Render(args) => render(&config, &args),
        Command::Presets(args) => list_presets(&config, &args),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn render(config: &PresetConfig, args: &RenderArgs) -> Result<()> {
    let settings = RenderSettings::resolve(config, args)?;
    let mut inputs = list_frames(&args.input)?;
    if let Some(limit) = args.limit {
        inputs.truncate(limit);
    }
    fs::create_dir_all(&args.output).with_context(|| {
        format!("failed to create output directory {}", args.output.display())
    })?;

    // The first frame fixes the viewport; later frames of another size are
    // sampled against it.
    let first_path = inputs
        .first()
        .with_context(|| format!("no frames to render in {}", args.input.display()))?;
    let first = load_frame(first_path)?;
    let viewport = first.viewport;
    let mut driver = Driver::new(settings.backend, settings.variant, viewport)?;
    driver.set_float(ParamId::Threshold, settings.threshold)?;
    driver.set_float(ParamId::Darkening, settings.darkening)?;

    tracing::info!(
        plugin = PLUGIN_INFO.name,
        preset = %settings.preset,
        variant = %settings.variant,
        backend = driver.backend_name(),
        threshold = settings.threshold,
        darkening = settings.darkening,
        %viewport,
        frames = inputs.len(),
        "rendering light painting"
    );

    let mut pending = Some(first);
    for (index, path) in inputs.iter().enumerate() {
        let frame = match pending.take() {
            Some(frame) => frame,
            None => load_frame(path)?,
        };
        if frame.viewport != viewport {
            tracing::warn!(
                path = %path.display(),
                size = %frame.viewport,
                %viewport,
                "frame size differs from the first frame"
            );
        }

        if settings.clear.clears_before(index as u64) {
            tracing::debug!(frame = index, "clearing canvas");
            driver.clear()?;
        }

        let output = driver
            .process(&frame)
            .with_context(|| format!("failed to process {}", path.display()))?;
        let name = path
            .file_name()
            .with_context(|| format!("input path {} has no file name", path.display()))?;
        save_frame(&args.output.join(name), output)?;
    }

    driver.teardown();
    tracing::info!(
        frames = inputs.len(),
        output = %args.output.display(),
        "finished rendering"
    );
    Ok(())
}

fn list_presets(config: &PresetConfig, args: &PresetsArgs) -> Result<()> {
    let presets = config.resolved_presets();
    let mut stdout = io::stdout().lock();

    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &presets)
            .context("failed to serialise presets")?;
        writeln!(stdout)?;
        return Ok(());
    }

    let default = config.default_preset();
    for preset in presets {
        let marker = if Some(preset.name.as_str()) == default { "*" } else { " " };
        let clear = preset
            .clear_every
            .map(|every| every.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            stdout,
            "{marker} {name:<16} {variant:<8} threshold={threshold:.3} darkening={darkening:.3} clear_every={clear} backend={backend}",
            name = preset.name,
            variant = preset.variant.as_str(),
            threshold = preset.threshold,
            darkening = preset.darkening,
            backend = preset.backend.as_str(),
        )?;
    }
    Ok(())
}
