//! Command handlers

use std::path::PathBuf;

use crate::cli::{Cli, Commands};
use crate::output::{
    output_admission, output_artifact, output_reading, output_receipt, output_records,
};
use truckgate_app::app::{
    build_recognizer, open_admission_controller, open_capture_service, open_intake_service,
    IntakeRequest, IntakeServiceError,
};
use truckgate_app::config::Config;
use truckgate_app::repository::{open_audio_store, open_cache, open_truck_repo};
use truckgate_types::{ConfigError, Error, OutputFormat, Result};
use truckgate_vision::PlateRecognition;

pub fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let output_format = cli.format.unwrap_or(config.output_format);
    tracing::debug!(backend = %config.store_backend, format = %output_format, "configuration loaded");

    match cli.command {
        Commands::Capture => cmd_capture(&config),

        Commands::Intake {
            plate,
            license,
            challan,
            capture,
        } => cmd_intake(&config, output_format, plate, license, challan, capture),

        Commands::Recognize { image, no_cache } => {
            let mut config = config;
            // Cache disabled if: --no-cache OR config.cache_enabled=false
            config.cache_enabled = config.cache_enabled && !no_cache;
            cmd_recognize(&config, output_format, image)
        }

        Commands::Gate => {
            let controller = open_admission_controller(&config)?;
            let admitted = controller.admit_next()?;
            output_admission(output_format, admitted.as_ref())
        }

        Commands::Queue => {
            let records = open_truck_repo(&config)?.list_queued()?;
            output_records(output_format, "Queued trucks", &records)
        }

        Commands::History => {
            let records = open_truck_repo(&config)?.list_all()?;
            output_records(output_format, "Truck history", &records)
        }

        Commands::Announce { truck_number } => {
            let controller = open_admission_controller(&config)?;
            let artifact = controller.reannounce(truck_number.trim())?;
            output_artifact(output_format, &artifact)
        }

        Commands::Artifact { truck_number } => {
            let audio = open_audio_store(&config)?;
            let artifact = audio.find(truck_number.trim()).ok_or_else(|| {
                Error::FileNotFound(format!("no announcement for truck {}", truck_number.trim()))
            })?;
            output_artifact(output_format, &artifact)
        }

        Commands::Cache { clear, stats } => cmd_cache(&config, clear, stats),

        Commands::Config { show, set, reset } => cmd_config(show, set, reset),
    }
}

fn cmd_capture(config: &Config) -> Result<()> {
    let path = open_capture_service(config)?.capture()?;
    println!("Captured plate frame: {}", path.display());
    if let Some(name) = path.file_name() {
        println!("Use with: truckgate intake --plate {} ...", name.to_string_lossy());
    }
    Ok(())
}

fn cmd_intake(
    config: &Config,
    output_format: OutputFormat,
    plate: Option<PathBuf>,
    license: Option<PathBuf>,
    challan: Option<PathBuf>,
    capture: bool,
) -> Result<()> {
    let plate = if capture {
        Some(open_capture_service(config)?.capture()?)
    } else {
        plate
    };

    let request = IntakeRequest {
        plate_image: plate,
        license,
        challan,
    };

    let service = open_intake_service(config)?;
    let receipt = service
        .submit(&request)
        .map_err(|e: IntakeServiceError| Error::IntakeFailed(e.to_string()))?;

    output_receipt(output_format, &receipt)
}

fn cmd_recognize(config: &Config, output_format: OutputFormat, image: PathBuf) -> Result<()> {
    if !image.is_file() {
        return Err(Error::FileNotFound(image.display().to_string()));
    }
    let bytes = std::fs::read(&image)?;
    let reading = build_recognizer(config)?.recognize(&bytes)?;
    output_reading(output_format, &reading)
}

fn cmd_cache(config: &Config, clear: bool, stats: bool) -> Result<()> {
    let cache = open_cache(config)?;

    if clear {
        let count = cache.clear()?;
        println!("Cleared {} cached readings", count);
    }

    if stats || !clear {
        println!("{}", cache.stats()?);
        if !config.cache_enabled {
            println!("(cache is disabled; enable with `truckgate config --set cache_enabled=true`)");
        }
    }

    Ok(())
}

fn cmd_config(show: bool, set: Vec<String>, reset: bool) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    // Environment overrides are not written back to the file.
    let mut config = Config::load_file()?;

    for assignment in &set {
        let (key, value) = parse_assignment(assignment)?;
        config.set(key, value)?;
        println!("{} = {}", key, if key == "api_key" { "(hidden)" } else { value });
    }

    if !set.is_empty() {
        config.save()?;
        println!("Configuration saved");
    }

    if show || set.is_empty() {
        let mut effective = config;
        effective.apply_overrides(|key| std::env::var(key).ok());
        println!("{}", effective);
    }

    Ok(())
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(ConfigError::InvalidValue {
            key: assignment.to_string(),
            value: "expected KEY=VALUE".to_string(),
        }
        .into()),
    }
}
