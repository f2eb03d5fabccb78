use crate::error::Result;
use crate::settings::{load_settings, save_settings_to, settings_path, RunContext};

/// Persist run defaults; unspecified fields keep their current value.
pub fn run(
    output_dir: Option<String>,
    log_dir: Option<String>,
    aggregator: Option<String>,
    details: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = output_dir {
        settings.output_dir = dir;
    }
    if let Some(dir) = log_dir {
        settings.log_dir = dir;
    }
    if aggregator.is_some() {
        settings.aggregator = aggregator;
    }
    if details.is_some() {
        settings.details_dir = details;
    }

    let path = settings_path();
    save_settings_to(&path, &settings)?;
    RunContext::new(&settings, None, 0).ensure_dirs()?;

    println!("Saved settings to {}", path.display());
    println!("Output: {}", settings.output_dir);
    println!("Logs:   {}", settings.log_dir);
    Ok(())
}
