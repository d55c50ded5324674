use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use depthdeblur_core::pipeline::DeblurConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Validate an existing config file instead of printing the default
    #[arg(long, conflicts_with = "output")]
    pub check: Option<PathBuf>,
}

/// Print or save the default DeblurConfig as TOML, or check an existing one.
pub fn run(args: &ConfigArgs) -> Result<()> {
    if let Some(ref path) = args.check {
        let config = read_config(path)?;
        config
            .validate()
            .with_context(|| format!("{} is not usable", path.display()))?;
        println!("{} is valid", path.display());
        return Ok(());
    }

    let toml_str = toml::to_string_pretty(&DeblurConfig::default())?;
    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}

pub fn read_config(path: &std::path::Path) -> Result<DeblurConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid deblur config")
}
