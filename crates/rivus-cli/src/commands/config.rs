use anyhow::Result;
use rivus_cli::Settings;

pub fn handle(settings: &Settings) -> Result<()> {
    print!("{}", settings.to_toml()?);
    Ok(())
}
