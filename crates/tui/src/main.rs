mod page;
mod renderer;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use folio_core::SiteConfig;
use tracing_subscriber::EnvFilter;

/// Log to the file named by `FOLIO_LOG_FILE`, if set. The terminal itself
/// belongs to the UI.
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var_os("FOLIO_LOG_FILE") else {
        return Ok(());
    };
    let file = File::create(&path)
        .with_context(|| format!("creating log file {}", PathBuf::from(&path).display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config(args: &[String]) -> Result<SiteConfig> {
    match args {
        [] => Ok(SiteConfig::default()),
        [flag, path] if flag == "--config" => {
            let data = std::fs::read(path).with_context(|| format!("reading {path}"))?;
            SiteConfig::from_json(&data).with_context(|| format!("parsing {path}"))
        }
        _ => bail!("Usage: folio [--config <site.json>]"),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(&args)?;
    init_logging()?;
    renderer::run(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_uses_defaults() {
        let config = load_config(&[]).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(load_config(&["--fast".to_owned()]).is_err());
    }
}
