use std::{fs, path::Path};

use anyhow::{Context, Result};
use hordefall_core::Tuning;

/// Loads the tuning document, falling back to defaults without a file.
pub(crate) fn load_tuning(path: Option<&Path>, seed: Option<u64>) -> Result<Tuning> {
    let mut tuning = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read tuning file {}", path.display()))?;
            parse_tuning(&text)
                .with_context(|| format!("failed to parse tuning file {}", path.display()))?
        }
        None => Tuning::default(),
    };
    if let Some(seed) = seed {
        tuning.seed = seed;
    }
    tuning.validate().context("tuning rejected")?;
    Ok(tuning)
}

fn parse_tuning(text: &str) -> Result<Tuning> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let tuning = parse_tuning("[player]\nmax_health = 250.0\n").expect("valid document");

        assert_eq!(tuning.player.max_health, 250.0);
        assert_eq!(tuning.map, Tuning::default().map);
    }

    #[test]
    fn seed_flag_overrides_defaults() {
        let tuning = load_tuning(None, Some(99)).expect("defaults are valid");
        assert_eq!(tuning.seed, 99);
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = load_tuning(Some(Path::new("/nonexistent/hordefall.toml")), None)
            .expect_err("file does not exist");

        assert!(format!("{error:#}").contains("/nonexistent/hordefall.toml"));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(parse_tuning("[map\nsize = 17").is_err());
        assert!(parse_tuning("[map]\nsize = \"big\"").is_err());
    }
}
