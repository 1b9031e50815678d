//! Locating and reading `.config/pgshape.styx`.
//!
//! The file is optional. Without one, every setting comes from flags and
//! the environment; with `--config`, the named file must exist.

use std::path::{Path, PathBuf};

use pgshape_config::Config;

/// Location of the config file relative to a project directory.
pub const CONFIG_FILE: &str = ".config/pgshape.styx";

/// A configuration and the file it was read from, if any.
#[derive(Debug, Default)]
pub struct Loaded {
    pub config: Config,
    pub path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly named config file is missing
    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid Styx for [`Config`]
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// The nearest config file in `start` or one of its ancestors.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Parse a single config file.
pub fn read(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    facet_styx::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Configuration for a run: `explicit` if given, else whatever
/// [`discover`] finds from `start`, else the defaults.
pub fn load(explicit: Option<&Path>, start: &Path) -> Result<Loaded, ConfigError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => discover(start),
    };

    match path {
        Some(path) => {
            let config = read(&path)?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(Loaded {
                config,
                path: Some(path),
            })
        }
        None => Ok(Loaded::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fresh project directory under the system temp dir.
    fn project(name: &str, config: Option<&str>) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pgshape-cfg-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join(".config")).unwrap();
        if let Some(contents) = config {
            std::fs::write(dir.join(CONFIG_FILE), contents).unwrap();
        }
        dir
    }

    #[test]
    fn test_load_discovers_file_in_ancestor() {
        let root = project(
            "ancestor",
            Some("schema dvds\ntables (film film_category)\nmutability non-key\n"),
        );
        let nested = root.join("src/gen");
        std::fs::create_dir_all(&nested).unwrap();

        let loaded = load(None, &nested).unwrap();
        assert_eq!(loaded.path, Some(root.join(CONFIG_FILE)));
        assert_eq!(loaded.config.schema.as_deref(), Some("dvds"));
        assert_eq!(loaded.config.tables, vec!["film", "film_category"]);
        assert_eq!(loaded.config.mutability.as_deref(), Some("non-key"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_explicit_file_wins_over_discovery() {
        let root = project("explicit", Some("schema public\n"));
        let other = root.join("other.styx");
        std::fs::write(&other, "schema dvds\n").unwrap();

        let loaded = load(Some(&other), &root).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(other.as_path()));
        assert_eq!(loaded.config.schema.as_deref(), Some("dvds"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let root = project("missing", None);
        let missing = root.join("nope.styx");

        let err = load(Some(&missing), &root).unwrap_err();
        assert!(matches!(&err, ConfigError::NotFound(path) if *path == missing));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let root = project("parse", Some("tables {{{\n"));

        let err = load(None, &root).unwrap_err();
        assert!(matches!(&err, ConfigError::Parse { path, .. } if *path == root.join(CONFIG_FILE)));
        assert!(err.to_string().contains("pgshape.styx"));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
