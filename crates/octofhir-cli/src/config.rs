use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use octofhir_search::{SearchCompilerConfig, SearchParameterRegistry, load_definitions_from_file};

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".octofhir").join("search.toml"))
}

/// Compiler config from `--config`, else `~/.octofhir/search.toml`, else defaults.
pub fn load_compiler_config(path: Option<&Path>) -> Result<SearchCompilerConfig> {
    if let Some(path) = path {
        return SearchCompilerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.exists() => SearchCompilerConfig::from_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        _ => Ok(SearchCompilerConfig::default()),
    }
}

/// Registry over `--definitions` when given, else the built-in model.
pub fn load_registry(definitions: Option<&Path>) -> Result<SearchParameterRegistry> {
    match definitions {
        Some(path) => {
            let table = load_definitions_from_file(path)
                .with_context(|| format!("Failed to load definitions {}", path.display()))?;
            if table.is_empty() {
                anyhow::bail!("No usable SearchParameter definitions in {}", path.display());
            }
            Ok(SearchParameterRegistry::new(table))
        }
        None => Ok(SearchParameterRegistry::with_builtin()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "approximate_fraction = 0.5").unwrap();
        let config = load_compiler_config(Some(file.path())).unwrap();
        assert_eq!(config.approximate_fraction, 0.5);
    }

    #[test]
    fn missing_explicit_config_fails() {
        assert!(load_compiler_config(Some(Path::new("/nonexistent/search.toml"))).is_err());
    }

    #[test]
    fn definitions_without_usable_parameters_fail() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(load_registry(Some(file.path())).is_err());
    }
}
