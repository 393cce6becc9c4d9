//! Shared helpers for CLI commands: loading inputs and rendering diagnostics.

use std::path::{Path, PathBuf};

use stratum_config::{ConfigError, FloorplanConfig};
use stratum_diagnostics::{
    Diagnostic, DiagnosticRenderer, JsonRenderer, Severity, TerminalRenderer,
};
use stratum_floorplan::Design;

use crate::{GlobalArgs, ReportFormat};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "stratum.toml";

/// Reads a design from JSON and assigns arena IDs.
pub fn load_design(path: &Path) -> Result<Design, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read design {}: {e}", path.display()))?;
    let mut design: Design = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse design {}: {e}", path.display()))?;
    design.reindex();
    Ok(design)
}

/// Returns the configuration file to use, if any.
///
/// An explicit `--config` wins; otherwise `stratum.toml` in `dir` is used
/// when present.
pub fn config_path(global: &GlobalArgs, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = &global.config {
        return Some(path.clone());
    }
    let candidate = dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Loads the effective configuration; defaults apply without a file.
pub fn load_effective_config(global: &GlobalArgs) -> Result<FloorplanConfig, ConfigError> {
    let cwd = std::env::current_dir()?;
    match config_path(global, &cwd) {
        Some(path) => stratum_config::load_config(&path),
        None => Ok(FloorplanConfig::default()),
    }
}

/// Renders diagnostics to stderr and returns `(errors, warnings)`.
pub fn report(diagnostics: &[Diagnostic], format: ReportFormat, color: bool) -> (usize, usize) {
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(color);
            for diag in diagnostics {
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            for diag in diagnostics {
                eprintln!("{}", JsonRenderer.render(diag));
            }
        }
    }
    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    (count(Severity::Error), count(Severity::Warning))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_diagnostics::Verbosity;

    fn global(config: Option<PathBuf>) -> GlobalArgs {
        GlobalArgs {
            verbosity: Verbosity::Normal,
            color: false,
            config,
        }
    }

    #[test]
    fn load_design_reindexes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.json");
        std::fs::write(
            &path,
            r#"{"blocks": [{"name": "a", "width": 2, "height": 2},
                           {"name": "b", "width": 3, "height": 1}],
               "nets": [{"name": "n", "blocks": [0, 1]}]}"#,
        )
        .unwrap();
        let design = load_design(&path).unwrap();
        assert_eq!(design.blocks[1].id.as_raw(), 1);
        assert_eq!(design.nets[0].weight, 1.0);
        assert!(design.block_by_name.contains_key("b"));
    }

    #[test]
    fn load_design_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = load_design(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn config_lookup_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(config_path(&global(None), dir.path()).is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        assert_eq!(
            config_path(&global(None), dir.path()),
            Some(dir.path().join(CONFIG_FILE_NAME))
        );

        let explicit = PathBuf::from("/elsewhere/custom.toml");
        assert_eq!(
            config_path(&global(Some(explicit.clone())), dir.path()),
            Some(explicit)
        );
    }

    #[test]
    fn report_counts_by_severity() {
        use stratum_diagnostics::{Category, DiagnosticCode};
        let diags = vec![
            Diagnostic::error(DiagnosticCode::new(Category::Error, 101), "bad"),
            Diagnostic::warning(DiagnosticCode::new(Category::Warning, 203), "meh"),
            Diagnostic::warning(DiagnosticCode::new(Category::Warning, 201), "meh"),
        ];
        assert_eq!(report(&diags, ReportFormat::Json, false), (1, 2));
    }
}
