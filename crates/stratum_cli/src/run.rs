//! `stratum run`: load, validate, anneal, write the result.
//!
//! 1. Load the configuration (`--config`, `./stratum.toml`, or defaults)
//! 2. Apply `--seed` / `--max-levels` overrides
//! 3. Load the design JSON
//! 4. Floorplan with the built-in congestion and voltage estimators
//! 5. Render diagnostics and write the result JSON

use stratum_config::FloorplanConfig;
use stratum_diagnostics::DiagnosticSink;
use stratum_floorplan::{BuiltinCosts, Floorplanner};

use crate::pipeline::{load_design, load_effective_config, report};
use crate::{GlobalArgs, ReportFormat, RunArgs};

/// Runs the `stratum run` command.
///
/// Returns exit code 0 on success, 1 if validation failed.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = load_effective_config(global)?;
    apply_overrides(&mut config, args);
    let design = load_design(&args.design)?;

    if global.chatty() && args.format == ReportFormat::Text {
        eprintln!(
            "   Floorplanning {} blocks on {} dies (seed {})",
            design.block_count(),
            config.stack.layers,
            config.annealing.seed
        );
    }

    let sink = DiagnosticSink::with_verbosity(global.verbosity);
    let builtin = BuiltinCosts::new(&config.stack, &config.routing);
    let outcome = Floorplanner::new(&design, &config)
        .with_external(&builtin)
        .run(&sink);
    let (errors, warnings) = report(&sink.take_all(), args.format, global.color);

    let Ok(result) = outcome else {
        if global.chatty() && args.format == ReportFormat::Text {
            eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
        }
        return Ok(1);
    };

    let json = serde_json::to_string_pretty(&result)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }

    if global.chatty() && args.format == ReportFormat::Text {
        eprintln!(
            "   Result: cost {:.6} after {} levels ({}), {warnings} warning(s)",
            result.cost.total, result.levels, result.termination
        );
    }
    Ok(0)
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut FloorplanConfig, args: &RunArgs) {
    if let Some(seed) = args.seed {
        config.annealing.seed = seed;
    }
    if let Some(levels) = args.max_levels {
        config.annealing.max_levels = levels;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use stratum_diagnostics::Verbosity;

    const DESIGN: &str = r#"{
        "blocks": [
            {"name": "cpu", "width": 4, "height": 3, "power_density": 0.2},
            {"name": "cache", "width": 3, "height": 3, "power_density": 0.05},
            {"name": "io", "width": 2, "height": 5}
        ],
        "nets": [{"name": "bus", "blocks": [0, 1, 2]}]
    }"#;

    const CONFIG: &str = r#"
        [stack]
        layers = 2
        outline_width = 12
        outline_height = 12

        [annealing]
        seed = 3
        max_levels = 50

        [thermal]
        map_dim = 8
    "#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn args(design: PathBuf, output: PathBuf) -> RunArgs {
        RunArgs {
            design,
            output: Some(output),
            seed: None,
            max_levels: Some(4),
            format: ReportFormat::Json,
        }
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = FloorplanConfig::default();
        let mut a = args(PathBuf::new(), PathBuf::new());
        a.seed = Some(99);
        apply_overrides(&mut config, &a);
        assert_eq!(config.annealing.seed, 99);
        assert_eq!(config.annealing.max_levels, 4);
    }

    #[test]
    fn end_to_end_writes_result_json() {
        let dir = tempfile::tempdir().unwrap();
        let design = write(dir.path(), "design.json", DESIGN);
        let config = write(dir.path(), "stratum.toml", CONFIG);
        let output = dir.path().join("result.json");
        let global = GlobalArgs {
            verbosity: Verbosity::Quiet,
            color: false,
            config: Some(config),
        };

        let code = run(&args(design, output.clone()), &global).unwrap();
        assert_eq!(code, 0);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["layers"], 2);
        assert_eq!(json["seed"], 3);
        assert_eq!(json["blocks"].as_array().unwrap().len(), 3);
        assert!(json["levels"].as_u64().unwrap() <= 4);
        assert_eq!(json["thermal"]["maps"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn invalid_design_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let design = write(
            dir.path(),
            "design.json",
            r#"{"blocks": [{"name": "a", "width": 0, "height": 2}]}"#,
        );
        let config = write(dir.path(), "stratum.toml", CONFIG);
        let output = dir.path().join("result.json");
        let global = GlobalArgs {
            verbosity: Verbosity::Quiet,
            color: false,
            config: Some(config),
        };
        assert_eq!(run(&args(design, output.clone()), &global).unwrap(), 1);
        assert!(!output.exists());
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let design = write(dir.path(), "design.json", DESIGN);
        let config = write(dir.path(), "stratum.toml", "[stack]\nlayers = 0\n");
        let global = GlobalArgs {
            verbosity: Verbosity::Quiet,
            color: false,
            config: Some(config),
        };
        let err = run(&args(design, dir.path().join("r.json")), &global).unwrap_err();
        assert!(err.to_string().contains("stack.layers"));
    }
}
