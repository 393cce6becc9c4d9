//! `stratum check`: validate a design and configuration without searching.

use stratum_diagnostics::DiagnosticSink;
use stratum_floorplan::validate;

use crate::pipeline::{load_design, load_effective_config, report};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Runs the `stratum check` command.
///
/// Returns exit code 0 if the input is valid, 1 otherwise.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_effective_config(global)?;
    let design = load_design(&args.design)?;

    let sink = DiagnosticSink::with_verbosity(global.verbosity);
    let valid = validate(&design, &config, &sink).is_ok();
    let (errors, warnings) = report(&sink.take_all(), args.format, global.color);

    if global.chatty() && args.format == ReportFormat::Text {
        eprintln!(
            "   Checked {} blocks, {} nets, {} alignment requirements",
            design.block_count(),
            design.nets.len(),
            design.alignments.len()
        );
        eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
    }
    Ok(if valid { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_diagnostics::Verbosity;

    fn check(design: &str) -> i32 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.json");
        std::fs::write(&path, design).unwrap();
        let config = dir.path().join("stratum.toml");
        std::fs::write(&config, "[stack]\nlayers = 2\n").unwrap();
        let global = GlobalArgs {
            verbosity: Verbosity::Quiet,
            color: false,
            config: Some(config),
        };
        let args = CheckArgs {
            design: path,
            format: ReportFormat::Json,
        };
        run(&args, &global).unwrap()
    }

    #[test]
    fn valid_design_passes() {
        let code = check(
            r#"{"blocks": [{"name": "a", "width": 2, "height": 2},
                           {"name": "b", "width": 1, "height": 3}]}"#,
        );
        assert_eq!(code, 0);
    }

    #[test]
    fn dangling_alignment_fails() {
        let code = check(
            r#"{"blocks": [{"name": "a", "width": 2, "height": 2}],
                "alignments": [{"first": {"block": 0}, "second": {"block": 4}}]}"#,
        );
        assert_eq!(code, 1);
    }
}
