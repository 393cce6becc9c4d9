//! `stratum config`: print the effective configuration.

use stratum_config::{to_toml_string, FloorplanConfig};

use crate::pipeline::load_effective_config;
use crate::{ConfigArgs, GlobalArgs};

/// Runs the `stratum config` command.
pub fn run(args: &ConfigArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    print!("{}", render(args, global)?);
    Ok(0)
}

fn render(args: &ConfigArgs, global: &GlobalArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = if args.defaults {
        FloorplanConfig::default()
    } else {
        load_effective_config(global)?
    };
    Ok(to_toml_string(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_diagnostics::Verbosity;

    #[test]
    fn effective_config_merges_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[annealing]\nseed = 11\n").unwrap();
        let global = GlobalArgs {
            verbosity: Verbosity::Normal,
            color: false,
            config: Some(path),
        };

        let text = render(&ConfigArgs { defaults: false }, &global).unwrap();
        let parsed = stratum_config::load_config_from_str(&text).unwrap();
        assert_eq!(parsed.annealing.seed, 11);
        assert_eq!(parsed.stack, FloorplanConfig::default().stack);

        let defaults = render(&ConfigArgs { defaults: true }, &global).unwrap();
        assert_eq!(
            stratum_config::load_config_from_str(&defaults).unwrap(),
            FloorplanConfig::default()
        );
    }
}
