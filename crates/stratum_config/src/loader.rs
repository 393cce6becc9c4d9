//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::FloorplanConfig;
use std::path::Path;

/// Loads and validates a `stratum.toml` configuration from the given file.
pub fn load_config(path: &Path) -> Result<FloorplanConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `stratum.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<FloorplanConfig, ConfigError> {
    let config: FloorplanConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Serializes a configuration as TOML, e.g. to write out the defaults.
pub fn to_toml_string(config: &FloorplanConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))
}

/// Validates that configuration values are in range and mutually consistent.
///
/// Configurations built in code should pass through this as well; the
/// floorplanner calls it before the search starts.
pub fn validate_config(config: &FloorplanConfig) -> Result<(), ConfigError> {
    let stack = &config.stack;
    if stack.layers == 0 {
        return invalid("stack.layers must be at least 1");
    }
    if stack.outline_width <= 0 || stack.outline_height <= 0 {
        return invalid("stack.outline_width and stack.outline_height must be positive");
    }
    for (name, value) in [
        ("stack.thickness_si", stack.thickness_si),
        ("stack.thickness_beol", stack.thickness_beol),
        ("stack.thickness_bond", stack.thickness_bond),
        ("stack.resistivity_si", stack.resistivity_si),
        ("stack.resistivity_beol", stack.resistivity_beol),
        ("stack.resistivity_bond", stack.resistivity_bond),
    ] {
        non_negative(name, value)?;
    }
    if stack.thickness_si * stack.resistivity_si + stack.thickness_beol * stack.resistivity_beol
        <= 0.0
    {
        return invalid("stack must have a positive per-die vertical thermal resistance");
    }

    let anneal = &config.annealing;
    positive("annealing.inner_loop_factor", anneal.inner_loop_factor)?;
    if anneal.max_levels == 0 {
        return invalid("annealing.max_levels must be at least 1");
    }
    positive("annealing.init_temp_factor", anneal.init_temp_factor)?;
    non_negative("annealing.min_temperature", anneal.min_temperature)?;
    for (name, value) in [
        ("annealing.cooling_fast", anneal.cooling_fast),
        ("annealing.cooling_normal", anneal.cooling_normal),
        ("annealing.cooling_slow", anneal.cooling_slow),
    ] {
        if !(value > 0.0 && value < 1.0) {
            return invalid(format!("{name} must be in (0, 1), got {value}"));
        }
    }
    for (name, value) in [
        ("annealing.high_acceptance", anneal.high_acceptance),
        ("annealing.low_acceptance", anneal.low_acceptance),
        ("annealing.freeze_acceptance", anneal.freeze_acceptance),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return invalid(format!("{name} must be in [0, 1], got {value}"));
        }
    }
    if anneal.low_acceptance > anneal.high_acceptance {
        return invalid("annealing.low_acceptance must not exceed annealing.high_acceptance");
    }
    if anneal.freeze_levels == 0 {
        return invalid("annealing.freeze_levels must be at least 1");
    }
    if !(anneal.reheat_factor >= 1.0) {
        return invalid("annealing.reheat_factor must be at least 1");
    }
    if anneal.reheat_window < 2 {
        return invalid("annealing.reheat_window must be at least 2");
    }
    non_negative("annealing.reheat_stddev_limit", anneal.reheat_stddev_limit)?;
    let operators = anneal.operators.as_array();
    for value in operators {
        non_negative("annealing.operators", value)?;
    }
    if operators.iter().sum::<f64>() <= 0.0 {
        return invalid("annealing.operators must contain at least one positive weight");
    }

    let weights = &config.weights;
    for (name, value) in [
        ("weights.area", weights.area),
        ("weights.wirelength", weights.wirelength),
        ("weights.tsv", weights.tsv),
        ("weights.thermal", weights.thermal),
        ("weights.alignment", weights.alignment),
        ("weights.congestion", weights.congestion),
        ("weights.voltage", weights.voltage),
    ] {
        non_negative(name, value)?;
    }

    let thermal = &config.thermal;
    if thermal.map_dim == 0 {
        return invalid("thermal.map_dim must be at least 1");
    }
    if thermal.mask_dim == 0 || thermal.mask_dim % 2 == 0 {
        return invalid(format!(
            "thermal.mask_dim must be odd and positive, got {}",
            thermal.mask_dim
        ));
    }
    positive("thermal.impulse_factor", thermal.impulse_factor)?;
    non_negative(
        "thermal.impulse_scaling_exponent",
        thermal.impulse_scaling_exponent,
    )?;
    if !(thermal.mask_boundary_value > 0.0 && thermal.mask_boundary_value < thermal.impulse_factor)
    {
        return invalid("thermal.mask_boundary_value must be in (0, thermal.impulse_factor)");
    }
    if !thermal.temp_offset.is_finite() || !thermal.hotspot_threshold.is_finite() {
        return invalid("thermal.temp_offset and thermal.hotspot_threshold must be finite");
    }

    if config.alignment.tolerance < 0 {
        return invalid("alignment.tolerance must not be negative");
    }

    if config.routing.map_dim == 0 {
        return invalid("routing.map_dim must be at least 1");
    }
    positive("routing.capacity", config.routing.capacity)?;

    Ok(())
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::ValidationError(message.into()))
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be finite and non-negative, got {value}"))
    }
}

fn positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be finite and positive, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, FloorplanConfig::default());
        assert_eq!(config.stack.layers, 2);
        assert_eq!(config.thermal.map_dim, 64);
        assert_eq!(config.thermal.mask_dim, 7);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[stack]
layers = 3
outline_width = 4000
outline_height = 3000
allow_empty_dies = false

[annealing]
seed = 42
max_levels = 50
cooling_normal = 0.9

[annealing.operators]
rotate = 0.0
alignment_guided = 2.0

[weights]
wirelength = 0.0
thermal = 0.0

[thermal]
map_dim = 32
mask_dim = 5
hotspot_threshold = 330.0

[alignment]
tolerance = 2

[routing]
map_dim = 16
capacity = 0.5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.stack.layers, 3);
        assert_eq!(config.stack.outline_width, 4000);
        assert!(!config.stack.allow_empty_dies);
        assert_eq!(config.annealing.seed, 42);
        assert_eq!(config.annealing.max_levels, 50);
        assert_eq!(config.annealing.cooling_normal, 0.9);
        // Unlisted fields keep their defaults.
        assert_eq!(config.annealing.cooling_fast, 0.8);
        assert_eq!(config.annealing.operators.rotate, 0.0);
        assert_eq!(config.annealing.operators.swap, 1.0);
        assert_eq!(config.weights.wirelength, 0.0);
        assert_eq!(config.weights.area, 1.0);
        assert_eq!(config.thermal.mask_dim, 5);
        assert_eq!(config.alignment.tolerance, 2);
        assert_eq!(config.routing.capacity, 0.5);
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn zero_layers_rejected() {
        let err = load_config_from_str("[stack]\nlayers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn even_mask_rejected() {
        let err = load_config_from_str("[thermal]\nmask_dim = 4\n").unwrap_err();
        match err {
            ConfigError::ValidationError(msg) => assert!(msg.contains("thermal.mask_dim")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn cooling_factor_out_of_range_rejected() {
        let err = load_config_from_str("[annealing]\ncooling_slow = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn negative_weight_rejected() {
        let err = load_config_from_str("[weights]\nthermal = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn all_zero_operator_weights_rejected() {
        let toml = r#"
[annealing.operators]
swap = 0.0
move_within = 0.0
flip_direction = 0.0
switch_junctions = 0.0
move_between_dies = 0.0
rotate = 0.0
shift_offset = 0.0
reshape = 0.0
alignment_guided = 0.0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn inverted_acceptance_thresholds_rejected() {
        let toml = "[annealing]\nlow_acceptance = 0.95\nhigh_acceptance = 0.5\n";
        assert!(load_config_from_str(toml).is_err());
    }

    #[test]
    fn defaults_roundtrip_through_toml() {
        let text = to_toml_string(&FloorplanConfig::default()).unwrap();
        let back = load_config_from_str(&text).unwrap();
        assert_eq!(back, FloorplanConfig::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stack]\nlayers = 4").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.stack.layers, 4);
    }

    #[test]
    fn io_error_from_missing_file() {
        let err = load_config(Path::new("/nonexistent/dir/stratum.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
