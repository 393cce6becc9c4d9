//! Input validation before the search starts.
//!
//! Every problem is reported to the sink as an `E1xx` error; the first one is
//! also returned so callers can stop with `?`.

use crate::alignment::AlignmentTarget;
use crate::codes;
use crate::data::Design;
use crate::error::FloorplanError;
use crate::ids::{DieId, IslandId};
use std::collections::HashSet;
use stratum_config::{validate_config, FloorplanConfig};
use stratum_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};

fn code_of(err: &FloorplanError) -> DiagnosticCode {
    match err {
        FloorplanError::NonPositiveDimension { .. } => codes::E101,
        FloorplanError::InvalidAspectRange { .. } => codes::E102,
        FloorplanError::NegativePower { .. } => codes::E103,
        FloorplanError::DanglingBlock { .. } => codes::E104,
        FloorplanError::DanglingIsland { .. } => codes::E105,
        FloorplanError::DieHintOutOfRange { .. } => codes::E106,
        FloorplanError::EmptyDie { .. } => codes::E107,
        FloorplanError::EmptyDesign => codes::E108,
        FloorplanError::DuplicateName(_) => codes::E109,
        FloorplanError::InvalidConfig(_) => codes::E110,
        FloorplanError::StaleIndex { .. } => codes::E111,
    }
}

fn check_blocks(design: &Design, layers: usize, errors: &mut Vec<FloorplanError>) {
    let mut names = HashSet::new();
    for block in &design.blocks {
        if !names.insert(block.name.as_str()) {
            errors.push(FloorplanError::DuplicateName(block.name.clone()));
        }
        if block.width <= 0 || block.height <= 0 {
            errors.push(FloorplanError::NonPositiveDimension {
                block: block.name.clone(),
                width: block.width,
                height: block.height,
            });
        }
        if let Some(range) = block.aspect_ratio {
            let valid = range.min.is_finite()
                && range.max.is_finite()
                && range.min > 0.0
                && range.min <= range.max;
            if !valid {
                errors.push(FloorplanError::InvalidAspectRange {
                    block: block.name.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }
        if !(block.power_density >= 0.0 && block.power_density.is_finite()) {
            errors.push(FloorplanError::NegativePower {
                block: block.name.clone(),
                density: block.power_density,
            });
        }
        if let Some(die) = block.die {
            if die.index() >= layers {
                errors.push(FloorplanError::DieHintOutOfRange {
                    block: block.name.clone(),
                    die: die.as_raw(),
                    layers,
                });
            }
        }
    }
}

fn check_references(design: &Design, errors: &mut Vec<FloorplanError>) {
    let count = design.block_count();
    for net in &design.nets {
        for block in &net.blocks {
            if block.index() >= count {
                errors.push(FloorplanError::DanglingBlock {
                    owner: format!("net '{}'", net.name),
                    index: block.as_raw(),
                });
            }
        }
    }

    let populated: HashSet<IslandId> = design.blocks.iter().filter_map(|b| b.tsv_island).collect();
    for (i, req) in design.alignments.iter().enumerate() {
        let owner = format!("alignment requirement #{i}");
        for target in [req.first, req.second] {
            match target {
                AlignmentTarget::Block(b) if b.index() >= count => {
                    errors.push(FloorplanError::DanglingBlock {
                        owner: owner.clone(),
                        index: b.as_raw(),
                    });
                }
                AlignmentTarget::Island(id) if !populated.contains(&id) => {
                    errors.push(FloorplanError::DanglingIsland {
                        owner: owner.clone(),
                        island: id.as_raw(),
                    });
                }
                _ => {}
            }
        }
    }
}

fn check_indices(design: &Design, errors: &mut Vec<FloorplanError>) {
    let stale_block = design
        .blocks
        .iter()
        .enumerate()
        .find(|(i, b)| b.id.index() != *i)
        .map(|(i, b)| ("block", i, b.id.as_raw()));
    let stale_net = design
        .nets
        .iter()
        .enumerate()
        .find(|(i, n)| n.id.index() != *i)
        .map(|(i, n)| ("net", i, n.id.as_raw()));
    for (kind, position, id) in stale_block.into_iter().chain(stale_net) {
        errors.push(FloorplanError::StaleIndex { kind, position, id });
    }
}

/// Dies without a pinned block must each be able to take an unpinned one.
fn check_die_coverage(design: &Design, layers: usize, errors: &mut Vec<FloorplanError>) {
    let pinned: HashSet<usize> = design
        .blocks
        .iter()
        .filter_map(|b| b.die)
        .map(DieId::index)
        .filter(|&d| d < layers)
        .collect();
    let unpinned = design.blocks.iter().filter(|b| b.die.is_none()).count();
    let uncovered = layers - pinned.len();
    if unpinned < uncovered {
        errors.push(FloorplanError::EmptyDie {
            uncovered,
            layers,
            unpinned,
        });
    }
}

/// Validates `design` against `config`.
///
/// All problems are emitted to `sink`; the first is returned. Nets with fewer
/// than two pins only produce a warning.
pub fn validate(
    design: &Design,
    config: &FloorplanConfig,
    sink: &DiagnosticSink,
) -> Result<(), FloorplanError> {
    let mut errors = Vec::new();

    if let Err(e) = validate_config(config) {
        errors.push(FloorplanError::InvalidConfig(e));
    }
    let layers = config.stack.layers;

    if design.blocks.is_empty() {
        errors.push(FloorplanError::EmptyDesign);
    } else if !config.stack.allow_empty_dies {
        check_die_coverage(design, layers, &mut errors);
    }
    check_blocks(design, layers, &mut errors);
    check_references(design, &mut errors);
    check_indices(design, &mut errors);

    for net in &design.nets {
        if net.blocks.len() + net.terminals.len() < 2 {
            sink.emit(
                Diagnostic::warning(codes::W203, "net has fewer than two pins")
                    .with_subject(format!("net '{}'", net.name)),
            );
        }
    }

    for err in &errors {
        sink.emit(Diagnostic::error(code_of(err), err.to_string()));
    }
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
