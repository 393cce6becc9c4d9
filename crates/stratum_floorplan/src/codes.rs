//! Diagnostic codes emitted by the floorplanner.
//!
//! Error codes `E101`--`E111` cover malformed input found by validation.
//! Warning codes `W201`--`W203` cover runs that continue in a degraded state.
//! Progress codes `P301`--`P305` report the search as it runs. Thermal code
//! `T401` reports hotspots of the final floorplan.

use stratum_diagnostics::{Category, DiagnosticCode};

const fn error(number: u16) -> DiagnosticCode {
    DiagnosticCode {
        category: Category::Error,
        number,
    }
}

const fn warning(number: u16) -> DiagnosticCode {
    DiagnosticCode {
        category: Category::Warning,
        number,
    }
}

const fn thermal(number: u16) -> DiagnosticCode {
    DiagnosticCode {
        category: Category::Thermal,
        number,
    }
}

const fn progress(number: u16) -> DiagnosticCode {
    DiagnosticCode {
        category: Category::Progress,
        number,
    }
}

/// Block with non-positive width or height.
pub const E101: DiagnosticCode = error(101);
/// Invalid aspect-ratio range.
pub const E102: DiagnosticCode = error(102);
/// Negative or non-finite power density.
pub const E103: DiagnosticCode = error(103);
/// Net or requirement refers to a missing block.
pub const E104: DiagnosticCode = error(104);
/// Requirement refers to an island without members.
pub const E105: DiagnosticCode = error(105);
/// Die hint past the top of the stack.
pub const E106: DiagnosticCode = error(106);
/// Too few blocks to populate every die.
pub const E107: DiagnosticCode = error(107);
/// Design without blocks.
pub const E108: DiagnosticCode = error(108);
/// Duplicate block name.
pub const E109: DiagnosticCode = error(109);
/// Invalid configuration.
pub const E110: DiagnosticCode = error(110);
/// Arena IDs out of step with positions.
pub const E111: DiagnosticCode = error(111);

/// No strict-feasible starting layout was found.
pub const W201: DiagnosticCode = warning(201);
/// The search ended without any strict-feasible candidate.
pub const W202: DiagnosticCode = warning(202);
/// Net with fewer than two pins; it contributes nothing.
pub const W203: DiagnosticCode = warning(203);

/// Initial temperature and normalization chosen.
pub const P301: DiagnosticCode = progress(301);
/// Temperature level finished.
pub const P302: DiagnosticCode = progress(302);
/// Temperature raised after stagnation.
pub const P303: DiagnosticCode = progress(303);
/// Search frozen.
pub const P304: DiagnosticCode = progress(304);
/// New best solution.
pub const P305: DiagnosticCode = progress(305);

/// Hotspot region in the final floorplan.
pub const T401: DiagnosticCode = thermal(401);
