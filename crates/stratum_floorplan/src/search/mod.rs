//! The simulated-annealing search and its cost model.
//!
//! # Modules
//!
//! - [`cost`]: multi-objective cost vector and normalization
//! - [`schedule`]: Metropolis acceptance, cooling, and reheating
//! - [`anneal`]: the INIT / EXPLORE / COOL / FREEZE state machine
//! - [`result`]: the immutable run outcome

pub mod anneal;
pub mod cost;
pub mod result;
pub mod schedule;

pub use anneal::{AnnealObserver, Annealer, NoObserver, Termination};
pub use cost::{CostModel, CostVector, Normalization, REJECTING_COST};
pub use result::{BlockPlacement, FloorplanResult};
pub use schedule::{acceptance_probability, steps_per_level, CoolingSchedule, ScheduleStep};
