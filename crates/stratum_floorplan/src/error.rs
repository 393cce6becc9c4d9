//! Errors that stop a floorplanning run before the search starts.

use stratum_config::ConfigError;

/// Malformed input. Infeasible candidates are costed, never reported here.
#[derive(Debug, thiserror::Error)]
pub enum FloorplanError {
    /// A block has a zero or negative width or height.
    #[error("block '{block}' has non-positive dimensions {width}x{height}")]
    NonPositiveDimension {
        /// Block name.
        block: String,
        /// Declared width.
        width: i64,
        /// Declared height.
        height: i64,
    },
    /// A block's aspect-ratio range is empty, negative, or not finite.
    #[error("block '{block}' has invalid aspect-ratio range [{min}, {max}]")]
    InvalidAspectRange {
        /// Block name.
        block: String,
        /// Declared minimum.
        min: f64,
        /// Declared maximum.
        max: f64,
    },
    /// A block has a negative or non-finite power density.
    #[error("block '{block}' has invalid power density {density}")]
    NegativePower {
        /// Block name.
        block: String,
        /// Declared density.
        density: f64,
    },
    /// A net or alignment requirement names a block index that does not exist.
    #[error("{owner} refers to unknown block #{index}")]
    DanglingBlock {
        /// The referring net or requirement.
        owner: String,
        /// The missing block index.
        index: u32,
    },
    /// An alignment requirement names a TSV island without members.
    #[error("{owner} refers to TSV island #{island} which has no member blocks")]
    DanglingIsland {
        /// The referring requirement.
        owner: String,
        /// The empty island.
        island: u32,
    },
    /// A block's die hint is past the top of the stack.
    #[error("block '{block}' is pinned to die {die} but the stack has {layers} dies")]
    DieHintOutOfRange {
        /// Block name.
        block: String,
        /// The hinted die.
        die: u32,
        /// Number of dies.
        layers: usize,
    },
    /// Pinned and unpinned blocks cannot populate every die while empty dies
    /// are disallowed.
    #[error(
        "{uncovered} of {layers} dies have no pinned block but only {unpinned} \
         unpinned blocks remain while empty dies are disallowed"
    )]
    EmptyDie {
        /// Dies without a pinned block.
        uncovered: usize,
        /// Number of dies.
        layers: usize,
        /// Blocks without a die hint.
        unpinned: usize,
    },
    /// The design has no blocks.
    #[error("design has no blocks")]
    EmptyDesign,
    /// Two blocks share a name.
    #[error("block name '{0}' is used more than once")]
    DuplicateName(String),
    /// An entity's arena ID does not match its position, so the design was
    /// not built through `Design::add_*` or reindexed after deserialization.
    #[error("{kind} #{position} carries ID {id}; call Design::reindex after deserializing")]
    StaleIndex {
        /// `"block"` or `"net"`.
        kind: &'static str,
        /// Position in the design's list.
        position: usize,
        /// The ID it carries.
        id: u32,
    },
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
