//! Board description
//!
//! Everything here is rebuilt whenever the row count changes and is read-only
//! while balls are in flight:
//! - `geometry`: reference peg placement (the geometry collaborator)
//! - `lattice`: path nodes, start lanes and bins derived from peg coordinates
//! - `values`: payout multiplier per bin

pub mod geometry;
pub mod lattice;
pub mod values;

pub use geometry::{PegLayout, PegSource};
pub use lattice::{Bin, BinId, Lane, Lattice, LatticeNode, StartLane};
pub use values::{BinValueTable, fallback_multiplier};
