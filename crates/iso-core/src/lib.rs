//! iso-core: shared foundation for isoflux.
//!
//! - `numeric`: the `Real` alias, tolerance comparison and slice helpers
//! - `ids`: compact indices for components and reactions
//! - `delta`: per-mil notation and fractionation-factor conversions

pub mod delta;
pub mod ids;
pub mod numeric;

pub use delta::*;
pub use ids::*;
pub use numeric::*;
