//! iso-network: symbolic reaction-network layer for isoflux.
//!
//! Provides:
//! - A tagged expression tree with a small formula parser
//! - Isotope, component and reaction declarations
//! - Incremental network builder with validation
//! - The network compiler producing mass and isotope balance equations
//! - Stable state layout for solver integration
//!
//! # Example
//!
//! ```
//! use iso_network::{Expr, NetworkBuilder, ReactionDef};
//!
//! let mut builder = NetworkBuilder::new();
//! builder.add_isotope("C");
//! builder.add_fixed("MeOH");
//! builder.add_variable("CH4");
//! builder.add_fixed("CH4_out");
//! builder.add_reaction(
//!     ReactionDef::new("methanogenesis", Expr::sym("net"))
//!         .from("MeOH")
//!         .to("CH4")
//!         .isotope("MeOH.C + eps".parse::<Expr>().unwrap()),
//! );
//! builder.add_reaction(ReactionDef::new("export", Expr::sym("net")).from("CH4").to("CH4_out"));
//! let network = builder.compile().unwrap();
//!
//! assert_eq!(network.components().len(), 3);
//! assert_eq!(network.parameters(), ["eps", "net"]);
//! assert_eq!(network.ode().equations().len(), 1);
//! ```

pub mod builder;
pub mod compile;
pub mod error;
pub mod expr;
pub mod indexing;
pub mod model;
pub mod network;
pub mod parse;
pub mod resolve;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{EndpointDef, NetworkBuilder, ReactionDef};
pub use compile::{
    BalanceEquation, CompiledEndpoint, CompiledReaction, EndpointFlow, OdeSystem, Rates,
    ReactionEvaluation,
};
pub use error::{ConfigurationError, NetworkResult};
pub use expr::{BinOp, Expr, Func};
pub use indexing::StateLayout;
pub use model::{Component, Endpoint, Isotope, Reaction, Side};
pub use network::Network;
pub use resolve::{EvalContext, Resolved, SymbolRef};
pub use validate::check_weights;
