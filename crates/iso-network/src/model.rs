//! Core network declarations.

use std::fmt;

use iso_core::{ComponentId, ReactionId};

use crate::expr::Expr;

/// The tracer quantity every component carries one value of (e.g. `C` for δ13C).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isotope {
    pub name: String,
}

/// A named chemical pool.
///
/// Fixed pools are externally buffered: their size and δ only change between
/// scenarios. Variable pools are evolved by the ODE system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    pub variable: bool,
}

/// Which side of a reaction an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Source,
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Destination => write!(f, "destination"),
        }
    }
}

/// One end of a reaction.
///
/// `weight` is the share of the reaction's net flux moved through this
/// endpoint (weights on one side sum to 1); it may depend on parameters.
/// `isotope` overrides the δ of the carbon leaving (source) or arriving
/// (destination) through this endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub component: ComponentId,
    pub weight: Expr,
    pub isotope: Option<Expr>,
}

/// A validated reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub id: ReactionId,
    pub label: String,
    /// Net carbon flux (moles per time).
    pub flux: Expr,
    /// δ of the flux shared by all endpoints without their own expression.
    pub isotope: Option<Expr>,
    pub sources: Vec<Endpoint>,
    pub destinations: Vec<Endpoint>,
    /// Layout hint for diagram renderers; ignored by the engine.
    pub abscissa: Option<f64>,
}

impl Reaction {
    pub fn endpoints(&self, side: Side) -> &[Endpoint] {
        match side {
            Side::Source => &self.sources,
            Side::Destination => &self.destinations,
        }
    }

    /// True when the reaction touches `component` on either side.
    pub fn touches(&self, component: ComponentId) -> bool {
        self.sources
            .iter()
            .chain(&self.destinations)
            .any(|e| e.component == component)
    }
}
