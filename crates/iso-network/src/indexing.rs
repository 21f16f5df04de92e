//! Stable indexing for solver integration.
//!
//! Maps variable components onto a contiguous state vector laid out as
//! `[M_0, δ_0, M_1, δ_1, …]`.

use iso_core::ComponentId;

use crate::network::Network;

/// Index map between variable components and solver state slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    /// Variable component IDs in declaration order (position -> ComponentId).
    variables: Vec<ComponentId>,
    /// Reverse lookup: component slot -> position, None for fixed components.
    positions: Vec<Option<usize>>,
}

impl StateLayout {
    pub fn from_network(network: &Network) -> Self {
        let variables: Vec<ComponentId> = network.variable_components().map(|c| c.id).collect();
        let mut positions = vec![None; network.components().len()];
        for (i, id) in variables.iter().enumerate() {
            positions[id.slot()] = Some(i);
        }
        Self {
            variables,
            positions,
        }
    }

    /// Length of the state vector.
    pub fn len(&self) -> usize {
        2 * self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn mass_slot(&self, id: ComponentId) -> Option<usize> {
        self.position(id).map(|p| 2 * p)
    }

    pub fn delta_slot(&self, id: ComponentId) -> Option<usize> {
        self.position(id).map(|p| 2 * p + 1)
    }

    /// Component owning a state slot.
    pub fn component(&self, slot: usize) -> Option<ComponentId> {
        self.variables.get(slot / 2).copied()
    }

    /// Mass slots hold pool sizes, which solvers keep positive.
    pub fn is_mass_slot(slot: usize) -> bool {
        slot % 2 == 0
    }

    pub fn variables(&self) -> &[ComponentId] {
        &self.variables
    }

    /// Gather variable components from per-component arrays into a state vector.
    pub fn pack(&self, mass: &[f64], delta: &[f64]) -> Vec<f64> {
        self.variables
            .iter()
            .flat_map(|id| [mass[id.slot()], delta[id.slot()]])
            .collect()
    }

    /// Scatter a state vector back into per-component arrays; fixed entries are left untouched.
    pub fn unpack(&self, state: &[f64], mass: &mut [f64], delta: &mut [f64]) {
        for (i, id) in self.variables.iter().enumerate() {
            mass[id.slot()] = state[2 * i];
            delta[id.slot()] = state[2 * i + 1];
        }
    }

    fn position(&self, id: ComponentId) -> Option<usize> {
        self.positions.get(id.slot()).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{NetworkBuilder, ReactionDef};
    use crate::expr::Expr;

    fn layout() -> StateLayout {
        let mut b = NetworkBuilder::new();
        b.add_isotope("C");
        b.add_fixed("MeOH");
        b.add_variable("CH3X");
        b.add_variable("CH4");
        b.add_fixed("CH4_out");
        b.add_reaction(ReactionDef::new("uptake", Expr::sym("net")).from("MeOH").to("CH3X"));
        b.add_reaction(ReactionDef::new("meth", Expr::sym("net")).from("CH3X").to("CH4"));
        b.add_reaction(ReactionDef::new("export", Expr::sym("net")).from("CH4").to("CH4_out"));
        StateLayout::from_network(&b.compile().unwrap())
    }

    #[test]
    fn slots_interleave_mass_and_delta() {
        let l = layout();
        assert_eq!(l.len(), 4);
        assert_eq!(l.variable_count(), 2);
        assert_eq!(l.mass_slot(ComponentId::from_index(1)), Some(0));
        assert_eq!(l.delta_slot(ComponentId::from_index(2)), Some(3));
        assert_eq!(l.mass_slot(ComponentId::from_index(0)), None);
        assert_eq!(l.component(3), Some(ComponentId::from_index(2)));
        assert!(StateLayout::is_mass_slot(2));
        assert!(!StateLayout::is_mass_slot(3));
    }

    #[test]
    fn pack_unpack() {
        let l = layout();
        let mass = [1.0, 2.0, 3.0, 4.0];
        let delta = [-1.0, -2.0, -3.0, -4.0];
        let state = l.pack(&mass, &delta);
        assert_eq!(state, vec![2.0, -2.0, 3.0, -3.0]);

        let mut m = [9.0; 4];
        let mut d = [9.0; 4];
        l.unpack(&[5.0, -5.0, 6.0, -6.0], &mut m, &mut d);
        assert_eq!(m, [9.0, 5.0, 6.0, 9.0]);
        assert_eq!(d, [9.0, -5.0, -6.0, 9.0]);
    }
}
