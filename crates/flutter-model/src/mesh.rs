//! Structural mesh of a rectangular panel: nodes, shell elements and
//! single-point constraint sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::geometry::ElementKind;

/// A grid point (SI coordinates, z = 0 for a flat panel)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// 1-based node id
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Node {
    pub fn new(id: u32, x: f64, y: f64, z: f64) -> Self {
        Self { id, x, y, z }
    }

    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: u32,
    pub property_id: u32,
    pub kind: ElementKind,
    /// Corner nodes first (counter-clockwise), then mid-side nodes
    pub nodes: Vec<u32>,
}

impl Element {
    pub fn new(id: u32, property_id: u32, kind: ElementKind, nodes: Vec<u32>) -> Self {
        Self {
            id,
            property_id,
            kind,
            nodes,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let expected = self.kind.node_count();
        if self.nodes.len() != expected {
            return Err(format!(
                "Element {} of kind {:?} has {} nodes but expected {}",
                self.id,
                self.kind,
                self.nodes.len(),
                expected
            ));
        }
        Ok(())
    }
}

/// Nodes sharing one constrained-DOF string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryConstraint {
    /// Component string, e.g. "3" or "123456"
    pub dofs: String,
    /// Node ids, ascending
    pub nodes: Vec<u32>,
}

/// Generated mesh plus its constraint sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelMesh {
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
    pub constraints: Vec<BoundaryConstraint>,
    /// Elements along x and y used to generate the grid
    pub nx: usize,
    pub ny: usize,
}

impl PanelMesh {
    pub fn node(&self, id: u32) -> Option<&Node> {
        // ids are contiguous from 1
        self.nodes
            .get(id.checked_sub(1)? as usize)
            .filter(|n| n.id == id)
            .or_else(|| self.nodes.iter().find(|n| n.id == id))
    }

    pub fn node_ids(&self) -> Vec<u32> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// DOF string constraining `node`, if any.
    pub fn constrained_dofs(&self, node: u32) -> Option<&str> {
        self.constraints
            .iter()
            .find(|c| c.nodes.binary_search(&node).is_ok())
            .map(|c| c.dofs.as_str())
    }

    pub fn constrained_node_count(&self) -> usize {
        self.constraints.iter().map(|c| c.nodes.len()).sum()
    }

    /// Checks element node counts and that every referenced node exists.
    pub fn validate(&self) -> Result<(), String> {
        let ids: BTreeSet<u32> = self.nodes.iter().map(|n| n.id).collect();
        for element in &self.elements {
            element.validate()?;
            for node in &element.nodes {
                if !ids.contains(node) {
                    return Err(format!(
                        "Element {} references non-existent node {}",
                        element.id, node
                    ));
                }
            }
        }
        for constraint in &self.constraints {
            for node in &constraint.nodes {
                if !ids.contains(node) {
                    return Err(format!(
                        "Constraint set {} references non-existent node {}",
                        constraint.dofs, node
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn statistics(&self) -> MeshStatistics {
        MeshStatistics {
            num_nodes: self.nodes.len(),
            num_elements: self.elements.len(),
            num_constraint_sets: self.constraints.len(),
            num_constrained_nodes: self.constrained_node_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshStatistics {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub num_constraint_sets: usize,
    pub num_constrained_nodes: usize,
}

impl MeshStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        format!(
            "Nodes: {}\nElements: {}\nConstraint sets: {} ({} nodes)",
            self.num_nodes, self.num_elements, self.num_constraint_sets, self.num_constrained_nodes
        )
    }
}
