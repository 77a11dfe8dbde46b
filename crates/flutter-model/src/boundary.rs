//! Edge boundary-condition codes such as `SSSS`, `CCCC` or `CFFF`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Support condition on one panel edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeSupport {
    /// Out-of-plane translation fixed
    SimplySupported,
    /// All six degrees of freedom fixed
    Clamped,
    Free,
}

impl EdgeSupport {
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'S' => Some(EdgeSupport::SimplySupported),
            'C' => Some(EdgeSupport::Clamped),
            'F' => Some(EdgeSupport::Free),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            EdgeSupport::SimplySupported => 'S',
            EdgeSupport::Clamped => 'C',
            EdgeSupport::Free => 'F',
        }
    }

    /// Constrained DOF string in bulk-data component notation.
    pub fn dofs(&self) -> &'static str {
        match self {
            EdgeSupport::SimplySupported => "3",
            EdgeSupport::Clamped => "123456",
            EdgeSupport::Free => "",
        }
    }

    pub fn is_constrained(&self) -> bool {
        !matches!(self, EdgeSupport::Free)
    }
}

/// Panel edges in code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// y = 0
    Bottom,
    /// x = a
    Right,
    /// y = b
    Top,
    /// x = 0
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Bottom, Edge::Right, Edge::Top, Edge::Left];
}

/// Four edge supports in bottom-right-top-left order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundaryEdgeCode {
    edges: [EdgeSupport; 4],
}

impl BoundaryEdgeCode {
    pub fn new(edges: [EdgeSupport; 4]) -> Self {
        Self { edges }
    }

    pub fn simply_supported() -> Self {
        Self::new([EdgeSupport::SimplySupported; 4])
    }

    pub fn clamped() -> Self {
        Self::new([EdgeSupport::Clamped; 4])
    }

    pub fn support(&self, edge: Edge) -> EdgeSupport {
        match edge {
            Edge::Bottom => self.edges[0],
            Edge::Right => self.edges[1],
            Edge::Top => self.edges[2],
            Edge::Left => self.edges[3],
        }
    }

    pub fn edges(&self) -> [EdgeSupport; 4] {
        self.edges
    }

    pub fn constrained_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_constrained()).count()
    }

    pub fn is_all(&self, support: EdgeSupport) -> bool {
        self.edges.iter().all(|e| *e == support)
    }
}

impl Default for BoundaryEdgeCode {
    fn default() -> Self {
        Self::simply_supported()
    }
}

impl FromStr for BoundaryEdgeCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let letters: Vec<char> = trimmed.chars().collect();
        if letters.len() != 4 {
            return Err(ValidationError::BoundaryCode(s.to_string()));
        }
        let mut edges = [EdgeSupport::Free; 4];
        for (slot, c) in edges.iter_mut().zip(letters) {
            *slot = EdgeSupport::from_letter(c)
                .ok_or_else(|| ValidationError::BoundaryCode(s.to_string()))?;
        }
        Ok(Self { edges })
    }
}

impl TryFrom<String> for BoundaryEdgeCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BoundaryEdgeCode> for String {
    fn from(code: BoundaryEdgeCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for BoundaryEdgeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for edge in &self.edges {
            write!(f, "{}", edge.letter())?;
        }
        Ok(())
    }
}

/// Union of two DOF strings, digits sorted ascending (`"3"` ∪ `"12"` = `"123"`).
pub fn merge_dofs(a: &str, b: &str) -> String {
    let mut digits: Vec<char> = a.chars().chain(b.chars()).filter(|c| c.is_ascii_digit()).collect();
    digits.sort_unstable();
    digits.dedup();
    digits.into_iter().collect()
}
