//! Panel geometry and mesh density descriptions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError, ensure_positive};

/// Rectangular panel dimensions in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelGeometry {
    /// Streamwise length `a` [m]
    pub length: f64,
    /// Spanwise width `b` [m]
    pub width: f64,
    /// Thickness `h` [m]
    pub thickness: f64,
}

impl PanelGeometry {
    pub fn new(length: f64, width: f64, thickness: f64) -> Self {
        Self {
            length,
            width,
            thickness,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("panel length", self.length)?;
        ensure_positive("panel width", self.width)?;
        ensure_positive("panel thickness", self.thickness)
    }

    /// a/b
    pub fn aspect_ratio(&self) -> f64 {
        self.length / self.width
    }

    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    /// h / min(a, b)
    pub fn thickness_ratio(&self) -> f64 {
        self.thickness / self.length.min(self.width)
    }
}

/// Shell element family used for the structural mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    /// 4-node quadrilateral (CQUAD4)
    #[default]
    Quad4,
    /// 8-node quadrilateral (CQUAD8)
    Quad8,
    /// 3-node triangle (CTRIA3)
    Tria3,
    /// 6-node triangle (CTRIA6)
    Tria6,
}

impl ElementKind {
    /// Number of nodes an element of this kind references
    pub fn node_count(&self) -> usize {
        match self {
            ElementKind::Quad4 => 4,
            ElementKind::Quad8 => 8,
            ElementKind::Tria3 => 3,
            ElementKind::Tria6 => 6,
        }
    }

    /// Bulk-data card keyword
    pub fn card_name(&self) -> &'static str {
        match self {
            ElementKind::Quad4 => "CQUAD4",
            ElementKind::Quad8 => "CQUAD8",
            ElementKind::Tria3 => "CTRIA3",
            ElementKind::Tria6 => "CTRIA6",
        }
    }

    /// Quadratic kinds carry mid-side nodes on a refined grid.
    pub fn is_quadratic(&self) -> bool {
        matches!(self, ElementKind::Quad8 | ElementKind::Tria6)
    }

    pub fn is_triangle(&self) -> bool {
        matches!(self, ElementKind::Tria3 | ElementKind::Tria6)
    }

    pub fn from_card_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "CQUAD4" | "QUAD4" => Some(ElementKind::Quad4),
            "CQUAD8" | "QUAD8" => Some(ElementKind::Quad8),
            "CTRIA3" | "TRIA3" => Some(ElementKind::Tria3),
            "CTRIA6" | "TRIA6" => Some(ElementKind::Tria6),
            _ => None,
        }
    }
}

/// Number of elements along each panel edge plus the element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshParameters {
    /// Elements along the length (x)
    pub nx: usize,
    /// Elements along the width (y)
    pub ny: usize,
    #[serde(default)]
    pub element_kind: ElementKind,
}

impl MeshParameters {
    pub fn new(nx: usize, ny: usize, element_kind: ElementKind) -> Self {
        Self {
            nx,
            ny,
            element_kind,
        }
    }

    pub fn quad4(nx: usize, ny: usize) -> Self {
        Self::new(nx, ny, ElementKind::Quad4)
    }

    pub fn validate(&self) -> Result<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(ValidationError::EmptyMesh {
                nx: self.nx,
                ny: self.ny,
            });
        }
        Ok(())
    }

    /// `None` when the count overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        let cells = self.nx.checked_mul(self.ny)?;
        if self.element_kind.is_triangle() {
            cells.checked_mul(2)
        } else {
            Some(cells)
        }
    }

    /// `None` when the count overflows `usize`.
    pub fn node_count(&self) -> Option<usize> {
        let (nx, ny) = (self.nx, self.ny);
        let lattice = |step: usize| -> Option<usize> {
            let cols = nx.checked_mul(step)?.checked_add(1)?;
            let rows = ny.checked_mul(step)?.checked_add(1)?;
            cols.checked_mul(rows)
        };
        match self.element_kind {
            ElementKind::Quad4 | ElementKind::Tria3 => lattice(1),
            ElementKind::Tria6 => lattice(2),
            // serendipity elements have no cell-centre node
            ElementKind::Quad8 => lattice(2)?.checked_sub(nx.checked_mul(ny)?),
        }
    }

    /// Element size (dx, dy) for the given panel.
    pub fn element_size(&self, geometry: &PanelGeometry) -> (f64, f64) {
        (
            geometry.length / self.nx as f64,
            geometry.width / self.ny as f64,
        )
    }

    /// max(dx,dy)/min(dx,dy)
    pub fn element_aspect_ratio(&self, geometry: &PanelGeometry) -> f64 {
        let (dx, dy) = self.element_size(geometry);
        dx.max(dy) / dx.min(dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_geometry_quantities() {
        let g = PanelGeometry::new(0.5, 0.25, 0.002);
        assert!((g.aspect_ratio() - 2.0).abs() < 1e-12);
        assert!((g.area() - 0.125).abs() < 1e-12);
        assert!((g.thickness_ratio() - 0.008).abs() < 1e-12);
    }

    #[test]
    fn geometry_rejects_non_positive_dimensions() {
        assert!(PanelGeometry::new(0.3, 0.3, 0.0015).validate().is_ok());
        assert!(PanelGeometry::new(0.0, 0.3, 0.0015).validate().is_err());
        assert!(PanelGeometry::new(0.3, -0.3, 0.0015).validate().is_err());
        assert!(PanelGeometry::new(0.3, 0.3, 0.0).validate().is_err());
    }

    #[test]
    fn counts_depend_on_element_kind() {
        let quad4 = MeshParameters::new(4, 3, ElementKind::Quad4);
        assert_eq!(quad4.node_count(), Some(20));
        assert_eq!(quad4.element_count(), Some(12));

        let tria3 = MeshParameters::new(4, 3, ElementKind::Tria3);
        assert_eq!(tria3.node_count(), Some(20));
        assert_eq!(tria3.element_count(), Some(24));

        let tria6 = MeshParameters::new(4, 3, ElementKind::Tria6);
        assert_eq!(tria6.node_count(), Some(9 * 7));

        let quad8 = MeshParameters::new(4, 3, ElementKind::Quad8);
        assert_eq!(quad8.node_count(), Some(9 * 7 - 12));
        assert_eq!(quad8.element_count(), Some(12));
    }

    #[test]
    fn counts_report_overflow_instead_of_wrapping() {
        let huge = MeshParameters::new(usize::MAX / 2, usize::MAX / 2, ElementKind::Quad4);
        assert_eq!(huge.node_count(), None);
        assert_eq!(huge.element_count(), None);

        let edge = MeshParameters::new(usize::MAX, 1, ElementKind::Tria3);
        assert_eq!(edge.node_count(), None);
        assert_eq!(edge.element_count(), None);
        assert_eq!(MeshParameters::new(usize::MAX, 1, ElementKind::Quad8).node_count(), None);
    }

    #[test]
    fn zero_density_is_rejected() {
        assert!(MeshParameters::quad4(0, 4).validate().is_err());
        assert!(MeshParameters::quad4(4, 0).validate().is_err());
        assert!(MeshParameters::quad4(1, 1).validate().is_ok());
    }

    #[test]
    fn element_kind_card_names() {
        assert_eq!(ElementKind::Quad4.card_name(), "CQUAD4");
        assert_eq!(ElementKind::from_card_name("ctria6"), Some(ElementKind::Tria6));
        assert_eq!(ElementKind::from_card_name("CHEXA"), None);
        assert_eq!(ElementKind::Quad8.node_count(), 8);
    }

    #[test]
    fn element_aspect_ratio_uses_longer_side() {
        let g = PanelGeometry::new(1.0, 0.5, 0.002);
        let mesh = MeshParameters::quad4(2, 4);
        // dx = 0.5, dy = 0.125
        assert!((mesh.element_aspect_ratio(&g) - 4.0).abs() < 1e-12);
    }
}
