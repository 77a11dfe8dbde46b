//! Structured mesh and edge constraints for a rectangular panel.
//!
//! Nodes are laid out row-major over `[0,a]×[0,b]` starting at id 1 in the
//! lower-left corner. Quadratic elements use a refined lattice with twice the
//! density; serendipity (Quad8) lattices skip the cell-centre points.
//! All checks run before anything is generated.

use std::collections::BTreeMap;

use flutter_model::{
    BoundaryConstraint, BoundaryEdgeCode, Diagnostics, Edge, Element, ElementKind,
    MeshParameters, Node, PanelGeometry, PanelMesh, ValidationError, merge_dofs,
};

const SOURCE: &str = "mesh";

/// Thinnest panel accepted [m]
pub const MIN_THICKNESS: f64 = 1.0e-5;
/// h/min(a,b) above which the panel is not a plate
pub const MAX_THICKNESS_RATIO: f64 = 0.5;
/// h/min(a,b) above which thin-plate theory is questionable
pub const THIN_PLATE_RATIO: f64 = 0.1;
pub const MAX_ELEMENT_ASPECT: f64 = 20.0;
pub const WARN_ELEMENT_ASPECT: f64 = 5.0;
/// Largest id an 8-column integer field can hold
pub const MAX_ID: usize = 99_999_999;

/// DOFs given to node 1 when the panel would otherwise float in-plane
const ANCHOR_DOFS: &str = "12";
/// DOFs given to the bottom-right corner node for the same reason
const ANCHOR_CORNER_DOFS: &str = "2";

/// Node lattice of one mesh: linear kinds use the cell corners only,
/// quadratic kinds a half-spaced lattice.
#[derive(Debug, Clone, Copy)]
struct Lattice {
    kind: ElementKind,
    nx: usize,
    ny: usize,
}

impl Lattice {
    fn step(&self) -> usize {
        if self.kind.is_quadratic() { 2 } else { 1 }
    }

    fn cols(&self) -> usize {
        self.step() * self.nx + 1
    }

    fn rows(&self) -> usize {
        self.step() * self.ny + 1
    }

    fn has_node(&self, i: usize, j: usize) -> bool {
        !(self.kind == ElementKind::Quad8 && i % 2 == 1 && j % 2 == 1)
    }

    fn id(&self, i: usize, j: usize) -> u32 {
        let index = if self.kind == ElementKind::Quad8 {
            // even rows are full, odd rows hold only the even columns
            let full = self.cols();
            let sparse = self.nx + 1;
            let before = j.div_ceil(2) * full + (j / 2) * sparse;
            before + if j % 2 == 0 { i } else { i / 2 }
        } else {
            j * self.cols() + i
        };
        // counts are checked against MAX_ID before generation
        (index + 1) as u32
    }
}

pub struct MeshBuilder {
    geometry: PanelGeometry,
    lattice: Lattice,
    boundary: BoundaryEdgeCode,
}

impl MeshBuilder {
    /// Validates the inputs and generates nodes, elements and constraint sets.
    pub fn build(
        geometry: &PanelGeometry,
        params: &MeshParameters,
        boundary: &BoundaryEdgeCode,
        diagnostics: &mut Diagnostics,
    ) -> Result<PanelMesh, ValidationError> {
        validate(geometry, params, diagnostics)?;
        let builder = Self {
            geometry: *geometry,
            lattice: Lattice {
                kind: params.element_kind,
                nx: params.nx,
                ny: params.ny,
            },
            boundary: *boundary,
        };

        let mesh = PanelMesh {
            nodes: builder.nodes(),
            elements: builder.elements(),
            constraints: builder.constraints(diagnostics),
            nx: params.nx,
            ny: params.ny,
        };
        let stats = mesh.statistics();
        diagnostics.info(
            SOURCE,
            format!(
                "generated {} {} elements on {} nodes, {} constraint sets",
                stats.num_elements,
                params.element_kind.card_name(),
                stats.num_nodes,
                stats.num_constraint_sets
            ),
        );
        Ok(mesh)
    }

    fn nodes(&self) -> Vec<Node> {
        let (cols, rows) = (self.lattice.cols(), self.lattice.rows());
        let mut nodes = Vec::with_capacity(cols * rows);
        for j in 0..rows {
            let y = self.geometry.width * j as f64 / (rows - 1) as f64;
            for i in 0..cols {
                if !self.lattice.has_node(i, j) {
                    continue;
                }
                let x = self.geometry.length * i as f64 / (cols - 1) as f64;
                nodes.push(Node::new(self.lattice.id(i, j), x, y, 0.0));
            }
        }
        nodes
    }

    fn elements(&self) -> Vec<Element> {
        let l = &self.lattice;
        let s = l.step();
        let mut elements = Vec::new();
        let mut next_id = 1u32;
        let mut push = |nodes: Vec<u32>| {
            elements.push(Element::new(next_id, 1, l.kind, nodes));
            next_id += 1;
        };

        for j in 0..l.ny {
            for i in 0..l.nx {
                let (i0, j0) = (s * i, s * j);
                let n1 = l.id(i0, j0);
                let n2 = l.id(i0 + s, j0);
                let n3 = l.id(i0 + s, j0 + s);
                let n4 = l.id(i0, j0 + s);
                match l.kind {
                    ElementKind::Quad4 => push(vec![n1, n2, n3, n4]),
                    ElementKind::Tria3 => {
                        push(vec![n1, n2, n3]);
                        push(vec![n1, n3, n4]);
                    }
                    ElementKind::Quad8 => {
                        let m12 = l.id(i0 + 1, j0);
                        let m23 = l.id(i0 + 2, j0 + 1);
                        let m34 = l.id(i0 + 1, j0 + 2);
                        let m41 = l.id(i0, j0 + 1);
                        push(vec![n1, n2, n3, n4, m12, m23, m34, m41]);
                    }
                    ElementKind::Tria6 => {
                        let m12 = l.id(i0 + 1, j0);
                        let m23 = l.id(i0 + 2, j0 + 1);
                        let m34 = l.id(i0 + 1, j0 + 2);
                        let m41 = l.id(i0, j0 + 1);
                        let centre = l.id(i0 + 1, j0 + 1);
                        push(vec![n1, n2, n3, m12, m23, centre]);
                        push(vec![n1, n3, n4, centre, m34, m41]);
                    }
                }
            }
        }
        elements
    }

    fn edge_nodes(&self, edge: Edge) -> Vec<u32> {
        let l = &self.lattice;
        let (cols, rows) = (l.cols(), l.rows());
        match edge {
            Edge::Bottom => (0..cols).map(|i| l.id(i, 0)).collect(),
            Edge::Top => (0..cols).map(|i| l.id(i, rows - 1)).collect(),
            Edge::Left => (0..rows)
                .filter(|&j| l.has_node(0, j))
                .map(|j| l.id(0, j))
                .collect(),
            Edge::Right => (0..rows)
                .filter(|&j| l.has_node(cols - 1, j))
                .map(|j| l.id(cols - 1, j))
                .collect(),
        }
    }

    /// One constraint set per distinct DOF string, sorted by DOF string.
    fn constraints(&self, diagnostics: &mut Diagnostics) -> Vec<BoundaryConstraint> {
        let mut node_dofs: BTreeMap<u32, String> = BTreeMap::new();
        for edge in Edge::ALL {
            let support = self.boundary.support(edge);
            if !support.is_constrained() {
                continue;
            }
            for node in self.edge_nodes(edge) {
                let entry = node_dofs.entry(node).or_default();
                *entry = merge_dofs(entry, support.dofs());
            }
        }

        if self.boundary.constrained_edge_count() < 2 {
            let corner = self.lattice.id(self.lattice.cols() - 1, 0);
            for (node, dofs) in [(1, ANCHOR_DOFS), (corner, ANCHOR_CORNER_DOFS)] {
                let entry = node_dofs.entry(node).or_default();
                *entry = merge_dofs(entry, dofs);
            }
            diagnostics.info(
                SOURCE,
                format!(
                    "boundary code {} constrains fewer than two edges; anchoring node 1 ({ANCHOR_DOFS}) and node {corner} ({ANCHOR_CORNER_DOFS})",
                    self.boundary
                ),
            );
        }

        let mut groups: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for (node, dofs) in node_dofs {
            if !dofs.is_empty() {
                groups.entry(dofs).or_default().push(node);
            }
        }
        groups
            .into_iter()
            .map(|(dofs, nodes)| BoundaryConstraint { dofs, nodes })
            .collect()
    }
}

fn validate(
    geometry: &PanelGeometry,
    params: &MeshParameters,
    diagnostics: &mut Diagnostics,
) -> Result<(), ValidationError> {
    geometry.validate()?;
    params.validate()?;

    if geometry.thickness < MIN_THICKNESS {
        return Err(ValidationError::ThicknessTooSmall {
            thickness: geometry.thickness,
            min: MIN_THICKNESS,
        });
    }
    let ratio = geometry.thickness_ratio();
    if ratio > MAX_THICKNESS_RATIO {
        return Err(ValidationError::ThicknessTooLarge {
            ratio,
            limit: MAX_THICKNESS_RATIO,
        });
    }
    if ratio > THIN_PLATE_RATIO {
        diagnostics.warn(
            SOURCE,
            format!(
                "thickness ratio h/min(a,b) = {ratio:.3} exceeds {THIN_PLATE_RATIO}; thin-plate results may be inaccurate"
            ),
        );
    }

    let aspect = params.element_aspect_ratio(geometry);
    if aspect > MAX_ELEMENT_ASPECT {
        return Err(ValidationError::ElementAspectRatio {
            ratio: aspect,
            limit: MAX_ELEMENT_ASPECT,
        });
    }
    if aspect > WARN_ELEMENT_ASPECT {
        diagnostics.warn(
            SOURCE,
            format!("element aspect ratio {aspect:.2} exceeds {WARN_ELEMENT_ASPECT}"),
        );
    }

    let count = params
        .node_count()
        .zip(params.element_count())
        .map(|(nodes, elements)| nodes.max(elements));
    match count {
        Some(count) if count <= MAX_ID => Ok(()),
        Some(count) => Err(ValidationError::TooManyIds { count }),
        None => Err(ValidationError::TooManyIds { count: usize::MAX }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flutter_model::Severity;
    use std::collections::BTreeSet;

    fn build(nx: usize, ny: usize, kind: ElementKind, code: &str) -> (PanelMesh, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mesh = MeshBuilder::build(
            &PanelGeometry::new(0.5, 0.3, 0.002),
            &MeshParameters::new(nx, ny, kind),
            &code.parse().unwrap(),
            &mut diagnostics,
        )
        .unwrap();
        (mesh, diagnostics)
    }

    #[test]
    fn quad4_counts_and_connectivity() {
        let (mesh, _) = build(10, 5, ElementKind::Quad4, "SSSS");
        assert_eq!(mesh.nodes.len(), 66);
        assert_eq!(mesh.elements.len(), 50);
        assert_eq!(mesh.elements[0].nodes, vec![1, 2, 13, 12]);
        assert_eq!(mesh.elements[49].nodes, vec![54, 55, 66, 65]);
        assert!(mesh.validate().is_ok());

        let last = mesh.nodes.last().unwrap();
        assert_eq!(last.id, 66);
        assert!((last.x - 0.5).abs() < 1e-12);
        assert!((last.y - 0.3).abs() < 1e-12);
    }

    #[test]
    fn tria3_splits_cells_on_the_diagonal() {
        let (mesh, _) = build(2, 2, ElementKind::Tria3, "SSSS");
        assert_eq!(mesh.nodes.len(), 9);
        assert_eq!(mesh.elements.len(), 8);
        assert_eq!(mesh.elements[0].nodes, vec![1, 2, 5]);
        assert_eq!(mesh.elements[1].nodes, vec![1, 5, 4]);
    }

    #[test]
    fn quad8_skips_cell_centres() {
        let (mesh, _) = build(2, 1, ElementKind::Quad8, "SSSS");
        assert_eq!(mesh.nodes.len(), 13);
        assert_eq!(
            Some(mesh.nodes.len()),
            MeshParameters::new(2, 1, ElementKind::Quad8).node_count()
        );
        assert_eq!(mesh.elements[0].nodes, vec![1, 3, 11, 9, 2, 7, 10, 6]);
        assert_eq!(mesh.elements[1].nodes, vec![3, 5, 13, 11, 4, 8, 12, 7]);
        let ids: Vec<u32> = mesh.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, (1..=13).collect::<Vec<_>>());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn tria6_uses_full_refined_lattice() {
        let (mesh, _) = build(1, 1, ElementKind::Tria6, "SSSS");
        assert_eq!(mesh.nodes.len(), 9);
        assert_eq!(mesh.elements[0].nodes, vec![1, 3, 9, 2, 6, 5]);
        assert_eq!(mesh.elements[1].nodes, vec![1, 9, 7, 5, 8, 4]);
    }

    #[test]
    fn element_nodes_exist_for_every_kind() {
        for kind in [
            ElementKind::Quad4,
            ElementKind::Quad8,
            ElementKind::Tria3,
            ElementKind::Tria6,
        ] {
            let params = MeshParameters::new(4, 3, kind);
            let (mesh, _) = build(4, 3, kind, "CSCS");
            assert_eq!(Some(mesh.nodes.len()), params.node_count());
            assert_eq!(Some(mesh.elements.len()), params.element_count());
            let ids: BTreeSet<u32> = mesh.nodes.iter().map(|n| n.id).collect();
            for element in &mesh.elements {
                assert_eq!(element.nodes.len(), kind.node_count());
                assert!(element.nodes.iter().all(|n| ids.contains(n)));
            }
        }
    }

    #[test]
    fn ssss_constrains_the_perimeter_once() {
        let (mesh, _) = build(4, 4, ElementKind::Quad4, "SSSS");
        assert_eq!(mesh.constraints.len(), 1);
        assert_eq!(mesh.constraints[0].dofs, "3");
        assert_eq!(mesh.constraints[0].nodes.len(), 16);
        assert!(mesh.constraints[0].nodes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn cccc_clamps_every_edge_node() {
        let (mesh, _) = build(4, 4, ElementKind::Quad4, "CCCC");
        assert_eq!(mesh.constraints.len(), 1);
        assert_eq!(mesh.constraints[0].dofs, "123456");
        assert_eq!(mesh.constraints[0].nodes.len(), 16);
    }

    #[test]
    fn mixed_edges_give_corners_the_union() {
        // bottom S, right C, top S, left C
        let (mesh, _) = build(4, 2, ElementKind::Quad4, "SCSC");
        assert_eq!(mesh.constraints.len(), 2);
        let clamped = &mesh.constraints[0];
        let simple = &mesh.constraints[1];
        assert_eq!(clamped.dofs, "123456");
        assert_eq!(simple.dofs, "3");
        // left and right columns, corners included
        assert_eq!(clamped.nodes, vec![1, 5, 6, 10, 11, 15]);
        assert_eq!(simple.nodes, vec![2, 3, 4, 12, 13, 14]);
    }

    #[test]
    fn cantilever_gets_anchor_event() {
        let (mesh, diagnostics) = build(4, 2, ElementKind::Quad4, "CFFF");
        assert_eq!(mesh.constraints.len(), 1);
        assert_eq!(mesh.constraints[0].dofs, "123456");
        assert_eq!(mesh.constraints[0].nodes, vec![1, 2, 3, 4, 5]);
        assert!(diagnostics
            .events()
            .iter()
            .any(|e| e.severity == Severity::Info && e.message.contains("anchoring")));
    }

    #[test]
    fn free_panel_is_anchored_in_plane() {
        let (mesh, _) = build(3, 3, ElementKind::Quad4, "FFFF");
        assert_eq!(mesh.constraints.len(), 2);
        assert_eq!(mesh.constraints[0].dofs, "12");
        assert_eq!(mesh.constraints[0].nodes, vec![1]);
        assert_eq!(mesh.constraints[1].dofs, "2");
        assert_eq!(mesh.constraints[1].nodes, vec![4]);
    }

    #[test]
    fn quadratic_edges_include_mid_side_nodes() {
        let (mesh, _) = build(2, 1, ElementKind::Quad8, "SSSS");
        // node 7 is the only interior node of the 13
        assert_eq!(mesh.constraints[0].nodes.len(), 12);
        assert!(!mesh.constraints[0].nodes.contains(&7));
    }

    #[test]
    fn rejects_thin_thick_and_stretched_panels() {
        let mut d = Diagnostics::new();
        let params = MeshParameters::quad4(10, 10);
        let code = BoundaryEdgeCode::simply_supported();

        let too_thin = PanelGeometry::new(0.3, 0.3, 5e-6);
        assert!(matches!(
            MeshBuilder::build(&too_thin, &params, &code, &mut d),
            Err(ValidationError::ThicknessTooSmall { .. })
        ));

        let block = PanelGeometry::new(0.1, 0.1, 0.06);
        assert!(matches!(
            MeshBuilder::build(&block, &params, &code, &mut d),
            Err(ValidationError::ThicknessTooLarge { .. })
        ));

        let stretched = MeshParameters::quad4(1, 30);
        assert!(matches!(
            MeshBuilder::build(&PanelGeometry::new(0.3, 0.2, 0.002), &stretched, &code, &mut d),
            Err(ValidationError::ElementAspectRatio { .. })
        ));

        assert!(matches!(
            MeshBuilder::build(
                &PanelGeometry::new(0.3, 0.2, 0.002),
                &MeshParameters::quad4(0, 4),
                &code,
                &mut d
            ),
            Err(ValidationError::EmptyMesh { .. })
        ));
        assert!(d.is_empty());
    }

    #[test]
    fn thick_plate_and_stretched_elements_warn() {
        let mut d = Diagnostics::new();
        let code = BoundaryEdgeCode::simply_supported();
        MeshBuilder::build(
            &PanelGeometry::new(0.1, 0.1, 0.02),
            &MeshParameters::quad4(4, 4),
            &code,
            &mut d,
        )
        .unwrap();
        assert_eq!(d.warnings().len(), 1);

        let mut d = Diagnostics::new();
        MeshBuilder::build(
            &PanelGeometry::new(0.3, 0.2, 0.002),
            &MeshParameters::quad4(1, 10),
            &code,
            &mut d,
        )
        .unwrap();
        assert!(d.warnings()[0].contains("aspect ratio"));
    }

    #[test]
    fn rejects_meshes_beyond_field_width() {
        let mut d = Diagnostics::new();
        let result = MeshBuilder::build(
            &PanelGeometry::new(1.0, 1.0, 0.002),
            &MeshParameters::quad4(20_000, 20_000),
            &BoundaryEdgeCode::simply_supported(),
            &mut d,
        );
        assert!(matches!(result, Err(ValidationError::TooManyIds { .. })));
    }

    #[test]
    fn overflowing_counts_are_rejected_not_wrapped() {
        let mut d = Diagnostics::new();
        let side = usize::MAX / 2;
        let result = MeshBuilder::build(
            &PanelGeometry::new(1.0, 1.0, 0.002),
            &MeshParameters::quad4(side, side),
            &BoundaryEdgeCode::simply_supported(),
            &mut d,
        );
        assert!(matches!(
            result,
            Err(ValidationError::TooManyIds { count: usize::MAX })
        ));
    }
}
