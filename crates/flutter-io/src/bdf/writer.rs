//! SOL 145 flutter deck generation.
//!
//! The writer converts an SI panel model to the mm–tonne–s–N–MPa unit system
//! and emits the complete deck as a single string. All validation happens
//! before the first card is produced, so a failed call never yields a
//! partially valid deck and `write_file` never leaves a half-written file.

use std::fs;
use std::path::Path;

use flutter_model::{
    Diagnostics, FlowConditions, Material, OrthotropicMaterial, PanelGeometry, PanelMesh, Ply,
};
use serde::{Deserialize, Serialize};

use super::field::{Card, Field};
use crate::error::{BulkDataError, Result};
use crate::units;

const SOURCE: &str = "bdf";

/// Largest id representable in an 8-column integer field.
pub const MAX_FIELD_ID: u64 = 99_999_999;

/// Flutter solution method on the FLUTTER card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlutterSolutionMethod {
    #[default]
    Pk,
    Pknl,
}

impl FlutterSolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlutterSolutionMethod::Pk => "PK",
            FlutterSolutionMethod::Pknl => "PKNL",
        }
    }
}

/// Set and card ids used in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckIds {
    pub spc: u32,
    pub eigrl: u32,
    pub flutter: u32,
    pub density_factors: u32,
    pub mach_factors: u32,
    pub velocity_factors: u32,
    pub property: u32,
    pub spline: u32,
}

impl Default for DeckIds {
    fn default() -> Self {
        Self {
            spc: 1,
            eigrl: 10,
            flutter: 30,
            density_factors: 31,
            mach_factors: 32,
            velocity_factors: 33,
            property: 1,
            spline: 100,
        }
    }
}

/// Deck-level settings. Velocities are SI; conversion happens on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkDataConfig {
    pub title: String,
    pub n_modes: usize,
    /// EIGRL frequency bounds [Hz]
    pub frequency_range: Option<(f64, f64)>,
    /// Aerodynamic boxes spanwise; defaults to the mesh `ny`
    pub nspan: Option<usize>,
    /// Aerodynamic boxes chordwise; defaults to the mesh `nx`
    pub nchord: Option<usize>,
    /// Defaults to the flow Mach number
    pub mach_numbers: Vec<f64>,
    pub reduced_frequencies: Vec<f64>,
    pub density_ratios: Vec<f64>,
    /// Velocity sweep [m/s]; when empty a sweep around the flow velocity is used
    pub velocities: Vec<f64>,
    pub method: FlutterSolutionMethod,
    pub ids: DeckIds,
}

impl Default for BulkDataConfig {
    fn default() -> Self {
        Self {
            title: "PANEL FLUTTER ANALYSIS".to_string(),
            n_modes: 10,
            frequency_range: None,
            nspan: None,
            nchord: None,
            mach_numbers: Vec::new(),
            reduced_frequencies: vec![0.001, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0],
            density_ratios: vec![1.0],
            velocities: Vec::new(),
            method: FlutterSolutionMethod::Pk,
            ids: DeckIds::default(),
        }
    }
}

/// Default sweep bounds as multiples of the free-stream velocity.
pub const DEFAULT_SWEEP_START: f64 = 0.2;
pub const DEFAULT_SWEEP_END: f64 = 3.0;
pub const DEFAULT_SWEEP_POINTS: usize = 15;

/// `count` evenly spaced velocities from `start` to `end` inclusive.
pub fn velocity_sweep(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

impl BulkDataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_modes == 0 {
            return Err(BulkDataError::Config(
                "at least one mode must be requested".to_string(),
            ));
        }
        if let Some((lo, hi)) = self.frequency_range
            && !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && hi > lo)
        {
            return Err(BulkDataError::Config(format!(
                "invalid frequency range [{lo}, {hi}]"
            )));
        }
        if matches!(self.nspan, Some(0)) || matches!(self.nchord, Some(0)) {
            return Err(BulkDataError::Config(
                "aerodynamic box counts must be positive".to_string(),
            ));
        }
        if self.reduced_frequencies.is_empty() {
            return Err(BulkDataError::Config(
                "reduced frequency list is empty".to_string(),
            ));
        }
        check_list("reduced frequency", &self.reduced_frequencies, false)?;
        check_list("Mach number", &self.mach_numbers, true)?;
        if self.density_ratios.is_empty() {
            return Err(BulkDataError::Config(
                "density ratio list is empty".to_string(),
            ));
        }
        check_list("density ratio", &self.density_ratios, false)?;
        check_list("velocity", &self.velocities, false)?;
        Ok(())
    }
}

fn check_list(name: &str, values: &[f64], allow_zero: bool) -> Result<()> {
    for &v in values {
        let ok = v.is_finite() && if allow_zero { v >= 0.0 } else { v > 0.0 };
        if !ok {
            return Err(BulkDataError::Config(format!("invalid {name} {v}")));
        }
    }
    Ok(())
}

/// First aerodynamic box id: the next power of ten above every structural id.
pub fn aero_id_base(max_structural_id: u32) -> u32 {
    let mut base: u32 = 1_000;
    while base <= max_structural_id && base < 100_000_000 {
        base *= 10;
    }
    base + 1
}

pub struct BulkDataWriter {
    config: BulkDataConfig,
}

impl BulkDataWriter {
    pub fn new(config: BulkDataConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BulkDataConfig {
        &self.config
    }

    /// Writes the deck to `path` once the whole text has been encoded.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        mesh: &PanelMesh,
        geometry: &PanelGeometry,
        material: &Material,
        flow: &FlowConditions,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let text = self.write(mesh, geometry, material, flow, diagnostics)?;
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let staging = path.with_extension("bdf.partial");
        fs::write(&staging, text)?;
        fs::rename(&staging, path)?;
        diagnostics.info(SOURCE, format!("bulk data written to {}", path.display()));
        Ok(())
    }

    /// Produces the complete deck text.
    pub fn write(
        &self,
        mesh: &PanelMesh,
        geometry: &PanelGeometry,
        material: &Material,
        flow: &FlowConditions,
        diagnostics: &mut Diagnostics,
    ) -> Result<String> {
        geometry.validate()?;
        material.validate()?;
        flow.validate()?;
        self.config.validate()?;
        check_mesh(mesh)?;

        let section = material.section(geometry.thickness)?;
        if let Some(h) = material.intrinsic_thickness()
            && (h - geometry.thickness).abs() > 1e-9 * h.max(geometry.thickness)
        {
            diagnostics.warn(
                SOURCE,
                format!(
                    "material '{}' prescribes thickness {h} m; geometry thickness {} m ignored",
                    material.name(),
                    geometry.thickness
                ),
            );
        }

        let velocities = if self.config.velocities.is_empty() {
            let v = flow.velocity();
            diagnostics.info(
                SOURCE,
                format!(
                    "no velocity sweep given; using {DEFAULT_SWEEP_POINTS} points from {:.1} to {:.1} m/s",
                    DEFAULT_SWEEP_START * v,
                    DEFAULT_SWEEP_END * v
                ),
            );
            velocity_sweep(
                DEFAULT_SWEEP_START * v,
                DEFAULT_SWEEP_END * v,
                DEFAULT_SWEEP_POINTS,
            )
        } else {
            self.config.velocities.clone()
        };
        let machs = if self.config.mach_numbers.is_empty() {
            vec![flow.mach]
        } else {
            self.config.mach_numbers.clone()
        };

        let mut out = String::new();
        self.write_executive(&mut out, material, flow);

        let ids = &self.config.ids;
        push(&mut out, Card::new("PARAM").field("POST").field(-1i64))?;
        push(&mut out, Card::new("PARAM").field("AUTOSPC").field("YES"))?;
        push(&mut out, Card::new("PARAM").field("COUPMASS").field(1i64))?;
        push(&mut out, Card::new("PARAM").field("WTMASS").field(1.0))?;
        push(
            &mut out,
            Card::new("PARAM")
                .field("LMODES")
                .field(count_field("PARAM", self.config.n_modes)?),
        )?;

        out.push_str("$ materials and properties\n");
        match material.ply_stack(section.thickness) {
            None => {
                let Material::Isotropic(m) = material else {
                    return Err(BulkDataError::Config(format!(
                        "material '{}' has no ply stack",
                        material.name()
                    )));
                };
                push(
                    &mut out,
                    Card::new("MAT1")
                        .field(1u32)
                        .field(units::modulus_to_solver(m.elastic_modulus))
                        .blank()
                        .field(m.poissons_ratio)
                        .field(units::density_to_solver(m.density)),
                )?;
                push(
                    &mut out,
                    Card::new("PSHELL")
                        .field(ids.property)
                        .field(1u32)
                        .field(units::length_to_solver(section.thickness))
                        .field(1u32)
                        .blank()
                        .field(1u32),
                )?;
            }
            Some(plies) => write_composite(&mut out, ids.property, &plies)?,
        }

        out.push_str("$ grid points\n");
        for node in &mesh.nodes {
            push(
                &mut out,
                Card::new("GRID")
                    .field(node.id)
                    .blank()
                    .field(units::length_to_solver(node.x))
                    .field(units::length_to_solver(node.y))
                    .field(units::length_to_solver(node.z)),
            )?;
        }

        out.push_str("$ elements\n");
        for element in &mesh.elements {
            push(
                &mut out,
                Card::new(element.kind.card_name())
                    .field(element.id)
                    .field(element.property_id)
                    .fields(element.nodes.iter().copied()),
            )?;
        }

        out.push_str("$ boundary conditions\n");
        for constraint in &mesh.constraints {
            push(
                &mut out,
                Card::new("SPC1")
                    .field(ids.spc)
                    .field(constraint.dofs.as_str())
                    .fields(constraint.nodes.iter().copied()),
            )?;
        }

        let mut eigrl = Card::new("EIGRL").field(ids.eigrl);
        eigrl = match self.config.frequency_range {
            Some((lo, hi)) => eigrl.field(lo).field(hi),
            None => eigrl.blanks(2),
        };
        push(
            &mut out,
            eigrl.field(count_field("EIGRL", self.config.n_modes)?),
        )?;

        self.write_aero(&mut out, mesh, geometry, flow)?;

        out.push_str("$ flutter solution\n");
        for mach_chunk in machs.chunks(8) {
            let mut card = Card::new("MKAERO1").fields(mach_chunk.iter().copied());
            // reduced frequencies start on the continuation line
            card = card.blanks(8 - mach_chunk.len());
            for k_chunk in self.config.reduced_frequencies.chunks(8) {
                push(&mut out, card.clone().fields(k_chunk.iter().copied()))?;
            }
        }

        push(
            &mut out,
            Card::new("FLUTTER")
                .field(ids.flutter)
                .field(self.config.method.as_str())
                .field(ids.density_factors)
                .field(ids.mach_factors)
                .field(ids.velocity_factors)
                .field("L")
                .field(count_field("FLUTTER", self.config.n_modes)?),
        )?;
        push(
            &mut out,
            Card::new("FLFACT")
                .field(ids.density_factors)
                .fields(self.config.density_ratios.iter().copied()),
        )?;
        push(
            &mut out,
            Card::new("FLFACT")
                .field(ids.mach_factors)
                .fields(machs.iter().copied()),
        )?;
        push(
            &mut out,
            Card::new("FLFACT")
                .field(ids.velocity_factors)
                .fields(velocities.iter().map(|&v| units::velocity_to_solver(v))),
        )?;

        out.push_str("ENDDATA\n");
        Ok(out)
    }

    fn write_executive(&self, out: &mut String, material: &Material, flow: &FlowConditions) {
        out.push_str(&format!("$ {}\n", self.config.title));
        out.push_str(&format!(
            "$ material: {} ({}), Mach {:.3}, q = {:.1} Pa\n",
            material.name(),
            material.kind(),
            flow.mach,
            flow.dynamic_pressure()
        ));
        out.push_str("$ units: mm, tonne, s, N, MPa\n");
        out.push_str("SOL 145\n");
        out.push_str("CEND\n");
        out.push_str(&format!("TITLE = {}\n", self.config.title));
        out.push_str("ECHO = NONE\n");
        out.push_str("SUBCASE 1\n");
        let ids = &self.config.ids;
        out.push_str(&format!("  SPC = {}\n", ids.spc));
        out.push_str(&format!("  METHOD = {}\n", ids.eigrl));
        out.push_str(&format!("  FMETHOD = {}\n", ids.flutter));
        out.push_str("  DISPLACEMENT(PLOT) = ALL\n");
        out.push_str("  SVECTOR(PLOT) = ALL\n");
        out.push_str("BEGIN BULK\n");
    }

    fn write_aero(
        &self,
        out: &mut String,
        mesh: &PanelMesh,
        geometry: &PanelGeometry,
        flow: &FlowConditions,
    ) -> Result<()> {
        out.push_str("$ aerodynamics\n");
        let chord = units::length_to_solver(geometry.length);
        let span = units::length_to_solver(geometry.width);
        push(
            out,
            Card::new("AERO")
                .blank()
                .field(units::velocity_to_solver(flow.velocity()))
                .field(chord)
                .field(units::density_to_solver(flow.density())),
        )?;

        let nspan = self.config.nspan.unwrap_or(mesh.ny.max(1));
        let nchord = self.config.nchord.unwrap_or(mesh.nx.max(1));
        let max_id = mesh
            .nodes
            .iter()
            .map(|n| n.id)
            .chain(mesh.elements.iter().map(|e| e.id))
            .max()
            .unwrap_or(0);
        let caero = aero_id_base(max_id);
        // nspan and nchord are at least 1
        let last_box = nspan
            .checked_mul(nchord)
            .and_then(|boxes| u64::try_from(boxes).ok())
            .and_then(|boxes| u64::from(caero).checked_add(boxes - 1))
            .filter(|&id| id <= MAX_FIELD_ID)
            .ok_or_else(|| {
                BulkDataError::Config(format!(
                    "{nspan} x {nchord} aerodynamic boxes from id {caero} exceed the 8-column field"
                ))
            })?;

        push(out, Card::new("PAERO1").field(caero))?;
        push(
            out,
            Card::new("CAERO1")
                .field(caero)
                .field(caero)
                .blank()
                .field(count_field("CAERO1", nspan)?)
                .field(count_field("CAERO1", nchord)?)
                .blanks(2)
                .field(1u32)
                // leading edge from (0,0,0) to (0,b,0), streamwise chord a
                .field(0.0)
                .field(0.0)
                .field(0.0)
                .field(chord)
                .field(0.0)
                .field(span)
                .field(0.0)
                .field(chord),
        )?;

        push(
            out,
            Card::new("SET1")
                .field(self.config.ids.spline)
                .fields(mesh.nodes.iter().map(|n| n.id)),
        )?;
        push(
            out,
            Card::new("SPLINE1")
                .field(self.config.ids.spline)
                .field(caero)
                .field(caero)
                .field(Field::try_from(last_box).map_err(|e| e.in_card("SPLINE1"))?)
                .field(self.config.ids.spline)
                .field(0.0),
        )?;
        Ok(())
    }
}

fn count_field(card: &str, value: usize) -> Result<Field> {
    Ok(Field::try_from(value).map_err(|e| e.in_card(card))?)
}

fn push(out: &mut String, card: Card) -> Result<()> {
    out.push_str(&card.encode()?);
    Ok(())
}

fn check_mesh(mesh: &PanelMesh) -> Result<()> {
    if mesh.nodes.is_empty() || mesh.elements.is_empty() {
        return Err(BulkDataError::InvalidMesh(format!(
            "mesh has {} nodes and {} elements",
            mesh.nodes.len(),
            mesh.elements.len()
        )));
    }
    mesh.validate().map_err(BulkDataError::InvalidMesh)?;
    if mesh
        .constraints
        .iter()
        .all(|c| c.nodes.is_empty() || c.dofs.is_empty())
    {
        return Err(BulkDataError::NoConstraints);
    }
    Ok(())
}

/// MAT8 per distinct ply material, then a PCOMP listing every ply.
fn write_composite(out: &mut String, property_id: u32, plies: &[Ply]) -> Result<()> {
    let mut materials: Vec<&OrthotropicMaterial> = Vec::new();
    let mut ply_mids = Vec::with_capacity(plies.len());
    for ply in plies {
        let index = match materials.iter().position(|m| **m == ply.material) {
            Some(i) => i,
            None => {
                materials.push(&ply.material);
                materials.len() - 1
            }
        };
        ply_mids.push(index as u32 + 1);
    }

    for (i, m) in materials.iter().enumerate() {
        let mut card = Card::new("MAT8")
            .field(i as u32 + 1)
            .field(units::modulus_to_solver(m.e1))
            .field(units::modulus_to_solver(m.e2))
            .field(m.nu12)
            .field(units::modulus_to_solver(m.g12));
        card = match m.g1z {
            Some(g) => card.field(units::modulus_to_solver(g)),
            None => card.blank(),
        };
        card = match m.g2z {
            Some(g) => card.field(units::modulus_to_solver(g)),
            None => card.blank(),
        };
        push(out, card.field(units::density_to_solver(m.density)))?;
    }

    let mut pcomp = Card::new("PCOMP").field(property_id).blanks(7);
    for (ply, mid) in plies.iter().zip(ply_mids) {
        pcomp = pcomp
            .field(mid)
            .field(units::length_to_solver(ply.thickness))
            .field(ply.angle_deg)
            .field("YES");
    }
    push(out, pcomp)
}
