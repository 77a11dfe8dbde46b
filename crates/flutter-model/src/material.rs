//! Panel materials.
//!
//! [`Material`] is a tagged union; downstream code dispatches on the variant
//! rather than probing for optional fields. Every variant resolves to a single
//! [`SectionProperties`] through [`Material::section`], which is the one place
//! an "effective" thickness, density and bending stiffness is decided.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError, ensure_positive};

/// Linear elastic isotropic material (SI units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotropicMaterial {
    pub name: String,
    /// Young's modulus (E) [Pa]
    pub elastic_modulus: f64,
    /// Poisson's ratio (ν) [-]
    pub poissons_ratio: f64,
    /// Density (ρ) [kg/m³]
    pub density: f64,
}

impl IsotropicMaterial {
    pub fn new(name: impl Into<String>, elastic_modulus: f64, poissons_ratio: f64, density: f64) -> Self {
        Self {
            name: name.into(),
            elastic_modulus,
            poissons_ratio,
            density,
        }
    }

    /// 2024-T3 style aluminium used throughout the reference cases.
    pub fn aluminum() -> Self {
        Self::new("ALUMINUM", 71.7e9, 0.33, 2810.0)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("elastic modulus", self.elastic_modulus)?;
        ensure_positive("density", self.density)?;
        if !(self.poissons_ratio > -1.0 && self.poissons_ratio < 0.5) {
            return Err(ValidationError::OutOfRange {
                name: "poisson's ratio",
                value: self.poissons_ratio,
                min: -1.0,
                max: 0.5,
            });
        }
        Ok(())
    }

    /// Shear modulus G = E / (2(1+ν))
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }

    /// Same material expressed as a (degenerate) orthotropic lamina.
    pub fn as_orthotropic(&self) -> OrthotropicMaterial {
        OrthotropicMaterial {
            name: self.name.clone(),
            e1: self.elastic_modulus,
            e2: self.elastic_modulus,
            nu12: self.poissons_ratio,
            g12: self.shear_modulus(),
            density: self.density,
            g1z: None,
            g2z: None,
        }
    }
}

/// Orthotropic lamina in its principal axes (SI units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrthotropicMaterial {
    pub name: String,
    /// Fibre-direction modulus [Pa]
    pub e1: f64,
    /// Transverse modulus [Pa]
    pub e2: f64,
    pub nu12: f64,
    /// In-plane shear modulus [Pa]
    pub g12: f64,
    /// Density [kg/m³]
    pub density: f64,
    /// Transverse shear modulus 1-z [Pa]
    #[serde(default)]
    pub g1z: Option<f64>,
    /// Transverse shear modulus 2-z [Pa]
    #[serde(default)]
    pub g2z: Option<f64>,
}

impl OrthotropicMaterial {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("e1", self.e1)?;
        ensure_positive("e2", self.e2)?;
        ensure_positive("g12", self.g12)?;
        ensure_positive("density", self.density)?;
        let nu21 = self.nu12 * self.e2 / self.e1;
        if !self.nu12.is_finite() || 1.0 - self.nu12 * nu21 <= 0.0 {
            return Err(ValidationError::Material {
                name: self.name.clone(),
                reason: format!("nu12 = {} violates 1 - nu12*nu21 > 0", self.nu12),
            });
        }
        Ok(())
    }

    /// Plane-stress reduced stiffness matrix Q in the lamina axes.
    pub fn reduced_stiffness(&self) -> Matrix3<f64> {
        let nu21 = self.nu12 * self.e2 / self.e1;
        let denom = 1.0 - self.nu12 * nu21;
        let q11 = self.e1 / denom;
        let q22 = self.e2 / denom;
        let q12 = self.nu12 * self.e2 / denom;
        Matrix3::new(q11, q12, 0.0, q12, q22, 0.0, 0.0, 0.0, self.g12)
    }

    /// Reduced stiffness rotated by `angle_deg` into the laminate axes (Q-bar).
    pub fn transformed_stiffness(&self, angle_deg: f64) -> Matrix3<f64> {
        let q = self.reduced_stiffness();
        let (q11, q12, q22, q66) = (q[(0, 0)], q[(0, 1)], q[(1, 1)], q[(2, 2)]);
        let (s, c) = angle_deg.to_radians().sin_cos();
        let (s2, c2) = (s * s, c * c);

        let b11 = q11 * c2 * c2 + 2.0 * (q12 + 2.0 * q66) * s2 * c2 + q22 * s2 * s2;
        let b22 = q11 * s2 * s2 + 2.0 * (q12 + 2.0 * q66) * s2 * c2 + q22 * c2 * c2;
        let b12 = (q11 + q22 - 4.0 * q66) * s2 * c2 + q12 * (s2 * s2 + c2 * c2);
        let b66 = (q11 + q22 - 2.0 * q12 - 2.0 * q66) * s2 * c2 + q66 * (s2 * s2 + c2 * c2);
        let b16 = (q11 - q12 - 2.0 * q66) * s * c2 * c + (q12 - q22 + 2.0 * q66) * s2 * s * c;
        let b26 = (q11 - q12 - 2.0 * q66) * s2 * s * c + (q12 - q22 + 2.0 * q66) * s * c2 * c;

        Matrix3::new(b11, b12, b16, b12, b22, b26, b16, b26, b66)
    }
}

/// One layer of a laminate stack, listed bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ply {
    pub material: OrthotropicMaterial,
    /// Ply thickness [m]
    pub thickness: f64,
    /// Fibre angle relative to the panel x axis [deg]
    #[serde(default)]
    pub angle_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeLaminate {
    pub name: String,
    pub plies: Vec<Ply>,
}

impl CompositeLaminate {
    pub fn validate(&self) -> Result<()> {
        if self.plies.is_empty() {
            return Err(ValidationError::EmptyLaminate(self.name.clone()));
        }
        for ply in &self.plies {
            ply.material.validate()?;
            ensure_positive("ply thickness", ply.thickness)?;
        }
        Ok(())
    }

    pub fn total_thickness(&self) -> f64 {
        self.plies.iter().map(|p| p.thickness).sum()
    }

    /// Mass-weighted density Σρt / Σt
    pub fn density(&self) -> f64 {
        let mass: f64 = self.plies.iter().map(|p| p.material.density * p.thickness).sum();
        mass / self.total_thickness()
    }

    /// Classical-lamination bending stiffness D = Σ Q̄ₖ (zₖ³ − zₖ₋₁³) / 3
    pub fn bending_matrix(&self) -> Matrix3<f64> {
        let mut z = -0.5 * self.total_thickness();
        let mut d = Matrix3::zeros();
        for ply in &self.plies {
            let z_next = z + ply.thickness;
            d += ply.material.transformed_stiffness(ply.angle_deg) * ((z_next.powi(3) - z.powi(3)) / 3.0);
            z = z_next;
        }
        d
    }
}

/// Face/core/face sandwich with identical isotropic faces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandwichPanel {
    pub name: String,
    pub face: IsotropicMaterial,
    /// Thickness of one face sheet [m]
    pub face_thickness: f64,
    pub core: IsotropicMaterial,
    /// Core thickness [m]
    pub core_thickness: f64,
}

impl SandwichPanel {
    pub fn validate(&self) -> Result<()> {
        self.face.validate()?;
        self.core.validate()?;
        ensure_positive("face thickness", self.face_thickness)?;
        ensure_positive("core thickness", self.core_thickness)
    }

    pub fn total_thickness(&self) -> f64 {
        self.core_thickness + 2.0 * self.face_thickness
    }

    /// Equivalent single-layer isotropic section with the same bending
    /// stiffness and mass per unit area.
    pub fn equivalent(&self) -> EquivalentIsotropic {
        let h = self.total_thickness();
        let tc = self.core_thickness;
        let nu = self.face.poissons_ratio;
        let d_faces = self.face.elastic_modulus / (1.0 - nu * nu) * (h.powi(3) - tc.powi(3)) / 12.0;
        let nu_c = self.core.poissons_ratio;
        let d_core = self.core.elastic_modulus / (1.0 - nu_c * nu_c) * tc.powi(3) / 12.0;
        let d = d_faces + d_core;
        let mass = 2.0 * self.face.density * self.face_thickness + self.core.density * tc;

        EquivalentIsotropic {
            thickness: h,
            elastic_modulus: 12.0 * d * (1.0 - nu * nu) / h.powi(3),
            poissons_ratio: nu,
            density: mass / h,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquivalentIsotropic {
    pub thickness: f64,
    pub elastic_modulus: f64,
    pub poissons_ratio: f64,
    pub density: f64,
}

/// Plate bending stiffnesses [N·m].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BendingStiffness {
    pub d11: f64,
    pub d22: f64,
    pub d12: f64,
    pub d66: f64,
}

impl BendingStiffness {
    /// D = E h³ / (12 (1 − ν²)) on the diagonal, ν·D coupling, (1−ν)D/2 twist.
    pub fn isotropic(elastic_modulus: f64, poissons_ratio: f64, thickness: f64) -> Self {
        let d = flexural_rigidity(elastic_modulus, poissons_ratio, thickness);
        Self {
            d11: d,
            d22: d,
            d12: poissons_ratio * d,
            d66: 0.5 * (1.0 - poissons_ratio) * d,
        }
    }

    pub fn from_matrix(d: &Matrix3<f64>) -> Self {
        Self {
            d11: d[(0, 0)],
            d22: d[(1, 1)],
            d12: d[(0, 1)],
            d66: d[(2, 2)],
        }
    }

    /// Scalar reference rigidity sqrt(D11·D22); equals D for isotropic plates.
    pub fn reference(&self) -> f64 {
        (self.d11 * self.d22).sqrt()
    }
}

/// D = E h³ / (12 (1 − ν²))
pub fn flexural_rigidity(elastic_modulus: f64, poissons_ratio: f64, thickness: f64) -> f64 {
    elastic_modulus * thickness.powi(3) / (12.0 * (1.0 - poissons_ratio * poissons_ratio))
}

/// Effective section seen by every downstream component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    pub thickness: f64,
    pub density: f64,
    pub elastic_modulus: f64,
    pub poissons_ratio: f64,
    pub bending: BendingStiffness,
}

impl SectionProperties {
    /// ρh [kg/m²]
    pub fn mass_per_area(&self) -> f64 {
        self.density * self.thickness
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Material {
    Isotropic(IsotropicMaterial),
    Orthotropic(OrthotropicMaterial),
    Composite(CompositeLaminate),
    Sandwich(SandwichPanel),
}

impl Material {
    pub fn name(&self) -> &str {
        match self {
            Material::Isotropic(m) => &m.name,
            Material::Orthotropic(m) => &m.name,
            Material::Composite(m) => &m.name,
            Material::Sandwich(m) => &m.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Material::Isotropic(_) => "isotropic",
            Material::Orthotropic(_) => "orthotropic",
            Material::Composite(_) => "composite",
            Material::Sandwich(_) => "sandwich",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Material::Isotropic(m) => m.validate(),
            Material::Orthotropic(m) => m.validate(),
            Material::Composite(m) => m.validate(),
            Material::Sandwich(m) => m.validate(),
        }
    }

    /// Thickness the material itself prescribes, if any.
    pub fn intrinsic_thickness(&self) -> Option<f64> {
        match self {
            Material::Isotropic(_) | Material::Orthotropic(_) => None,
            Material::Composite(m) => Some(m.total_thickness()),
            Material::Sandwich(m) => Some(m.total_thickness()),
        }
    }

    /// Resolves the effective section. Laminates and sandwiches carry their own
    /// thickness; single-layer materials use `panel_thickness`.
    pub fn section(&self, panel_thickness: f64) -> Result<SectionProperties> {
        self.validate()?;
        let section = match self {
            Material::Isotropic(m) => {
                ensure_positive("panel thickness", panel_thickness)?;
                SectionProperties {
                    thickness: panel_thickness,
                    density: m.density,
                    elastic_modulus: m.elastic_modulus,
                    poissons_ratio: m.poissons_ratio,
                    bending: BendingStiffness::isotropic(
                        m.elastic_modulus,
                        m.poissons_ratio,
                        panel_thickness,
                    ),
                }
            }
            Material::Orthotropic(m) => {
                ensure_positive("panel thickness", panel_thickness)?;
                let laminate = CompositeLaminate {
                    name: m.name.clone(),
                    plies: vec![Ply {
                        material: m.clone(),
                        thickness: panel_thickness,
                        angle_deg: 0.0,
                    }],
                };
                laminate_section(&laminate)
            }
            Material::Composite(m) => laminate_section(m),
            Material::Sandwich(m) => {
                let eq = m.equivalent();
                SectionProperties {
                    thickness: eq.thickness,
                    density: eq.density,
                    elastic_modulus: eq.elastic_modulus,
                    poissons_ratio: eq.poissons_ratio,
                    bending: BendingStiffness::isotropic(
                        eq.elastic_modulus,
                        eq.poissons_ratio,
                        eq.thickness,
                    ),
                }
            }
        };
        Ok(section)
    }

    /// Ply stack for multi-ply property cards; `None` for isotropic material.
    pub fn ply_stack(&self, panel_thickness: f64) -> Option<Vec<Ply>> {
        match self {
            Material::Isotropic(_) => None,
            Material::Orthotropic(m) => Some(vec![Ply {
                material: m.clone(),
                thickness: panel_thickness,
                angle_deg: 0.0,
            }]),
            Material::Composite(m) => Some(m.plies.clone()),
            Material::Sandwich(m) => {
                let face = Ply {
                    material: m.face.as_orthotropic(),
                    thickness: m.face_thickness,
                    angle_deg: 0.0,
                };
                let core = Ply {
                    material: m.core.as_orthotropic(),
                    thickness: m.core_thickness,
                    angle_deg: 0.0,
                };
                Some(vec![face.clone(), core, face])
            }
        }
    }
}

fn laminate_section(laminate: &CompositeLaminate) -> SectionProperties {
    let h = laminate.total_thickness();
    let bending = BendingStiffness::from_matrix(&laminate.bending_matrix());
    let d_ref = bending.reference();
    let nu = (bending.d12 / d_ref).clamp(0.0, 0.49);
    SectionProperties {
        thickness: h,
        density: laminate.density(),
        elastic_modulus: 12.0 * d_ref * (1.0 - nu * nu) / h.powi(3),
        poissons_ratio: nu,
        bending,
    }
}
