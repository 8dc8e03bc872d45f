use crate::{Mat2, Scalar, Vec2};

/// The material carried by a particle, fixed for the particle's lifetime.
///
/// All material-dependent behavior in the pipeline goes through the three
/// methods below plus `constitutive_update`; the transfer stages themselves
/// never branch on the material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Material {
    /// Inviscid liquid: no shear resistance, volume changes resisted by the
    /// lambda term only.
    Fluid,
    /// Purely elastic solid with softened, plasticity-free stiffness.
    Jelly,
    /// Elastoplastic granular material with singular-value yield and
    /// plastic hardening.
    Snow,
}

/// Snow yields once a principal stretch leaves this interval.
const SNOW_STRETCH_MIN: Scalar = 1. - 2.5e-2;
const SNOW_STRETCH_MAX: Scalar = 1. + 4.5e-3;

impl Material {
    /// Lame parameters for the current plastic state. Hardening stiffens the
    /// material exponentially as it is plastically compressed (Jp < 1) and
    /// softens it when stretched, clamped to [0.1, 5].
    pub fn hardening(
        &self,
        plastic_ratio: Scalar,
        elasticity: &IsotropicParameters,
    ) -> (Scalar, Scalar) {
        let h = match self {
            Material::Jelly => 0.3,
            _ => (10. * (1. - plastic_ratio)).exp().clamp(0.1, 5.),
        };

        let mu = match self {
            Material::Fluid => 0.,
            _ => elasticity.mu * h,
        };

        (mu, elasticity.lambda * h)
    }

    /// Plastic yield on the principal stretches.
    pub fn clamp_singular_values(&self, sigma: Vec2) -> Vec2 {
        match self {
            Material::Snow => sigma.map(|s| s.clamp(SNOW_STRETCH_MIN, SNOW_STRETCH_MAX)),
            _ => sigma,
        }
    }

    /// Rebuild the deformation gradient after the yield step.
    #[allow(non_snake_case)]
    pub fn reconstruct(&self, F: Mat2, U: &Mat2, sigma: Vec2, V_t: &Mat2, J: Scalar) -> Mat2 {
        match self {
            // Shape memory is discarded entirely; only the volume ratio
            // survives, as an isotropic stretch.
            Material::Fluid => Mat2::identity() * J.sqrt(),
            // Keep the elastic part; the strain removed by the clamp has
            // already been folded into Jp.
            Material::Snow => U * Mat2::from_diagonal(&sigma) * V_t,
            Material::Jelly => F,
        }
    }
}

/// Shared elastic baseline: Young's modulus and Poisson's ratio, with the
/// Lame parameters they imply.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IsotropicParameters {
    pub youngs_modulus: Scalar,
    pub poissons_ratio: Scalar,
    pub mu: Scalar,
    pub lambda: Scalar,
}

impl IsotropicParameters {
    pub fn new(youngs_modulus: Scalar, poissons_ratio: Scalar) -> Self {
        let mut base = Self {
            youngs_modulus,
            poissons_ratio,
            mu: 0.,
            lambda: 0.,
        };
        base.recalculate_lame_parameters();
        base
    }

    pub fn recalculate_lame_parameters(&mut self) {
        self.mu = self.youngs_modulus / (2. * (1. + self.poissons_ratio));
        self.lambda = self.youngs_modulus * self.poissons_ratio
            / ((1. + self.poissons_ratio) * (1. - 2. * self.poissons_ratio));
    }
}

impl Default for IsotropicParameters {
    fn default() -> Self {
        Self::new(1000., 0.2)
    }
}

/// Result of one constitutive evaluation.
pub struct ConstitutiveUpdate {
    pub deformation_gradient: Mat2,
    pub plastic_ratio: Scalar,
    /// Fixed corotated stress, 2 mu (F - R) F^T + lambda J (J - 1) I.
    /// P2G scales this by the (negative) timestep/volume factor to get the
    /// grid force contribution.
    pub stress: Mat2,
}

/// Runs the plasticity and stress update for one particle: yields the
/// principal stretches, accumulates the plastic volume ratio, rebuilds F,
/// and evaluates the fixed corotated stress.
#[allow(non_snake_case)]
pub fn constitutive_update(
    material: Material,
    F: Mat2,
    plastic_ratio: Scalar,
    elasticity: &IsotropicParameters,
) -> ConstitutiveUpdate {
    let svd = F.svd(true, true);
    let U = svd.u.unwrap();
    let V_t = svd.v_t.unwrap();

    let sigma = Vec2::from(svd.singular_values);
    let clamped = material.clamp_singular_values(sigma);

    // Volume squeezed out by the clamp moves from the elastic state into the
    // plastic ratio.
    let plastic_ratio = plastic_ratio * (sigma.x / clamped.x) * (sigma.y / clamped.y);
    let J = clamped.x * clamped.y;

    let (mu, lambda) = material.hardening(plastic_ratio, elasticity);
    let F = material.reconstruct(F, &U, clamped, &V_t, J);

    let R = U * V_t;
    let stress = 2. * mu * (F - R) * F.transpose() + Mat2::identity() * (lambda * J * (J - 1.));

    ConstitutiveUpdate {
        deformation_gradient: F,
        plastic_ratio,
        stress,
    }
}
