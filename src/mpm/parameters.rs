use super::IsotropicParameters;
use crate::parallel::Backend;
use crate::Scalar;

/// The high-level parameters for the simulation. Everything here is fixed at
/// initialization; nothing in the pipeline mutates it at runtime.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MpmParameters {
    /// The total number of Lagrangian particles in the simulation. Updated as
    /// particles are seeded, constant afterwards.
    pub num_particles: usize,
    /// Number of grid nodes along each axis of the unit square; the cell size
    /// is its reciprocal.
    pub grid_resolution: usize,
    /// The size of the time step. Larger time steps simulate faster but go
    /// unstable well before they go inaccurate at these stiffnesses.
    pub delta_time: Scalar,
    /// Wall-clock time covered by one rendered frame; each frame runs
    /// `frame_time / delta_time` substeps.
    pub frame_time: Scalar,
    /// Downward gravitational acceleration.
    pub gravity: Scalar,
    /// Rest density shared by all materials; particle mass derives from it.
    pub rest_density: Scalar,
    /// Shared elastic baseline (Young's modulus / Poisson's ratio) that the
    /// per-material hardening scales.
    pub elasticity: IsotropicParameters,
    /// How the per-particle and per-node loops execute.
    pub backend: Backend,
    /// Check particle state for divergence after every substep.
    pub validate: bool,
}

impl MpmParameters {
    pub fn cell_size(&self) -> Scalar {
        1. / self.grid_resolution as Scalar
    }

    /// Initial volume of one particle, a quarter cell.
    pub fn particle_volume(&self) -> Scalar {
        let half_dx = 0.5 * self.cell_size();
        half_dx * half_dx
    }

    pub fn particle_mass(&self) -> Scalar {
        self.particle_volume() * self.rest_density
    }

    pub fn substeps_per_frame(&self) -> usize {
        (self.frame_time / self.delta_time) as usize
    }
}

impl Default for MpmParameters {
    fn default() -> Self {
        MpmParameters {
            num_particles: 0,
            grid_resolution: 128,
            delta_time: 1e-4,
            frame_time: 2e-3,
            gravity: 70.,
            rest_density: 1.,
            elasticity: IsotropicParameters::default(),
            backend: Backend::default(),
            validate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_quantities() {
        let params = MpmParameters::default();

        assert_eq!(params.cell_size(), 1. / 128.);
        assert_eq!(params.substeps_per_frame(), 20);

        let half_dx = params.cell_size() / 2.;
        assert!((params.particle_volume() - half_dx * half_dx).abs() < 1e-12);
        assert_eq!(params.particle_mass(), params.particle_volume());
    }
}
