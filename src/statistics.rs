use crate::mpm::MpmSimulation;
use crate::{Scalar, Vec2};
use itertools::izip;

/// Conserved-quantity diagnostics, handy when deciding whether a blowup is a
/// bug or a timestep problem.
pub trait SimulationStatistics {
    fn total_time(&self) -> Scalar;
    fn total_mass(&self) -> Scalar;
    fn total_linear_momentum(&self) -> Vec2;
    /// The scalar (out-of-plane) angular momentum about the origin.
    fn total_angular_momentum(&self) -> Scalar;
    fn total_kinetic_energy(&self) -> Scalar;
    fn total_volume(&self) -> Scalar;
}

impl SimulationStatistics for MpmSimulation {
    fn total_time(&self) -> Scalar {
        self.time
    }

    fn total_mass(&self) -> Scalar {
        self.particles.total_mass()
    }

    fn total_linear_momentum(&self) -> Vec2 {
        self.particles.total_momentum()
    }

    fn total_angular_momentum(&self) -> Scalar {
        izip!(
            &self.particles.mass,
            &self.particles.velocity,
            &self.particles.position
        )
        .map(|(&m, v, x)| m * (x.x * v.y - x.y * v.x))
        .sum()
    }

    fn total_kinetic_energy(&self) -> Scalar {
        self.particles
            .mass
            .iter()
            .zip(&self.particles.velocity)
            .map(|(&m, v)| 0.5 * m * v.dot(v))
            .sum()
    }

    fn total_volume(&self) -> Scalar {
        let particle_volume = self.params.particle_volume();

        self.particles
            .deformation_gradient
            .iter()
            .map(|f| f.determinant() * particle_volume)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpm::{Material, MpmParameters};
    use crate::parallel::Backend;

    #[test]
    fn totals_on_a_tiny_system() {
        let mut sim = MpmSimulation::new(MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        });
        sim.add_particle(Vec2::new(0.25, 0.5), Material::Fluid);
        sim.add_particle(Vec2::new(0.75, 0.5), Material::Jelly);
        sim.particles.velocity[0] = Vec2::new(0., 1.);
        sim.particles.velocity[1] = Vec2::new(0., -1.);

        let m = sim.params.particle_mass();

        assert!((sim.total_mass() - 2. * m).abs() < 1e-10);
        assert!(sim.total_linear_momentum().norm() < 1e-10);
        assert!((sim.total_kinetic_energy() - m).abs() < 1e-10);
        assert!((sim.total_angular_momentum() + 0.5 * m).abs() < 1e-10);
        assert!((sim.total_volume() - 2. * sim.params.particle_volume()).abs() < 1e-10);
    }
}
