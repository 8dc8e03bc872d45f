use super::Material;
use crate::{Mat2, Scalar, Vec2};

/// All of the particle data, stored column-wise: position, velocity, the
/// affine velocity matrix, deformation state, material. Particles are created
/// once during seeding and never destroyed.
#[derive(Default)]
pub struct MpmParticles {
    pub mass: Vec<Scalar>,
    pub position: Vec<Vec2>,
    pub velocity: Vec<Vec2>,
    /// The local affine velocity field (APIC's C matrix).
    pub affine_velocity: Vec<Mat2>,
    pub deformation_gradient: Vec<Mat2>,
    /// Accumulated plastic volume ratio (Jp). Stays 1 for everything but snow.
    pub plastic_ratio: Vec<Scalar>,
    pub material: Vec<Material>,
}

impl MpmParticles {
    /// Adds a new particle at rest: identity deformation gradient, zero
    /// velocity, no accumulated plasticity.
    pub(crate) fn add_particle(&mut self, mass: Scalar, position: Vec2, material: Material) {
        self.mass.push(mass);
        self.position.push(position);
        self.velocity.push(Vec2::zeros());
        self.affine_velocity.push(Mat2::zeros());
        self.deformation_gradient.push(Mat2::identity());
        self.plastic_ratio.push(1.);
        self.material.push(material);
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn total_mass(&self) -> Scalar {
        self.mass.iter().sum()
    }

    pub fn total_momentum(&self) -> Vec2 {
        self.mass
            .iter()
            .zip(&self.velocity)
            .map(|(&m, v)| m * v)
            .sum()
    }

    /// The divergence check run between substeps: a non-finite particle state
    /// or a degenerate deformation gradient means the integration has blown
    /// up, and continuing would just smear NaNs over the whole domain.
    /// Reports the first offending particle.
    pub fn validate(&self) -> eyre::Result<()> {
        for p in 0..self.len() {
            let finite = self.position[p].iter().all(|x| x.is_finite())
                && self.velocity[p].iter().all(|x| x.is_finite())
                && self.deformation_gradient[p].iter().all(|x| x.is_finite())
                && self.plastic_ratio[p].is_finite();

            if !finite {
                eyre::bail!(
                    "non-finite state on particle {} ({:?}): position {:?}, velocity {:?}",
                    p,
                    self.material[p],
                    self.position[p],
                    self.velocity[p],
                );
            }

            let det = self.deformation_gradient[p].determinant();
            if det <= 0. {
                eyre::bail!(
                    "degenerate deformation gradient on particle {} ({:?}): det F = {}",
                    p,
                    self.material[p],
                    det,
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_particles_are_at_rest() {
        let mut particles = MpmParticles::default();
        particles.add_particle(1., Vec2::new(0.5, 0.5), Material::Jelly);

        assert_eq!(particles.len(), 1);
        assert_eq!(particles.velocity[0], Vec2::zeros());
        assert_eq!(particles.deformation_gradient[0], Mat2::identity());
        assert_eq!(particles.plastic_ratio[0], 1.);
        assert!(particles.validate().is_ok());
    }

    #[test]
    fn validate_reports_the_offending_particle() {
        let mut particles = MpmParticles::default();
        particles.add_particle(1., Vec2::new(0.4, 0.4), Material::Fluid);
        particles.add_particle(1., Vec2::new(0.6, 0.6), Material::Snow);
        particles.velocity[1] = Vec2::new(Scalar::NAN, 0.);

        let err = particles.validate().unwrap_err().to_string();
        assert!(err.contains("particle 1"), "{}", err);
        assert!(err.contains("Snow"), "{}", err);
    }

    #[test]
    fn validate_rejects_inverted_elements() {
        let mut particles = MpmParticles::default();
        particles.add_particle(1., Vec2::new(0.4, 0.4), Material::Jelly);
        particles.deformation_gradient[0] = Mat2::new(1., 0., 0., -0.5);

        let err = particles.validate().unwrap_err().to_string();
        assert!(err.contains("det F"), "{}", err);
    }
}
