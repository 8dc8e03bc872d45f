use super::grid::{GridData, MpmGrid};
use super::models::{self, Material};
use super::particles::MpmParticles;
use super::weights::spline_weights;
use super::MpmParameters;
use crate::parallel::{Backend, MIN_CHUNK};
use crate::{Mat2, Scalar, Vec2};
use itertools::{iproduct, izip};
use rayon::prelude::*;

/// Particle-to-grid transfer. Two passes: a hazard-free per-particle pass
/// that advances the deformation gradient and evaluates the constitutive
/// model, then the scatter of mass and momentum onto the 3x3 node
/// neighborhoods.
pub fn particle_to_grid(particles: &mut MpmParticles, grid: &mut MpmGrid, params: &MpmParameters) {
    let affine = affine_contributions(particles, &grid.data, params);
    scatter(particles, &affine, grid, params);
}

/// Pushes each deformation gradient forward through the local affine field,
/// runs the constitutive update, and returns the matrix scattered below:
/// the stress scaled into a force contribution, plus mass times C.
/// Each particle only touches its own state, so both backends run this as a
/// straight map.
fn affine_contributions(
    particles: &mut MpmParticles,
    data: &GridData,
    params: &MpmParameters,
) -> Vec<Mat2> {
    let dt = params.delta_time;
    // MLS-MPM turns the stress into a force increment with -dt vol 4/dx^2.
    let stress_coeff = -dt * params.particle_volume() * 4. * data.inv_dx * data.inv_dx;
    let elasticity = &params.elasticity;

    let kernel = move |(&mass, c, f, jp, &material): (
        &Scalar,
        &Mat2,
        &mut Mat2,
        &mut Scalar,
        &Material,
    )|
          -> Mat2 {
        *f = (Mat2::identity() + dt * *c) * *f;

        let update = models::constitutive_update(material, *f, *jp, elasticity);
        *f = update.deformation_gradient;
        *jp = update.plastic_ratio;

        stress_coeff * update.stress + mass * *c
    };

    match params.backend {
        Backend::Sequential => izip!(
            &particles.mass,
            &particles.affine_velocity,
            &mut particles.deformation_gradient,
            &mut particles.plastic_ratio,
            &particles.material
        )
        .map(kernel)
        .collect(),
        Backend::Threaded => (
            particles.mass.par_iter(),
            particles.affine_velocity.par_iter(),
            particles.deformation_gradient.par_iter_mut(),
            particles.plastic_ratio.par_iter_mut(),
            particles.material.par_iter(),
        )
            .into_par_iter()
            .with_min_len(MIN_CHUNK)
            .map(kernel)
            .collect(),
    }
}

/// The scatter itself. This is the one write-write hazard in the pipeline:
/// neighboring particles share grid nodes. The sequential backend just
/// accumulates in particle order; the threaded backend gives each rayon
/// worker its own momentum/mass buffers and merges them pairwise, which is
/// associative up to floating-point summation order.
fn scatter(
    particles: &MpmParticles,
    affine: &[Mat2],
    grid: &mut MpmGrid,
    params: &MpmParameters,
) {
    match params.backend {
        Backend::Sequential => {
            for p in 0..particles.len() {
                scatter_particle(
                    p,
                    particles,
                    affine,
                    &grid.data,
                    &mut grid.velocity,
                    &mut grid.mass,
                );
            }
        }
        Backend::Threaded => {
            let data = grid.data.clone();
            let num_nodes = data.num_nodes;
            let empty = || (vec![Vec2::zeros(); num_nodes], vec![0.; num_nodes]);

            let (momentum, mass) = (0..particles.len())
                .into_par_iter()
                .with_min_len(MIN_CHUNK)
                .fold(empty, |mut local, p| {
                    scatter_particle(p, particles, affine, &data, &mut local.0, &mut local.1);
                    local
                })
                .reduce(empty, |mut a, b| {
                    for (node, v) in a.0.iter_mut().zip(&b.0) {
                        *node += v;
                    }
                    for (node, m) in a.1.iter_mut().zip(&b.1) {
                        *node += m;
                    }
                    a
                });

            for (node, v) in grid.velocity.iter_mut().zip(&momentum) {
                *node += v;
            }
            for (node, m) in grid.mass.iter_mut().zip(&mass) {
                *node += m;
            }
        }
    }
}

fn scatter_particle(
    p: usize,
    particles: &MpmParticles,
    affine: &[Mat2],
    data: &GridData,
    momentum: &mut [Vec2],
    mass: &mut [Scalar],
) {
    let weights = spline_weights(particles.position[p], data.inv_dx);
    let particle_mass = particles.mass[p];
    let particle_momentum = particle_mass * particles.velocity[p];

    for (i, j) in iproduct!(0..3, 0..3) {
        let idx = match data.node_index(weights.node(i, j)) {
            Some(idx) => idx,
            None => continue,
        };

        let weight = weights.weight(i, j);
        let dpos = weights.dpos(i, j) * data.dx;

        momentum[idx] += weight * (particle_momentum + affine[p] * dpos);
        mass[idx] += weight * particle_mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpm::grid::MpmGrid;

    fn interior_lattice(params: &MpmParameters, material: Material) -> MpmParticles {
        let mut particles = MpmParticles::default();
        for i in 0..10 {
            for j in 0..10 {
                let pos = Vec2::new(0.3 + 0.04 * i as Scalar, 0.3 + 0.04 * j as Scalar);
                particles.add_particle(params.particle_mass(), pos, material);
            }
        }
        particles
    }

    #[test]
    fn scatter_conserves_mass_and_momentum() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let mut particles = interior_lattice(&params, Material::Jelly);
        for v in &mut particles.velocity {
            *v = Vec2::new(0.3, -0.1);
        }
        let mut grid = MpmGrid::new(&params);

        particle_to_grid(&mut particles, &mut grid, &params);

        assert!((grid.total_mass() - particles.total_mass()).abs() < 1e-5);
        assert!((grid.total_momentum() - particles.total_momentum()).norm() < 1e-5);
    }

    #[test]
    fn at_rest_particle_scatters_no_momentum() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let mut particles = MpmParticles::default();
        particles.add_particle(params.particle_mass(), Vec2::new(0.5, 0.5), Material::Snow);
        let mut grid = MpmGrid::new(&params);

        particle_to_grid(&mut particles, &mut grid, &params);

        assert!(grid.total_mass() > 0.);
        assert!(grid.total_momentum().norm() < 1e-10);
        assert!((particles.deformation_gradient[0] - Mat2::identity()).norm() < 1e-6);
    }

    #[test]
    fn backends_agree_within_tolerance() {
        let sequential = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let threaded = MpmParameters {
            backend: Backend::Threaded,
            ..sequential.clone()
        };

        let mut particles_a = interior_lattice(&sequential, Material::Fluid);
        let mut particles_b = interior_lattice(&threaded, Material::Fluid);
        for (i, v) in particles_a.velocity.iter_mut().enumerate() {
            *v = Vec2::new(0.01 * i as Scalar, -0.02 * i as Scalar);
        }
        particles_b.velocity = particles_a.velocity.clone();

        let mut grid_a = MpmGrid::new(&sequential);
        let mut grid_b = MpmGrid::new(&threaded);

        particle_to_grid(&mut particles_a, &mut grid_a, &sequential);
        particle_to_grid(&mut particles_b, &mut grid_b, &threaded);

        for (a, b) in grid_a.velocity.iter().zip(&grid_b.velocity) {
            assert!((a - b).norm() < 1e-5);
        }
        for (a, b) in grid_a.mass.iter().zip(&grid_b.mass) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
