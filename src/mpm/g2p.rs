use super::grid::MpmGrid;
use super::particles::MpmParticles;
use super::weights::{outer, spline_weights};
use super::MpmParameters;
use crate::parallel::{Backend, MIN_CHUNK};
use crate::{Mat2, Vec2};
use itertools::{iproduct, izip};
use rayon::prelude::*;

/// Grid-to-particle transfer: gather the updated node velocities back onto
/// the particles, rebuild the local affine velocity field, and advect.
///
/// The stencil weights are recomputed from the particle's current position --
/// they must match the nodes the particle scattered to this substep, and the
/// position only changes at the very end of this stage. Reads are shared,
/// writes are particle-local, so there is no hazard on either backend.
pub fn grid_to_particle(particles: &mut MpmParticles, grid: &MpmGrid, params: &MpmParameters) {
    let dt = params.delta_time;
    let data = &grid.data;
    let node_velocity = &grid.velocity;

    let kernel = move |(position, velocity, affine_velocity): (&mut Vec2, &mut Vec2, &mut Mat2)| {
        let weights = spline_weights(*position, data.inv_dx);

        let mut v_pic = Vec2::zeros();
        let mut affine = Mat2::zeros();

        for (i, j) in iproduct!(0..3, 0..3) {
            let idx = match data.node_index(weights.node(i, j)) {
                Some(idx) => idx,
                None => continue,
            };

            let weight = weights.weight(i, j);
            let v = node_velocity[idx];

            v_pic += weight * v;
            // APIC reconstruction, C = 4/dx^2 sum w v dpos^T. The offset is
            // in grid units, which absorbs one factor of dx.
            affine += 4. * data.inv_dx * weight * outer(v, weights.dpos(i, j));
        }

        *velocity = v_pic;
        *affine_velocity = affine;
        *position += dt * v_pic;
    };

    match params.backend {
        Backend::Sequential => izip!(
            &mut particles.position,
            &mut particles.velocity,
            &mut particles.affine_velocity
        )
        .for_each(kernel),
        Backend::Threaded => (
            particles.position.par_iter_mut(),
            particles.velocity.par_iter_mut(),
            particles.affine_velocity.par_iter_mut(),
        )
            .into_par_iter()
            .with_min_len(MIN_CHUNK)
            .for_each(kernel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpm::{Material, MpmGrid};
    use crate::Scalar;

    #[test]
    fn uniform_field_transfers_exactly() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let mut grid = MpmGrid::new(&params);
        let uniform = Vec2::new(0.2, -0.1);
        for v in &mut grid.velocity {
            *v = uniform;
        }

        let mut particles = MpmParticles::default();
        let start = Vec2::new(0.53, 0.47);
        particles.add_particle(params.particle_mass(), start, Material::Fluid);

        grid_to_particle(&mut particles, &grid, &params);

        // Partition of unity makes the gather exact, and a constant field has
        // no velocity gradient for the affine matrix to pick up.
        assert!((particles.velocity[0] - uniform).norm() < 1e-5);
        assert!(particles.affine_velocity[0].norm() < 1e-3);

        let expected = start + params.delta_time * uniform;
        assert!((particles.position[0] - expected).norm() < 1e-6);
    }

    #[test]
    fn linear_field_recovers_gradient() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let mut grid = MpmGrid::new(&params);

        // v(x) = (0.5 y, -0.25 x): a pure rotation/shear field.
        for i in 0..grid.data.num_nodes {
            let pos = grid.data.node_position(grid.data.index_to_coord(i));
            grid.velocity[i] = Vec2::new(0.5 * pos.y, -0.25 * pos.x);
        }

        let mut particles = MpmParticles::default();
        particles.add_particle(params.particle_mass(), Vec2::new(0.5, 0.5), Material::Jelly);

        grid_to_particle(&mut particles, &grid, &params);

        // The affine matrix approximates the velocity gradient of the field.
        let c = particles.affine_velocity[0];
        let expected = Mat2::new(0., 0.5, -0.25, 0.);
        assert!((c - expected).norm() < 1e-2, "C = {:?}", c);
    }

    #[test]
    fn gather_is_zero_on_an_empty_grid() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let grid = MpmGrid::new(&params);

        let mut particles = MpmParticles::default();
        particles.add_particle(params.particle_mass(), Vec2::new(0.3, 0.8), Material::Snow);
        particles.velocity[0] = Vec2::new(1., 1.);

        grid_to_particle(&mut particles, &grid, &params);

        assert_eq!(particles.velocity[0], Vec2::zeros());
        assert_eq!(particles.affine_velocity[0], Mat2::zeros());
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

        let mut grid = MpmGrid::new(&sequential);
        for i in 0..grid.data.num_nodes {
            let pos = grid.data.node_position(grid.data.index_to_coord(i));
            grid.velocity[i] = Vec2::new(pos.y.sin(), pos.x.cos());
        }

        let seed = |params: &MpmParameters| {
            let mut particles = MpmParticles::default();
            for i in 0..300 {
                let t = i as Scalar / 300.;
                particles.add_particle(
                    params.particle_mass(),
                    Vec2::new(0.2 + 0.6 * t, 0.8 - 0.6 * t),
                    Material::Fluid,
                );
            }
            particles
        };

        let mut a = seed(&sequential);
        let mut b = seed(&threaded);

        grid_to_particle(&mut a, &grid, &sequential);
        grid_to_particle(&mut b, &grid, &threaded);

        for (va, vb) in a.velocity.iter().zip(&b.velocity) {
            assert!((va - vb).norm() < 1e-6);
        }
    }
}
