use super::grid::MpmGrid;
use super::MpmParameters;
use crate::parallel::{Backend, MIN_CHUNK};
use crate::{Scalar, Vec2};
use rayon::prelude::*;

/// Turns the scattered momenta into velocities, applies gravity, and
/// enforces the domain walls. Each node only touches its own state.
///
/// A node that received no mass stays at rest -- skipping it is what guards
/// the division. The walls are one-sided: a node in the three cells nearest
/// an edge keeps its velocity unless the component points out through that
/// edge, which models a no-penetration boundary without sticking.
pub fn grid_update(grid: &mut MpmGrid, params: &MpmParameters) {
    let dt = params.delta_time;
    let gravity = params.gravity;
    let data = grid.data.clone();

    let kernel = move |i: usize, velocity: &mut Vec2, mass: Scalar| {
        if mass <= 0. {
            return;
        }

        // Momentum becomes velocity in place.
        *velocity /= mass;
        velocity.y -= dt * gravity;

        let coord = data.index_to_coord(i);
        let last = data.size - 3;

        if coord.x < 3 && velocity.x < 0. {
            velocity.x = 0.;
        }
        if coord.x > last && velocity.x > 0. {
            velocity.x = 0.;
        }
        if coord.y < 3 && velocity.y < 0. {
            velocity.y = 0.;
        }
        if coord.y > last && velocity.y > 0. {
            velocity.y = 0.;
        }
    };

    match params.backend {
        Backend::Sequential => {
            for (i, (velocity, mass)) in grid.velocity.iter_mut().zip(&grid.mass).enumerate() {
                kernel(i, velocity, *mass);
            }
        }
        Backend::Threaded => {
            grid.velocity
                .par_iter_mut()
                .zip(grid.mass.par_iter())
                .enumerate()
                .with_min_len(MIN_CHUNK)
                .for_each(|(i, (velocity, mass))| kernel(i, velocity, *mass));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;
    use na::Vector2;

    fn filled_grid(params: &MpmParameters) -> MpmGrid {
        let mut grid = MpmGrid::new(params);
        // Every node gets unit mass and momentum pointing down-left, so every
        // wall has some outward component to reject.
        for i in 0..grid.data.num_nodes {
            grid.mass[i] = 1.;
            grid.velocity[i] = Vec2::new(-0.5, -1.);
        }
        grid
    }

    #[test]
    fn momentum_becomes_velocity_with_gravity() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let mut grid = MpmGrid::new(&params);

        let center = grid.data.coord_to_index(Vector2::new(64, 64));
        grid.mass[center] = 2.;
        grid.velocity[center] = Vec2::new(4., 2.);

        grid_update(&mut grid, &params);

        let expected = Vec2::new(2., 1. - params.delta_time * params.gravity);
        assert!((grid.velocity[center] - expected).norm() < 1e-6);
    }

    #[test]
    fn massless_nodes_stay_at_rest() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let mut grid = MpmGrid::new(&params);

        grid_update(&mut grid, &params);

        assert!(grid.velocity.iter().all(|v| *v == Vec2::zeros()));
    }

    #[test]
    fn walls_reject_outward_velocity() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            ..MpmParameters::default()
        };
        let mut grid = filled_grid(&params);

        grid_update(&mut grid, &params);

        let n = grid.data.size;
        for (x, y) in iproduct!(0..n, 0..n) {
            let v = grid.velocity[grid.data.coord_to_index(Vector2::new(x, y))];

            if x < 3 {
                assert!(v.x >= 0., "outward x at ({}, {}): {:?}", x, y, v);
            }
            if x > n - 3 {
                assert!(v.x <= 0., "outward x at ({}, {}): {:?}", x, y, v);
            }
            if y < 3 {
                assert!(v.y >= 0., "outward y at ({}, {}): {:?}", x, y, v);
            }
            if y > n - 3 {
                assert!(v.y <= 0., "outward y at ({}, {}): {:?}", x, y, v);
            }
        }
    }

    #[test]
    fn walls_keep_inward_velocity() {
        let params = MpmParameters {
            backend: Backend::Sequential,
            gravity: 0.,
            ..MpmParameters::default()
        };
        let mut grid = MpmGrid::new(&params);

        // Inward-pointing velocity at the left wall survives untouched.
        let edge = grid.data.coord_to_index(Vector2::new(1, 64));
        grid.mass[edge] = 1.;
        grid.velocity[edge] = Vec2::new(0.25, 0.);

        grid_update(&mut grid, &params);

        assert!((grid.velocity[edge] - Vec2::new(0.25, 0.)).norm() < 1e-6);
    }
}
