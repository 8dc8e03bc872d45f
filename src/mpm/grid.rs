use super::MpmParameters;
use crate::{Scalar, Vec2};
use na::Vector2;

/// The background grid: one node per cell of an n x n lattice over the unit
/// square. The whole thing is scratch state -- it is zeroed at the top of
/// every substep and carries nothing across substeps.
pub struct MpmGrid {
    /// Node momentum while P2G is scattering; the same storage is divided by
    /// mass in place during the grid update and read back as velocity by G2P.
    pub velocity: Vec<Vec2>,
    pub mass: Vec<Scalar>,
    pub data: GridData,
}

impl MpmGrid {
    pub fn new(params: &MpmParameters) -> Self {
        let data = GridData::new(params.grid_resolution);

        tracing::info!(
            size = data.size,
            num_nodes = data.num_nodes,
            dx = data.dx,
            "allocated background grid"
        );

        Self {
            velocity: vec![Vec2::zeros(); data.num_nodes],
            mass: vec![0.; data.num_nodes],
            data,
        }
    }

    /// Fills both node arrays with zeros.
    pub fn clear(&mut self) {
        self.velocity.fill(Vec2::zeros());
        self.mass.fill(0.);
    }

    pub fn total_mass(&self) -> Scalar {
        self.mass.iter().sum()
    }

    pub fn total_momentum(&self) -> Vec2 {
        self.velocity.iter().sum()
    }
}

/// Metadata for the grid: side length and the coordinate maps.
#[derive(Debug, Clone)]
pub struct GridData {
    /// Number of nodes along each axis.
    pub size: usize,
    /// `size * size`.
    pub num_nodes: usize,
    /// The grid spacing, 1 / size.
    pub dx: Scalar,
    /// Reciprocal of the grid spacing.
    pub inv_dx: Scalar,
}

impl GridData {
    pub fn new(size: usize) -> GridData {
        GridData {
            size,
            num_nodes: size * size,
            dx: 1. / size as Scalar,
            inv_dx: size as Scalar,
        }
    }

    pub fn coord_to_index(&self, coord: Vector2<usize>) -> usize {
        coord.x * self.size + coord.y
    }

    pub fn index_to_coord(&self, i: usize) -> Vector2<usize> {
        Vector2::new(i / self.size, i % self.size)
    }

    /// Index for a (possibly out-of-bounds) stencil node. `None` keeps the
    /// transfer loops from touching nodes outside the domain.
    pub fn node_index(&self, coord: Vector2<i32>) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 || coord.x >= self.size as i32 || coord.y >= self.size as i32
        {
            return None;
        }
        Some(self.coord_to_index(Vector2::new(coord.x as usize, coord.y as usize)))
    }

    /// World-space position of a node.
    pub fn node_position(&self, coord: Vector2<usize>) -> Vec2 {
        coord.cast::<Scalar>() * self.dx
    }
}
