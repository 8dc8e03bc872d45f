mod g2p;
mod grid;
mod grid_update;
mod models;
mod p2g;
mod parameters;
mod particles;
mod weights;

pub use grid::{GridData, MpmGrid};
pub use models::{constitutive_update, ConstitutiveUpdate, IsotropicParameters, Material};
pub use parameters::MpmParameters;
pub use particles::MpmParticles;

use crate::render::{material_color, Vertex};
use crate::Vec2;

/// Contains all of the state for the Material Point Method simulation.
pub struct MpmSimulation {
    pub particles: MpmParticles,
    pub grid: MpmGrid,
    pub params: MpmParameters,
    /// Total simulated time so far.
    pub time: crate::Scalar,
}

impl MpmSimulation {
    /// Creates a new, empty simulation with the given parameters.
    pub fn new(params: MpmParameters) -> MpmSimulation {
        MpmSimulation {
            particles: MpmParticles::default(),
            grid: MpmGrid::new(&params),
            params,
            time: 0.,
        }
    }

    /// Adds a particle of the given material, at rest.
    pub fn add_particle(&mut self, position: Vec2, material: Material) {
        self.params.num_particles += 1;
        self.particles
            .add_particle(self.params.particle_mass(), position, material);
    }

    /// One full time step: clear the grid, scatter, update the grid, gather.
    /// The stages run strictly in order; no stage starts until the previous
    /// one has finished for every particle or node.
    pub fn substep(&mut self) -> eyre::Result<()> {
        self.grid.clear();
        p2g::particle_to_grid(&mut self.particles, &mut self.grid, &self.params);
        grid_update::grid_update(&mut self.grid, &self.params);
        g2p::grid_to_particle(&mut self.particles, &self.grid, &self.params);

        self.time += self.params.delta_time;

        if self.params.validate {
            self.particles.validate()?;
        }

        Ok(())
    }

    /// Advances one rendered frame's worth of substeps and returns the
    /// vertices handed to the viewer. The viewer only ever observes state
    /// between substeps.
    pub fn simulate_frame(&mut self) -> eyre::Result<Vec<Vertex>> {
        for _ in 0..self.params.substeps_per_frame() {
            self.substep()?;
        }

        tracing::debug!(
            time = self.time,
            particles = self.params.num_particles,
            "finished frame"
        );

        Ok(self.create_verts())
    }

    /// Returns an array of `Vertex`es, to be passed to the `render` module:
    /// one point per particle, colored by its material.
    fn create_verts(&self) -> Vec<Vertex> {
        self.particles
            .position
            .iter()
            .zip(&self.particles.material)
            .map(|(pos, &material)| Vertex {
                position: [pos.x, pos.y, 0.],
                color: material_color(material),
            })
            .collect()
    }
}
