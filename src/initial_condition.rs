use crate::mpm::{Material, MpmSimulation};
use crate::util::RangeExt;
use crate::{Scalar, Vec2};
use itertools::iproduct;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::Range;

/// Something that can seed particles into a fresh simulation.
pub trait InitialCondition {
    fn add_particles(&self, sim: &mut MpmSimulation);
}

/// How particles are distributed inside a block. There is deliberately no
/// unseeded variant: `Lattice` is fully deterministic and `Scatter` carries
/// its seed, so any scene can be reproduced exactly.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Placement {
    /// Evenly spaced rows and columns. Used by the tests, where the particle
    /// positions need to be exact.
    Lattice { spacing: Scalar },
    /// `count` uniform samples from a seeded generator. What the interactive
    /// scenes use; different seeds give different pours of the same block.
    Scatter { count: usize, seed: u64 },
}

/// An axis-aligned block of one material.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MaterialBlock {
    pub material: Material,
    pub region: Range<Vec2>,
    pub placement: Placement,
}

impl InitialCondition for MaterialBlock {
    fn add_particles(&self, sim: &mut MpmSimulation) {
        let min = self.region.start;
        let size = self.region.size();

        match self.placement {
            Placement::Lattice { spacing } => {
                let counts = (size / spacing).map(|x| x.ceil() as usize);

                for (i, j) in iproduct!(0..counts.x, 0..counts.y) {
                    let offset = Vec2::new(
                        (i as Scalar + 0.5) * size.x / counts.x as Scalar,
                        (j as Scalar + 0.5) * size.y / counts.y as Scalar,
                    );
                    sim.add_particle(min + offset, self.material);
                }
            }
            Placement::Scatter { count, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);

                for _ in 0..count {
                    let u: Scalar = rng.gen();
                    let v: Scalar = rng.gen();
                    sim.add_particle(min + Vec2::new(u * size.x, v * size.y), self.material);
                }
            }
        }
    }
}

/// The canonical three-material scene: a wide pool of fluid low in the
/// domain, a jelly block above it on the left, a snow block higher up on the
/// right. Two thirds of the particles are fluid, the rest split evenly.
pub fn three_material_scene(num_particles: usize, seed: u64) -> Vec<MaterialBlock> {
    let sixth = num_particles / 6;

    vec![
        MaterialBlock {
            material: Material::Fluid,
            region: Vec2::new(0.35, 0.05)..Vec2::new(0.65, 0.35),
            placement: Placement::Scatter {
                count: num_particles - 2 * sixth,
                seed,
            },
        },
        MaterialBlock {
            material: Material::Jelly,
            region: Vec2::new(0.3, 0.45)..Vec2::new(0.45, 0.6),
            placement: Placement::Scatter {
                count: sixth,
                seed: seed.wrapping_add(1),
            },
        },
        MaterialBlock {
            material: Material::Snow,
            region: Vec2::new(0.55, 0.6)..Vec2::new(0.7, 0.75),
            placement: Placement::Scatter {
                count: sixth,
                seed: seed.wrapping_add(2),
            },
        },
    ]
}
