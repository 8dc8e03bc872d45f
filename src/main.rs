mod initial_condition;
mod mpm;
mod parallel;
mod render;
mod statistics;
mod util;

extern crate nalgebra as na;

use crate::initial_condition::{three_material_scene, MaterialBlock};
use crate::mpm::MpmParameters;

use std::path::PathBuf;
use std::sync::mpsc::channel;

use structopt::StructOpt;

type Scalar = f32;
type Vec2 = na::Vector2<Scalar>;
type Mat2 = na::Matrix2<Scalar>;

/// Everything needed to reproduce a run: the solver parameters and the scene
/// the particles are seeded from. This is what the JSON config file
/// deserializes into.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimulationConfig {
    pub parameters: MpmParameters,
    pub scene: Vec<MaterialBlock>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            parameters: MpmParameters::default(),
            scene: three_material_scene(10_000, 0),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = "mpm_simulator")]
struct Opt {
    /// JSON file holding a `SimulationConfig`; defaults to the canonical
    /// three-material scene.
    #[structopt(short, long)]
    config: Option<PathBuf>,
    /// Replay a directory of previously dumped frames instead of simulating.
    #[structopt(short, long)]
    playback: Option<PathBuf>,
    /// Simulate without a window and dump frames into this directory.
    #[structopt(short, long)]
    output_dir: Option<PathBuf>,
    /// How many frames to dump in headless mode.
    #[structopt(short, long, default_value = "600")]
    frames: usize,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = Opt::from_args();

    use eyre::WrapErr;

    let config: SimulationConfig = match &opt.config {
        Some(path) => std::fs::read(path)
            .wrap_err_with(|| format!("Failed to read config file: {:?}", path))
            .and_then(|json| {
                serde_json::from_slice(&json).wrap_err("Serde failed to deserialize config JSON.")
            })?,
        None => SimulationConfig::default(),
    };

    if let Some(input_dir) = opt.playback {
        let mut files = std::fs::read_dir(input_dir)?
            .filter_map(|entry| Some(entry.ok()?.path()))
            .collect::<Vec<_>>();
        files.sort();

        render::open_window(render::FrameSource::playback(files))
    } else if let Some(output_dir) = opt.output_dir {
        let (stop_tx, stop_rx) = channel();
        let vert_rx = render::start_simulation(config, stop_rx);

        for frame in 0..opt.frames {
            let verts = vert_rx
                .recv()
                .wrap_err("Simulation stopped before finishing")?;

            let mut path = output_dir.clone();
            path.push(format!("{:03}.dat", frame));
            let mut writer = std::fs::File::create(&path)?;
            rmp_serde::encode::write(&mut writer, &verts)?;

            tracing::info!(frame, path = %path.display(), "wrote frame");
        }

        drop(stop_tx);
        Ok(())
    } else {
        tracing::info!("displaying simulation in a window");

        let (_stop_tx, stop_rx) = channel();
        let vert_rx = render::start_simulation(config, stop_rx);

        render::open_window(render::FrameSource::Live(vert_rx))
    }
}
