use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

use futures::executor::block_on;
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod camera;
mod scene;
mod state;

pub use camera::Camera;
pub use scene::{Scene, Vertex};
pub use state::State;

use crate::initial_condition::InitialCondition;
use crate::mpm::{Material, MpmSimulation};
use crate::statistics::SimulationStatistics;
use crate::SimulationConfig;

/// Fixed point colors for the three materials.
pub fn material_color(material: Material) -> [f32; 3] {
    match material {
        Material::Fluid => [0.212, 0.933, 1.],
        Material::Jelly => [0.988, 0.631, 0.247],
        Material::Snow => [0.933, 0.933, 0.941],
    }
}

/// Where the frames shown in the window come from: a live simulation thread,
/// or a directory of previously dumped frames (looped).
pub enum FrameSource {
    Live(Receiver<Vec<Vertex>>),
    Playback { files: Vec<PathBuf>, next: usize },
}

impl FrameSource {
    pub fn playback(files: Vec<PathBuf>) -> FrameSource {
        FrameSource::Playback { files, next: 0 }
    }

    /// The next frame to display, if one is available. A live source that has
    /// gone quiet (simulation still working, or stopped) keeps the previous
    /// frame on screen.
    fn next_frame(&mut self) -> eyre::Result<Option<Vec<Vertex>>> {
        match self {
            FrameSource::Live(rx) => match rx.try_recv() {
                Ok(verts) => Ok(Some(verts)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
            },
            FrameSource::Playback { files, next } => {
                if files.is_empty() {
                    return Ok(None);
                }
                let path = &files[*next % files.len()];
                *next += 1;

                let file = std::fs::File::open(path)?;
                Ok(Some(rmp_serde::decode::from_read(file)?))
            }
        }
    }
}

/// Spawns the simulation on its own thread and returns the channel it
/// delivers each frame's vertices on. The thread stops when the stop channel
/// fires or disconnects, when the vertex receiver goes away, or when the
/// simulation diverges; the driver checks for all three exactly once per
/// frame.
pub fn start_simulation(config: SimulationConfig, stop_rx: Receiver<()>) -> Receiver<Vec<Vertex>> {
    let (vert_tx, vert_rx) = channel();

    std::thread::spawn(move || {
        let mut sim = MpmSimulation::new(config.parameters);
        for block in &config.scene {
            block.add_particles(&mut sim);
        }
        tracing::info!(
            particles = sim.params.num_particles,
            mass = sim.total_mass(),
            "seeded simulation"
        );

        loop {
            match stop_rx.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => break,
            }

            let verts = match sim.simulate_frame() {
                Ok(verts) => verts,
                Err(err) => {
                    tracing::error!("simulation halted: {:#}", err);
                    break;
                }
            };

            tracing::debug!(
                time = sim.total_time(),
                kinetic_energy = sim.total_kinetic_energy(),
                momentum = ?sim.total_linear_momentum(),
                angular_momentum = sim.total_angular_momentum(),
                volume = sim.total_volume(),
                "frame statistics"
            );

            if vert_tx.send(verts).is_err() {
                break;
            }
        }
    });

    vert_rx
}

/// Opens the window and draws frames from `source` until it is closed or
/// Escape is pressed. Closing drops the live receiver, which is what tells
/// the simulation thread to stop.
pub fn open_window(mut source: FrameSource) -> eyre::Result<()> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("mpm simulator")
        .build(&event_loop)?;

    let mut state = block_on(State::new(&window));

    // Block for the first frame so the vertex buffer can be sized for it.
    let mut verts = match &mut source {
        FrameSource::Live(rx) => rx.recv()?,
        playback => playback
            .next_frame()?
            .ok_or_else(|| eyre::eyre!("no frames to display"))?,
    };

    let mut scene = Scene::new(&state.device, &verts, state.size);

    event_loop.run(move |event, _, control_flow| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == window.id() => match event {
            WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
            WindowEvent::KeyboardInput { input, .. } => match input {
                KeyboardInput {
                    state: ElementState::Pressed,
                    virtual_keycode: Some(VirtualKeyCode::Escape),
                    ..
                } => *control_flow = ControlFlow::Exit,
                _ => {}
            },
            WindowEvent::Resized(physical_size) => {
                state.resize(*physical_size);
                scene.camera.resize(physical_size.width, physical_size.height);
            }
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                // new_inner_size is &&mut so we have to dereference it twice
                state.resize(**new_inner_size);
                scene
                    .camera
                    .resize(new_inner_size.width, new_inner_size.height);
            }
            _ => {}
        },
        Event::RedrawRequested(_) => {
            if let Ok(Some(next)) = source.next_frame() {
                verts = next;
            }

            state.update(&mut scene, &verts);
            match state.render(&scene) {
                Ok(_) => {}
                // Recreate the swap_chain if lost
                Err(wgpu::SwapChainError::Lost) => state.resize(state.size),
                // The system is out of memory, we should probably quit
                Err(wgpu::SwapChainError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                // All other errors (Outdated, Timeout) should be resolved by the next frame
                Err(e) => tracing::warn!("render error: {:?}", e),
            }
        }
        Event::MainEventsCleared => {
            // RedrawRequested will only trigger once, unless we manually
            // request it.
            window.request_redraw();
        }
        _ => {}
    });
}
