use crate::render::{Scene, Vertex};
use wgpu::{Device, Queue, RenderPipeline, Surface, SwapChain, SwapChainDescriptor};
use winit::window::Window;

/// Contains all of the `wgpu` related state
pub struct State {
    pub surface: Surface,
    pub device: Device,
    pub queue: Queue,
    pub sc_desc: SwapChainDescriptor,
    pub swap_chain: SwapChain,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub render_pipeline: Option<RenderPipeline>,
}

impl State {
    // Creating some of the wgpu types requires async code
    pub async fn new(window: &Window) -> Self {
        let instance = wgpu::Instance::new(wgpu::BackendBit::PRIMARY);

        // SAFETY: the window outlives the surface; it is only dropped when
        // the event loop (and with it this State) goes away.
        let surface = unsafe { instance.create_surface(window) };
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: Default::default(),
                compatible_surface: Some(&surface),
            })
            .await
            .expect("No compatible graphics adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Default device"),
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                },
                None, // Trace path
            )
            .await
            .expect("Failed to create device");

        let size = window.inner_size();
        let sc_desc = SwapChainDescriptor {
            usage: wgpu::TextureUsage::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
        };
        let swap_chain = device.create_swap_chain(&surface, &sc_desc);

        Self {
            surface,
            device,
            queue,
            sc_desc,
            swap_chain,
            size,
            render_pipeline: None,
        }
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.size = new_size;
        self.sc_desc.width = new_size.width;
        self.sc_desc.height = new_size.height;
        self.swap_chain = self.device.create_swap_chain(&self.surface, &self.sc_desc);
    }

    /// Uploads the current frame's vertices and view transform.
    pub fn update(&mut self, scene: &mut Scene, verts: &[Vertex]) {
        scene.uniforms.update_view_proj(&scene.camera);
        self.queue.write_buffer(
            &scene.uniform_state.buffer,
            0,
            bytemuck::cast_slice(&[scene.uniforms]),
        );

        self.queue
            .write_buffer(&scene.vertex_buffer, 0, bytemuck::cast_slice(verts));
    }

    pub fn render(&mut self, scene: &Scene) -> Result<(), wgpu::SwapChainError> {
        let frame = self.swap_chain.get_current_frame()?.output;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass Descriptor"),
            color_attachments: &[wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: scene.clear_color[0] as f64,
                        g: scene.clear_color[1] as f64,
                        b: scene.clear_color[2] as f64,
                        a: 1.0,
                    }),
                    store: true,
                },
            }],
            depth_stencil_attachment: None,
        });

        let device = &self.device;
        let render_pipeline = self
            .render_pipeline
            .get_or_insert_with(|| create_render_pipeline(device, scene));

        render_pass.set_pipeline(render_pipeline);

        render_pass.set_vertex_buffer(0, scene.vertex_buffer.slice(..));
        render_pass.set_bind_group(0, &scene.uniform_state.bind_group, &[]);
        render_pass.draw(0..scene.num_particles, 0..1);

        drop(render_pass);

        self.queue.submit(std::iter::once(encoder.finish()));

        Ok(())
    }
}

fn create_render_pipeline(device: &Device, scene: &Scene) -> RenderPipeline {
    let vs_module = device.create_shader_module(&wgpu::include_spirv!("../shader.vert.spv"));
    let fs_module = device.create_shader_module(&wgpu::include_spirv!("../shader.frag.spv"));

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Render Pipeline Layout"),
        bind_group_layouts: &[&scene.uniform_state.bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Render Pipeline"),
        layout: Some(&render_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vs_module,
            entry_point: "main",
            buffers: &[Vertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &fs_module,
            entry_point: "main",
            targets: &[wgpu::ColorTargetState {
                format: wgpu::TextureFormat::Bgra8UnormSrgb, // NOTE: Don't hardcode this
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrite::ALL,
            }],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::PointList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
    })
}
