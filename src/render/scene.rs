/// This module contains all of the _data_ that is going to be sent to the
/// GPU: the vertex buffer, the uniforms, the clear color, and the camera.
use crate::render::Camera;
use wgpu::util::DeviceExt;

pub struct Scene {
    pub clear_color: [f32; 3],
    pub camera: Camera,
    pub num_particles: u32,
    pub vertex_buffer: wgpu::Buffer,
    pub uniforms: Uniforms,
    pub uniform_state: UniformState,
}

impl Scene {
    pub fn new(device: &wgpu::Device, verts: &[Vertex], size: winit::dpi::PhysicalSize<u32>) -> Self {
        let camera = Camera::new(size.width, size.height);
        let mut uniforms = Uniforms::default();
        uniforms.update_view_proj(&camera);

        let uniform_state = UniformState::new(device, uniforms);

        Self {
            clear_color: [0., 0., 0.],
            camera,
            num_particles: verts.len() as u32,
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(verts),
                usage: wgpu::BufferUsage::VERTEX | wgpu::BufferUsage::COPY_DST,
            }),
            uniforms,
            uniform_state,
        }
    }
}

/// One rendered point: a particle position (z is always 0) and its material
/// color. This is also the frame format written by the headless mode.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    bytemuck::Pod,
    bytemuck::Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRS: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::InputStepMode::Vertex,
            attributes: &ATTRS,
        }
    }
}

// We need this for Rust to store our data correctly for the shaders
#[repr(C)]
// This is so we can store this in a buffer
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    // nalgebra matrices can't go in a buffer directly, so the Matrix4 gets
    // converted to a plain 4x4 array
    pub(super) view_proj: [[f32; 4]; 4],
    pub(super) u_point_size: f32,
    pub(super) _padding: [f32; 3],
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            view_proj: na::Matrix4::identity().into(),
            u_point_size: 3.,
            _padding: [0.; 3],
        }
    }
}

impl Uniforms {
    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_view_projection_matrix().into();
    }
}

/// This contains all of the GPU-associated state relating to uniforms,
/// including the buffer and the bind group
pub struct UniformState {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl UniformState {
    fn new(device: &wgpu::Device, uniforms: Uniforms) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsage::UNIFORM | wgpu::BufferUsage::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStage::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    min_binding_size: None,
                    has_dynamic_offset: false,
                },
                count: None,
            }],
            label: Some("uniform_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        UniformState {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}
