/// A fixed orthographic view of the unit square the simulation lives in.
/// There is nothing to orbit in 2D; all the camera does is letterbox the
/// domain into whatever aspect ratio the window has.
#[derive(Debug)]
pub struct Camera {
    aspect: f32,
}

/// Half-extent of the view around the domain center, leaving a small margin
/// around the walls.
const HALF_EXTENT: f32 = 0.55;

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn build_view_projection_matrix(&self) -> na::Matrix4<f32> {
        // wgpu clip space has z in [0, 1] where OpenGL has [-1, 1].
        #[rustfmt::skip]
        pub const OPENGL_TO_WGPU_MATRIX: na::Matrix4<f32> = na::Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.0,
            0.0, 0.0, 0.5, 1.0,
        );

        let (half_width, half_height) = if self.aspect >= 1. {
            (HALF_EXTENT * self.aspect, HALF_EXTENT)
        } else {
            (HALF_EXTENT, HALF_EXTENT / self.aspect)
        };

        let proj = na::Matrix4::new_orthographic(
            0.5 - half_width,
            0.5 + half_width,
            0.5 - half_height,
            0.5 + half_height,
            -1.,
            1.,
        );

        OPENGL_TO_WGPU_MATRIX * proj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_corners_stay_in_clip_space() {
        for &(w, h) in &[(800, 600), (600, 800), (512, 512)] {
            let camera = Camera::new(w, h);
            let m = camera.build_view_projection_matrix();

            for &(x, y) in &[(0., 0.), (1., 0.), (0., 1.), (1., 1.)] {
                let clip = m * na::Vector4::new(x, y, 0., 1.);
                assert!(clip.x.abs() <= 1. && clip.y.abs() <= 1., "({}, {})", x, y);
                assert!(clip.z >= 0. && clip.z <= 1.);
            }
        }
    }
}
