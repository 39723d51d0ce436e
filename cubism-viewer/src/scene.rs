use std::{f32::consts::TAU, time::Instant};

use cubism_glow::{
    BlendMode, CubismRenderer, Error, MaskChannel, MaskDraw, MaskHandle, Mat4, MeshDraw,
    TextureHandle,
};

/// Model canvas side, in model units.
const CANVAS_SIZE: f32 = 2.0;

/// Unit quad centred on the origin, as counter-clockwise triangles.
const QUAD: [f32; 8] = [-0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, 0.5];
const QUAD_UVS: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// Corners of the rotating mask polygon.
const MASK_SIDES: u16 = 6;

/// A two-layer puppet: a dimmed backdrop, the same texture clipped by a
/// rotating hexagon, and a pulsing additive highlight.
pub struct Scene {
    texture: TextureHandle,
    mask: MaskHandle,
    invert_mask: bool,
    started: Instant,
}

impl Scene {
    pub fn new(
        renderer: &mut impl CubismRenderer,
        texture_png: &[u8],
        invert_mask: bool,
    ) -> Result<Self, Error> {
        let texture = renderer.create_texture(texture_png)?;
        let mask = match renderer.create_clipping_mask() {
            Ok(mask) => mask,
            Err(err) => {
                renderer.dispose_texture(texture)?;
                return Err(err);
            },
        };

        tracing::info!(
            texture_size = ?renderer.texture_size(texture),
            mask_size = ?renderer.mask_size(mask),
            "scene loaded"
        );

        Ok(Self { texture, mask, invert_mask, started: Instant::now() })
    }

    /// Draws one frame into the currently bound framebuffer. A failed
    /// drawable is logged and the remaining ones are still drawn.
    pub fn draw(&self, renderer: &mut impl CubismRenderer, viewport: (u32, u32)) -> Result<(), Error> {
        let (width, height) = viewport;
        let mvp = Mat4::aspect_correction(width as f32, height as f32)
            * Mat4::fit_model(CANVAS_SIZE, CANVAS_SIZE);

        renderer.start_drawing_model(None, &mvp)?;
        self.draw_model(renderer);
        renderer.end_drawing_model();
        Ok(())
    }

    fn draw_model(&self, renderer: &mut impl CubismRenderer) {
        let seconds = self.started.elapsed().as_secs_f32();

        // the quad spans [-0.5, 0.5]; the mask covers exactly that area
        let mask_matrix = Mat4::from_scale(2.0, 2.0);
        let draw_matrix =
            Mat4::from_translation(0.5, 0.5) * Mat4::from_scale(0.5, 0.5) * mask_matrix;

        let (vertices, uvs) = polygon(MASK_SIDES, 0.35, seconds * 0.8);
        let indices = fan_indices(MASK_SIDES);
        let mask_draw = MaskDraw::new(self.mask, self.texture, &vertices, &uvs, &indices)
            .with_clip_matrix(mask_matrix);

        match renderer.start_drawing_mask(self.mask) {
            Ok(()) => {
                log_failure("mask", renderer.draw_mask(&mask_draw));
                log_failure("mask", renderer.end_drawing_mask(self.mask));
            },
            Err(err) => log_failure("mask", Err(err)),
        }

        let backdrop = MeshDraw::new(self.texture, &QUAD, &QUAD_UVS, &QUAD_INDICES);
        let masked = backdrop
            .with_mask(self.mask, MaskChannel::R, draw_matrix)
            .with_inverted_mask(self.invert_mask)
            .with_culling(true);

        let pulse = 0.5 + 0.5 * (seconds * 2.0).sin();
        let highlight = backdrop.with_blend_mode(BlendMode::Add).with_opacity(pulse * 0.3);

        for (drawable, draw) in [
            ("backdrop", backdrop.with_opacity(0.25)),
            ("masked", masked),
            ("highlight", highlight),
        ] {
            log_failure(drawable, renderer.draw_mesh(&draw));
        }
    }

    /// Returns the scene's texture and mask to the renderer.
    pub fn dispose(self, renderer: &mut impl CubismRenderer) -> Result<(), Error> {
        renderer.dispose_clipping_mask(self.mask)?;
        renderer.dispose_texture(self.texture)
    }
}

fn log_failure(drawable: &'static str, result: Result<(), Error>) {
    if let Err(err) = result {
        tracing::debug!(drawable, %err, "drawable skipped");
    }
}

/// Regular polygon as a centre vertex plus `sides` rim vertices, with UVs
/// mapping the `[-0.5, 0.5]` square onto the texture.
fn polygon(sides: u16, radius: f32, rotation: f32) -> (Vec<f32>, Vec<f32>) {
    let rim = (0..sides).map(|i| {
        let angle = rotation + TAU * f32::from(i) / f32::from(sides);
        (radius * angle.cos(), radius * angle.sin())
    });

    let points: Vec<(f32, f32)> = std::iter::once((0.0, 0.0)).chain(rim).collect();
    let vertices = points.iter().flat_map(|&(x, y)| [x, y]).collect();
    let uvs = points.iter().flat_map(|&(x, y)| [x + 0.5, y + 0.5]).collect();
    (vertices, uvs)
}

fn fan_indices(sides: u16) -> Vec<u16> {
    (0..sides).flat_map(|i| [0, 1 + i, 1 + (i + 1) % sides]).collect()
}
