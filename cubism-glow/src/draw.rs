//! Per-call draw parameters handed over by the host's rendering manager.

use crate::{
    Mat4,
    error::Error,
    gl::{MaskHandle, TextureHandle},
};

/// How a drawable composes onto what is already in the framebuffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source-over with premultiplied alpha.
    #[default]
    Normal,
    /// Additive; leaves destination alpha untouched.
    Add,
    /// Multiplies the destination color by the source.
    Multiply,
}

impl BlendMode {
    /// `glBlendFuncSeparate` factors as `[src_rgb, dst_rgb, src_alpha, dst_alpha]`.
    #[must_use]
    pub const fn blend_factors(self) -> [u32; 4] {
        match self {
            Self::Normal => [glow::ONE, glow::ONE_MINUS_SRC_ALPHA, glow::ONE, glow::ONE_MINUS_SRC_ALPHA],
            Self::Add => [glow::ONE, glow::ONE, glow::ZERO, glow::ONE],
            Self::Multiply => [glow::DST_COLOR, glow::ONE_MINUS_SRC_ALPHA, glow::ZERO, glow::ONE],
        }
    }
}

/// Blend factors while drawing into a clipping mask. Each mask drawable
/// multiplies into the white-cleared target, so overlapping drawables
/// intersect.
pub(crate) const MASK_BLEND_FACTORS: [u32; 4] =
    [glow::ZERO, glow::ONE_MINUS_SRC_COLOR, glow::ZERO, glow::ONE_MINUS_SRC_ALPHA];

/// Channel of an RGBA mask texture that holds a particular mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MaskChannel {
    #[default]
    R,
    G,
    B,
    A,
}

impl MaskChannel {
    /// Value for the `u_channelFlag` uniform.
    #[must_use]
    pub const fn flag(self) -> [f32; 4] {
        match self {
            Self::R => [1.0, 0.0, 0.0, 0.0],
            Self::G => [0.0, 1.0, 0.0, 0.0],
            Self::B => [0.0, 0.0, 1.0, 0.0],
            Self::A => [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// One drawable of the model, drawn onto the host framebuffer.
#[derive(Debug, Clone, Copy)]
pub struct MeshDraw<'a> {
    pub texture: TextureHandle,
    /// Positions as `x, y` pairs.
    pub vertices: &'a [f32],
    /// Texture coordinates as `u, v` pairs, one per vertex.
    pub uvs: &'a [f32],
    /// Triangle list.
    pub indices: &'a [u16],
    pub blend_mode: BlendMode,
    pub use_culling: bool,
    /// Clamped to `[0, 1]` when drawn.
    pub opacity: f32,
    /// Mask clipping this drawable, if any.
    pub clipping_mask: Option<MaskHandle>,
    pub mask_channel: MaskChannel,
    /// Maps drawable positions into the mask's texture space.
    pub clip_matrix: Mat4,
    /// Draw only where the mask is empty.
    pub is_inverted_mask: bool,
}

impl<'a> MeshDraw<'a> {
    /// An opaque, unmasked, non-culled drawable with normal blending.
    #[must_use]
    pub fn new(
        texture: TextureHandle,
        vertices: &'a [f32],
        uvs: &'a [f32],
        indices: &'a [u16],
    ) -> Self {
        Self {
            texture,
            vertices,
            uvs,
            indices,
            blend_mode: BlendMode::Normal,
            use_culling: false,
            opacity: 1.0,
            clipping_mask: None,
            mask_channel: MaskChannel::R,
            clip_matrix: Mat4::identity(),
            is_inverted_mask: false,
        }
    }

    #[must_use]
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    #[must_use]
    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.use_culling = enabled;
        self
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: MaskHandle, channel: MaskChannel, clip_matrix: Mat4) -> Self {
        self.clipping_mask = Some(mask);
        self.mask_channel = channel;
        self.clip_matrix = clip_matrix;
        self
    }

    #[must_use]
    pub fn with_inverted_mask(mut self, inverted: bool) -> Self {
        self.is_inverted_mask = inverted;
        self
    }
}

/// One masking drawable, drawn into a clipping mask during a mask pass.
#[derive(Debug, Clone, Copy)]
pub struct MaskDraw<'a> {
    pub mask: MaskHandle,
    pub texture: TextureHandle,
    pub vertices: &'a [f32],
    pub uvs: &'a [f32],
    pub indices: &'a [u16],
    pub channel: MaskChannel,
    pub clip_matrix: Mat4,
    pub use_culling: bool,
    /// Accepted for symmetry with [`MeshDraw`]; inversion is applied when
    /// the mask is consumed.
    pub is_inverted_mask: bool,
}

impl<'a> MaskDraw<'a> {
    #[must_use]
    pub fn new(
        mask: MaskHandle,
        texture: TextureHandle,
        vertices: &'a [f32],
        uvs: &'a [f32],
        indices: &'a [u16],
    ) -> Self {
        Self {
            mask,
            texture,
            vertices,
            uvs,
            indices,
            channel: MaskChannel::R,
            clip_matrix: Mat4::identity(),
            use_culling: false,
            is_inverted_mask: false,
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: MaskChannel) -> Self {
        self.channel = channel;
        self
    }

    #[must_use]
    pub fn with_clip_matrix(mut self, clip_matrix: Mat4) -> Self {
        self.clip_matrix = clip_matrix;
        self
    }

    #[must_use]
    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.use_culling = enabled;
        self
    }
}

/// Rejects geometry that would draw garbage or read out of bounds. An empty
/// index buffer is a valid, empty triangle list.
pub(crate) fn validate_geometry(vertices: &[f32], uvs: &[f32], indices: &[u16]) -> Result<(), Error> {
    if vertices.len() % 2 != 0 {
        return Err(Error::invalid_geometry(format!(
            "vertex buffer holds {} floats, expected x/y pairs",
            vertices.len()
        )));
    }
    if uvs.len() != vertices.len() {
        return Err(Error::invalid_geometry(format!(
            "{} uv floats for {} vertex floats",
            uvs.len(),
            vertices.len()
        )));
    }
    if indices.len() % 3 != 0 {
        return Err(Error::invalid_geometry(format!(
            "index buffer of length {} is not a triangle list",
            indices.len()
        )));
    }

    let vertex_count = vertices.len() / 2;
    if let Some(&max) = indices.iter().max()
        && usize::from(max) >= vertex_count
    {
        return Err(Error::invalid_geometry(format!(
            "index {max} out of range for {vertex_count} vertices"
        )));
    }

    Ok(())
}

/// Color multiplied into every texel of a drawable: the model color with its
/// alpha scaled by `opacity`, premultiplied if requested.
pub(crate) fn base_color(model_color: [f32; 4], opacity: f32, premultiplied: bool) -> [f32; 4] {
    let [r, g, b, a] = model_color;
    let alpha = a * opacity.clamp(0.0, 1.0);

    if premultiplied { [r * alpha, g * alpha, b * alpha, alpha] } else { [r, g, b, alpha] }
}

/// Model color supplied by the host, falling back to opaque white when it
/// is absent or malformed.
pub(crate) fn model_color(color: Option<&[f32]>) -> [f32; 4] {
    match color {
        Some(&[r, g, b, a]) => [r, g, b, a],
        _ => [1.0, 1.0, 1.0, 1.0],
    }
}
