use tracing::debug;

use crate::{
    error::Error,
    gl::{Capabilities, GlBackend},
};

/// A 2D RGBA texture with linear filtering and clamp-to-edge wrapping.
///
/// Deleted through [`Texture::delete`], which consumes it.
#[derive(Debug)]
#[must_use = "call `delete(gl)` to free GPU resources"]
pub(crate) struct Texture<G: GlBackend> {
    gl_texture: G::Texture,
    /// Texture dimensions (width, height)
    dimensions: (i32, i32),
}

impl<G: GlBackend> Texture<G> {
    /// Decodes `bytes` with the `image` crate and uploads the pixels.
    pub(crate) fn from_image_bytes(gl: &G, caps: &Capabilities, bytes: &[u8]) -> Result<Self, Error> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| Error::image_decode_failed(&err))?
            .to_rgba8();

        let (width, height) = image.dimensions();
        let too_large = || Error::image_too_large(width, height);
        let width = i32::try_from(width).map_err(|_| too_large())?;
        let height = i32::try_from(height).map_err(|_| too_large())?;

        Self::create(gl, caps, width, height, Some(image.as_raw()))
    }

    /// Allocates an uninitialized texture, e.g. as a render target.
    pub(crate) fn blank(gl: &G, caps: &Capabilities, width: i32, height: i32) -> Result<Self, Error> {
        Self::create(gl, caps, width, height, None)
    }

    fn create(
        gl: &G,
        caps: &Capabilities,
        width: i32,
        height: i32,
        pixels: Option<&[u8]>,
    ) -> Result<Self, Error> {
        let gl_texture = gl.create_texture().map_err(|_| Error::texture_creation_failed())?;

        // uploads go through the active unit; hand its binding back afterwards
        let previous_texture = gl.get_parameter_texture(glow::TEXTURE_BINDING_2D);
        let previous_alignment = gl.get_parameter_i32(glow::UNPACK_ALIGNMENT);

        gl.bind_texture(glow::TEXTURE_2D, Some(gl_texture));
        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            caps.rgba_internal_format(),
            width,
            height,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            pixels,
        );
        Self::setup_sampling(gl);

        gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, previous_alignment);
        gl.bind_texture(glow::TEXTURE_2D, previous_texture);

        debug!(?gl_texture, width, height, "texture created");
        Ok(Self { gl_texture, dimensions: (width, height) })
    }

    fn setup_sampling(gl: &G) {
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    }

    /// Binds the texture to `unit`, leaving `unit` active.
    pub(crate) fn bind(&self, gl: &G, unit: u32) {
        gl.active_texture(glow::TEXTURE0 + unit);
        gl.bind_texture(glow::TEXTURE_2D, Some(self.gl_texture));
    }

    pub(crate) fn gl_texture(&self) -> G::Texture {
        self.gl_texture
    }

    pub(crate) fn size(&self) -> (i32, i32) {
        self.dimensions
    }

    pub(crate) fn delete(self, gl: &G) {
        debug!(gl_texture = ?self.gl_texture, "texture deleted");
        gl.delete_texture(self.gl_texture);
    }
}
