use tracing::debug;

use crate::{
    error::Error,
    gl::{Capabilities, GlBackend, texture::Texture},
};

/// Offscreen render target for a clipping mask: a framebuffer whose color
/// attachment 0 is always `texture`.
#[derive(Debug)]
#[must_use = "call `delete(gl)` to free GPU resources"]
pub(crate) struct ClippingMask<G: GlBackend> {
    framebuffer: G::Framebuffer,
    texture: Texture<G>,
}

impl<G: GlBackend> ClippingMask<G> {
    /// Allocates a blank `width` x `height` texture and a framebuffer
    /// rendering into it. The host's framebuffer binding is left untouched.
    pub(crate) fn new(gl: &G, caps: &Capabilities, width: i32, height: i32) -> Result<Self, Error> {
        if width <= 0 || height <= 0 {
            return Err(Error::invalid_mask_size(width, height));
        }

        let texture = Texture::blank(gl, caps, width, height)?;
        let framebuffer = match gl.create_framebuffer() {
            Ok(framebuffer) => framebuffer,
            Err(_) => {
                texture.delete(gl);
                return Err(Error::framebuffer_creation_failed());
            },
        };

        let previous = gl.get_parameter_framebuffer(glow::FRAMEBUFFER_BINDING);
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
        attach(gl, Some(texture.gl_texture()));
        let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
        gl.bind_framebuffer(glow::FRAMEBUFFER, previous);

        if status != glow::FRAMEBUFFER_COMPLETE {
            gl.delete_framebuffer(framebuffer);
            texture.delete(gl);
            return Err(Error::framebuffer_incomplete(status));
        }

        debug!(?framebuffer, width, height, "clipping mask created");
        Ok(Self { framebuffer, texture })
    }

    /// Replaces the backing texture with a blank one of the new size. The
    /// framebuffer handle stays the same.
    pub(crate) fn resize(
        &mut self,
        gl: &G,
        caps: &Capabilities,
        width: i32,
        height: i32,
    ) -> Result<(), Error> {
        if width <= 0 || height <= 0 {
            return Err(Error::invalid_mask_size(width, height));
        }

        // allocated first so a failure leaves the mask intact
        let texture = Texture::blank(gl, caps, width, height)?;

        let previous = gl.get_parameter_framebuffer(glow::FRAMEBUFFER_BINDING);
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));
        attach(gl, None);
        std::mem::replace(&mut self.texture, texture).delete(gl);
        attach(gl, Some(self.texture.gl_texture()));
        gl.bind_framebuffer(glow::FRAMEBUFFER, previous);

        debug!(framebuffer = ?self.framebuffer, width, height, "clipping mask resized");
        Ok(())
    }

    pub(crate) fn framebuffer(&self) -> G::Framebuffer {
        self.framebuffer
    }

    pub(crate) fn texture(&self) -> &Texture<G> {
        &self.texture
    }

    pub(crate) fn size(&self) -> (i32, i32) {
        self.texture.size()
    }

    /// Deletes the framebuffer, then its texture.
    pub(crate) fn delete(self, gl: &G) {
        debug!(framebuffer = ?self.framebuffer, "clipping mask deleted");
        gl.delete_framebuffer(self.framebuffer);
        self.texture.delete(gl);
    }
}

fn attach<G: GlBackend>(gl: &G, texture: Option<G::Texture>) {
    gl.framebuffer_texture_2d(
        glow::FRAMEBUFFER,
        glow::COLOR_ATTACHMENT0,
        glow::TEXTURE_2D,
        texture,
        0,
    );
}
