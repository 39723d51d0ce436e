use std::{fmt, rc::Rc};

use tracing::{debug, trace, warn};

use crate::{
    Mat4, RendererConfig,
    draw::{self, MASK_BLEND_FACTORS, MaskDraw, MeshDraw},
    error::Error,
    gl::{
        Capabilities, GlBackend, MaskHandle, TextureHandle,
        buffer::MeshBuffers,
        clipping_mask::ClippingMask,
        context::{FramebufferViewport, StateSnapshot, set_capability},
        debug::GlErrorReporter,
        resources::Registry,
        shaders::ShaderManager,
        texture::Texture,
    },
};

/// Clip rectangle covering the whole of clip space, as `(left, bottom, right, top)`.
const FULL_CLIP_RECT: [f32; 4] = [-1.0, -1.0, 1.0, 1.0];

/// Renderer contract between a Cubism rendering manager and a GPU backend.
///
/// A frame is bracketed by [`start_drawing_model`] and [`end_drawing_model`].
/// Inside the bracket, clipping masks are filled by mask passes
/// ([`start_drawing_mask`], [`draw_mask`], [`end_drawing_mask`]) before the
/// drawables that consume them are drawn with [`draw_mesh`], in host order.
///
/// [`start_drawing_model`]: CubismRenderer::start_drawing_model
/// [`end_drawing_model`]: CubismRenderer::end_drawing_model
/// [`start_drawing_mask`]: CubismRenderer::start_drawing_mask
/// [`draw_mask`]: CubismRenderer::draw_mask
/// [`end_drawing_mask`]: CubismRenderer::end_drawing_mask
/// [`draw_mesh`]: CubismRenderer::draw_mesh
pub trait CubismRenderer {
    /// Decodes an encoded image (PNG) and uploads it as an RGBA texture.
    ///
    /// # Errors
    /// [`Error::Decode`] for bytes that are not a valid image, [`Error::Resource`]
    /// if the texture cannot be created.
    fn create_texture(&mut self, image_bytes: &[u8]) -> Result<TextureHandle, Error>;

    /// Deletes a texture. The handle is never valid again.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for unknown or already disposed handles.
    fn dispose_texture(&mut self, texture: TextureHandle) -> Result<(), Error>;

    /// Size in pixels of a live texture.
    fn texture_size(&self, texture: TextureHandle) -> Option<(i32, i32)>;

    /// Creates a clipping mask of the configured size.
    ///
    /// # Errors
    /// [`Error::Resource`] if the texture or framebuffer cannot be created or
    /// the framebuffer is incomplete.
    fn create_clipping_mask(&mut self) -> Result<MaskHandle, Error>;

    /// Deletes a clipping mask's framebuffer and texture.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for unknown handles, [`Error::Protocol`] for
    /// the target of an open mask pass.
    fn dispose_clipping_mask(&mut self, mask: MaskHandle) -> Result<(), Error>;

    /// Reallocates a clipping mask's texture; its contents are discarded.
    ///
    /// # Errors
    /// [`Error::InvalidHandle`] for unknown handles, [`Error::Protocol`] for
    /// the target of an open mask pass, [`Error::Resource`] for sizes below 1
    /// or allocation failures.
    fn resize_clipping_mask(&mut self, mask: MaskHandle, width: i32, height: i32)
    -> Result<(), Error>;

    /// Size in pixels of a live clipping mask.
    fn mask_size(&self, mask: MaskHandle) -> Option<(i32, i32)>;

    /// Whether textures are composed as premultiplied alpha.
    fn premultiplied_alpha(&self) -> bool;

    /// Switches alpha composition for every following [`draw_mesh`](Self::draw_mesh).
    fn set_premultiplied_alpha(&mut self, enabled: bool);

    /// Captures the host's GL state and prepares the pipeline for a model.
    ///
    /// `model_color` multiplies every drawable; opaque white is used when it
    /// is `None` or not four components long.
    ///
    /// # Errors
    /// [`Error::Protocol`] if a model is already being drawn.
    fn start_drawing_model(&mut self, model_color: Option<&[f32]>, mvp: &Mat4) -> Result<(), Error>;

    /// Redirects rendering into `mask` and clears it.
    ///
    /// # Errors
    /// [`Error::Protocol`] outside a model or while another mask pass is open,
    /// [`Error::InvalidHandle`] for unknown masks.
    fn start_drawing_mask(&mut self, mask: MaskHandle) -> Result<(), Error>;

    /// Draws one masking drawable into the mask of the open mask pass.
    ///
    /// # Errors
    /// [`Error::Protocol`] outside a mask pass or for another mask,
    /// [`Error::InvalidHandle`] for unknown textures,
    /// [`Error::InvalidGeometry`] for undrawable geometry.
    fn draw_mask(&mut self, draw: &MaskDraw<'_>) -> Result<(), Error>;

    /// Closes the mask pass, restoring the framebuffer and viewport it saved.
    ///
    /// # Errors
    /// [`Error::Protocol`] if no pass for `mask` is open.
    fn end_drawing_mask(&mut self, mask: MaskHandle) -> Result<(), Error>;

    /// Draws one drawable onto the host's framebuffer.
    ///
    /// # Errors
    /// [`Error::Protocol`] outside a model or inside a mask pass,
    /// [`Error::InvalidHandle`] for unknown textures or masks,
    /// [`Error::InvalidGeometry`] for undrawable geometry. The renderer stays
    /// usable after any of these.
    fn draw_mesh(&mut self, draw: &MeshDraw<'_>) -> Result<(), Error>;

    /// Restores the GL state captured by [`start_drawing_model`](Self::start_drawing_model).
    /// Without a matching start this only logs a warning.
    fn end_drawing_model(&mut self);
}

/// An open mask pass and the render target it replaced.
struct MaskPass<G: GlBackend> {
    mask: MaskHandle,
    saved: FramebufferViewport<G>,
}

/// State held between `start_drawing_model` and `end_drawing_model`.
struct FrameState<G: GlBackend> {
    snapshot: StateSnapshot<G>,
    model_color: [f32; 4],
    mvp: Mat4,
    mask_pass: Option<MaskPass<G>>,
}

/// [`CubismRenderer`] over an OpenGL (ES) 2.0+ context.
///
/// The renderer owns every texture, mask, buffer and program it creates and
/// deletes them when dropped. The context must be current whenever the
/// renderer is called or dropped.
pub struct GlRenderer<G: GlBackend = glow::Context> {
    gl: Rc<G>,
    caps: Capabilities,
    config: RendererConfig,
    shaders: ShaderManager<G>,
    buffers: MeshBuffers<G>,
    textures: Registry<Texture<G>>,
    masks: Registry<ClippingMask<G>>,
    frame: Option<FrameState<G>>,
    errors: GlErrorReporter,
}

impl<G: GlBackend> GlRenderer<G> {
    /// Detects the context's capabilities and builds every shader variant.
    ///
    /// # Errors
    /// [`Error::Unsupported`] for contexts older than 2.0, shader errors if a
    /// variant fails to build, [`Error::Resource`] if buffers cannot be
    /// created. Nothing is leaked on failure.
    pub fn new(gl: Rc<G>, config: RendererConfig) -> Result<Self, Error> {
        let caps = Capabilities::detect(&*gl)?;
        let glsl_version = config.glsl_version.unwrap_or(caps.glsl_version);

        let shaders = ShaderManager::new(&*gl, glsl_version)?;
        let buffers = match MeshBuffers::new(&*gl, &caps) {
            Ok(buffers) => buffers,
            Err(err) => {
                shaders.delete(&*gl);
                return Err(err);
            },
        };

        debug!(
            version = ?caps.version,
            ?glsl_version,
            vertex_arrays = caps.vertex_arrays,
            premultiplied_alpha = config.premultiplied_alpha,
            "renderer created"
        );

        Ok(Self {
            gl,
            caps,
            config,
            shaders,
            buffers,
            textures: Registry::default(),
            masks: Registry::default(),
            frame: None,
            errors: GlErrorReporter::new(config.check_gl_errors),
        })
    }

    /// What the context supports, as detected at construction.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Construction settings, with the current premultiplied-alpha flag.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Logs a failed call once per distinct error before handing it back.
    fn reported<T>(&mut self, site: &'static str, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            self.errors.report(site, err);
        }
        result
    }

    fn mask_pass_target(&self) -> Option<MaskHandle> {
        self.frame
            .as_ref()
            .and_then(|frame| frame.mask_pass.as_ref())
            .map(|pass| pass.mask)
    }

    fn try_start_drawing_model(
        &mut self,
        model_color: Option<&[f32]>,
        mvp: &Mat4,
    ) -> Result<(), Error> {
        if self.frame.is_some() {
            return Err(Error::model_already_started());
        }

        let gl = &*self.gl;
        let snapshot = StateSnapshot::capture(gl, &self.caps);

        // buffer bindings below land in our own VAO, not the host's
        self.buffers.bind_vertex_array(gl);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

        gl.front_face(glow::CCW);
        gl.disable(glow::SCISSOR_TEST);
        gl.disable(glow::STENCIL_TEST);
        gl.disable(glow::DEPTH_TEST);
        gl.enable(glow::BLEND);
        gl.color_mask(true, true, true, true);

        self.frame = Some(FrameState {
            snapshot,
            model_color: draw::model_color(model_color),
            mvp: *mvp,
            mask_pass: None,
        });
        Ok(())
    }

    fn try_start_drawing_mask(&mut self, mask: MaskHandle) -> Result<(), Error> {
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| Error::outside_model("start_drawing_mask"))?;
        if frame.mask_pass.is_some() {
            return Err(Error::mask_pass_already_started());
        }
        let target = self.masks.get(mask.0).ok_or_else(|| Error::unknown_mask(mask.0))?;

        let gl = &*self.gl;
        let saved = FramebufferViewport::capture(gl);
        let (width, height) = target.size();
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(target.framebuffer()));
        gl.viewport(0, 0, width, height);

        // a mask consumed earlier in the frame may still sit on unit 1
        gl.active_texture(glow::TEXTURE1);
        gl.bind_texture(glow::TEXTURE_2D, None);

        gl.clear_color(1.0, 1.0, 1.0, 1.0);
        gl.clear(glow::COLOR_BUFFER_BIT);

        self.shaders.for_draw_mask().use_program(gl);
        let [src_rgb, dst_rgb, src_alpha, dst_alpha] = MASK_BLEND_FACTORS;
        gl.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);

        trace!(%mask, width, height, "mask pass started");
        frame.mask_pass = Some(MaskPass { mask, saved });
        Ok(())
    }

    fn try_draw_mask(&self, draw: &MaskDraw<'_>) -> Result<(), Error> {
        let frame = self.frame.as_ref().ok_or_else(|| Error::outside_model("draw_mask"))?;
        let pass = frame
            .mask_pass
            .as_ref()
            .ok_or_else(|| Error::outside_mask_pass("draw_mask"))?;
        if pass.mask != draw.mask {
            return Err(Error::mask_pass_mismatch(pass.mask.0, draw.mask.0));
        }
        if draw.indices.is_empty() {
            trace!(mask = %draw.mask, "draw_mask with no triangles");
            return Ok(());
        }

        draw::validate_geometry(draw.vertices, draw.uvs, draw.indices)?;
        let count = index_count(draw.indices)?;
        let texture = self
            .textures
            .get(draw.texture.0)
            .ok_or_else(|| Error::unknown_texture(draw.texture.0))?;

        let gl = &*self.gl;
        set_capability(gl, glow::CULL_FACE, draw.use_culling);

        let program = self.shaders.for_draw_mask();
        let locations = &program.locations;
        program.use_program(gl);
        self.buffers.upload(gl, locations, draw.vertices, draw.uvs, draw.indices);

        texture.bind(gl, 0);
        gl.uniform_1_i32(&locations.texture0, 0);
        if let Some(clip) = &locations.clip {
            gl.uniform_matrix_4_f32_slice(&clip.clip_matrix, draw.clip_matrix.as_slice());
            let [r, g, b, a] = draw.channel.flag();
            gl.uniform_4_f32(&clip.channel_flag, r, g, b, a);
        }
        let [left, bottom, right, top] = FULL_CLIP_RECT;
        gl.uniform_4_f32(&locations.base_color, left, bottom, right, top);

        gl.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, 0);
        Ok(())
    }

    fn try_end_drawing_mask(&mut self, mask: MaskHandle) -> Result<(), Error> {
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| Error::outside_model("end_drawing_mask"))?;

        let pass = match frame.mask_pass.take() {
            Some(pass) if pass.mask == mask => pass,
            Some(pass) => {
                let err = Error::mask_pass_mismatch(pass.mask.0, mask.0);
                frame.mask_pass = Some(pass);
                return Err(err);
            },
            None => return Err(Error::outside_mask_pass("end_drawing_mask")),
        };

        pass.saved.restore(&*self.gl);
        trace!(%mask, "mask pass ended");
        Ok(())
    }

    fn try_draw_mesh(&self, draw: &MeshDraw<'_>) -> Result<(), Error> {
        let frame = self.frame.as_ref().ok_or_else(|| Error::outside_model("draw_mesh"))?;
        if frame.mask_pass.is_some() {
            return Err(Error::inside_mask_pass("draw_mesh"));
        }
        if draw.indices.is_empty() {
            trace!(texture = %draw.texture, "draw_mesh with no triangles");
            return Ok(());
        }

        draw::validate_geometry(draw.vertices, draw.uvs, draw.indices)?;
        let count = index_count(draw.indices)?;
        let texture = self
            .textures
            .get(draw.texture.0)
            .ok_or_else(|| Error::unknown_texture(draw.texture.0))?;
        let mask = draw
            .clipping_mask
            .map(|handle| self.masks.get(handle.0).ok_or_else(|| Error::unknown_mask(handle.0)))
            .transpose()?;

        let gl = &*self.gl;
        let premultiplied = self.config.premultiplied_alpha;

        set_capability(gl, glow::CULL_FACE, draw.use_culling);
        let [src_rgb, dst_rgb, src_alpha, dst_alpha] = draw.blend_mode.blend_factors();
        gl.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);

        let program = self.shaders.for_draw_mesh(mask.is_some(), premultiplied);
        let locations = &program.locations;
        trace!(variant = program.variant.label(), count, "draw_mesh");
        program.use_program(gl);
        self.buffers.upload(gl, locations, draw.vertices, draw.uvs, draw.indices);

        if let Some(mask) = mask
            && let (Some(clip), Some(sampler)) = (&locations.clip, &locations.mask)
        {
            mask.texture().bind(gl, 1);
            gl.uniform_1_i32(&sampler.texture1, 1);
            gl.uniform_matrix_4_f32_slice(&clip.clip_matrix, draw.clip_matrix.as_slice());
            let [r, g, b, a] = draw.mask_channel.flag();
            gl.uniform_4_f32(&clip.channel_flag, r, g, b, a);
            let inverted = if draw.is_inverted_mask { 1.0 } else { 0.0 };
            gl.uniform_1_f32(&sampler.inverted_mask, inverted);
        } else {
            gl.active_texture(glow::TEXTURE1);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        texture.bind(gl, 0);
        gl.uniform_1_i32(&locations.texture0, 0);
        if let Some(matrix) = &locations.matrix {
            gl.uniform_matrix_4_f32_slice(matrix, frame.mvp.as_slice());
        }
        let [r, g, b, a] = draw::base_color(frame.model_color, draw.opacity, premultiplied);
        gl.uniform_4_f32(&locations.base_color, r, g, b, a);

        gl.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, 0);
        Ok(())
    }
}

fn index_count(indices: &[u16]) -> Result<i32, Error> {
    i32::try_from(indices.len()).map_err(|_| {
        Error::invalid_geometry(format!("{} indices exceed a single draw call", indices.len()))
    })
}

impl<G: GlBackend> CubismRenderer for GlRenderer<G> {
    fn create_texture(&mut self, image_bytes: &[u8]) -> Result<TextureHandle, Error> {
        let result = Texture::from_image_bytes(&*self.gl, &self.caps, image_bytes)
            .map(|texture| TextureHandle(self.textures.insert(texture)));
        self.reported("create_texture", result)
    }

    fn dispose_texture(&mut self, texture: TextureHandle) -> Result<(), Error> {
        let result = match self.textures.remove(texture.0) {
            Some(removed) => {
                removed.delete(&*self.gl);
                Ok(())
            },
            None => Err(Error::unknown_texture(texture.0)),
        };
        self.reported("dispose_texture", result)
    }

    fn texture_size(&self, texture: TextureHandle) -> Option<(i32, i32)> {
        self.textures.get(texture.0).map(Texture::size)
    }

    fn create_clipping_mask(&mut self) -> Result<MaskHandle, Error> {
        let size = self.config.mask_size;
        let result = ClippingMask::new(&*self.gl, &self.caps, size, size)
            .map(|mask| MaskHandle(self.masks.insert(mask)));
        self.reported("create_clipping_mask", result)
    }

    fn dispose_clipping_mask(&mut self, mask: MaskHandle) -> Result<(), Error> {
        let result = if self.mask_pass_target() == Some(mask) {
            Err(Error::mask_in_use(mask.0))
        } else {
            match self.masks.remove(mask.0) {
                Some(removed) => {
                    removed.delete(&*self.gl);
                    Ok(())
                },
                None => Err(Error::unknown_mask(mask.0)),
            }
        };
        self.reported("dispose_clipping_mask", result)
    }

    fn resize_clipping_mask(
        &mut self,
        mask: MaskHandle,
        width: i32,
        height: i32,
    ) -> Result<(), Error> {
        let result = if self.mask_pass_target() == Some(mask) {
            Err(Error::mask_in_use(mask.0))
        } else {
            match self.masks.get_mut(mask.0) {
                Some(target) => target.resize(&*self.gl, &self.caps, width, height),
                None => Err(Error::unknown_mask(mask.0)),
            }
        };
        self.reported("resize_clipping_mask", result)
    }

    fn mask_size(&self, mask: MaskHandle) -> Option<(i32, i32)> {
        self.masks.get(mask.0).map(ClippingMask::size)
    }

    fn premultiplied_alpha(&self) -> bool {
        self.config.premultiplied_alpha
    }

    fn set_premultiplied_alpha(&mut self, enabled: bool) {
        self.config.premultiplied_alpha = enabled;
    }

    fn start_drawing_model(&mut self, model_color: Option<&[f32]>, mvp: &Mat4) -> Result<(), Error> {
        let result = self.try_start_drawing_model(model_color, mvp);
        self.reported("start_drawing_model", result)
    }

    fn start_drawing_mask(&mut self, mask: MaskHandle) -> Result<(), Error> {
        let result = self.try_start_drawing_mask(mask);
        self.reported("start_drawing_mask", result)
    }

    fn draw_mask(&mut self, draw: &MaskDraw<'_>) -> Result<(), Error> {
        let result = self.try_draw_mask(draw);
        if result.is_ok() {
            self.errors.check(&*self.gl, "draw_mask");
        }
        self.reported("draw_mask", result)
    }

    fn end_drawing_mask(&mut self, mask: MaskHandle) -> Result<(), Error> {
        let result = self.try_end_drawing_mask(mask);
        self.reported("end_drawing_mask", result)
    }

    fn draw_mesh(&mut self, draw: &MeshDraw<'_>) -> Result<(), Error> {
        let result = self.try_draw_mesh(draw);
        if result.is_ok() {
            self.errors.check(&*self.gl, "draw_mesh");
        }
        self.reported("draw_mesh", result)
    }

    fn end_drawing_model(&mut self) {
        let Some(frame) = self.frame.take() else {
            warn!("end_drawing_model called without start_drawing_model");
            return;
        };

        let gl = &*self.gl;
        if let Some(pass) = &frame.mask_pass {
            warn!(mask = %pass.mask, "mask pass still open at end_drawing_model");
            pass.saved.restore(gl);
        }
        frame.snapshot.restore(gl);
        self.errors.check(gl, "end_drawing_model");
    }
}

impl<G: GlBackend> Drop for GlRenderer<G> {
    fn drop(&mut self) {
        let gl = &*self.gl;
        if let Some(frame) = self.frame.take() {
            warn!("renderer dropped while drawing a model; restoring host state");
            frame.snapshot.restore(gl);
        }

        let (textures, masks) = (self.textures.len(), self.masks.len());
        self.masks.drain().for_each(|mask| mask.delete(gl));
        self.textures.drain().for_each(|texture| texture.delete(gl));
        self.buffers.delete(gl);
        self.shaders.delete(gl);

        debug!(textures, masks, "renderer dropped");
    }
}

impl<G: GlBackend> fmt::Debug for GlRenderer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlRenderer")
            .field("caps", &self.caps)
            .field("config", &self.config)
            .field("textures", &self.textures.len())
            .field("masks", &self.masks.len())
            .field("drawing", &self.frame.is_some())
            .finish_non_exhaustive()
    }
}
