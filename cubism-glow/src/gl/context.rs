use crate::gl::{Capabilities, GlBackend};

/// Capabilities toggled while a model is drawn.
const CAPABILITIES: [u32; 5] =
    [glow::SCISSOR_TEST, glow::STENCIL_TEST, glow::DEPTH_TEST, glow::CULL_FACE, glow::BLEND];

/// Vertex attribute arrays whose enable flags are captured.
const VERTEX_ATTRIB_COUNT: usize = 4;

/// Framebuffer binding and viewport, saved around each mask pass.
#[derive(Debug)]
pub struct FramebufferViewport<G: GlBackend> {
    framebuffer: Option<G::Framebuffer>,
    viewport: [i32; 4],
}

impl<G: GlBackend> FramebufferViewport<G> {
    pub fn capture(gl: &G) -> Self {
        let mut viewport = [0; 4];
        gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);

        Self {
            framebuffer: gl.get_parameter_framebuffer(glow::FRAMEBUFFER_BINDING),
            viewport,
        }
    }

    pub fn restore_viewport(&self, gl: &G) {
        let [x, y, width, height] = self.viewport;
        gl.viewport(x, y, width, height);
    }

    pub fn restore_framebuffer(&self, gl: &G) {
        gl.bind_framebuffer(glow::FRAMEBUFFER, self.framebuffer);
    }

    pub fn restore(&self, gl: &G) {
        self.restore_viewport(gl);
        self.restore_framebuffer(gl);
    }
}

/// Ambient GL state captured before a model is drawn and written back after
/// it. Every field is queried from the context; nothing is assumed.
#[derive(Debug)]
pub struct StateSnapshot<G: GlBackend> {
    array_buffer: Option<G::Buffer>,
    element_array_buffer: Option<G::Buffer>,
    program: Option<G::Program>,
    /// `None` when the context has no vertex array objects.
    vertex_array: Option<Option<G::VertexArray>>,
    active_texture: u32,
    /// 2D bindings of texture units 0 and 1.
    textures: [Option<G::Texture>; 2],
    vertex_attribs: [bool; VERTEX_ATTRIB_COUNT],
    capabilities: [bool; CAPABILITIES.len()],
    front_face: u32,
    color_mask: [bool; 4],
    blend_func: [u32; 4],
    clear_color: [f32; 4],
    framebuffer: FramebufferViewport<G>,
}

impl<G: GlBackend> StateSnapshot<G> {
    pub fn capture(gl: &G, caps: &Capabilities) -> Self {
        // the VAO first: element buffer and attrib flags are per-VAO state
        let vertex_array = caps
            .vertex_arrays
            .then(|| gl.get_parameter_vertex_array(glow::VERTEX_ARRAY_BINDING));

        let active_texture = gl.get_parameter_i32(glow::ACTIVE_TEXTURE) as u32;
        gl.active_texture(glow::TEXTURE1);
        let texture1 = gl.get_parameter_texture(glow::TEXTURE_BINDING_2D);
        gl.active_texture(glow::TEXTURE0);
        let texture0 = gl.get_parameter_texture(glow::TEXTURE_BINDING_2D);
        gl.active_texture(active_texture);

        let mut color_mask = [true; 4];
        gl.get_parameter_bool_slice(glow::COLOR_WRITEMASK, &mut color_mask);

        let mut clear_color = [0.0; 4];
        gl.get_parameter_f32_slice(glow::COLOR_CLEAR_VALUE, &mut clear_color);

        Self {
            array_buffer: gl.get_parameter_buffer(glow::ARRAY_BUFFER_BINDING),
            element_array_buffer: gl.get_parameter_buffer(glow::ELEMENT_ARRAY_BUFFER_BINDING),
            program: gl.get_parameter_program(glow::CURRENT_PROGRAM),
            vertex_array,
            active_texture,
            textures: [texture0, texture1],
            vertex_attribs: std::array::from_fn(|i| gl.is_vertex_attrib_array_enabled(i as u32)),
            capabilities: CAPABILITIES.map(|cap| gl.is_enabled(cap)),
            front_face: gl.get_parameter_i32(glow::FRONT_FACE) as u32,
            color_mask,
            blend_func: [
                glow::BLEND_SRC_RGB,
                glow::BLEND_DST_RGB,
                glow::BLEND_SRC_ALPHA,
                glow::BLEND_DST_ALPHA,
            ]
            .map(|factor| gl.get_parameter_i32(factor) as u32),
            clear_color,
            framebuffer: FramebufferViewport::capture(gl),
        }
    }

    /// Writes every captured value back to the context.
    pub fn restore(&self, gl: &G) {
        gl.use_program(self.program);

        if let Some(vertex_array) = self.vertex_array {
            gl.bind_vertex_array(vertex_array);
        }

        for (index, &enabled) in self.vertex_attribs.iter().enumerate() {
            if enabled {
                gl.enable_vertex_attrib_array(index as u32);
            } else {
                gl.disable_vertex_attrib_array(index as u32);
            }
        }

        for (&cap, &enabled) in CAPABILITIES.iter().zip(&self.capabilities) {
            set_capability(gl, cap, enabled);
        }

        gl.front_face(self.front_face);

        let [r, g, b, a] = self.color_mask;
        gl.color_mask(r, g, b, a);

        gl.bind_buffer(glow::ARRAY_BUFFER, self.array_buffer);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, self.element_array_buffer);

        gl.active_texture(glow::TEXTURE1);
        gl.bind_texture(glow::TEXTURE_2D, self.textures[1]);
        gl.active_texture(glow::TEXTURE0);
        gl.bind_texture(glow::TEXTURE_2D, self.textures[0]);
        gl.active_texture(self.active_texture);

        let [src_rgb, dst_rgb, src_alpha, dst_alpha] = self.blend_func;
        gl.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha);

        let [r, g, b, a] = self.clear_color;
        gl.clear_color(r, g, b, a);

        self.framebuffer.restore(gl);
    }

    pub fn restore_viewport(&self, gl: &G) {
        self.framebuffer.restore_viewport(gl);
    }

    pub fn restore_framebuffer(&self, gl: &G) {
        self.framebuffer.restore_framebuffer(gl);
    }
}

pub(crate) fn set_capability<G: GlBackend>(gl: &G, capability: u32, enabled: bool) {
    if enabled {
        gl.enable(capability);
    } else {
        gl.disable(capability);
    }
}
