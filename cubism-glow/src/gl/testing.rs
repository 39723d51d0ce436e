//! A [`GlBackend`] that simulates the slice of GL state the renderer touches,
//! records draw-relevant calls and tracks object lifetimes.

use std::cell::RefCell;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::gl::{ContextVersion, GlBackend};

/// GL object categories tracked by [`FakeGl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ObjectKind {
    Buffer,
    Texture,
    Framebuffer,
    Shader,
    Program,
    VertexArray,
}

/// Host-visible state, as a host would observe it through `glGet*`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AmbientState {
    pub(crate) array_buffer: Option<u32>,
    pub(crate) element_array_buffer: Option<u32>,
    pub(crate) program: Option<u32>,
    pub(crate) vertex_array: Option<u32>,
    pub(crate) active_texture: u32,
    pub(crate) texture_units: [Option<u32>; 2],
    pub(crate) vertex_attribs: [bool; 4],
    pub(crate) capabilities: [bool; 5],
    pub(crate) front_face: u32,
    pub(crate) color_mask: [bool; 4],
    pub(crate) blend_func: [u32; 4],
    pub(crate) clear_color: [f32; 4],
    pub(crate) framebuffer: Option<u32>,
    pub(crate) viewport: [i32; 4],
    pub(crate) unpack_alignment: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UniformValue {
    Int(i32),
    Float(f32),
    Vec4([f32; 4]),
    Mat4(Vec<f32>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    BlendFuncSeparate([u32; 4]),
    Uniform { program: u32, name: String, value: UniformValue },
    Clear { framebuffer: Option<u32>, color: [f32; 4] },
    DrawElements {
        count: i32,
        program: Option<u32>,
        framebuffer: Option<u32>,
        viewport: [i32; 4],
        textures: [Option<u32>; 2],
        cull_face: bool,
    },
}

const TRACKED_CAPABILITIES: [u32; 5] =
    [glow::SCISSOR_TEST, glow::STENCIL_TEST, glow::DEPTH_TEST, glow::CULL_FACE, glow::BLEND];

#[derive(Debug, Default, Clone)]
struct VertexArrayState {
    element_array_buffer: Option<u32>,
    attribs: [bool; 16],
}

#[derive(Debug)]
struct FakeShader {
    kind: u32,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct FakeProgram {
    attached: Vec<u32>,
    linked: bool,
    sources: Vec<String>,
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

#[derive(Debug)]
struct Inner {
    version: ContextVersion,
    next_id: u32,

    buffers: FxHashSet<u32>,
    textures: FxHashMap<u32, (i32, i32)>,
    framebuffers: FxHashMap<u32, Option<u32>>,
    shaders: FxHashMap<u32, FakeShader>,
    programs: FxHashMap<u32, FakeProgram>,
    vertex_arrays: FxHashSet<u32>,
    uniform_locations: FxHashMap<u32, (u32, String)>,
    deletions: Vec<(ObjectKind, u32)>,
    double_deletes: Vec<(ObjectKind, u32)>,

    array_buffer: Option<u32>,
    vertex_array: Option<u32>,
    vertex_array_states: FxHashMap<u32, VertexArrayState>,
    program: Option<u32>,
    active_texture: u32,
    texture_units: [Option<u32>; 8],
    capabilities: FxHashMap<u32, bool>,
    front_face: u32,
    color_mask: [bool; 4],
    blend_func: [u32; 4],
    clear_color: [f32; 4],
    framebuffer: Option<u32>,
    viewport: [i32; 4],
    unpack_alignment: i32,

    errors: Vec<u32>,
    calls: Vec<Call>,

    failing_compile: Option<String>,
    hidden_locations: Vec<String>,
    incomplete_framebuffers: bool,
}

impl Inner {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn vertex_array_state(&mut self) -> &mut VertexArrayState {
        let key = self.vertex_array.unwrap_or(0);
        self.vertex_array_states.entry(key).or_default()
    }

    fn unit(&self) -> usize {
        (self.active_texture - glow::TEXTURE0) as usize
    }

    fn record_deletion(&mut self, kind: ObjectKind, id: u32, was_live: bool) {
        if was_live {
            self.deletions.push((kind, id));
        } else {
            self.double_deletes.push((kind, id));
        }
    }
}

/// Simulated GL context. Handles are plain `u32` ids, unique across every
/// object kind and never reused.
#[derive(Debug)]
pub(crate) struct FakeGl {
    inner: RefCell<Inner>,
}

impl FakeGl {
    /// Desktop OpenGL 3.3.
    pub(crate) fn new() -> Self {
        Self::with_version(3, 3, false)
    }

    pub(crate) fn with_version(major: u32, minor: u32, is_embedded: bool) -> Self {
        let mut vertex_array_states = FxHashMap::default();
        vertex_array_states.insert(0, VertexArrayState::default());

        Self {
            inner: RefCell::new(Inner {
                version: ContextVersion { major, minor, is_embedded },
                next_id: 0,
                buffers: FxHashSet::default(),
                textures: FxHashMap::default(),
                framebuffers: FxHashMap::default(),
                shaders: FxHashMap::default(),
                programs: FxHashMap::default(),
                vertex_arrays: FxHashSet::default(),
                uniform_locations: FxHashMap::default(),
                deletions: Vec::new(),
                double_deletes: Vec::new(),
                array_buffer: None,
                vertex_array: None,
                vertex_array_states,
                program: None,
                active_texture: glow::TEXTURE0,
                texture_units: [None; 8],
                capabilities: FxHashMap::default(),
                front_face: glow::CCW,
                color_mask: [true; 4],
                blend_func: [glow::ONE, glow::ZERO, glow::ONE, glow::ZERO],
                clear_color: [0.0; 4],
                framebuffer: None,
                viewport: [0, 0, 800, 600],
                unpack_alignment: 4,
                errors: Vec::new(),
                calls: Vec::new(),
                failing_compile: None,
                hidden_locations: Vec::new(),
                incomplete_framebuffers: false,
            }),
        }
    }

    /// Shaders whose source contains `needle` fail to compile.
    pub(crate) fn fail_compile_containing(&self, needle: &str) {
        self.inner.borrow_mut().failing_compile = Some(needle.to_string());
    }

    /// Pretends the driver optimized `name` away in every program.
    pub(crate) fn hide_location(&self, name: &str) {
        self.inner.borrow_mut().hidden_locations.push(name.to_string());
    }

    /// Every framebuffer reports `FRAMEBUFFER_UNSUPPORTED`.
    pub(crate) fn reject_framebuffers(&self) {
        self.inner.borrow_mut().incomplete_framebuffers = true;
    }

    pub(crate) fn push_error(&self, code: u32) {
        self.inner.borrow_mut().errors.push(code);
    }

    pub(crate) fn pending_errors(&self) -> Vec<u32> {
        self.inner.borrow().errors.clone()
    }

    pub(crate) fn ambient(&self) -> AmbientState {
        let mut inner = self.inner.borrow_mut();
        let vertex_array = inner.vertex_array;
        let vao = inner.vertex_array_state().clone();
        AmbientState {
            array_buffer: inner.array_buffer,
            element_array_buffer: vao.element_array_buffer,
            program: inner.program,
            vertex_array,
            active_texture: inner.active_texture,
            texture_units: [inner.texture_units[0], inner.texture_units[1]],
            vertex_attribs: [vao.attribs[0], vao.attribs[1], vao.attribs[2], vao.attribs[3]],
            capabilities: TRACKED_CAPABILITIES
                .map(|cap| inner.capabilities.get(&cap).copied().unwrap_or(false)),
            front_face: inner.front_face,
            color_mask: inner.color_mask,
            blend_func: inner.blend_func,
            clear_color: inner.clear_color,
            framebuffer: inner.framebuffer,
            viewport: inner.viewport,
            unpack_alignment: inner.unpack_alignment,
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.inner.borrow().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    pub(crate) fn draw_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::DrawElements { .. }))
            .collect()
    }

    /// Most recent value uploaded to the uniform `name` of any program.
    pub(crate) fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.inner.borrow().calls.iter().rev().find_map(|call| match call {
            Call::Uniform { name: n, value, .. } if n == name => Some(value.clone()),
            _ => None,
        })
    }

    pub(crate) fn live(&self, kind: ObjectKind) -> usize {
        let inner = self.inner.borrow();
        match kind {
            ObjectKind::Buffer => inner.buffers.len(),
            ObjectKind::Texture => inner.textures.len(),
            ObjectKind::Framebuffer => inner.framebuffers.len(),
            ObjectKind::Shader => inner.shaders.len(),
            ObjectKind::Program => inner.programs.len(),
            ObjectKind::VertexArray => inner.vertex_arrays.len(),
        }
    }

    pub(crate) fn deletions(&self, kind: ObjectKind) -> Vec<u32> {
        let inner = self.inner.borrow();
        inner.deletions.iter().filter(|(k, _)| *k == kind).map(|&(_, id)| id).collect()
    }

    pub(crate) fn double_deletes(&self) -> Vec<(ObjectKind, u32)> {
        self.inner.borrow().double_deletes.clone()
    }

    pub(crate) fn texture_size(&self, texture: u32) -> Option<(i32, i32)> {
        self.inner.borrow().textures.get(&texture).copied()
    }

    pub(crate) fn framebuffer_attachment(&self, framebuffer: u32) -> Option<u32> {
        self.inner.borrow().framebuffers.get(&framebuffer).copied().flatten()
    }

    /// Uniform names a linked program declares.
    pub(crate) fn program_uniforms(&self, program: u32) -> Vec<String> {
        let inner = self.inner.borrow();
        inner.programs.get(&program).map(|p| p.uniforms.clone()).unwrap_or_default()
    }

    /// Sources of the shaders `program` was last linked from.
    pub(crate) fn program_source(&self, program: u32) -> String {
        let inner = self.inner.borrow();
        inner.programs.get(&program).map(|p| p.sources.join("\n")).unwrap_or_default()
    }

    /// Puts every field the renderer snapshots into a non-default state, the
    /// way a host with its own GL pipeline would leave it.
    pub(crate) fn dirty_host_state(&self) {
        let vertex = self.create_shader(glow::VERTEX_SHADER).unwrap();
        let fragment = self.create_shader(glow::FRAGMENT_SHADER).unwrap();
        self.compile_shader(vertex);
        self.compile_shader(fragment);
        let program = self.create_program().unwrap();
        self.attach_shader(program, vertex);
        self.attach_shader(program, fragment);
        self.link_program(program);
        self.use_program(Some(program));

        if self.version().at_least(3, 0) {
            let vao = self.create_vertex_array().unwrap();
            self.bind_vertex_array(Some(vao));
        }

        let array = self.create_buffer().unwrap();
        let elements = self.create_buffer().unwrap();
        self.bind_buffer(glow::ARRAY_BUFFER, Some(array));
        self.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(elements));
        self.enable_vertex_attrib_array(1);
        self.enable_vertex_attrib_array(3);

        let unit0 = self.create_texture().unwrap();
        let unit1 = self.create_texture().unwrap();
        self.active_texture(glow::TEXTURE1);
        self.bind_texture(glow::TEXTURE_2D, Some(unit1));
        self.active_texture(glow::TEXTURE0);
        self.bind_texture(glow::TEXTURE_2D, Some(unit0));
        self.active_texture(glow::TEXTURE2);

        self.enable(glow::SCISSOR_TEST);
        self.enable(glow::DEPTH_TEST);
        self.enable(glow::STENCIL_TEST);
        self.enable(glow::CULL_FACE);
        self.disable(glow::BLEND);
        self.front_face(glow::CW);
        self.color_mask(true, false, true, false);
        self.blend_func_separate(glow::SRC_ALPHA, glow::ONE, glow::ZERO, glow::ZERO);
        self.clear_color(0.1, 0.2, 0.3, 0.4);
        self.pixel_store_i32(glow::UNPACK_ALIGNMENT, 8);

        let target = self.create_texture().unwrap();
        let framebuffer = self.create_framebuffer().unwrap();
        self.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
        self.framebuffer_texture_2d(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            glow::TEXTURE_2D,
            Some(target),
            0,
        );
        self.viewport(10, 20, 300, 200);

        self.clear_calls();
    }

    fn error(&self, code: u32) {
        self.inner.borrow_mut().errors.push(code);
    }
}

/// Names declared by `qualifier` lines, e.g. `uniform vec4 u_baseColor;`.
fn declared_names(source: &str, qualifiers: &[&str]) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let first = tokens.next()?;
            if !qualifiers.contains(&first) {
                return None;
            }
            let name = tokens.last()?.trim_end_matches(';');
            Some(name.to_string())
        })
        .collect()
}

impl GlBackend for FakeGl {
    type Buffer = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type Program = u32;
    type Shader = u32;
    type VertexArray = u32;
    type UniformLocation = u32;

    fn version(&self) -> ContextVersion {
        self.inner.borrow().version
    }

    fn get_error(&self) -> u32 {
        let mut inner = self.inner.borrow_mut();
        if inner.errors.is_empty() { glow::NO_ERROR } else { inner.errors.remove(0) }
    }

    fn get_parameter_i32(&self, parameter: u32) -> i32 {
        let inner = self.inner.borrow();
        match parameter {
            glow::ACTIVE_TEXTURE => inner.active_texture as i32,
            glow::FRONT_FACE => inner.front_face as i32,
            glow::BLEND_SRC_RGB => inner.blend_func[0] as i32,
            glow::BLEND_DST_RGB => inner.blend_func[1] as i32,
            glow::BLEND_SRC_ALPHA => inner.blend_func[2] as i32,
            glow::BLEND_DST_ALPHA => inner.blend_func[3] as i32,
            glow::UNPACK_ALIGNMENT => inner.unpack_alignment,
            glow::MAX_VERTEX_ATTRIBS => 16,
            _ => 0,
        }
    }

    fn get_parameter_i32_slice(&self, parameter: u32, out: &mut [i32]) {
        if parameter == glow::VIEWPORT {
            out.copy_from_slice(&self.inner.borrow().viewport);
        }
    }

    fn get_parameter_f32_slice(&self, parameter: u32, out: &mut [f32]) {
        if parameter == glow::COLOR_CLEAR_VALUE {
            out.copy_from_slice(&self.inner.borrow().clear_color);
        }
    }

    fn get_parameter_bool_slice(&self, parameter: u32, out: &mut [bool]) {
        if parameter == glow::COLOR_WRITEMASK {
            out.copy_from_slice(&self.inner.borrow().color_mask);
        }
    }

    fn get_parameter_buffer(&self, parameter: u32) -> Option<u32> {
        let mut inner = self.inner.borrow_mut();
        match parameter {
            glow::ARRAY_BUFFER_BINDING => inner.array_buffer,
            glow::ELEMENT_ARRAY_BUFFER_BINDING => inner.vertex_array_state().element_array_buffer,
            _ => None,
        }
    }

    fn get_parameter_texture(&self, parameter: u32) -> Option<u32> {
        let inner = self.inner.borrow();
        match parameter {
            glow::TEXTURE_BINDING_2D => inner.texture_units[inner.unit()],
            _ => None,
        }
    }

    fn get_parameter_program(&self, parameter: u32) -> Option<u32> {
        match parameter {
            glow::CURRENT_PROGRAM => self.inner.borrow().program,
            _ => None,
        }
    }

    fn get_parameter_framebuffer(&self, parameter: u32) -> Option<u32> {
        match parameter {
            glow::FRAMEBUFFER_BINDING => self.inner.borrow().framebuffer,
            _ => None,
        }
    }

    fn get_parameter_vertex_array(&self, parameter: u32) -> Option<u32> {
        if !self.inner.borrow().version.at_least(3, 0) {
            self.error(glow::INVALID_ENUM);
            return None;
        }
        match parameter {
            glow::VERTEX_ARRAY_BINDING => self.inner.borrow().vertex_array,
            _ => None,
        }
    }

    fn is_vertex_attrib_array_enabled(&self, index: u32) -> bool {
        self.inner.borrow_mut().vertex_array_state().attribs[index as usize]
    }

    fn is_enabled(&self, capability: u32) -> bool {
        self.inner.borrow().capabilities.get(&capability).copied().unwrap_or(false)
    }

    fn enable(&self, capability: u32) {
        self.inner.borrow_mut().capabilities.insert(capability, true);
    }

    fn disable(&self, capability: u32) {
        self.inner.borrow_mut().capabilities.insert(capability, false);
    }

    fn front_face(&self, mode: u32) {
        self.inner.borrow_mut().front_face = mode;
    }

    fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.inner.borrow_mut().color_mask = [red, green, blue, alpha];
    }

    fn blend_func_separate(&self, src_rgb: u32, dst_rgb: u32, src_alpha: u32, dst_alpha: u32) {
        let mut inner = self.inner.borrow_mut();
        let factors = [src_rgb, dst_rgb, src_alpha, dst_alpha];
        inner.blend_func = factors;
        inner.calls.push(Call::BlendFuncSeparate(factors));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.inner.borrow_mut().viewport = [x, y, width, height];
    }

    fn clear_color(&self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.inner.borrow_mut().clear_color = [red, green, blue, alpha];
    }

    fn clear(&self, _mask: u32) {
        let mut inner = self.inner.borrow_mut();
        let call = Call::Clear { framebuffer: inner.framebuffer, color: inner.clear_color };
        inner.calls.push(call);
    }

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        if parameter == glow::UNPACK_ALIGNMENT {
            self.inner.borrow_mut().unpack_alignment = value;
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.allocate();
        inner.buffers.insert(id);
        Ok(id)
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut inner = self.inner.borrow_mut();
        let was_live = inner.buffers.remove(&buffer);
        inner.record_deletion(ObjectKind::Buffer, buffer, was_live);
        if inner.array_buffer == Some(buffer) {
            inner.array_buffer = None;
        }
        let vao = inner.vertex_array_state();
        if vao.element_array_buffer == Some(buffer) {
            vao.element_array_buffer = None;
        }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        let mut inner = self.inner.borrow_mut();
        if buffer.is_some_and(|b| !inner.buffers.contains(&b)) {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        }
        match target {
            glow::ARRAY_BUFFER => inner.array_buffer = buffer,
            glow::ELEMENT_ARRAY_BUFFER => inner.vertex_array_state().element_array_buffer = buffer,
            _ => inner.errors.push(glow::INVALID_ENUM),
        }
    }

    fn buffer_data_u8_slice(&self, target: u32, _data: &[u8], _usage: u32) {
        let mut inner = self.inner.borrow_mut();
        let bound = match target {
            glow::ARRAY_BUFFER => inner.array_buffer,
            glow::ELEMENT_ARRAY_BUFFER => inner.vertex_array_state().element_array_buffer,
            _ => None,
        };
        if bound.is_none() {
            inner.errors.push(glow::INVALID_OPERATION);
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut inner = self.inner.borrow_mut();
        if !inner.version.at_least(3, 0) {
            return Err("vertex array objects are not supported".to_string());
        }
        let id = inner.allocate();
        inner.vertex_arrays.insert(id);
        inner.vertex_array_states.insert(id, VertexArrayState::default());
        Ok(id)
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut inner = self.inner.borrow_mut();
        let was_live = inner.vertex_arrays.remove(&vertex_array);
        inner.record_deletion(ObjectKind::VertexArray, vertex_array, was_live);
        if inner.vertex_array == Some(vertex_array) {
            inner.vertex_array = None;
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut inner = self.inner.borrow_mut();
        if vertex_array.is_some_and(|v| !inner.vertex_arrays.contains(&v)) {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        }
        inner.vertex_array = vertex_array;
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.inner.borrow_mut().vertex_array_state().attribs[index as usize] = true;
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        self.inner.borrow_mut().vertex_array_state().attribs[index as usize] = false;
    }

    fn vertex_attrib_pointer_f32(
        &self,
        _index: u32,
        _size: i32,
        _data_type: u32,
        _normalized: bool,
        _stride: i32,
        _offset: i32,
    ) {
        let mut inner = self.inner.borrow_mut();
        if inner.array_buffer.is_none() {
            inner.errors.push(glow::INVALID_OPERATION);
        }
    }

    fn draw_elements(&self, _mode: u32, count: i32, _element_type: u32, _offset: i32) {
        let mut inner = self.inner.borrow_mut();
        let linked = inner.program.and_then(|p| inner.programs.get(&p)).is_some_and(|p| p.linked);
        let indexed = inner.vertex_array_state().element_array_buffer.is_some();
        if !linked || !indexed {
            inner.errors.push(glow::INVALID_OPERATION);
        }

        let call = Call::DrawElements {
            count,
            program: inner.program,
            framebuffer: inner.framebuffer,
            viewport: inner.viewport,
            textures: [inner.texture_units[0], inner.texture_units[1]],
            cull_face: inner.capabilities.get(&glow::CULL_FACE).copied().unwrap_or(false),
        };
        inner.calls.push(call);
    }

    fn create_texture(&self) -> Result<u32, String> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.allocate();
        inner.textures.insert(id, (0, 0));
        Ok(id)
    }

    fn delete_texture(&self, texture: u32) {
        let mut inner = self.inner.borrow_mut();
        let was_live = inner.textures.remove(&texture).is_some();
        inner.record_deletion(ObjectKind::Texture, texture, was_live);
        for unit in &mut inner.texture_units {
            if *unit == Some(texture) {
                *unit = None;
            }
        }
        if let Some(fb) = inner.framebuffer
            && let Some(attachment) = inner.framebuffers.get_mut(&fb)
            && *attachment == Some(texture)
        {
            *attachment = None;
        }
    }

    fn active_texture(&self, unit: u32) {
        let mut inner = self.inner.borrow_mut();
        if (glow::TEXTURE0..glow::TEXTURE0 + 8).contains(&unit) {
            inner.active_texture = unit;
        } else {
            inner.errors.push(glow::INVALID_ENUM);
        }
    }

    fn bind_texture(&self, _target: u32, texture: Option<u32>) {
        let mut inner = self.inner.borrow_mut();
        if texture.is_some_and(|t| !inner.textures.contains_key(&t)) {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        }
        let unit = inner.unit();
        inner.texture_units[unit] = texture;
    }

    fn tex_image_2d(
        &self,
        _target: u32,
        _level: i32,
        _internal_format: i32,
        width: i32,
        height: i32,
        _format: u32,
        _ty: u32,
        pixels: Option<&[u8]>,
    ) {
        let mut inner = self.inner.borrow_mut();
        let unit = inner.unit();
        let Some(texture) = inner.texture_units[unit] else {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        };
        if pixels.is_some_and(|p| p.len() != (width * height * 4) as usize) {
            inner.errors.push(glow::INVALID_VALUE);
            return;
        }
        inner.textures.insert(texture, (width, height));
    }

    fn tex_parameter_i32(&self, _target: u32, _parameter: u32, _value: i32) {
        let mut inner = self.inner.borrow_mut();
        let unit = inner.unit();
        if inner.texture_units[unit].is_none() {
            inner.errors.push(glow::INVALID_OPERATION);
        }
    }

    fn create_framebuffer(&self) -> Result<u32, String> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.allocate();
        inner.framebuffers.insert(id, None);
        Ok(id)
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        let mut inner = self.inner.borrow_mut();
        let was_live = inner.framebuffers.remove(&framebuffer).is_some();
        inner.record_deletion(ObjectKind::Framebuffer, framebuffer, was_live);
        if inner.framebuffer == Some(framebuffer) {
            inner.framebuffer = None;
        }
    }

    fn bind_framebuffer(&self, _target: u32, framebuffer: Option<u32>) {
        let mut inner = self.inner.borrow_mut();
        if framebuffer.is_some_and(|f| !inner.framebuffers.contains_key(&f)) {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        }
        inner.framebuffer = framebuffer;
    }

    fn framebuffer_texture_2d(
        &self,
        _target: u32,
        _attachment: u32,
        _texture_target: u32,
        texture: Option<u32>,
        _level: i32,
    ) {
        let mut inner = self.inner.borrow_mut();
        let Some(fb) = inner.framebuffer else {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        };
        inner.framebuffers.insert(fb, texture);
    }

    fn check_framebuffer_status(&self, _target: u32) -> u32 {
        let inner = self.inner.borrow();
        let Some(fb) = inner.framebuffer else { return glow::FRAMEBUFFER_COMPLETE };
        if inner.incomplete_framebuffers {
            return glow::FRAMEBUFFER_UNSUPPORTED;
        }

        match inner.framebuffers.get(&fb).copied().flatten() {
            None => glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT,
            Some(texture) => match inner.textures.get(&texture) {
                Some(&(w, h)) if w > 0 && h > 0 => glow::FRAMEBUFFER_COMPLETE,
                _ => glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT,
            },
        }
    }

    fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.allocate();
        let shader = FakeShader { kind: shader_type, source: String::new(), compiled: false };
        inner.shaders.insert(id, shader);
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(s) = self.inner.borrow_mut().shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut inner = self.inner.borrow_mut();
        let failing = inner.failing_compile.clone();
        if let Some(s) = inner.shaders.get_mut(&shader) {
            s.compiled = failing.is_none_or(|needle| !s.source.contains(&needle));
        }
    }

    fn get_shader_compile_status(&self, shader: u32) -> bool {
        self.inner.borrow().shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn get_shader_info_log(&self, shader: u32) -> String {
        if self.get_shader_compile_status(shader) {
            String::new()
        } else {
            "ERROR: 0:1: injected failure".to_string()
        }
    }

    fn delete_shader(&self, shader: u32) {
        let mut inner = self.inner.borrow_mut();
        let was_live = inner.shaders.remove(&shader).is_some();
        inner.record_deletion(ObjectKind::Shader, shader, was_live);
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut inner = self.inner.borrow_mut();
        let id = inner.allocate();
        inner.programs.insert(id, FakeProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(p) = self.inner.borrow_mut().programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(p) = self.inner.borrow_mut().programs.get_mut(&program) {
            p.attached.retain(|&s| s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut inner = self.inner.borrow_mut();
        let Some(p) = inner.programs.get(&program) else { return };

        let stages: Vec<&FakeShader> =
            p.attached.iter().filter_map(|id| inner.shaders.get(id)).collect();
        let vertex: Vec<&FakeShader> =
            stages.iter().copied().filter(|s| s.kind == glow::VERTEX_SHADER).collect();
        let fragment: Vec<&FakeShader> =
            stages.iter().copied().filter(|s| s.kind == glow::FRAGMENT_SHADER).collect();

        let linked = vertex.len() == 1
            && fragment.len() == 1
            && stages.iter().all(|s| s.compiled);

        let attributes = vertex
            .first()
            .map(|s| declared_names(&s.source, &["attribute", "in"]))
            .unwrap_or_default();
        let uniforms = stages
            .iter()
            .flat_map(|s| declared_names(&s.source, &["uniform"]))
            .collect::<Vec<_>>();
        let sources = stages.iter().map(|s| s.source.clone()).collect();

        if let Some(p) = inner.programs.get_mut(&program) {
            p.linked = linked;
            p.attributes = attributes;
            p.uniforms = uniforms;
            p.sources = sources;
        }
    }

    fn get_program_link_status(&self, program: u32) -> bool {
        self.inner.borrow().programs.get(&program).is_some_and(|p| p.linked)
    }

    fn get_program_info_log(&self, program: u32) -> String {
        if self.get_program_link_status(program) {
            String::new()
        } else {
            "error: program has no complete vertex/fragment pair".to_string()
        }
    }

    fn delete_program(&self, program: u32) {
        let mut inner = self.inner.borrow_mut();
        let was_live = inner.programs.remove(&program).is_some();
        inner.record_deletion(ObjectKind::Program, program, was_live);
    }

    fn use_program(&self, program: Option<u32>) {
        let mut inner = self.inner.borrow_mut();
        if program.is_some_and(|p| !inner.programs.get(&p).is_some_and(|p| p.linked)) {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        }
        inner.program = program;
    }

    fn get_attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let inner = self.inner.borrow();
        if inner.hidden_locations.iter().any(|hidden| hidden == name) {
            return None;
        }
        let p = inner.programs.get(&program).filter(|p| p.linked)?;
        p.attributes.iter().position(|a| a == name).map(|index| index as u32)
    }

    fn get_uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let mut inner = self.inner.borrow_mut();
        if inner.hidden_locations.iter().any(|hidden| hidden == name) {
            return None;
        }
        let declared = inner
            .programs
            .get(&program)
            .is_some_and(|p| p.linked && p.uniforms.iter().any(|u| u == name));
        if !declared {
            return None;
        }

        let location = inner.allocate();
        inner.uniform_locations.insert(location, (program, name.to_string()));
        Some(location)
    }

    fn uniform_1_i32(&self, location: &u32, value: i32) {
        self.record_uniform(*location, UniformValue::Int(value));
    }

    fn uniform_1_f32(&self, location: &u32, value: f32) {
        self.record_uniform(*location, UniformValue::Float(value));
    }

    fn uniform_4_f32(&self, location: &u32, x: f32, y: f32, z: f32, w: f32) {
        self.record_uniform(*location, UniformValue::Vec4([x, y, z, w]));
    }

    fn uniform_matrix_4_f32_slice(&self, location: &u32, value: &[f32]) {
        self.record_uniform(*location, UniformValue::Mat4(value.to_vec()));
    }
}

impl FakeGl {
    fn record_uniform(&self, location: u32, value: UniformValue) {
        let mut inner = self.inner.borrow_mut();
        let Some((program, name)) = inner.uniform_locations.get(&location).cloned() else {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        };
        // uniforms land in the program in use, which must own the location
        if inner.program != Some(program) {
            inner.errors.push(glow::INVALID_OPERATION);
            return;
        }
        inner.calls.push(Call::Uniform { program, name, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_names() {
        let source = "#version 330 core\nin vec4 a_position;\nin vec2 a_texCoord;\n\
            out vec2 v_texCoord;\nuniform mat4 u_matrix;\nvoid main() {}\n";
        assert_eq!(declared_names(source, &["attribute", "in"]), ["a_position", "a_texCoord"]);
        assert_eq!(declared_names(source, &["uniform"]), ["u_matrix"]);
    }

    #[test]
    fn test_double_delete_is_recorded() {
        let gl = FakeGl::new();
        let texture = gl.create_texture().unwrap();
        gl.delete_texture(texture);
        gl.delete_texture(texture);

        assert_eq!(gl.deletions(ObjectKind::Texture), [texture]);
        assert_eq!(gl.double_deletes(), [(ObjectKind::Texture, texture)]);
    }

    #[test]
    fn test_deleting_bound_texture_unbinds_it() {
        let gl = FakeGl::new();
        let texture = gl.create_texture().unwrap();
        gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        assert_eq!(gl.get_parameter_texture(glow::TEXTURE_BINDING_2D), Some(texture));

        gl.delete_texture(texture);
        assert_eq!(gl.get_parameter_texture(glow::TEXTURE_BINDING_2D), None);
    }
}
