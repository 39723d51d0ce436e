use std::fmt;

/// Error categories for the puppet renderer.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Image bytes could not be decoded into pixels.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A shader stage failed to compile; `log` holds the driver's info log.
    #[error("Shader error: {stage} shader failed to compile: {log}")]
    ShaderCompile {
        /// Stage that failed.
        stage: ShaderStage,
        /// Driver info log.
        log: String,
    },

    /// A program failed to link.
    #[error("Shader error: linking failed: {0}")]
    ShaderLink(String),

    /// A linked program lacks an attribute or uniform its variant depends on.
    #[error("Shader error: {program} has no active location for '{name}'")]
    MissingShaderLocation {
        /// Variant name of the program.
        program: &'static str,
        /// Attribute or uniform name.
        name: &'static str,
    },

    /// GL resource creation or management errors.
    #[error("Resource error: {0}")]
    Resource(String),

    /// The context lacks a version or entry point the renderer needs.
    #[error("Unsupported context: {0}")]
    Unsupported(String),

    /// A texture or mask handle that is unknown or already disposed.
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// A renderer call made outside the bracket it belongs to.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Vertex, UV or index data that cannot be drawn.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Shader pipeline stage, reported with compile failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

impl From<ShaderStage> for u32 {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl Error {
    /// Whether the error stems from resource creation, leaving the renderer
    /// (or the resource being built) unusable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Decode(_)
                | Self::ShaderCompile { .. }
                | Self::ShaderLink(_)
                | Self::MissingShaderLocation { .. }
                | Self::Resource(_)
                | Self::Unsupported(_)
        )
    }

    // Decode errors
    pub(crate) fn image_decode_failed(err: &image::ImageError) -> Self {
        Self::Decode(format!("Failed to decode image: {err}"))
    }

    pub(crate) fn image_too_large(width: u32, height: u32) -> Self {
        Self::Decode(format!("Image dimensions {width}x{height} exceed GL limits"))
    }

    // Shader errors
    pub(crate) fn shader_compile_failed(stage: ShaderStage, log: String) -> Self {
        Self::ShaderCompile { stage, log }
    }

    pub(crate) fn shader_link_failed(log: String) -> Self {
        Self::ShaderLink(log)
    }

    pub(crate) fn missing_location(program: &'static str, name: &'static str) -> Self {
        Self::MissingShaderLocation { program, name }
    }

    // Resource errors
    pub(crate) fn shader_creation_failed(detail: &str) -> Self {
        Self::Resource(format!("Shader creation failed: {detail}"))
    }

    pub(crate) fn shader_program_creation_failed(detail: &str) -> Self {
        Self::Resource(format!("Shader program creation failed: {detail}"))
    }

    pub(crate) fn buffer_creation_failed(buffer_type: &str) -> Self {
        Self::Resource(format!("Failed to create {buffer_type} buffer"))
    }

    pub(crate) fn vertex_array_creation_failed() -> Self {
        Self::Resource("Failed to create vertex array object".to_string())
    }

    pub(crate) fn texture_creation_failed() -> Self {
        Self::Resource("Failed to create texture".to_string())
    }

    pub(crate) fn framebuffer_creation_failed() -> Self {
        Self::Resource("Failed to create framebuffer".to_string())
    }

    pub(crate) fn framebuffer_incomplete(status: u32) -> Self {
        Self::Resource(format!("Framebuffer incomplete: status 0x{status:04X}"))
    }

    pub(crate) fn invalid_mask_size(width: i32, height: i32) -> Self {
        Self::Resource(format!("Invalid clipping mask size {width}x{height}"))
    }

    // Context errors
    pub(crate) fn context_too_old(major: u32, minor: u32, embedded: bool) -> Self {
        let api = if embedded { "OpenGL ES" } else { "OpenGL" };
        Self::Unsupported(format!("{api} {major}.{minor} is older than the required 2.0"))
    }

    // Handle errors
    pub(crate) fn unknown_texture(id: u64) -> Self {
        Self::InvalidHandle(format!("texture #{id} is unknown or already disposed"))
    }

    pub(crate) fn unknown_mask(id: u64) -> Self {
        Self::InvalidHandle(format!("clipping mask #{id} is unknown or already disposed"))
    }

    // Protocol errors
    pub(crate) fn outside_model(call: &str) -> Self {
        Self::Protocol(format!("{call} called outside start_drawing_model/end_drawing_model"))
    }

    pub(crate) fn outside_mask_pass(call: &str) -> Self {
        Self::Protocol(format!("{call} called outside start_drawing_mask/end_drawing_mask"))
    }

    pub(crate) fn inside_mask_pass(call: &str) -> Self {
        Self::Protocol(format!("{call} called while a mask pass is open"))
    }

    pub(crate) fn mask_in_use(id: u64) -> Self {
        Self::Protocol(format!("clipping mask #{id} is the target of the open mask pass"))
    }

    pub(crate) fn model_already_started() -> Self {
        Self::Protocol("start_drawing_model called twice without end_drawing_model".to_string())
    }

    pub(crate) fn mask_pass_already_started() -> Self {
        Self::Protocol("start_drawing_mask called while another mask pass is open".to_string())
    }

    pub(crate) fn mask_pass_mismatch(expected: u64, found: u64) -> Self {
        Self::Protocol(format!(
            "mask pass is drawing into mask #{expected}, but the call targets mask #{found}"
        ))
    }

    // Geometry errors
    pub(crate) fn invalid_geometry(detail: String) -> Self {
        Self::InvalidGeometry(detail)
    }
}
