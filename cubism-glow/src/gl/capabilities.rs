use crate::{
    GlslVersion,
    error::Error,
    gl::{ContextVersion, GlBackend},
};

/// Feature table of the host context, resolved once when the renderer is
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub version: ContextVersion,
    /// Shader dialect matching the context.
    pub glsl_version: GlslVersion,
    /// Vertex array objects are core from GL 3.0 / ES 3.0.
    pub vertex_arrays: bool,
}

impl Capabilities {
    /// Reads the context version and derives what the renderer may use.
    ///
    /// # Errors
    /// Returns [`Error::Unsupported`] for contexts older than GL 2.0 / ES 2.0,
    /// which lack programmable shaders and `glBlendFuncSeparate`.
    pub fn detect<G: GlBackend>(gl: &G) -> Result<Self, Error> {
        Self::from_version(gl.version())
    }

    pub(crate) fn from_version(version: ContextVersion) -> Result<Self, Error> {
        if !version.at_least(2, 0) {
            return Err(Error::context_too_old(
                version.major,
                version.minor,
                version.is_embedded,
            ));
        }

        let glsl_version = match (version.is_embedded, version.major, version.minor) {
            (true, 3.., _) => GlslVersion::Es300,
            (true, _, _) => GlslVersion::Es100,
            (false, 3, 0..=1) => GlslVersion::Gl120,
            (false, 3, 2) => GlslVersion::Gl150,
            (false, 3.., _) => GlslVersion::Gl330,
            (false, _, _) => GlslVersion::Gl120,
        };

        Ok(Self {
            version,
            glsl_version,
            vertex_arrays: version.at_least(3, 0),
        })
    }

    /// Internal format for RGBA8 uploads: sized on desktop, unsized on ES 2.0.
    #[must_use]
    pub fn rgba_internal_format(&self) -> i32 {
        if self.version.is_embedded && self.version.major < 3 {
            glow::RGBA as i32
        } else {
            glow::RGBA8 as i32
        }
    }
}
