//! OpenGL renderer backend for Cubism 2D puppets.
//!
//! The host owns the window, the GL context and the model's animation. Each
//! frame it brackets its drawables between
//! [`CubismRenderer::start_drawing_model`] and
//! [`CubismRenderer::end_drawing_model`]; the renderer captures the host's GL
//! state at the start of the bracket and hands it back unchanged at the end.

pub mod config;
mod draw;
pub mod error;
pub mod gl;
mod mat4;

pub use config::RendererConfig;
pub use draw::{BlendMode, MaskChannel, MaskDraw, MeshDraw};
pub use error::{Error, ShaderStage};
pub use gl::{
    Capabilities, ContextVersion, CubismRenderer, GlBackend, GlRenderer, MaskHandle,
    TextureHandle,
};
pub use mat4::Mat4;

/// GL shader language target for version injection.
///
/// Shader sources are written in the GLSL 1.00 / 1.20 dialect and rewritten
/// for the 1.50+ and 3.00 es dialects on the fly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslVersion {
    /// WebGL1 / OpenGL ES 2.0: `#version 100`
    Es100,
    /// OpenGL 2.1: `#version 120`
    Gl120,
    /// OpenGL 3.2 Core: `#version 150`
    Gl150,
    /// WebGL2 / OpenGL ES 3.0: `#version 300 es`
    Es300,
    /// OpenGL 3.3 Core: `#version 330 core`
    Gl330,
}

impl GlslVersion {
    pub fn vertex_preamble(&self) -> &'static str {
        match self {
            Self::Es100 => "#version 100\nprecision highp float;\n",
            Self::Gl120 => "#version 120\n",
            Self::Gl150 => "#version 150\n",
            Self::Es300 => "#version 300 es\nprecision highp float;\n",
            Self::Gl330 => "#version 330 core\n",
        }
    }

    pub fn fragment_preamble(&self) -> &'static str {
        match self {
            Self::Es100 => "#version 100\nprecision mediump float;\n",
            Self::Gl120 => "#version 120\n",
            Self::Gl150 => "#version 150\nout vec4 fragColor;\n",
            Self::Es300 => "#version 300 es\nprecision mediump float;\nout vec4 fragColor;\n",
            Self::Gl330 => "#version 330 core\nout vec4 fragColor;\n",
        }
    }

    /// Whether the dialect uses `in`/`out` qualifiers instead of
    /// `attribute`/`varying`.
    #[must_use]
    pub fn is_modern(&self) -> bool {
        matches!(self, Self::Gl150 | Self::Es300 | Self::Gl330)
    }

    /// Prefixes a legacy-dialect vertex shader body with the version
    /// preamble, rewriting qualifiers for modern dialects.
    #[must_use]
    pub fn vertex_source(&self, body: &str) -> String {
        let body = if self.is_modern() {
            body.replace("attribute ", "in ").replace("varying ", "out ")
        } else {
            body.to_string()
        };

        format!("{}{body}", self.vertex_preamble())
    }

    /// Prefixes a legacy-dialect fragment shader body with the version
    /// preamble, rewriting qualifiers and builtins for modern dialects.
    #[must_use]
    pub fn fragment_source(&self, body: &str) -> String {
        let body = if self.is_modern() {
            body.replace("varying ", "in ")
                .replace("texture2D(", "texture(")
                .replace("gl_FragColor", "fragColor")
        } else {
            body.to_string()
        };

        format!("{}{body}", self.fragment_preamble())
    }
}
