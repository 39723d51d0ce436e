//! Renderer configuration.

use crate::GlslVersion;

/// Side length of clipping mask textures unless configured otherwise.
pub const DEFAULT_MASK_SIZE: i32 = 256;

/// Construction-time settings for [`GlRenderer`](crate::GlRenderer).
///
/// ```
/// use cubism_glow::{GlslVersion, RendererConfig};
///
/// let config = RendererConfig::default()
///     .with_premultiplied_alpha(false)
///     .with_mask_size(512)
///     .with_glsl_version(GlslVersion::Gl330);
///
/// assert_eq!(config.mask_size, 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// Compose textures as premultiplied alpha. Selects the premultiplied
    /// shader variants and scales the base color's RGB by its alpha.
    pub premultiplied_alpha: bool,
    /// Width and height of newly created clipping masks, in pixels.
    pub mask_size: i32,
    /// Shader dialect; detected from the context version when `None`.
    pub glsl_version: Option<GlslVersion>,
    /// Poll `glGetError` after each draw call and log what it reports.
    pub check_gl_errors: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            premultiplied_alpha: true,
            mask_size: DEFAULT_MASK_SIZE,
            glsl_version: None,
            check_gl_errors: cfg!(debug_assertions),
        }
    }
}

impl RendererConfig {
    #[must_use]
    pub fn with_premultiplied_alpha(mut self, enabled: bool) -> Self {
        self.premultiplied_alpha = enabled;
        self
    }

    /// Sets the clipping mask size. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_mask_size(mut self, size: i32) -> Self {
        self.mask_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_glsl_version(mut self, version: GlslVersion) -> Self {
        self.glsl_version = Some(version);
        self
    }

    #[must_use]
    pub fn with_gl_error_checks(mut self, enabled: bool) -> Self {
        self.check_gl_errors = enabled;
        self
    }
}
