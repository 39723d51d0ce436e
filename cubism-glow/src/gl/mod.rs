mod backend;
mod buffer;
mod capabilities;
mod clipping_mask;
mod context;
mod debug;
mod program;
mod renderer;
mod resources;
mod shaders;
mod texture;

#[cfg(test)]
pub(crate) mod testing;

// Primary API re-exports
pub use backend::{ContextVersion, GlBackend};
pub use capabilities::Capabilities;
pub use context::{FramebufferViewport, StateSnapshot};
pub use renderer::{CubismRenderer, GlRenderer};
pub use resources::{MaskHandle, TextureHandle};
