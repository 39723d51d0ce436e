use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use cubism_glow::{GlslVersion, RendererConfig, config::DEFAULT_MASK_SIZE};

#[derive(Parser, Debug)]
#[command(
    name = "cubism-viewer",
    about = "Draws a textured, clipped mesh through the cubism-glow renderer",
    long_about = "Opens an OpenGL 3.3 window and renders a PNG through cubism-glow: a clipping \
                  mask pass, an unmasked backdrop, a masked mesh and an additive overlay"
)]
pub struct Cli {
    /// PNG image used as the puppet texture
    #[arg(value_name = "PNG", value_parser = validate_file_exists)]
    pub texture: PathBuf,

    /// Clipping mask width and height in pixels
    #[arg(
        long,
        default_value_t = DEFAULT_MASK_SIZE,
        value_name = "PIXELS",
        value_parser = clap::value_parser!(i32).range(1..=8192)
    )]
    pub mask_size: i32,

    /// Compose the texture as straight (non-premultiplied) alpha
    #[arg(long)]
    pub straight_alpha: bool,

    /// Shader dialect; detected from the context when omitted
    #[arg(long, value_enum, value_name = "DIALECT")]
    pub glsl: Option<GlslArg>,

    /// Show the masked mesh outside the mask rather than inside it
    #[arg(long)]
    pub invert_mask: bool,

    /// Poll glGetError after every draw, even in release builds
    #[arg(long)]
    pub gl_errors: bool,

    /// Initial window size
    #[arg(long, default_value = "960x600", value_name = "WxH", value_parser = parse_window_size)]
    pub size: (u32, u32),
}

/// Shader dialects selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslArg {
    #[value(name = "100")]
    Es100,
    #[value(name = "120")]
    Gl120,
    #[value(name = "150")]
    Gl150,
    #[value(name = "300es")]
    Es300,
    #[value(name = "330")]
    Gl330,
}

impl From<GlslArg> for GlslVersion {
    fn from(arg: GlslArg) -> Self {
        match arg {
            GlslArg::Es100 => GlslVersion::Es100,
            GlslArg::Gl120 => GlslVersion::Gl120,
            GlslArg::Gl150 => GlslVersion::Gl150,
            GlslArg::Es300 => GlslVersion::Es300,
            GlslArg::Gl330 => GlslVersion::Gl330,
        }
    }
}

impl Cli {
    pub fn renderer_config(&self) -> RendererConfig {
        let config = RendererConfig::default()
            .with_premultiplied_alpha(!self.straight_alpha)
            .with_mask_size(self.mask_size);

        let config = match self.glsl {
            Some(glsl) => config.with_glsl_version(glsl.into()),
            None => config,
        };

        if self.gl_errors { config.with_gl_error_checks(true) } else { config }
    }
}

fn validate_file_exists(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File does not exist: {s}"))
    }
}

fn parse_window_size(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Expected WIDTHxHEIGHT, got '{s}'"))?;

    let parse = |v: &str| match v.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(format!("Invalid window dimension: '{v}'")),
        Ok(n) => Ok(n),
    };

    Ok((parse(width)?, parse(height)?))
}
