use tracing::debug;

use crate::{
    GlslVersion,
    error::Error,
    gl::{
        GlBackend,
        program::{ShaderProgram, names},
    },
};

/// The five fixed programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ShaderVariant {
    /// Writes masking drawables into a clipping mask.
    MaskSetup,
    Unmasked,
    UnmaskedPremultiplied,
    Masked,
    MaskedPremultiplied,
}

impl ShaderVariant {
    pub(crate) const ALL: [ShaderVariant; 5] = [
        Self::MaskSetup,
        Self::Unmasked,
        Self::UnmaskedPremultiplied,
        Self::Masked,
        Self::MaskedPremultiplied,
    ];

    pub(crate) const fn for_mesh(use_mask: bool, premultiplied: bool) -> Self {
        match (use_mask, premultiplied) {
            (false, false) => Self::Unmasked,
            (false, true) => Self::UnmaskedPremultiplied,
            (true, false) => Self::Masked,
            (true, true) => Self::MaskedPremultiplied,
        }
    }

    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::MaskSetup => "MaskSetup",
            Self::Unmasked => "Unmasked",
            Self::UnmaskedPremultiplied => "UnmaskedPremultiplied",
            Self::Masked => "Masked",
            Self::MaskedPremultiplied => "MaskedPremultiplied",
        }
    }

    /// Legacy-dialect `(vertex, fragment)` sources.
    const fn sources(self) -> (&'static str, &'static str) {
        const MASK_SETUP_VERT: &str = include_str!("../shaders/mask_setup.vert");
        const MASK_SETUP_FRAG: &str = include_str!("../shaders/mask_setup.frag");
        const MESH_VERT: &str = include_str!("../shaders/mesh.vert");
        const MESH_FRAG: &str = include_str!("../shaders/mesh.frag");
        const MESH_PREMULTIPLIED_FRAG: &str = include_str!("../shaders/mesh_premultiplied.frag");
        const MASKED_MESH_VERT: &str = include_str!("../shaders/masked_mesh.vert");
        const MASKED_MESH_FRAG: &str = include_str!("../shaders/masked_mesh.frag");
        const MASKED_MESH_PREMULTIPLIED_FRAG: &str =
            include_str!("../shaders/masked_mesh_premultiplied.frag");

        match self {
            Self::MaskSetup => (MASK_SETUP_VERT, MASK_SETUP_FRAG),
            Self::Unmasked => (MESH_VERT, MESH_FRAG),
            Self::UnmaskedPremultiplied => (MESH_VERT, MESH_PREMULTIPLIED_FRAG),
            Self::Masked => (MASKED_MESH_VERT, MASKED_MESH_FRAG),
            Self::MaskedPremultiplied => (MASKED_MESH_VERT, MASKED_MESH_PREMULTIPLIED_FRAG),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Uniforms present only on some variants.
#[derive(Debug)]
pub(crate) struct ClipLocations<G: GlBackend> {
    pub(crate) clip_matrix: G::UniformLocation,
    pub(crate) channel_flag: G::UniformLocation,
}

/// Uniforms the masked mesh variants read the mask through.
#[derive(Debug)]
pub(crate) struct MaskSamplerLocations<G: GlBackend> {
    pub(crate) texture1: G::UniformLocation,
    pub(crate) inverted_mask: G::UniformLocation,
}

/// Every location a variant consumes, resolved once at link time.
#[derive(Debug)]
pub(crate) struct ProgramLocations<G: GlBackend> {
    pub(crate) position: u32,
    pub(crate) tex_coord: u32,
    pub(crate) texture0: G::UniformLocation,
    pub(crate) base_color: G::UniformLocation,
    /// MVP matrix; absent on [`ShaderVariant::MaskSetup`].
    pub(crate) matrix: Option<G::UniformLocation>,
    /// Present on the mask-setup and masked variants.
    pub(crate) clip: Option<ClipLocations<G>>,
    /// Present on the masked variants.
    pub(crate) mask: Option<MaskSamplerLocations<G>>,
}

impl<G: GlBackend> ProgramLocations<G> {
    fn resolve(gl: &G, variant: ShaderVariant, program: &ShaderProgram<G>) -> Result<Self, Error> {
        let label = variant.label();
        let uses_matrix = variant != ShaderVariant::MaskSetup;
        let uses_clip = variant != ShaderVariant::Unmasked
            && variant != ShaderVariant::UnmaskedPremultiplied;
        let uses_mask = uses_clip && uses_matrix;

        let clip = if uses_clip {
            Some(ClipLocations {
                clip_matrix: program.uniform_location(gl, label, names::CLIP_MATRIX)?,
                channel_flag: program.uniform_location(gl, label, names::CHANNEL_FLAG)?,
            })
        } else {
            None
        };

        let mask = if uses_mask {
            Some(MaskSamplerLocations {
                texture1: program.uniform_location(gl, label, names::TEXTURE1)?,
                inverted_mask: program.uniform_location(gl, label, names::INVERTED_MASK)?,
            })
        } else {
            None
        };

        Ok(Self {
            position: program.attrib_location(gl, label, names::POSITION)?,
            tex_coord: program.attrib_location(gl, label, names::TEX_COORD)?,
            texture0: program.uniform_location(gl, label, names::TEXTURE0)?,
            base_color: program.uniform_location(gl, label, names::BASE_COLOR)?,
            matrix: uses_matrix
                .then(|| program.uniform_location(gl, label, names::MATRIX))
                .transpose()?,
            clip,
            mask,
        })
    }
}

/// A linked variant together with its locations.
#[derive(Debug)]
pub(crate) struct VariantProgram<G: GlBackend> {
    pub(crate) variant: ShaderVariant,
    pub(crate) program: ShaderProgram<G>,
    pub(crate) locations: ProgramLocations<G>,
}

impl<G: GlBackend> VariantProgram<G> {
    fn build(gl: &G, variant: ShaderVariant, glsl_version: GlslVersion) -> Result<Self, Error> {
        let (vertex, fragment) = variant.sources();
        let program = ShaderProgram::create(
            gl,
            &glsl_version.vertex_source(vertex),
            &glsl_version.fragment_source(fragment),
        )?;

        match ProgramLocations::resolve(gl, variant, &program) {
            Ok(locations) => Ok(Self { variant, program, locations }),
            Err(err) => {
                program.delete(gl);
                Err(err)
            },
        }
    }

    pub(crate) fn use_program(&self, gl: &G) {
        self.program.use_program(gl);
    }
}

/// Compiles and owns one program per [`ShaderVariant`].
#[derive(Debug)]
#[must_use = "call `delete(gl)` to free GPU resources"]
pub(crate) struct ShaderManager<G: GlBackend> {
    programs: Vec<VariantProgram<G>>,
}

impl<G: GlBackend> ShaderManager<G> {
    /// Builds every variant up front. On failure the programs built so far
    /// are deleted before the error is returned.
    pub(crate) fn new(gl: &G, glsl_version: GlslVersion) -> Result<Self, Error> {
        let mut programs = Vec::with_capacity(ShaderVariant::ALL.len());
        for variant in ShaderVariant::ALL {
            match VariantProgram::build(gl, variant, glsl_version) {
                Ok(program) => {
                    debug!(variant = variant.label(), ?glsl_version, "shader variant linked");
                    programs.push(program);
                },
                Err(err) => {
                    programs.iter().for_each(|p| p.program.delete(gl));
                    return Err(err);
                },
            }
        }

        Ok(Self { programs })
    }

    pub(crate) fn for_draw_mask(&self) -> &VariantProgram<G> {
        self.variant(ShaderVariant::MaskSetup)
    }

    pub(crate) fn for_draw_mesh(&self, use_mask: bool, premultiplied: bool) -> &VariantProgram<G> {
        self.variant(ShaderVariant::for_mesh(use_mask, premultiplied))
    }

    fn variant(&self, variant: ShaderVariant) -> &VariantProgram<G> {
        // built in `ShaderVariant::ALL` order, which matches the discriminants
        &self.programs[variant.index()]
    }

    pub(crate) fn delete(&self, gl: &G) {
        self.programs.iter().for_each(|p| p.program.delete(gl));
    }
}
