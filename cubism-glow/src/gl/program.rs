use crate::{
    error::{Error, ShaderStage},
    gl::GlBackend,
};

/// Attribute and uniform names shared by every shader variant.
pub(crate) mod names {
    pub(crate) const POSITION: &str = "a_position";
    pub(crate) const TEX_COORD: &str = "a_texCoord";

    pub(crate) const TEXTURE0: &str = "s_texture0";
    pub(crate) const TEXTURE1: &str = "s_texture1";
    pub(crate) const MATRIX: &str = "u_matrix";
    pub(crate) const CLIP_MATRIX: &str = "u_clipMatrix";
    pub(crate) const CHANNEL_FLAG: &str = "u_channelFlag";
    pub(crate) const BASE_COLOR: &str = "u_baseColor";
    pub(crate) const INVERTED_MASK: &str = "u_invertedMask";
}

/// A linked program. Deleted through [`ShaderProgram::delete`], never on drop.
#[derive(Debug)]
#[must_use = "call `delete(gl)` to free GPU resources"]
pub(crate) struct ShaderProgram<G: GlBackend> {
    pub(crate) program: G::Program,
}

impl<G: GlBackend> ShaderProgram<G> {
    pub(crate) fn create(gl: &G, vertex_source: &str, fragment_source: &str) -> Result<Self, Error> {
        let vertex_shader = compile_shader(gl, ShaderStage::Vertex, vertex_source)?;
        let fragment_shader = match compile_shader(gl, ShaderStage::Fragment, fragment_source) {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(vertex_shader);
                return Err(err);
            },
        };

        let program = match gl.create_program() {
            Ok(program) => program,
            Err(detail) => {
                gl.delete_shader(vertex_shader);
                gl.delete_shader(fragment_shader);
                return Err(Error::shader_program_creation_failed(&detail));
            },
        };

        // attach shaders and link program
        gl.attach_shader(program, vertex_shader);
        gl.attach_shader(program, fragment_shader);
        gl.link_program(program);
        let linked = check_link_status(gl, program);

        // shaders are no longer needed once the program is linked
        gl.detach_shader(program, vertex_shader);
        gl.detach_shader(program, fragment_shader);
        gl.delete_shader(vertex_shader);
        gl.delete_shader(fragment_shader);

        if let Err(err) = linked {
            gl.delete_program(program);
            return Err(err);
        }

        Ok(ShaderProgram { program })
    }

    pub(crate) fn use_program(&self, gl: &G) {
        gl.use_program(Some(self.program));
    }

    /// Location of a vertex attribute the program must consume.
    pub(crate) fn attrib_location(
        &self,
        gl: &G,
        label: &'static str,
        name: &'static str,
    ) -> Result<u32, Error> {
        gl.get_attrib_location(self.program, name)
            .ok_or_else(|| Error::missing_location(label, name))
    }

    /// Location of a uniform the program must consume.
    pub(crate) fn uniform_location(
        &self,
        gl: &G,
        label: &'static str,
        name: &'static str,
    ) -> Result<G::UniformLocation, Error> {
        gl.get_uniform_location(self.program, name)
            .ok_or_else(|| Error::missing_location(label, name))
    }

    pub(crate) fn delete(&self, gl: &G) {
        gl.delete_program(self.program);
    }
}

fn compile_shader<G: GlBackend>(
    gl: &G,
    stage: ShaderStage,
    source: &str,
) -> Result<G::Shader, Error> {
    let shader = gl
        .create_shader(stage.into())
        .map_err(|detail| Error::shader_creation_failed(&detail))?;

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(Error::shader_compile_failed(stage, log));
    }

    Ok(shader)
}

fn check_link_status<G: GlBackend>(gl: &G, program: G::Program) -> Result<(), Error> {
    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        return Err(Error::shader_link_failed(log));
    }

    Ok(())
}
