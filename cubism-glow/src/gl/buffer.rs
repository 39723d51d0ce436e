use std::slice;

use tracing::debug;

use crate::{
    error::Error,
    gl::{Capabilities, GlBackend, shaders::ProgramLocations},
};

/// Size in bytes of one `x, y` or `u, v` pair.
const PAIR_STRIDE: i32 = 2 * size_of::<f32>() as i32;

/// Streaming vertex, UV and index buffers shared by every draw. Refilled per
/// drawable; the vertex array object is used only when the context has them.
#[derive(Debug)]
#[must_use = "call `delete(gl)` to free GPU resources"]
pub(crate) struct MeshBuffers<G: GlBackend> {
    vao: Option<G::VertexArray>,
    positions: G::Buffer,
    uvs: G::Buffer,
    indices: G::Buffer,
}

impl<G: GlBackend> MeshBuffers<G> {
    pub(crate) fn new(gl: &G, caps: &Capabilities) -> Result<Self, Error> {
        let vao = if caps.vertex_arrays {
            let vao = gl
                .create_vertex_array()
                .map_err(|_| Error::vertex_array_creation_failed())?;
            Some(vao)
        } else {
            None
        };

        let mut buffers = Vec::with_capacity(3);
        for label in ["position", "uv", "index"] {
            match gl.create_buffer() {
                Ok(buffer) => buffers.push(buffer),
                Err(_) => {
                    buffers.into_iter().for_each(|buffer| gl.delete_buffer(buffer));
                    if let Some(vao) = vao {
                        gl.delete_vertex_array(vao);
                    }
                    return Err(Error::buffer_creation_failed(label));
                },
            }
        }

        let [positions, uvs, indices]: [G::Buffer; 3] = buffers
            .try_into()
            .map_err(|_| Error::buffer_creation_failed("mesh"))?;

        debug!(?vao, "mesh buffers created");
        Ok(Self { vao, positions, uvs, indices })
    }

    /// Binds the renderer's own vertex array, if the context has them.
    pub(crate) fn bind_vertex_array(&self, gl: &G) {
        if let Some(vao) = self.vao {
            gl.bind_vertex_array(Some(vao));
        }
    }

    /// Streams one drawable's geometry and points the program's attributes
    /// at it. Leaves the index buffer bound for `draw_elements`.
    pub(crate) fn upload(
        &self,
        gl: &G,
        locations: &ProgramLocations<G>,
        vertices: &[f32],
        uvs: &[f32],
        indices: &[u16],
    ) {
        self.bind_vertex_array(gl);

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.positions));
        buffer_upload_array(gl, glow::ARRAY_BUFFER, vertices, glow::STREAM_DRAW);
        gl.vertex_attrib_pointer_f32(locations.position, 2, glow::FLOAT, false, PAIR_STRIDE, 0);
        gl.enable_vertex_attrib_array(locations.position);

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.uvs));
        buffer_upload_array(gl, glow::ARRAY_BUFFER, uvs, glow::STREAM_DRAW);
        gl.vertex_attrib_pointer_f32(locations.tex_coord, 2, glow::FLOAT, false, PAIR_STRIDE, 0);
        gl.enable_vertex_attrib_array(locations.tex_coord);

        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.indices));
        buffer_upload_array(gl, glow::ELEMENT_ARRAY_BUFFER, indices, glow::STREAM_DRAW);
    }

    pub(crate) fn delete(&self, gl: &G) {
        gl.delete_buffer(self.positions);
        gl.delete_buffer(self.uvs);
        gl.delete_buffer(self.indices);
        if let Some(vao) = self.vao {
            gl.delete_vertex_array(vao);
        }
        debug!("mesh buffers deleted");
    }
}

/// Marker for element types with no padding and no invalid bit patterns.
pub(crate) trait Pod: Copy {}

impl Pod for f32 {}
impl Pod for u16 {}

/// Uploads an array of elements to a GL buffer as raw bytes.
fn buffer_upload_array<G: GlBackend, T: Pod>(gl: &G, target: u32, data: &[T], usage: u32) {
    // SAFETY: `T: Pod` guarantees every byte of `data` is initialized
    let bytes = unsafe { slice::from_raw_parts(data.as_ptr().cast::<u8>(), size_of_val(data)) };
    gl.buffer_data_u8_slice(target, bytes, usage);
}
