use std::ops::Mul;

/// Column-major 4x4 matrix, laid out the way `glUniformMatrix4fv` expects
/// with `transpose = false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// Elements, column by column.
    pub data: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    #[must_use]
    pub const fn identity() -> Self {
        Self::from_cols_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    #[must_use]
    pub const fn from_cols_array(data: [f32; 16]) -> Self {
        Self { data }
    }

    #[must_use]
    pub const fn from_scale(x: f32, y: f32) -> Self {
        let mut m = Self::identity();
        m.data[0] = x;
        m.data[5] = y;
        m
    }

    #[must_use]
    pub const fn from_translation(x: f32, y: f32) -> Self {
        let mut m = Self::identity();
        m.data[12] = x;
        m.data[13] = y;
        m
    }

    /// Orthographic projection mapping `[left, right] x [bottom, top]` to
    /// clip space, with depth fixed to `[-1, 1]`.
    #[must_use]
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        let w = right - left;
        let h = top - bottom;

        let mut m = Self::identity();
        m.data[0] = 2.0 / w;
        m.data[5] = 2.0 / h;
        m.data[12] = -(right + left) / w;
        m.data[13] = -(top + bottom) / h;
        m
    }

    /// Centres a canvas of `width` x `height` model units inside the unit
    /// square, fitting the longer side.
    #[must_use]
    pub fn fit_model(width: f32, height: f32) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::identity();
        }

        let scale = if width > height { 2.0 / width } else { 2.0 / height };
        Self::from_scale(scale, scale)
    }

    /// Scales y by the viewport's aspect ratio so model units stay square.
    #[must_use]
    pub fn aspect_correction(viewport_width: f32, viewport_height: f32) -> Self {
        if viewport_width <= 0.0 || viewport_height <= 0.0 {
            return Self::identity();
        }

        Self::from_scale(1.0, viewport_width / viewport_height)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Transforms the point `(x, y, 0, 1)` and returns the resulting `x, y`.
    #[must_use]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let d = &self.data;
        (d[0] * x + d[4] * y + d[12], d[1] * x + d[5] * y + d[13])
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let a = &self.data;
        let b = &rhs.data;
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4)
                    .map(|k| a[k * 4 + row] * b[col * 4 + k])
                    .sum::<f32>();
            }
        }
        Mat4 { data: out }
    }
}
