use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

/// Column-major 4×4 matrix.
///
/// `cols[j][i]` is row `i` of column `j`, matching the layout GPU APIs expect
/// for `load_matrix`. Multiplication composes right-to-left: `(a * b) * p`
/// applies `b` first.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Matrix4 {
    pub cols: [[f32; 4]; 4],
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    #[inline]
    pub const fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    #[inline]
    pub const fn from_scale(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation of `degrees` around the axis `(x, y, z)`.
    ///
    /// The axis is normalized first. A zero-length axis yields the identity.
    pub fn from_rotation(degrees: f32, x: f32, y: f32, z: f32) -> Self {
        let len = (x * x + y * y + z * z).sqrt();
        if len == 0.0 || !len.is_finite() {
            return Self::IDENTITY;
        }
        let (x, y, z) = (x / len, y / len, z / len);
        let (s, c) = degrees.to_radians().sin_cos();
        let t = 1.0 - c;

        Self {
            cols: [
                [x * x * t + c, y * x * t + z * s, x * z * t - y * s, 0.0],
                [x * y * t - z * s, y * y * t + c, y * z * t + x * s, 0.0],
                [x * z * t + y * s, y * z * t - x * s, z * z * t + c, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Orthographic projection (`glOrtho` conventions).
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fne = far - near;
        Self {
            cols: [
                [2.0 / rl, 0.0, 0.0, 0.0],
                [0.0, 2.0 / tb, 0.0, 0.0],
                [0.0, 0.0, -2.0 / fne, 0.0],
                [-(right + left) / rl, -(top + bottom) / tb, -(far + near) / fne, 1.0],
            ],
        }
    }

    /// Perspective frustum (`glFrustum` conventions).
    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fne = far - near;
        Self {
            cols: [
                [2.0 * near / rl, 0.0, 0.0, 0.0],
                [0.0, 2.0 * near / tb, 0.0, 0.0],
                [(right + left) / rl, (top + bottom) / tb, -(far + near) / fne, -1.0],
                [0.0, 0.0, -2.0 * far * near / fne, 0.0],
            ],
        }
    }

    /// Symmetric perspective from a vertical field of view in degrees.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let ymax = near * (fov_y_degrees.to_radians() * 0.5).tan();
        let xmax = ymax * aspect;
        Self::frustum(-xmax, xmax, -ymax, ymax, near, far)
    }

    /// Multiplies the homogeneous point `[x, y, z, w]`.
    #[inline]
    pub fn transform_point(&self, p: [f32; 4]) -> [f32; 4] {
        let c = &self.cols;
        let mut out = [0.0f32; 4];
        for (i, o) in out.iter_mut().enumerate() {
            *o = c[0][i] * p[0] + c[1][i] * p[1] + c[2][i] * p[2] + c[3][i] * p[3];
        }
        out
    }

    /// Bitwise equality. Unlike `==`, two NaN-carrying matrices with the same
    /// bits compare equal and `0.0` differs from `-0.0`.
    #[inline]
    pub fn bits_eq(&self, other: &Self) -> bool {
        let a: &[u32; 16] = bytemuck::cast_ref(&self.cols);
        let b: &[u32; 16] = bytemuck::cast_ref(&other.cols);
        a == b
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.bits_eq(&Self::IDENTITY)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Matrix4 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0f32; 4]; 4];
        for (j, col) in out.iter_mut().enumerate() {
            for (i, v) in col.iter_mut().enumerate() {
                *v = a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
            }
        }
        Matrix4 { cols: out }
    }
}
