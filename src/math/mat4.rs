//! 4x4 transformation matrix using the column-vector convention.
//!
//! # Convention
//! - Vectors are **column vectors** on the right: `Mat4 * Vec`
//! - Translation is stored in the **last column**
//! - Transforms chain **right-to-left**: `A * B * v` applies B first, then A
//! - Builders follow the OpenGL / right-handed conventions (`gluPerspective`,
//!   `gluLookAt`), so the camera looks down -Z in view space
//!
//! Storage is `data[row][col]`. GPU uniforms expect column-major order, use
//! [`Mat4::to_cols_array`] for upload.
//!
//! # Example
//! ```ignore
//! let mvp = projection * view * model;  // model applied first
//! let clip = mvp * Vec4::point(0.0, 1.0, 0.0);
//! ```

use std::ops::Mul;

use super::vec3::Vec3;
use super::vec4::Vec4;

/// 4x4 matrix stored as `data[row][col]` with column-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    data: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub fn new(data: [[f32; 4]; 4]) -> Self {
        Mat4 { data }
    }

    pub fn identity() -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a translation matrix.
    ///
    /// Translation is stored in the last column.
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a counter-clockwise (right-handed) rotation of `degrees` about `axis`.
    ///
    /// The axis is normalized first. A zero-length axis yields the identity.
    pub fn rotation_axis(degrees: f32, axis: Vec3) -> Self {
        let length = axis.magnitude();
        if length == 0.0 {
            return Mat4::identity();
        }
        let Vec3 { x, y, z } = axis / length;

        let (s, c) = degrees.to_radians().sin_cos();
        let nc = 1.0 - c;

        Mat4::new([
            [x * x * nc + c, x * y * nc - z * s, x * z * nc + y * s, 0.0],
            [y * x * nc + z * s, y * y * nc + c, y * z * nc - x * s, 0.0],
            [z * x * nc - y * s, z * y * nc + x * s, z * z * nc + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates an OpenGL perspective projection (`gluPerspective`).
    ///
    /// # Arguments
    /// * `fov_y_degrees` - Vertical field of view in degrees
    /// * `aspect_ratio` - Width divided by height
    /// * `near`, `far` - Clip plane distances along -Z
    pub fn perspective_gl(fov_y_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y_degrees.to_radians() / 2.0).tan();
        let range_reciprocal = 1.0 / (near - far);

        Mat4::new([
            [f / aspect_ratio, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [
                0.0,
                0.0,
                (far + near) * range_reciprocal,
                2.0 * far * near * range_reciprocal,
            ],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Creates a right-handed view matrix (`gluLookAt`).
    ///
    /// # Arguments
    ///
    /// * `eye` - The position of the camera.
    /// * `center` - The point the camera is looking at.
    /// * `up` - The up direction of the camera. Need not be normalized.
    pub fn look_at_rh(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let forward = (center - eye).normalize();
        let side = forward.cross(up).normalize();
        let up = side.cross(forward);

        Self::new([
            [side.x, side.y, side.z, -side.dot(eye)],
            [up.x, up.y, up.z, -up.dot(eye)],
            [-forward.x, -forward.y, -forward.z, forward.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Flattens the matrix in column-major order, the layout GLSL `mat4` expects.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = self.data[row][col];
            }
        }
        out
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row][col]
    }
}

/// Matrix multiplication: Mat4 * Mat4.
///
/// `A * B * v` applies B first, then A.
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result = [[0.0f32; 4]; 4];

        for row in 0..4 {
            for col in 0..4 {
                result[row][col] = self.data[row][0] * rhs.data[0][col]
                    + self.data[row][1] * rhs.data[1][col]
                    + self.data[row][2] * rhs.data[2][col]
                    + self.data[row][3] * rhs.data[3][col];
            }
        }

        Mat4::new(result)
    }
}

/// Transform a Vec4 by a matrix: Mat4 * Vec4 (column vector).
impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Self::Output {
        let row = |r: usize| {
            self.data[r][0] * v.x + self.data[r][1] * v.y + self.data[r][2] * v.z + self.data[r][3] * v.w
        };
        Vec4::new(row(0), row(1), row(2), row(3))
    }
}
