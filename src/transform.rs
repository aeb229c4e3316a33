use crate::geometry::Rect;

/// A 4x4 transformation matrix stored in row-major order.
///
/// Used both for element world transforms and for the immediate-mode
/// drawing matrix (`GUI.matrix`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Matrix data in row-major order: [row0, row1, row2, row3]
    pub data: [f32; 16],
}

impl Transform {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Self = Self {
        data: [
            1.0, 0.0, 0.0, 0.0, // row 0
            0.0, 1.0, 0.0, 0.0, // row 1
            0.0, 0.0, 1.0, 0.0, // row 2
            0.0, 0.0, 0.0, 1.0, // row 3
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, x, // row 0
                0.0, 1.0, 0.0, y, // row 1
                0.0, 0.0, 1.0, 0.0, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    pub fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // row 0
                0.0, sy, 0.0, 0.0, // row 1
                0.0, 0.0, 1.0, 0.0, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Compose this transform with another: self * other
    /// Applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        let a = &self.data;
        let b = &other.data;
        let mut result = [0.0f32; 16];

        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[i * 4 + k] * b[k * 4 + j];
                }
                result[i * 4 + j] = sum;
            }
        }

        Transform { data: result }
    }

    /// Inverse of a 2D affine transform. Degenerate matrices yield identity.
    pub fn inverse(&self) -> Transform {
        let a = self.data[0];
        let b = self.data[1];
        let c = self.data[4];
        let d = self.data[5];
        let tx = self.data[3];
        let ty = self.data[7];

        let det = a * d - b * c;
        if det.abs() < 1e-10 {
            return Self::IDENTITY;
        }
        let inv_det = 1.0 / det;

        let mut out = Self::IDENTITY;
        out.data[0] = d * inv_det;
        out.data[1] = -b * inv_det;
        out.data[3] = (-d * tx + b * ty) * inv_det;
        out.data[4] = -c * inv_det;
        out.data[5] = a * inv_det;
        out.data[7] = (c * tx - a * ty) * inv_det;
        out
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let new_x = self.data[0] * x + self.data[1] * y + self.data[3];
        let new_y = self.data[4] * x + self.data[5] * y + self.data[7];
        (new_x, new_y)
    }

    /// Axis-aligned bounding box of `rect` after transformation.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let corners = [
            self.transform_point(rect.x, rect.y),
            self.transform_point(rect.x_max(), rect.y),
            self.transform_point(rect.x, rect.y_max()),
            self.transform_point(rect.x_max(), rect.y_max()),
        ];
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        assert!(t.is_identity());
        assert_eq!(t.transform_point(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_compose_translations() {
        let parent = Transform::translate(10.0, 5.0);
        let child = Transform::translate(2.0, 3.0);
        let world = parent.then(&child);
        let (x, y) = world.transform_point(0.0, 0.0);
        assert!(approx_eq(x, 12.0));
        assert!(approx_eq(y, 8.0));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Transform::scale_xy(2.0, 4.0).then(&Transform::translate(3.0, 1.0));
        let composed = t.then(&t.inverse());
        let (x, y) = composed.transform_point(5.0, 7.0);
        assert!(approx_eq(x, 5.0));
        assert!(approx_eq(y, 7.0));
    }

    #[test]
    fn test_transform_rect_is_aligned_bound() {
        let t = Transform::translate(10.0, 20.0).then(&Transform::scale_xy(2.0, 2.0));
        let r = t.transform_rect(&Rect::new(1.0, 1.0, 5.0, 5.0));
        assert_eq!(r, Rect::new(12.0, 22.0, 10.0, 10.0));
    }
}
