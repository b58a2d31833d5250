use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::precision::EPSILON;
use crate::vector::Vec2;

/// 2D affine transform.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`, the same column layout
/// as an SVG/canvas `matrix(a, b, c, d, e, f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix2D {
    pub const IDENTITY: Matrix2D = Matrix2D {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            e: dx,
            f: dy,
            ..Self::IDENTITY
        }
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Exchanges the x and y axes (reflection about the diagonal).
    pub fn swap_axes() -> Self {
        Self {
            a: 0.0,
            b: 1.0,
            c: 1.0,
            d: 0.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &Matrix2D) -> Matrix2D {
        *next * *self
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverse(&self) -> Option<Matrix2D> {
        let det = self.determinant();
        if det.abs() < EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix2D {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Mul for Matrix2D {
    type Output = Matrix2D;

    /// `self * rhs` applies `rhs` first.
    fn mul(self, rhs: Matrix2D) -> Matrix2D {
        Matrix2D {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precision::approx_eq;

    fn assert_vec_eq(a: Vec2, b: Vec2) {
        assert!(approx_eq(a.x, b.x) && approx_eq(a.y, b.y), "{a:?} != {b:?}");
    }

    #[test]
    fn test_compose_order() {
        let m = Matrix2D::translation(10.0, 0.0).then(&Matrix2D::scaling(2.0, 2.0));
        // translate first, then scale
        assert_vec_eq(m.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(22.0, 2.0));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let m = Matrix2D::rotation(0.7)
            .then(&Matrix2D::translation(5.0, -3.0))
            .then(&Matrix2D::scaling(2.0, 0.5));
        let inv = m.inverse().unwrap();
        let p = Vec2::new(12.5, -7.25);
        assert_vec_eq(inv.transform_point(m.transform_point(p)), p);
        assert!(Matrix2D::scaling(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_swap_axes() {
        let p = Matrix2D::swap_axes().transform_point(Vec2::new(3.0, 7.0));
        assert_eq!(p, Vec2::new(7.0, 3.0));
        assert!(Matrix2D::default().is_identity());
    }
}
