pub mod model;
pub mod records;

pub mod geometry {
    use glam::{DMat4, DVec3};
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示，与内核的双精度坐标保持一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn origin() -> Self {
            Self(DVec3::ZERO)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        #[inline]
        pub fn vector_to(self, other: Point3) -> Vector3 {
            Vector3(other.0 - self.0)
        }

        /// 在给定容差内比较两点，供往返校验使用。
        #[inline]
        pub fn approx_eq(self, other: Point3, tolerance: f64) -> bool {
            self.0.distance_squared(other.0) <= tolerance * tolerance
        }
    }

    /// 三维向量，目前用于面的法向。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector3(pub DVec3);

    impl Vector3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn zero() -> Self {
            Self(DVec3::ZERO)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

    }

    /// RGBA 颜色，分量与内核一致采用 0..=255。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Color {
        pub r: u8,
        pub g: u8,
        pub b: u8,
        pub a: u8,
    }

    impl Color {
        #[inline]
        pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
            Self { r, g, b, a }
        }

        #[inline]
        pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
            Self::new(r, g, b, u8::MAX)
        }
    }

    /// 实例或组的放置变换（列主序 4x4 矩阵）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Transform(pub DMat4);

    impl Transform {
        #[inline]
        pub fn identity() -> Self {
            Self(DMat4::IDENTITY)
        }
    }

    impl Default for Transform {
        fn default() -> Self {
            Self::identity()
        }
    }

    /// 轴对齐包围盒，用于估算模型范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds3D {
        min: Point3,
        max: Point3,
    }

    impl Bounds3D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
                max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y() || self.min.z() > self.max.z()
        }

        #[inline]
        pub fn min(&self) -> Point3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point3 {
            self.max
        }

        pub fn include_point(&mut self, point: Point3) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point3(self.min.as_vec3().min(point.as_vec3()));
            self.max = Point3(self.max.as_vec3().max(point.as_vec3()));
        }

        #[inline]
        pub fn size(&self) -> Vector3 {
            if self.is_empty() {
                Vector3::zero()
            } else {
                self.min.vector_to(self.max)
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn bounds_grow_with_points() {
            let mut bounds = Bounds3D::empty();
            assert!(bounds.is_empty());
            bounds.include_point(Point3::new(1.0, -2.0, 3.0));
            bounds.include_point(Point3::new(-1.0, 4.0, 0.0));
            assert!(!bounds.is_empty());
            assert_eq!(bounds.min(), Point3::new(-1.0, -2.0, 0.0));
            assert_eq!(bounds.max(), Point3::new(1.0, 4.0, 3.0));
            assert_eq!(bounds.size(), Vector3::new(2.0, 6.0, 3.0));
            assert_eq!(Bounds3D::empty().size(), Vector3::zero());
        }

        #[test]
        fn points_compare_within_tolerance() {
            let a = Point3::new(1.0, 2.0, 3.0);
            let b = Point3::new(1.0, 2.0, 3.0 + 1e-10);
            assert!(a.approx_eq(b, 1e-9));
            assert!(!a.approx_eq(Point3::origin(), 1e-9));
            assert_eq!(Point3::origin().vector_to(a), Vector3::new(1.0, 2.0, 3.0));
            assert_eq!(Transform::default(), Transform::identity());
        }
    }
}
