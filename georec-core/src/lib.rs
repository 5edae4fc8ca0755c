pub mod dialect;
pub mod record;
pub mod word;

pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 三维测点坐标，内部以 `glam::DVec3` 表示（东坐标、北坐标、高程）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(easting: f64, northing: f64, height: f64) -> Self {
            Self(DVec3::new(easting, northing, height))
        }

        #[inline]
        pub fn easting(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn northing(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn height(self) -> f64 {
            self.0.z
        }

        /// 两点之间的斜距（三维欧氏距离）。
        #[inline]
        pub fn distance(self, other: Point3) -> f64 {
            self.0.distance(other.0)
        }

        /// 两点之间的平距，忽略高程分量。
        #[inline]
        pub fn horizontal_distance(self, other: Point3) -> f64 {
            self.0.truncate().distance(other.0.truncate())
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

}
