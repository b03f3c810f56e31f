//! 几何体模 (phantom) 的栅格化.
//!
//! 仅用于构造测试数据和演示数据, 不是通用的表面到标签图转换.

use super::{Geometry, LabelMap};
use crate::consts::label::FOREGROUND;

/// 世界坐标系中的球体.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    /// 球心世界坐标, 以毫米为单位.
    pub center: [f64; 3],
    /// 半径, 以毫米为单位.
    pub radius: f64,
}

impl Sphere {
    /// 构建球体. 半径必须为正的有限值, 否则返回 `None`.
    pub fn new(center: [f64; 3], radius: f64) -> Option<Self> {
        (radius.is_finite() && radius > 0.0).then_some(Self { center, radius })
    }

    /// 世界坐标 `p` 是否在球内 (含边界)?
    #[inline]
    pub fn contains(&self, p: [f64; 3]) -> bool {
        let d2: f64 = p
            .iter()
            .zip(self.center.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        d2 <= self.radius * self.radius
    }

    /// 以 `spacing` 为分辨率, 在恰好包住球体的轴对齐网格上栅格化.
    ///
    /// 这模拟了区域自身的原生分辨率二值表示: 网格与任何参考图像无关.
    pub fn rasterize(&self, spacing: [f64; 3]) -> LabelMap {
        let mut origin = [0.0; 3];
        let mut dims = [0usize; 3];
        for axis in 0..3 {
            let n = (2.0 * self.radius / spacing[axis]).ceil() as usize + 1;
            dims[axis] = n;
            origin[axis] = self.center[axis] - (n - 1) as f64 * spacing[axis] / 2.0;
        }
        let geometry = Geometry::new((dims[2], dims[1], dims[0]), spacing, origin);
        self.rasterize_on(geometry)
    }

    /// 在给定网格上栅格化: 体素中心落在球内的体素为前景.
    pub fn rasterize_on(&self, geometry: Geometry) -> LabelMap {
        let mut map = LabelMap::zeros(geometry.clone());
        map.data_mut().indexed_iter_mut().for_each(|(pos, p)| {
            if self.contains(geometry.world_of(super::geometry::ijk_of(pos))) {
                *p = FOREGROUND;
            }
        });
        map
    }
}

#[cfg(test)]
mod tests {
    use super::Sphere;
    use crate::data::VolumeAttr;

    #[test]
    fn test_invalid_radius() {
        assert!(Sphere::new([0.0; 3], 0.0).is_none());
        assert!(Sphere::new([0.0; 3], f64::NAN).is_none());
    }

    #[test]
    fn test_rasterize_volume() {
        let s = Sphere::new([10.0, -5.0, 3.0], 10.0).unwrap();
        let map = s.rasterize([1.0, 1.0, 1.0]);
        assert_eq!(map.shape(), (21, 21, 21));
        // 4/3 * pi * r^3 ~= 4188.79
        let n = map.foreground_count() as f64;
        assert!((n - 4188.79).abs() / 4188.79 < 0.05, "{n}");
        assert_eq!(map[(10, 10, 10)], 1);
        assert_eq!(map[(0, 0, 0)], 0);
    }
}
