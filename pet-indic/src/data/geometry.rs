//! 体素网格的空间几何信息.
//!
//! 数组一律按照 `(z, y, x)` 访问, 与 `ndarray` 的行优先存储一致.
//! 而空间变换按照 `(i, j, k)` == `(x, y, z)` 的体素索引书写, 这与
//! NIfTI 和主流医学图像工具的约定相同. 两者之间的转换由 [`ijk_of`]
//! 和 [`Geometry::index_of`] 完成.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::Idx3d;

/// 体素连续索引 `(i, j, k)`.
pub type Ijk = [f64; 3];

/// 将 `(z, y, x)` 数组下标转换为 `(i, j, k)` 体素索引.
#[inline]
pub fn ijk_of((z, y, x): Idx3d) -> Ijk {
    [x as f64, y as f64, z as f64]
}

/// 体素网格的几何描述: 形状, 分辨率, 原点和方向矩阵.
///
/// 该结构是只读的. 若要修改几何参数, 你应该创建新的实例.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// `(z, y, x)`.
    shape: Idx3d,
    /// 沿 `(i, j, k)` 方向的体素分辨率, 以毫米为单位.
    spacing: [f64; 3],
    /// 体素 `(0, 0, 0)` 中心的世界坐标, 以毫米为单位.
    origin: [f64; 3],
    /// 列向量分别为 `i`, `j`, `k` 轴的单位方向.
    directions: Matrix3<f64>,
}

impl Geometry {
    /// 以单位方向矩阵构建几何描述.
    ///
    /// `shape` 按 `(z, y, x)` 给出, `spacing` 和 `origin` 按 `(x, y, z)` 给出.
    pub fn new(shape: Idx3d, spacing: [f64; 3], origin: [f64; 3]) -> Self {
        Self {
            shape,
            spacing,
            origin,
            directions: Matrix3::identity(),
        }
    }

    /// 替换方向矩阵. 矩阵的列向量应当为单位向量.
    pub fn with_directions(mut self, directions: Matrix3<f64>) -> Self {
        self.directions = directions;
        self
    }

    /// 从 IJK 到世界坐标的仿射矩阵反推几何描述.
    ///
    /// 若某一列为零向量 (退化矩阵), 则该方向的分辨率记为 1, 方向取对应坐标轴.
    pub fn from_ijk_to_world(shape: Idx3d, m: &Matrix4<f64>) -> Self {
        let mut spacing = [1.0; 3];
        let mut directions = Matrix3::identity();
        for axis in 0..3 {
            let col = Vector3::new(m[(0, axis)], m[(1, axis)], m[(2, axis)]);
            let norm = col.norm();
            if norm > 0.0 {
                spacing[axis] = norm;
                directions.set_column(axis, &(col / norm));
            }
        }
        Self {
            shape,
            spacing,
            origin: [m[(0, 3)], m[(1, 3)], m[(2, 3)]],
            directions,
        }
    }

    /// 数据形状 `(z, y, x)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.shape
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (z, y, x) = self.shape;
        z * y * x
    }

    /// 网格是否不含任何体素?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// 沿 `(i, j, k)` 方向的体素分辨率.
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// 原点世界坐标.
    #[inline]
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// 方向矩阵.
    #[inline]
    pub fn directions(&self) -> &Matrix3<f64> {
        &self.directions
    }

    /// 单个体素的体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// IJK 到世界坐标的仿射矩阵.
    pub fn ijk_to_world(&self) -> Matrix4<f64> {
        let scaled = self.directions * Matrix3::from_diagonal(&Vector3::from(self.spacing));
        let mut m = scaled.to_homogeneous();
        m[(0, 3)] = self.origin[0];
        m[(1, 3)] = self.origin[1];
        m[(2, 3)] = self.origin[2];
        m
    }

    /// 世界坐标到 IJK 的仿射矩阵. 若方向矩阵或分辨率退化, 则返回 `None`.
    #[inline]
    pub fn world_to_ijk(&self) -> Option<Matrix4<f64>> {
        self.ijk_to_world().try_inverse()
    }

    /// 体素 `ijk` 中心的世界坐标.
    pub fn world_of(&self, ijk: Ijk) -> [f64; 3] {
        let p = self.ijk_to_world() * Vector4::new(ijk[0], ijk[1], ijk[2], 1.0);
        [p.x, p.y, p.z]
    }

    /// 将 (四舍五入后的) 体素索引转换为数组下标. 越界时返回 `None`.
    pub fn index_of(&self, ijk: Ijk) -> Option<Idx3d> {
        let (z, y, x) = self.shape;
        let round = |v: f64, len: usize| {
            let r = v.round();
            (r >= 0.0 && r < len as f64).then_some(r as usize)
        };
        Some((round(ijk[2], z)?, round(ijk[1], y)?, round(ijk[0], x)?))
    }
}
