//! nifti header 与 [`Geometry`] 之间的转换, 以及体数据的持久化存储.

use std::io;
use std::path::Path;

use nalgebra::{Matrix3, Matrix4, Vector3};
use ndarray::{ArrayView, Ix3};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;

use super::Geometry;
use crate::Idx3d;

/// 将 (x, y, z) 转换成 (z, y, x). 以后均按照该模式访问.
#[inline]
fn shape_from_header(h: &NiftiHeader) -> Idx3d {
    let [_, x, y, z, ..] = h.dim;
    (z as usize, y as usize, x as usize)
}

/// 检查 header 描述的是三维体数据.
///
/// 第 4 维及以后长度为 1 的维度 (如单帧 4D 导出) 可以接受, 读取时会被去掉.
pub(super) fn check_volume_dims(h: &NiftiHeader) -> nifti::Result<()> {
    let rank = usize::from(h.dim[0]);
    if (3..=7).contains(&rank) && h.dim[4..=rank].iter().all(|&d| d == 1) {
        return Ok(());
    }
    let dims = &h.dim[..=rank.min(7)];
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("expected a 3D volume, got dim {dims:?}"),
    )
    .into())
}

/// 按 `sform` > `qform` > `pixdim` 的优先级获取 IJK 到世界坐标的仿射矩阵.
fn affine_from_header(h: &NiftiHeader) -> Matrix4<f64> {
    let [_, dx, dy, dz, ..] = h.pixdim.map(|v| v as f64);
    if h.sform_code > 0 {
        let mut m = Matrix4::identity();
        for (row, srow) in [h.srow_x, h.srow_y, h.srow_z].iter().enumerate() {
            for (col, v) in srow.iter().enumerate() {
                m[(row, col)] = *v as f64;
            }
        }
        m
    } else if h.qform_code > 0 {
        let (b, c, d) = (h.quatern_b as f64, h.quatern_c as f64, h.quatern_d as f64);
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let rotation = Matrix3::new(
            a * a + b * b - c * c - d * d,
            2.0 * (b * c - a * d),
            2.0 * (b * d + a * c),
            2.0 * (b * c + a * d),
            a * a + c * c - b * b - d * d,
            2.0 * (c * d - a * b),
            2.0 * (b * d - a * c),
            2.0 * (c * d + a * b),
            a * a + d * d - c * c - b * b,
        );
        // qfac 只能为 1 或 -1, 为 0 时按 1 处理.
        let qfac = if h.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let scale = Vector3::new(dx, dy, dz * qfac);
        let mut m = (rotation * Matrix3::from_diagonal(&scale)).to_homogeneous();
        m[(0, 3)] = h.quatern_x as f64;
        m[(1, 3)] = h.quatern_y as f64;
        m[(2, 3)] = h.quatern_z as f64;
        m
    } else {
        let nonzero = |v: f64| if v > 0.0 { v } else { 1.0 };
        Matrix4::from_diagonal(&nalgebra::Vector4::new(
            nonzero(dx),
            nonzero(dy),
            nonzero(dz),
            1.0,
        ))
    }
}

/// 从 nifti header 读取几何描述.
pub(super) fn geometry_from_header(h: &NiftiHeader) -> Geometry {
    Geometry::from_ijk_to_world(shape_from_header(h), &affine_from_header(h))
}

/// 根据几何描述构造 nifti header. 仅写入 `sform`.
fn header_from_geometry(g: &Geometry) -> NiftiHeader {
    let mut header = NiftiHeader::default();
    let (z, y, x) = g.shape();
    header.dim = [3, x as u16, y as u16, z as u16, 1, 1, 1, 1];
    let [sx, sy, sz] = g.spacing();
    header.pixdim = [1.0, sx as f32, sy as f32, sz as f32, 1.0, 1.0, 1.0, 1.0];

    let m = g.ijk_to_world();
    let row = |r: usize| [0, 1, 2, 3].map(|c| m[(r, c)] as f32);
    header.sform_code = 1;
    header.qform_code = 0;
    (header.srow_x, header.srow_y, header.srow_z) = (row(0), row(1), row(2));
    header
}

/// 为每种体素类型生成将 `(z, y, x)` 组织的体数据写入 `path` 的函数.
macro_rules! impl_write_volume {
    ($($name: ident: $elem: ty),+) => {
        $(
            pub(super) fn $name(
                path: &Path,
                geometry: &Geometry,
                data: ArrayView<'_, $elem, Ix3>,
            ) -> nifti::Result<()> {
                let header = header_from_geometry(geometry);
                // [z, y, x] -> [x, y, z]. 写入器内部会再按 nifti 的列优先顺序展开.
                let data = data.reversed_axes();
                WriterOptions::new(path)
                    .reference_header(&header)
                    .write_nifti(&data)
            }
        )+
    };
}

impl_write_volume!(write_scan: f32, write_label: u8);
