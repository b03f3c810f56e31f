//! 将区域的原生二值标签图重采样到参考图像网格, 得到统计用的标签掩码.
//!
//! 重采样使用最近邻插值, 且不会超出参考图像的范围进行填充.
//! 参考网格上每个体素中心依次经过
//! `参考 IJK -> 参考世界坐标 -> 分割世界坐标 -> 区域 IJK` 的变换,
//! 四舍五入后落在区域内部 (非零) 的体素被置为 [`FOREGROUND`].

use log::debug;
use nalgebra::{Matrix4, Vector4};
use ndarray::{ArrayViewMut2, Axis};

use super::{LabelMap, Segmentation, VolumeAttr};
use crate::consts::label::{is_foreground, FOREGROUND};
use crate::Idx3d;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 参考网格上的闭区间包围盒, 按 `(i, j, k)` 给出.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Extent {
    lo: [usize; 3],
    hi: [usize; 3],
}

impl Extent {
    #[inline]
    fn contains_k(&self, k: usize) -> bool {
        self.lo[2] <= k && k <= self.hi[2]
    }
}

/// 计算区域网格 (含半个体素的边界) 在参考网格上覆盖的范围.
///
/// 若与参考网格不相交 (零范围), 返回 `None`.
fn overlap(src: &LabelMap, src_to_ref: &Matrix4<f64>, reference: Idx3d) -> Option<Extent> {
    let (sz, sy, sx) = src.shape();
    let bounds = [
        [-0.5, sx as f64 - 0.5],
        [-0.5, sy as f64 - 0.5],
        [-0.5, sz as f64 - 0.5],
    ];
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for corner in 0..8 {
        let p = src_to_ref
            * Vector4::new(
                bounds[0][corner & 1],
                bounds[1][(corner >> 1) & 1],
                bounds[2][(corner >> 2) & 1],
                1.0,
            );
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }

    let (rz, ry, rx) = reference;
    let dims = [rx, ry, rz];
    let mut extent = Extent {
        lo: [0; 3],
        hi: [0; 3],
    };
    for axis in 0..3 {
        let lo = min[axis].ceil().max(0.0);
        let hi = max[axis].floor().min(dims[axis] as f64 - 1.0);
        if !(lo <= hi) {
            return None;
        }
        extent.lo[axis] = lo as usize;
        extent.hi[axis] = hi as usize;
    }
    Some(extent)
}

/// 填充参考网格上第 `k` 层切片.
fn fill_slice(
    k: usize,
    mut slice: ArrayViewMut2<'_, u8>,
    src: &LabelMap,
    ref_to_src: &Matrix4<f64>,
    extent: &Extent,
) {
    if !extent.contains_k(k) {
        return;
    }
    for j in extent.lo[1]..=extent.hi[1] {
        for i in extent.lo[0]..=extent.hi[0] {
            let p = ref_to_src * Vector4::new(i as f64, j as f64, k as f64, 1.0);
            let inside = src
                .geometry()
                .index_of([p.x, p.y, p.z])
                .is_some_and(|idx| is_foreground(src[idx]));
            if inside {
                slice[(j, i)] = FOREGROUND;
            }
        }
    }
}

/// 将分割 `segmentation` 中标识为 `segment_id` 的区域重采样到 `reference` 的网格上.
///
/// # 返回值
///
/// 以下情况返回 `None`, 表示 "无统计数据可用", 而不是错误:
///
/// 1. 参考图像没有像素数据;
/// 2. 区域不存在, 或没有二值标签图表示;
/// 3. 区域标签图为空, 或与参考网格不相交;
/// 4. 某个空间变换不可逆.
///
/// 否则返回与参考网格对齐的标签图, 区域内部体素为 [`FOREGROUND`], 其余为 0.
/// 返回的标签图是临时产物, 调用者用完即可丢弃.
pub fn label_map_from_segment<V: VolumeAttr>(
    segmentation: &Segmentation,
    segment_id: &str,
    reference: &V,
) -> Option<LabelMap> {
    if reference.is_empty() {
        debug!("reference volume has no voxels, skip segment `{segment_id}`");
        return None;
    }
    let src = segmentation.segment(segment_id)?.labelmap()?;
    if src.is_empty() {
        debug!("segment `{segment_id}` has an empty labelmap");
        return None;
    }

    let ref_ijk_to_world = reference.geometry().ijk_to_world();
    let seg_to_ref = segmentation.to_reference();
    let src_to_ref = ref_ijk_to_world.try_inverse()? * seg_to_ref * src.geometry().ijk_to_world();
    let ref_to_src = src_to_ref.try_inverse()?;

    let Some(extent) = overlap(src, &src_to_ref, reference.shape()) else {
        debug!("segment `{segment_id}` does not intersect the reference grid");
        return None;
    };

    let mut out = LabelMap::zeros(reference.geometry().clone());
    fill_all(&mut out, src, &ref_to_src, &extent);
    Some(out)
}

#[cfg(feature = "rayon")]
fn fill_all(out: &mut LabelMap, src: &LabelMap, ref_to_src: &Matrix4<f64>, extent: &Extent) {
    out.data_mut()
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(k, slice)| fill_slice(k, slice, src, ref_to_src, extent));
}

#[cfg(not(feature = "rayon"))]
fn fill_all(out: &mut LabelMap, src: &LabelMap, ref_to_src: &Matrix4<f64>, extent: &Extent) {
    out.data_mut()
        .axis_iter_mut(Axis(0))
        .enumerate()
        .for_each(|(k, slice)| fill_slice(k, slice, src, ref_to_src, extent));
}
