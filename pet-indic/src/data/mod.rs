//! 体数据: PET 扫描, 标签图, 分割及其几何描述.

use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView, ArrayViewMut, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::consts::{label, UNITS_CODE_VALUE_ATTRIBUTE};
use crate::stats::{CodedEntry, ImageUnits};
use crate::Idx3d;

pub mod geometry;
mod io;
pub mod phantom;
pub mod resample;
pub mod segment;

pub use geometry::Geometry;
pub use segment::{Segment, Segmentation};

/// 体素网格数据的共用属性和部分通用操作.
pub trait VolumeAttr {
    /// 获取几何描述.
    fn geometry(&self) -> &Geometry;

    /// 获取数据形状大小 `(z, y, x)`.
    #[inline]
    fn shape(&self) -> Idx3d {
        self.geometry().shape()
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        self.geometry().size()
    }

    /// 是否不含任何体素 (即没有像素数据)?
    #[inline]
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, y0, x0): &Idx3d) -> bool {
        let (z, y, x) = self.shape();
        *z0 < z && *y0 < y && *x0 < x
    }

    /// 获取单个体素的体积, 以毫升为单位.
    #[inline]
    fn voxel_ml(&self) -> f64 {
        self.geometry().voxel_volume() * 1e-3
    }
}

/// 将 nifti 数据体转换为 `(z, y, x)` 行优先存储的三维数组.
macro_rules! read_volume {
    ($obj: expr, $elem: ty, $shape: expr) => {{
        let mut data = $obj.into_volume().into_ndarray::<$elem>()?;
        // 去掉长度为 1 的多余维度.
        while data.ndim() > 3 {
            let last = data.ndim() - 1;
            data = data.index_axis_move(Axis(last), 0);
        }
        // [x, y, z] -> [z, y, x].
        let data = data.permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 形状取自同一 header, 该操作不会生成 `Err`.
        Array3::<$elem>::from_shape_vec($shape, data.into_raw_vec())
            .expect("nifti volume shape mismatch")
    }};
}

/// 3D PET 扫描. 体素值以 `f32` 保存, 一般已经换算为 SUV.
///
/// 除体素和几何信息外, 还携带了宿主程序中常见的元信息:
/// 字符串属性表, 以及体素值的物理量 (quantity) 和单位 (units) 编码.
#[derive(Debug, Clone)]
pub struct PetScan {
    geometry: Geometry,
    data: Array3<f32>,
    attributes: BTreeMap<String, String>,
    quantity: Option<CodedEntry>,
    units: Option<CodedEntry>,
}

impl VolumeAttr for PetScan {
    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

impl Index<Idx3d> for PetScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for PetScan {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl PetScan {
    /// 打开 nii 文件格式的 3D PET 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        io::check_volume_dims(obj.header())?;
        let geometry = io::geometry_from_header(obj.header());
        let data = read_volume!(obj, f32, geometry.shape());
        Ok(Self::from_parts(geometry, data))
    }

    /// 根据几何描述和体素数据直接创建扫描. 若 `data` 形状与 `geometry` 不一致,
    /// 则返回 `None`.
    pub fn new(geometry: Geometry, data: Array3<f32>) -> Option<Self> {
        (data.dim() == geometry.shape()).then(|| Self::from_parts(geometry, data))
    }

    fn from_parts(geometry: Geometry, data: Array3<f32>) -> Self {
        Self {
            geometry,
            data,
            attributes: BTreeMap::new(),
            quantity: None,
            units: None,
        }
    }

    /// 将扫描保存为 nii 文件.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        io::write_scan(path.as_ref(), &self.geometry, self.data.view())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }

    /// 将所有体素乘以 `factor`. 一般用于将原始活度换算为 SUV.
    pub fn scale(&mut self, factor: f32) {
        self.data.mapv_inplace(|v| v * factor);
    }

    /// 设置字符串属性.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// 获取字符串属性. 不存在时返回 `None`.
    #[inline]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// 设置体素值的物理量编码.
    pub fn set_voxel_value_quantity(&mut self, quantity: CodedEntry) {
        self.quantity = Some(quantity);
    }

    /// 体素值的物理量编码.
    #[inline]
    pub fn voxel_value_quantity(&self) -> Option<&CodedEntry> {
        self.quantity.as_ref()
    }

    /// 设置体素值的单位编码.
    pub fn set_voxel_value_units(&mut self, units: CodedEntry) {
        self.units = Some(units);
    }

    /// 体素值的单位编码.
    #[inline]
    pub fn voxel_value_units(&self) -> Option<&CodedEntry> {
        self.units.as_ref()
    }

    /// 解析该扫描的体素值单位.
    ///
    /// 优先使用已设置的单位编码 (以及物理量编码); 否则回退到
    /// `DICOM.MeasurementUnitsCodeValue` 属性并查 SUV 单位表.
    pub fn voxel_units(&self) -> ImageUnits {
        match &self.units {
            Some(units) => ImageUnits::from_coded(self.quantity.clone(), units.clone()),
            None => self
                .attribute(UNITS_CODE_VALUE_ATTRIBUTE)
                .map_or_else(ImageUnits::unresolved, ImageUnits::from_code_value),
        }
    }
}

/// 3D 标签图. 标签值以 `u8` 保存, `0` 代表背景.
#[derive(Debug, Clone)]
pub struct LabelMap {
    geometry: Geometry,
    data: Array3<u8>,
}

impl VolumeAttr for LabelMap {
    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

impl Index<Idx3d> for LabelMap {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for LabelMap {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl LabelMap {
    /// 打开 nii 文件格式的 3D 标签图. `path` 为 nii 文件的本地路径. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        io::check_volume_dims(obj.header())?;
        let geometry = io::geometry_from_header(obj.header());
        let data = read_volume!(obj, u8, geometry.shape());
        Ok(Self { geometry, data })
    }

    /// 根据几何描述和标签数据直接创建标签图. 若 `data` 形状与 `geometry`
    /// 不一致, 则返回 `None`.
    pub fn new(geometry: Geometry, data: Array3<u8>) -> Option<Self> {
        (data.dim() == geometry.shape()).then_some(Self { geometry, data })
    }

    /// 创建与 `geometry` 对齐的全背景标签图.
    pub fn zeros(geometry: Geometry) -> Self {
        let data = Array3::from_elem(geometry.shape(), label::BACKGROUND);
        Self { geometry, data }
    }

    /// 将标签图保存为 nii 文件.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        io::write_label(path.as_ref(), &self.geometry, self.data.view())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }

    /// 获取值为 `value` 的体素个数.
    #[inline]
    pub fn count(&self, value: u8) -> usize {
        self.data.iter().filter(|p| **p == value).count()
    }

    /// 获取所有前景体素个数.
    #[inline]
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|p| label::is_foreground(**p)).count()
    }

    /// 收集出现过的所有非零标签值, 按升序排列.
    pub fn labels(&self) -> Vec<u8> {
        let mut seen = [false; 256];
        self.data.iter().for_each(|p| seen[*p as usize] = true);
        (1..=u8::MAX).filter(|v| seen[*v as usize]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, LabelMap, PetScan, VolumeAttr};
    use crate::stats::CodedEntry;
    use ndarray::{Array3, Array4};
    use nifti::writer::WriterOptions;

    fn geometry() -> Geometry {
        Geometry::new((2, 3, 4), [2.0, 2.0, 2.5], [0.0; 3])
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(PetScan::new(geometry(), Array3::zeros((2, 3, 3))).is_none());
        assert!(LabelMap::new(geometry(), Array3::zeros((3, 3, 4))).is_none());
        assert!(LabelMap::new(geometry(), Array3::zeros((2, 3, 4))).is_some());
    }

    #[test]
    fn test_label_statistics() {
        let mut map = LabelMap::zeros(geometry());
        assert!(map.labels().is_empty());
        map[(0, 0, 0)] = 2;
        map[(1, 2, 3)] = 2;
        map[(1, 1, 1)] = 1;
        assert_eq!(map.labels(), vec![1, 2]);
        assert_eq!(map.count(2), 2);
        assert_eq!(map.foreground_count(), 3);
        assert_eq!(map.size(), 24);
        assert!((map.voxel_ml() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_voxel_units_precedence() {
        let mut scan = PetScan::new(geometry(), Array3::zeros((2, 3, 4))).unwrap();
        assert!(scan.voxel_units().units().is_none());

        scan.set_attribute(crate::consts::UNITS_CODE_VALUE_ATTRIBUTE, "{SUVlbm}g/ml");
        assert_eq!(
            scan.voxel_units().units(),
            Some("Standardized Uptake Value lean body mass")
        );

        scan.set_voxel_value_units(CodedEntry::new("Bq/ml", "UCUM", "Becquerels/milliliter"));
        assert_eq!(scan.voxel_units().units(), Some("Becquerels/milliliter"));
        assert!(scan.voxel_units().quantity().is_none());
    }

    #[test]
    fn test_scale() {
        let mut scan = PetScan::new(geometry(), Array3::from_elem((2, 3, 4), 1000.0)).unwrap();
        scan.scale(0.004);
        assert!((scan[(1, 2, 3)] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_open_single_frame_4d() {
        let dir = tempfile::tempdir().unwrap();

        // (x, y, z, t) = (4, 3, 2, 1).
        let mut frame = Array4::<u8>::zeros((4, 3, 2, 1));
        frame[(1, 2, 0, 0)] = 5;
        let path = dir.path().join("frame.nii");
        WriterOptions::new(&path).write_nifti(&frame).unwrap();
        let map = LabelMap::open(&path).unwrap();
        assert_eq!(map.shape(), (2, 3, 4));
        assert_eq!(map[(0, 2, 1)], 5);
        assert_eq!(map.count(5), 1);

        let frames = Array4::<u8>::zeros((4, 3, 2, 2));
        let path = dir.path().join("frames.nii");
        WriterOptions::new(&path).write_nifti(&frames).unwrap();
        assert!(LabelMap::open(&path).is_err());
        assert!(PetScan::open(&path).is_err());
    }
}
