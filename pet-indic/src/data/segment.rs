//! 分割 (segmentation) 及其中的命名区域 (segment).
//!
//! 每个区域以二值标签图作为其栅格化表示, 该标签图位于区域自身的网格上,
//! 与任何参考图像的网格均无关. 只有在构建统计掩码时, 区域才会被重采样到参考网格.

use nalgebra::Matrix4;

use super::LabelMap;

/// 分割中的一个命名区域.
#[derive(Debug, Clone)]
pub struct Segment {
    id: String,
    labelmap: Option<LabelMap>,
}

impl Segment {
    /// 创建一个带有栅格化表示的区域.
    pub fn new(id: impl Into<String>, labelmap: LabelMap) -> Self {
        Self {
            id: id.into(),
            labelmap: Some(labelmap),
        }
    }

    /// 创建一个尚无栅格化表示的区域 (例如仅有表面表示).
    pub fn without_labelmap(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            labelmap: None,
        }
    }

    /// 区域标识.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 区域的二值标签图表示. 非零体素视为区域内部.
    #[inline]
    pub fn labelmap(&self) -> Option<&LabelMap> {
        self.labelmap.as_ref()
    }
}

/// 一组有序的命名区域, 以及该分割坐标系到参考图像坐标系的变换.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    segments: Vec<Segment>,
    to_reference: Option<Matrix4<f64>>,
}

impl Segmentation {
    /// 创建空分割, 与参考图像位于同一坐标系.
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置分割世界坐标到参考图像世界坐标的变换.
    pub fn with_transform(mut self, to_reference: Matrix4<f64>) -> Self {
        self.to_reference = Some(to_reference);
        self
    }

    /// 分割世界坐标到参考图像世界坐标的变换. 未设置时为单位变换.
    #[inline]
    pub fn to_reference(&self) -> Matrix4<f64> {
        self.to_reference.unwrap_or_else(Matrix4::identity)
    }

    /// 生成以 `base` 为前缀且未被占用的区域标识: `base`, `base_1`, `base_2`, ...
    pub fn generate_unique_id(&self, base: &str) -> String {
        if self.segment(base).is_none() {
            return base.to_string();
        }
        let mut n = 1u32;
        loop {
            let id = format!("{base}_{n}");
            if self.segment(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    /// 追加区域. 若标识已存在则替换原区域并返回 `false`.
    pub fn add_segment(&mut self, segment: Segment) -> bool {
        match self.segments.iter_mut().find(|s| s.id == segment.id) {
            Some(old) => {
                *old = segment;
                false
            }
            None => {
                self.segments.push(segment);
                true
            }
        }
    }

    /// 以未被占用的标识 (由 `base` 生成) 追加区域, 返回实际使用的标识.
    pub fn add_labelmap_segment(&mut self, base: &str, labelmap: LabelMap) -> String {
        let id = self.generate_unique_id(base);
        self.segments.push(Segment::new(id.clone(), labelmap));
        id
    }

    /// 按标识查找区域.
    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// 按插入顺序迭代区域标识.
    pub fn segment_ids(&self) -> impl ExactSizeIterator<Item = &str> {
        self.segments.iter().map(Segment::id)
    }

    /// 区域个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// 是否不含任何区域?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
