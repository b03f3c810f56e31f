//! 分割区域统计量的计算入口.
//!
//! 计算流程:
//!
//! 1. 将区域重采样为参考扫描网格上的临时标签掩码;
//! 2. 组装引擎请求, 同步调用引擎;
//! 3. 读取引擎输出组中的非占位数值;
//! 4. 只保留被请求的统计量.
//!
//! 任何一步失败都只会导致结果变少, 不会向调用者报错.

use std::collections::BTreeSet;

use log::{debug, warn};

use super::{measurement_info, MeasurementInfo, StatisticKey, StatisticsResult};
use crate::consts::label::FOREGROUND;
use crate::data::resample::label_map_from_segment;
use crate::data::{LabelMap, PetScan, Segmentation, VolumeAttr};
use crate::engine::{EngineRequest, StatisticsEngine};

/// 按区域计算统计量的能力.
pub trait StatisticsProvider {
    /// 计算分割中区域 `segment_id` 的统计量. 无数据可用时返回空结果.
    fn compute_statistics(
        &mut self,
        segmentation: &Segmentation,
        segment_id: &str,
    ) -> StatisticsResult;

    /// 统计量 `key` 的元信息.
    fn measurement_info(&self, key: StatisticKey) -> MeasurementInfo;
}

/// 基于 PET 扫描和外部引擎的统计量计算器.
pub struct PetVolumeStatistics<'a, E> {
    engine: E,
    scan: &'a PetScan,
    requested: BTreeSet<StatisticKey>,
}

impl<'a, E: StatisticsEngine> PetVolumeStatistics<'a, E> {
    /// 以参考扫描 `scan` 创建计算器. 默认请求 [`StatisticKey::DEFAULT`].
    pub fn new(engine: E, scan: &'a PetScan) -> Self {
        Self {
            engine,
            scan,
            requested: StatisticKey::DEFAULT.iter().copied().collect(),
        }
    }

    /// 参考扫描.
    #[inline]
    pub fn scan(&self) -> &'a PetScan {
        self.scan
    }

    /// 底层引擎.
    #[inline]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// 当前请求的统计量, 按规范顺序.
    #[inline]
    pub fn requested(&self) -> &BTreeSet<StatisticKey> {
        &self.requested
    }

    /// 替换请求的统计量.
    pub fn set_requested(&mut self, keys: impl IntoIterator<Item = StatisticKey>) {
        self.requested = keys.into_iter().collect();
    }

    /// 开启或关闭单个统计量.
    pub fn set_enabled(&mut self, key: StatisticKey, enabled: bool) {
        if enabled {
            self.requested.insert(key);
        } else {
            self.requested.remove(&key);
        }
    }

    /// 请求全部统计量.
    pub fn request_all(&mut self) {
        self.set_requested(StatisticKey::ALL.iter().copied());
    }

    /// 清空请求.
    pub fn clear(&mut self) {
        self.requested.clear();
    }

    /// 计算已有标签图 `label_map` 中标签值为 `label_value` 的区域的统计量.
    ///
    /// 标签图必须与参考扫描位于同一网格.
    pub fn compute_for_label(&mut self, label_map: &LabelMap, label_value: u8) -> StatisticsResult {
        if self.requested.is_empty() || self.scan.is_empty() || label_map.is_empty() {
            return StatisticsResult::new();
        }
        if label_map.shape() != self.scan.shape() {
            warn!(
                "label map shape {:?} differs from scan shape {:?}",
                label_map.shape(),
                self.scan.shape()
            );
            return StatisticsResult::new();
        }
        if label_map.count(label_value) == 0 {
            debug!("label {label_value} is absent from the label map");
            return StatisticsResult::new();
        }

        let request = EngineRequest::new(
            self.scan,
            label_map,
            label_value,
            self.requested.iter().copied(),
        );
        let response = match self.engine.execute(&request) {
            Ok(response) => response,
            Err(e) => {
                warn!("statistics engine failed for label {label_value}: {e}");
                return StatisticsResult::new();
            }
        };

        let result: StatisticsResult = response
            .raw_values()
            .into_iter()
            .filter_map(|(name, value)| StatisticKey::from_engine_name(&name).map(|k| (k, value)))
            .filter(|(key, _)| self.requested.contains(key))
            .collect();
        debug!(
            "label {label_value}: {} of {} requested statistics available",
            result.len(),
            self.requested.len()
        );
        result
    }

    /// 依次计算分割中每个区域的统计量, 按区域顺序返回.
    pub fn compute_all_segments(
        &mut self,
        segmentation: &Segmentation,
    ) -> Vec<(String, StatisticsResult)> {
        segmentation
            .segment_ids()
            .map(|id| (id.to_string(), self.compute_statistics(segmentation, id)))
            .collect()
    }

    /// 依次计算标签图中每个非零标签值的统计量, 按标签值升序返回.
    pub fn compute_all_labels(&mut self, label_map: &LabelMap) -> Vec<(u8, StatisticsResult)> {
        label_map
            .labels()
            .into_iter()
            .map(|value| (value, self.compute_for_label(label_map, value)))
            .collect()
    }
}

impl<'a, E: StatisticsEngine> StatisticsProvider for PetVolumeStatistics<'a, E> {
    fn compute_statistics(
        &mut self,
        segmentation: &Segmentation,
        segment_id: &str,
    ) -> StatisticsResult {
        if self.requested.is_empty() {
            return StatisticsResult::new();
        }
        // 掩码仅在本次计算期间存在.
        match label_map_from_segment(segmentation, segment_id, self.scan) {
            Some(mask) => self.compute_for_label(&mask, FOREGROUND),
            None => {
                debug!("no statistics available for segment `{segment_id}`");
                StatisticsResult::new()
            }
        }
    }

    fn measurement_info(&self, key: StatisticKey) -> MeasurementInfo {
        measurement_info(key, &self.scan.voxel_units())
    }
}

#[cfg(test)]
mod tests {
    use super::{PetVolumeStatistics, StatisticsProvider};
    use crate::data::phantom::Sphere;
    use crate::data::{Geometry, LabelMap, PetScan, Segment, Segmentation, VolumeAttr};
    use crate::engine::{EngineError, EngineRequest, EngineResponse, StatisticsEngine};
    use crate::stats::StatisticKey;
    use ndarray::Array3;

    /// 记录调用次数, 并对全部统计量返回标签体素数的引擎.
    #[derive(Default)]
    struct CountingEngine {
        calls: usize,
        fail: bool,
    }

    impl StatisticsEngine for CountingEngine {
        fn execute(&mut self, req: &EngineRequest<'_>) -> Result<EngineResponse, EngineError> {
            self.calls += 1;
            if self.fail {
                return Err(EngineError::MissingOutput);
            }
            let n = req.label_map.count(req.label_value) as f64;
            let mut r = EngineResponse::new();
            // 引擎总是输出全部统计量, 以及一个未知项.
            for key in StatisticKey::ALL {
                r.set_value(*key, n);
            }
            r.set("Variance_s", "1.0");
            Ok(r)
        }
    }

    fn scan() -> PetScan {
        let g = Geometry::new((10, 10, 10), [2.0; 3], [0.0; 3]);
        let mut scan = PetScan::new(g, Array3::from_elem((10, 10, 10), 2.0)).unwrap();
        scan.set_attribute(crate::consts::UNITS_CODE_VALUE_ATTRIBUTE, "{SUVbw}g/ml");
        scan
    }

    fn segmentation(scan: &PetScan) -> Segmentation {
        let mut seg = Segmentation::new();
        let sphere = Sphere::new([9.0, 9.0, 9.0], 4.0).unwrap();
        seg.add_labelmap_segment("Test", sphere.rasterize_on(scan.geometry().clone()));
        seg.add_segment(Segment::without_labelmap("Surface"));
        seg
    }

    #[test]
    fn test_projects_onto_requested_keys() {
        let scan = scan();
        let seg = segmentation(&scan);
        let mut calc = PetVolumeStatistics::new(CountingEngine::default(), &scan);
        let r = calc.compute_statistics(&seg, "Test");
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, StatisticKey::DEFAULT.to_vec());
        assert!(r.get(StatisticKey::Mean).unwrap() > 0.0);
        assert_eq!(calc.engine().calls, 1);
    }

    #[test]
    fn test_empty_request_skips_engine() {
        let scan = scan();
        let seg = segmentation(&scan);
        let mut calc = PetVolumeStatistics::new(CountingEngine::default(), &scan);
        calc.clear();
        assert!(calc.compute_statistics(&seg, "Test").is_empty());

        calc.set_enabled(StatisticKey::Sam, true);
        assert!(calc.compute_statistics(&seg, "Surface").is_empty());
        assert!(calc.compute_statistics(&seg, "Missing").is_empty());
        assert_eq!(calc.engine().calls, 0);

        let r = calc.compute_statistics(&seg, "Test");
        assert_eq!(r.keys().collect::<Vec<_>>(), vec![StatisticKey::Sam]);
        assert_eq!(calc.engine().calls, 1);
    }

    #[test]
    fn test_engine_failure_is_absorbed() {
        let scan = scan();
        let seg = segmentation(&scan);
        let engine = CountingEngine {
            fail: true,
            ..Default::default()
        };
        let mut calc = PetVolumeStatistics::new(engine, &scan);
        calc.request_all();
        assert_eq!(calc.requested().len(), 22);
        assert!(calc.compute_statistics(&seg, "Test").is_empty());
        assert_eq!(calc.engine().calls, 1);
    }

    #[test]
    fn test_compute_all() {
        let scan = scan();
        let seg = segmentation(&scan);
        let mut calc = PetVolumeStatistics::new(CountingEngine::default(), &scan);
        calc.set_requested([StatisticKey::Volume]);

        let per_segment = calc.compute_all_segments(&seg);
        assert_eq!(per_segment.len(), 2);
        assert_eq!(per_segment[0].0, "Test");
        assert!(per_segment[1].1.is_empty());

        let mut labels = LabelMap::zeros(scan.geometry().clone());
        labels[(0, 0, 0)] = 4;
        labels[(1, 0, 0)] = 4;
        labels[(2, 2, 2)] = 2;
        let per_label = calc.compute_all_labels(&labels);
        assert_eq!(per_label.len(), 2);
        assert_eq!(per_label[0].0, 2);
        assert_eq!(per_label[0].1.get(StatisticKey::Volume), Some(1.0));
        assert_eq!(per_label[1].1.get(StatisticKey::Volume), Some(2.0));

        // 网格不一致的标签图不送入引擎.
        let other = LabelMap::zeros(Geometry::new((2, 2, 2), [1.0; 3], [0.0; 3]));
        let calls = calc.engine().calls;
        assert!(calc.compute_for_label(&other, 1).is_empty());
        assert_eq!(calc.engine().calls, calls);
    }

    #[test]
    fn test_measurement_info_uses_scan_units() {
        let scan = scan();
        let calc = PetVolumeStatistics::new(CountingEngine::default(), &scan);
        let info = calc.measurement_info(StatisticKey::Median);
        assert_eq!(
            info.units.as_deref(),
            Some("Standardized Uptake Value body weight")
        );
        assert_eq!(calc.measurement_info(StatisticKey::Tlg).units.as_deref(), Some("g"));
    }
}
