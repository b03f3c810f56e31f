//! 外部统计计算引擎的调用契约.
//!
//! 引擎接收灰度图像, 标签图, 整数标签值, 以及每个统计量一个布尔开关;
//! 计算完成后, 按固定顺序输出一组 `名称 = 值` 的结果项. 值为格式化后的数字,
//! 或表示 "未计算" 的占位值 `--`.
//!
//! 引擎本身的算法 (百分位插值, 糖酵解和 SAM 公式, 峰值球搜索等) 对本 crate
//! 不透明, 本模块只负责契约本身.

use std::collections::BTreeSet;
use std::process::ExitStatus;

use thiserror::Error;

use crate::consts::engine::{GRAYSCALE_IMAGE, LABEL_IMAGE, LABEL_VALUE};
use crate::data::{LabelMap, PetScan};
use crate::stats::StatisticKey;

mod params;
mod process;

pub use params::{parse_return_parameters, EngineResponse, OutputSlot, OUTPUT_GROUP};
pub use process::CliEngine;

/// 调用引擎失败.
#[derive(Error, Debug)]
pub enum EngineError {
    /// 读写临时文件, 或启动引擎进程失败.
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 写入引擎输入图像失败.
    #[error("failed to write engine input volume: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 引擎以非零状态退出.
    #[error("engine exited with {status}: {stderr}")]
    Failed {
        /// 退出状态.
        status: ExitStatus,
        /// 标准错误输出的末尾部分.
        stderr: String,
    },

    /// 引擎正常退出, 但没有写出结果.
    #[error("engine did not write its return parameters")]
    MissingOutput,
}

/// 一次引擎调用的输入.
#[derive(Debug, Clone)]
pub struct EngineRequest<'a> {
    /// 灰度参考图像.
    pub grayscale: &'a PetScan,
    /// 与参考图像对齐的标签图.
    pub label_map: &'a LabelMap,
    /// 参与统计的标签值.
    pub label_value: u8,
    /// 需要开启的统计量.
    pub keys: BTreeSet<StatisticKey>,
}

impl<'a> EngineRequest<'a> {
    /// 构建请求.
    pub fn new(
        grayscale: &'a PetScan,
        label_map: &'a LabelMap,
        label_value: u8,
        keys: impl IntoIterator<Item = StatisticKey>,
    ) -> Self {
        Self {
            grayscale,
            label_map,
            label_value,
            keys: keys.into_iter().collect(),
        }
    }

    /// 按规范顺序迭代需要开启的引擎参数名.
    pub fn enabled_flags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.iter().map(|k| k.engine_name())
    }

    /// 展开成扁平的参数表.
    ///
    /// `grayscale_id` 和 `label_id` 为引擎用来定位两幅图像的标识 (如文件路径).
    /// 参数依次为 `Grayscale_Image`, `Label_Image`, `Label_Value`, 之后是每个开启的
    /// 统计量 `<引擎参数名> = true`.
    pub fn parameters(&self, grayscale_id: &str, label_id: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (GRAYSCALE_IMAGE, grayscale_id.to_string()),
            (LABEL_IMAGE, label_id.to_string()),
            (LABEL_VALUE, self.label_value.to_string()),
        ];
        params.extend(self.enabled_flags().map(|flag| (flag, "true".to_string())));
        params
    }
}

/// 统计计算引擎. 调用是同步的: 返回时计算已经结束.
pub trait StatisticsEngine {
    /// 执行一次计算.
    fn execute(&mut self, request: &EngineRequest<'_>) -> Result<EngineResponse, EngineError>;
}

impl<E: StatisticsEngine + ?Sized> StatisticsEngine for &mut E {
    #[inline]
    fn execute(&mut self, request: &EngineRequest<'_>) -> Result<EngineResponse, EngineError> {
        (**self).execute(request)
    }
}

impl<E: StatisticsEngine + ?Sized> StatisticsEngine for Box<E> {
    #[inline]
    fn execute(&mut self, request: &EngineRequest<'_>) -> Result<EngineResponse, EngineError> {
        (**self).execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineRequest;
    use crate::data::{Geometry, LabelMap, PetScan};
    use crate::stats::StatisticKey;
    use ndarray::Array3;

    #[test]
    fn test_parameters_in_canonical_order() {
        let g = Geometry::new((1, 1, 1), [1.0; 3], [0.0; 3]);
        let scan = PetScan::new(g.clone(), Array3::zeros((1, 1, 1))).unwrap();
        let map = LabelMap::zeros(g);
        let req = EngineRequest::new(
            &scan,
            &map,
            1,
            [StatisticKey::Peak, StatisticKey::Q1Distribution, StatisticKey::Mean],
        );
        let params = req.parameters("pet.nii", "mask.nii");
        let names: Vec<_> = params.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "Grayscale_Image",
                "Label_Image",
                "Label_Value",
                "Mean",
                "Q1_Distribution",
                "Peak"
            ]
        );
        assert_eq!(params[2].1, "1");
        assert!(params[3..].iter().all(|(_, v)| v == "true"));
    }
}
