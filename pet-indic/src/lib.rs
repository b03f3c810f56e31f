#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 为 PET 扫描中的分割区域组装定量指标 (SUV 统计, TLG, SAM, 峰值等)
//! 的计算请求, 调用外部计算引擎, 并将引擎输出映射回带元信息的统计结果.
//!
//! 该 crate 不实现任何统计算法本身: 百分位, 糖酵解, SAM 和峰值球搜索都由外部
//! 引擎完成. 本 crate 负责的是引擎之外的部分.
//!
//! # 注意
//!
//! 1. 所有三维数组按照 `(z, y, x)` 访问, 而空间变换按照 `(i, j, k)` 书写.
//!   参见 [`data::geometry`].
//! 2. 统计量计算不会向调用者报错. 缺少输入, 掩码为空, 或引擎失败时,
//!   只会得到更少 (或空) 的结果, 同时输出日志.
//!
//! # 开发计划
//!
//! ### 统计量标识与引擎参数名对应表 ✅
//!
//! 22 个统计量, 两张表均为 `match` 表达式, 互为逆映射.
//!
//! 实现位于 `pet-indic/src/stats/key.rs`.
//!
//! ### 统计量元信息与单位解析 ✅
//!
//! 1. 每个统计量的名称, 说明, 单位和 DICOM 编码. ✅
//! 2. 体素值单位按 `编码条目 > 单位编码值属性 > 未解析` 的顺序解析. ✅
//! 3. 结果表格的简化单位推导. ✅
//!
//! 实现位于 `pet-indic/src/stats/{measurement, units}.rs`.
//!
//! ### 区域到参考网格的标签掩码 ✅
//!
//! 最近邻重采样, 不超出参考图像范围. 开启 `rayon` 时按切片并行.
//!
//! 实现位于 `pet-indic/src/data/resample.rs`.
//!
//! ### 引擎请求 / 响应契约, 子进程引擎 ✅
//!
//! 实现位于 `pet-indic/src/engine`.
//!
//! ### 结果表格与 CSV 导出 ✅
//!
//! 实现位于 `pet-indic/src/report`.
//!
//! ### 引擎内部算法 ⌛️
//!
//! 不在本 crate 范围内. 引擎作为外部可执行文件, 视为已经正确的依赖.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod config;
pub mod consts;
pub mod data;
pub mod engine;
pub mod prelude;
pub mod report;
pub mod stats;

pub use data::{Geometry, LabelMap, PetScan, Segment, Segmentation, VolumeAttr};
pub use engine::{CliEngine, EngineError, EngineRequest, EngineResponse, StatisticsEngine};
pub use stats::{
    CodedEntry, ImageUnits, MeasurementInfo, PetVolumeStatistics, StatisticKey,
    StatisticsProvider, StatisticsResult,
};
