//! 统计量的标识, 元信息和计算.
//!
//! 实际的数值计算由外部引擎完成, 见 [`crate::engine`]. 该模块负责
//! 请求与响应之间的映射, 以及统计量的描述性元信息.

mod calculator;
mod key;
mod measurement;
mod result;
mod units;

pub use calculator::{PetVolumeStatistics, StatisticsProvider};
pub use key::{Category, ParseKeyError, StatisticKey};
pub use measurement::{measurement_info, CodedEntry, MeasurementInfo, ParseCodeError};
pub use result::StatisticsResult;
pub use units::{units_for_index, ImageUnits};
