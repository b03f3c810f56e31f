//! 单个区域 (或标签值) 的统计结果.

use std::collections::BTreeMap;

use serde::Serialize;

use super::StatisticKey;

/// 统计量到数值的有序映射, 按规范顺序迭代.
///
/// 只包含既被请求, 又被引擎实际算出的统计量. 未被请求的, 或引擎输出为
/// 占位值的统计量一律不出现, 而不是以 `0` 或 `NaN` 填充.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatisticsResult(BTreeMap<StatisticKey, f64>);

impl StatisticsResult {
    /// 创建空结果.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一项统计量. 若已存在则覆盖, 并返回旧值.
    #[inline]
    pub fn insert(&mut self, key: StatisticKey, value: f64) -> Option<f64> {
        self.0.insert(key, value)
    }

    /// 读取一项统计量.
    #[inline]
    pub fn get(&self, key: StatisticKey) -> Option<f64> {
        self.0.get(&key).copied()
    }

    /// 是否包含统计量 `key`?
    #[inline]
    pub fn contains(&self, key: StatisticKey) -> bool {
        self.0.contains_key(&key)
    }

    /// 结果项个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空 (无统计数据可用)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按规范顺序迭代结果项.
    pub fn iter(&self) -> impl Iterator<Item = (StatisticKey, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// 按规范顺序迭代已有的统计量.
    pub fn keys(&self) -> impl Iterator<Item = StatisticKey> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(StatisticKey, f64)> for StatisticsResult {
    fn from_iter<T: IntoIterator<Item = (StatisticKey, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for StatisticsResult {
    type Item = (StatisticKey, f64);
    type IntoIter = std::collections::btree_map::IntoIter<StatisticKey, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
