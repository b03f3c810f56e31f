//! 按调用顺序回放预设输出的进程内引擎.

use pet_indic::prelude::*;

/// 一次调用时引擎看到的输入.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub label_value: u8,
    pub foreground: usize,
    pub keys: Vec<StatisticKey>,
    pub same_grid: bool,
}

/// 第 n 次调用回放第 n 组输出. 只输出被开启且有预设值的统计量, 其余为占位值.
/// 预设输出用完后, 再调用返回 [`EngineError::MissingOutput`].
pub struct ScriptedEngine {
    outputs: Vec<Vec<(StatisticKey, f64)>>,
    pub calls: Vec<RecordedCall>,
}

impl ScriptedEngine {
    pub fn new(outputs: Vec<Vec<(StatisticKey, f64)>>) -> Self {
        Self {
            outputs,
            calls: Vec::new(),
        }
    }

    /// 依次回放各区域的参考统计值.
    pub fn replaying(segments: &[&str]) -> Self {
        Self::new(
            segments
                .iter()
                .map(|s| super::fixture::reference_values(s).to_vec())
                .collect(),
        )
    }
}

impl StatisticsEngine for ScriptedEngine {
    fn execute(&mut self, request: &EngineRequest<'_>) -> Result<EngineResponse, EngineError> {
        let call = self.calls.len();
        self.calls.push(RecordedCall {
            label_value: request.label_value,
            foreground: request.label_map.count(request.label_value),
            keys: request.keys.iter().copied().collect(),
            same_grid: request.label_map.geometry() == request.grayscale.geometry(),
        });
        let values = self.outputs.get(call).ok_or(EngineError::MissingOutput)?;

        let mut response = EngineResponse::new();
        response.set_software_version("scripted");
        for (key, value) in values {
            if request.keys.contains(key) {
                response.set_value(*key, *value);
            }
        }
        // 真实引擎偶尔输出输出组之外的项.
        response.set("Variance_s", "14.55");
        Ok(response)
    }
}
