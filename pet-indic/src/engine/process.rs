//! 以子进程方式调用外部引擎可执行文件.
//!
//! 每次调用都在独立的临时目录中写入灰度图像和标签图 (nii 格式), 然后以
//! `--<参数名> [值]` 的形式传参, 并通过 `--returnparameterfile` 取回结果.
//! 临时目录在调用结束时 (无论成功与否) 被删除, 除非配置要求保留.
//! 每次调用的目录都是新建的, 不同引擎实例共用同一基础目录也不会互相干扰.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info, warn};
use tempfile::Builder;

use super::{parse_return_parameters, EngineError, EngineRequest, EngineResponse, StatisticsEngine};
use crate::config::EngineConfig;
use crate::consts::engine::RETURN_PARAMETER_FILE;

/// 引擎失败时, 错误信息中保留的标准错误输出的最大字节数.
const STDERR_TAIL: usize = 2048;

/// 取字符串末尾至多 `max` 字节, 且不截断 UTF-8 字符.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// 子进程引擎.
#[derive(Debug, Clone)]
pub struct CliEngine {
    config: EngineConfig,
}

impl CliEngine {
    /// 以可执行文件路径创建引擎, 其余配置取默认值.
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        Self::from_config(EngineConfig {
            executable: executable.into(),
            ..EngineConfig::default()
        })
    }

    /// 以完整配置创建引擎.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// 当前配置.
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 组装命令行参数. 值为 `true` 的布尔参数只写出开关本身.
    pub fn arguments(
        request: &EngineRequest<'_>,
        grayscale: &Path,
        label: &Path,
        return_file: &Path,
    ) -> Vec<OsString> {
        let params = request.parameters(&grayscale.to_string_lossy(), &label.to_string_lossy());
        let mut args = Vec::with_capacity(params.len() * 2 + 2);
        for (name, value) in params {
            args.push(OsString::from(format!("--{name}")));
            if value != "true" {
                args.push(OsString::from(value));
            }
        }
        args.push(OsString::from(format!("--{RETURN_PARAMETER_FILE}")));
        args.push(return_file.as_os_str().to_owned());
        args
    }
}

impl CliEngine {
    /// 在临时目录 `scratch` 中写入输入, 运行引擎并读取结果.
    fn run_in(
        &self,
        scratch: &Path,
        request: &EngineRequest<'_>,
    ) -> Result<EngineResponse, EngineError> {
        let grayscale = scratch.join("grayscale.nii");
        let label = scratch.join("label.nii");
        let return_file = scratch.join("return_parameters.txt");
        request.grayscale.save(&grayscale)?;
        request.label_map.save(&label)?;

        let args = Self::arguments(request, &grayscale, &label, &return_file);
        debug!("running {} {:?}", self.config.executable.display(), args);
        let output = Command::new(&self.config.executable).args(&args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed {
                status: output.status,
                stderr: tail(stderr.trim_end(), STDERR_TAIL).to_string(),
            });
        }

        let text = match fs::read_to_string(&return_file) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(EngineError::MissingOutput),
            Err(e) => return Err(e.into()),
        };
        Ok(parse_return_parameters(&text))
    }
}

impl StatisticsEngine for CliEngine {
    fn execute(&mut self, request: &EngineRequest<'_>) -> Result<EngineResponse, EngineError> {
        let base = self
            .config
            .scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&base)?;
        let scratch = Builder::new().prefix("pet-indic-").tempdir_in(&base)?;

        let response = self.run_in(scratch.path(), request);
        if self.config.keep_scratch {
            info!("engine scratch files kept in {}", scratch.into_path().display());
        } else if let Err(e) = scratch.close() {
            warn!("failed to remove engine scratch dir: {e}");
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::{tail, CliEngine};
    use crate::data::{Geometry, LabelMap, PetScan};
    use crate::engine::EngineRequest;
    use crate::stats::StatisticKey;
    use ndarray::Array3;
    use std::ffi::OsString;
    use std::path::Path;

    #[test]
    fn test_arguments() {
        let g = Geometry::new((1, 1, 1), [1.0; 3], [0.0; 3]);
        let scan = PetScan::new(g.clone(), Array3::zeros((1, 1, 1))).unwrap();
        let map = LabelMap::zeros(g);
        let req = EngineRequest::new(&scan, &map, 3, [StatisticKey::Tlg, StatisticKey::Mean]);
        let args = CliEngine::arguments(
            &req,
            Path::new("/s/g.nii"),
            Path::new("/s/l.nii"),
            Path::new("/s/r.txt"),
        );
        let expected: Vec<OsString> = [
            "--Grayscale_Image",
            "/s/g.nii",
            "--Label_Image",
            "/s/l.nii",
            "--Label_Value",
            "3",
            "--Mean",
            "--TLG",
            "--returnparameterfile",
            "/s/r.txt",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_tail_keeps_char_boundaries() {
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("错误信息", 4), "息");
    }
}
