//! 程序运行函数.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use log::{info, warn};
use pet_indic::config::ConfigError;
use pet_indic::consts::UNITS_CODE_VALUE_ATTRIBUTE;
use pet_indic::prelude::*;
use thiserror::Error;

use crate::result::Report;

/// 运行失败的原因.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open volume {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },

    #[error("label map shape {label:?} differs from scan shape {scan:?}")]
    ShapeMismatch { scan: Idx3d, label: Idx3d },

    #[error("failed to write csv {}: {source}", .path.display())]
    Csv { path: PathBuf, source: io::Error },
}

fn open_error<E: Display>(path: &Path) -> impl FnOnce(E) -> RunError + '_ {
    move |e| RunError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// 按配置文件 `config_path` 实际运行.
pub fn run(config_path: &Path) -> Result<Report, RunError> {
    let config: ReportConfig = load_config(config_path)?;

    let mut scan = PetScan::open(&config.scan).map_err(open_error(&config.scan))?;
    if let Some(factor) = config.scale {
        scan.scale(factor);
    }
    if let Some(units) = &config.units {
        scan.set_attribute(UNITS_CODE_VALUE_ATTRIBUTE, units.as_str());
    }
    let units = scan.voxel_units();
    if !units.is_resolved() {
        warn!("voxel units of {} are unknown", config.scan.display());
    }

    let labels = LabelMap::open(&config.label).map_err(open_error(&config.label))?;
    if labels.shape() != scan.shape() {
        return Err(RunError::ShapeMismatch {
            scan: scan.shape(),
            label: labels.shape(),
        });
    }

    let engine = match config.engine {
        Some(engine) => engine,
        None => EngineConfig::locate(None)?,
    };
    info!("using engine {}", engine.executable.display());

    let mut calc = PetVolumeStatistics::new(CliEngine::from_config(engine), &scan);
    calc.set_requested(config.keys.iter().copied());
    let results = compute_labels(&mut calc, &labels, config.label_values);
    info!("{} label(s) processed", results.len());

    if let Some(path) = &config.csv {
        write_csv(path, &config.keys, &results)?;
        info!("csv written to {}", path.display());
    }

    Ok(Report::new(units, results))
}

/// 依次统计 `values` 中的标签值. 未指定时统计标签图中出现的全部非零标签.
///
/// 背景标签不参与统计.
fn compute_labels<E: StatisticsEngine>(
    calc: &mut PetVolumeStatistics<'_, E>,
    labels: &LabelMap,
    values: Option<Vec<u8>>,
) -> Vec<(u8, StatisticsResult)> {
    let Some(values) = values else {
        return calc.compute_all_labels(labels);
    };
    values
        .into_iter()
        .filter(|&v| {
            if v == BACKGROUND {
                warn!("label value {BACKGROUND} is the background, skipped");
            }
            v != BACKGROUND
        })
        .map(|v| (v, calc.compute_for_label(labels, v)))
        .collect()
}

/// 将全部标签的结果以 CSV 格式写入 `path`.
fn write_csv(
    path: &Path,
    keys: &[StatisticKey],
    results: &[(u8, StatisticsResult)],
) -> Result<(), RunError> {
    let csv_error = |source| RunError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(csv_error)?;
    write_label_csv(BufWriter::new(file), keys, results).map_err(csv_error)
}

#[cfg(test)]
mod tests {
    use super::{compute_labels, run, write_csv, RunError};
    use ndarray::Array3;
    use pet_indic::prelude::*;
    use std::fs;

    /// 对全部统计量返回标签值本身的引擎.
    #[derive(Default)]
    struct EchoEngine {
        calls: Vec<u8>,
    }

    impl StatisticsEngine for EchoEngine {
        fn execute(&mut self, req: &EngineRequest<'_>) -> Result<EngineResponse, EngineError> {
            self.calls.push(req.label_value);
            let mut r = EngineResponse::new();
            for key in &req.keys {
                r.set_value(*key, f64::from(req.label_value));
            }
            Ok(r)
        }
    }

    fn volumes(label_shape: (usize, usize, usize)) -> (PetScan, LabelMap) {
        let scan = PetScan::new(
            Geometry::new((4, 4, 4), [2.0; 3], [0.0; 3]),
            Array3::from_elem((4, 4, 4), 1.0),
        )
        .unwrap();
        let mut labels = LabelMap::zeros(Geometry::new(label_shape, [2.0; 3], [0.0; 3]));
        labels[(0, 0, 0)] = 3;
        labels[(1, 1, 1)] = 1;
        (scan, labels)
    }

    #[test]
    fn test_label_selection() {
        let (scan, labels) = volumes((4, 4, 4));
        let mut calc = PetVolumeStatistics::new(EchoEngine::default(), &scan);
        calc.set_requested([StatisticKey::Mean]);

        let all = compute_labels(&mut calc, &labels, None);
        assert_eq!(all.iter().map(|(v, _)| *v).collect::<Vec<_>>(), [1, 3]);
        assert_eq!(all[1].1.get(StatisticKey::Mean), Some(3.0));

        // 背景被忽略; 不存在的标签值得到空结果, 且不调用引擎.
        let chosen = compute_labels(&mut calc, &labels, Some(vec![0, 3, 7]));
        assert_eq!(chosen.iter().map(|(v, _)| *v).collect::<Vec<_>>(), [3, 7]);
        assert!(chosen[1].1.is_empty());
        assert_eq!(calc.engine().calls, [1, 3, 3]);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let results = vec![(
            2,
            [(StatisticKey::Volume, 4.5)].into_iter().collect::<StatisticsResult>(),
        )];
        let path = dir.path().join("out.csv");
        write_csv(&path, &[StatisticKey::Volume], &results).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Label_Value,Volume,\n2,4.5,\n");

        let missing = dir.path().join("no-such-dir").join("out.csv");
        assert!(matches!(
            write_csv(&missing, &[StatisticKey::Volume], &results),
            Err(RunError::Csv { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (scan, labels) = volumes((4, 4, 5));
        let scan_path = dir.path().join("scan.nii");
        let label_path = dir.path().join("label.nii");
        scan.save(&scan_path).unwrap();
        labels.save(&label_path).unwrap();

        let config = dir.path().join("report.json");
        fs::write(
            &config,
            format!(
                r#"{{"scan": "{}", "label": "{}", "engine": {{"executable": "unused"}}}}"#,
                scan_path.display(),
                label_path.display()
            ),
        )
        .unwrap();
        assert!(matches!(
            run(&config),
            Err(RunError::ShapeMismatch {
                scan: (4, 4, 4),
                label: (4, 4, 5)
            })
        ));

        assert!(matches!(
            run(&dir.path().join("missing.json")),
            Err(RunError::Config(_))
        ));
    }
}
