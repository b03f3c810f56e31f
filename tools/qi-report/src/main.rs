//! 对 PET 扫描中的各个标签区域计算定量指标, 并输出结果表格.
//!
//! 用法: `qi-report <config.json>`. 配置格式见 `pet_indic::config::ReportConfig`.

mod result;
mod runner;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use log::error;

fn main() -> ExitCode {
    if let Err(e) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("failed to initialize logger: {e}");
    }

    let Some(config) = std::env::args_os().nth(1) else {
        error!("usage: qi-report <config.json>");
        return ExitCode::from(2);
    };

    let report = match runner::run(Path::new(&config)) {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    match report.describe_into(io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("failed to print results: {e}");
            ExitCode::FAILURE
        }
    }
}
