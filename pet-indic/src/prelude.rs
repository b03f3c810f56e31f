//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::data::phantom::Sphere;
pub use crate::data::resample::label_map_from_segment;
pub use crate::data::{Geometry, LabelMap, PetScan, Segment, Segmentation, VolumeAttr};

pub use crate::engine::{
    parse_return_parameters, CliEngine, EngineError, EngineRequest, EngineResponse,
    StatisticsEngine,
};

pub use crate::stats::{
    measurement_info, units_for_index, CodedEntry, ImageUnits, MeasurementInfo,
    PetVolumeStatistics, StatisticKey, StatisticsProvider, StatisticsResult,
};

pub use crate::config::{load_config, EngineConfig, ReportConfig};
pub use crate::consts::label::{BACKGROUND, FOREGROUND};
pub use crate::report::{write_label_csv, ResultsTable};
