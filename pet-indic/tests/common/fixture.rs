//! 模拟头颈部 PET 数据: 三个球形区域, 以及各区域的参考统计值.

use nalgebra::{Matrix3, Vector3};
use ndarray::Zip;
use pet_indic::prelude::*;

/// 与原始数据一致的体素分辨率.
pub const SPACING: [f64; 3] = [3.3940266832237, 3.3940266832237, 2.02490234375];

/// 原始数据的原点.
pub const ORIGIN: [f64; 3] = [
    285.367523193359375,
    494.58682250976556816,
    -1873.3819580078125,
];

/// 原始活度到 SUVbw 的换算系数.
pub const SUV_FACTOR: f32 = 0.000_401_664;

/// 体素值物理量编码.
pub const QUANTITY: &str =
    "CodeValue:126400|CodingSchemeDesignator:DCM|CodeMeaning:Standardized Uptake Value";

/// 体素值单位编码.
pub const UNITS: &str = "CodeValue:{SUVbw}g/ml|CodingSchemeDesignator:UCUM|CodeMeaning:Standardized Uptake Value body weight";

/// 区域几何: 半径, 球心 x, y, z.
pub const SPHERES: [[f64; 4]; 3] = [
    [30.0, -54.0, 232.0, -980.0],
    [30.0, -41.0, 232.0, -1065.0],
    [50.0, 112.0, 232.0, -1264.0],
];

/// 背景和球内的 SUV.
const BACKGROUND_SUV: f32 = 1.0;
const LESION_SUV: f32 = 4.0;

/// 裁剪后的网格. 方向与原始数据相同 (x, y 翻转), 原点按整数体素平移.
pub fn geometry() -> Geometry {
    // 相对原始网格裁掉的体素数 (i, j, k).
    let offset = [30.0, 60.0, 270.0];
    let directions = Matrix3::from_diagonal(&Vector3::new(-1.0, -1.0, 1.0));
    let origin = [
        ORIGIN[0] - offset[0] * SPACING[0],
        ORIGIN[1] - offset[1] * SPACING[1],
        ORIGIN[2] + offset[2] * SPACING[2],
    ];
    Geometry::new((192, 36, 92), SPACING, origin).with_directions(directions)
}

/// 全部球体.
pub fn spheres() -> Vec<Sphere> {
    SPHERES
        .iter()
        .map(|[r, x, y, z]| Sphere::new([*x, *y, *z], *r).unwrap())
        .collect()
}

/// 已换算为 SUV, 并带有物理量和单位编码的扫描.
pub fn scan() -> PetScan {
    let g = geometry();
    let mut scan = PetScan::new(
        g.clone(),
        ndarray::Array3::from_elem(g.shape(), BACKGROUND_SUV / SUV_FACTOR),
    )
    .unwrap();
    for sphere in spheres() {
        let lesion = sphere.rasterize_on(g.clone());
        Zip::from(scan.data_mut())
            .and(lesion.data())
            .for_each(|v, l| {
                if *l != BACKGROUND {
                    *v = LESION_SUV / SUV_FACTOR;
                }
            });
    }
    scan.scale(SUV_FACTOR);
    scan.set_voxel_value_quantity(QUANTITY.parse().unwrap());
    scan.set_voxel_value_units(UNITS.parse().unwrap());
    scan
}

/// 三个区域依次命名为 `Test`, `Test_1`, `Test_2`, 各自位于 2mm 的原生网格上.
pub fn segmentation() -> Segmentation {
    let mut seg = Segmentation::new();
    for sphere in spheres() {
        seg.add_labelmap_segment("Test", sphere.rasterize([2.0; 3]));
    }
    seg
}

/// 各区域的参考统计值.
pub fn reference_values(segment: &str) -> &'static [(StatisticKey, f64)] {
    use StatisticKey::*;
    match segment {
        "Test" => &[
            (Mean, 3.67861),
            (Max, 19.5262),
            (Volume, 96.9882),
            (FirstQuartile, 1.22039),
            (UpperAdjacent, 9.13507),
            (Tlg, 356.782),
            (GlycolysisQ2, 82.9484),
            (Q1Distribution, 78.7157),
            (Q4Distribution, 3.48725),
            (Sam, 199.284),
            (Peak, 17.335),
        ],
        "Test_1" => &[
            (Mean, 3.49592),
            (Std, 3.81429),
            (Rms, 5.174),
            (Volume, 96.4284),
            (Median, 1.91971),
            (Tlg, 337.106),
            (GlycolysisQ3, 57.3372),
            (Q1Distribution, 83.9865),
            (Q2Distribution, 9.45815),
            (Sam, 206.139),
            (Peak, 19.2768),
        ],
        "Test_2" => &[
            (Min, 0.91049),
            (Volume, 447.783),
            (ThirdQuartile, 2.55595),
            (GlycolysisQ1, 60.0397),
            (GlycolysisQ4, 10.4696),
            (Q3Distribution, 20.9304),
            (SamBackground, 2.121),
        ],
        _ => &[],
    }
}

/// 两个浮点数是否在容差 `tol` 内相等.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}
