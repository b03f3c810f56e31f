//! 通用常量.

/// 标签图的体素值.
pub mod label {
    /// 背景体素值.
    pub const BACKGROUND: u8 = 0;

    /// 由分割区域生成的标签图中, 前景体素值. 计算时总使用该值作为标签值.
    pub const FOREGROUND: u8 = 1;

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }

    /// 体素是否是前景 (任意非零值)?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        !is_background(p)
    }
}

/// 外部计算引擎的参数名.
pub mod engine {
    /// 灰度图像参数名.
    pub const GRAYSCALE_IMAGE: &str = "Grayscale_Image";

    /// 标签图参数名.
    pub const LABEL_IMAGE: &str = "Label_Image";

    /// 标签值参数名.
    pub const LABEL_VALUE: &str = "Label_Value";

    /// 返回参数文件的命令行参数名.
    pub const RETURN_PARAMETER_FILE: &str = "returnparameterfile";

    /// 软件版本输出项名.
    pub const SOFTWARE_VERSION: &str = "Software_Version";

    /// 输出项的 "未计算" 占位值.
    pub const PLACEHOLDER: &str = "--";

    /// 部分输出项名携带的后缀.
    pub const OUTPUT_SUFFIX: &str = "_s";
}

/// 图像元信息中, 体素值单位编码值的属性名.
///
/// 对于按 SUV 导入的 PET DICOM, 该值一般为 `{SUVbw}g/ml`.
pub const UNITS_CODE_VALUE_ATTRIBUTE: &str = "DICOM.MeasurementUnitsCodeValue";

/// 无法解析单位时, 表格中展示的占位符.
pub const UNITS_PLACEHOLDER: &str = "-";
