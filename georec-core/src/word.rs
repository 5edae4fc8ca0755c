use std::fmt;

use serde::{Deserialize, Serialize};

/// 两位数的语义字索引，例如 81 表示目标点东坐标。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordIndex(u8);

/// 字索引所属的语义分组，映射固定不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordGroup {
    PointNumber,
    InstrumentInfo,
    Timestamp,
    HorizontalAngle,
    VerticalAngle,
    AngleDifference,
    SlopeDistance,
    HorizontalDistance,
    HeightDifference,
    Code,
    Remark,
    PointCode,
    PointAttribute,
    TargetEasting,
    TargetNorthing,
    TargetElevation,
    StationEasting,
    StationNorthing,
    StationElevation,
    TargetHeight,
    InstrumentHeight,
    Unknown,
}

impl WordIndex {
    pub const POINT_NUMBER: Self = Self(11);
    pub const HORIZONTAL_ANGLE: Self = Self(21);
    pub const VERTICAL_ANGLE: Self = Self(22);
    pub const SLOPE_DISTANCE: Self = Self(31);
    pub const HORIZONTAL_DISTANCE: Self = Self(32);
    pub const HEIGHT_DIFFERENCE: Self = Self(33);
    pub const CODE: Self = Self(41);
    pub const POINT_CODE: Self = Self(71);
    pub const TARGET_EASTING: Self = Self(81);
    pub const TARGET_NORTHING: Self = Self(82);
    pub const TARGET_ELEVATION: Self = Self(83);
    pub const STATION_EASTING: Self = Self(84);
    pub const STATION_NORTHING: Self = Self(85);
    pub const STATION_ELEVATION: Self = Self(86);
    pub const TARGET_HEIGHT: Self = Self(87);
    pub const INSTRUMENT_HEIGHT: Self = Self(88);

    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn group(self) -> WordGroup {
        match self.0 {
            11 => WordGroup::PointNumber,
            12 | 13 => WordGroup::InstrumentInfo,
            18 | 19 => WordGroup::Timestamp,
            21 => WordGroup::HorizontalAngle,
            22 => WordGroup::VerticalAngle,
            25 => WordGroup::AngleDifference,
            31 => WordGroup::SlopeDistance,
            32 => WordGroup::HorizontalDistance,
            33 => WordGroup::HeightDifference,
            41 => WordGroup::Code,
            42..=49 => WordGroup::Remark,
            71 => WordGroup::PointCode,
            72..=79 => WordGroup::PointAttribute,
            81 => WordGroup::TargetEasting,
            82 => WordGroup::TargetNorthing,
            83 => WordGroup::TargetElevation,
            84 => WordGroup::StationEasting,
            85 => WordGroup::StationNorthing,
            86 => WordGroup::StationElevation,
            87 => WordGroup::TargetHeight,
            88 => WordGroup::InstrumentHeight,
            _ => WordGroup::Unknown,
        }
    }

    #[inline]
    pub fn is_known(self) -> bool {
        self.group() != WordGroup::Unknown
    }

    /// 角度类字索引。
    pub fn is_angle(self) -> bool {
        matches!(
            self.group(),
            WordGroup::HorizontalAngle | WordGroup::VerticalAngle | WordGroup::AngleDifference
        )
    }

    /// 携带数值（角度、距离、坐标、高度）的字索引。
    pub fn is_numeric(self) -> bool {
        self.is_angle()
            || matches!(
                self.group(),
                WordGroup::SlopeDistance
                    | WordGroup::HorizontalDistance
                    | WordGroup::HeightDifference
                    | WordGroup::TargetEasting
                    | WordGroup::TargetNorthing
                    | WordGroup::TargetElevation
                    | WordGroup::StationEasting
                    | WordGroup::StationNorthing
                    | WordGroup::StationElevation
                    | WordGroup::TargetHeight
                    | WordGroup::InstrumentHeight
            )
    }

    /// 84/85/86/88 标记测站行。
    pub fn marks_station(self) -> bool {
        matches!(self.0, 84..=86 | 88)
    }

    /// 81/82/83 标记目标行。
    pub fn marks_target(self) -> bool {
        matches!(self.0, 81..=83)
    }
}

impl fmt::Display for WordIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// 输出上下文：决定字块值的文本形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContext {
    Plain,
    ZeroPadded { width: usize },
    Csv,
}

/// 带语义字索引的值。`raw_value` 保留解码得到的文本，数值型字块额外携带 `numeric_value`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordIndexBlock {
    pub word_index: WordIndex,
    pub raw_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
}

impl WordIndexBlock {
    pub fn text(word_index: WordIndex, value: impl Into<String>) -> Self {
        Self {
            word_index,
            raw_value: value.into(),
            numeric_value: None,
        }
    }

    pub fn numeric(word_index: WordIndex, raw_value: impl Into<String>, value: f64) -> Self {
        Self {
            word_index,
            raw_value: raw_value.into(),
            numeric_value: Some(value),
        }
    }

    /// 定宽空占位：下游定列宽编码器据此保持列位置不变。
    pub fn empty(word_index: WordIndex, width: usize) -> Self {
        Self::text(word_index, " ".repeat(width))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw_value.trim().is_empty()
    }

    pub fn format(&self, context: OutputContext) -> String {
        match context {
            OutputContext::Plain => self.raw_value.clone(),
            OutputContext::Csv => self.raw_value.trim().to_string(),
            OutputContext::ZeroPadded { width } => {
                let value = self.raw_value.trim();
                if self.numeric_value.is_some() {
                    let (sign, digits) = match value.strip_prefix('-') {
                        Some(rest) => ("-", rest),
                        None => ("", value.strip_prefix('+').unwrap_or(value)),
                    };
                    let fill = width.saturating_sub(sign.len() + digits.len());
                    format!("{sign}{}{digits}", "0".repeat(fill))
                } else {
                    format!("{value:0>width$}")
                }
            }
        }
    }
}
