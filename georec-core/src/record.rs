use serde::{Deserialize, Serialize};

use crate::geometry::Point3;

/// 点记录的类别。一条输入行只可能是测站行或目标行之一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Station,
    Target,
    Coordinate,
}

/// 价数标识：下游格式用它说明坐标包含平面、高程或两者。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valency {
    Plan = 1,
    Height = 2,
    Full = 3,
}

impl Valency {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// 聚合完成后的逻辑点记录，写出后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub number: String,
    pub code: String,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
    pub height: Option<f64>,
    pub instrument_height: Option<f64>,
    pub target_height: Option<f64>,
    pub horizontal_angle: Option<f64>,
    pub vertical_angle: Option<f64>,
    pub slope_distance: Option<f64>,
    pub kind: RecordKind,
}

impl PointRecord {
    #[inline]
    pub fn is_station_line(&self) -> bool {
        self.kind == RecordKind::Station
    }

    #[inline]
    pub fn is_target_line(&self) -> bool {
        self.kind == RecordKind::Target
    }

    /// 三维位置；缺少东、北坐标时返回 `None`，缺少高程按 0 处理。
    pub fn position(&self) -> Option<Point3> {
        match (self.easting, self.northing) {
            (Some(easting), Some(northing)) => Some(Point3::new(
                easting,
                northing,
                self.height.unwrap_or(0.0),
            )),
            _ => None,
        }
    }

    pub fn valency(&self) -> Option<Valency> {
        let plan = self.easting.is_some() && self.northing.is_some();
        match (plan, self.height.is_some()) {
            (true, true) => Some(Valency::Full),
            (true, false) => Some(Valency::Plan),
            (false, true) => Some(Valency::Height),
            (false, false) => None,
        }
    }

    /// 按记录类别列出缺失的必填字段。
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if matches!(self.kind, RecordKind::Station | RecordKind::Target) {
            if self.easting.is_none() {
                missing.push("easting");
            }
            if self.northing.is_none() {
                missing.push("northing");
            }
            if self.height.is_none() {
                missing.push("height");
            }
        }
        if self.kind == RecordKind::Station && self.instrument_height.is_none() {
            missing.push("instrument_height");
        }
        missing
    }
}

/// 可由聚合器写入的数值字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Easting,
    Northing,
    Height,
    InstrumentHeight,
    TargetHeight,
    HorizontalAngle,
    VerticalAngle,
    SlopeDistance,
}

/// 每个点号新建一个构建器，只有 `finish` 之后才成为 `PointRecord`。
#[derive(Debug, Clone, Default)]
pub struct PointRecordBuilder {
    number: String,
    code: Option<String>,
    easting: Option<f64>,
    northing: Option<f64>,
    height: Option<f64>,
    instrument_height: Option<f64>,
    target_height: Option<f64>,
    horizontal_angle: Option<f64>,
    vertical_angle: Option<f64>,
    slope_distance: Option<f64>,
    saw_station: bool,
    saw_target: bool,
}

impl PointRecordBuilder {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        let code = code.into();
        if !code.trim().is_empty() {
            self.code = Some(code.trim().to_string());
        }
    }

    pub fn set(&mut self, field: RecordField, value: f64) {
        let slot = match field {
            RecordField::Easting => &mut self.easting,
            RecordField::Northing => &mut self.northing,
            RecordField::Height => &mut self.height,
            RecordField::InstrumentHeight => &mut self.instrument_height,
            RecordField::TargetHeight => &mut self.target_height,
            RecordField::HorizontalAngle => &mut self.horizontal_angle,
            RecordField::VerticalAngle => &mut self.vertical_angle,
            RecordField::SlopeDistance => &mut self.slope_distance,
        };
        *slot = Some(value);
    }

    pub fn mark_station(&mut self) {
        self.saw_station = true;
    }

    pub fn mark_target(&mut self) {
        self.saw_target = true;
    }

    /// 未写入任何字段（仅有点号也视为空）。
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && [
                self.easting,
                self.northing,
                self.height,
                self.instrument_height,
                self.target_height,
                self.horizontal_angle,
                self.vertical_angle,
                self.slope_distance,
            ]
            .iter()
            .all(Option::is_none)
    }

    /// 完成记录；空构建器返回 `None`，不会产生空行。
    ///
    /// 见过测站标记即为测站记录；否则见过 81/82/83 即为目标记录，观测值缺失时留空；
    /// 两类标记都没有的才是普通坐标记录。
    pub fn finish(self) -> Option<PointRecord> {
        if self.is_empty() {
            return None;
        }
        let kind = if self.saw_station {
            RecordKind::Station
        } else if self.saw_target {
            RecordKind::Target
        } else {
            RecordKind::Coordinate
        };
        Some(PointRecord {
            number: self.number,
            code: self.code.unwrap_or_default(),
            easting: self.easting,
            northing: self.northing,
            height: self.height,
            instrument_height: self.instrument_height,
            target_height: self.target_height,
            horizontal_angle: self.horizontal_angle,
            vertical_angle: self.vertical_angle,
            slope_distance: self.slope_distance,
            kind,
        })
    }
}
