use georec_core::dialect::Dialect;
use georec_core::record::{PointRecord, RecordKind};
use georec_io::zeiss::{HeightKind, Measurement, PointFields, ZeissEncoder};
use tracing::debug;

/// 输出行号计数器。每次转换持有一个独立实例。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCounter {
    next: u32,
}

impl LineCounter {
    pub fn new(start: u32) -> Self {
        Self { next: start }
    }

    #[inline]
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// 取出当前行号并前进一位。
    pub fn advance(&mut self) -> u32 {
        let current = self.next;
        self.next = self.next.wrapping_add(1);
        current
    }
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

/// 数值输出精度（小数位数）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub coordinate_decimals: usize,
    pub angle_decimals: usize,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            coordinate_decimals: 3,
            angle_decimals: 4,
        }
    }
}

impl NumberFormat {
    pub fn coordinate(&self, value: Option<f64>) -> String {
        fixed(value, self.coordinate_decimals)
    }

    pub fn angle(&self, value: Option<f64>) -> String {
        fixed(value, self.angle_decimals)
    }
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|value| format!("{value:.decimals$}"))
        .unwrap_or_default()
}

/// 把点记录按方言规则展开为 REC 行。
///
/// - 测站：REC500 先写仪器高行再写坐标行，其余方言相反；
/// - 目标：目标高行、观测行、坐标行；
/// - 普通坐标：单独一行坐标行。
#[derive(Debug, Clone)]
pub struct ZeissEmitter {
    encoder: ZeissEncoder,
    format: NumberFormat,
    counter: LineCounter,
}

impl ZeissEmitter {
    pub fn new(dialect: Dialect, format: NumberFormat, counter: LineCounter) -> Self {
        Self {
            encoder: ZeissEncoder::new(dialect),
            format,
            counter,
        }
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.encoder.dialect()
    }

    pub fn next_line_number(&self) -> u32 {
        self.counter.peek()
    }

    pub fn emit(&mut self, record: &PointRecord) -> Vec<String> {
        let easting = self.format.coordinate(record.easting);
        let northing = self.format.coordinate(record.northing);
        let height = self.format.coordinate(record.height);
        let point = PointFields {
            number: &record.number,
            code: &record.code,
            easting: &easting,
            northing: &northing,
            height: &height,
        };

        let mut lines = Vec::with_capacity(3);
        match record.kind {
            RecordKind::Station => {
                let instrument_height = self.format.coordinate(record.instrument_height);
                if self.dialect() == Dialect::Rec500 {
                    lines.push(self.height_line(&point, HeightKind::Instrument, &instrument_height));
                    lines.push(self.coordinate_line(&point));
                } else {
                    lines.push(self.coordinate_line(&point));
                    lines.push(self.height_line(&point, HeightKind::Instrument, &instrument_height));
                }
            }
            RecordKind::Target => {
                let target_height = self.format.coordinate(record.target_height);
                let horizontal_angle = self.format.angle(record.horizontal_angle);
                let vertical_angle = self.format.angle(record.vertical_angle);
                let slope_distance = self.format.coordinate(record.slope_distance);
                let measurement = Measurement {
                    horizontal_angle: &horizontal_angle,
                    vertical_angle: &vertical_angle,
                    slope_distance: &slope_distance,
                };
                lines.push(self.height_line(&point, HeightKind::Target, &target_height));
                let line_number = self.counter.advance();
                lines.push(
                    self.encoder
                        .encode_measurement_line(&point, &measurement, line_number),
                );
                lines.push(self.coordinate_line(&point));
            }
            RecordKind::Coordinate => lines.push(self.coordinate_line(&point)),
        }
        debug!(
            number = %record.number,
            kind = ?record.kind,
            lines = lines.len(),
            "写出点记录"
        );
        lines
    }

    pub fn emit_all(&mut self, records: &[PointRecord]) -> Vec<String> {
        records.iter().flat_map(|record| self.emit(record)).collect()
    }

    fn coordinate_line(&mut self, point: &PointFields<'_>) -> String {
        let line_number = self.counter.advance();
        self.encoder.encode_coordinate_line(point, line_number)
    }

    fn height_line(&mut self, point: &PointFields<'_>, kind: HeightKind, value: &str) -> String {
        let line_number = self.counter.advance();
        self.encoder
            .encode_height_line(point, kind, value, line_number)
    }
}
