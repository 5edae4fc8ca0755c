use georec_core::dialect::{Dialect, DialectTemplate, Field};
use tracing::warn;

use super::{
    TYPE_EASTING, TYPE_HEIGHT, TYPE_HORIZONTAL_ANGLE, TYPE_INSTRUMENT_HEIGHT, TYPE_NORTHING,
    TYPE_SLOPE_DISTANCE, TYPE_TARGET_HEIGHT, TYPE_VERTICAL_ANGLE, UNIT_GON, UNIT_METRE,
};

/// 已格式化的点字段。编码器不做任何舍入，精度由调用方决定。
#[derive(Debug, Clone, Copy, Default)]
pub struct PointFields<'a> {
    pub number: &'a str,
    pub code: &'a str,
    pub easting: &'a str,
    pub northing: &'a str,
    pub height: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightKind {
    Instrument,
    Target,
}

impl HeightKind {
    fn type_mark(self) -> &'static str {
        match self {
            HeightKind::Instrument => TYPE_INSTRUMENT_HEIGHT,
            HeightKind::Target => TYPE_TARGET_HEIGHT,
        }
    }
}

/// 观测值：水平角、竖直角、斜距（均为已格式化文本，缺省为空）。
#[derive(Debug, Clone, Copy, Default)]
pub struct Measurement<'a> {
    pub horizontal_angle: &'a str,
    pub vertical_angle: &'a str,
    pub slope_distance: &'a str,
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

#[derive(Clone, Copy)]
struct BlockText<'a> {
    type_mark: &'a str,
    value: &'a str,
    unit: &'a str,
}

impl<'a> BlockText<'a> {
    const EMPTY: BlockText<'static> = BlockText {
        type_mark: "",
        value: "",
        unit: "",
    };

    fn new(type_mark: &'a str, value: &'a str, unit: &'a str) -> Self {
        Self {
            type_mark,
            value,
            unit,
        }
    }
}

/// 按方言模板生成定列宽行：溢出截断，不足补空格。
#[derive(Debug, Clone, Copy)]
pub struct ZeissEncoder {
    template: &'static DialectTemplate,
}

impl ZeissEncoder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            template: dialect.template(),
        }
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.template.dialect
    }

    pub fn encode_coordinate_line(&self, point: &PointFields<'_>, line_number: u32) -> String {
        self.render(
            point,
            [
                BlockText::new(TYPE_EASTING, point.easting, UNIT_METRE),
                BlockText::new(TYPE_NORTHING, point.northing, UNIT_METRE),
                BlockText::new(TYPE_HEIGHT, point.height, UNIT_METRE),
            ],
            line_number,
        )
    }

    /// 仪器高 / 目标高行：第一个字块替换为 `ih` / `th`。
    pub fn encode_height_line(
        &self,
        point: &PointFields<'_>,
        kind: HeightKind,
        value: &str,
        line_number: u32,
    ) -> String {
        self.render(
            point,
            [
                BlockText::new(kind.type_mark(), value, UNIT_METRE),
                BlockText::EMPTY,
                BlockText::EMPTY,
            ],
            line_number,
        )
    }

    pub fn encode_measurement_line(
        &self,
        point: &PointFields<'_>,
        measurement: &Measurement<'_>,
        line_number: u32,
    ) -> String {
        self.render(
            point,
            [
                BlockText::new(
                    TYPE_HORIZONTAL_ANGLE,
                    measurement.horizontal_angle,
                    UNIT_GON,
                ),
                BlockText::new(TYPE_VERTICAL_ANGLE, measurement.vertical_angle, UNIT_GON),
                BlockText::new(TYPE_SLOPE_DISTANCE, measurement.slope_distance, UNIT_METRE),
            ],
            line_number,
        )
    }

    fn render(&self, point: &PointFields<'_>, blocks: [BlockText<'_>; 3], line_number: u32) -> String {
        let template = self.template;
        let mut buffer = vec![b' '; template.width];

        put(
            &mut buffer,
            Field::new(0, template.prefix.len()),
            template.prefix,
            Align::Left,
        );
        if let Some((column, literal)) = template.address {
            put(
                &mut buffer,
                Field::new(column, column + literal.len()),
                literal,
                Align::Left,
            );
        }
        if let Some(field) = template.line_number {
            let span = template.writable(field);
            put(
                &mut buffer,
                span,
                &line_number_text(line_number, span.width()),
                Align::Right,
            );
        }
        put(
            &mut buffer,
            template.writable(template.identification),
            point.code.trim(),
            Align::Left,
        );
        put(
            &mut buffer,
            template.writable(template.name),
            point.number.trim(),
            Align::Right,
        );

        for (layout, block) in template.blocks.iter().zip(blocks) {
            let value = block.value.trim();
            if value.is_empty() {
                continue;
            }
            put(
                &mut buffer,
                template.writable(layout.type_mark),
                block.type_mark,
                Align::Left,
            );
            put(&mut buffer, template.writable(layout.value), value, Align::Right);
            if let Some(unit) = layout.unit {
                put(&mut buffer, template.writable(unit), block.unit, Align::Left);
            }
        }

        for &column in template.separators {
            buffer[column] = b'|';
        }
        buffer.into_iter().map(char::from).collect()
    }
}

/// 行号位数超过列宽时只保留低位（按 `10^width` 回绕），不会截成一个看似合理的高位数。
fn line_number_text(line_number: u32, width: usize) -> String {
    let text = line_number.to_string();
    if text.len() <= width {
        return text;
    }
    let wrapped = u64::from(line_number) % 10u64.pow(width as u32);
    warn!(line_number, written = wrapped, width, "行号超出列宽，仅保留低位");
    wrapped.to_string()
}

/// 写入字段：非 ASCII 字符替换为 `?`，保证字节列位置不偏移。
fn put(buffer: &mut [u8], field: Field, text: &str, align: Align) {
    let width = field.width();
    let bytes: Vec<u8> = text
        .chars()
        .map(|ch| if ch.is_ascii() { ch as u8 } else { b'?' })
        .take(width)
        .collect();
    let offset = match align {
        Align::Left => 0,
        Align::Right => width - bytes.len(),
    };
    let start = field.start + offset;
    buffer[start..start + bytes.len()].copy_from_slice(&bytes);
}
