use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Zeiss REC 交换格式的四种定列宽方言。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    R4,
    R5,
    Rec500,
    M5,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Dialect::R4, Dialect::R5, Dialect::Rec500, Dialect::M5];

    /// 返回方言对应的列模板。模板为静态数据，运行期不可变。
    pub fn template(self) -> &'static DialectTemplate {
        match self {
            Dialect::R4 => &R4_TEMPLATE,
            Dialect::R5 => &R5_TEMPLATE,
            Dialect::Rec500 => &REC500_TEMPLATE,
            Dialect::M5 => &M5_TEMPLATE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::R4 => "R4",
            Dialect::R5 => "R5",
            Dialect::Rec500 => "REC500",
            Dialect::M5 => "M5",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("未知的 Zeiss 方言 \"{0}\"（可选 r4、r5、rec500、m5）")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r4" => Ok(Dialect::R4),
            "r5" => Ok(Dialect::R5),
            "rec500" | "rec_500" => Ok(Dialect::Rec500),
            "m5" => Ok(Dialect::M5),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

/// 半开字节区间 `[start, end)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub start: usize,
    pub end: usize,
}

impl Field {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn width(self) -> usize {
        self.end - self.start
    }
}

/// 单个字块（类型标记、数值、单位）的列布局。REC500 没有单位列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub type_mark: Field,
    pub value: Field,
    pub unit: Option<Field>,
}

impl BlockLayout {
    const fn new(type_mark: Field, value: Field, unit: Option<Field>) -> Self {
        Self {
            type_mark,
            value,
            unit,
        }
    }
}

/// 一种方言的完整列模板：解码与编码共用同一份数据。
#[derive(Debug)]
pub struct DialectTemplate {
    pub dialect: Dialect,
    pub prefix: &'static str,
    pub address: Option<(usize, &'static str)>,
    pub line_number: Option<Field>,
    pub identification: Field,
    pub name: Field,
    pub blocks: [BlockLayout; 3],
    /// 第 2、3 字块仅在行长度大于对应阈值时存在。
    pub block_thresholds: [usize; 2],
    pub error_start: Option<usize>,
    pub separators: &'static [usize],
    pub width: usize,
}

impl DialectTemplate {
    /// 判断给定长度的行是否包含第 `index` 个字块（从 0 计）。
    pub fn block_present(&self, index: usize, line_len: usize) -> bool {
        match index {
            0 => true,
            1 | 2 => line_len > self.block_thresholds[index - 1],
            _ => false,
        }
    }

    /// 去掉落在区间两端的分隔列后，字段实际可写的区间。
    pub fn writable(&self, field: Field) -> Field {
        let mut start = field.start;
        let mut end = field.end;
        while start < end && self.separators.contains(&start) {
            start += 1;
        }
        while end > start && self.separators.contains(&(end - 1)) {
            end -= 1;
        }
        Field::new(start, end)
    }

    /// 按列顺序列出模板中的全部字段。
    pub fn fields(&self) -> Vec<(&'static str, Field)> {
        let mut fields = Vec::with_capacity(12);
        if let Some(line_number) = self.line_number {
            fields.push(("line_number", line_number));
        }
        fields.push(("identification", self.identification));
        fields.push(("name", self.name));
        for (index, block) in self.blocks.iter().enumerate() {
            let (type_label, value_label, unit_label) = BLOCK_LABELS[index];
            fields.push((type_label, block.type_mark));
            fields.push((value_label, block.value));
            if let Some(unit) = block.unit {
                fields.push((unit_label, unit));
            }
        }
        fields
    }
}

pub const BLOCK_LABELS: [(&str, &str, &str); 3] = [
    ("block1_type", "block1_value", "block1_unit"),
    ("block2_type", "block2_value", "block2_unit"),
    ("block3_type", "block3_value", "block3_unit"),
];

const fn f(start: usize, end: usize) -> Field {
    Field::new(start, end)
}

static M5_TEMPLATE: DialectTemplate = DialectTemplate {
    dialect: Dialect::M5,
    prefix: "For M5",
    address: Some((7, "Adr ")),
    line_number: Some(f(11, 17)),
    identification: f(17, 20),
    name: f(21, 48),
    blocks: [
        BlockLayout::new(f(49, 51), f(52, 66), Some(f(67, 71))),
        BlockLayout::new(f(72, 74), f(75, 89), Some(f(90, 94))),
        BlockLayout::new(f(95, 97), f(98, 112), Some(f(113, 116))),
    ],
    block_thresholds: [72, 95],
    error_start: Some(118),
    separators: &[6, 16, 48, 71, 94, 117],
    width: 118,
};

static R4_TEMPLATE: DialectTemplate = DialectTemplate {
    dialect: Dialect::R4,
    prefix: "For R4",
    address: None,
    line_number: None,
    identification: f(7, 9),
    name: f(10, 17),
    blocks: [
        BlockLayout::new(f(18, 20), f(21, 32), Some(f(33, 37))),
        BlockLayout::new(f(38, 40), f(41, 51), Some(f(54, 56))),
        BlockLayout::new(f(58, 60), f(61, 72), Some(f(73, 77))),
    ],
    block_thresholds: [38, 58],
    error_start: None,
    separators: &[6, 17, 37, 57, 77],
    width: 78,
};

static R5_TEMPLATE: DialectTemplate = DialectTemplate {
    dialect: Dialect::R5,
    prefix: "For R5",
    address: Some((7, "Adr ")),
    line_number: Some(f(11, 16)),
    identification: f(16, 18),
    name: f(19, 26),
    blocks: [
        BlockLayout::new(f(27, 29), f(30, 41), Some(f(42, 46))),
        BlockLayout::new(f(47, 49), f(50, 61), Some(f(62, 66))),
        BlockLayout::new(f(67, 69), f(70, 81), Some(f(82, 86))),
    ],
    block_thresholds: [47, 67],
    error_start: None,
    separators: &[6, 26, 46, 66, 86],
    width: 87,
};

static REC500_TEMPLATE: DialectTemplate = DialectTemplate {
    dialect: Dialect::Rec500,
    prefix: "   ",
    address: None,
    line_number: Some(f(3, 7)),
    identification: f(8, 22),
    name: f(22, 35),
    blocks: [
        BlockLayout::new(f(36, 38), f(38, 50), None),
        BlockLayout::new(f(51, 53), f(53, 66), None),
        BlockLayout::new(f(67, 69), f(69, 78), None),
    ],
    block_thresholds: [50, 66],
    error_start: None,
    separators: &[],
    width: 78,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_offsets_increase_and_never_overlap() {
        for dialect in Dialect::ALL {
            let template = dialect.template();
            assert_eq!(template.dialect, dialect);
            let fields = template.fields();
            for pair in fields.windows(2) {
                let (prev_label, prev) = pair[0];
                let (next_label, next) = pair[1];
                assert!(prev.start < prev.end, "{dialect}: {prev_label} 宽度为 0");
                assert!(
                    prev.end <= next.start,
                    "{dialect}: {prev_label} 与 {next_label} 重叠"
                );
            }
            let (_, last) = fields.last().copied().expect("模板至少包含一个字段");
            assert!(last.end <= template.width, "{dialect}: 字段超出行宽");
            assert!(template.prefix.len() <= template.identification.start);
        }
    }

    #[test]
    fn separators_shrink_writable_span() {
        let m5 = Dialect::M5.template();
        let line_number = m5.line_number.expect("M5 有行号");
        assert_eq!(m5.writable(line_number), Field::new(11, 16));
        assert_eq!(m5.writable(m5.name), m5.name);

        let r5 = Dialect::R5.template();
        assert_eq!(r5.writable(r5.identification), Field::new(16, 18));
    }

    #[test]
    fn block_presence_follows_thresholds() {
        let rec500 = Dialect::Rec500.template();
        assert!(rec500.block_present(0, 10));
        assert!(!rec500.block_present(1, 50));
        assert!(rec500.block_present(1, 51));
        assert!(!rec500.block_present(2, 66));
        assert!(rec500.block_present(2, 67));

        let r5 = Dialect::R5.template();
        assert!(!r5.block_present(1, 47));
        assert!(r5.block_present(1, 48));
    }

    #[test]
    fn dialect_names_parse_back() {
        for dialect in Dialect::ALL {
            let parsed: Dialect = dialect.name().parse().expect("方言名应可解析");
            assert_eq!(parsed, dialect);
        }
        let err = "r6".parse::<Dialect>().expect_err("r6 不是合法方言");
        assert_eq!(err, UnknownDialect("r6".to_string()));
        assert!(err.to_string().contains("\"r6\""));
    }
}
