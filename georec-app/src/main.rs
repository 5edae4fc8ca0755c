use std::io::{self, Write};
use std::path::PathBuf;

use georec_config::{AppConfig, ConfigError, ConversionConfig, OutputFormatKind};
use georec_core::dialect::Dialect;
use georec_engine::converter::{ConversionOptions, ConversionReport, Converter, OutputFormat};
use georec_engine::emitter::NumberFormat;
use georec_engine::errors::EngineError;
use georec_io::{IoError, LineLoader, LineSaver, TextFileFacade};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "用法：georec [--config PATH] [--dialect r4|r5|rec500|m5] [--csv] [--dedup] [--sort] [--strict] [--output PATH] INPUT";

/// 命令行参数，未给出的项沿用配置文件中的值。
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    dialect: Option<Dialect>,
    csv: bool,
    dedup: bool,
    sort: bool,
    strict: bool,
    output: Option<PathBuf>,
    input: PathBuf,
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(message) => {
            eprintln!("{message}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let mut config = load_configuration(args.config.clone());
    init_logging(&config);
    apply_overrides(&mut config.conversion, &args);
    info!(input = %args.input.display(), "启动 georec 转换");

    if let Err(err) = run(&args, &config.conversion) {
        error!(error = %err, "转换失败");
        std::process::exit(1);
    }
}

/// 解析参数；`Ok(None)` 表示只需打印帮助。
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<CliArgs>, String> {
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();
    let mut input: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--csv" => parsed.csv = true,
            "--dedup" => parsed.dedup = true,
            "--sort" => parsed.sort = true,
            "--strict" => parsed.strict = true,
            "--config" => {
                let path = args.next().ok_or("`--config` 需要提供配置文件路径")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--output" | "-o" => {
                let path = args.next().ok_or("`--output` 需要提供输出文件路径")?;
                parsed.output = Some(PathBuf::from(path));
            }
            "--dialect" => {
                let name = args.next().ok_or("`--dialect` 需要提供方言名称")?;
                let dialect = name.parse::<Dialect>().map_err(|err| err.to_string())?;
                parsed.dialect = Some(dialect);
            }
            other if other.starts_with('-') => return Err(format!("未知参数：{other}")),
            other => {
                if input.is_some() {
                    return Err(format!("只能指定一个输入文件，多余参数：{other}"));
                }
                input = Some(PathBuf::from(other));
            }
        }
    }

    parsed.input = input.ok_or("缺少输入文件")?;
    Ok(Some(parsed))
}

fn apply_overrides(conversion: &mut ConversionConfig, args: &CliArgs) {
    if let Some(dialect) = args.dialect {
        conversion.target_dialect = dialect;
        conversion.output_format = OutputFormatKind::Zeiss;
    }
    if args.csv {
        conversion.output_format = OutputFormatKind::Csv;
    }
    conversion.eliminate_duplicates |= args.dedup;
    conversion.sort_output |= args.sort;
    conversion.strict |= args.strict;
}

fn conversion_options(conversion: &ConversionConfig) -> ConversionOptions {
    ConversionOptions {
        output: match conversion.output_format {
            OutputFormatKind::Zeiss => OutputFormat::Zeiss(conversion.target_dialect),
            OutputFormatKind::Csv => OutputFormat::Csv,
        },
        start_line_number: conversion.start_line_number,
        number_format: NumberFormat {
            coordinate_decimals: conversion.coordinate_decimals,
            angle_decimals: conversion.angle_decimals,
        },
        eliminate_duplicates: conversion.eliminate_duplicates,
        duplicate_threshold: conversion.duplicate_threshold,
        sort_output: conversion.sort_output,
    }
}

fn run(args: &CliArgs, conversion: &ConversionConfig) -> Result<ConversionReport, EngineError> {
    let facade = TextFileFacade::new();
    let lines = facade.load_lines(&args.input)?;
    let report = Converter::new(conversion_options(conversion)).convert(&lines)?;

    for skipped in &report.skipped {
        warn!(line_no = skipped.line_no, error = %skipped.error, "输入行已跳过");
    }
    if conversion.strict {
        report.ensure_clean()?;
    }

    match &args.output {
        Some(path) => {
            facade.save_lines(&report.output, path)?;
            info!(path = %path.display(), lines = report.output.len(), "输出已写入");
        }
        None => write_stdout(&report.output)?,
    }
    Ok(report)
}

fn write_stdout(lines: &[String]) -> Result<(), IoError> {
    write_lines(io::stdout().lock(), lines).map_err(|source| IoError::WriteError {
        path: PathBuf::from("<stdout>"),
        source,
    })
}

fn write_lines(mut out: impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    // 日志写到 stderr，stdout 留给转换结果。
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
