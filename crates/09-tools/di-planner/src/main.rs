//! # di-planner
//!
//! 读取组件清单，运行依赖注入静态分析，输出 JSON 格式的分析报告

use anyhow::{bail, Context};
use clap::Parser;
use infrastructure_composition::{AnalysisBuilder, AnalysisReport, LoggingConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "di-planner")]
#[command(about = "依赖注入静态分析与注册计划生成")]
struct Args {
    /// 组件清单文件（JSON 或 TOML）
    #[arg(required = true)]
    manifests: Vec<PathBuf>,

    /// 分析设置文件
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// 只输出在该环境下生效的注册条目
    #[arg(short, long)]
    environment: Option<String>,

    /// 条件求值使用的配置项，格式为 KEY=VALUE
    #[arg(long = "set", value_parser = parse_key_value)]
    config: Vec<(String, String)>,

    /// 输出文件，缺省时写到标准输出
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 存在致命诊断时仍然以成功状态退出
    #[arg(long)]
    allow_fatal: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logging = if args.json_logs {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };
    logging = logging.with_level(parse_log_level(&args.log_level));

    let mut builder = AnalysisBuilder::new().with_logging(logging);
    for manifest in &args.manifests {
        builder = builder.add_manifest(manifest)?;
    }
    if let Some(settings) = &args.settings {
        builder = builder.with_settings_file(settings)?;
    }

    let host = builder.build().await?;
    let report = host.run().await?;

    let rendered = render(&report, &args)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("写入报告失败: {}", path.display()))?;
            info!("报告已写入 {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if report.has_fatal() {
        if args.allow_fatal {
            warn!("存在 {} 个致命诊断", report.summary.fatal);
        } else {
            bail!("分析发现 {} 个致命诊断", report.summary.fatal);
        }
    }
    Ok(())
}

/// 渲染输出内容
fn render(report: &AnalysisReport, args: &Args) -> anyhow::Result<String> {
    let Some(environment) = &args.environment else {
        return Ok(report.to_json_pretty()?);
    };

    let config: HashMap<String, String> = args.config.iter().cloned().collect();
    let active = report.active_registrations(environment, &config);
    info!("环境 {} 下生效的注册条目: {}", environment, active.len());
    Ok(serde_json::to_string_pretty(&active)?)
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("配置项格式应为 KEY=VALUE: {input}")),
    }
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
