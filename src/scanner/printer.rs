//! 结果聚合打印器：结果通道的唯一消费者，stdout的唯一写入方
//! 行模式逐条刷新输出；JSON模式整轮缓冲、观察到Done后一次性输出

use std::io::{self, Write};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::warn;

use super::dispatcher::ResultMessage;
use super::worker::FetchOutcome;
use crate::config::OutputConfig;
use crate::rule::TechMatch;

/// JSON模式单条记录，字段有无与输出开关严格一致
#[derive(Debug, Serialize)]
pub struct JsonRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

/// 行模式格式化：固定字段顺序 目标,名称,版本,置信度,分类
/// 仅启用的字段出现；未知版本输出空串
pub fn format_line(target: &str, tech_match: &TechMatch, opts: &OutputConfig) -> String {
    let mut fields: Vec<String> = Vec::new();

    if opts.show_url {
        fields.push(target.to_string());
    }
    fields.push(tech_match.technology.name.clone());
    if opts.show_version {
        fields.push(tech_match.version.clone().unwrap_or_default());
    }
    if opts.show_confidence {
        fields.push(tech_match.confidence.to_string());
    }
    if opts.show_category {
        fields.push(
            tech_match
                .technology
                .categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    fields.join(&opts.delimiter)
}

/// JSON模式单条记录构建
pub fn json_record(target: &str, tech_match: &TechMatch, opts: &OutputConfig) -> JsonRecord {
    JsonRecord {
        name: tech_match.technology.name.clone(),
        url: opts.show_url.then(|| target.to_string()),
        version: opts
            .show_version
            .then(|| tech_match.version.clone().unwrap_or_default()),
        confidence: opts.show_confidence.then_some(tech_match.confidence),
        categories: opts.show_category.then(|| {
            tech_match
                .technology
                .categories
                .iter()
                .map(|c| c.name.clone())
                .collect()
        }),
    }
}

/// 启动打印任务（调度开始前启动，首个结果就绪即可消费）
/// 消费直至观察到Done后退出
pub fn spawn_printer(
    mut rx: UnboundedReceiver<ResultMessage>,
    opts: OutputConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut json_records: Vec<JsonRecord> = Vec::new();

        while let Some(message) = rx.recv().await {
            match message {
                ResultMessage::Outcome(FetchOutcome::Success { target, matches }) => {
                    for tech_match in &matches {
                        if opts.json {
                            json_records.push(json_record(&target, tech_match, &opts));
                        } else {
                            let mut out = io::stdout().lock();
                            let _ = writeln!(out, "{}", format_line(&target, tech_match, &opts));
                            // 逐行刷新，支持管道接grep/awk等行工具
                            let _ = out.flush();
                        }
                    }
                }
                ResultMessage::Outcome(FetchOutcome::Failure { target, error }) => {
                    // 失败不进入正向输出，仅记录诊断
                    warn!("目标 {} 抓取失败：{}", target, error);
                }
                ResultMessage::Done => break,
            }
        }

        if opts.json {
            let doc = serde_json::to_string(&json_records).unwrap_or_else(|_| "[]".to_string());
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", doc);
            let _ = out.flush();
        }
    })
}
