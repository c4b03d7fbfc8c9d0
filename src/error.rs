//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum RswappyError {
    // 规则相关错误（启动期致命）
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),
    #[error("规则解析失败：{0}")]
    RuleParseError(String),

    // 编译相关错误
    #[error("正则编译失败：{0}")]
    RegexCompileError(#[from] RegexError),

    // 检测相关错误（按目标隔离，不终止扫描）
    #[error("检测失败：{0}")]
    DetectError(String),

    // 网络相关错误（按目标隔离，不终止扫描）
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),

    // 工作任务内部异常（panic等非预期故障，按目标隔离后上报）
    #[error("工作任务异常终止：{0}")]
    WorkerPanic(String),

    // 规则更新错误（仅影响更新子命令退出码，不触碰本地规则）
    #[error("规则更新失败：{0}")]
    UpdateError(String),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
}

// 全局Result类型
pub type RswResult<T> = Result<T, RswappyError>;
