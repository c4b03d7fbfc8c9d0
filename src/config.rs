//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

/// 默认并发工作槽数量
pub const DEFAULT_WORKERS: usize = 10;

/// 默认本地规则文件路径
pub const DEFAULT_RULES_FILE: &str = "technologies.json";

/// 扫描配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    // 本地规则文件路径
    pub rules_path: PathBuf,
    // 并发工作槽数量（W ≥ 1）
    pub workers: usize,
    // 是否跟随HTTP重定向
    pub follow_redirects: bool,
    // 单请求超时（连接+读取，单位：秒）
    pub http_timeout: u64,
    // 请求User-Agent
    pub user_agent: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from(DEFAULT_RULES_FILE),
            workers: DEFAULT_WORKERS,
            follow_redirects: true,
            http_timeout: 30,
            user_agent: format!("rswappy/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// 输出配置（打印线程专用，扫描期间只读）
#[derive(Debug, Clone)]
pub struct OutputConfig {
    // JSON模式：整轮扫描缓冲后一次性输出
    pub json: bool,
    // 行模式字段分隔符
    pub delimiter: String,
    // 可选输出字段开关
    pub show_url: bool,
    pub show_version: bool,
    pub show_confidence: bool,
    pub show_category: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json: false,
            delimiter: " ".to_string(),
            show_url: true,
            show_version: false,
            show_confidence: false,
            show_category: false,
        }
    }
}
