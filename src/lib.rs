//! rswappy - 并发Web技术栈扫描器
//! 目标流 -> 有界工作池 -> 匹配引擎 -> 单消费者结果输出

// 导出全局错误类型
pub use self::error::{RswappyError, RswResult};

// 导出配置模块
pub use self::config::{DEFAULT_RULES_FILE, DEFAULT_WORKERS, OutputConfig, ScanConfig};

// 导出规则模块核心接口
pub use self::rule::{
    Category, CategoryRule, RuleLibrary, RuleLoader, RulesetDocument, TechMatch, TechRule,
    Technology,
};

// 导出编译模块核心接口
pub use self::compiler::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule, RuleCompiler};

// 导出提取模块核心接口
pub use self::extractor::HtmlExtractor;

// 导出工具模块核心接口
pub use self::utils::{DetectionUpdater, HeaderConverter, VersionExtractor, init_logging};

// 导出检测模块核心接口
pub use self::detector::TechDetector;

// 导出目标源
pub use self::target::TargetSource;

// 导出扫描流水线核心接口
pub use self::scanner::{
    DispatchReport, FetchOutcome, PageSnapshot, ResultMessage, build_http_client, dispatch_all,
    fetch_and_match, spawn_printer,
};

// 导出规则更新流水线
pub use self::update::{
    DEFAULT_UPDATE_URL, RuleUpdater, UpdateOutcome, assemble_document, content_hash, file_hash,
    run_update,
};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod compiler;
pub mod extractor;
pub mod utils;
pub mod detector;
pub mod target;
pub mod scanner;
pub mod update;
