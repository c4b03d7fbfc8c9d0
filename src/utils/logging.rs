//! 日志初始化
//! 进程级诊断配置：启动期一次性写入，扫描期间只读（无需同步）

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// 根据-v重复次数初始化全局日志
/// 0=仅错误 1=警告 2=信息 ≥3=调试；RUST_LOG环境变量优先
/// 诊断输出走stderr，stdout归打印线程独占
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
