//! rswappy 扫描器命令行入口
//! 流程：加载规则（失败即终止）-> 启动打印任务 -> 调度目标流 -> 排空退出
//! 单个目标的抓取失败只记日志，整体退出码恒为0

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tracing::{error, info};

use rswappy::{
    DEFAULT_RULES_FILE, DEFAULT_WORKERS, OutputConfig, RuleLoader, ScanConfig, TargetSource,
    TechDetector, build_http_client, dispatch_all, fetch_and_match, init_logging, spawn_printer,
};

#[derive(Parser, Debug)]
#[command(name = "rswappy", about = "Discover web technologies in web applications from your terminal")]
struct Args {
    /// URL or file with URLs to request
    #[arg(value_name = "TARGET")]
    target: Vec<String>,

    /// File with technologies regexps
    #[arg(long, value_name = "FILE", default_value = DEFAULT_RULES_FILE)]
    file: PathBuf,

    /// Set the number of workers
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Show confidence
    #[arg(short, long)]
    confidence: bool,

    /// Show version
    #[arg(short = 'b', long = "version")]
    version: bool,

    /// Show categories
    #[arg(short = 'k', long)]
    category: bool,

    /// Hide URL
    #[arg(short = 'U', long = "no-url")]
    no_url: bool,

    /// Set fields delimiter
    #[arg(short, long, default_value = " ")]
    delimiter: String,

    /// Print in json format
    #[arg(short, long)]
    json: bool,

    /// Don't follow redirects
    #[arg(short = 'R', long = "no-redirect")]
    no_redirect: bool,

    /// Verbosity
    #[arg(short, action = ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity);

    let scan_config = ScanConfig {
        rules_path: args.file,
        workers: args.workers.max(1),
        follow_redirects: !args.no_redirect,
        ..Default::default()
    };

    // 规则加载失败是唯一的启动期致命错误
    let rule_lib = RuleLoader::load(&scan_config.rules_path).await?;
    info!("已加载 {} 条技术规则", rule_lib.tech_rules.len());
    info!("已加载 {} 条分类规则", rule_lib.category_rules.len());

    let output_config = OutputConfig {
        json: args.json,
        delimiter: args.delimiter,
        show_url: !args.no_url,
        show_version: args.version,
        show_confidence: args.confidence,
        show_category: args.category,
    };
    info!("并发工作槽：{}", scan_config.workers);
    info!("输出模式：{}", if output_config.json { "json" } else { "grep" });

    let detector = TechDetector::from_library(&rule_lib)?;
    let client = build_http_client(&scan_config)?;

    let (tx, rx) = mpsc::unbounded_channel();

    // 打印任务先于调度启动，首个结果就绪即可消费
    let printer = spawn_printer(rx, output_config);

    let worker = move |target: String| fetch_and_match(client.clone(), detector.clone(), target);
    let report = dispatch_all(
        TargetSource::new(args.target),
        scan_config.workers,
        tx,
        worker,
    )
    .await;

    info!("已请求 {} 个目标", report.submitted);
    if report.faults > 0 {
        error!("{} 个工作任务异常终止，已降级为失败结果", report.faults);
    }

    // 打印任务在观察到终止标记后自行退出
    printer.await?;
    Ok(())
}
