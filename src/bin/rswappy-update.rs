//! rswappy-update 规则更新子工具入口
//! 拉取失败不触碰本地状态并以非零码退出；其余情形恰好打印一条结论

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::info;

use rswappy::{
    DEFAULT_RULES_FILE, DEFAULT_UPDATE_URL, RswappyError, RuleUpdater, init_logging, run_update,
};

#[derive(Parser, Debug)]
#[command(name = "rswappy-update", about = "Update the technologies rules used by rswappy")]
struct Args {
    /// URL to retrieve the technologies file
    #[arg(short, long, default_value = DEFAULT_UPDATE_URL, conflicts_with = "file")]
    url: String,

    /// File with technologies regexps
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Local rules file to update
    #[arg(long, value_name = "FILE", default_value = DEFAULT_RULES_FILE)]
    rules: PathBuf,

    /// Just check if update is required, without update
    #[arg(short, long)]
    check: bool,

    /// Verbosity
    #[arg(short, action = ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity);

    // 替换内容：本地文件优先，否则按远程源检索
    let content = match &args.file {
        Some(path) => tokio::fs::read(path).await.map_err(|e| {
            RswappyError::UpdateError(format!("读取替换文件 {} 失败：{}", path.display(), e))
        })?,
        None => {
            let updater = RuleUpdater::new(30)?;
            updater.retrieve(&args.url).await?
        }
    };
    info!("替换内容 {} 字节", content.len());

    let outcome = run_update(&args.rules, &content, args.check).await?;
    println!("{}", outcome);
    Ok(())
}
