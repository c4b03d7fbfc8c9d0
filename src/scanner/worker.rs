//! 抓取匹配工作单元
//! 一个目标 = 一次GET + 一次匹配 = 恰好一个FetchOutcome

use std::time::Duration;

use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::info;
use url::Url;

use super::snapshot::PageSnapshot;
use crate::config::ScanConfig;
use crate::detector::TechDetector;
use crate::error::{RswResult, RswappyError};
use crate::rule::TechMatch;

/// 单目标处理结果：成功（含零匹配）或失败，二者必居其一
#[derive(Debug)]
pub enum FetchOutcome {
    Success {
        target: String,
        matches: Vec<TechMatch>,
    },
    Failure {
        target: String,
        error: RswappyError,
    },
}

impl FetchOutcome {
    pub fn target(&self) -> &str {
        match self {
            FetchOutcome::Success { target, .. } => target,
            FetchOutcome::Failure { target, .. } => target,
        }
    }
}

/// 构建全工作任务共享的HTTP客户端
/// 证书校验默认关闭（自签名目标也纳入扫描面），连接池天然并发安全
pub fn build_http_client(config: &ScanConfig) -> RswResult<Client> {
    let redirect = if config.follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };

    let client = Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(redirect)
        .timeout(Duration::from_secs(config.http_timeout))
        .user_agent(config.user_agent.clone())
        .gzip(true)
        .build()?;
    Ok(client)
}

/// 工作单元主函数：单次请求 + 单次匹配
/// 任何传输层失败（URL非法/DNS/连接/TLS/超时）与匹配引擎失败
/// 均隔离为该目标的Failure，绝不向上抛出
pub async fn fetch_and_match(client: Client, detector: TechDetector, target: String) -> FetchOutcome {
    let snapshot = match fetch_snapshot(&client, &target).await {
        Ok(snapshot) => snapshot,
        Err(error) => return FetchOutcome::Failure { target, error },
    };

    match detector.detect(&snapshot) {
        Ok(matches) => {
            if matches.is_empty() {
                info!("{}: 未识别到任何技术", snapshot.final_url);
            }
            FetchOutcome::Success { target, matches }
        }
        Err(error) => FetchOutcome::Failure { target, error },
    }
}

/// 执行单次GET并降格为响应快照
/// 非2xx状态码不是错误，照常返回快照参与匹配
async fn fetch_snapshot(client: &Client, target: &str) -> RswResult<PageSnapshot> {
    let url = Url::parse(target)?;
    info!("请求 {}", target);

    let response = client.get(url).send().await?;
    PageSnapshot::from_response(target.to_string(), response).await
}
