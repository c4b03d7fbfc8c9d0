//! 规则更新/合并流水线
//! 与扫描流水线零共享状态，作为独立操作调用
//! 内容哈希一致则不触碰本地文件；仅在内容真正变化时覆盖

use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{RswResult, RswappyError};

/// 默认远程规则源（分片仓库根目录）
pub const DEFAULT_UPDATE_URL: &str =
    "https://raw.githubusercontent.com/enthec/webappanalyzer/main/src";

/// 合并后规则文档的schema引用
const SCHEMA_REF: &str = "../schema.json";

/// 单次更新操作的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    NoUpdateRequired,
    UpdateRequired,
    UpdateSuccessful,
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::NoUpdateRequired => write!(f, "No update required"),
            UpdateOutcome::UpdateRequired => write!(f, "Update required"),
            UpdateOutcome::UpdateSuccessful => write!(f, "Update successful"),
        }
    }
}

/// 内容哈希（SHA-256十六进制），仅用于等值比较
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// 本地文件哈希；文件不存在返回None（视为必然需要更新）
pub async fn file_hash(path: &Path) -> RswResult<Option<String>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(content_hash(&data))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// 合并后的完整规则文档
/// serde_json的Map按键排序，同样内容必然序列化出同样字节
#[derive(Debug, Serialize)]
struct MergedRuleset {
    #[serde(rename = "$schema")]
    schema: String,
    categories: Map<String, Value>,
    technologies: Map<String, Value>,
}

/// 将分片与分类表组装为完整规则文档字节流
/// 后到的分片覆盖先到分片的同名键
pub fn assemble_document(
    categories: Map<String, Value>,
    fragments: Vec<Map<String, Value>>,
) -> RswResult<Vec<u8>> {
    let mut technologies = Map::new();
    for fragment in fragments {
        technologies.extend(fragment);
    }

    if technologies.is_empty() {
        return Err(RswappyError::UpdateError("未取得任何技术规则".to_string()));
    }

    let doc = MergedRuleset {
        schema: SCHEMA_REF.to_string(),
        categories,
        technologies,
    };
    Ok(serde_json::to_vec_pretty(&doc)?)
}

/// 规则内容检索器
pub struct RuleUpdater {
    client: Client,
}

impl RuleUpdater {
    pub fn new(http_timeout: u64) -> RswResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http_timeout))
            .user_agent(format!("rswappy/{}", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| RswappyError::UpdateError(format!("构建HTTP客户端失败：{}", e)))?;
        Ok(Self { client })
    }

    /// 检索远程替换内容
    /// 以.json结尾视为单文档源；否则按分片仓库根目录处理
    pub async fn retrieve(&self, source: &str) -> RswResult<Vec<u8>> {
        if source.ends_with(".json") {
            self.fetch_document(source).await
        } else {
            self.fetch_fragments(source).await
        }
    }

    /// 拉取单个完整规则文档
    async fn fetch_document(&self, url: &str) -> RswResult<Vec<u8>> {
        info!("拉取完整规则文档：{}", url);
        let bytes = self.fetch_bytes(url).await?;
        Ok(bytes)
    }

    /// 分片拉取：technologies/{a..z,_}.json 逐个取回合并，
    /// 外加单独的categories.json；上游仓库即按此布局发布
    async fn fetch_fragments(&self, base: &str) -> RswResult<Vec<u8>> {
        let base = base.trim_end_matches('/');

        let mut fragments = Vec::new();
        for letter in ('a'..='z').map(String::from).chain(std::iter::once("_".to_string())) {
            let url = format!("{}/technologies/{}.json", base, letter);
            debug!("拉取规则分片 [{}]", letter);
            let fragment: Map<String, Value> = self.fetch_json(&url).await?;
            debug!("分片 [{}] 含 {} 条规则", letter, fragment.len());
            fragments.push(fragment);
        }

        let cat_url = format!("{}/categories.json", base);
        let categories: Map<String, Value> = self.fetch_json(&cat_url).await?;
        info!("分片拉取完成，分类 {} 条", categories.len());

        assemble_document(categories, fragments)
    }

    async fn fetch_bytes(&self, url: &str) -> RswResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RswappyError::UpdateError(format!("请求 {} 失败：{}", url, e)))?;

        if !response.status().is_success() {
            return Err(RswappyError::UpdateError(format!(
                "URL {} 返回状态码 {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RswappyError::UpdateError(format!("读取 {} 响应体失败：{}", url, e)))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_json(&self, url: &str) -> RswResult<Map<String, Value>> {
        let bytes = self.fetch_bytes(url).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| RswappyError::UpdateError(format!("解析 {} 失败：{}", url, e)))
    }
}

/// 更新决策：比较内容哈希，检查模式只报告，更新模式覆盖本地文件
pub async fn run_update(
    rules_path: &Path,
    content: &[u8],
    check_only: bool,
) -> RswResult<UpdateOutcome> {
    let local_hash = file_hash(rules_path).await?;
    let new_hash = content_hash(content);
    debug!("本地哈希：{:?}", local_hash);
    debug!("远端哈希：{}", new_hash);

    if local_hash.as_deref() == Some(new_hash.as_str()) {
        return Ok(UpdateOutcome::NoUpdateRequired);
    }

    if check_only {
        return Ok(UpdateOutcome::UpdateRequired);
    }

    tokio::fs::write(rules_path, content).await?;
    Ok(UpdateOutcome::UpdateSuccessful)
}
