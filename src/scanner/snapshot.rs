//! 响应快照：抓取与匹配之间的数据交接结构

use std::collections::HashMap;

use crate::error::RswResult;
use crate::utils::HeaderConverter;

/// 单次请求的响应快照
/// 匹配引擎的唯一输入，构建完成后只读
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// 原始目标串（调度时的身份标识，不做归一化）
    pub target: String,
    /// 重定向后的最终URL
    pub final_url: String,
    /// 响应状态码（非2xx同样参与匹配）
    pub status: u16,
    /// 响应头（键小写）
    pub headers: HashMap<String, Vec<String>>,
    /// 响应体（按UTF-8有损解码）
    pub body: String,
}

impl PageSnapshot {
    /// 从reqwest响应构建快照（消耗响应体）
    pub async fn from_response(target: String, response: reqwest::Response) -> RswResult<Self> {
        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = HeaderConverter::to_hashmap(response.headers());
        let body_bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&body_bytes).into_owned();

        Ok(Self {
            target,
            final_url,
            status,
            headers,
            body,
        })
    }
}
