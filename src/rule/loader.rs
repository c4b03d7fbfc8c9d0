//! 规则加载管理器
//! 负责从本地规则文件解析规则库，解析失败视为启动期致命错误

use std::path::Path;
use tracing::debug;

use super::model::{RuleLibrary, RulesetDocument};
use crate::error::{RswResult, RswappyError};

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 从本地规则文件加载规则库
    pub async fn load(path: &Path) -> RswResult<RuleLibrary> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            RswappyError::RuleLoadError(format!("读取规则文件 {} 失败：{}", path.display(), e))
        })?;
        Self::parse(&data)
    }

    /// 解析规则文档字节流
    pub fn parse(data: &[u8]) -> RswResult<RuleLibrary> {
        let doc: RulesetDocument = serde_json::from_slice(data)
            .map_err(|e| RswappyError::RuleParseError(format!("规则文档格式非法：{}", e)))?;

        let rule_lib = RuleLibrary::from(doc);
        debug!(
            "规则文档解析成功，技术规则数：{}，分类规则数：{}",
            rule_lib.tech_rules.len(),
            rule_lib.category_rules.len()
        );
        Ok(rule_lib)
    }
}
