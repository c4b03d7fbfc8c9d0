//! 规则数据模型定义
//! 仅存储规则数据与检测结果结构，无任何业务逻辑，支持序列化/反序列化

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

/// 技术分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

/// 技术条目（名称 + 有序分类列表，顺序跟随规则cats声明）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub categories: Vec<Category>,
}

/// 单次技术匹配结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechMatch {
    pub technology: Technology,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub confidence: u8,
}

// ======== 为 TechMatch 实现 Display trait（用于 CLI / 日志输出） ========
impl fmt::Display for TechMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) if !v.is_empty() => write!(f, "{} {}", self.technology.name, v),
            _ => write!(f, "{}", self.technology.name),
        }
    }
}

/// 技术规则定义（从 Wappalyzer JSON 解析）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TechRule {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "cats", default, alias = "categories")]
    pub category_ids: Vec<u32>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cpe: Option<String>,

    // 检测规则（字符串或字符串数组，编译期统一展开）
    #[serde(default)]
    pub url: Option<serde_json::Value>,
    #[serde(default)]
    pub html: Option<serde_json::Value>,
    #[serde(default)]
    pub scripts: Option<serde_json::Value>,
    // 兼容：wappalyzergo 的 scriptSrc 字段
    #[serde(rename = "scriptSrc", default)]
    pub script_src: Option<serde_json::Value>,
    #[serde(default)]
    pub meta: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, serde_json::Value>>,

    // 关联规则
    #[serde(default)]
    pub implies: Option<serde_json::Value>,
}

/// 分类规则定义（从 Wappalyzer JSON 解析）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub id: u32,
}

/// 规则文档（本地technologies.json的完整形态）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesetDocument {
    #[serde(rename = "$schema", default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub categories: HashMap<String, CategoryRule>,
    pub technologies: HashMap<String, TechRule>,
}

/// 完整规则库（加载后全程只读，多工作任务共享）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleLibrary {
    pub tech_rules: HashMap<String, TechRule>,
    pub category_rules: HashMap<String, CategoryRule>,
}

impl From<RulesetDocument> for RuleLibrary {
    fn from(doc: RulesetDocument) -> Self {
        let mut category_rules = doc.categories;
        // 补充分类ID（文档键即ID）
        for (key, cat) in &mut category_rules {
            if let Ok(id) = key.parse::<u32>() {
                cat.id = id;
            }
        }
        Self {
            tech_rules: doc.technologies,
            category_rules,
        }
    }
}
