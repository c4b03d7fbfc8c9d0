//! 编译后模式模型
//! 正则编译后的结构与Wappalyzer模式标签解析

use std::collections::HashMap;
use std::sync::Arc;
use regex::Regex;

/// 编译后的正则模式
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub regex: Regex,
    pub confidence: u8,
    pub version_template: Option<String>,
}

/// Wappalyzer原始模式串的标签解析结果
/// 模式本体与 `\;confidence:N` / `\;version:\1` 标签分离
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTags {
    pub body: String,
    pub confidence: u8,
    pub version_template: Option<String>,
}

impl PatternTags {
    /// 解析原始模式串，剥离置信度与版本标签
    pub fn parse(raw: &str) -> Self {
        let mut confidence = 100u8;
        let mut version_template = None;

        // 标准分隔符为 \; ，部分规则源省略反斜杠
        let mut parts = raw.split("\\;");
        let mut body = parts.next().unwrap_or("").to_string();
        for tag in parts {
            Self::apply_tag(tag, &mut confidence, &mut version_template);
        }

        // 兼容无反斜杠写法：;confidence: / ;version:（置信度标签约定在尾部，先剥离）
        for marker in [";confidence:", ";version:"] {
            if let Some(pos) = body.find(marker) {
                let tag = body[pos + 1..].to_string();
                body.truncate(pos);
                Self::apply_tag(&tag, &mut confidence, &mut version_template);
            }
        }

        Self {
            body,
            confidence,
            version_template,
        }
    }

    fn apply_tag(tag: &str, confidence: &mut u8, version_template: &mut Option<String>) {
        if let Some(v) = tag.strip_prefix("confidence:") {
            *confidence = v.trim().parse::<u8>().unwrap_or(100).min(100);
        } else if let Some(v) = tag.strip_prefix("version:") {
            if !v.trim().is_empty() {
                *version_template = Some(v.to_string());
            }
        }
    }
}

/// 技术编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledTechRule {
    pub name: String,
    pub url_patterns: Option<Arc<Vec<CompiledPattern>>>,
    pub html_patterns: Option<Arc<Vec<CompiledPattern>>>,
    pub script_patterns: Option<Arc<Vec<CompiledPattern>>>,
    pub meta_patterns: Option<Arc<HashMap<String, Vec<CompiledPattern>>>>,
    pub header_patterns: Option<Arc<HashMap<String, Vec<CompiledPattern>>>>,
    pub category_ids: Vec<u32>,
}

/// 编译后的规则库
#[derive(Debug, Clone)]
pub struct CompiledRuleLibrary {
    pub tech_patterns: HashMap<String, CompiledTechRule>,
    pub category_map: HashMap<u32, String>, // 分类ID -> 分类名称
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_pattern() {
        // 测试场景：无标签模式，默认置信度100
        let tags = PatternTags::parse(r"nginx(?:/([\d.]+))?");
        assert_eq!(tags.body, r"nginx(?:/([\d.]+))?");
        assert_eq!(tags.confidence, 100);
        assert_eq!(tags.version_template, None);
    }

    #[test]
    fn test_parse_version_and_confidence_tags() {
        // 测试场景：标准 \; 分隔的双标签
        let tags = PatternTags::parse(r"jquery[.-]([\d.]+)\.js\;version:\1\;confidence:50");
        assert_eq!(tags.body, r"jquery[.-]([\d.]+)\.js");
        assert_eq!(tags.confidence, 50);
        assert_eq!(tags.version_template, Some(r"\1".to_string()));
    }

    #[test]
    fn test_parse_tag_without_backslash() {
        // 测试场景：部分规则源省略反斜杠的 ;version: 写法
        let tags = PatternTags::parse(r"WordPress ([\d.]+);version:\1");
        assert_eq!(tags.body, "WordPress ([\\d.]+)");
        assert_eq!(tags.version_template, Some(r"\1".to_string()));
    }

    #[test]
    fn test_parse_oversized_confidence_clamped() {
        // 测试场景：置信度超过100按100截断
        let tags = PatternTags::parse(r"cloudflare\;confidence:100");
        assert_eq!(tags.confidence, 100);
        let tags = PatternTags::parse(r"cloudflare\;confidence:abc");
        assert_eq!(tags.confidence, 100);
    }
}
