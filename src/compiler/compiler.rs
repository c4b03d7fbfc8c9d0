//! 规则编译器核心
//! 仅负责将原始规则编译为可执行的正则模式

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use regex::Regex;
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use super::pattern::{CompiledPattern, CompiledRuleLibrary, CompiledTechRule, PatternTags};
use crate::rule::{RuleLibrary, TechRule};
use crate::error::RswResult;

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译规则库
    pub fn compile(rule_lib: &RuleLibrary) -> RswResult<CompiledRuleLibrary> {
        let start = Instant::now();
        let mut tech_patterns = HashMap::new();
        let mut category_map = HashMap::new();

        // 1. 构建分类映射（ID -> 名称）
        for cat_rule in rule_lib.category_rules.values() {
            category_map.insert(cat_rule.id, cat_rule.name.clone());
        }

        // 2. 编译每个技术规则
        let mut skipped = 0usize;
        for (tech_name, tech_rule) in &rule_lib.tech_rules {
            let compiled_tech = Self::compile_tech_rule(tech_name, tech_rule, &mut skipped);
            tech_patterns.insert(tech_name.clone(), compiled_tech);
        }

        debug!(
            "规则编译完成，技术数：{}，跳过非法模式：{}，耗时{:?}",
            tech_patterns.len(),
            skipped,
            start.elapsed()
        );

        Ok(CompiledRuleLibrary {
            tech_patterns,
            category_map,
        })
    }

    /// 编译单个技术规则
    fn compile_tech_rule(tech_name: &str, tech_rule: &TechRule, skipped: &mut usize) -> CompiledTechRule {
        let url_patterns = Self::compile_pattern_list(tech_rule.url.as_ref(), skipped);
        let html_patterns = Self::compile_pattern_list(tech_rule.html.as_ref(), skipped);
        let script_patterns = Self::compile_script_patterns(tech_rule, skipped);
        let meta_patterns = Self::compile_keyed_patterns(tech_rule.meta.as_ref(), skipped);
        let header_patterns = Self::compile_keyed_patterns(tech_rule.headers.as_ref(), skipped);

        CompiledTechRule {
            name: tech_name.to_string(),
            url_patterns: url_patterns.map(Arc::new),
            html_patterns: html_patterns.map(Arc::new),
            script_patterns: script_patterns.map(Arc::new),
            meta_patterns: meta_patterns.map(Arc::new),
            header_patterns: header_patterns.map(Arc::new),
            category_ids: tech_rule.category_ids.clone(),
        }
    }

    /// 编译列表型模式（url/html/script：字符串或字符串数组）
    fn compile_pattern_list(value: Option<&Value>, skipped: &mut usize) -> Option<Vec<CompiledPattern>> {
        let value = value?;

        let mut patterns = Vec::new();
        match value {
            Value::String(s) => Self::push_compiled(s, &mut patterns, skipped),
            Value::Array(arr) => {
                for item in arr {
                    if let Value::String(s) = item {
                        Self::push_compiled(s, &mut patterns, skipped);
                    }
                }
            }
            _ => {}
        }

        if patterns.is_empty() { None } else { Some(patterns) }
    }

    /// 编译Script模式（合并scripts和scriptSrc两个来源）
    fn compile_script_patterns(tech_rule: &TechRule, skipped: &mut usize) -> Option<Vec<CompiledPattern>> {
        let mut patterns = Vec::new();

        if let Some(mut p) = Self::compile_pattern_list(tech_rule.scripts.as_ref(), skipped) {
            patterns.append(&mut p);
        }
        if let Some(mut p) = Self::compile_pattern_list(tech_rule.script_src.as_ref(), skipped) {
            patterns.append(&mut p);
        }

        if patterns.is_empty() { None } else { Some(patterns) }
    }

    /// 编译键值对型模式（meta/header，键统一转小写）
    fn compile_keyed_patterns(
        value: Option<&HashMap<String, Value>>,
        skipped: &mut usize,
    ) -> Option<HashMap<String, Vec<CompiledPattern>>> {
        let value = value?;

        let mut keyed_patterns = HashMap::new();
        for (key, val) in value {
            if let Some(patterns) = Self::compile_pattern_list(Some(val), skipped) {
                keyed_patterns.insert(key.to_lowercase(), patterns);
            }
        }

        if keyed_patterns.is_empty() { None } else { Some(keyed_patterns) }
    }

    fn push_compiled(raw: &str, patterns: &mut Vec<CompiledPattern>, skipped: &mut usize) {
        match Self::compile_single_pattern(raw) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => {
                *skipped += 1;
                debug!("模式 {:?} 编译失败，已跳过：{}", raw, e);
            }
        }
    }

    /// 编译单个模式（修复Wappalyzer正则兼容性问题后编译）
    pub fn compile_single_pattern(raw_pattern: &str) -> RswResult<CompiledPattern> {
        static LOOK_AROUND_REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r#"\(\?<?[=!][^)]*\)"#).unwrap()
        });

        // 1. 剥离置信度/版本标签
        let tags = PatternTags::parse(raw_pattern);

        // 2. 清理原始正则
        let mut cleaned = tags.body;

        // 移除PCRE分隔符
        if cleaned.len() >= 2 && cleaned.starts_with('/') && cleaned.ends_with('/') {
            cleaned = cleaned[1..cleaned.len() - 1].to_string();
        }

        // 移除环视语法（regex crate不支持）
        cleaned = LOOK_AROUND_REGEX.replace_all(&cleaned, "").to_string();

        // 清理无效转义
        cleaned = Self::clean_invalid_escapes(&cleaned);

        // 剔除未闭合分组
        cleaned = Self::drop_unbalanced_groups(&cleaned);

        // 空模式匹配一切（Wappalyzer语义：字段存在即命中）
        let regex = Regex::new(&cleaned)?;

        Ok(CompiledPattern {
            regex,
            confidence: tags.confidence,
            version_template: tags.version_template,
        })
    }

    /// 清理无效转义符：保留正则元字符转义，去掉其余 \x 的反斜杠
    fn clean_invalid_escapes(s: &str) -> String {
        const VALID: &[char] = &[
            'd', 'D', 'w', 'W', 's', 'S', 'b', 'B', 'n', 'r', 't', 'x', 'u',
            '.', '+', '*', '?', '(', ')', '[', ']', '{', '}', '^', '$', '|', '/', '\\', '-', ';',
        ];

        let mut cleaned = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\\' {
                cleaned.push(c);
                continue;
            }
            match chars.next() {
                Some(next_c) if VALID.contains(&next_c) => {
                    cleaned.push('\\');
                    cleaned.push(next_c);
                }
                Some(next_c) => cleaned.push(next_c),
                None => {}
            }
        }
        cleaned
    }

    /// 剔除未闭合的分组括号（多余的 ")" 丢弃，多余的 "(" 从尾部反向移除）
    fn drop_unbalanced_groups(s: &str) -> String {
        let mut result: Vec<char> = Vec::with_capacity(s.len());
        let mut depth = 0usize;
        let mut escaped = false;

        for c in s.chars() {
            if escaped {
                escaped = false;
                result.push(c);
                continue;
            }
            match c {
                '\\' => {
                    escaped = true;
                    result.push(c);
                }
                '(' => {
                    depth += 1;
                    result.push(c);
                }
                ')' => {
                    if depth > 0 {
                        depth -= 1;
                        result.push(c);
                    }
                }
                _ => result.push(c),
            }
        }

        // 仍有未闭合的 "("：从尾部反向剔除
        let mut i = result.len();
        while i > 0 && depth > 0 {
            i -= 1;
            if result[i] == '(' && (i == 0 || result[i - 1] != '\\') {
                result.remove(i);
                depth -= 1;
            }
        }

        result.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleLoader;

    #[test]
    fn test_compile_single_pattern_with_tags() {
        let p = RuleCompiler::compile_single_pattern(r"nginx(?:/([\d.]+))?\;version:\1").unwrap();
        assert_eq!(p.confidence, 100);
        assert_eq!(p.version_template, Some(r"\1".to_string()));
        assert!(p.regex.is_match("nginx/1.21.6"));
    }

    #[test]
    fn test_compile_strips_pcre_delimiters() {
        let p = RuleCompiler::compile_single_pattern(r"/wp-content/").unwrap();
        assert!(p.regex.is_match("https://x.example/wp-content/themes"));
    }

    #[test]
    fn test_compile_removes_lookahead() {
        // regex crate不支持环视，应清理后编译成功
        let p = RuleCompiler::compile_single_pattern(r"jquery(?!-ui)([\d.]*)").unwrap();
        assert!(p.regex.is_match("jquery3.6.0"));
    }

    #[test]
    fn test_compile_drops_unbalanced_group() {
        let p = RuleCompiler::compile_single_pattern(r"varnish(v\d").unwrap();
        assert!(p.regex.is_match("varnishv4"));
    }

    #[test]
    fn test_compile_library_skips_bad_patterns() {
        let raw = br#"{
            "categories": {"59": {"name": "JavaScript libraries"}},
            "technologies": {
                "jQuery": {
                    "cats": [59],
                    "scriptSrc": ["jquery[.-]([\\d.]+)\\.js\\;version:\\1", "jquery"]
                }
            }
        }"#;
        let lib = RuleLoader::parse(raw).unwrap();
        let compiled = RuleCompiler::compile(&lib).unwrap();
        let tech = compiled.tech_patterns.get("jQuery").unwrap();
        assert_eq!(tech.script_patterns.as_ref().unwrap().len(), 2);
        assert_eq!(compiled.category_map.get(&59).unwrap(), "JavaScript libraries");
    }
}
