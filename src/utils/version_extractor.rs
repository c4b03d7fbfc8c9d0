//! 版本提取工具模块
//! 根据版本模板从正则捕获结果中提取技术版本号
//! 支持 \1/\2 或 $1/$2 两种分组引用格式，自动过滤无效版本

use regex::Captures;

/// 版本提取工具类
pub struct VersionExtractor;

impl VersionExtractor {
    /// 从正则捕获结果中提取有效版本号
    /// 返回None的情形：模板为空、无任何有效替换、替换后仍残留占位符
    pub fn extract(version_template: &Option<String>, captures: &Captures) -> Option<String> {
        let template = version_template.as_ref().filter(|t| !t.trim().is_empty())?;

        let mut version = template.clone();
        let mut replaced = false;

        // 分组0是整体匹配，不参与版本提取
        for group_index in 1..captures.len() {
            let placeholder_backslash = format!("\\{}", group_index);
            let placeholder_dollar = format!("${}", group_index);

            let matched_str = captures
                .get(group_index)
                .map(|m| m.as_str().trim())
                .unwrap_or("");
            if !matched_str.is_empty() {
                replaced = true;
            }
            version = version.replace(&placeholder_backslash, matched_str);
            version = version.replace(&placeholder_dollar, matched_str);
        }

        let final_version = version.trim().to_string();
        if !replaced
            || final_version.is_empty()
            || final_version.contains('\\')
            || final_version.contains('$')
        {
            return None;
        }
        Some(final_version)
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_extract_with_backslash_placeholder() {
        let regex = Regex::new(r#"nginx(?:/([\d.]+))?"#).unwrap();
        let captures = regex.captures("nginx/1.21.6").unwrap();
        let template = Some("\\1".to_string());

        let version = VersionExtractor::extract(&template, &captures);
        assert_eq!(version, Some("1.21.6".to_string()));
    }

    #[test]
    fn test_extract_with_dollar_placeholder() {
        let regex = Regex::new(r#"apache(?:/([\d.]+))?"#).unwrap();
        let captures = regex.captures("apache/2.4.57").unwrap();
        let template = Some("$1".to_string());

        let version = VersionExtractor::extract(&template, &captures);
        assert_eq!(version, Some("2.4.57".to_string()));
    }

    #[test]
    fn test_extract_empty_group_returns_none() {
        // 分组未命中时不应返回空串版本
        let regex = Regex::new(r#"nginx(?:/([\d.]+))?"#).unwrap();
        let captures = regex.captures("nginx").unwrap();
        let template = Some("\\1".to_string());

        assert_eq!(VersionExtractor::extract(&template, &captures), None);
    }

    #[test]
    fn test_extract_missing_placeholder_returns_none() {
        // 模板引用不存在的分组（\2），应返回None
        let regex = Regex::new(r#"nginx(?:/([\d.]+))?"#).unwrap();
        let captures = regex.captures("nginx/1.21.6").unwrap();
        let template = Some("\\2".to_string());

        assert_eq!(VersionExtractor::extract(&template, &captures), None);
    }

    #[test]
    fn test_extract_multi_group_template() {
        let regex = Regex::new(r#"(\w+)/v([\d.]+)-(\w+)"#).unwrap();
        let captures = regex.captures("rust/v1.75.0-stable").unwrap();
        let template = Some("\\1-$2-\\3".to_string());

        let version = VersionExtractor::extract(&template, &captures);
        assert_eq!(version, Some("rust-1.75.0-stable".to_string()));
    }
}
