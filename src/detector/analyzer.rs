//! 检测分析器：负责URL/Header/HTML/Script/Meta五个维度的匹配
use std::collections::HashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::compiler::{CompiledPattern, CompiledRuleLibrary};
use crate::utils::{DetectionUpdater, VersionExtractor};

/// 检测中间态：技术名 -> (置信度, 版本)
pub type Detected = HashMap<String, (u8, Option<String>)>;

/// 对单个输入串依次应用一组模式，首个命中后停止
fn apply_patterns(
    tech_name: &str,
    patterns: &[CompiledPattern],
    input: &str,
    dimension: &str,
    detected: &mut Detected,
) {
    for pattern in patterns {
        let Some(captures) = pattern.regex.captures(input) else {
            continue;
        };
        let version = VersionExtractor::extract(&pattern.version_template, &captures);
        debug!(
            "{}匹配成功：技术={}，版本={:?}，规则={}",
            dimension,
            tech_name,
            version,
            pattern.regex.as_str()
        );
        DetectionUpdater::update(
            detected,
            tech_name.to_string(),
            Some(pattern.confidence),
            version,
        );
        break;
    }
}

/// URL分析器
pub struct UrlAnalyzer;

impl UrlAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, urls: &[&str], detected: &mut Detected) {
        for url in urls {
            for compiled_tech in compiled_lib.tech_patterns.values() {
                // 跳过已100%置信度的技术
                if let Some((conf, _)) = detected.get(&compiled_tech.name) {
                    if *conf >= 100 {
                        continue;
                    }
                }
                let Some(url_patterns) = &compiled_tech.url_patterns else {
                    continue;
                };
                apply_patterns(&compiled_tech.name, url_patterns, url, "URL", detected);
            }
        }
    }
}

/// Header分析器
pub struct HeaderAnalyzer;

impl HeaderAnalyzer {
    pub fn analyze(
        compiled_lib: &CompiledRuleLibrary,
        headers: &HashMap<String, String>,
        detected: &mut Detected,
    ) {
        for compiled_tech in compiled_lib.tech_patterns.values() {
            let Some(header_patterns) = &compiled_tech.header_patterns else {
                continue;
            };
            for (header_name, patterns) in header_patterns.iter() {
                let Some(header_value) = headers.get(header_name) else {
                    continue;
                };
                apply_patterns(&compiled_tech.name, patterns, header_value, "Header", detected);
            }
        }
    }
}

/// HTML分析器
pub struct HtmlAnalyzer;

impl HtmlAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, html: &str, detected: &mut Detected) {
        for compiled_tech in compiled_lib.tech_patterns.values() {
            let Some(html_patterns) = &compiled_tech.html_patterns else {
                continue;
            };
            apply_patterns(&compiled_tech.name, html_patterns, html, "HTML", detected);
        }
    }
}

/// Script分析器
pub struct ScriptAnalyzer;

impl ScriptAnalyzer {
    pub fn analyze(compiled_lib: &CompiledRuleLibrary, script_srcs: &[String], detected: &mut Detected) {
        // jQuery版本常见于文件名或CDN路径，规则本体不携带版本分组
        static JQUERY_VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r#"jquery-(\d+\.\d+\.\d+)|/(\d+\.\d+\.\d+)/jquery"#).unwrap()
        });

        for src in script_srcs {
            for compiled_tech in compiled_lib.tech_patterns.values() {
                let Some(script_patterns) = &compiled_tech.script_patterns else {
                    continue;
                };
                for pattern in script_patterns.iter() {
                    let Some(captures) = pattern.regex.captures(src) else {
                        continue;
                    };
                    let mut version = VersionExtractor::extract(&pattern.version_template, &captures);
                    if version.is_none() && compiled_tech.name == "jQuery" {
                        version = JQUERY_VERSION_REGEX.captures(src).and_then(|cap| {
                            cap.get(1)
                                .or_else(|| cap.get(2))
                                .map(|m| m.as_str().to_string())
                        });
                    }
                    DetectionUpdater::update(
                        detected,
                        compiled_tech.name.clone(),
                        Some(pattern.confidence),
                        version,
                    );
                    break;
                }
            }
        }
    }
}

/// Meta分析器
pub struct MetaAnalyzer;

impl MetaAnalyzer {
    pub fn analyze(
        compiled_lib: &CompiledRuleLibrary,
        meta_tags: &[(String, String)],
        detected: &mut Detected,
    ) {
        for (meta_name, content) in meta_tags {
            for compiled_tech in compiled_lib.tech_patterns.values() {
                let Some(meta_patterns) = &compiled_tech.meta_patterns else {
                    continue;
                };
                let Some(patterns) = meta_patterns.get(meta_name) else {
                    continue;
                };
                apply_patterns(&compiled_tech.name, patterns, content, "Meta", detected);
            }
        }
    }
}
