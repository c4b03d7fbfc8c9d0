//! 检测器核心：整合各维度分析器，输出匹配结果
//! detect为纯函数：同一规则库与同一响应快照必得同一结果，无副作用

use std::collections::HashMap;
use std::sync::Arc;

use super::analyzer::{Detected, HeaderAnalyzer, HtmlAnalyzer, MetaAnalyzer, ScriptAnalyzer, UrlAnalyzer};
use crate::compiler::{CompiledRuleLibrary, RuleCompiler};
use crate::error::RswResult;
use crate::extractor::HtmlExtractor;
use crate::rule::{Category, RuleLibrary, TechMatch, TechRule, Technology};
use crate::scanner::PageSnapshot;
use crate::utils::{DetectionUpdater, HeaderConverter};

/// 技术检测器
/// 加载后只读，克隆仅复制Arc，可安全地被所有工作任务共享
#[derive(Debug, Clone)]
pub struct TechDetector {
    compiled_lib: Arc<CompiledRuleLibrary>,
    raw_tech_rules: Arc<HashMap<String, TechRule>>,
}

impl TechDetector {
    /// 从规则库构建检测器（编译全部规则）
    pub fn from_library(rule_lib: &RuleLibrary) -> RswResult<Self> {
        let compiled_lib = RuleCompiler::compile(rule_lib)?;
        Ok(Self {
            compiled_lib: Arc::new(compiled_lib),
            raw_tech_rules: Arc::new(rule_lib.tech_rules.clone()),
        })
    }

    /// 核心检测接口：单个响应快照 -> 匹配列表
    /// 非2xx响应同样参与匹配；零匹配是合法结果
    pub fn detect(&self, snapshot: &PageSnapshot) -> RswResult<Vec<TechMatch>> {
        // 1. Header压缩为单值映射
        let single_header_map = HeaderConverter::to_single_value(&snapshot.headers);

        // 2. 提取HTML标签
        let html_result = HtmlExtractor::new().extract(&snapshot.body);
        let script_srcs = html_result.get_script_srcs();
        let meta_tags = html_result.get_meta_tags();

        // 3. 待分析URL：原始目标 + 重定向后的最终URL
        let mut urls: Vec<&str> = vec![snapshot.target.as_str()];
        if snapshot.final_url != snapshot.target {
            urls.push(snapshot.final_url.as_str());
        }

        // 4. 执行各维度分析
        let mut detected: Detected = HashMap::new();
        UrlAnalyzer::analyze(&self.compiled_lib, &urls, &mut detected);
        HeaderAnalyzer::analyze(&self.compiled_lib, &single_header_map, &mut detected);
        HtmlAnalyzer::analyze(&self.compiled_lib, &snapshot.body, &mut detected);
        ScriptAnalyzer::analyze(&self.compiled_lib, &script_srcs, &mut detected);
        MetaAnalyzer::analyze(&self.compiled_lib, &meta_tags, &mut detected);

        // 5. 应用关联推导规则
        DetectionUpdater::apply_implies(&self.raw_tech_rules, &mut detected);

        // 6. 转换为最终结果
        let mut matches = Vec::with_capacity(detected.len());
        for (tech_name, (confidence, version)) in detected {
            // implies可能指向规则库中不存在的技术名，直接丢弃
            let Some(compiled_tech) = self.compiled_lib.tech_patterns.get(&tech_name) else {
                continue;
            };

            // 分类顺序跟随规则cats声明
            let categories = compiled_tech
                .category_ids
                .iter()
                .filter_map(|cat_id| self.compiled_lib.category_map.get(cat_id))
                .map(|name| Category { name: name.clone() })
                .collect();

            matches.push(TechMatch {
                technology: Technology {
                    name: tech_name,
                    categories,
                },
                version,
                confidence,
            });
        }

        // HashMap遍历序不稳定，按技术名排序保证同输入同输出
        matches.sort_by(|a, b| a.technology.name.cmp(&b.technology.name));
        Ok(matches)
    }
}
