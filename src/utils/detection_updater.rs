//! 检测结果更新工具
//! 负责更新检测结果（叠加置信度、保留版本）

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::rule::TechRule;

/// 检测结果更新工具
pub struct DetectionUpdater;

impl DetectionUpdater {
    /// 更新检测结果：同技术多次命中时叠加置信度（上限100），保留首个版本
    pub fn update(
        detected: &mut HashMap<String, (u8, Option<String>)>,
        tech_name: String,
        confidence: Option<u8>,
        version: Option<String>,
    ) {
        let conf = confidence.unwrap_or(100);

        match detected.entry(tech_name) {
            Entry::Occupied(mut entry) => {
                let (existing_conf, existing_version) = entry.get_mut();
                *existing_conf = existing_conf.saturating_add(conf).min(100);

                if existing_version.is_none() {
                    *existing_version = version;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert((conf.min(100), version));
            }
        }
    }

    /// 应用关联推导规则（implies）
    pub fn apply_implies(
        tech_rules: &HashMap<String, TechRule>,
        detected: &mut HashMap<String, (u8, Option<String>)>,
    ) {
        let mut implied_techs = Vec::new();

        for (tech_name, tech_rule) in tech_rules {
            if detected.contains_key(tech_name) {
                if let Some(implies) = &tech_rule.implies {
                    Self::parse_implies(implies, &mut implied_techs);
                }
            }
        }

        // 隐含技术默认置信度50
        for implied in implied_techs {
            detected.entry(implied).or_insert((50, None));
        }
    }

    /// 解析implies规则（字符串/字符串数组，剥离confidence标签）
    fn parse_implies(implies: &serde_json::Value, implied_techs: &mut Vec<String>) {
        let mut push = |s: &str| {
            // implies条目可携带 \;confidence:N 标签，技术名在标签前
            let name = s.split("\\;").next().unwrap_or(s).trim();
            if !name.is_empty() {
                implied_techs.push(name.to_string());
            }
        };

        match implies {
            serde_json::Value::String(s) => push(s),
            serde_json::Value::Array(arr) => {
                for item in arr {
                    if let serde_json::Value::String(s) = item {
                        push(s);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accumulates_confidence_clamped() {
        let mut detected = HashMap::new();
        DetectionUpdater::update(&mut detected, "Nginx".to_string(), Some(60), None);
        DetectionUpdater::update(&mut detected, "Nginx".to_string(), Some(60), Some("1.21".to_string()));

        let (conf, version) = detected.get("Nginx").unwrap();
        assert_eq!(*conf, 100);
        // 首次无版本，第二次命中补充版本
        assert_eq!(version.as_deref(), Some("1.21"));
    }

    #[test]
    fn test_update_keeps_first_version() {
        let mut detected = HashMap::new();
        DetectionUpdater::update(&mut detected, "jQuery".to_string(), Some(50), Some("3.6.0".to_string()));
        DetectionUpdater::update(&mut detected, "jQuery".to_string(), Some(50), Some("2.0.0".to_string()));

        assert_eq!(detected.get("jQuery").unwrap().1.as_deref(), Some("3.6.0"));
    }

    #[test]
    fn test_apply_implies_adds_missing_tech() {
        let raw = br#"{
            "categories": {},
            "technologies": {
                "WordPress": {"cats": [1], "implies": ["PHP", "MySQL\\;confidence:80"]},
                "PHP": {"cats": [27]},
                "MySQL": {"cats": [34]}
            }
        }"#;
        let lib = crate::rule::RuleLoader::parse(raw).unwrap();

        let mut detected = HashMap::new();
        detected.insert("WordPress".to_string(), (100u8, None));
        DetectionUpdater::apply_implies(&lib.tech_rules, &mut detected);

        assert_eq!(detected.get("PHP").unwrap().0, 50);
        assert!(detected.contains_key("MySQL"));
        // 已检出的技术不被implies覆盖
        assert_eq!(detected.get("WordPress").unwrap().0, 100);
    }
}
