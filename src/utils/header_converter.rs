//! Header格式转换工具
//! 不同Header格式之间的转换

use std::collections::HashMap;
use reqwest::header::HeaderMap;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 将HeaderMap转换为HashMap<String, Vec<String>>（键统一小写）
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in header_map.iter() {
            let key_str = key.as_str().to_lowercase();
            let value_str = value.to_str().unwrap_or("").to_string();
            map.entry(key_str).or_default().push(value_str);
        }
        map
    }

    /// 将HashMap<String, Vec<String>>压缩为单值HashMap<String, String>
    /// 取每个键第一个非空值
    pub fn to_single_value(hashmap: &HashMap<String, Vec<String>>) -> HashMap<String, String> {
        let mut single_map = HashMap::new();
        for (key, values) in hashmap {
            if let Some(first_val) = values.iter().find(|v| !v.is_empty()) {
                single_map.insert(key.clone(), first_val.clone());
            }
        }
        single_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    #[test]
    fn test_to_hashmap_lowercases_and_collects() {
        let mut headers = HeaderMap::new();
        headers.append(
            HeaderName::from_static("server"),
            HeaderValue::from_static("nginx/1.21.6"),
        );
        headers.append(
            HeaderName::from_static("set-cookie"),
            HeaderValue::from_static("a=1"),
        );
        headers.append(
            HeaderName::from_static("set-cookie"),
            HeaderValue::from_static("b=2"),
        );

        let map = HeaderConverter::to_hashmap(&headers);
        assert_eq!(map.get("server").unwrap(), &vec!["nginx/1.21.6".to_string()]);
        assert_eq!(map.get("set-cookie").unwrap().len(), 2);
    }

    #[test]
    fn test_to_single_value_takes_first_non_empty() {
        let mut map = HashMap::new();
        map.insert("x-powered-by".to_string(), vec!["".to_string(), "PHP/8.1".to_string()]);

        let single = HeaderConverter::to_single_value(&map);
        assert_eq!(single.get("x-powered-by").unwrap(), "PHP/8.1");
    }
}
