//! 目标源：参数/文件/标准输入 -> 惰性目标序列
//! 空行与#注释行在进入调度器之前被丢弃

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use tracing::debug;

/// 目标序列迭代器
///
/// 取数优先级：显式参数逐个先按文件名尝试打开，打开成功则逐行
/// 产出文件内容；不存在则该参数本身作为一个字面目标。无任何
/// 参数时改读标准输入。序列每轮扫描恰好消费一次。
pub struct TargetSource {
    args: std::vec::IntoIter<String>,
    current: Option<Box<dyn BufRead>>,
}

impl TargetSource {
    pub fn new(args: Vec<String>) -> Self {
        // 无参数：从标准输入读取目标
        let current: Option<Box<dyn BufRead>> = if args.is_empty() {
            Some(Box::new(BufReader::new(io::stdin())))
        } else {
            None
        };

        Self {
            args: args.into_iter(),
            current,
        }
    }
}

impl Iterator for TargetSource {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            // 1. 当前读取器逐行消费
            if let Some(reader) = self.current.as_mut() {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => self.current = None,
                    Ok(_) => {
                        if let Some(target) = filter_line(&line) {
                            return Some(target);
                        }
                    }
                    Err(e) => {
                        debug!("读取目标流失败，跳过剩余内容：{}", e);
                        self.current = None;
                    }
                }
                continue;
            }

            // 2. 取下一个参数：文件优先，不存在则按字面目标处理
            let arg = self.args.next()?;
            match File::open(&arg) {
                Ok(file) => {
                    debug!("参数 {} 按目标文件展开", arg);
                    self.current = Some(Box::new(BufReader::new(file)));
                }
                Err(_) => {
                    debug!("文件 {} 不存在，按字面目标处理", arg);
                    if let Some(target) = filter_line(&arg) {
                        return Some(target);
                    }
                }
            }
        }
    }
}

/// 行过滤：裁剪空白；空行与#开头行丢弃
fn filter_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_literal_args_pass_through() {
        let source = TargetSource::new(vec![
            "https://a.example".to_string(),
            "https://b.example".to_string(),
        ]);
        let targets: Vec<String> = source.collect();
        assert_eq!(targets, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_blank_and_comment_lines_dropped() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "https://a.example").unwrap();
        writeln!(file, "#comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  https://b.example  ").unwrap();
        file.flush().unwrap();

        let source = TargetSource::new(vec![file.path().to_string_lossy().into_owned()]);
        let targets: Vec<String> = source.collect();
        // 恰好2个目标进入调度，且已裁剪空白
        assert_eq!(targets, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_missing_file_falls_back_to_literal() {
        let source = TargetSource::new(vec!["https://no-such-file.example".to_string()]);
        let targets: Vec<String> = source.collect();
        assert_eq!(targets, vec!["https://no-such-file.example"]);
    }

    #[test]
    fn test_mixed_file_and_literal_args() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "https://from-file.example").unwrap();
        file.flush().unwrap();

        let source = TargetSource::new(vec![
            file.path().to_string_lossy().into_owned(),
            "https://literal.example".to_string(),
        ]);
        let targets: Vec<String> = source.collect();
        assert_eq!(
            targets,
            vec!["https://from-file.example", "https://literal.example"]
        );
    }

    #[test]
    fn test_comment_literal_arg_dropped() {
        // 字面参数同样经过过滤规则
        let source = TargetSource::new(vec!["#commented-out".to_string(), "x.example".to_string()]);
        let targets: Vec<String> = source.collect();
        assert_eq!(targets, vec!["x.example"]);
    }
}
