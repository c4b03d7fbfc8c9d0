//! 扫描流水线核心：快照 / 工作单元 / 调度器 / 打印器

pub mod snapshot;
pub mod worker;
pub mod dispatcher;
pub mod printer;

pub use snapshot::PageSnapshot;
pub use worker::{FetchOutcome, build_http_client, fetch_and_match};
pub use dispatcher::{DispatchReport, ResultMessage, dispatch_all};
pub use printer::{JsonRecord, format_line, json_record, spawn_printer};
