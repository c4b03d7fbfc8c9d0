//! 调度器：固定大小工作池 + 结果通道终止协议
//! 不变式：每个提交目标恰好产出一条结果消息，终止标记唯一且严格最后

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::worker::FetchOutcome;
use crate::error::RswappyError;

/// 结果通道消息
/// 终止标记是独立变体而非带内魔法值，与真实数据不可能冲突
#[derive(Debug)]
pub enum ResultMessage {
    Outcome(FetchOutcome),
    Done,
}

/// 一轮调度的汇总报告
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchReport {
    /// 提交到工作池的目标总数
    pub submitted: usize,
    /// 异常终止（panic）后被降级为Failure的任务数
    pub faults: usize,
}

/// 调度主循环：目标流 -> 有界并发工作池 -> 结果通道
///
/// 并发许可是唯一的准入控制：池满时本循环在acquire处挂起，
/// 目标流的消费速度随之自然回压。目标流耗尽且全部在途任务
/// 结束后，发送唯一的Done——晚于所有结果消息。
///
/// 工作任务panic不会丢失结果：join侧将该目标降级为
/// WorkerPanic失败并计入faults，池照常排空，消费端绝不悬挂。
pub async fn dispatch_all<I, F, Fut>(
    targets: I,
    workers: usize,
    tx: UnboundedSender<ResultMessage>,
    worker_fn: F,
) -> DispatchReport
where
    I: IntoIterator<Item = String>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = FetchOutcome> + Send + 'static,
{
    let workers = workers.max(1);
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut handles: Vec<(String, JoinHandle<()>)> = Vec::new();
    let mut submitted = 0usize;

    for target in targets {
        // 池满时在此挂起，W是唯一的并发上限
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("信号量不会在调度期间关闭");

        let tx_task = tx.clone();
        let fut = worker_fn(target.clone());
        submitted += 1;

        let handle = tokio::spawn(async move {
            let _permit = permit; // 任务结束自动释放许可
            let outcome = fut.await;
            // 仅当消费端提前消亡时失败，此时结果已无处可去
            let _ = tx_task.send(ResultMessage::Outcome(outcome));
        });
        handles.push((target, handle));
    }
    debug!("目标流耗尽，共提交 {} 个目标，等待在途任务排空", submitted);

    // 等待全部在途任务完成；panic任务降级为该目标的Failure
    let mut faults = 0usize;
    for (target, handle) in handles {
        if let Err(join_err) = handle.await {
            faults += 1;
            error!("目标 {} 的工作任务异常终止：{}", target, join_err);
            let _ = tx.send(ResultMessage::Outcome(FetchOutcome::Failure {
                target,
                error: RswappyError::WorkerPanic(join_err.to_string()),
            }));
        }
    }

    // 终止标记：唯一一次，严格晚于全部结果
    let _ = tx.send(ResultMessage::Done);

    DispatchReport { submitted, faults }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn drain(mut rx: mpsc::UnboundedReceiver<ResultMessage>) -> Vec<ResultMessage> {
        let mut messages = Vec::new();
        while let Some(m) = rx.recv().await {
            messages.push(m);
        }
        messages
    }

    /// N个目标在任意池宽下都应产出恰好N条结果 + 最后一条Done
    #[tokio::test(flavor = "multi_thread")]
    async fn test_exactly_n_outcomes_then_done() {
        let targets: Vec<String> = (0..7).map(|i| format!("https://t{}.example", i)).collect();

        for workers in [1usize, 2, 7, 32] {
            let (tx, rx) = mpsc::unbounded_channel();
            let report = dispatch_all(targets.clone(), workers, tx, |target| async move {
                FetchOutcome::Success {
                    target,
                    matches: vec![],
                }
            })
            .await;

            let messages = drain(rx).await;
            assert_eq!(report.submitted, 7);
            assert_eq!(report.faults, 0);
            assert_eq!(messages.len(), 8, "workers={}", workers);
            assert!(matches!(messages.last(), Some(ResultMessage::Done)));
            let outcomes = messages
                .iter()
                .filter(|m| matches!(m, ResultMessage::Outcome(_)))
                .count();
            assert_eq!(outcomes, 7, "workers={}", workers);
        }
    }

    /// 重复目标各自独立处理，各产出一条结果
    #[tokio::test(flavor = "multi_thread")]
    async fn test_duplicate_targets_processed_independently() {
        let targets = vec!["https://dup.example".to_string(); 3];
        let (tx, rx) = mpsc::unbounded_channel();

        let report = dispatch_all(targets, 2, tx, |target| async move {
            FetchOutcome::Success {
                target,
                matches: vec![],
            }
        })
        .await;

        let messages = drain(rx).await;
        assert_eq!(report.submitted, 3);
        assert_eq!(messages.len(), 4);
    }

    /// 工作任务panic：该目标降级为Failure，Done仍然到达，池不悬挂
    #[tokio::test(flavor = "multi_thread")]
    async fn test_worker_panic_is_isolated() {
        let targets: Vec<String> = vec![
            "https://ok1.example".to_string(),
            "boom".to_string(),
            "https://ok2.example".to_string(),
        ];
        let (tx, rx) = mpsc::unbounded_channel();

        let report = dispatch_all(targets, 2, tx, |target| async move {
            if target == "boom" {
                panic!("内部故障注入");
            }
            FetchOutcome::Success {
                target,
                matches: vec![],
            }
        })
        .await;

        let messages = drain(rx).await;
        assert_eq!(report.submitted, 3);
        assert_eq!(report.faults, 1);
        // 3条结果 + Done，panic目标以WorkerPanic失败出现
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages.last(), Some(ResultMessage::Done)));

        let panic_failure = messages.iter().any(|m| {
            matches!(
                m,
                ResultMessage::Outcome(FetchOutcome::Failure { target, error: RswappyError::WorkerPanic(_) })
                    if target == "boom"
            )
        });
        assert!(panic_failure);
    }

    /// 空目标流：零结果，仅一条Done
    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_target_stream() {
        let (tx, rx) = mpsc::unbounded_channel();
        let report = dispatch_all(Vec::<String>::new(), 4, tx, |target| async move {
            FetchOutcome::Success {
                target,
                matches: vec![],
            }
        })
        .await;

        let messages = drain(rx).await;
        assert_eq!(report.submitted, 0);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ResultMessage::Done));
    }
}
