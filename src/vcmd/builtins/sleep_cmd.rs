use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::vcmd::{ChunkSource, CommandContext, StdinInput, CommandOutcome, VirtualCommand};

pub struct SleepCommand;

#[async_trait]
impl VirtualCommand for SleepCommand {
    fn name(&self) -> &'static str {
        "sleep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let secs: f64 = ctx.args.first().and_then(|a| a.parse().ok()).unwrap_or(0.0);
        CommandOutcome::Streaming(Box::new(SleepSource {
            deadline: Instant::now() + Duration::from_secs_f64(secs.max(0.0)),
            done: false,
        }))
    }
}

/// Produces no bytes; exists solely to let the runner drive completion
/// through the same cancellation-aware pull loop `yes` uses (spec.md §5).
struct SleepSource {
    deadline: Instant,
    done: bool,
}

#[async_trait]
impl ChunkSource for SleepSource {
    async fn next_chunk(&mut self, cancel: &CancellationToken) -> Option<Vec<u8>> {
        if self.done {
            return None;
        }
        self.done = true;
        tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => {}
            _ = cancel.cancelled() => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn sleep_zero_completes_immediately() {
        let ctx = CommandContext {
            args: vec!["0".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match SleepCommand.execute(ctx).await {
            CommandOutcome::Streaming(mut src) => {
                let cancel = CancellationToken::new();
                assert!(tokio::time::timeout(Duration::from_millis(200), src.next_chunk(&cancel))
                    .await
                    .is_ok());
            }
            _ => panic!("expected streaming outcome"),
        }
    }

    #[tokio::test]
    async fn cancellation_short_circuits_sleep() {
        let ctx = CommandContext {
            args: vec!["60".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match SleepCommand.execute(ctx).await {
            CommandOutcome::Streaming(mut src) => {
                let cancel = CancellationToken::new();
                cancel.cancel();
                let result = tokio::time::timeout(Duration::from_millis(200), src.next_chunk(&cancel)).await;
                assert!(result.is_ok());
            }
            _ => panic!("expected streaming outcome"),
        }
    }
}
