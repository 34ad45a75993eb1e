use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct PwdCommand;

#[async_trait]
impl VirtualCommand for PwdCommand {
    fn name(&self) -> &'static str {
        "pwd"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut out = ctx.cwd.to_string_lossy().into_owned();
        out.push('\n');
        CommandOutcome::Buffered(CommandResult::success(out.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn prints_cwd() {
        let ctx = CommandContext {
            args: vec![],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: "/tmp/work".into(),
            env: HashMap::new(),
        };
        match PwdCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.stdout, b"/tmp/work\n"),
            _ => panic!(),
        }
    }
}
