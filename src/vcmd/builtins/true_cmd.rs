use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct TrueCommand;

#[async_trait]
impl VirtualCommand for TrueCommand {
    fn name(&self) -> &'static str {
        "true"
    }

    async fn execute(&self, _ctx: CommandContext) -> CommandOutcome {
        CommandOutcome::Buffered(CommandResult::ok_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn always_exits_zero() {
        let ctx = CommandContext { args: vec![], stdin: StdinInput::Bytes(Vec::new()), cwd: "/".into(), env: HashMap::new() };
        match TrueCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 0),
            _ => panic!(),
        }
    }
}
