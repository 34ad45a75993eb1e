use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct FalseCommand;

#[async_trait]
impl VirtualCommand for FalseCommand {
    fn name(&self) -> &'static str {
        "false"
    }

    async fn execute(&self, _ctx: CommandContext) -> CommandOutcome {
        CommandOutcome::Buffered(CommandResult { exit_code: 1, ..CommandResult::ok_empty() })
    }
}
