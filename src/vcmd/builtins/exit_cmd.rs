use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

/// Unlike a real process's `exit`, this cannot terminate the host program —
/// it reports the requested code and the interpreter, seeing it, ends the
/// enclosing sequence early exactly as it would for a real process with
/// that exit status (no separate "exit requested" signal needed).
pub struct ExitCommand;

#[async_trait]
impl VirtualCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let code = ctx.args.first().and_then(|a| a.parse::<i32>().ok()).unwrap_or(0);
        CommandOutcome::Buffered(CommandResult { exit_code: code, ..CommandResult::ok_empty() })
    }
}
