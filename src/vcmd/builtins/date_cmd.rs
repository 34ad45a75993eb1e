use async_trait::async_trait;
use chrono::{Local, Utc};
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct DateCommand;

#[async_trait]
impl VirtualCommand for DateCommand {
    fn name(&self) -> &'static str {
        "date"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut utc = false;
        let mut format: Option<String> = None;
        for arg in &ctx.args {
            if arg == "-u" || arg == "--utc" || arg == "--universal" {
                utc = true;
            } else if let Some(fmt) = arg.strip_prefix('+') {
                format = Some(fmt.to_string());
            }
        }

        let rendered = match (utc, &format) {
            (true, Some(fmt)) => Utc::now().format(&translate_format(fmt)).to_string(),
            (false, Some(fmt)) => Local::now().format(&translate_format(fmt)).to_string(),
            (true, None) => Utc::now().format("%a %b %e %H:%M:%S UTC %Y").to_string(),
            (false, None) => Local::now().format("%a %b %e %H:%M:%S %Z %Y").to_string(),
        };

        let mut out = rendered;
        out.push('\n');
        CommandOutcome::Buffered(CommandResult::success(out.into_bytes()))
    }
}

/// `date`'s `+FORMAT` already uses `strftime`-compatible `%` directives, the
/// same ones `chrono::format::strftime` accepts, so no translation is
/// needed beyond passing the string through — kept as a named function so a
/// future GNU-specific directive (`%N`, nanoseconds) has a place to land.
fn translate_format(fmt: &str) -> String {
    fmt.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn custom_format_is_applied() {
        let ctx = CommandContext {
            args: vec!["-u".to_string(), "+%Y".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match DateCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                let text = String::from_utf8(r.stdout).unwrap();
                assert_eq!(text.trim().len(), 4);
                assert!(text.trim().chars().all(|c| c.is_ascii_digit()));
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn default_output_is_nonempty() {
        let ctx = CommandContext { args: vec![], stdin: StdinInput::Bytes(Vec::new()), cwd: "/".into(), env: HashMap::new() };
        match DateCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert!(!r.stdout.is_empty()),
            _ => panic!(),
        }
    }
}
