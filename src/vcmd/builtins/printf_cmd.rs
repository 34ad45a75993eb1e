use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct PrintfCommand;

#[async_trait]
impl VirtualCommand for PrintfCommand {
    fn name(&self) -> &'static str {
        "printf"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        if ctx.args.is_empty() {
            return CommandOutcome::Buffered(CommandResult::error(
                "printf: usage: printf format [arguments]\n",
                2,
            ));
        }
        let format = &ctx.args[0];
        let arguments: Vec<&str> = ctx.args[1..].iter().map(String::as_str).collect();
        let output = render(format, &arguments);
        CommandOutcome::Buffered(CommandResult::success(output.into_bytes()))
    }
}

/// Applies `format` once per full pass over `arguments`, the way GNU
/// `printf` repeats the format to consume all arguments; with no arguments
/// the format is applied exactly once (conversions read an empty string).
fn render(format: &str, arguments: &[&str]) -> String {
    let mut out = String::new();
    let mut arg_idx = 0;
    loop {
        let before = arg_idx;
        out.push_str(&render_once(format, arguments, &mut arg_idx));
        if arg_idx >= arguments.len() || arg_idx == before {
            break;
        }
    }
    out
}

fn render_once(format: &str, arguments: &[&str], arg_idx: &mut usize) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                match chars[i + 1] {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '\\' => out.push('\\'),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
                i += 2;
            }
            '%' if i + 1 < chars.len() && chars[i + 1] == '%' => {
                out.push('%');
                i += 2;
            }
            '%' if i + 1 < chars.len() => {
                let spec = chars[i + 1];
                let next_arg = arguments.get(*arg_idx).copied().unwrap_or("");
                match spec {
                    's' => out.push_str(next_arg),
                    'd' | 'i' => out.push_str(&next_arg.parse::<i64>().unwrap_or(0).to_string()),
                    'f' => out.push_str(&format!("{:.6}", next_arg.parse::<f64>().unwrap_or(0.0))),
                    'c' => out.push(next_arg.chars().next().unwrap_or('\0')),
                    other => {
                        out.push('%');
                        out.push(other);
                    }
                }
                *arg_idx += 1;
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn substitutes_string_and_integer() {
        let ctx = CommandContext {
            args: vec!["%s is %d\n".to_string(), "answer".to_string(), "42".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match PrintfCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "answer is 42\n");
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn repeats_format_over_extra_arguments() {
        let ctx = CommandContext {
            args: vec!["%s\n".to_string(), "a".to_string(), "b".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match PrintfCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "a\nb\n");
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn missing_format_errors() {
        let ctx = CommandContext { args: vec![], stdin: StdinInput::Bytes(Vec::new()), cwd: "/".into(), env: HashMap::new() };
        match PrintfCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 2),
            _ => panic!(),
        }
    }
}
