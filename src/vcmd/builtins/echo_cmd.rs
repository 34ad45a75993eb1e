use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct EchoCommand;

#[async_trait]
impl VirtualCommand for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let args = &ctx.args;
        let mut no_newline = false;
        let mut interpret_escapes = false;
        let mut start = 0;

        while start < args.len() {
            match args[start].as_str() {
                "-n" => no_newline = true,
                "-e" => interpret_escapes = true,
                "-E" => interpret_escapes = false,
                "-ne" | "-en" => {
                    no_newline = true;
                    interpret_escapes = true;
                }
                _ => break,
            }
            start += 1;
        }

        let mut output = args[start..].join(" ");
        if interpret_escapes {
            let (processed, stop) = process_escapes(&output);
            output = processed;
            if stop {
                return CommandOutcome::Buffered(CommandResult::success(output.into_bytes()));
            }
        }
        if !no_newline {
            output.push('\n');
        }
        CommandOutcome::Buffered(CommandResult::success(output.into_bytes()))
    }
}

/// `echo -e` escape handling: `\n \t \\ \0NNN \c`. Returns `(output, stop)`
/// where `stop` means `\c` was encountered and the newline should be
/// suppressed regardless of `-n`.
fn process_escapes(input: &str) -> (String, bool) {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            match chars[i + 1] {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' => out.push('\\'),
                'a' => out.push('\x07'),
                'c' => return (out, true),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    (out, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx(args: Vec<&str>) -> CommandContext {
        CommandContext {
            args: args.into_iter().map(String::from).collect(),
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: "/".into(),
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn echoes_words_joined_with_space() {
        let out = EchoCommand.execute(ctx(vec!["hello", "world"])).await;
        match out {
            CommandOutcome::Buffered(r) => assert_eq!(r.stdout, b"hello world\n"),
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn dash_n_suppresses_trailing_newline() {
        let out = EchoCommand.execute(ctx(vec!["-n", "hi"])).await;
        match out {
            CommandOutcome::Buffered(r) => assert_eq!(r.stdout, b"hi"),
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn dash_e_interprets_escapes() {
        let out = EchoCommand.execute(ctx(vec!["-e", r"a\tb"])).await;
        match out {
            CommandOutcome::Buffered(r) => assert_eq!(r.stdout, b"a\tb\n"),
            _ => panic!(),
        }
    }
}
