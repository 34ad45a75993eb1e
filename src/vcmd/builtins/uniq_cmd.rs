use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct UniqCommand;

#[async_trait]
impl VirtualCommand for UniqCommand {
    fn name(&self) -> &'static str {
        "uniq"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut count = false;
        let mut files: Vec<&str> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-c" | "--count" => count = true,
                _ if !arg.starts_with('-') => files.push(arg),
                _ => {}
            }
        }

        let input = if let Some(file) = files.first() {
            let path = ctx.cwd.join(file);
            match tokio::fs::read(&path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => {
                    return CommandOutcome::Buffered(CommandResult::error(
                        format!("uniq: {file}: No such file or directory\n"),
                        1,
                    ))
                }
            }
        } else {
            String::from_utf8_lossy(&ctx.stdin.collect().await).into_owned()
        };

        let mut out = String::new();
        let mut prev: Option<&str> = None;
        let mut run = 0usize;
        for line in input.lines() {
            match prev {
                Some(p) if p == line => run += 1,
                Some(p) => {
                    push_line(&mut out, p, run, count);
                    prev = Some(line);
                    run = 1;
                }
                None => {
                    prev = Some(line);
                    run = 1;
                }
            }
        }
        if let Some(p) = prev {
            push_line(&mut out, p, run, count);
        }

        CommandOutcome::Buffered(CommandResult::success(out.into_bytes()))
    }
}

fn push_line(out: &mut String, line: &str, run: usize, count: bool) {
    if count {
        out.push_str(&format!("{run:>7} {line}\n"));
    } else {
        out.push_str(line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx(stdin: &str, args: Vec<&str>) -> CommandContext {
        CommandContext {
            args: args.into_iter().map(String::from).collect(),
            stdin: StdinInput::Bytes(stdin.as_bytes().to_vec()),
            cwd: "/".into(),
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn collapses_adjacent_duplicates() {
        match UniqCommand.execute(ctx("a\na\nb\na\n", vec![])).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "a\nb\na\n");
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn dash_c_prefixes_counts() {
        match UniqCommand.execute(ctx("a\na\nb\n", vec!["-c"])).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "      2 a\n      1 b\n");
            }
            _ => panic!(),
        }
    }
}
