use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct HeadCommand;

#[async_trait]
impl VirtualCommand for HeadCommand {
    fn name(&self) -> &'static str {
        "head"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        // `head` can be satisfied by a prefix of its input, so an unbounded
        // upstream (`yes`) gets cut loose as soon as enough lines arrive
        // instead of forcing the whole, infinite stream to be buffered first.
        run_head_tail(ctx, "head", true, |lines, n| {
            lines.iter().take(n).map(|s| s.to_string()).collect()
        })
        .await
    }
}

/// Shared driver for `head`/`tail`: parse `-n NUM`/`-nNUM`, read named files
/// or stdin, and apply `select` to each file's lines independently.
/// `bounded` picks the stdin-materialization strategy: `head` only needs the
/// first `n` lines (`collect_lines`, which lets it stop early), `tail` needs
/// to see the whole input to know what the last `n` lines are (`collect`).
pub(super) async fn run_head_tail(
    mut ctx: CommandContext,
    prog: &str,
    bounded: bool,
    select: impl Fn(&[&str], usize) -> Vec<String>,
) -> CommandOutcome {
    let mut n = 10usize;
    let mut files: Vec<&str> = Vec::new();
    let mut args = ctx.args.iter().peekable();
    while let Some(arg) = args.next() {
        if arg == "-n" {
            if let Some(v) = args.next() {
                n = v.parse().unwrap_or(10);
            }
        } else if let Some(rest) = arg.strip_prefix("-n") {
            n = rest.parse().unwrap_or(10);
        } else if !arg.starts_with('-') {
            files.push(arg);
        }
    }
    if files.is_empty() {
        files.push("-");
    }

    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;
    let multiple = files.len() > 1;
    let mut stdin = Some(std::mem::replace(&mut ctx.stdin, StdinInput::empty()));

    for (i, file) in files.iter().enumerate() {
        let content = if *file == "-" {
            let taken = stdin.take().unwrap_or_else(StdinInput::empty);
            let bytes = if bounded { taken.collect_lines(n).await } else { taken.collect().await };
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            let path = ctx.cwd.join(file);
            match tokio::fs::read(&path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => {
                    stderr.push_str(&format!("{prog}: {file}: No such file or directory\n"));
                    exit_code = 1;
                    continue;
                }
            }
        };
        let lines: Vec<&str> = content.lines().collect();
        let chosen = select(&lines, n);
        if multiple {
            stdout.push_str(&format!("==> {file} <==\n"));
        }
        for line in chosen {
            stdout.push_str(&line);
            stdout.push('\n');
        }
        if multiple && i + 1 < files.len() {
            stdout.push('\n');
        }
    }

    CommandOutcome::Buffered(CommandResult {
        stdout: stdout.into_bytes(),
        stderr: stderr.into_bytes(),
        exit_code,
        cwd_override: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn head_default_is_ten_lines() {
        let content: String = (1..=15).map(|i| format!("line{i}\n")).collect();
        let ctx = CommandContext {
            args: vec![],
            stdin: StdinInput::Bytes(content.into_bytes()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match HeadCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                let text = String::from_utf8(r.stdout).unwrap();
                assert_eq!(text.lines().count(), 10);
                assert!(text.starts_with("line1\n"));
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn head_dash_n_overrides_count() {
        let content: String = (1..=5).map(|i| format!("l{i}\n")).collect();
        let ctx = CommandContext {
            args: vec!["-n".to_string(), "2".to_string()],
            stdin: StdinInput::Bytes(content.into_bytes()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match HeadCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "l1\nl2\n");
            }
            _ => panic!(),
        }
    }
}
