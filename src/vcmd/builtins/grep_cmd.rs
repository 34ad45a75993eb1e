use async_trait::async_trait;
use regex_lite::RegexBuilder;

use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct GrepCommand;

#[derive(Default)]
struct GrepOptions {
    pattern: String,
    ignore_case: bool,
    invert_match: bool,
    count_only: bool,
    line_number: bool,
    files: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<GrepOptions, String> {
    let mut opts = GrepOptions::default();
    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-i" | "--ignore-case" => opts.ignore_case = true,
            "-v" | "--invert-match" => opts.invert_match = true,
            "-c" | "--count" => opts.count_only = true,
            "-n" | "--line-number" => opts.line_number = true,
            "-e" if i + 1 < args.len() => {
                i += 1;
                opts.pattern = args[i].clone();
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }
    if opts.pattern.is_empty() {
        if positional.is_empty() {
            return Err("grep: missing pattern\n".to_string());
        }
        opts.pattern = positional.remove(0);
    }
    opts.files = positional;
    Ok(opts)
}

#[async_trait]
impl VirtualCommand for GrepCommand {
    fn name(&self) -> &'static str {
        "grep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let opts = match parse_args(&ctx.args) {
            Ok(o) => o,
            Err(msg) => return CommandOutcome::Buffered(CommandResult::error(msg, 2)),
        };
        let regex = match RegexBuilder::new(&opts.pattern).case_insensitive(opts.ignore_case).build() {
            Ok(r) => r,
            Err(e) => {
                return CommandOutcome::Buffered(CommandResult::error(
                    format!("grep: invalid pattern: {e}\n"),
                    2,
                ))
            }
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 1; // no match yet
        let multiple_files = opts.files.len() > 1;

        let sources: Vec<(String, Option<String>)> = if opts.files.is_empty() {
            vec![(String::new(), Some(String::from_utf8_lossy(&ctx.stdin.collect().await).into_owned()))]
        } else {
            opts.files.iter().map(|f| (f.clone(), None)).collect()
        };

        for (name, inline) in sources {
            let content = if let Some(c) = inline {
                c
            } else {
                let path = ctx.cwd.join(&name);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(_) => {
                        stderr.push_str(&format!("grep: {name}: No such file or directory\n"));
                        continue;
                    }
                }
            };

            let mut matches = 0usize;
            for (idx, line) in content.lines().enumerate() {
                let hit = regex.is_match(line);
                if hit != opts.invert_match {
                    matches += 1;
                    if !opts.count_only {
                        if multiple_files {
                            stdout.push_str(&name);
                            stdout.push(':');
                        }
                        if opts.line_number {
                            stdout.push_str(&(idx + 1).to_string());
                            stdout.push(':');
                        }
                        stdout.push_str(line);
                        stdout.push('\n');
                    }
                }
            }
            if opts.count_only {
                if multiple_files {
                    stdout.push_str(&format!("{name}:{matches}\n"));
                } else {
                    stdout.push_str(&format!("{matches}\n"));
                }
            }
            if matches > 0 {
                exit_code = 0;
            }
        }

        CommandOutcome::Buffered(CommandResult {
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
            exit_code,
            cwd_override: None,
        })
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
    async fn matches_lines_containing_pattern() {
        match GrepCommand.execute(ctx("foo\nbar\nfoobar\n", vec!["foo"])).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "foo\nfoobar\n");
                assert_eq!(r.exit_code, 0);
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn no_match_is_exit_code_one() {
        match GrepCommand.execute(ctx("bar\n", vec!["zzz"])).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 1),
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn invert_match_flips_selection() {
        match GrepCommand.execute(ctx("foo\nbar\n", vec!["-v", "foo"])).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "bar\n");
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn missing_pattern_errors() {
        match GrepCommand.execute(ctx("", vec![])).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 2),
            _ => panic!(),
        }
    }
}
