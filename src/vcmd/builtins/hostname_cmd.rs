use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct HostnameCommand;

#[async_trait]
impl VirtualCommand for HostnameCommand {
    fn name(&self) -> &'static str {
        "hostname"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        if let Some(h) = ctx.env.get("HOSTNAME") {
            let mut out = h.clone();
            out.push('\n');
            return CommandOutcome::Buffered(CommandResult::success(out.into_bytes()));
        }
        let mut out = system_hostname();
        out.push('\n');
        CommandOutcome::Buffered(CommandResult::success(out.into_bytes()))
    }
}

fn system_hostname() -> String {
    let mut buf = vec![0u8; 256];
    // SAFETY: buf is a valid, appropriately-sized writable buffer; gethostname
    // writes a NUL-terminated string into it and returns 0 on success.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return "localhost".to_string();
    }
    let nul = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..nul]).into_owned()
}
