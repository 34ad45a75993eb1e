//! One module per built-in, the way the teacher lays out
//! `commands/<name>/mod.rs`. [`register_all`] is the single place that
//! knows the full built-in set.

mod cat_cmd;
mod cd_cmd;
mod date_cmd;
mod echo_cmd;
mod exit_cmd;
mod false_cmd;
mod grep_cmd;
mod head_cmd;
mod hostname_cmd;
mod ls_cmd;
mod mkdir_cmd;
mod printf_cmd;
mod pwd_cmd;
mod rm_cmd;
mod sleep_cmd;
mod sort_cmd;
mod tail_cmd;
mod touch_cmd;
mod true_cmd;
mod uniq_cmd;
mod wc_cmd;
mod whoami_cmd;
mod yes_cmd;

use super::VirtualRegistry;
use std::sync::Arc;

pub fn register_all(reg: &mut VirtualRegistry) {
    reg.register(Arc::new(cd_cmd::CdCommand));
    reg.register(Arc::new(echo_cmd::EchoCommand));
    reg.register(Arc::new(cat_cmd::CatCommand));
    reg.register(Arc::new(ls_cmd::LsCommand));
    reg.register(Arc::new(mkdir_cmd::MkdirCommand));
    reg.register(Arc::new(touch_cmd::TouchCommand));
    reg.register(Arc::new(rm_cmd::RmCommand));
    reg.register(Arc::new(pwd_cmd::PwdCommand));
    reg.register(Arc::new(sleep_cmd::SleepCommand));
    reg.register(Arc::new(yes_cmd::YesCommand));
    reg.register(Arc::new(head_cmd::HeadCommand));
    reg.register(Arc::new(tail_cmd::TailCommand));
    reg.register(Arc::new(sort_cmd::SortCommand));
    reg.register(Arc::new(uniq_cmd::UniqCommand));
    reg.register(Arc::new(wc_cmd::WcCommand));
    reg.register(Arc::new(grep_cmd::GrepCommand));
    reg.register(Arc::new(true_cmd::TrueCommand));
    reg.register(Arc::new(false_cmd::FalseCommand));
    reg.register(Arc::new(exit_cmd::ExitCommand));
    reg.register(Arc::new(hostname_cmd::HostnameCommand));
    reg.register(Arc::new(whoami_cmd::WhoamiCommand));
    reg.register(Arc::new(date_cmd::DateCommand));
    reg.register(Arc::new(printf_cmd::PrintfCommand));
}
