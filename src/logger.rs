use crate::config::version;
use std::io::Write;

/// env_logger setup for hosts running the hooks in a standalone process.
/// Embedded hosts with their own logging skip this; the crate only logs
/// through the `log` facade.
pub fn init() {
    let tag = format!("cwmp-hooks/{}", version());
    env_logger::Builder::from_default_env()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                buf.timestamp(),
                record.level(),
                tag,
                record.args()
            )
        })
        .init();
}
