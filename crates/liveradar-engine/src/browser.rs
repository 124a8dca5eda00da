//! Opening the radar page in the user's browser.

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

/// The platform command that opens `url` in the default browser.
pub fn browser_command(url: &str) -> Command {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("rundll32");
        c.args(["url.dll,FileProtocolHandler", url]);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

/// Start `command` and reap it on a background thread.
///
/// The returned handle yields the child's exit status. Nothing has to
/// join it: the thread exits on its own once the child does.
pub fn launch(mut command: Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = command.spawn()?;
    thread::Builder::new()
        .name(String::from("browser"))
        .spawn(move || {
            let status = child.wait()?;
            if !status.success() {
                warn!(%status, "Browser launcher exited with an error");
            }
            Ok(status)
        })
}

/// Launch the browser without waiting for it. Failure only warns.
pub fn open_browser(url: &str) {
    match launch(browser_command(url)) {
        Ok(_) => info!(url, "Opened radar in browser"),
        Err(e) => warn!(url, error = %e, "Could not open browser automatically"),
    }
}
