use crate::midi::{MidiOut, MidirOut};

pub fn ports(saved: Option<&str>) -> anyhow::Result<()> {
    // ALSA prints diagnostic noise on stderr while ports are enumerated.
    let stderr_guard = suppress_stderr();
    let names = MidirOut::new().list_outputs();
    drop(stderr_guard);

    let names = names?;
    println!("=== MIDI Output Ports ===");
    if names.is_empty() {
        println!("  (none found)");
    }
    for name in &names {
        let marker = if saved == Some(name.as_str()) { " *" } else { "" };
        println!("  {name}{marker}");
    }
    if let Some(saved) = saved
        && !names.iter().any(|n| n == saved)
    {
        println!();
        println!("Saved port '{saved}' is not connected.");
    }
    Ok(())
}

/// List output ports for the UI without letting backend noise reach the
/// terminal. Errors are logged and yield an empty list.
pub fn output_ports(out: &dyn MidiOut) -> Vec<String> {
    let stderr_guard = suppress_stderr();
    let names = out.list_outputs();
    drop(stderr_guard);
    names.unwrap_or_else(|e| {
        log::warn!("Cannot list MIDI outputs: {e}");
        Vec::new()
    })
}

/// Temporarily redirect stderr to /dev/null.
/// Returns a guard that restores stderr on drop. No-op on non-Unix platforms.
#[cfg(unix)]
fn suppress_stderr() -> Option<StderrGuard> {
    use std::os::unix::io::AsRawFd;
    let devnull = std::fs::File::open("/dev/null").ok()?;
    let stderr_fd = std::io::stderr().as_raw_fd();
    let saved = unsafe { libc::dup(stderr_fd) };
    if saved < 0 {
        return None;
    }
    unsafe { libc::dup2(devnull.as_raw_fd(), stderr_fd) };
    Some(StderrGuard { saved_fd: saved })
}

#[cfg(unix)]
struct StderrGuard {
    saved_fd: i32,
}

#[cfg(unix)]
impl Drop for StderrGuard {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        let stderr_fd = std::io::stderr().as_raw_fd();
        unsafe {
            libc::dup2(self.saved_fd, stderr_fd);
            libc::close(self.saved_fd);
        }
    }
}

#[cfg(not(unix))]
fn suppress_stderr() -> Option<()> {
    None
}
