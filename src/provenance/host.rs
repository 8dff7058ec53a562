//! Identity of the machine running a local-checkout sync.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use anyhow::{bail, Context, Result};

const HOSTNAME_FILES: &[&str] = &["/proc/sys/kernel/hostname", "/etc/hostname"];
const PASSWD_FILE: &str = "/etc/passwd";

pub fn hostname() -> Result<String> {
    for file in HOSTNAME_FILES {
        if let Some(name) = read_trimmed(Path::new(file)) {
            return Ok(name);
        }
    }
    match std::env::var("HOSTNAME") {
        Ok(name) if !name.trim().is_empty() => Ok(name.trim().to_string()),
        _ => bail!("unable to determine the hostname"),
    }
}

/// Login name of the effective user.
///
/// The passwd entry wins; `USER` and `LOGNAME` are fallbacks for hosts
/// without one.
pub fn username() -> Result<String> {
    let uid = effective_uid()?;
    if let Ok(passwd) = fs::read_to_string(PASSWD_FILE) {
        if let Some(name) = passwd_name_for_uid(&passwd, uid) {
            return Ok(name);
        }
    }

    for var in ["USER", "LOGNAME"] {
        if let Ok(name) = std::env::var(var) {
            if !name.is_empty() {
                return Ok(name);
            }
        }
    }
    bail!("unable to determine the current user name (uid {uid})")
}

/// `/proc/self` is owned by the effective uid of the reading process.
fn effective_uid() -> Result<u32> {
    let meta = fs::metadata("/proc/self").context("reading /proc/self")?;
    Ok(meta.uid())
}

fn passwd_name_for_uid(passwd: &str, uid: u32) -> Option<String> {
    passwd
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let mut fields = line.split(':');
            let name = fields.next()?;
            let entry_uid = fields.nth(1)?.parse::<u32>().ok()?;
            (entry_uid == uid && !name.is_empty()).then(|| name.to_string())
        })
}

fn read_trimmed(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
