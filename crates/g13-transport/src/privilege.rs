//! Dropping root privileges once the device is open.
//!
//! Opening the raw device usually needs root. Everything after that runs
//! as the invoking user (from `SUDO_USER`) or `nobody`. A process that
//! cannot shed root refuses to continue.

#![expect(unsafe_code, reason = "libc identity calls have no safe wrapper in std")]

use std::ffi::{CStr, CString};

use g13_errors::DeviceError;
use tracing::{debug, info};

/// Startup step that sheds elevated privileges.
pub trait PrivilegeDrop {
    fn drop_privileges(&mut self) -> Result<(), DeviceError>;
}

/// Drops privileges of the running process via libc.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPrivileges;

impl PrivilegeDrop for SystemPrivileges {
    fn drop_privileges(&mut self) -> Result<(), DeviceError> {
        drop_root_privileges(std::env::var("SUDO_USER").ok())
    }
}

const FALLBACK_USER: &str = "nobody";
const PASSWD_BUFFER_LEN: usize = 4096;

/// Pick the account to switch to.
pub fn target_user(sudo_user: Option<String>) -> String {
    sudo_user
        .filter(|user| !user.is_empty() && user != "root")
        .unwrap_or_else(|| FALLBACK_USER.to_string())
}

/// Switch to `sudo_user` (or `nobody`) if running as root.
pub fn drop_root_privileges(sudo_user: Option<String>) -> Result<(), DeviceError> {
    // SAFETY: geteuid takes no arguments and cannot fail.
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        debug!(euid, "Not running as root, nothing to drop");
        return Ok(());
    }

    let user = target_user(sudo_user);
    let (uid, gid) = lookup_user(&user)?;

    // SAFETY: `gid` outlives the call and the length is exactly one entry.
    if unsafe { libc::setgroups(1, &gid) } != 0 {
        return Err(last_os_error("setgroups"));
    }
    // SAFETY: setgid takes a plain integer.
    if unsafe { libc::setgid(gid) } != 0 {
        return Err(last_os_error("setgid"));
    }
    // SAFETY: setuid takes a plain integer.
    if unsafe { libc::setuid(uid) } != 0 {
        return Err(last_os_error("setuid"));
    }

    verify_unprivileged()?;
    info!(user = %user, uid, gid, "Dropped root privileges");
    Ok(())
}

fn lookup_user(user: &str) -> Result<(libc::uid_t, libc::gid_t), DeviceError> {
    let name = CString::new(user)
        .map_err(|e| DeviceError::privilege(format!("invalid user name {user:?}: {e}")))?;

    // SAFETY: passwd is a plain C struct of integers and pointers; all-zero is
    // a valid (empty) value that getpwnam_r overwrites.
    let mut entry: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buffer: Vec<libc::c_char> = vec![0; PASSWD_BUFFER_LEN];
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    // SAFETY: every pointer refers to a live local, and `buffer.len()` is the
    // true capacity of `buffer`.
    let rc = unsafe {
        libc::getpwnam_r(
            name.as_ptr(),
            &mut entry,
            buffer.as_mut_ptr(),
            buffer.len(),
            &mut result,
        )
    };
    if rc != 0 {
        return Err(DeviceError::privilege(format!(
            "getpwnam_r({user}) failed: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }
    if result.is_null() {
        return Err(DeviceError::privilege(format!("no such user: {user}")));
    }

    if !entry.pw_name.is_null() {
        // SAFETY: pw_name points into `buffer`, NUL-terminated by getpwnam_r.
        let resolved = unsafe { CStr::from_ptr(entry.pw_name) };
        debug!(user = %resolved.to_string_lossy(), uid = entry.pw_uid, "Resolved target user");
    }

    Ok((entry.pw_uid, entry.pw_gid))
}

fn verify_unprivileged() -> Result<(), DeviceError> {
    // SAFETY: getuid/geteuid take no arguments and cannot fail.
    let uid = unsafe { libc::getuid() };
    // SAFETY: as above.
    let euid = unsafe { libc::geteuid() };
    if uid == 0 || euid == 0 {
        return Err(DeviceError::privilege(format!(
            "still root after setuid (uid={uid}, euid={euid})"
        )));
    }
    // SAFETY: setuid takes a plain integer; success here means root is
    // still reachable.
    if unsafe { libc::setuid(0) } == 0 {
        return Err(DeviceError::privilege("root could be regained after drop"));
    }
    Ok(())
}

fn last_os_error(call: &str) -> DeviceError {
    DeviceError::privilege(format!("{call} failed: {}", std::io::Error::last_os_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_user_prefers_sudo_user() {
        assert_eq!(target_user(Some("alice".into())), "alice");
    }

    #[test]
    fn test_target_user_falls_back_to_nobody() {
        assert_eq!(target_user(None), "nobody");
        assert_eq!(target_user(Some(String::new())), "nobody");
        assert_eq!(target_user(Some("root".into())), "nobody");
    }

    #[test]
    fn test_unprivileged_process_is_left_alone() {
        // SAFETY: geteuid takes no arguments and cannot fail.
        let euid = unsafe { libc::geteuid() };
        if euid != 0 {
            assert!(drop_root_privileges(None).is_ok());
        }
    }

    #[test]
    fn test_lookup_unknown_user_fails() {
        let result = lookup_user("g13-no-such-user-xyz");
        assert!(matches!(result, Err(DeviceError::PrivilegeDropFailed(_))));
    }

    #[test]
    fn test_lookup_rejects_interior_nul() {
        assert!(lookup_user("bad\0name").is_err());
    }
}
