//! System interaction layer: account discovery and sudoers drop-in management.
//!
//! Everything that touches the filesystem or spawns a process lives here,
//! behind the [`SudoersOps`] trait so the application state machine can be
//! driven in tests without a real `/etc`.
use crate::error::{Context, Result, simple_error};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Basename prefix marking drop-in files managed by this tool.
pub const GRANT_PREFIX: &str = "nopasswd_";
/// Permission mode for grant files; sudo refuses world-writable drop-ins.
pub const GRANT_MODE: u32 = 0o440;

const SUDOERS_DIR: &str = "/etc/sudoers.d";
const PASSWD_PATH: &str = "/etc/passwd";
const HOME_PREFIX: &str = "/home/";
const VALIDATOR: &str = "visudo";

/// Operations the navigation state machine needs from the system.
pub trait SudoersOps {
    /// Effective-root check, evaluated live on every call.
    fn is_root(&self) -> bool;
    /// Usernames whose registered home directory sits under the home root.
    /// An unreadable registry yields an empty list, not an error.
    fn list_users(&self) -> Vec<String>;
    /// Grant files under the sudoers drop-in directory, recursively.
    /// Per-entry traversal errors are skipped and traversal continues;
    /// a missing directory yields an empty list.
    fn list_grant_files(&self) -> Vec<PathBuf>;
    /// Write a NOPASSWD grant for `username`, validate it, roll back on failure.
    fn grant(&self, username: &str) -> Result<()>;
    /// Delete a previously listed grant file.
    fn remove_grant(&self, path: &Path) -> Result<()>;
}

pub struct SudoersAdapter {
    pub passwd_path: PathBuf,
    pub sudoers_dir: PathBuf,
    pub home_prefix: String,
    pub validator: String,
}

impl SudoersAdapter {
    pub fn new() -> Self {
        Self::with_sudoers_dir(SUDOERS_DIR)
    }

    pub fn with_sudoers_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            passwd_path: PathBuf::from(PASSWD_PATH),
            sudoers_dir: dir.into(),
            home_prefix: HOME_PREFIX.to_string(),
            validator: VALIDATOR.to_string(),
        }
    }

    /// Deterministic target path for a username's grant file. Granting the
    /// same username twice overwrites the same file.
    pub fn grant_path(&self, username: &str) -> PathBuf {
        self.sudoers_dir.join(format!("{GRANT_PREFIX}{username}"))
    }

    /// Run the external validator in check-only mode against `path`.
    /// Exit status 0 means the fragment is syntactically valid.
    fn check_syntax(&self, path: &Path) -> Result<bool> {
        let status = Command::new(&self.validator)
            .arg("-c")
            .arg("-f")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_ctx(|| format!("failed to execute {} -c -f {}", self.validator, path.display()))?;
        Ok(status.success())
    }
}

impl Default for SudoersAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SudoersOps for SudoersAdapter {
    fn is_root(&self) -> bool {
        users::get_effective_uid() == 0
    }

    fn list_users(&self) -> Vec<String> {
        match parse_accounts(&self.passwd_path, &self.home_prefix) {
            Ok(users) => {
                debug!(count = users.len(), "listed home-owning accounts");
                users
            }
            Err(e) => {
                warn!("account registry unreadable: {e}");
                Vec::new()
            }
        }
    }

    fn list_grant_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_grant_files(&self.sudoers_dir, &mut files);
        debug!(count = files.len(), "listed grant files");
        files
    }

    fn grant(&self, username: &str) -> Result<()> {
        let path = self.grant_path(username);
        let line = format!("{username} ALL=(ALL) NOPASSWD: ALL\n");

        // A previous grant for the same username sits at the same path with
        // read-only mode; clear it so the rewrite goes through.
        fs::remove_file(&path).ok();
        fs::write(&path, line).with_ctx(|| format!("write {}", path.display()))?;
        // From here on a file exists; every failure path must remove it so
        // an unvalidated grant never persists.
        let validated = fs::set_permissions(&path, fs::Permissions::from_mode(GRANT_MODE))
            .with_ctx(|| format!("chmod {:o} {}", GRANT_MODE, path.display()))
            .and_then(|_| self.check_syntax(&path));
        match validated {
            Ok(true) => {
                info!(user = username, path = %path.display(), "granted passwordless sudo");
                Ok(())
            }
            Ok(false) => {
                fs::remove_file(&path).ok();
                warn!(user = username, "validator rejected grant file, rolled back");
                Err(simple_error("syntax error in sudoers file, file removed"))
            }
            Err(e) => {
                fs::remove_file(&path).ok();
                warn!(user = username, "grant validation aborted, rolled back: {e}");
                Err(e)
            }
        }
    }

    fn remove_grant(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_ctx(|| format!("remove {}", path.display()))?;
        info!(path = %path.display(), "removed grant file");
        Ok(())
    }
}

/// Parse a passwd-format registry: colon-delimited, field 0 the username,
/// field 5 the home directory. Records with fewer than 6 fields are skipped
/// by definition, mirroring the registry's tolerance for short lines.
/// Registry content is otherwise mirrored verbatim: order is preserved,
/// duplicates are not collapsed, and no comment syntax is assumed.
fn parse_accounts<P: AsRef<Path>>(path: P, home_prefix: &str) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    let mut accounts = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 6 {
            continue;
        }
        if parts[5].starts_with(home_prefix) {
            accounts.push(parts[0].to_string());
        }
    }
    Ok(accounts)
}

/// Recursive walk collecting regular files whose basename carries the
/// managed-grant prefix. Unreadable directories or entries are skipped and
/// the walk continues; this partial-failure tolerance is part of the
/// listing contract. Entries are visited in sorted order per directory so
/// listings are deterministic.
fn collect_grant_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), "skipping unreadable directory: {e}");
            return;
        }
    };
    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => collect_grant_files(&path, out),
            Ok(ft) if ft.is_file() => {
                let managed = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(GRANT_PREFIX));
                if managed {
                    out.push(path);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_path(tag: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        let n = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        p.push(format!("nsp_{tag}_{}_{}", std::process::id(), n));
        p
    }

    #[test]
    fn parse_accounts_filters_on_home_prefix() {
        let path = tmp_path("passwd");
        let data = "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
alice:x:1000:1000::/home/alice:/bin/bash
bob:x:1001:1001:Bob:/home/bob:/bin/zsh
";
        fs::write(&path, data).unwrap();

        let accounts = parse_accounts(&path, "/home/").unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(accounts, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn parse_accounts_skips_short_records() {
        let path = tmp_path("passwd_short");
        let data = "\
broken:x:1000
alice:x:1000:1000::/home/alice:/bin/bash

also:bad
";
        fs::write(&path, data).unwrap();

        let accounts = parse_accounts(&path, "/home/").unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(accounts, vec!["alice".to_string()]);
    }

    #[test]
    fn parse_accounts_keeps_registry_order_and_duplicates() {
        let path = tmp_path("passwd_dup");
        let data = "\
zoe:x:1002:1002::/home/zoe:/bin/bash
alice:x:1000:1000::/home/alice:/bin/bash
zoe:x:1002:1002::/home/zoe:/bin/bash
";
        fs::write(&path, data).unwrap();

        let accounts = parse_accounts(&path, "/home/").unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(
            accounts,
            vec!["zoe".to_string(), "alice".to_string(), "zoe".to_string()]
        );
    }

    #[test]
    fn parse_accounts_assumes_no_comment_syntax() {
        // passwd has no comments; a leading '#' is part of the username
        let path = tmp_path("passwd_hash");
        let data = "\
#odd:x:1000:1000::/home/#odd:/bin/bash
alice:x:1001:1001::/home/alice:/bin/bash
";
        fs::write(&path, data).unwrap();

        let accounts = parse_accounts(&path, "/home/").unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(accounts, vec!["#odd".to_string(), "alice".to_string()]);
    }

    #[test]
    fn collect_skips_unprefixed_and_recurses() {
        let root = tmp_path("sudoers");
        let sub = root.join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(root.join("nopasswd_alice"), "x").unwrap();
        fs::write(root.join("other_rule"), "x").unwrap();
        fs::write(sub.join("nopasswd_bob"), "x").unwrap();

        let mut files = Vec::new();
        collect_grant_files(&root, &mut files);
        fs::remove_dir_all(&root).ok();

        assert_eq!(files.len(), 2);
        assert!(files.contains(&root.join("nopasswd_alice")));
        assert!(files.contains(&sub.join("nopasswd_bob")));
    }

    #[test]
    fn collect_missing_root_yields_empty() {
        let root = tmp_path("sudoers_missing");
        let mut files = Vec::new();
        collect_grant_files(&root, &mut files);
        assert!(files.is_empty());
    }
}
