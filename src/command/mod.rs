//! Parser for ssh/scp-style exec strings
//!
//! Turning a raw transport command line into host candidates is inherently
//! heuristic, so it lives in one small parser with documented edge cases
//! instead of ad hoc splitting at the call sites.
//!
//! Edge cases:
//! - copy-style: a side only yields a host when splitting on `@` gives
//!   exactly user and host; a bare path (`./file.txt`) or a token with
//!   multiple `@` yields none
//! - shell-style: the text after the last `@` is the host, so a bare
//!   `hostname` token is itself the host
//! - a `:remote/path` suffix is stripped before the `@` split

use crate::error::{GateError, GateResult};

/// Host/user components extracted from a raw transport command line.
///
/// Exactly one of source/dest host is expected to resolve to the session
/// target; candidates are tried destination first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionSpec {
    pub source_user: Option<String>,
    pub source_host: Option<String>,
    pub dest_user: Option<String>,
    pub dest_host: Option<String>,
}

impl ConnectionSpec {
    /// Parse a copy-style (scp) command line.
    ///
    /// The last whitespace token is the destination; the remainder is
    /// re-joined and its own last token taken as the effective source path.
    pub fn parse_copy(raw: &str) -> GateResult<Self> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(GateError::InvalidCommand(raw.trim().to_string()));
        }

        let dest = tokens[tokens.len() - 1];
        let source = tokens[..tokens.len() - 1]
            .join(" ")
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string();

        let (dest_user, dest_host) = split_user_host(dest);
        let (source_user, source_host) = split_user_host(&source);

        Ok(Self {
            source_user,
            source_host,
            dest_user,
            dest_host,
        })
    }

    /// Parse a shell-style (ssh) command line.
    ///
    /// The last token is `[user@]host`; the text after the last `@` is the
    /// host, so a token without `@` is treated as a bare hostname.
    pub fn parse_shell(raw: &str) -> GateResult<Self> {
        let last = raw
            .split_whitespace()
            .last()
            .ok_or_else(|| GateError::InvalidCommand(raw.trim().to_string()))?;

        let (user, host) = match last.rsplit_once('@') {
            Some((user, host)) => (Some(user.to_string()), host),
            None => (None, last),
        };

        Ok(Self {
            dest_user: user,
            dest_host: Some(host.to_string()),
            ..Self::default()
        })
    }

    /// Host candidates for forward DNS lookup, destination first.
    pub fn lookup_candidates(&self) -> Vec<&str> {
        [self.dest_host.as_deref(), self.source_host.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Split a copy-side token into user and host components.
///
/// Only a token of the exact `user@host[:path]` shape yields a host; this
/// is what distinguishes a remote side from a local path.
fn split_user_host(token: &str) -> (Option<String>, Option<String>) {
    let without_path = token.split(':').next().unwrap_or_default();
    let parts: Vec<&str> = without_path.split('@').collect();
    match parts.as_slice() {
        [user, host] => (Some(user.to_string()), Some(host.to_string())),
        _ => (None, None),
    }
}
