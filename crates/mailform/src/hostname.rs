//! Cached local hostname.

use crate::address::encode_domain;
use std::sync::OnceLock;
use tracing::debug;

const DEFAULT_HOSTNAME: &str = "localhost";

static LOCAL_HOSTNAME: OnceLock<String> = OnceLock::new();

/// Returns the local hostname, resolved once per process.
///
/// The name is looked up on first use and cached for the life of the
/// process. Concurrent first callers block until the single lookup is done.
/// This is the name the operating system reports, which is often the
/// short host name rather than the fully-qualified one: no DNS lookup is
/// made. Non-ASCII names are IDNA encoded; `localhost` is used if the
/// lookup fails. Used for content-ids and the SMTP greeting.
pub fn local_hostname() -> &'static str {
    LOCAL_HOSTNAME.get_or_init(|| {
        let hostname = hostname::get()
            .map_err(|_| ())
            .and_then(|s| s.into_string().map_err(|_| ()))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map_or_else(|| DEFAULT_HOSTNAME.to_string(), |s| encode_domain(s.trim()));
        debug!(%hostname, "Resolved local hostname");
        hostname
    })
}
