//! Machine hostname lookup used by the index greeting.
//!
//! Lookup goes through the [`HostnameSource`] trait so the handler can be
//! tested against a source that fails.

use std::io;

/// Something that can report the machine's hostname.
pub trait HostnameSource: Send + Sync {
    fn hostname(&self) -> io::Result<String>;
}

/// Reads the hostname from the operating system on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostname;

impl HostnameSource for SystemHostname {
    fn hostname(&self) -> io::Result<String> {
        // Non-UTF-8 hostnames are rare; lossy conversion keeps the greeting printable.
        Ok(hostname::get()?.to_string_lossy().into_owned())
    }
}
