//! Wireless command link surface
//!
//! The wireless stack lives outside this crate; the core only sees a
//! connection flag and two independently-writable "milliseconds to pulse"
//! slots. Both contexts (the link's event handler and the tick interrupt)
//! touch these fields concurrently, so each one is an atomic cell and each
//! is independently meaningful: a command value of zero always means
//! "nothing pending", and consumption is an atomic exchange-to-zero. No
//! multi-field critical sections are needed.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::Ms;

/// Commands larger than this are discarded by the parser mid-accumulation
pub const COMMAND_MS_MAX: u32 = 10_000;

/// Shared context between the wireless collaborator and the tick handler
///
/// `&self` API throughout; designed to live in a `static`.
#[derive(Debug)]
pub struct LinkState {
    connected: AtomicBool,
    command1: AtomicU32,
    command2: AtomicU32,
}

impl LinkState {
    /// Create a disconnected link with no pending commands
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            command1: AtomicU32::new(0),
            command2: AtomicU32::new(0),
        }
    }

    /// Set by the link's event handler on connect/disconnect
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Whether the wireless link is currently up
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Post a value into the first command slot (overwrites any pending)
    pub fn post_command1(&self, ms: u32) {
        self.command1.store(ms, Ordering::Relaxed);
    }

    /// Post a value into the second command slot (overwrites any pending)
    pub fn post_command2(&self, ms: u32) {
        self.command2.store(ms, Ordering::Relaxed);
    }

    /// Consume the first command slot; zero means nothing pending
    pub fn take_command1(&self) -> u32 {
        self.command1.swap(0, Ordering::Relaxed)
    }

    /// Consume the second command slot; zero means nothing pending
    pub fn take_command2(&self) -> u32 {
        self.command2.swap(0, Ordering::Relaxed)
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one command line into the two command values
///
/// Wire format: two ASCII decimal integers separated by a space, e.g.
/// `"30 120"`. Each value is digit-parsed until the first non-digit;
/// accumulation stops once the value exceeds [`COMMAND_MS_MAX`]. Anything
/// unparseable yields zero for that slot, which downstream means "nothing
/// pending".
pub fn parse_command_line(line: &[u8]) -> (Ms, Ms) {
    let mut i = 0;
    let first = parse_value(line, &mut i);

    if i < line.len() && line[i] == b' ' {
        i += 1;
    }
    let second = parse_value(line, &mut i);

    (first, second)
}

fn parse_value(line: &[u8], i: &mut usize) -> u32 {
    let mut value: u32 = 0;
    while *i < line.len() {
        let byte = line[*i];
        if !byte.is_ascii_digit() {
            break;
        }
        if value > COMMAND_MS_MAX {
            break;
        }
        value = value * 10 + u32::from(byte - b'0');
        *i += 1;
    }
    value
}
