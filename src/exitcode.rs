//! Standard exit codes (BSD sysexits.h compatible)

/// Command line usage error (also: unknown node id)
pub const USAGE: i32 = 64;

/// Data format error (malformed taxonomy file)
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Taxonomy provider failed
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
