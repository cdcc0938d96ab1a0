//! Conversation configuration: file parsing and per-role validation.
//!
//! Both roles can read the same four-key configuration file, each consuming
//! only the keys it needs:
//!
//! ```text
//! message:"This is a test message"
//! maximum_msg_size:400
//! window_size:4
//! timeout:5
//! ```
//!
//! The grammar is strict: one `key:value` pair per line, blank lines
//! ignored, keys drawn from the four fixed names, no duplicates, numeric
//! values parsed as positive integers.  The `message` value is the literal
//! remainder of its line after the first `:`, trimmed, with one optional
//! pair of surrounding straight double quotes stripped; any other character
//! (curly quotes included) is simply part of the value.  Anything else is
//! rejected before network activity begins.
//!
//! [`SenderConfig`] and [`ReceiverConfig`] are the validated per-role
//! settings; interactive input goes through the same constructors as file
//! input, so validation lives in exactly one place.

use std::path::Path;

use tokio::time::Duration;

/// The four recognized configuration keys.
pub const KEY_MESSAGE: &str = "message";
pub const KEY_MAXIMUM_MSG_SIZE: &str = "maximum_msg_size";
pub const KEY_WINDOW_SIZE: &str = "window_size";
pub const KEY_TIMEOUT: &str = "timeout";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// A line is not of the form `key:value`.
    InvalidLine(String),
    /// A key outside the four recognized names.
    UnknownKey(String),
    /// The same key appears twice.
    DuplicateKey(&'static str),
    /// A key this role requires is absent.
    MissingKey(&'static str),
    /// A numeric value failed to parse as a positive integer.
    InvalidNumber { key: &'static str, value: String },
    /// A numeric value parsed but exceeds the key's bound.
    OutOfRange { key: &'static str, max: u64 },
    /// The message value is empty.
    EmptyMessage,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read configuration file: {e}"),
            Self::InvalidLine(line) => write!(f, "malformed configuration line: {line:?}"),
            Self::UnknownKey(key) => write!(f, "unknown configuration key: {key:?}"),
            Self::DuplicateKey(key) => write!(f, "duplicate configuration key: {key}"),
            Self::MissingKey(key) => write!(f, "missing configuration key: {key}"),
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer, got {value:?}")
            }
            Self::OutOfRange { key, max } => write!(f, "{key} must be at most {max}"),
            Self::EmptyMessage => write!(f, "message must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// File grammar
// ---------------------------------------------------------------------------

/// Raw key/value pairs from one configuration file, before any role decides
/// which of them it requires.
#[derive(Debug, Default)]
struct Fields {
    message: Option<String>,
    maximum_msg_size: Option<u64>,
    window_size: Option<u64>,
    timeout: Option<u64>,
}

fn parse_fields(text: &str) -> Result<Fields, ConfigError> {
    let mut fields = Fields::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(ConfigError::InvalidLine(line.to_string()));
        };

        match key.trim() {
            KEY_MESSAGE => {
                store(&mut fields.message, parse_message(value), KEY_MESSAGE)?;
            }
            KEY_MAXIMUM_MSG_SIZE => {
                let n = parse_positive(value, KEY_MAXIMUM_MSG_SIZE)?;
                store(&mut fields.maximum_msg_size, n, KEY_MAXIMUM_MSG_SIZE)?;
            }
            KEY_WINDOW_SIZE => {
                let n = parse_positive(value, KEY_WINDOW_SIZE)?;
                store(&mut fields.window_size, n, KEY_WINDOW_SIZE)?;
            }
            KEY_TIMEOUT => {
                let n = parse_positive(value, KEY_TIMEOUT)?;
                store(&mut fields.timeout, n, KEY_TIMEOUT)?;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
    }

    Ok(fields)
}

fn store<V>(slot: &mut Option<V>, value: V, key: &'static str) -> Result<(), ConfigError> {
    if slot.is_some() {
        return Err(ConfigError::DuplicateKey(key));
    }
    *slot = Some(value);
    Ok(())
}

/// The message value: the literal rest of the line, trimmed, with one
/// optional pair of surrounding straight double quotes stripped.
fn parse_message(value: &str) -> String {
    let value = value.trim();
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.to_string(),
        None => value.to_string(),
    }
}

fn parse_positive(value: &str, key: &'static str) -> Result<u64, ConfigError> {
    let value = value.trim();
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}

fn require<V>(slot: Option<V>, key: &'static str) -> Result<V, ConfigError> {
    slot.ok_or(ConfigError::MissingKey(key))
}

// ---------------------------------------------------------------------------
// Per-role settings
// ---------------------------------------------------------------------------

/// Validated settings for the sending (client) role.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// The message to transfer.  Never empty.
    pub message: String,
    /// Fixed sliding-window size in segments.
    pub window_size: u32,
    /// Retransmission deadline; also bounds the handshake.
    pub timeout: Duration,
}

impl SenderConfig {
    /// Validate raw values into sender settings.
    pub fn new(message: String, window_size: u64, timeout_secs: u64) -> Result<Self, ConfigError> {
        if message.is_empty() {
            return Err(ConfigError::EmptyMessage);
        }
        if window_size == 0 {
            return Err(ConfigError::InvalidNumber {
                key: KEY_WINDOW_SIZE,
                value: window_size.to_string(),
            });
        }
        if window_size > u32::MAX as u64 {
            return Err(ConfigError::OutOfRange {
                key: KEY_WINDOW_SIZE,
                max: u32::MAX as u64,
            });
        }
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                key: KEY_TIMEOUT,
                value: timeout_secs.to_string(),
            });
        }
        Ok(Self {
            message,
            window_size: window_size as u32,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Load sender settings from a configuration file.
    ///
    /// The whole file must parse cleanly; only `message`, `window_size`,
    /// and `timeout` are required (a `maximum_msg_size` line is tolerated —
    /// the shared file carries the receiver's key too).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let fields = parse_fields(&std::fs::read_to_string(path)?)?;
        Self::new(
            require(fields.message, KEY_MESSAGE)?,
            require(fields.window_size, KEY_WINDOW_SIZE)?,
            require(fields.timeout, KEY_TIMEOUT)?,
        )
    }
}

/// Validated settings for the receiving (server) role.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverConfig {
    /// Maximum DATA payload size in bytes, announced during the handshake.
    /// The file key is `maximum_msg_size`; the codec's 2-byte length field
    /// bounds it at 65 535.
    pub max_segment_size: u16,
}

impl ReceiverConfig {
    /// Validate a raw value into receiver settings.
    pub fn new(maximum_msg_size: u64) -> Result<Self, ConfigError> {
        if maximum_msg_size == 0 {
            return Err(ConfigError::InvalidNumber {
                key: KEY_MAXIMUM_MSG_SIZE,
                value: maximum_msg_size.to_string(),
            });
        }
        if maximum_msg_size > u16::MAX as u64 {
            return Err(ConfigError::OutOfRange {
                key: KEY_MAXIMUM_MSG_SIZE,
                max: u16::MAX as u64,
            });
        }
        Ok(Self {
            max_segment_size: maximum_msg_size as u16,
        })
    }

    /// Load receiver settings from a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let fields = parse_fields(&std::fs::read_to_string(path)?)?;
        Self::new(require(fields.maximum_msg_size, KEY_MAXIMUM_MSG_SIZE)?)
    }
}
