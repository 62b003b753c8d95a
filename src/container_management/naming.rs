//! Container naming convention shared by the session flow and the reaper.
//!
//! A provisioned container is named `<user>-<unix-timestamp>`: exactly two
//! fields joined by a single `-`. The user field never contains `-` (see
//! [`sanitize_user`]) and the timestamp field is ASCII digits only. The reaper
//! relies on this shape to find the creation time, so anything else is
//! rejected by [`ContainerName::parse`] and left alone.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

pub const NAME_SEPARATOR: char = '-';

const NAME_PATTERN: &str = r"^([^-]+)-([0-9]+)$";

fn name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(NAME_PATTERN).ok())
        .as_ref()
}

/// Replaces every character outside `[A-Za-z0-9_.]` with `_`.
///
/// Docker names must match `[a-zA-Z0-9][a-zA-Z0-9_.-]*`, and `-` is reserved as
/// the field separator.
pub fn sanitize_user(user: &str) -> String {
    let safe: String = user
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        safe
    } else {
        format!("u{}", safe)
    }
}

/// A parsed or generated `<user>-<timestamp>` container name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerName {
    user: String,
    created: i64,
}

impl ContainerName {
    /// Builds the name for a container created at `created` (Unix seconds).
    pub fn new(user: &str, created: i64) -> Self {
        Self {
            user: sanitize_user(user),
            created,
        }
    }

    /// Parses an engine-reported name, ignoring Docker's leading `/`.
    ///
    /// Returns `None` for anything that is not exactly `<token>-<digits>`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.strip_prefix('/').unwrap_or(name);
        let caps = name_pattern()?.captures(name)?;
        let created = caps[2].parse::<i64>().ok()?;
        Some(Self {
            user: caps[1].to_string(),
            created,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Creation time in Unix seconds.
    pub fn created(&self) -> i64 {
        self.created
    }

    /// Seconds elapsed between creation and `now`.
    pub fn age_at(&self, now: i64) -> i64 {
        now.saturating_sub(self.created)
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.user, NAME_SEPARATOR, self.created)
    }
}
