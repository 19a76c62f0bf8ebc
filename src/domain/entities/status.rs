//! Verification status vocabularies and provider status mapping.
//!
//! `status` and `dkim_status` share [`DomainStatus`]; `spf_status` uses
//! [`SpfStatus`], which has no `not_started` member. Provider strings are only
//! ever translated through [`map_status`].

use std::fmt;
use std::str::FromStr;

/// A status string that is not part of the target field's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verification status '{0}'")]
pub struct UnknownStatus(pub String);

/// Overall and DKIM verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainStatus {
    NotStarted,
    #[default]
    Pending,
    Success,
    Failed,
    TemporaryFailure,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::NotStarted => "not_started",
            DomainStatus::Pending => "pending",
            DomainStatus::Success => "success",
            DomainStatus::Failed => "failed",
            DomainStatus::TemporaryFailure => "temporary_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DomainStatus::Success)
    }
}

impl FromStr for DomainStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(DomainStatus::NotStarted),
            "pending" => Ok(DomainStatus::Pending),
            "success" => Ok(DomainStatus::Success),
            "failed" => Ok(DomainStatus::Failed),
            "temporary_failure" => Ok(DomainStatus::TemporaryFailure),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SPF verification status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpfStatus {
    #[default]
    Pending,
    Success,
    Failed,
    TemporaryFailure,
}

impl SpfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpfStatus::Pending => "pending",
            SpfStatus::Success => "success",
            SpfStatus::Failed => "failed",
            SpfStatus::TemporaryFailure => "temporary_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SpfStatus::Success)
    }
}

impl FromStr for SpfStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SpfStatus::Pending),
            "success" => Ok(SpfStatus::Success),
            "failed" => Ok(SpfStatus::Failed),
            "temporary_failure" => Ok(SpfStatus::TemporaryFailure),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for SpfStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translates a provider status into the internal vocabulary.
///
/// - `"verified"` becomes `"success"`
/// - `"not_started"` and a missing status become `"pending"`
/// - anything else passes through unchanged (e.g. `"failed"`, `"temporary_failure"`)
pub fn map_status(provider_status: Option<&str>) -> &str {
    match provider_status {
        Some("verified") => "success",
        Some("not_started") | None => "pending",
        Some(other) => other,
    }
}

/// Maps a provider status and parses it into a field's vocabulary.
///
/// # Errors
///
/// Returns [`UnknownStatus`] when the passed-through value has no member in `S`.
pub fn parse_provider_status<S>(provider_status: Option<&str>) -> Result<S, UnknownStatus>
where
    S: FromStr<Err = UnknownStatus>,
{
    map_status(provider_status).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status() {
        assert_eq!(map_status(Some("verified")), "success");
        assert_eq!(map_status(Some("not_started")), "pending");
        assert_eq!(map_status(None), "pending");
        assert_eq!(map_status(Some("failed")), "failed");
        assert_eq!(map_status(Some("temporary_failure")), "temporary_failure");
        assert_eq!(map_status(Some("pending")), "pending");
    }

    #[test]
    fn test_parse_provider_status_domain() {
        assert_eq!(
            parse_provider_status::<DomainStatus>(Some("verified")),
            Ok(DomainStatus::Success)
        );
        assert_eq!(
            parse_provider_status::<DomainStatus>(None),
            Ok(DomainStatus::Pending)
        );
        assert_eq!(
            parse_provider_status::<DomainStatus>(Some("temporary_failure")),
            Ok(DomainStatus::TemporaryFailure)
        );
    }

    #[test]
    fn test_parse_provider_status_spf_never_not_started() {
        assert_eq!(
            parse_provider_status::<SpfStatus>(Some("not_started")),
            Ok(SpfStatus::Pending)
        );
        assert_eq!(
            parse_provider_status::<SpfStatus>(Some("failed")),
            Ok(SpfStatus::Failed)
        );
    }

    #[test]
    fn test_parse_provider_status_unknown() {
        let err = parse_provider_status::<DomainStatus>(Some("partially_verified")).unwrap_err();
        assert_eq!(err, UnknownStatus("partially_verified".to_string()));
    }

    #[test]
    fn test_spf_rejects_not_started_literal() {
        assert!("not_started".parse::<SpfStatus>().is_err());
        assert_eq!(
            "not_started".parse::<DomainStatus>(),
            Ok(DomainStatus::NotStarted)
        );
    }

    #[test]
    fn test_display_round_trip() {
        for status in [
            DomainStatus::NotStarted,
            DomainStatus::Pending,
            DomainStatus::Success,
            DomainStatus::Failed,
            DomainStatus::TemporaryFailure,
        ] {
            assert_eq!(status.to_string().parse::<DomainStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_defaults_are_pending() {
        assert_eq!(DomainStatus::default(), DomainStatus::Pending);
        assert_eq!(SpfStatus::default(), SpfStatus::Pending);
    }
}
