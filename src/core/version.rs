use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,
    #[error("invalid version '{0}'")]
    Invalid(String),
}

pub type VersionResult<T> = std::result::Result<T, VersionError>;

/// Parses a release version string. Missing minor and patch components
/// default to zero; a leading `v` is tolerated; pre-release and build
/// metadata are preserved.
pub fn parse_version(input: &str) -> VersionResult<Version> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Empty);
    }
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let (rest, build) = match bare.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (bare, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let mut numbers = core.split('.');
    let major = parse_component(numbers.next(), input)?;
    let minor = match numbers.next() {
        Some(part) => parse_component(Some(part), input)?,
        None => 0,
    };
    let patch = match numbers.next() {
        Some(part) => parse_component(Some(part), input)?,
        None => 0,
    };
    if numbers.next().is_some() {
        return Err(VersionError::Invalid(input.to_string()));
    }

    let pre = match pre {
        Some(tag) => {
            Prerelease::new(tag).map_err(|_| VersionError::Invalid(input.to_string()))?
        }
        None => Prerelease::EMPTY,
    };
    let build = match build {
        Some(meta) => {
            BuildMetadata::new(meta).map_err(|_| VersionError::Invalid(input.to_string()))?
        }
        None => BuildMetadata::EMPTY,
    };

    Ok(Version {
        major,
        minor,
        patch,
        pre,
        build,
    })
}

fn parse_component(part: Option<&str>, input: &str) -> VersionResult<u64> {
    part.filter(|part| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|part| part.parse().ok())
        .ok_or_else(|| VersionError::Invalid(input.to_string()))
}
