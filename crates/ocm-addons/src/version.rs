//! Version parsing for imageset names.

use ocm_core::Error;

use crate::Result;

/// Extract the semantic version from an imageset name of the form `<addon>.v<semver>`.
///
/// The version is everything after the first `.v`. It must be `MAJOR.MINOR.PATCH`
/// without leading zeros, optionally followed by `-prerelease` and/or `+build`.
///
/// # Errors
///
/// Returns [`Error::InvalidImageSet`] when the name has no `.v` separator or the
/// remainder is not a semantic version.
pub fn parse_version_from_imageset_name(name: &str) -> Result<String> {
    let (_, version) = name.split_once(".v").ok_or_else(|| {
        Error::InvalidImageSet(format!("`{name}` does not follow `<addon>.v<version>`"))
    })?;

    if !is_semver(version) {
        return Err(Error::InvalidImageSet(format!(
            "`{version}` in `{name}` is not a semantic version"
        )));
    }

    Ok(version.to_string())
}

fn is_semver(version: &str) -> bool {
    let (rest, build) = match version.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (version, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let numbers: Vec<&str> = core.split('.').collect();
    if numbers.len() != 3 || !numbers.iter().all(|n| is_numeric_identifier(n)) {
        return false;
    }

    let pre_ok = pre.map_or(true, |pre| {
        pre.split('.').all(|id| {
            is_identifier(id) && (!id.bytes().all(|b| b.is_ascii_digit()) || is_numeric_identifier(id))
        })
    });
    let build_ok = build.map_or(true, |build| build.split('.').all(is_identifier));

    pre_ok && build_ok
}

fn is_numeric_identifier(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && (id == "0" || !id.starts_with('0'))
}

fn is_identifier(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_versions() {
        assert_eq!(
            parse_version_from_imageset_name("reference-addon.v0.1.0").unwrap(),
            "0.1.0"
        );
        assert_eq!(
            parse_version_from_imageset_name("managed-odh.v12.30.4").unwrap(),
            "12.30.4"
        );
    }

    #[test]
    fn keeps_prerelease_and_build() {
        assert_eq!(
            parse_version_from_imageset_name("addon.v1.0.0-rc.1+build.5").unwrap(),
            "1.0.0-rc.1+build.5"
        );
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "reference-addon",
            "reference-addon.v",
            "reference-addon.v1.0",
            "reference-addon.v1.0.0.0",
            "reference-addon.v01.0.0",
            "reference-addon.vlatest",
            "reference-addon.v1.0.0-",
            "reference-addon.v1.0.0-01",
        ] {
            let err = parse_version_from_imageset_name(name).unwrap_err();
            assert!(matches!(err, Error::InvalidImageSet(_)), "{name}");
        }
    }
}
