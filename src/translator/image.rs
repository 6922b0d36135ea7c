//! Container image references.

use serde_json::{Value, json};
use std::fmt;

use crate::error::TranslateError;

/// Tag used when the reference names none.
pub const DEFAULT_TAG: &str = "latest";

/// An image reference split into repository, tag and optional digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Everything before the tag, registry and port included.
    pub repository: String,
    /// The tag.
    pub tag: String,
    /// Content digest such as `sha256:<hex>`, when the reference pins one.
    pub digest: Option<String>,
}

impl ImageRef {
    /// Parses `registry/repo:tag` with an optional `@algorithm:hex` digest.
    ///
    /// The digest is split off first. Only a `:` after the last `/` of what
    /// remains starts a tag, so a registry port is never mistaken for one.
    ///
    /// # Errors
    ///
    /// Returns an error for empty text, an empty tag or a malformed digest.
    pub fn parse(text: &str) -> Result<Self, TranslateError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TranslateError::missing("image"));
        }

        let (text, digest) = match text.split_once('@') {
            Some((name, digest)) => (name, Some(parse_digest(digest)?)),
            None => (text, None),
        };

        let name_start = text.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match text[name_start..].rfind(':') {
            Some(i) => {
                let split = name_start + i;
                (&text[..split], &text[split + 1..])
            }
            None => (text, DEFAULT_TAG),
        };

        if repository.is_empty() || repository.ends_with('/') {
            return Err(TranslateError::invalid("image", "missing repository name"));
        }
        if tag.is_empty() {
            return Err(TranslateError::invalid("image", "empty tag"));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
            digest,
        })
    }

    /// Renders the `{repository, tag, digest}` tree.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "repository": self.repository,
            "tag": self.tag,
        });
        if let Some(digest) = &self.digest {
            value["digest"] = json!(digest);
        }
        value
    }
}

fn parse_digest(digest: &str) -> Result<String, TranslateError> {
    match digest.split_once(':') {
        Some((algorithm, hex))
            if !algorithm.is_empty()
                && !hex.is_empty()
                && hex.chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            Ok(digest.to_string())
        }
        _ => Err(TranslateError::invalid(
            "image",
            format!("malformed digest '{digest}'"),
        )),
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)?;
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("nginx:latest", "nginx", "latest")]
    #[case("nginx", "nginx", "latest")]
    #[case("nginx:1.27-alpine", "nginx", "1.27-alpine")]
    #[case(
        "ghcr.io/homebridge/homebridge:latest",
        "ghcr.io/homebridge/homebridge",
        "latest"
    )]
    #[case("registry:5000/app", "registry:5000/app", "latest")]
    #[case("registry:5000/team/app:v2", "registry:5000/team/app", "v2")]
    fn test_parse(#[case] input: &str, #[case] repository: &str, #[case] tag: &str) {
        let image = ImageRef::parse(input).unwrap();
        assert_eq!(image.repository, repository);
        assert_eq!(image.tag, tag);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ImageRef::parse("  ").unwrap_err(),
            TranslateError::missing("image")
        );
        assert!(matches!(
            ImageRef::parse("nginx:"),
            Err(TranslateError::InvalidField { .. })
        ));
        assert!(matches!(
            ImageRef::parse("registry/:v1"),
            Err(TranslateError::InvalidField { .. })
        ));
    }

    #[rstest]
    #[case("nginx@sha256:0123abcd", "nginx", "latest")]
    #[case("nginx:1.27@sha256:0123abcd", "nginx", "1.27")]
    #[case("registry:5000/team/app@sha256:0123abcd", "registry:5000/team/app", "latest")]
    fn test_parse_digest(#[case] input: &str, #[case] repository: &str, #[case] tag: &str) {
        let image = ImageRef::parse(input).unwrap();
        assert_eq!(image.repository, repository);
        assert_eq!(image.tag, tag);
        assert_eq!(image.digest.as_deref(), Some("sha256:0123abcd"));
        assert_eq!(image.to_value()["digest"], "sha256:0123abcd");
    }

    #[test]
    fn test_malformed_digest() {
        for input in ["nginx@", "nginx@sha256", "nginx@sha256:", "nginx@sha256:xyz"] {
            assert!(
                matches!(ImageRef::parse(input), Err(TranslateError::InvalidField { .. })),
                "for {input}"
            );
        }
    }

    #[test]
    fn test_display_and_value() {
        let image = ImageRef::parse("ghcr.io/org/app").unwrap();
        assert_eq!(image.to_string(), "ghcr.io/org/app:latest");
        assert_eq!(image.to_value()["tag"], "latest");
        assert!(image.to_value().get("digest").is_none());

        let pinned = ImageRef::parse("nginx:1.27@sha256:ab12").unwrap();
        assert_eq!(pinned.to_string(), "nginx:1.27@sha256:ab12");
    }
}
