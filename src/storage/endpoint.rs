use url::Url;

const DEFAULT_SCHEME: &str = "https://";

/// Canonical endpoint URL used to build a client.
///
/// Trims whitespace, prepends `https://` when no `scheme://` is present and
/// removes exactly one trailing `/`.
pub fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim();

    let mut endpoint = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, trimmed)
    };

    if endpoint.ends_with('/') {
        endpoint.pop();
    }

    endpoint
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) "://"`
fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// First DNS label of the endpoint host.
///
/// Providers such as R2 embed the account id there
/// (`https://<account>.r2.cloudflarestorage.com`).
pub fn host_label(endpoint: &str) -> Option<String> {
    if endpoint.trim().is_empty() {
        return None;
    }

    let url = Url::parse(&normalize_endpoint(endpoint)).ok()?;
    let host = url.host_str()?;
    host.split('.')
        .next()
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepends_https_when_scheme_missing() {
        assert_eq!(
            normalize_endpoint("abc.r2.cloudflarestorage.com"),
            "https://abc.r2.cloudflarestorage.com"
        );
        assert_eq!(normalize_endpoint("localhost:9000"), "https://localhost:9000");
    }

    #[test]
    fn test_keeps_existing_scheme() {
        assert_eq!(normalize_endpoint("http://127.0.0.1:9000"), "http://127.0.0.1:9000");
        assert_eq!(normalize_endpoint("HTTPS://minio.local"), "HTTPS://minio.local");
    }

    #[test]
    fn test_trims_and_strips_one_trailing_slash() {
        assert_eq!(normalize_endpoint("  https://s3.example.com/ \n"), "https://s3.example.com");
        // only one pass
        assert_eq!(normalize_endpoint("https://s3.example.com//"), "https://s3.example.com/");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "s3.example.com",
            " https://s3.example.com/ ",
            "http://localhost:9000/",
            "minio.internal:9000/base",
            "abc.r2.cloudflarestorage.com/",
        ];

        for input in inputs {
            let once = normalize_endpoint(input);
            assert_eq!(normalize_endpoint(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_host_label() {
        assert_eq!(
            host_label("5f00811ec43d757ac0f57e31019e1583.r2.cloudflarestorage.com").as_deref(),
            Some("5f00811ec43d757ac0f57e31019e1583")
        );
        assert_eq!(host_label("http://localhost:9000").as_deref(), Some("localhost"));
        assert_eq!(host_label("").as_deref(), None);
    }
}
