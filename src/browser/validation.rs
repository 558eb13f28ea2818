use crate::types::BrowserError;

pub const ACCESS_KEY_ID_LEN: usize = 32;
pub const SECRET_ACCESS_KEY_LEN: usize = 64;

/// Credential format problems, reported before any network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialFormatError {
    /// Shape of an API token or similar, pasted where the access key id belongs
    #[error(
        "Invalid Access Key ID. This looks like a different credential type (such as an API token), not an S3 Access Key ID."
    )]
    AccessKeyLooksLikeToken,
    #[error("Invalid Access Key ID. Must be a 32-character hex string.")]
    AccessKeyFormat,
    #[error("Invalid Secret Access Key. Must be a 64-character hex string.")]
    SecretKeyFormat,
}

impl From<CredentialFormatError> for BrowserError {
    fn from(err: CredentialFormatError) -> Self {
        BrowserError::Validation(err.to_string())
    }
}

fn is_hex_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Format check for an access key id / secret pair. Pure; performs no I/O.
pub fn validate_credentials(
    access_key_id: &str,
    secret_access_key: &str,
) -> Result<(), CredentialFormatError> {
    if !is_hex_of_len(access_key_id, ACCESS_KEY_ID_LEN) {
        let token_like = access_key_id.contains(['_', '-'])
            || access_key_id.chars().count() > ACCESS_KEY_ID_LEN;

        return Err(if token_like {
            CredentialFormatError::AccessKeyLooksLikeToken
        } else {
            CredentialFormatError::AccessKeyFormat
        });
    }

    if !is_hex_of_len(secret_access_key, SECRET_ACCESS_KEY_LEN) {
        return Err(CredentialFormatError::SecretKeyFormat);
    }

    Ok(())
}
