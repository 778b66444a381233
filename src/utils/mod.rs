pub mod paths;
pub mod validation;

use sha2::{Digest, Sha256};

/// Hex SHA-256 of an access token, used to tie jobs to their owner without
/// keeping the token itself around
pub fn token_fingerprint(access_token: &str) -> String {
    hex::encode(Sha256::digest(access_token.as_bytes()))
}
