use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::hmac;

use crate::error::{BotError, BotResult};

/// Validates the platform webhook signature: HMAC-SHA256 over the raw request
/// body with the channel secret, sent base64-encoded in `x-line-signature`.
pub struct SignatureValidator {
    key: hmac::Key,
}

impl SignatureValidator {
    pub fn new(channel_secret: &str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, channel_secret.as_bytes()),
        }
    }

    pub fn verify(&self, signature_header: Option<&str>, body: &[u8]) -> BotResult<()> {
        let Some(signature) = signature_header else {
            return Err(BotError::InvalidSignature);
        };

        let tag = hmac::sign(&self.key, body);
        let expected = BASE64.encode(tag.as_ref());

        // Constant-time comparison to prevent timing attacks
        if subtle::ConstantTimeEq::ct_eq(signature.as_bytes(), expected.as_bytes()).into() {
            Ok(())
        } else {
            Err(BotError::InvalidSignature)
        }
    }
}
