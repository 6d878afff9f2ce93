//! Time-based one-time passwords (RFC 6238) for two-factor auth.
//!
//! Codes are 6 digits over 30-second steps using HMAC-SHA256.
//! Verification accepts one step of clock skew in either direction.
//! Secrets are 20 random bytes, stored and exchanged hex-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Step length in seconds.
pub const STEP_SECS: u64 = 30;

/// Number of code digits.
const DIGITS: u32 = 6;

/// Accepted clock skew, in steps, on either side of "now".
const SKEW_STEPS: u64 = 1;

/// Generate a new random TOTP secret, hex-encoded.
pub fn generate_secret() -> String {
    let bytes: [u8; 20] = rand::random();
    hex::encode(bytes)
}

/// Compute the code for `secret` at `unix_time`.
pub fn generate_code(secret: &[u8], unix_time: u64) -> String {
    hotp(secret, unix_time / STEP_SECS)
}

/// Verify `code` against `secret` at `unix_time`, allowing ±1 step of skew.
pub fn verify_code(secret: &[u8], code: &str, unix_time: u64) -> bool {
    let step = unix_time / STEP_SECS;
    let start = step.saturating_sub(SKEW_STEPS);
    (start..=step + SKEW_STEPS).any(|s| constant_time_eq(&hotp(secret, s), code))
}

/// HOTP (RFC 4226) with HMAC-SHA256 and dynamic truncation.
fn hotp(secret: &[u8], counter: u64) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC key length is valid");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation: low nibble of the last byte picks the offset
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let bin = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    format!("{:01$}", bin % 10u32.pow(DIGITS), DIGITS as usize)
}

/// Byte-wise constant-time comparison for short codes.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        let secret = hex::decode(generate_secret()).unwrap();
        let code = generate_code(&secret, 1_700_000_000);
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn codes_are_deterministic_within_a_step() {
        let secret = hex::decode(generate_secret()).unwrap();
        let t = 1_700_000_000;
        assert_eq!(generate_code(&secret, t), generate_code(&secret, t + STEP_SECS - 1));
    }

    #[test]
    fn generated_code_verifies() {
        let secret = hex::decode(generate_secret()).unwrap();
        let t = 1_700_000_000;
        let code = generate_code(&secret, t);
        assert!(verify_code(&secret, &code, t));
    }

    #[test]
    fn verification_tolerates_one_step_of_skew() {
        let secret = hex::decode(generate_secret()).unwrap();
        let t = 1_700_000_000;
        let code = generate_code(&secret, t);
        assert!(verify_code(&secret, &code, t + STEP_SECS));
        assert!(verify_code(&secret, &code, t.saturating_sub(STEP_SECS)));
    }

    #[test]
    fn malformed_codes_are_rejected() {
        let secret = hex::decode(generate_secret()).unwrap();
        assert!(!verify_code(&secret, "", 1_700_000_000));
        assert!(!verify_code(&secret, "12345", 1_700_000_000));
        assert!(!verify_code(&secret, "1234567", 1_700_000_000));
    }

    #[test]
    fn secrets_are_twenty_bytes_of_hex() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 40);
        assert!(hex::decode(&secret).is_ok());
        assert_ne!(secret, generate_secret());
    }
}
