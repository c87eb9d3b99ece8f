use std::sync::Arc;

use chrono::{DateTime, Utc};
use yamdb_model::User;

use super::crypto::AuthCrypto;

const SALT: &str = "yamdb.auth.confirmation";

/// Stateless email confirmation codes.
///
/// A code is `<issued-at base36>-<hmac hex>` where the HMAC binds the user's
/// identity and last login. Issuing an access token refreshes the last login,
/// which invalidates every code handed out before it.
#[derive(Debug, Clone)]
pub struct ConfirmationCodes {
    crypto: Arc<AuthCrypto>,
    ttl: chrono::Duration,
}

impl ConfirmationCodes {
    pub fn new(crypto: Arc<AuthCrypto>, ttl: std::time::Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self { crypto, ttl }
    }

    pub fn make_code(&self, user: &User) -> String {
        self.make_code_at(user, Utc::now())
    }

    pub fn make_code_at(&self, user: &User, now: DateTime<Utc>) -> String {
        let issued = now.timestamp().max(0) as u64;
        let stamp = to_base36(issued);
        let signature = self.crypto.sign(SALT, &payload(user, &stamp));
        format!("{stamp}-{signature}")
    }

    pub fn check_code(&self, user: &User, code: &str) -> bool {
        self.check_code_at(user, code, Utc::now())
    }

    pub fn check_code_at(&self, user: &User, code: &str, now: DateTime<Utc>) -> bool {
        let Some((stamp, signature)) = code.trim().split_once('-') else {
            return false;
        };
        let Ok(issued) = u64::from_str_radix(stamp, 36) else {
            return false;
        };
        let Ok(issued) = i64::try_from(issued) else {
            return false;
        };
        let Some(issued_at) = DateTime::<Utc>::from_timestamp(issued, 0) else {
            return false;
        };
        if issued_at > now || now - issued_at > self.ttl {
            return false;
        }

        let expected = self.crypto.sign(SALT, &payload(user, stamp));
        AuthCrypto::secure_eq(&expected, signature)
    }
}

fn payload(user: &User, stamp: &str) -> String {
    let last_login = user
        .last_login
        .map(|at| at.timestamp_micros().to_string())
        .unwrap_or_default();
    format!(
        "{}|{}|{}|{}|{}",
        user.id, user.username, user.email, last_login, stamp
    )
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
