use sha2::{Digest, Sha256};
use uuid::Uuid;

const SCHEME: &str = "sha256";

/// Salted digest in the form `sha256$<salt>$<hex digest>`
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}${}", SCHEME, salt, digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if scheme != SCHEME {
        return false;
    }
    constant_time_eq(digest(salt, password).as_bytes(), expected.as_bytes())
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
