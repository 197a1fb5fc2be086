//! Password hashing utilities

use bcrypt::{hash, DEFAULT_COST};

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcrypt::verify;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hashed = hash_password("s3cret-pass").unwrap();
        assert_ne!(hashed, "s3cret-pass");
        assert!(verify("s3cret-pass", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
