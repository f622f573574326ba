use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use super::common_passwords::COMMON_PASSWORDS;
use crate::validator::Validator;

pub const MIN_PASSWORD_BYTES: usize = 8;
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Well-formed hash with the default argon2 parameters that matches no
/// password. Checked against when a login names an unknown email so both
/// failure paths cost one full verification.
pub const UNMATCHABLE_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$2YuIdhDuLGfRZ/P/w3u+5Q$xlkH+j9VGHFjs9fCSxrH0MAbZ1kmjm8WuukZpeg5pWw";

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

// argon2 is deliberately slow; keep it off the async workers.

pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

pub async fn verify_password_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?
}

pub fn is_common(plain: &str) -> bool {
    COMMON_PASSWORDS
        .iter()
        .any(|common| common.eq_ignore_ascii_case(plain))
}

/// Records every policy violation of a new password under `field`.
pub fn check_new_password(v: &mut Validator, field: &str, plain: &str) {
    if plain.is_empty() {
        v.add_field_error(field, "Password is required");
        return;
    }
    v.check_field(
        plain.len() >= MIN_PASSWORD_BYTES,
        field,
        "Password is too short",
    );
    v.check_field(
        plain.len() <= MAX_PASSWORD_BYTES,
        field,
        "Password is too long",
    );
    v.check_field(!is_common(plain), field, "Password is too common");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatchable_hash_costs_the_same_as_a_real_one() {
        let fresh = hash_password("anything at all").unwrap();
        let fresh = PasswordHash::new(&fresh).unwrap();
        let dummy = PasswordHash::new(UNMATCHABLE_HASH).unwrap();

        assert_eq!(dummy.algorithm, fresh.algorithm);
        assert_eq!(dummy.version, fresh.version);
        assert_eq!(dummy.params.to_string(), fresh.params.to_string());
        assert_eq!(
            dummy.hash.map(|h| h.len()),
            fresh.hash.map(|h| h.len())
        );

        assert!(!verify_password("anything at all", UNMATCHABLE_HASH).unwrap());
        assert!(!verify_password("", UNMATCHABLE_HASH).unwrap());
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn roundtrip_at_length_bounds() {
        for len in [MIN_PASSWORD_BYTES, MAX_PASSWORD_BYTES] {
            let password = "x7".repeat(len / 2);
            assert_eq!(password.len(), len);
            let hash = hash_password(&password).unwrap();
            assert!(verify_password(&password, &hash).unwrap());
        }
    }

    #[tokio::test]
    async fn blocking_wrappers_agree() {
        let hash = hash_password_blocking("Tr0ub4dor&3".into()).await.unwrap();
        assert!(verify_password_blocking("Tr0ub4dor&3".into(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_blocking("Tr0ub4dor&4".into(), hash)
            .await
            .unwrap());
    }

    #[test]
    fn deny_list_membership() {
        assert!(is_common("password"));
        assert!(is_common("PASSWORD"));
        assert!(is_common("12345678"));
        assert!(!is_common("Tr0ub4dor&3"));
    }

    #[test]
    fn policy_reports_every_violation() {
        let mut v = Validator::new();
        check_new_password(&mut v, "Password", "123456");
        assert_eq!(
            v.field("Password"),
            ["Password is too short", "Password is too common"]
        );

        let mut v = Validator::new();
        check_new_password(&mut v, "Password", &"a".repeat(73));
        assert_eq!(v.field("Password"), ["Password is too long"]);

        let mut v = Validator::new();
        check_new_password(&mut v, "NewPassword", "");
        assert_eq!(v.field("NewPassword"), ["Password is required"]);

        let mut v = Validator::new();
        check_new_password(&mut v, "Password", "Tr0ub4dor&3");
        assert!(!v.has_errors());
    }
}
