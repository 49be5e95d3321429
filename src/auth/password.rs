use crate::error::AppError;
use bcrypt::{hash, verify};

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}

/// Hashes on the blocking thread pool so bcrypt does not stall the executor.
pub async fn hash_password_async(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost)).await?
}

/// Verifies on the blocking thread pool so bcrypt does not stall the executor.
pub async fn verify_password_async(password: String, hashed_password: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hashed_password)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "Passw0rd";
        let hashed = hash_password(password, TEST_COST).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn test_hashing_is_salted() {
        let first = hash_password("Passw0rd", TEST_COST).unwrap();
        let second = hash_password("Passw0rd", TEST_COST).unwrap();

        assert_ne!(first, second);
        assert!(verify_password("Passw0rd", &first).unwrap());
        assert!(verify_password("Passw0rd", &second).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        match verify_password("Passw0rd", "invalidhashformat") {
            Err(AppError::InternalServerError(msg)) => {
                assert!(msg.contains("Failed to verify password"));
            }
            Ok(false) => {}
            Ok(true) => panic!("Password verification should fail for invalid hash format"),
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[actix_rt::test]
    async fn test_async_wrappers() {
        let hashed = hash_password_async("Passw0rd".into(), TEST_COST).await.unwrap();
        assert!(verify_password_async("Passw0rd".into(), hashed.clone()).await.unwrap());
        assert!(!verify_password_async("nope".into(), hashed).await.unwrap());
    }
}
