//! Credential checks for customers and admins.
//!
//! Login failures never reveal whether the account exists: both an unknown
//! identity and a wrong password come back as [`AuthError::InvalidCredentials`].

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;
use crate::store::{AccountStore, AdminRecord, StoreError, UserRecord};
use crate::{AdminLoginRequest, LoginRequest, SignupRequest, User};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already exists")]
    EmailTaken,
    #[error("password hashing failed")]
    PasswordHash,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Default admin account created at startup when configured.
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub email: String,
    pub username: String,
    pub password: String,
}

pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

pub async fn signup(accounts: &dyn AccountStore, req: SignupRequest) -> Result<User, AuthError> {
    let email = normalize_email(&req.email);
    let (fname, lname) = (req.fname.trim().to_string(), req.lname.trim().to_string());
    if email.is_empty() || req.password.is_empty() || fname.is_empty() || lname.is_empty() {
        return Err(AuthError::MissingFields);
    }
    let record = UserRecord {
        id: Uuid::now_v7().to_string(),
        email,
        password_hash: hash_password(&req.password)?,
        fname,
        mname: req.mname.as_deref().unwrap_or_default().trim().to_string(),
        lname,
        contact_number: req.contact_number.trim().to_string(),
        address: None,
        created_at: Utc::now(),
    };
    match accounts.insert_user(&record).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => return Err(AuthError::EmailTaken),
        Err(e) => return Err(e.into()),
    }
    tracing::info!(user_id = %record.id, "customer signed up");
    Ok(record.to_user())
}

pub async fn login(accounts: &dyn AccountStore, req: LoginRequest) -> Result<User, AuthError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() { return Err(AuthError::MissingFields); }
    let user = accounts.find_user_by_email(&email).await?.ok_or(AuthError::InvalidCredentials)?;
    verify_password(&req.password, &user.password_hash)?;
    tracing::info!(user_id = %user.id, "customer logged in");
    Ok(user.to_user())
}

/// Admins sign in with either their email or their username.
pub async fn admin_login(accounts: &dyn AccountStore, req: AdminLoginRequest) -> Result<User, AuthError> {
    let identifier = normalize_email(&req.identifier);
    if identifier.is_empty() || req.password.is_empty() { return Err(AuthError::MissingFields); }
    let Some(admin) = accounts.find_admin(&identifier).await? else {
        tracing::debug!(%identifier, "admin login for unknown identifier");
        return Err(AuthError::InvalidCredentials);
    };
    verify_password(&req.password, &admin.password_hash)?;
    tracing::info!(admin_id = %admin.id, username = %admin.username, "admin logged in");
    Ok(admin.to_user())
}

pub async fn seed_admin(accounts: &dyn AccountStore, seed: &AdminSeed) -> Result<(), AuthError> {
    let admin = AdminRecord {
        id: Uuid::now_v7().to_string(),
        email: normalize_email(&seed.email),
        username: seed.username.trim().to_lowercase(),
        password_hash: hash_password(&seed.password)?,
        fname: "Store".to_string(),
        mname: String::new(),
        lname: "Admin".to_string(),
    };
    accounts.upsert_admin(&admin).await?;
    tracing::info!(email = %admin.email, "default admin ensured");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::UserRole;

    fn signup_req(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(), password: "narra-wood-42".into(), fname: " Jose ".into(), mname: Some("P.".into()),
            lname: "Rizal".into(), contact_number: "09171234567".into(),
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let store = MemoryStore::new();
        let user = signup(&store, signup_req("  Jose@Example.PH ")).await.unwrap();
        assert_eq!(user.email, "jose@example.ph");
        assert_eq!(user.name, "Jose P. Rizal");
        assert_eq!(user.role, UserRole::Customer);

        let again = login(&store, LoginRequest { email: "JOSE@example.ph".into(), password: "narra-wood-42".into() }).await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates_and_missing_fields() {
        let store = MemoryStore::new();
        signup(&store, signup_req("a@b.ph")).await.unwrap();
        assert!(matches!(signup(&store, signup_req("A@B.ph")).await, Err(AuthError::EmailTaken)));
        let mut req = signup_req("c@d.ph");
        req.lname = "  ".into();
        assert!(matches!(signup(&store, req).await, Err(AuthError::MissingFields)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        signup(&store, signup_req("a@b.ph")).await.unwrap();
        let wrong = login(&store, LoginRequest { email: "a@b.ph".into(), password: "nope".into() }).await.unwrap_err();
        let unknown = login(&store, LoginRequest { email: "x@y.ph".into(), password: "nope".into() }).await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_admin_login_by_username() {
        let store = MemoryStore::new();
        seed_admin(&store, &AdminSeed { email: "admin@arfurniture.com".into(), username: "admin".into(), password: "admin123".into() }).await.unwrap();
        let admin = admin_login(&store, AdminLoginRequest { identifier: "Admin".into(), password: "admin123".into() }).await.unwrap();
        assert!(admin.is_admin());
        assert_eq!(admin.name, "Store Admin");
        assert!(admin_login(&store, AdminLoginRequest { identifier: "admin".into(), password: "x".into() }).await.is_err());
    }
}
