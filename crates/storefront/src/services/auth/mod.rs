//! Authentication service.
//!
//! Registration, password login, profile updates and the first-run admin
//! account. Passwords are stored as Argon2id PHC strings.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distr::Alphanumeric};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use stockroom_core::{UserId, Username};

use crate::config::BootstrapConfig;
use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::{NewUser, ProfileUpdate, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of generated admin passwords.
const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Submitted profile form.
#[derive(Debug, Clone, Copy)]
pub struct ProfileChange<'a> {
    /// Desired username.
    pub username: &'a str,
    /// Desired display name.
    pub name: &'a str,
    /// Current password, always required.
    pub current_password: &'a str,
    /// New password; blank keeps the current one.
    pub new_password: &'a str,
}

/// Result of [`AuthService::ensure_admin`] when an account was created.
#[derive(Debug)]
pub struct BootstrappedAdmin {
    /// The new admin.
    pub user: User,
    /// The password, when it was generated rather than configured.
    pub generated_password: Option<SecretString>,
}

/// Authentication service.
pub struct AuthService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Register a customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if username or password is blank,
    /// `AuthError::InvalidUsername` or `AuthError::WeakPassword` for invalid
    /// input, and `AuthError::UserAlreadyExists` for a taken username.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields(
                "Username and password are required.",
            ));
        }
        self.create_user(username, name, password, false).await
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    #[instrument(skip_all, fields(username = %username))]
    pub async fn create_admin(
        &self,
        username: &str,
        name: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.create_user(username, name, password, true).await
    }

    async fn create_user(
        &self,
        username: &str,
        name: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let mut uow = self.store.begin().await?;
        let user = uow
            .insert_user(NewUser {
                username: &username,
                name: name.trim(),
                password_hash: &password_hash,
                is_admin,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, is_admin, "User created");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username is unknown or
    /// the password is wrong.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let credentials = match Username::parse(username) {
            Ok(username) => {
                let mut uow = self.store.begin().await?;
                uow.find_credentials(&username).await?
            }
            Err(_) => None,
        };
        let Some(credentials) = credentials else {
            // Unknown users cost one Argon2 verification too.
            burn_verification(password);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &credentials.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(credentials.user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn find_user(&self, id: UserId) -> Result<Option<User>, AuthError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.find_user(id).await?)
    }

    /// Update username, name and optionally password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if username or current password is
    /// blank, `AuthError::IncorrectPassword` if the current password does not
    /// verify, and `AuthError::UsernameTaken` if another account owns the
    /// username.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        change: ProfileChange<'_>,
    ) -> Result<User, AuthError> {
        if change.username.trim().is_empty() || change.current_password.is_empty() {
            return Err(AuthError::MissingFields(
                "Username and current password are required.",
            ));
        }
        let username = Username::parse(change.username)?;
        let new_hash = if change.new_password.is_empty() {
            None
        } else {
            validate_password(change.new_password)?;
            Some(hash_password(change.new_password)?)
        };

        let mut uow = self.store.begin().await?;
        let credentials = uow
            .find_credentials_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(change.current_password, &credentials.password_hash)
            .map_err(|_| AuthError::IncorrectPassword)?;

        let user = uow
            .update_profile(
                user_id,
                ProfileUpdate {
                    username: &username,
                    name: change.name.trim(),
                    password_hash: new_hash.as_deref(),
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;
        uow.commit().await?;

        tracing::info!(password_changed = new_hash.is_some(), "Profile updated");
        Ok(user)
    }

    /// Create the first admin account if none exists.
    ///
    /// Uses the configured password, or generates one that the caller must
    /// show to the operator.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the lookup or account creation fails, including
    /// a configured password that is too short.
    pub async fn ensure_admin(
        &self,
        bootstrap: &BootstrapConfig,
    ) -> Result<Option<BootstrappedAdmin>, AuthError> {
        let mut uow = self.store.begin().await?;
        let exists = uow.admin_exists().await?;
        drop(uow);
        if exists {
            return Ok(None);
        }

        let (password, generated_password) = match &bootstrap.admin_password {
            Some(password) => (password.clone(), None),
            None => {
                let password = generate_password();
                (password.clone(), Some(password))
            }
        };

        let user = self
            .create_admin(&bootstrap.admin_username, "", password.expose_secret())
            .await?;

        Ok(Some(BootstrappedAdmin {
            user,
            generated_password,
        }))
    }
}

/// Generate a random alphanumeric password.
#[must_use]
pub fn generate_password() -> SecretString {
    let password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect();
    SecretString::from(password)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters."
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Hash checked when the username does not exist.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("stockroom-unknown-user").ok());

/// Run a verification against [`DUMMY_HASH`] and discard the result.
fn burn_verification(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn dummy_hash_is_verifiable() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(hash).is_ok());
        assert!(verify_password("stockroom-unknown-user", hash).is_ok());
        assert!(verify_password("anything-else", hash).is_err());
    }

    #[tokio::test]
    async fn unknown_and_malformed_usernames_fail_like_wrong_passwords() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        assert!(matches!(
            auth.login("nobody", "s3cret-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("has space", "s3cret-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong horse", &hash).is_err());
    }

    #[test]
    fn generated_passwords_are_long_and_distinct() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.expose_secret().len(), GENERATED_PASSWORD_LENGTH);
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[tokio::test]
    async fn register_then_login() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth.register("alice", "s3cret-pass", "Alice").await.unwrap();
        assert!(!user.is_admin);

        let logged_in = auth.login("alice", "s3cret-pass").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn register_requires_username_and_password() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let err = auth.register("", "whatever1", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Username and password are required.");
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        auth.register("alice", "s3cret-pass", "").await.unwrap();
        let err = auth.register("alice", "other-pass", "").await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(err.to_string(), "Username already exists.");
    }

    #[tokio::test]
    async fn login_rejects_wrong_password_and_unknown_user() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register("alice", "s3cret-pass", "").await.unwrap();

        assert!(matches!(
            auth.login("alice", "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("bob", "s3cret-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn profile_update_checks_current_password() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register("alice", "s3cret-pass", "").await.unwrap();

        let err = auth
            .update_profile(
                user.id,
                ProfileChange {
                    username: "alice",
                    name: "Alice",
                    current_password: "wrong-pass",
                    new_password: "",
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword));
    }

    #[tokio::test]
    async fn profile_update_renames_and_changes_password() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register("alice", "s3cret-pass", "").await.unwrap();

        let updated = auth
            .update_profile(
                user.id,
                ProfileChange {
                    username: "alice2",
                    name: "Alice Liddell",
                    current_password: "s3cret-pass",
                    new_password: "new-s3cret",
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username.as_str(), "alice2");
        assert_eq!(updated.name, "Alice Liddell");

        assert!(auth.login("alice2", "new-s3cret").await.is_ok());
        assert!(auth.login("alice2", "s3cret-pass").await.is_err());
    }

    #[tokio::test]
    async fn profile_update_rejects_taken_username() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register("bob", "s3cret-pass", "").await.unwrap();
        let alice = auth.register("alice", "s3cret-pass", "").await.unwrap();

        let err = auth
            .update_profile(
                alice.id,
                ProfileChange {
                    username: "bob",
                    name: "",
                    current_password: "s3cret-pass",
                    new_password: "",
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[tokio::test]
    async fn ensure_admin_runs_once() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let bootstrap = BootstrapConfig::default();

        let created = auth.ensure_admin(&bootstrap).await.unwrap().unwrap();
        assert!(created.user.is_admin);
        assert_eq!(created.user.username.as_str(), "admin");
        let password = created.generated_password.unwrap();
        assert!(auth.login("admin", password.expose_secret()).await.is_ok());

        assert!(auth.ensure_admin(&bootstrap).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ensure_admin_uses_configured_password() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let bootstrap = BootstrapConfig {
            admin_username: "root".to_string(),
            admin_password: Some(SecretString::from("configured-pass")),
        };

        let created = auth.ensure_admin(&bootstrap).await.unwrap().unwrap();
        assert!(created.generated_password.is_none());
        assert!(auth.login("root", "configured-pass").await.is_ok());
    }
}
