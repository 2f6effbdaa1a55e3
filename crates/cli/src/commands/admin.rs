//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! STOCKROOM_NEW_ADMIN_PASSWORD=... stockroom admin create -u alice -n "Alice"
//! ```
//!
//! Without `STOCKROOM_NEW_ADMIN_PASSWORD` a password is generated and printed
//! once.

use secrecy::{ExposeSecret, SecretString};

use stockroom_core::UserId;
use stockroom_storefront::db::PgStore;
use stockroom_storefront::services::auth::{AuthService, generate_password};

use super::{CommandError, connect};

/// Create a new admin user and return its ID.
pub async fn create_user(username: &str, name: &str) -> Result<UserId, CommandError> {
    let store = PgStore::new(connect().await?);

    let (password, generated) = match std::env::var("STOCKROOM_NEW_ADMIN_PASSWORD") {
        Ok(password) if !password.is_empty() => (SecretString::from(password), false),
        _ => (generate_password(), true),
    };

    let user = AuthService::new(&store)
        .create_admin(username, name, password.expose_secret())
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "Admin user created");
    if generated {
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password for {}: {}", user.username, password.expose_secret());
            println!("It is not stored anywhere else; change it after the first login.");
        }
    }

    Ok(user.id)
}
