//! One-shot notices carried across a redirect.

use tower_sessions::Session;

use crate::models::session::keys;

/// Store a notice for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_notice(
    session: &Session,
    notice: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::NOTICE, notice).await
}

/// Take the pending notice, if any. Reading it removes it.
///
/// A broken session store only loses the notice; the page still renders.
pub async fn take_notice(session: &Session) -> Option<String> {
    match session.remove::<String>(keys::NOTICE).await {
        Ok(notice) => notice,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read notice from session");
            None
        }
    }
}
