use tracing::{info, warn};

use crate::errors::AuthError;
use crate::models::Operator;
use crate::store::AttendanceStore;

/// Single equality lookup of the credential pair. Holding the returned
/// `Operator` is what it means to be signed in.
pub async fn authenticate(
    store: &dyn AttendanceStore,
    username: &str,
    password: &str,
) -> Result<Operator, AuthError> {
    match store.find_operator(username, password).await {
        Ok(Some(operator)) => {
            info!(username = %operator.username, "operator signed in");
            Ok(operator)
        }
        Ok(None) => {
            warn!(username, "sign-in rejected");
            Err(AuthError::Rejected)
        }
        Err(err) => {
            warn!(username, error = %err, "sign-in lookup failed");
            Err(AuthError::Rejected)
        }
    }
}
