use crate::db::error::StoreError;
use tokio_util::sync::CancellationToken;

pub mod planning;
pub mod query;
pub mod refs;
pub mod title;

pub(crate) fn ensure_live(cancel: &CancellationToken) -> Result<(), StoreError> {
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    Ok(())
}
