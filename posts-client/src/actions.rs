//! Wiring from menu selections to provider mutations.

use crate::provider::{PostsProvider, ProviderError};
use crate::store::SyncStore;
use postsync_core::PostAction;
use postsync_types::Post;

/// Run the provider operation behind `action`. `Cancel` does nothing.
pub async fn dispatch<S: SyncStore + 'static>(
    provider: &PostsProvider<S>,
    post: &Post,
    action: PostAction,
) -> Result<(), ProviderError> {
    match action {
        PostAction::Delete => provider.delete(post).await,
        PostAction::SetStatus(status) => provider.set_status(post, status).await,
        PostAction::Cancel => Ok(()),
    }
}
