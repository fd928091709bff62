//! # Process Lifecycle Commands
//!
//! The small command family the UI shell uses to introspect and stop the
//! agent process.

use tracing::info;

use crate::error::{respond, CommandResponse};
use crate::state::ConfigState;
use crate::AppContext;

/// True when no remote endpoint is configured: every write stays local
/// until a real backend exists, and the sync panel should say so.
pub async fn is_offline(config: &ConfigState) -> CommandResponse<bool> {
    CommandResponse::ok(config.offline)
}

/// The agent's semantic version.
pub async fn get_version() -> CommandResponse<String> {
    CommandResponse::ok(env!("CARGO_PKG_VERSION").to_string())
}

/// Requests a graceful shutdown: the run loop drains, closes the store,
/// and exits. The response goes out before the process stops.
pub async fn quit(ctx: &AppContext) -> CommandResponse<()> {
    info!("Quit requested");

    respond(
        async {
            ctx.request_shutdown();
            Ok(())
        }
        .await,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use depot_db::{Database, DbConfig};
    use depot_sync::SyncConfig;
    use std::path::PathBuf;
    use std::time::Duration;

    async fn test_context() -> AppContext {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppContext::new(db, SyncConfig::default(), PathBuf::from("."))
    }

    #[tokio::test]
    async fn test_is_offline_defaults_to_true() {
        let ctx = test_context().await;
        let res = is_offline(&ctx.config).await;
        assert!(res.success);
        assert_eq!(res.data, Some(true));
    }

    #[tokio::test]
    async fn test_get_version_is_nonempty() {
        let res = get_version().await;
        assert!(res.success);
        assert!(!res.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quit_signals_shutdown() {
        let ctx = test_context().await;

        let res = quit(&ctx).await;
        assert!(res.success);

        // The run loop's wait resolves promptly once quit has fired.
        tokio::time::timeout(Duration::from_secs(1), ctx.shutdown_requested())
            .await
            .expect("shutdown was not signalled");
    }
}
