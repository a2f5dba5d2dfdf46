//! Read-only quota snapshots for polling clients.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use watchtime_core::result::AppResult;
use watchtime_core::traits::store::QuotaStore;
use watchtime_core::types::{ContentContext, ContextSnapshot, QuotaSnapshot, UserId};

use super::resolver::LimitResolver;

/// Answer to a status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    /// The global ledger.
    pub global: QuotaSnapshot,
    /// The context ledger, when the context names a counter post.
    pub context: Option<ContextSnapshot>,
    /// Correlation key of the queried context (may be empty).
    pub context_key: String,
}

/// Builds snapshots from current store reads.
#[derive(Debug, Clone)]
pub struct StatusBuilder {
    store: Arc<dyn QuotaStore>,
    resolver: Arc<LimitResolver>,
}

impl StatusBuilder {
    /// Creates a new status builder.
    pub fn new(store: Arc<dyn QuotaStore>, resolver: Arc<LimitResolver>) -> Self {
        Self { store, resolver }
    }

    /// Status for a caller; anonymous callers get zero snapshots.
    pub async fn status(&self, user: Option<UserId>, context: &ContentContext) -> AppResult<StatusView> {
        let Some(user) = user else {
            return Ok(Self::anonymous(context));
        };

        Ok(StatusView {
            global: self.global(user).await?,
            context: self.context(user, context).await?,
            context_key: context.context_key(),
        })
    }

    /// The user's global snapshot.
    pub async fn global(&self, user: UserId) -> AppResult<QuotaSnapshot> {
        let limit = self.resolver.resolve_global(user).await?;
        let consumed = self.store.get_global(user).await?;
        Ok(QuotaSnapshot::new(limit, consumed))
    }

    /// The user's snapshot for one context, `None` without a counter post.
    pub async fn context(
        &self,
        user: UserId,
        context: &ContentContext,
    ) -> AppResult<Option<ContextSnapshot>> {
        let Some(post) = context.counter_post() else {
            return Ok(None);
        };
        let limit = self.resolver.resolve(user, context).await?;
        let consumed = self.store.get(user, post).await?;
        Ok(Some(ContextSnapshot::new(
            QuotaSnapshot::new(limit, consumed),
            context,
        )))
    }

    /// Zero, unenforced snapshots for a caller without identity.
    pub fn anonymous(context: &ContentContext) -> StatusView {
        StatusView {
            global: QuotaSnapshot::default(),
            context: context
                .counter_post()
                .map(|_| ContextSnapshot::new(QuotaSnapshot::default(), context)),
            context_key: context.context_key(),
        }
    }
}
