//! Redis quota store implementation.
//!
//! Layout per user: a string key for the global counter, one hash for the
//! per-context counters (field = post id), and membership in the tracked
//! users set. Multi-key writes go through `MULTI/EXEC` pipelines; usage
//! commits go through a Lua script so the counter check and the writes are
//! one atomic step across every process sharing the store.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, error};

use watchtime_core::error::{AppError, ErrorKind};
use watchtime_core::result::AppResult;
use watchtime_core::traits::store::{CommitOutcome, ContextUsage, QuotaStore, UsageCommit};
use watchtime_core::types::{PostId, UserId};

use super::client::RedisClient;
use crate::keys;

/// Lua script for a conditional usage commit.
///
/// KEYS[1] = global counter
/// KEYS[2] = per-context hash
/// KEYS[3] = tracked users set
/// ARGV[1] = user id
/// ARGV[2] = expected global value
/// ARGV[3] = new global value, or -1 to leave it
/// ARGV[4] = number of (post, expected) pairs that follow
/// then the expected pairs, then (post, delta) pairs
///
/// Returns:
///   1 = applied
///   0 = a counter moved since it was read; nothing written
const COMMIT_SCRIPT: &str = r#"
    local global_key = KEYS[1]
    local posts_key = KEYS[2]
    local users_key = KEYS[3]
    local expected_global = tonumber(ARGV[2])
    local new_global = tonumber(ARGV[3])
    local checks = tonumber(ARGV[4])

    if tonumber(redis.call('GET', global_key) or '0') ~= expected_global then
        return 0
    end

    local i = 5
    for _ = 1, checks do
        local current = tonumber(redis.call('HGET', posts_key, ARGV[i]) or '0')
        if current ~= tonumber(ARGV[i + 1]) then
            return 0
        end
        i = i + 2
    end

    while i + 1 <= #ARGV do
        redis.call('HINCRBY', posts_key, ARGV[i], ARGV[i + 1])
        i = i + 2
    end

    if new_global >= 0 then
        redis.call('SET', global_key, new_global)
    end
    redis.call('SADD', users_key, ARGV[1])
    return 1
"#;

/// Flattens a commit into `COMMIT_SCRIPT` arguments.
fn commit_args(user: UserId, commit: &UsageCommit) -> Vec<i64> {
    let as_arg = |v: u64| i64::try_from(v).unwrap_or(i64::MAX);
    let mut args = vec![
        as_arg(user.get()),
        as_arg(commit.expected_global),
        commit.global_seconds.map(as_arg).unwrap_or(-1),
        as_arg(commit.expected_contexts.len() as u64),
    ];
    for (post, expected) in &commit.expected_contexts {
        args.extend([as_arg(post.get()), as_arg(*expected)]);
    }
    for (post, delta) in commit.context_deltas.iter().filter(|(_, d)| *d > 0) {
        args.extend([as_arg(post.get()), as_arg(*delta)]);
    }
    args
}

/// Redis-backed quota store.
#[derive(Debug, Clone)]
pub struct RedisQuotaStore {
    /// Redis client.
    client: RedisClient,
}

impl RedisQuotaStore {
    /// Create a new Redis quota store.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::StoreUnavailable, format!("Redis error: {e}"), e)
    }

    fn global_key(&self, user: UserId) -> String {
        self.client.prefixed_key(&keys::global_consumed(user))
    }

    fn posts_key(&self, user: UserId) -> String {
        self.client.prefixed_key(&keys::context_consumed(user))
    }

    fn users_key(&self) -> String {
        self.client.prefixed_key(&keys::tracked_users())
    }
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    async fn get(&self, user: UserId, post: PostId) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let value: Option<u64> = conn
            .hget(self.posts_key(user), post.get())
            .await
            .map_err(Self::map_err)?;
        Ok(value.unwrap_or(0))
    }

    async fn get_global(&self, user: UserId) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let value: Option<u64> = conn
            .get(self.global_key(user))
            .await
            .map_err(Self::map_err)?;
        Ok(value.unwrap_or(0))
    }

    async fn increment(&self, user: UserId, post: PostId, delta: u64) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let (value,): (u64,) = redis::pipe()
            .atomic()
            .hincr(self.posts_key(user), post.get(), delta)
            .sadd(self.users_key(), user.get())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(value)
    }

    async fn increment_global(&self, user: UserId, delta: u64) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let (value,): (u64,) = redis::pipe()
            .atomic()
            .incr(self.global_key(user), delta)
            .sadd(self.users_key(), user.get())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(value)
    }

    async fn set_global(&self, user: UserId, seconds: u64) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        redis::pipe()
            .atomic()
            .set(self.global_key(user), seconds)
            .ignore()
            .sadd(self.users_key(), user.get())
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(Self::map_err)
    }

    async fn commit(&self, user: UserId, commit: &UsageCommit) -> AppResult<CommitOutcome> {
        if commit.is_empty() {
            return Ok(CommitOutcome::Applied);
        }

        let script = redis::Script::new(COMMIT_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation
            .key(self.global_key(user))
            .key(self.posts_key(user))
            .key(self.users_key());
        for arg in commit_args(user, commit) {
            invocation.arg(arg);
        }

        let mut conn = self.client.conn_mut();
        let result: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        match result {
            1 => {
                debug!(
                    user_id = %user,
                    contexts = commit.context_deltas.len(),
                    global = ?commit.global_seconds,
                    "Committed usage"
                );
                Ok(CommitOutcome::Applied)
            }
            0 => {
                debug!(user_id = %user, "Ledger changed since it was read");
                Ok(CommitOutcome::Conflict)
            }
            other => {
                error!(result = other, "Unexpected commit script result");
                Err(AppError::store_unavailable(format!(
                    "Unexpected commit result: {other}"
                )))
            }
        }
    }

    async fn usage_for_user(&self, user: UserId) -> AppResult<Vec<ContextUsage>> {
        let mut conn = self.client.conn_mut();
        let raw: HashMap<String, String> = conn
            .hgetall(self.posts_key(user))
            .await
            .map_err(Self::map_err)?;

        let mut usage: Vec<ContextUsage> = raw
            .into_iter()
            .filter_map(|(field, value)| {
                let post_id = field.parse::<u64>().ok().and_then(PostId::new)?;
                let seconds = value.parse::<u64>().ok().filter(|s| *s > 0)?;
                Some(ContextUsage { post_id, seconds })
            })
            .collect();
        usage.sort_by_key(|u| u.post_id);
        Ok(usage)
    }

    async fn reset_user(&self, user: UserId, posts: Option<&[PostId]>) -> AppResult<u64> {
        let posts_key = self.posts_key(user);
        let mut conn = self.client.conn_mut();

        let removed = match posts {
            None => {
                let (count,): (u64,) = redis::pipe()
                    .atomic()
                    .set(self.global_key(user), 0u64)
                    .ignore()
                    .hlen(&posts_key)
                    .del(&posts_key)
                    .ignore()
                    .query_async(&mut conn)
                    .await
                    .map_err(Self::map_err)?;
                count
            }
            Some([]) => {
                let _: () = conn
                    .set(self.global_key(user), 0u64)
                    .await
                    .map_err(Self::map_err)?;
                0
            }
            Some(posts) => {
                let fields: Vec<u64> = posts.iter().map(|p| p.get()).collect();
                let (count,): (u64,) = redis::pipe()
                    .atomic()
                    .set(self.global_key(user), 0u64)
                    .ignore()
                    .hdel(&posts_key, fields)
                    .query_async(&mut conn)
                    .await
                    .map_err(Self::map_err)?;
                count
            }
        };

        debug!(user_id = %user, removed, "Reset user ledger");
        Ok(removed)
    }

    async fn tracked_users(&self) -> AppResult<Vec<UserId>> {
        let mut conn = self.client.conn_mut();
        let members: Vec<String> = conn
            .smembers(self.users_key())
            .await
            .map_err(Self::map_err)?;

        let mut users: Vec<UserId> = members
            .iter()
            .filter_map(|m| m.parse::<u64>().ok().and_then(UserId::new))
            .collect();
        users.sort();
        Ok(users)
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
