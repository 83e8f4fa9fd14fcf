//! Budget ledger: per-tenant monthly LLM usage counters in Redis.
//!
//! Counters expire ~31 days after their first increment, so stale months
//! self-clear without a reset job. The budget check and the model call are
//! not atomic with each other; concurrent screenings can both pass the
//! check. Accepted soft limit.

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::errors::AppError;

const MONTH_TTL_SECS: i64 = 60 * 60 * 24 * 31;

#[derive(Clone)]
pub struct BudgetLedger {
    conn: MultiplexedConnection,
}

impl BudgetLedger {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// True while the tenant's call count for the current month is below the
    /// quota. An absent counter means no usage yet, so budget remains.
    pub async fn has_remaining_budget(
        &self,
        tenant_id: Uuid,
        monthly_quota: i64,
    ) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        let current: Option<i64> = conn.get(calls_key(tenant_id)).await?;
        Ok(budget_remains(current, monthly_quota))
    }

    /// Increments the call counter and the token counter for the tenant's
    /// current month. Called after every model invocation, including ones
    /// whose output later fails parsing.
    pub async fn record_usage(&self, tenant_id: Uuid, tokens: i64) -> Result<(), AppError> {
        let mut conn = self.conn.clone();

        let calls = calls_key(tenant_id);
        let _: () = redis::pipe()
            .atomic()
            .incr(&calls, 1)
            .ignore()
            .expire(&calls, MONTH_TTL_SECS)
            .ignore()
            .query_async(&mut conn)
            .await?;

        let tokens_key = tokens_key(tenant_id);
        let _: () = redis::pipe()
            .atomic()
            .incr(&tokens_key, tokens)
            .ignore()
            .expire(&tokens_key, MONTH_TTL_SECS)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}

/// Quota comparison for the monthly call counter. An absent counter means no
/// usage this month; a counter at or past the quota means exhausted.
pub fn budget_remains(current: Option<i64>, monthly_quota: i64) -> bool {
    current.map_or(true, |count| count < monthly_quota)
}

fn calls_key(tenant_id: Uuid) -> String {
    format!("tenant:{tenant_id}:llm_calls_month")
}

fn tokens_key(tenant_id: Uuid) -> String {
    format!("tenant:{tenant_id}:tokens_month")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_counter_means_budget_remains() {
        assert!(budget_remains(None, 1000));
    }

    #[test]
    fn test_budget_remains_below_quota() {
        assert!(budget_remains(Some(999), 1000));
        assert!(budget_remains(Some(0), 1));
    }

    #[test]
    fn test_budget_exhausted_at_quota() {
        assert!(!budget_remains(Some(1000), 1000));
        assert!(!budget_remains(Some(1001), 1000));
    }

    #[test]
    fn test_counter_keys_namespaced_by_tenant() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(calls_key(a), calls_key(b));
        assert_ne!(tokens_key(a), tokens_key(b));
        assert_ne!(calls_key(a), tokens_key(a));
    }
}
