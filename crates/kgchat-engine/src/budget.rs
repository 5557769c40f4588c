//! Response-size limit applied to tool payloads before they reach the model.

use std::fmt;

use kgchat_core::messages::Message;
use kgchat_core::tokens::estimate_message_tokens;

/// Default ceiling for a single tool payload.
pub const DEFAULT_MAX_RESPONSE_TOKENS: u32 = 10_000;

/// What the model should shrink when a payload is over budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetSubject {
    Query,
    Search,
}

impl fmt::Display for BudgetSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Search => "search",
        })
    }
}

/// Soft failure: the message is handed to the model as an ordinary tool result.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("ERROR: The result contained {tokens} tokens, greater than the maximum allowable of {limit}. Please try a smaller {subject}.")]
pub struct BudgetExceeded {
    pub tokens: u32,
    pub limit: u32,
    pub subject: BudgetSubject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseBudget {
    limit: u32,
}

impl ResponseBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Estimate `payload` as if it were sent as a user message and return the
    /// count, or the overflow error when it is strictly above the limit.
    pub fn check(&self, payload: &str, subject: BudgetSubject) -> Result<u32, BudgetExceeded> {
        let tokens = estimate_message_tokens(&Message::user_text(payload));
        if tokens > self.limit {
            return Err(BudgetExceeded {
                tokens,
                limit: self.limit,
                subject,
            });
        }
        Ok(tokens)
    }
}

impl Default for ResponseBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESPONSE_TOKENS)
    }
}
