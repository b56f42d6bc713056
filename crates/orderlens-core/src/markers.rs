use crate::models::OrderStatus;

/// Substring rules that classify stage labels into terminal markers.
///
/// A stage label is a cancellation stage when it contains the cancellation
/// token, and a delivery stage when it contains the delivery token. Both
/// tokens match case-insensitively; the cancellation token wins when a label
/// happens to contain both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRules {
    /// Lowercased cancellation token.
    cancel_token: String,
    /// Lowercased delivery token.
    deliver_token: String,
}

impl Default for MarkerRules {
    fn default() -> Self {
        Self::new("Cancel", "Deliver")
    }
}

impl MarkerRules {
    /// Build rules from the given tokens. Tokens are stored lowercased so
    /// that matching stays case-insensitive regardless of how they were
    /// spelled by the caller.
    pub fn new(cancel_token: &str, deliver_token: &str) -> Self {
        Self {
            cancel_token: cancel_token.to_lowercase(),
            deliver_token: deliver_token.to_lowercase(),
        }
    }

    /// The lowercased cancellation token in effect.
    pub fn cancel_token(&self) -> &str {
        &self.cancel_token
    }

    /// The lowercased delivery token in effect.
    pub fn deliver_token(&self) -> &str {
        &self.deliver_token
    }

    /// Whether `stage` names a cancellation event.
    pub fn is_cancellation(&self, stage: &str) -> bool {
        stage.to_lowercase().contains(&self.cancel_token)
    }

    /// Whether `stage` names a delivery event.
    pub fn is_delivery(&self, stage: &str) -> bool {
        stage.to_lowercase().contains(&self.deliver_token)
    }

    /// Classify the stage of a case's final event into an [`OrderStatus`].
    pub fn classify(&self, stage: &str) -> OrderStatus {
        if self.is_cancellation(stage) {
            OrderStatus::Canceled
        } else if self.is_delivery(stage) {
            OrderStatus::Delivered
        } else {
            OrderStatus::InProgress
        }
    }
}
