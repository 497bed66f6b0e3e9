/// Display-only classification of a failed generation, derived from the
/// rendered error text. Classification never changes behavior; there are no
/// automatic retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    AuthRejected,
    ModelUnavailable,
    Other,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => "rate_limited",
            FailureKind::AuthRejected => "auth_rejected",
            FailureKind::ModelUnavailable => "model_unavailable",
            FailureKind::Other => "other",
        }
    }
}

/// Substring sniffing over the provider's error message, checked in order.
/// The `model`/`404` check is a documented fuzzy heuristic, not a precision
/// guarantee.
pub fn classify_failure(message: &str) -> FailureKind {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("rate limit") || lowered.contains("429") {
        return FailureKind::RateLimited;
    }
    if lowered.contains("authorization") || lowered.contains("401") || lowered.contains("403") {
        return FailureKind::AuthRejected;
    }
    if lowered.contains("model") || lowered.contains("404") {
        return FailureKind::ModelUnavailable;
    }
    FailureKind::Other
}

pub fn failure_hint(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::RateLimited => {
            "Rate limit reached. The free tier has usage limits; try again in a few minutes."
        }
        FailureKind::AuthRejected => {
            "Authentication failed. Check that the API token is set and has write permissions; read-only tokens do not work for the inference API."
        }
        FailureKind::ModelUnavailable => {
            "Model not found or unavailable. Try an alternative model."
        }
        FailureKind::Other => {
            "Generation failed. Try again with a different prompt or check your connection."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_failure, failure_hint, FailureKind};

    #[test]
    fn classifies_rate_limits_first() {
        assert_eq!(
            classify_failure("Rate limit exceeded for model flux"),
            FailureKind::RateLimited
        );
        assert_eq!(
            classify_failure("HTTP 429: too many requests"),
            FailureKind::RateLimited
        );
    }

    #[test]
    fn classifies_auth_failures() {
        assert_eq!(
            classify_failure("Authorization header is invalid"),
            FailureKind::AuthRejected
        );
        assert_eq!(
            classify_failure("request failed (401): unauthorized"),
            FailureKind::AuthRejected
        );
        assert_eq!(
            classify_failure("request failed (403): forbidden"),
            FailureKind::AuthRejected
        );
    }

    #[test]
    fn classifies_missing_models() {
        assert_eq!(
            classify_failure("Model black-forest-labs/unknown does not exist"),
            FailureKind::ModelUnavailable
        );
        assert_eq!(
            classify_failure("request failed (404): not found"),
            FailureKind::ModelUnavailable
        );
    }

    #[test]
    fn model_sniffing_is_fuzzy_by_design() {
        // Any mention of "model" wins over a generic classification.
        assert_eq!(
            classify_failure("the model is warming up"),
            FailureKind::ModelUnavailable
        );
    }

    #[test]
    fn falls_back_to_other() {
        assert_eq!(
            classify_failure("connection reset by peer"),
            FailureKind::Other
        );
    }

    #[test]
    fn every_kind_has_a_hint() {
        for kind in [
            FailureKind::RateLimited,
            FailureKind::AuthRejected,
            FailureKind::ModelUnavailable,
            FailureKind::Other,
        ] {
            assert!(!failure_hint(kind).is_empty());
            assert!(!kind.as_str().is_empty());
        }
    }
}
