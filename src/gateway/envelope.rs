use serde::{Deserialize, Serialize};

/// Uniform reply to every gateway command.
///
/// `message` is operation dependent: a JSON array for list commands, a pid
/// for `run_default`/`get_status`, status text otherwise, and the error text
/// when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub success: bool,
    pub message: String,
}

impl CommandEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_string(&CommandEnvelope::fail("nope")).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"nope"}"#);
    }
}
