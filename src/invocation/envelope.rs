// Response envelope returned to the invoking host

use serde::{Deserialize, Serialize};

/// `{statusCode, body}` result of a single invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub body: String,
}

impl ResponseEnvelope {
    pub const fn ok(body: String) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }
}
