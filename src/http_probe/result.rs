use serde::{Deserialize, Serialize};

use super::variant::Variant;

/// Outcome of one (URL, variant) request.
///
/// On the wire a response is `{"status": 206, "encoding": ""}` and a failure
/// is exactly `{"err": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireVariant", into = "WireVariant")]
pub enum VariantResult {
    Response { status: u16, encoding: String },
    Failed,
}

impl VariantResult {
    pub fn response(status: u16, encoding: impl Into<String>) -> Self {
        VariantResult::Response {
            status,
            encoding: encoding.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            VariantResult::Response { status, .. } => Some(*status),
            VariantResult::Failed => None,
        }
    }

    /// The negotiated `Content-Encoding`, empty when none was sent or the request failed.
    pub fn encoding(&self) -> &str {
        match self {
            VariantResult::Response { encoding, .. } => encoding,
            VariantResult::Failed => "",
        }
    }

    pub fn is_partial_content(&self) -> bool {
        self.status() == Some(206)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, VariantResult::Failed)
    }
}

#[derive(Serialize, Deserialize)]
struct WireVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    err: Option<bool>,
}

impl TryFrom<WireVariant> for VariantResult {
    type Error = String;

    fn try_from(wire: WireVariant) -> Result<Self, Self::Error> {
        match (wire.err, wire.status) {
            (Some(true), _) => Ok(VariantResult::Failed),
            (_, Some(status)) => Ok(VariantResult::Response {
                status,
                encoding: wire.encoding.unwrap_or_default(),
            }),
            _ => Err("variant result has neither `status` nor `err: true`".to_string()),
        }
    }
}

impl From<VariantResult> for WireVariant {
    fn from(result: VariantResult) -> Self {
        match result {
            VariantResult::Response { status, encoding } => WireVariant {
                status: Some(status),
                encoding: Some(encoding),
                err: None,
            },
            VariantResult::Failed => WireVariant {
                status: None,
                encoding: None,
                err: Some(true),
            },
        }
    }
}

/// One URL's full probe outcome: all four variant slots, always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeRecord {
    /// The input URL exactly as supplied.
    pub url: String,
    pub accept_none: VariantResult,
    pub accept_identity_long: VariantResult,
    pub accept_identity: VariantResult,
    pub accept_encoding: VariantResult,
}

impl ProbeRecord {
    pub fn get(&self, variant: Variant) -> &VariantResult {
        match variant {
            Variant::AcceptNone => &self.accept_none,
            Variant::AcceptIdentityLong => &self.accept_identity_long,
            Variant::AcceptIdentity => &self.accept_identity,
            Variant::AcceptEncoding => &self.accept_encoding,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = (Variant, &VariantResult)> {
        Variant::ALL.into_iter().map(move |v| (v, self.get(v)))
    }

    pub fn any_partial_content(&self) -> bool {
        self.slots().any(|(_, r)| r.is_partial_content())
    }

    /// A record with every slot failed, used when a URL cannot be requested at all.
    pub fn all_failed(url: impl Into<String>) -> Self {
        ProbeRecord {
            url: url.into(),
            accept_none: VariantResult::Failed,
            accept_identity_long: VariantResult::Failed,
            accept_identity: VariantResult::Failed,
            accept_encoding: VariantResult::Failed,
        }
    }
}
