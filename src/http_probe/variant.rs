use std::fmt;

/// One of the four `Accept-Encoding` presentations sent to every URL.
///
/// The names follow the browsers that send each form: Firefox sends no
/// header on range requests, Chrome sends the long identity form, Safari the
/// short one, and Edge advertises real encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    AcceptNone,
    AcceptIdentityLong,
    AcceptIdentity,
    AcceptEncoding,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::AcceptNone,
        Variant::AcceptIdentityLong,
        Variant::AcceptIdentity,
        Variant::AcceptEncoding,
    ];

    /// The `Accept-Encoding` value to send, or `None` to omit the header.
    pub fn accept_encoding(self) -> Option<&'static str> {
        match self {
            Variant::AcceptNone => None,
            Variant::AcceptIdentityLong => Some("identity;q=1, *;q=0"),
            Variant::AcceptIdentity => Some("identity"),
            Variant::AcceptEncoding => Some("gzip, deflate, br"),
        }
    }

    /// Field name of this variant's slot in the NDJSON wire format.
    pub fn key(self) -> &'static str {
        match self {
            Variant::AcceptNone => "acceptNone",
            Variant::AcceptIdentityLong => "acceptIdentityLong",
            Variant::AcceptIdentity => "acceptIdentity",
            Variant::AcceptEncoding => "acceptEncoding",
        }
    }

    /// Whether the variant asks the server for an unencoded body.
    pub fn requests_identity(self) -> bool {
        matches!(self, Variant::AcceptIdentityLong | Variant::AcceptIdentity)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_accept_none_omits_the_header() {
        let omitted: Vec<_> = Variant::ALL
            .iter()
            .filter(|v| v.accept_encoding().is_none())
            .collect();
        assert_eq!(omitted, vec![&Variant::AcceptNone]);
    }

    #[test]
    fn test_identity_variants() {
        assert!(Variant::AcceptIdentityLong.requests_identity());
        assert!(Variant::AcceptIdentity.requests_identity());
        assert!(!Variant::AcceptNone.requests_identity());
        assert!(!Variant::AcceptEncoding.requests_identity());
    }
}
