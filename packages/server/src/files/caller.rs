use common::AccessLevel;

/// Identity value with elevated privileges.
pub const ROOT_IDENTITY: &str = "root";

/// Who is making a request.
///
/// The identity is an opaque, unverified string. An empty value is the same
/// as no value at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Identified(String),
}

impl Caller {
    /// Build a caller from a raw identity value. Empty means anonymous; no
    /// other normalization is applied.
    pub fn new(identity: Option<&str>) -> Self {
        match identity {
            Some(id) if !id.is_empty() => Caller::Identified(id.to_string()),
            _ => Caller::Anonymous,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::Identified(id) => Some(id),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id() == Some(ROOT_IDENTITY)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous)
    }
}

/// Whether `caller` may see a file with the given level and owner.
///
/// - public: everyone, anonymous included
/// - internal: any identified caller, owner or not
/// - private: the owner and root only
///
/// [`super::FileStore`] expresses the same rule as a SQL condition; the two
/// are kept in agreement by the metadata integration tests.
pub fn is_visible(access_level: AccessLevel, owner: &str, caller: &Caller) -> bool {
    match (access_level, caller) {
        (AccessLevel::Public, _) => true,
        (_, Caller::Anonymous) => false,
        (AccessLevel::Internal, Caller::Identified(_)) => true,
        (AccessLevel::Private, Caller::Identified(id)) => id == owner || id == ROOT_IDENTITY,
    }
}
