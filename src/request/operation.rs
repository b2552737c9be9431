//! Operation names, categories and protocol hints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Functional area an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Searches and object fetches.
    Query,
    /// Single-object writes.
    Data,
    /// Collection definitions.
    Schema,
    /// Node and shard status.
    Cluster,
    /// Backup and restore.
    Backup,
    /// Users, roles and permissions.
    Authorization,
    /// Server metadata, liveness and readiness.
    Meta,
    /// Bulk writes.
    Batch,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Protocol an operation would rather be sent over.
///
/// This is a hint for routing and logging; nothing in the pipeline enforces
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PreferredProtocol {
    /// Verb + URI + headers + body.
    Rest,
    /// Typed unary call over a named method.
    Grpc,
    /// No preference.
    #[default]
    Either,
}

impl PreferredProtocol {
    /// Returns `true` if a REST transport is acceptable.
    pub fn allows_rest(&self) -> bool {
        matches!(self, Self::Rest | Self::Either)
    }

    /// Returns `true` if a gRPC transport is acceptable.
    pub fn allows_grpc(&self) -> bool {
        matches!(self, Self::Grpc | Self::Either)
    }
}

impl fmt::Display for PreferredProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => write!(f, "REST"),
            Self::Grpc => write!(f, "gRPC"),
            Self::Either => write!(f, "either"),
        }
    }
}

macro_rules! operations {
    ($($variant:ident => $name:literal, $category:ident, $protocol:ident;)+) => {
        /// Well-known operations with stable names.
        ///
        /// The names are part of the public contract: interceptors route on
        /// them, tests assert on them, and logging/metrics collaborators
        /// report them. They never change between releases.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum Operation {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Operation {
            /// Every known operation.
            pub const ALL: &'static [Operation] = &[$(Operation::$variant),+];

            /// The stable operation name.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Operation::$variant => $name,)+
                }
            }

            /// The category this operation belongs to.
            pub const fn category(&self) -> Category {
                match self {
                    $(Operation::$variant => Category::$category,)+
                }
            }

            /// The protocol this operation prefers.
            pub const fn preferred_protocol(&self) -> PreferredProtocol {
                match self {
                    $(Operation::$variant => PreferredProtocol::$protocol,)+
                }
            }
        }

        impl FromStr for Operation {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Operation::$variant),)+
                    other => Err(Error::invalid_argument(format!("unknown operation {:?}", other))),
                }
            }
        }
    };
}

operations! {
    GetMeta => "GetMeta", Meta, Rest;
    Liveness => "Liveness", Meta, Rest;
    Readiness => "Readiness", Meta, Rest;
    ObjectInsert => "ObjectInsert", Data, Either;
    ObjectReplace => "ObjectReplace", Data, Rest;
    ObjectDelete => "ObjectDelete", Data, Rest;
    CollectionCreate => "CollectionCreate", Schema, Rest;
    CollectionGet => "CollectionGet", Schema, Rest;
    CollectionUpdate => "CollectionUpdate", Schema, Rest;
    CollectionDelete => "CollectionDelete", Schema, Rest;
    SearchNearText => "SearchNearText", Query, Grpc;
    SearchNearVector => "SearchNearVector", Query, Grpc;
    Bm25Search => "BM25Search", Query, Grpc;
    HybridSearch => "HybridSearch", Query, Grpc;
    FetchObjects => "FetchObjects", Query, Either;
    BatchObjects => "BatchObjects", Batch, Grpc;
    BackupCreate => "BackupCreate", Backup, Rest;
    NodesGet => "NodesGet", Cluster, Rest;
    UsersOwnInfo => "UsersOwnInfo", Authorization, Rest;
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Operation {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// The shared contract of every logical request.
///
/// A logical request describes *what* to do, independent of the wire format.
/// Implementations are immutable once constructed; concrete kinds add their
/// own payload fields on top of this contract.
///
/// Most implementations delegate to an [`Operation`] through
/// [`LogicalRequest::operation`]; requests outside the well-known set override
/// the three accessors directly.
pub trait LogicalRequest: fmt::Debug + Send + Sync + 'static {
    /// The well-known operation this request performs, if it has one.
    fn operation(&self) -> Option<Operation> {
        None
    }

    /// Stable identifier used for interceptor routing and test matching.
    fn operation_name(&self) -> &str {
        self.operation().map_or("Unknown", |op| op.as_str())
    }

    /// Functional category of the request.
    fn category(&self) -> Category {
        self.operation().map_or(Category::Meta, |op| op.category())
    }

    /// Protocol hint for the request.
    fn preferred_protocol(&self) -> PreferredProtocol {
        self.operation().map_or(PreferredProtocol::Either, |op| op.preferred_protocol())
    }
}
