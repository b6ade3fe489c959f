//! Domain separation for grant signatures
//!
//! Every grant is signed under a domain separator that names the protocol,
//! a scheme version, and the ledger deployment the grant is meant for. A
//! signature fished out of one deployment therefore recovers garbage when
//! replayed against another. Two schemes exist as tagged protocol versions
//! and a ledger pins exactly one of them at construction; grants carrying
//! the other scheme are rejected before any signature work happens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::typed;
use crate::types::{Address, Salt};
use crate::{CoreError, Result};

/// Protocol name bound into every domain separator
pub const DOMAIN_NAME: &str = "LastSecret";

/// Version string of the salted scheme
pub const VERSION_SALTED: &str = "1";

/// Version string of the tagged scheme
pub const VERSION_TAGGED: &str = "2";

/// Fixed deployment tag carried by the tagged scheme's `owner` field
pub const OWNER_TAG: &str = "lastsecret";

/// Domain type declaration of the salted scheme. Field order is wire
/// contract; changing it invalidates all issued grants.
const SALTED_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract,bytes32 salt)";

/// Domain type declaration of the tagged scheme
const TAGGED_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,address verifyingContract,string owner)";

/// The two replay-resistance strategies, versioned at the domain layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainScheme {
    /// Version "1": a fresh 256-bit salt and the chain id are bound into
    /// the domain of every grant
    SaltedV1,
    /// Version "2": no salt and no chain id; the domain carries a fixed
    /// deployment tag instead. A grant under this scheme works from any
    /// chain for the whole of its window. Weaker than the salted scheme,
    /// and kept that way: hosts wanting tighter replay bounds pin v1.
    TaggedV2,
}

impl DomainScheme {
    /// The version string hashed into domain separators of this scheme
    pub fn version(&self) -> &'static str {
        match self {
            DomainScheme::SaltedV1 => VERSION_SALTED,
            DomainScheme::TaggedV2 => VERSION_TAGGED,
        }
    }

    /// Whether grants under this scheme carry a per-grant salt
    pub fn salted(&self) -> bool {
        matches!(self, DomainScheme::SaltedV1)
    }
}

impl fmt::Display for DomainScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainScheme::SaltedV1 => write!(f, "salted-v1"),
            DomainScheme::TaggedV2 => write!(f, "tagged-v2"),
        }
    }
}

impl FromStr for DomainScheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "salted-v1" | "v1" | "1" => Ok(DomainScheme::SaltedV1),
            "tagged-v2" | "v2" | "2" => Ok(DomainScheme::TaggedV2),
            other => Err(CoreError::UnknownScheme(other.to_string())),
        }
    }
}

/// Identity of one ledger deployment plus its pinned scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDomain {
    /// Chain the ledger is deployed on. Bound into salted-v1 separators
    /// only; tagged-v2 deliberately omits it.
    pub chain_id: u64,
    /// Address of the ledger deployment itself
    pub ledger: Address,
    /// Scheme every grant for this ledger must carry
    pub scheme: DomainScheme,
}

impl LedgerDomain {
    pub fn new(chain_id: u64, ledger: Address, scheme: DomainScheme) -> Self {
        LedgerDomain {
            chain_id,
            ledger,
            scheme,
        }
    }

    /// Domain separator of the salted scheme for one grant's salt
    pub fn salted_separator(&self, salt: &Salt) -> [u8; 32] {
        typed::hash_struct(
            typed::type_hash(SALTED_DOMAIN_TYPE),
            &[
                typed::string_word(DOMAIN_NAME),
                typed::string_word(VERSION_SALTED),
                typed::uint_word(self.chain_id),
                typed::address_word(&self.ledger),
                *salt.as_bytes(),
            ],
        )
    }

    /// Domain separator of the tagged scheme. Takes no per-grant input,
    /// so every grant for this deployment shares it.
    pub fn tagged_separator(&self) -> [u8; 32] {
        typed::hash_struct(
            typed::type_hash(TAGGED_DOMAIN_TYPE),
            &[
                typed::string_word(DOMAIN_NAME),
                typed::string_word(VERSION_TAGGED),
                typed::address_word(&self.ledger),
                typed::string_word(OWNER_TAG),
            ],
        )
    }
}
