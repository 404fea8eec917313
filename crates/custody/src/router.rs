//! Request routing: the RPC surface of the custody service.
//!
//! Remote callers reach the service through a closed set of operations. Each
//! [`Request`] variant carries its own typed request and maps to exactly one
//! [`Reply`] shape. Transports deserialize a `Request`, hand it to
//! [`Router::handle`], and serialize the [`Response`].

use std::fmt;
use std::str::FromStr;

use custody_core::{Identity, IdentityId, LedgerEntry};
use custody_store::Store;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CustodyError, ErrorKind, Result};
use crate::service::CustodyService;

/// The operations exposed to remote callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Enroll an identity.
    Create,
    /// Verify a signed message and record it.
    Validate,
    /// List the ledger entries for a name.
    List,
}

impl Operation {
    /// Every operation, in wire order.
    pub const ALL: [Operation; 3] = [Operation::Create, Operation::Validate, Operation::List];

    /// Stable wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Validate => "validate",
            Operation::List => "list",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = CustodyError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CustodyError::Validation(format!("unknown operation: {s}")))
    }
}

/// Enroll `name` with an encoded public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    #[serde(with = "hex")]
    pub public_key: Vec<u8>,
}

/// Record `data` signed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    pub name: String,
    #[serde(with = "hex")]
    pub data: Vec<u8>,
    /// Signature over `data`.
    #[serde(with = "hex")]
    pub hash: Vec<u8>,
}

/// List the ledger for `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest {
    pub name: String,
}

/// A request from a remote caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Create(CreateRequest),
    Validate(RecordRequest),
    List(ListRequest),
}

impl Request {
    /// The operation this request invokes.
    pub fn operation(&self) -> Operation {
        match self {
            Request::Create(_) => Operation::Create,
            Request::Validate(_) => Operation::Validate,
            Request::List(_) => Operation::List,
        }
    }
}

/// The enrolled identity as reported back to callers. The key is omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityReply {
    pub id: IdentityId,
    pub name: String,
    pub created_at: i64,
}

impl From<Identity> for IdentityReply {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name,
            created_at: identity.created_at,
        }
    }
}

/// A successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", content = "body", rename_all = "snake_case")]
pub enum Reply {
    Identity(IdentityReply),
    Entry(LedgerEntry),
    Entries(Vec<LedgerEntry>),
}

/// A failure as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CustodyError> for ErrorReply {
    fn from(e: &CustodyError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// What a transport sends back for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(Reply),
    Err(ErrorReply),
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}

/// Dispatches requests to a [`CustodyService`].
pub struct Router<S: Store> {
    service: CustodyService<S>,
}

impl<S: Store> Clone for Router<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: Store> Router<S> {
    pub fn new(service: CustodyService<S>) -> Self {
        Self { service }
    }

    /// Get the service reference.
    pub fn service(&self) -> &CustodyService<S> {
        &self.service
    }

    /// Run one request against the service.
    pub async fn dispatch(&self, request: Request) -> Result<Reply> {
        debug!(operation = %request.operation(), "dispatching request");

        match request {
            Request::Create(req) => {
                let identity = self.service.create(&req.name, &req.public_key).await?;
                Ok(Reply::Identity(identity.into()))
            }
            Request::Validate(req) => {
                let entry = self.service.record(&req.name, &req.data, &req.hash).await?;
                Ok(Reply::Entry(entry))
            }
            Request::List(req) => {
                let entries = self.service.list(&req.name).await?;
                Ok(Reply::Entries(entries))
            }
        }
    }

    /// Run one request, folding any failure into an [`ErrorReply`].
    pub async fn handle(&self, request: Request) -> Response {
        let operation = request.operation();

        match self.dispatch(request).await {
            Ok(reply) => Response::Ok(reply),
            Err(e) => {
                match e.kind() {
                    // Already reported by the service
                    ErrorKind::InvalidSignature | ErrorKind::KeyFormat => {
                        debug!(%operation, kind = %e.kind(), error = %e, "request failed")
                    }
                    _ => warn!(%operation, kind = %e.kind(), error = %e, "request failed"),
                }
                Response::Err(ErrorReply::from(&e))
            }
        }
    }
}
