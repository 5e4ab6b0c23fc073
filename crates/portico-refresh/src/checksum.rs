//! Route set checksums

use portico_core::{Result, RouteDescriptor};
use sha2::{Digest, Sha256};

/// SHA256 (hex) of the serialized route list. A missing list hashes the
/// JSON `null`.
pub fn routes_checksum(routes: Option<&[RouteDescriptor]>) -> Result<String> {
    let serialized = serde_json::to_vec(&routes)?;
    Ok(format!("{:x}", Sha256::digest(&serialized)))
}
