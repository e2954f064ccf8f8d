// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Library linking.
//!
//! Compilers leave a placeholder wherever bytecode calls into a library whose address is not
//! known at compile time. The placeholder positions are reported as link references, in bytes,
//! grouped by source file and library name. Linking splices the deployed library addresses into
//! the hex encoded bytecode at those positions.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{core::registry::ContractRegistry, utils::strip_0x};

/// Source file -> library name -> placeholder positions.
pub type LinkReferences = BTreeMap<String, BTreeMap<String, Vec<LinkOffset>>>;

/// Position of a placeholder in the bytecode, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOffset {
    pub start: usize,
    pub length: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error(
        "{contract} has a link to the library {library}, but it was not found. \
         Is it in your contract folder?"
    )]
    LibraryNotFound { contract: String, library: String },
    #[error(
        "{contract} needs {library} but an address was not found, \
         did you deploy it or configure an address?"
    )]
    LibraryNotDeployed { contract: String, library: String },
    #[error("{contract}: link reference to {library} at byte {start} is outside the bytecode")]
    OutOfBounds {
        contract: String,
        library: String,
        start: usize,
    },
    #[error("{contract}: link reference to {library} at byte {start} overlaps another reference")]
    Overlap {
        contract: String,
        library: String,
        start: usize,
    },
}

struct Patch<'a> {
    library: &'a str,
    offset: LinkOffset,
    address: String,
}

/// Returns `code` with every link reference replaced by its library address.
///
/// The input is never modified; on error no partially linked code is produced.
pub fn link(
    contract: &str,
    code: &str,
    link_references: &LinkReferences,
    registry: &dyn ContractRegistry,
) -> Result<String, LinkError> {
    let mut patches = Vec::new();
    for (name, offsets) in link_references.values().flat_map(BTreeMap::iter) {
        let address = library_address(contract, name, registry)?;
        // addresses are spliced in lower case without the 0x prefix
        let address = hex::encode(address);
        patches.extend(offsets.iter().map(|offset| Patch {
            library: name,
            offset: *offset,
            address: address.clone(),
        }));
    }
    patches.sort_by_key(|patch| patch.offset.start);

    let prefix = &code[..code.len() - strip_0x(code).len()];
    let mut linked = strip_0x(code).to_owned();
    // running correction for replacements whose width differs from their placeholder
    let mut drift: isize = 0;
    // end of the previous replacement in `linked`
    let mut cursor = 0;
    for patch in &patches {
        let out_of_bounds = || LinkError::OutOfBounds {
            contract: contract.to_owned(),
            library: patch.library.to_owned(),
            start: patch.offset.start,
        };
        let (Some(start), Some(width)) = (
            patch.offset.start.checked_mul(2),
            patch.offset.length.checked_mul(2),
        ) else {
            return Err(out_of_bounds());
        };
        let begin = start.checked_add_signed(drift).ok_or_else(out_of_bounds)?;
        let end = begin.checked_add(width).ok_or_else(out_of_bounds)?;
        if begin < cursor {
            return Err(LinkError::Overlap {
                contract: contract.to_owned(),
                library: patch.library.to_owned(),
                start: patch.offset.start,
            });
        }
        if end > linked.len() || !linked.is_char_boundary(begin) || !linked.is_char_boundary(end) {
            return Err(out_of_bounds());
        }
        linked.replace_range(begin..end, &patch.address);
        cursor = begin + patch.address.len();
        drift += patch.address.len() as isize - width as isize;
    }
    Ok(format!("{prefix}{linked}"))
}

fn library_address(
    contract: &str,
    library: &str,
    registry: &dyn ContractRegistry,
) -> Result<Address, LinkError> {
    let snapshot = registry
        .lookup(library)
        .ok_or_else(|| LinkError::LibraryNotFound {
            contract: contract.to_owned(),
            library: library.to_owned(),
        })?;
    snapshot
        .deployed_address
        .ok_or_else(|| LinkError::LibraryNotDeployed {
            contract: contract.to_owned(),
            library: library.to_owned(),
        })
}
