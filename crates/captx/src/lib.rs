use datatypes::{Capacity, Cell, Script, TransactionDraft};
use indexer::{CellStream, ChangeLockResolver, LiveCellSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub mod address;
pub mod codec;
pub mod error;
pub mod fee;
pub mod injector;
pub mod solver;

pub use address::{encode_address, parse_address, LockScriptLike, Network};
pub use codec::{build_transaction, pack_draft, unpack_draft};
pub use error::{AddressError, CodecError, FundingError};
pub use fee::{calculate_fee, transaction_size, DEFAULT_FEE_RATE};
pub use injector::AttemptOutcome;
pub use solver::{FeeCandidate, FeeSettlement, PayBy, PayFeeOptions};

/// Funds transaction drafts from the cells a wallet fully owns.
///
/// Holds no state between calls: every operation reads the cell index and
/// the change lock afresh and returns a new draft, so one provider can serve
/// any number of concurrent requests.
pub struct OwnershipProvider<S, R> {
    source: S,
    resolver: R,
}

impl<S, R> OwnershipProvider<S, R>
where
    S: LiveCellSource,
    R: ChangeLockResolver,
{
    pub fn new(source: S, resolver: R) -> Self {
        Self { source, resolver }
    }

    /// Live cells owned by `lock`, or every live cell when `lock` is `None`.
    pub fn collector(&self, lock: Option<Script>) -> CellStream<'_, S> {
        CellStream::new(&self.source, lock)
    }
}

impl<T> OwnershipProvider<Arc<T>, Arc<T>>
where
    T: LiveCellSource + ChangeLockResolver,
{
    /// Provider backed by one wallet that serves both cells and change locks.
    pub fn shared(backend: Arc<T>) -> Self {
        Self::new(backend.clone(), backend)
    }
}

#[cfg(test)]
pub(crate) mod testkit {
    use datatypes::{Capacity, Cell, HashType, OutPoint, Script, H256};

    pub const SECP_CODE_HASH: [u8; 32] = [
        0x9b, 0xd7, 0xe0, 0x6f, 0x3e, 0xcf, 0x4b, 0xe0, 0xf2, 0xfc, 0xd2, 0x18, 0x8b, 0x23, 0xf1,
        0xb9, 0xfc, 0xc8, 0x8e, 0x5d, 0x4b, 0x65, 0xa8, 0x63, 0x7b, 0x17, 0x72, 0x3b, 0xbd, 0xa3,
        0xcc, 0xe8,
    ];

    /// Secp256k1 lock with 20 byte args filled with `tag`, 61 CKB to occupy.
    pub fn lock(tag: u8) -> Script {
        Script::new(H256(SECP_CODE_HASH), HashType::Type, vec![tag; 20])
    }

    pub fn live_cell(tag: u8, capacity: Capacity, index: u32) -> Cell {
        let mut cell = Cell::new_output(lock(tag), capacity);
        cell.out_point = Some(OutPoint::new(H256([tag; 32]), index));
        cell
    }
}
