pub mod capacity;
pub mod types;

pub use capacity::{Capacity, ParseCapacityError, SHANNONS_PER_CKB};
pub use ckb_jsonrpc_types::{BlockNumber, JsonBytes, Uint32, Uint64};
pub use ckb_types::H256;
pub use types::{
    Cell, CellDep, CellOutput, DepType, HashType, OutPoint, Paginate, Script, TransactionDraft,
};
