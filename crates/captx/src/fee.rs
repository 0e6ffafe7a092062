use crate::codec::build_transaction;
use crate::error::CodecError;
use datatypes::{Capacity, TransactionDraft};
use num::{BigUint, Integer, Zero};

/// Shannons per 1000 bytes when the caller does not pick a rate.
pub const DEFAULT_FEE_RATE: u64 = 1000;

const FEE_RATE_SCALE: u64 = 1000;

/// Bytes `draft` will occupy inside a block, its offset in the block's
/// transaction vector included.
pub fn transaction_size(draft: &TransactionDraft) -> Result<usize, CodecError> {
    Ok(build_transaction(draft)?.serialized_size_in_block())
}

/// `size * fee_rate / 1000`, rounded up. Rounding down would leave the
/// transaction short of the minimum fee nodes accept.
pub fn calculate_fee(size: usize, fee_rate: &Capacity) -> Capacity {
    let base = fee_rate.as_biguint() * BigUint::from(size);
    let (fee, rem) = base.div_rem(&BigUint::from(FEE_RATE_SCALE));
    if rem.is_zero() {
        Capacity::from(fee)
    } else {
        Capacity::from(fee + 1u32)
    }
}
