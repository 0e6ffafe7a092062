use datatypes::Capacity;
use indexer::IndexError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("invalid bech32 string: {0}")]
    Encoding(String),
    #[error("address prefix `{found}` does not belong to network `{expected}`")]
    NetworkMismatch { expected: String, found: String },
    #[error("unknown address format type {0:#04x}")]
    UnknownFormat(u8),
    #[error("address format {format:#04x} must use {expected} checksum")]
    ChecksumVariant { format: u8, expected: &'static str },
    #[error("invalid address payload length {0}")]
    PayloadLength(usize),
    #[error("unknown short address code hash index {0}")]
    UnknownCodeHashIndex(u8),
    #[error("unknown script hash type {0}")]
    UnknownHashType(u8),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("input {index} has no out point")]
    MissingOutPoint { index: usize },
    #[error("output {index} capacity {capacity} does not fit in 64 bits")]
    CapacityOverflow { index: usize, capacity: Capacity },
    #[error("malformed transaction: {0}")]
    Malformed(String),
    #[error("unsupported transaction version {0}")]
    UnsupportedVersion(u32),
    #[error("unknown script hash type {0}")]
    UnknownHashType(u8),
    #[error("unknown dep type {0}")]
    UnknownDepType(u8),
    #[error("{outputs} outputs but {data} outputs data")]
    OutputsDataMismatch { outputs: usize, data: usize },
}

#[derive(Error, Debug)]
pub enum FundingError {
    #[error("no internal change lock found, the account may be misconfigured")]
    NoChangeLock,
    #[error("insufficient capacity: required {required}, collected {collected}")]
    InsufficientCapacity {
        required: Capacity,
        collected: Capacity,
    },
    #[error("cell index unavailable: {0}")]
    IndexUnavailable(#[from] IndexError),
    #[error("invalid lock: {0}")]
    Address(#[from] AddressError),
    #[error("malformed draft: {0}")]
    MalformedDraft(#[from] CodecError),
    #[error("fee did not settle after {iterations} iterations")]
    FeeNotConverged { iterations: usize },
}
