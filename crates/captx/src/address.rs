use crate::error::AddressError;
use bitcoin::bech32::{self, primitives::decode::CheckedHrpstring, Bech32, Bech32m, Hrp};
use datatypes::{HashType, Script, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

const FORMAT_FULL: u8 = 0x00;
const FORMAT_SHORT: u8 = 0x01;
const FORMAT_FULL_DATA: u8 = 0x02;
const FORMAT_FULL_TYPE: u8 = 0x04;

const SECP256K1_BLAKE160_CODE_HASH: [u8; 32] = [
    0x9b, 0xd7, 0xe0, 0x6f, 0x3e, 0xcf, 0x4b, 0xe0, 0xf2, 0xfc, 0xd2, 0x18, 0x8b, 0x23, 0xf1, 0xb9,
    0xfc, 0xc8, 0x8e, 0x5d, 0x4b, 0x65, 0xa8, 0x63, 0x7b, 0x17, 0x72, 0x3b, 0xbd, 0xa3, 0xcc, 0xe8,
];
const SECP256K1_MULTISIG_CODE_HASH: [u8; 32] = [
    0x5c, 0x50, 0x69, 0xeb, 0x08, 0x57, 0xef, 0xc6, 0x5e, 0x1b, 0xca, 0x0c, 0x07, 0xdf, 0x34, 0xc3,
    0x16, 0x63, 0xb3, 0x62, 0x2f, 0xd3, 0x87, 0x6c, 0x87, 0x63, 0x20, 0xfc, 0x96, 0x34, 0xe2, 0xa8,
];
const ANYONE_CAN_PAY_MAINNET_CODE_HASH: [u8; 32] = [
    0xd3, 0x69, 0x59, 0x7f, 0xf4, 0x7f, 0x29, 0xfb, 0xc0, 0xd4, 0x7d, 0x2e, 0x37, 0x75, 0x37, 0x0d,
    0x12, 0x50, 0xb8, 0x51, 0x40, 0xc6, 0x70, 0xe4, 0x71, 0x8a, 0xf7, 0x12, 0x98, 0x3a, 0x23, 0x54,
];
const ANYONE_CAN_PAY_TESTNET_CODE_HASH: [u8; 32] = [
    0x34, 0x19, 0xa1, 0xc0, 0x9e, 0xb2, 0x56, 0x7f, 0x65, 0x52, 0xee, 0x7a, 0x8e, 0xcf, 0xfd, 0x64,
    0x15, 0x5c, 0xff, 0xe0, 0xf1, 0x79, 0x6e, 0x6e, 0x61, 0xec, 0x08, 0x8d, 0x74, 0x0c, 0x13, 0x56,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn hrp(self) -> &'static str {
        match self {
            Network::Mainnet => "ckb",
            Network::Testnet => "ckt",
        }
    }

    /// Testnet addresses start with `ckt`, everything else is read as mainnet.
    pub fn from_address(address: &str) -> Network {
        if address.starts_with(Network::Testnet.hrp()) {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    fn short_code_hash(self, index: u8) -> Option<[u8; 32]> {
        match (index, self) {
            (0x00, _) => Some(SECP256K1_BLAKE160_CODE_HASH),
            (0x01, _) => Some(SECP256K1_MULTISIG_CODE_HASH),
            (0x02, Network::Mainnet) => Some(ANYONE_CAN_PAY_MAINNET_CODE_HASH),
            (0x02, Network::Testnet) => Some(ANYONE_CAN_PAY_TESTNET_CODE_HASH),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

enum Variant {
    Bech32,
    Bech32m,
}

fn decode(address: &str) -> Result<(Hrp, Vec<u8>, Variant), AddressError> {
    if let Ok(checked) = CheckedHrpstring::new::<Bech32m>(address) {
        return Ok((checked.hrp(), checked.byte_iter().collect(), Variant::Bech32m));
    }
    let checked = CheckedHrpstring::new::<Bech32>(address)
        .map_err(|e| AddressError::Encoding(e.to_string()))?;
    Ok((checked.hrp(), checked.byte_iter().collect(), Variant::Bech32))
}

fn split_code_hash(body: &[u8]) -> Result<(H256, &[u8]), AddressError> {
    if body.len() < 32 {
        return Err(AddressError::PayloadLength(body.len() + 1));
    }
    let (hash, rest) = body.split_at(32);
    let code_hash =
        H256::from_slice(hash).map_err(|_| AddressError::PayloadLength(body.len() + 1))?;
    Ok((code_hash, rest))
}

/// Decode a CKB address into its lock script.
///
/// Accepts the full format and the deprecated short, full-data and full-type
/// formats. The human readable part has to match `network`.
pub fn parse_address(address: &str, network: Network) -> Result<Script, AddressError> {
    let (hrp, payload, variant) = decode(address)?;
    let found = hrp.to_lowercase();
    if found != network.hrp() {
        return Err(AddressError::NetworkMismatch {
            expected: network.hrp().to_string(),
            found,
        });
    }

    let (&format, body) = payload
        .split_first()
        .ok_or(AddressError::PayloadLength(0))?;
    match (format, variant) {
        (FORMAT_FULL, Variant::Bech32m) => {
            let (code_hash, rest) = split_code_hash(body)?;
            let (&hash_type, args) = rest
                .split_first()
                .ok_or(AddressError::PayloadLength(payload.len()))?;
            let hash_type =
                HashType::from_byte(hash_type).ok_or(AddressError::UnknownHashType(hash_type))?;
            Ok(Script::new(code_hash, hash_type, args))
        }
        (FORMAT_FULL, Variant::Bech32) => Err(AddressError::ChecksumVariant {
            format,
            expected: "bech32m",
        }),
        (FORMAT_SHORT, Variant::Bech32) => {
            let (&index, args) = body
                .split_first()
                .ok_or(AddressError::PayloadLength(payload.len()))?;
            let code_hash = network
                .short_code_hash(index)
                .ok_or(AddressError::UnknownCodeHashIndex(index))?;
            let args_ok = match index {
                0x02 => (20..=22).contains(&args.len()),
                _ => args.len() == 20,
            };
            if !args_ok {
                return Err(AddressError::PayloadLength(payload.len()));
            }
            Ok(Script::new(H256(code_hash), HashType::Type, args))
        }
        (FORMAT_FULL_DATA | FORMAT_FULL_TYPE, Variant::Bech32) => {
            let (code_hash, args) = split_code_hash(body)?;
            let hash_type = if format == FORMAT_FULL_DATA {
                HashType::Data
            } else {
                HashType::Type
            };
            Ok(Script::new(code_hash, hash_type, args))
        }
        (FORMAT_SHORT | FORMAT_FULL_DATA | FORMAT_FULL_TYPE, Variant::Bech32m) => {
            Err(AddressError::ChecksumVariant {
                format,
                expected: "bech32",
            })
        }
        (other, _) => Err(AddressError::UnknownFormat(other)),
    }
}

/// Encode `script` in the full address format.
pub fn encode_address(script: &Script, network: Network) -> Result<String, AddressError> {
    let hrp = Hrp::parse(network.hrp()).map_err(|e| AddressError::Encoding(e.to_string()))?;
    let mut payload = Vec::with_capacity(34 + script.args.len());
    payload.push(FORMAT_FULL);
    payload.extend_from_slice(script.code_hash.as_bytes());
    payload.push(script.hash_type.to_byte());
    payload.extend_from_slice(script.args.as_bytes());
    bech32::encode::<Bech32m>(hrp, &payload).map_err(|e| AddressError::Encoding(e.to_string()))
}

/// A lock given either as a script or as an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LockScriptLike {
    Script(Script),
    Address(String),
}

impl LockScriptLike {
    /// Addresses are decoded against the network their prefix names.
    pub fn to_script(&self) -> Result<Script, AddressError> {
        match self {
            LockScriptLike::Script(script) => Ok(script.clone()),
            LockScriptLike::Address(address) => {
                parse_address(address, Network::from_address(address))
            }
        }
    }
}

impl From<Script> for LockScriptLike {
    fn from(script: Script) -> Self {
        LockScriptLike::Script(script)
    }
}

impl From<&str> for LockScriptLike {
    fn from(address: &str) -> Self {
        LockScriptLike::Address(address.to_string())
    }
}

impl From<String> for LockScriptLike {
    fn from(address: String) -> Self {
        LockScriptLike::Address(address)
    }
}
