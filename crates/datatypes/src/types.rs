use crate::capacity::Capacity;
use ckb_jsonrpc_types::{BlockNumber, JsonBytes, Uint32};
use ckb_types::H256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    #[default]
    Data,
    Type,
    Data1,
    Data2,
}

impl HashType {
    pub fn to_byte(self) -> u8 {
        match self {
            HashType::Data => 0,
            HashType::Type => 1,
            HashType::Data1 => 2,
            HashType::Data2 => 4,
        }
    }

    pub fn from_byte(b: u8) -> Option<HashType> {
        match b {
            0 => Some(HashType::Data),
            1 => Some(HashType::Type),
            2 => Some(HashType::Data1),
            4 => Some(HashType::Data2),
            _ => None,
        }
    }
}

/// Lock or type script. Two scripts are the same owner iff all three
/// fields are equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub code_hash: H256,
    pub hash_type: HashType,
    pub args: JsonBytes,
}

impl Script {
    pub fn new(code_hash: H256, hash_type: HashType, args: impl Into<Vec<u8>>) -> Self {
        Script {
            code_hash,
            hash_type,
            args: JsonBytes::from_vec(args.into()),
        }
    }

    /// Bytes this script occupies inside a cell: code hash, hash type and args.
    pub fn occupied_bytes(&self) -> usize {
        32 + 1 + self.args.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutPoint {
    pub tx_hash: H256,
    pub index: Uint32,
}

impl OutPoint {
    pub fn new(tx_hash: H256, index: u32) -> Self {
        OutPoint {
            tx_hash,
            index: index.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellOutput {
    pub capacity: Capacity,
    pub lock: Script,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<Script>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub cell_output: CellOutput,
    #[serde(default)]
    pub data: JsonBytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_point: Option<OutPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<BlockNumber>,
}

impl Cell {
    /// A fresh output cell with empty data and no type script.
    pub fn new_output(lock: Script, capacity: Capacity) -> Self {
        Cell {
            cell_output: CellOutput {
                capacity,
                lock,
                type_: None,
            },
            ..Default::default()
        }
    }

    pub fn capacity(&self) -> &Capacity {
        &self.cell_output.capacity
    }

    pub fn lock(&self) -> &Script {
        &self.cell_output.lock
    }

    /// Minimal capacity this cell must carry to be valid on chain: its
    /// capacity field, lock, optional type and data, one CKB per byte.
    pub fn occupied_capacity(&self) -> Capacity {
        let output = &self.cell_output;
        let type_bytes = output.type_.as_ref().map_or(0, Script::occupied_bytes);
        Capacity::bytes(8 + output.lock.occupied_bytes() + type_bytes + self.data.len())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DepType {
    #[default]
    Code,
    DepGroup,
}

impl DepType {
    pub fn to_byte(self) -> u8 {
        match self {
            DepType::Code => 0,
            DepType::DepGroup => 1,
        }
    }

    pub fn from_byte(b: u8) -> Option<DepType> {
        match b {
            0 => Some(DepType::Code),
            1 => Some(DepType::DepGroup),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDep {
    pub out_point: OutPoint,
    pub dep_type: DepType,
}

/// One page of a cursor based listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginate<T> {
    pub objects: Vec<T>,
    pub cursor: String,
}

/// A transaction under construction.
///
/// Drafts are plain values: every `with_*` transform returns a new draft and
/// leaves the receiver untouched, so a caller holding a draft never observes
/// another party's half-finished edit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(default)]
    pub cell_deps: Vec<CellDep>,
    #[serde(default)]
    pub header_deps: Vec<H256>,
    #[serde(default)]
    pub inputs: Vec<Cell>,
    #[serde(default)]
    pub outputs: Vec<Cell>,
    #[serde(default)]
    pub witnesses: Vec<JsonBytes>,
    /// `since` of an input by position, `0` when absent.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input_sinces: BTreeMap<usize, u64>,
}

impl TransactionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I: IntoIterator<Item = Cell>>(&self, cells: I) -> Self {
        let mut next = self.clone();
        next.inputs.extend(cells);
        next
    }

    pub fn with_outputs<I: IntoIterator<Item = Cell>>(&self, cells: I) -> Self {
        let mut next = self.clone();
        next.outputs.extend(cells);
        next
    }

    pub fn with_cell_dep(&self, dep: CellDep) -> Self {
        let mut next = self.clone();
        next.cell_deps.push(dep);
        next
    }

    pub fn with_header_dep(&self, hash: H256) -> Self {
        let mut next = self.clone();
        next.header_deps.push(hash);
        next
    }

    pub fn with_witness(&self, witness: JsonBytes) -> Self {
        let mut next = self.clone();
        next.witnesses.push(witness);
        next
    }

    pub fn with_input_since(&self, index: usize, since: u64) -> Self {
        let mut next = self.clone();
        next.input_sinces.insert(index, since);
        next
    }

    pub fn since_of(&self, index: usize) -> u64 {
        self.input_sinces.get(&index).copied().unwrap_or(0)
    }

    pub fn inputs_capacity(&self) -> Capacity {
        self.inputs.iter().map(Cell::capacity).sum()
    }

    pub fn outputs_capacity(&self) -> Capacity {
        self.outputs.iter().map(Cell::capacity).sum()
    }

    /// Inputs minus outputs, `None` while the draft is still under-funded.
    pub fn fee_paid(&self) -> Option<Capacity> {
        self.inputs_capacity().safe_sub(&self.outputs_capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(args: &[u8]) -> Script {
        Script::new(H256([7; 32]), HashType::Type, args)
    }

    #[test]
    fn test_occupied_capacity() {
        let cell = Cell::new_output(lock(&[0; 20]), Capacity::zero());
        assert_eq!(cell.occupied_capacity(), Capacity::from_ckb(61));

        let mut typed = Cell::new_output(lock(&[0; 20]), Capacity::zero());
        typed.cell_output.type_ = Some(lock(&[0; 32]));
        typed.data = JsonBytes::from_vec(vec![0; 16]);
        assert_eq!(typed.occupied_capacity(), Capacity::from_ckb(61 + 65 + 16));
    }

    #[test]
    fn test_draft_transforms_leave_source_untouched() {
        let draft = TransactionDraft::new();
        let cell = Cell::new_output(lock(&[1]), Capacity::from_ckb(100));
        let next = draft.with_outputs(vec![cell.clone()]).with_inputs(vec![cell]);
        assert!(draft.outputs.is_empty());
        assert!(draft.inputs.is_empty());
        assert_eq!(next.outputs.len(), 1);
        assert_eq!(next.inputs.len(), 1);
        assert_eq!(next.fee_paid(), Some(Capacity::zero()));
    }

    #[test]
    fn test_cell_json() {
        let json = r#"{
            "cellOutput": {
                "capacity": "0x174876e800",
                "lock": {
                    "codeHash": "0x9bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8",
                    "hashType": "type",
                    "args": "0x36c329ed630d6ce750712a477543672adab57f4c"
                }
            },
            "data": "0x",
            "outPoint": {
                "txHash": "0x71a7ba8fc96349fea0ed3a5c47992e3b4084b031a42264a018e0072e8172e46c",
                "index": "0x1"
            },
            "blockNumber": "0x10"
        }"#;
        let cell: Cell = serde_json::from_str(json).unwrap();
        assert_eq!(cell.capacity(), &Capacity::from_ckb(1000));
        assert_eq!(cell.lock().hash_type, HashType::Type);
        assert_eq!(cell.lock().args.len(), 20);
        assert_eq!(cell.out_point.as_ref().unwrap().index.value(), 1);
        assert_eq!(cell.block_number.map(|n| n.value()), Some(16));
        assert!(cell.cell_output.type_.is_none());
    }
}
