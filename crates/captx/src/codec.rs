//! Conversion between drafts and the canonical CKB transaction encoding.
//!
//! A draft packs as a version 0 transaction: inputs spend the input cells'
//! out points, outputs and data come from the output cells. Decoding gives
//! the inputs back as bare out points, the spent cells themselves are not
//! part of the encoding.

use crate::error::CodecError;
use ckb_types::{packed, prelude::*};
use datatypes::{
    Capacity, Cell, CellDep, CellOutput, DepType, HashType, JsonBytes, OutPoint, Script,
    TransactionDraft, H256,
};

const TRANSACTION_VERSION: u32 = 0;

fn pack_out_point(out_point: &OutPoint) -> packed::OutPoint {
    packed::OutPoint::new_builder()
        .tx_hash(out_point.tx_hash.pack())
        .index(out_point.index.value().pack())
        .build()
}

fn pack_cell_dep(dep: &CellDep) -> packed::CellDep {
    packed::CellDep::new_builder()
        .out_point(pack_out_point(&dep.out_point))
        .dep_type(packed::Byte::new(dep.dep_type.to_byte()))
        .build()
}

pub fn pack_script(script: &Script) -> packed::Script {
    packed::Script::new_builder()
        .code_hash(script.code_hash.pack())
        .hash_type(packed::Byte::new(script.hash_type.to_byte()))
        .args(script.args.as_bytes().pack())
        .build()
}

/// The `CellOutput` of `cell`; its data travels separately in `outputs_data`.
pub fn pack_cell_output(cell: &Cell, index: usize) -> Result<packed::CellOutput, CodecError> {
    let output = &cell.cell_output;
    let capacity = output
        .capacity
        .to_u64()
        .ok_or_else(|| CodecError::CapacityOverflow {
            index,
            capacity: output.capacity.clone(),
        })?;
    Ok(packed::CellOutput::new_builder()
        .capacity(capacity.pack())
        .lock(pack_script(&output.lock))
        .type_(output.type_.as_ref().map(pack_script).pack())
        .build())
}

/// View `draft` as the transaction it stands for.
pub fn build_transaction(draft: &TransactionDraft) -> Result<packed::Transaction, CodecError> {
    let inputs = draft
        .inputs
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let out_point = cell
                .out_point
                .as_ref()
                .ok_or(CodecError::MissingOutPoint { index })?;
            Ok(packed::CellInput::new_builder()
                .since(draft.since_of(index).pack())
                .previous_output(pack_out_point(out_point))
                .build())
        })
        .collect::<Result<Vec<_>, CodecError>>()?;
    let outputs = draft
        .outputs
        .iter()
        .enumerate()
        .map(|(index, cell)| pack_cell_output(cell, index))
        .collect::<Result<Vec<_>, _>>()?;
    let outputs_data: Vec<packed::Bytes> = draft
        .outputs
        .iter()
        .map(|cell| cell.data.as_bytes().pack())
        .collect();

    let raw = packed::RawTransaction::new_builder()
        .version(TRANSACTION_VERSION.pack())
        .cell_deps(draft.cell_deps.iter().map(pack_cell_dep).collect::<Vec<_>>().pack())
        .header_deps(
            draft
                .header_deps
                .iter()
                .map(|hash| hash.pack())
                .collect::<Vec<packed::Byte32>>()
                .pack(),
        )
        .inputs(inputs.pack())
        .outputs(outputs.pack())
        .outputs_data(outputs_data.pack())
        .build();
    let witnesses: Vec<packed::Bytes> = draft
        .witnesses
        .iter()
        .map(|w| w.as_bytes().pack())
        .collect();
    Ok(packed::Transaction::new_builder()
        .raw(raw)
        .witnesses(witnesses.pack())
        .build())
}

pub fn pack_draft(draft: &TransactionDraft) -> Result<Vec<u8>, CodecError> {
    Ok(build_transaction(draft)?.as_slice().to_vec())
}

fn unpack_out_point(out_point: &packed::OutPoint) -> OutPoint {
    let tx_hash: H256 = out_point.tx_hash().unpack();
    let index: u32 = out_point.index().unpack();
    OutPoint::new(tx_hash, index)
}

fn unpack_script(script: &packed::Script) -> Result<Script, CodecError> {
    let byte = u8::from(script.hash_type());
    let hash_type = HashType::from_byte(byte).ok_or(CodecError::UnknownHashType(byte))?;
    Ok(Script::new(
        script.code_hash().unpack(),
        hash_type,
        script.args().raw_data().to_vec(),
    ))
}

/// Inverse of [`build_transaction`] up to the spent cells: every input comes
/// back as a cell holding only its out point.
pub fn draft_from_transaction(tx: &packed::Transaction) -> Result<TransactionDraft, CodecError> {
    let raw = tx.raw();
    let version: u32 = raw.version().unpack();
    if version != TRANSACTION_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let mut draft = TransactionDraft::new();
    for dep in raw.cell_deps().into_iter() {
        let byte = u8::from(dep.dep_type());
        draft.cell_deps.push(CellDep {
            out_point: unpack_out_point(&dep.out_point()),
            dep_type: DepType::from_byte(byte).ok_or(CodecError::UnknownDepType(byte))?,
        });
    }
    draft.header_deps = raw
        .header_deps()
        .into_iter()
        .map(|hash| -> H256 { hash.unpack() })
        .collect();

    for (index, input) in raw.inputs().into_iter().enumerate() {
        let since: u64 = input.since().unpack();
        if since != 0 {
            draft.input_sinces.insert(index, since);
        }
        draft.inputs.push(Cell {
            out_point: Some(unpack_out_point(&input.previous_output())),
            ..Default::default()
        });
    }

    let outputs = raw.outputs();
    let outputs_data = raw.outputs_data();
    if outputs.len() != outputs_data.len() {
        return Err(CodecError::OutputsDataMismatch {
            outputs: outputs.len(),
            data: outputs_data.len(),
        });
    }
    for (output, data) in outputs.into_iter().zip(outputs_data.into_iter()) {
        let capacity: u64 = output.capacity().unpack();
        let type_ = match output.type_().to_opt() {
            Some(script) => Some(unpack_script(&script)?),
            None => None,
        };
        draft.outputs.push(Cell {
            cell_output: CellOutput {
                capacity: Capacity::from_shannons(capacity),
                lock: unpack_script(&output.lock())?,
                type_,
            },
            data: JsonBytes::from_vec(data.raw_data().to_vec()),
            ..Default::default()
        });
    }

    draft.witnesses = tx
        .witnesses()
        .into_iter()
        .map(|w| JsonBytes::from_vec(w.raw_data().to_vec()))
        .collect();
    Ok(draft)
}

pub fn unpack_draft(bytes: &[u8]) -> Result<TransactionDraft, CodecError> {
    let tx = packed::Transaction::from_slice(bytes)
        .map_err(|e| CodecError::Malformed(e.to_string()))?;
    draft_from_transaction(&tx)
}
