use crate::config::{Command, FeeConfig};
use anyhow::{Context, Result};
use captx::{LockScriptLike, OwnershipProvider, PayBy, PayFeeOptions};
use datatypes::{Capacity, TransactionDraft};
use indexer::{ChangeLockResolver, LiveCellSource};
use std::fs;
use tracing::info;

impl Command {
    pub fn draft_path(&self) -> &str {
        match self {
            Command::PayFee { draft, .. } | Command::Inject { draft, .. } => draft,
        }
    }
}

pub fn read_draft(path: &str) -> Result<TransactionDraft> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read draft {}", path))?;
    let draft = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse draft {}", path))?;
    Ok(draft)
}

pub fn pay_fee_options(
    cfg: &FeeConfig,
    payers: &[String],
    auto_inject: bool,
    fee_rate: Option<u64>,
) -> PayFeeOptions {
    let pay_by = if payers.is_empty() {
        PayBy::Auto
    } else {
        PayBy::Payers {
            payers: payers.iter().cloned().map(LockScriptLike::from).collect(),
            auto_inject,
        }
    };

    let mut options = PayFeeOptions {
        fee_rate: fee_rate.or(cfg.rate).map(Capacity::from_shannons),
        pay_by,
        ..Default::default()
    };
    if let Some(max) = cfg.max_iterations {
        options.max_iterations = max;
    }
    options
}

pub async fn execute<S, R>(
    provider: &OwnershipProvider<S, R>,
    cfg: &FeeConfig,
    command: &Command,
    draft: &TransactionDraft,
) -> Result<TransactionDraft>
where
    S: LiveCellSource,
    R: ChangeLockResolver,
{
    match command {
        Command::PayFee {
            payer,
            auto_inject,
            fee_rate,
            ..
        } => {
            let options = pay_fee_options(cfg, payer, *auto_inject, *fee_rate);
            let settlement = provider.settle_fee(draft, &options).await?;
            info!(
                "paid fee {} shannons for {} bytes, {} inputs {} outputs",
                settlement.fee,
                settlement.size,
                settlement.draft.inputs.len(),
                settlement.draft.outputs.len()
            );
            Ok(settlement.draft)
        }
        Command::Inject { amount, lock, .. } => {
            let lock = lock.clone().map(LockScriptLike::from);
            let next = provider
                .inject_capacity(draft, &Capacity::from_shannons(*amount), lock.as_ref())
                .await?;
            info!(
                "injected {} inputs worth {} shannons",
                next.inputs.len() - draft.inputs.len(),
                next.inputs_capacity()
            );
            Ok(next)
        }
    }
}
