use super::*;
use crate::address::LockScriptLike;
use crate::error::FundingError;

/// Result of trying to raise an amount from one group of cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Funded(TransactionDraft),
    Insufficient {
        required: Capacity,
        collected: Capacity,
    },
}

impl<S, R> OwnershipProvider<S, R>
where
    S: LiveCellSource,
    R: ChangeLockResolver,
{
    async fn change_lock(&self) -> Result<Script, FundingError> {
        self.resolver
            .internal_change_locks()
            .await?
            .into_iter()
            .next()
            .ok_or(FundingError::NoChangeLock)
    }

    /// Add inputs worth at least `amount` to `draft` plus a change output
    /// holding whatever the inputs carry beyond `amount`.
    ///
    /// Cells are taken greedily in index order from `lock`'s cells, or from
    /// any owner when `lock` is `None`. The target includes the change cell's
    /// own occupied capacity, so the change output is always valid. `draft`
    /// itself is never modified.
    pub async fn inject_capacity(
        &self,
        draft: &TransactionDraft,
        amount: &Capacity,
        lock: Option<&LockScriptLike>,
    ) -> Result<TransactionDraft, FundingError> {
        let payer = lock.map(LockScriptLike::to_script).transpose()?;
        match self.try_inject(draft, amount, payer.as_ref()).await? {
            AttemptOutcome::Funded(next) => Ok(next),
            AttemptOutcome::Insufficient {
                required,
                collected,
            } => Err(FundingError::InsufficientCapacity {
                required,
                collected,
            }),
        }
    }

    /// Like [`Self::inject_capacity`] but reports a shortfall as an outcome.
    /// Errors are left for conditions no other payer could get around.
    pub async fn try_inject(
        &self,
        draft: &TransactionDraft,
        amount: &Capacity,
        payer: Option<&Script>,
    ) -> Result<AttemptOutcome, FundingError> {
        let change_lock = self.change_lock().await?;
        let mut change_cell = Cell::new_output(change_lock, Capacity::zero());
        let target = amount + &change_cell.occupied_capacity();

        let mut stream = self.collector(payer.cloned());
        let mut inputs = Vec::new();
        let mut collected = Capacity::zero();
        while collected < target {
            match stream.next().await? {
                Some(cell) => {
                    collected += cell.capacity();
                    inputs.push(cell);
                }
                None => break,
            }
        }

        if collected < target {
            debug!(
                "payer {:?} short of {}: collected {} from {} cells",
                payer.map(|p| &p.args),
                target,
                collected,
                inputs.len()
            );
            return Ok(AttemptOutcome::Insufficient {
                required: target,
                collected,
            });
        }

        change_cell.cell_output.capacity = &collected - amount;
        debug!(
            "injected {} cells worth {}, change {}",
            inputs.len(),
            collected,
            change_cell.capacity()
        );
        let next = draft
            .with_inputs(inputs)
            .with_outputs(std::iter::once(change_cell));
        Ok(AttemptOutcome::Funded(next))
    }
}
