use super::*;
use crate::address::LockScriptLike;
use crate::error::{AddressError, FundingError};
use crate::fee::{calculate_fee, transaction_size, DEFAULT_FEE_RATE};
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_ITERATIONS: usize = 64;

/// Who pays the fee.
///
/// In JSON either `{ "payers": [...], "autoInject"?: bool }` or
/// `{ "autoInject": true }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PayByFields", into = "PayByFields")]
pub enum PayBy {
    /// Try each payer in order; with `auto_inject` fall back to any owned
    /// cell once they are all short.
    Payers {
        payers: Vec<LockScriptLike>,
        auto_inject: bool,
    },
    /// Take the fee from any owned cell.
    #[default]
    Auto,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PayByFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payers: Option<Vec<LockScriptLike>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auto_inject: Option<bool>,
}

impl TryFrom<PayByFields> for PayBy {
    type Error = String;

    fn try_from(fields: PayByFields) -> Result<Self, Self::Error> {
        match (fields.payers, fields.auto_inject) {
            (Some(payers), auto_inject) => Ok(PayBy::Payers {
                payers,
                auto_inject: auto_inject.unwrap_or(false),
            }),
            (None, Some(true)) => Ok(PayBy::Auto),
            (None, _) => Err("expect `payers` or `autoInject: true`".to_string()),
        }
    }
}

impl From<PayBy> for PayByFields {
    fn from(pay_by: PayBy) -> Self {
        match pay_by {
            PayBy::Payers {
                payers,
                auto_inject,
            } => PayByFields {
                payers: Some(payers),
                auto_inject: Some(auto_inject),
            },
            PayBy::Auto => PayByFields {
                payers: None,
                auto_inject: Some(true),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayFeeOptions {
    /// Shannons per 1000 bytes, [`DEFAULT_FEE_RATE`] when `None`.
    pub fee_rate: Option<Capacity>,
    pub pay_by: PayBy,
    pub max_iterations: usize,
}

impl Default for PayFeeOptions {
    fn default() -> Self {
        Self {
            fee_rate: None,
            pay_by: PayBy::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeeCandidate {
    Payer(Script),
    Pool,
}

impl FeeCandidate {
    pub fn lock(&self) -> Option<&Script> {
        match self {
            FeeCandidate::Payer(script) => Some(script),
            FeeCandidate::Pool => None,
        }
    }

    /// Ordered attempt list for `pay_by`.
    pub fn from_pay_by(pay_by: &PayBy) -> Result<Vec<FeeCandidate>, AddressError> {
        match pay_by {
            PayBy::Auto => Ok(vec![FeeCandidate::Pool]),
            PayBy::Payers {
                payers,
                auto_inject,
            } => {
                let mut candidates = payers
                    .iter()
                    .map(|p| p.to_script().map(FeeCandidate::Payer))
                    .collect::<Result<Vec<_>, _>>()?;
                if *auto_inject {
                    candidates.push(FeeCandidate::Pool);
                }
                Ok(candidates)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeSettlement {
    pub draft: TransactionDraft,
    /// Fee the draft was funded for.
    pub fee: Capacity,
    /// Size the fee was computed from.
    pub size: usize,
    pub iterations: usize,
}

impl<S, R> OwnershipProvider<S, R>
where
    S: LiveCellSource,
    R: ChangeLockResolver,
{
    /// Fund the fee of `draft` and return the funded draft.
    pub async fn pay_fee(
        &self,
        draft: &TransactionDraft,
        options: &PayFeeOptions,
    ) -> Result<TransactionDraft, FundingError> {
        self.settle_fee(draft, options).await.map(|s| s.draft)
    }

    /// Fund the fee of `draft`, repeating until its size stops growing.
    ///
    /// Paying the fee adds inputs and a change cell, which makes the
    /// transaction larger and may raise the fee again. Every round funds the
    /// caller's original draft with the fee of the latest size; the loop ends
    /// once a funded draft is no larger than the size its fee was based on.
    pub async fn settle_fee(
        &self,
        draft: &TransactionDraft,
        options: &PayFeeOptions,
    ) -> Result<FeeSettlement, FundingError> {
        let fee_rate = options
            .fee_rate
            .clone()
            .unwrap_or_else(|| Capacity::from_shannons(DEFAULT_FEE_RATE));
        let candidates = FeeCandidate::from_pay_by(&options.pay_by)?;

        let mut size = transaction_size(draft)?;
        let mut fee = calculate_fee(size, &fee_rate);
        let mut funded = self.fund_first(draft, &fee, &candidates).await?;
        let mut iterations = 1;

        loop {
            let current = transaction_size(&funded)?;
            if current <= size {
                break;
            }
            if iterations >= options.max_iterations {
                return Err(FundingError::FeeNotConverged { iterations });
            }
            size = current;
            fee = calculate_fee(size, &fee_rate);
            funded = self.fund_first(draft, &fee, &candidates).await?;
            iterations += 1;
            debug!("fee round {}: size {} fee {}", iterations, size, fee);
        }

        info!(
            "settled fee {} for {} bytes in {} rounds",
            fee, size, iterations
        );
        Ok(FeeSettlement {
            draft: funded,
            fee,
            size,
            iterations,
        })
    }

    /// Fund `fee` from the first candidate able to cover it.
    async fn fund_first(
        &self,
        draft: &TransactionDraft,
        fee: &Capacity,
        candidates: &[FeeCandidate],
    ) -> Result<TransactionDraft, FundingError> {
        let mut shortfall = None;
        for candidate in candidates {
            match self.try_inject(draft, fee, candidate.lock()).await? {
                AttemptOutcome::Funded(next) => return Ok(next),
                AttemptOutcome::Insufficient {
                    required,
                    collected,
                } => {
                    debug!("{:?} cannot pay fee {}", candidate, fee);
                    shortfall = Some((required, collected));
                }
            }
        }

        warn!("no fee candidate could pay {}", fee);
        let (required, collected) = shortfall.unwrap_or_else(|| (fee.clone(), Capacity::zero()));
        Err(FundingError::InsufficientCapacity {
            required,
            collected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{live_cell, lock};
    use indexer::MemoryIndex;

    fn index(cells: Vec<Cell>) -> Arc<MemoryIndex> {
        Arc::new(
            MemoryIndex::new(cells)
                .with_page_size(3)
                .with_change_locks(vec![lock(9)]),
        )
    }

    fn payers(tags: &[u8], auto_inject: bool) -> PayFeeOptions {
        PayFeeOptions {
            pay_by: PayBy::Payers {
                payers: tags.iter().map(|t| LockScriptLike::Script(lock(*t))).collect(),
                auto_inject,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_pay_by_json() {
        let pay_by: PayBy =
            serde_json::from_str(r#"{"payers":["ckt1abc"],"autoInject":true}"#).unwrap();
        assert_eq!(
            pay_by,
            PayBy::Payers {
                payers: vec![LockScriptLike::from("ckt1abc")],
                auto_inject: true,
            }
        );

        let pay_by: PayBy = serde_json::from_str(r#"{"payers":[]}"#).unwrap();
        assert_eq!(
            pay_by,
            PayBy::Payers {
                payers: vec![],
                auto_inject: false,
            }
        );

        let pay_by: PayBy = serde_json::from_str(r#"{"autoInject":true}"#).unwrap();
        assert_eq!(pay_by, PayBy::Auto);
        assert_eq!(
            serde_json::to_value(&PayBy::Auto).unwrap(),
            serde_json::json!({ "autoInject": true })
        );

        let payers = PayBy::Payers {
            payers: vec![LockScriptLike::from("ckt1abc")],
            auto_inject: false,
        };
        let json = serde_json::to_value(&payers).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "payers": ["ckt1abc"], "autoInject": false })
        );
        assert_eq!(serde_json::from_value::<PayBy>(json).unwrap(), payers);
    }

    #[test]
    fn test_pay_by_json_rejects() {
        for json in [
            r#"{"autoInject":false}"#,
            r#"{}"#,
            r#"{"payers":["ckt1abc"],"auto_inject":true}"#,
            r#"{"autoInject":true,"feeRate":"0x3e8"}"#,
        ] {
            assert!(serde_json::from_str::<PayBy>(json).is_err(), "{}", json);
        }
    }

    fn assert_fee_covered(settlement: &FeeSettlement, rate: u64) {
        let draft = &settlement.draft;
        let size = transaction_size(draft).unwrap();
        let required = calculate_fee(size, &Capacity::from_shannons(rate));
        assert_eq!(draft.fee_paid().unwrap(), settlement.fee);
        assert!(settlement.fee >= required);
    }

    #[tokio::test]
    async fn test_settles_after_crossing_fee_tiers() {
        tracing_subscriber::fmt().with_test_writer().try_init().ok();

        // first cell covers exactly the change cell plus the fee of the empty
        // draft (72 bytes), the grown draft then needs the second cell
        let first = &Capacity::from_ckb(61) + &Capacity::from_shannons(72);
        let provider = OwnershipProvider::shared(index(vec![
            live_cell(1, first.clone(), 0),
            live_cell(1, Capacity::from_ckb(1000), 1),
        ]));

        let draft = TransactionDraft::new();
        let settlement = provider
            .settle_fee(&draft, &PayFeeOptions::default())
            .await
            .unwrap();

        assert_eq!(settlement.iterations, 3);
        assert_eq!(settlement.size, 269);
        assert_eq!(settlement.fee, Capacity::from_shannons(269));
        assert_eq!(settlement.draft.inputs.len(), 2);
        assert_eq!(settlement.draft.outputs.len(), 1);
        let expected_change = &(&first + &Capacity::from_ckb(1000)) - &Capacity::from_shannons(269);
        assert_eq!(settlement.draft.outputs[0].capacity(), &expected_change);
        assert_fee_covered(&settlement, DEFAULT_FEE_RATE);
        assert!(draft.inputs.is_empty());
    }

    #[tokio::test]
    async fn test_single_cell_settles_in_two_rounds() {
        let provider = OwnershipProvider::shared(index(vec![live_cell(
            1,
            Capacity::from_ckb(1000),
            0,
        )]));
        let settlement = provider
            .settle_fee(&TransactionDraft::new(), &PayFeeOptions::default())
            .await
            .unwrap();
        assert_eq!(settlement.iterations, 2);
        assert_eq!(settlement.size, 225);
        assert_fee_covered(&settlement, DEFAULT_FEE_RATE);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_payer() {
        let provider = OwnershipProvider::shared(index(vec![
            live_cell(1, Capacity::from_ckb(10), 0),
            live_cell(2, Capacity::from_ckb(500), 1),
            live_cell(1, Capacity::from_ckb(10), 2),
        ]));
        let draft = provider
            .pay_fee(&TransactionDraft::new(), &payers(&[1, 2], false))
            .await
            .unwrap();
        assert_eq!(draft.inputs.len(), 1);
        assert!(draft.inputs.iter().all(|c| c.lock() == &lock(2)));
    }

    #[tokio::test]
    async fn test_pool_fallback_when_payers_are_short() {
        let cells = vec![
            live_cell(1, Capacity::from_ckb(10), 0),
            live_cell(3, Capacity::from_ckb(60), 1),
            live_cell(4, Capacity::from_ckb(40), 2),
        ];

        let provider = OwnershipProvider::shared(index(cells.clone()));
        let err = provider
            .pay_fee(&TransactionDraft::new(), &payers(&[1], false))
            .await
            .unwrap_err();
        assert!(matches!(err, FundingError::InsufficientCapacity { .. }));

        let provider = OwnershipProvider::shared(index(cells));
        let draft = provider
            .pay_fee(&TransactionDraft::new(), &payers(&[1], true))
            .await
            .unwrap();
        // pool walks every owner in index order
        assert_eq!(draft.inputs.len(), 2);
        assert_eq!(draft.inputs[0].lock(), &lock(1));
        assert_eq!(draft.inputs[1].lock(), &lock(3));
    }

    #[tokio::test]
    async fn test_nothing_to_pay_with() {
        let provider = OwnershipProvider::shared(index(vec![live_cell(
            1,
            Capacity::from_ckb(60),
            0,
        )]));
        let draft = TransactionDraft::new()
            .with_outputs(vec![Cell::new_output(lock(5), Capacity::from_ckb(100))]);
        let err = provider
            .pay_fee(&draft, &PayFeeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FundingError::InsufficientCapacity { .. }));

        let err = provider
            .pay_fee(&draft, &payers(&[], false))
            .await
            .unwrap_err();
        assert!(matches!(err, FundingError::InsufficientCapacity { .. }));
    }

    #[tokio::test]
    async fn test_missing_change_lock_is_not_swallowed() {
        let index = MemoryIndex::new(vec![live_cell(1, Capacity::from_ckb(1000), 0)]);
        let provider = OwnershipProvider::shared(Arc::new(index));
        let err = provider
            .pay_fee(&TransactionDraft::new(), &payers(&[1, 2], true))
            .await
            .unwrap_err();
        assert!(matches!(err, FundingError::NoChangeLock));
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let first = &Capacity::from_ckb(61) + &Capacity::from_shannons(72);
        let provider = OwnershipProvider::shared(index(vec![
            live_cell(1, first, 0),
            live_cell(1, Capacity::from_ckb(1000), 1),
        ]));
        let options = PayFeeOptions {
            max_iterations: 2,
            ..Default::default()
        };
        let err = provider
            .settle_fee(&TransactionDraft::new(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, FundingError::FeeNotConverged { iterations: 2 }));
    }

    #[tokio::test]
    async fn test_higher_fee_rate() {
        let provider = OwnershipProvider::shared(index(vec![
            live_cell(1, Capacity::from_ckb(100), 0),
            live_cell(1, Capacity::from_ckb(100), 1),
        ]));
        let rate = 3_000_000;
        let options = PayFeeOptions {
            fee_rate: Some(Capacity::from_shannons(rate)),
            ..Default::default()
        };
        let settlement = provider
            .settle_fee(&TransactionDraft::new(), &options)
            .await
            .unwrap();
        assert_fee_covered(&settlement, rate);
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_interfere() {
        let provider = OwnershipProvider::shared(index(vec![
            live_cell(1, Capacity::from_ckb(1000), 0),
            live_cell(2, Capacity::from_ckb(1000), 1),
        ]));
        let a = TransactionDraft::new()
            .with_outputs(vec![Cell::new_output(lock(5), Capacity::from_ckb(100))]);
        let b = TransactionDraft::new();

        let payers_a = payers(&[1], false);
        let payers_b = payers(&[2], false);
        let (ra, rb) = tokio::join!(
            provider.pay_fee(&a, &payers_a),
            provider.pay_fee(&b, &payers_b),
        );
        let (ra, rb) = (ra.unwrap(), rb.unwrap());
        assert_eq!(ra.outputs.len(), 2);
        assert_eq!(rb.outputs.len(), 1);
        assert_eq!(ra.inputs[0].lock(), &lock(1));
        assert_eq!(rb.inputs[0].lock(), &lock(2));
        assert_eq!(a.outputs.len(), 1);
        assert!(b.inputs.is_empty());
    }
}
