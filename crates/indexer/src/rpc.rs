use crate::{ChangeLockResolver, IndexError, LiveCellSource};
use async_trait::async_trait;
use datatypes::{Cell, Paginate, Script};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const GET_LIVE_CELLS: &str = "wallet_fullOwnership_getLiveCells";
const GET_OFF_CHAIN_LOCKS: &str = "wallet_fullOwnership_getOffChainLocks";
const GET_ON_CHAIN_LOCKS: &str = "wallet_fullOwnership_getOnChainLocks";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Internal,
    External,
}

#[derive(Debug, Default, Serialize)]
struct LiveCellsParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OffChainLocksParams {
    change: ChangeKind,
}

#[derive(Debug, Serialize)]
struct OnChainLocksParams<'a> {
    change: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

fn decode_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, IndexError> {
    let resp: RpcResponse<T> = serde_json::from_str(body)?;
    if let Some(err) = resp.error {
        return Err(IndexError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    resp.result
        .ok_or_else(|| IndexError::EmptyResult(method.to_string()))
}

/// JSON-RPC client for a wallet exposing the full-ownership methods.
pub struct WalletRpc {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl WalletRpc {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T, IndexError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!("{} -> {}", method, self.url);
        let response = self.client.post(&self.url).json(&request).send().await?;
        let body = response.error_for_status()?.text().await?;
        decode_response(method, &body)
    }

    pub async fn get_live_cells(&self, cursor: Option<&str>) -> Result<Paginate<Cell>, IndexError> {
        self.call(GET_LIVE_CELLS, LiveCellsParams { cursor }).await
    }

    pub async fn get_off_chain_locks(&self, change: ChangeKind) -> Result<Vec<Script>, IndexError> {
        self.call(GET_OFF_CHAIN_LOCKS, OffChainLocksParams { change })
            .await
    }

    pub async fn get_on_chain_locks(
        &self,
        change: ChangeKind,
        cursor: Option<&str>,
    ) -> Result<Paginate<Script>, IndexError> {
        self.call(GET_ON_CHAIN_LOCKS, OnChainLocksParams { change, cursor })
            .await
    }
}

#[async_trait]
impl LiveCellSource for WalletRpc {
    // the wallet lists every owned cell, the lock hint is not sent
    async fn query(
        &self,
        _lock: Option<&Script>,
        cursor: Option<&str>,
    ) -> Result<Paginate<Cell>, IndexError> {
        self.get_live_cells(cursor).await
    }
}

#[async_trait]
impl ChangeLockResolver for WalletRpc {
    async fn internal_change_locks(&self) -> Result<Vec<Script>, IndexError> {
        self.get_off_chain_locks(ChangeKind::Internal).await
    }
}
