pub mod error;
pub mod memory;
pub mod rpc;
pub mod stream;

use async_trait::async_trait;
use datatypes::{Cell, Paginate, Script};

pub use error::IndexError;
pub use memory::MemoryIndex;
pub use rpc::{ChangeKind, WalletRpc};
pub use stream::CellStream;

/// Paginated index of live cells.
///
/// `cursor` is opaque; `None` asks for the first page. A page with no
/// objects marks the end of the listing. `lock` is a hint: sources may
/// narrow the page by it, but callers still check ownership themselves.
#[async_trait]
pub trait LiveCellSource: Send + Sync {
    async fn query(
        &self,
        lock: Option<&Script>,
        cursor: Option<&str>,
    ) -> Result<Paginate<Cell>, IndexError>;
}

/// Supplies the wallet's internal (change receiving) lock scripts.
#[async_trait]
pub trait ChangeLockResolver: Send + Sync {
    async fn internal_change_locks(&self) -> Result<Vec<Script>, IndexError>;
}

#[async_trait]
impl<T: LiveCellSource + ?Sized> LiveCellSource for std::sync::Arc<T> {
    async fn query(
        &self,
        lock: Option<&Script>,
        cursor: Option<&str>,
    ) -> Result<Paginate<Cell>, IndexError> {
        (**self).query(lock, cursor).await
    }
}

#[async_trait]
impl<T: ChangeLockResolver + ?Sized> ChangeLockResolver for std::sync::Arc<T> {
    async fn internal_change_locks(&self) -> Result<Vec<Script>, IndexError> {
        (**self).internal_change_locks().await
    }
}
