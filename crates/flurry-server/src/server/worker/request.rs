use flurry_proto::{Result, types::SnowflakeId};
use tokio::sync::oneshot;

/// Messages accepted by the issuing worker.
#[derive(Debug)]
pub enum WorkRequest {
    /// Issue one ID and send it back through `response`.
    Next {
        response: oneshot::Sender<Result<SnowflakeId>>,
    },
    /// Stop after acknowledging through `response`. Requests queued before
    /// this one are answered first.
    Shutdown { response: oneshot::Sender<()> },
}
