//! Derived sync status.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// A point-in-time view of the sync subsystem, recomputed on demand from
/// the network monitor and the count of unsynced recordings. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_syncing: bool,
    pub pending_uploads: usize,
    pub last_sync_time: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let status = SyncStatus {
            is_online: true,
            is_syncing: false,
            pending_uploads: 3,
            last_sync_time: Some(1000),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["isOnline"], true);
        assert_eq!(json["pendingUploads"], 3);
        assert_eq!(json["lastSyncTime"], 1000);
    }
}
