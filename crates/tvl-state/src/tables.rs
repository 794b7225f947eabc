//! redb table definitions for the TVL record store.

use redb::TableDefinition;

/// Bucket records keyed by `(partition, unix timestamp)`, where the partition
/// is `hourlyTvl#<protocol_id>` or `dailyTvl#<protocol_id>`.
pub const RECORDS: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("tvl_records");

/// Disabled protocols keyed by `{protocol_id}`.
pub const DISABLED: TableDefinition<&str, &[u8]> = TableDefinition::new("disabled_protocols");
