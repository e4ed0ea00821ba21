pub mod code_matcher;
pub mod compare;
pub mod grouping;
pub mod price;
pub mod rows;
pub mod unmatched;

pub use code_matcher::{match_item, ItemCodes};
pub use compare::{compare_snapshot, CatalogComparison, CompareService, RunOptions};
pub use grouping::{aggregate_groups, GroupAggregator, Grouping};
pub use price::classify_price;
pub use rows::{build_row_matches, RowScan};
pub use unmatched::collect_unmatched;
