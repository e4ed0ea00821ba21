pub mod catalog;
pub mod inventory;
pub mod matching;
pub mod report;

pub use catalog::{CatalogRow, CodeSet, GroupKey};
pub use inventory::{InventoryItem, ProductRow};
pub use matching::{
    CatalogMatchGroup, MatchEvidence, MatchedBy, MatchedProduct, PriceClass, PriceStats,
    RowMatch, SearchedCodes, UnmatchedItem,
};
pub use report::{CatalogOutcome, CatalogStats, CompareStats, RunReport};
