pub mod inventory;
pub mod pool;
pub mod results;
pub mod schema;

pub use inventory::PgInventory;
pub use pool::create_pool;
pub use results::PgResultStore;
pub use schema::ensure_schema;
