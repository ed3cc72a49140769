//! Dataset loading, the TSV result cache, and the driver tying them to the
//! dispatcher.

mod cache;
mod driver;
mod layout;
mod records;

pub use cache::{check_cache, check_cache_bytes, render_tsv, write_cache, CacheStatus, TRIPLES_COLUMN};
pub use driver::{DriverOutcome, QueryNerDriver, USD_PER_1K_TOKENS};
pub use layout::DatasetLayout;
pub use records::{
    cell_text, load_query_table, read_records, QueryTable, QUERY_COLUMN, QUESTION_COLUMN,
};
