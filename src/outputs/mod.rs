//! Output generation for processed articles.
//!
//! # Submodules
//!
//! - [`store`]: Reads, merges and writes the tabular article store
//!
//! # Output Structure
//!
//! ```text
//! business_news_summary.csv             # canonical store, deduplicated by headline
//! archive_dir/
//! ├── business_news_20250506_083000.csv # one snapshot per run
//! └── business_news_20250506_163000.csv
//! ```

pub mod store;
