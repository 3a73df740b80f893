mod pool;
mod summary;


pub use pool::{PoolConfig, RunReport, WorkerPool};
pub use summary::{print_summary, summary_lines};
