pub mod records;
pub mod sync;

pub use records::{clear, show, today};
pub use sync::run as sync_run;
