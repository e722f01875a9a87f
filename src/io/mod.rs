/// CSV export of run output.
pub mod export;
