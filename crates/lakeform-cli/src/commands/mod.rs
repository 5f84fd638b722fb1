pub mod check;
pub mod ingest;
pub mod plan;
pub mod resolve;
pub mod run;
