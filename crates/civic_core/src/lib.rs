pub mod config;
pub mod dataset;
pub mod db;
pub mod filter;
pub mod intake;
pub mod news;
pub mod ranking;
pub mod schema;
pub mod source;
pub mod view;

pub use dataset::Dataset;
pub use source::{DataSource, IssueSubmitter, MemorySource, SourceError, SubmissionError};
