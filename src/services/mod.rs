pub mod dropbox;
pub mod jobs;
pub mod worker;
