pub mod init;
pub mod scrape;
pub mod jobs;
pub mod serve;
