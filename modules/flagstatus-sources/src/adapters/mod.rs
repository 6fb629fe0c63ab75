pub mod feed;
pub mod halfstaff;
pub mod proclamations;
pub mod scrape;

pub use feed::FeedSource;
pub use halfstaff::HalfStaffApiSource;
pub use proclamations::ProclamationSource;
pub use scrape::ScrapeSource;
