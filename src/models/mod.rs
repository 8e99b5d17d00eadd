pub mod creator;
pub mod rating;
pub mod redis;
pub mod search;

pub use creator::{CreatorSummary, RatingSummary};
pub use rating::{ProfileImages, PublicRating, RatingComment, RatingRecord, UNKNOWN_IP};
pub use search::SearchResult;
