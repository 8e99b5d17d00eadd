pub mod aggregate;
pub mod email_policy;
pub mod submission;

pub use aggregate::{rating_summary, recent_ratings, summarize, top_creators};
pub use email_policy::{EmailPolicy, EmailRejection};
pub use submission::{RatingSubmission, submit_rating, validate_submission};
