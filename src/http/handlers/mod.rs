pub mod health;
pub mod leaderboard;
pub mod profile;
pub mod ratings;
pub mod search;

pub use health::health_handler;
pub use leaderboard::{get_recent_ratings_handler, get_top_creators_handler};
pub use profile::get_profile_handler;
pub use ratings::{get_ratings_handler, submit_rating_handler};
pub use search::search_handler;

use crate::errors::AppError;

/// Trimmed, non-empty `channelId`, or a 400.
pub(crate) fn required_channel_id(raw: Option<&str>) -> Result<String, AppError> {
    raw.map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("Missing channelId".into()))
}
