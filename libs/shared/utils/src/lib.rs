pub mod ids;
pub mod time;
pub mod test_utils;

pub use ids::generate_public_id;
pub use time::{parse_calendar_date, weekday_name, SlotTime, TimeParseError};
