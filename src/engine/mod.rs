pub mod kelly;
pub mod odds;

pub use kelly::{empirical_info, recommend_stake, EmpiricalInfo};
pub use odds::american_to_decimal;
