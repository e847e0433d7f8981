pub mod date;
pub mod daycounter;
pub mod period;
