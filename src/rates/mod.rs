pub mod curves;
pub mod traits;
