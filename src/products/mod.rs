pub mod cds;
pub mod europeanoption;
pub mod fixedleg;
pub mod irswap;
