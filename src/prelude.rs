pub use crate::{
    core::{cashflow::*, observables::*, traits::*},
    currencies::enums::*,
    engine::coordinator::*,
    math::{black_scholes::*, cholesky::*, interpolation::*, regression::*},
    models::{creditfxjump::*, deterministiccurves::*, equitysimulator::*, hullwhite::*},
    products::{cds::*, europeanoption::*, fixedleg::*, irswap::*},
    rates::{curves::*, traits::*},
    time::{date::*, daycounter::*, period::*},
    utils::errors::*,
};
