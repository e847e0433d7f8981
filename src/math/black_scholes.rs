//! Closed-form Black-Scholes prices, used as oracles in the Monte Carlo
//! tests rather than as a pricing route of their own.

fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Complementary error function, Abramowitz & Stegun 7.1.26 rational
/// approximation (absolute error below 1.5e-7, plenty for test tolerances).
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let ans = t
        * (-z * z - 1.26551223
            + t * (1.00002368
                + t * (0.37409196
                    + t * (0.09678418
                        + t * (-0.18628806
                            + t * (0.27886807
                                + t * (-1.13520398
                                    + t * (1.48851587
                                        + t * (-0.82215223 + t * 0.17087277)))))))))
        .exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

pub fn black_scholes_call(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    vol: f64,
    rate: f64,
    div_yield: f64,
) -> f64 {
    if time_to_expiry <= 0.0 {
        return (spot - strike).max(0.0);
    }
    let sqrt_t = time_to_expiry.sqrt();
    let d1 = ((spot / strike).ln() + (rate - div_yield + 0.5 * vol * vol) * time_to_expiry)
        / (vol * sqrt_t);
    let d2 = d1 - vol * sqrt_t;
    spot * (-div_yield * time_to_expiry).exp() * norm_cdf(d1)
        - strike * (-rate * time_to_expiry).exp() * norm_cdf(d2)
}

pub fn black_scholes_put(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    vol: f64,
    rate: f64,
    div_yield: f64,
) -> f64 {
    let call = black_scholes_call(spot, strike, time_to_expiry, vol, rate, div_yield);
    // put-call parity
    call - spot * (-div_yield * time_to_expiry).exp()
        + strike * (-rate * time_to_expiry).exp()
}
