pub mod indicators;
pub mod ranking;
pub mod scoring;
pub mod snapshot;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
