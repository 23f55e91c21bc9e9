use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use statrs::distribution::Normal;

use crate::error::CapmError;
use crate::regression::CapmFit;
use crate::types::{Obs, Series};
use crate::CapmResult;

/// Seed used by the reference analysis run.
pub const DEFAULT_SEED: u64 = 1234;

/// Simulate `alpha + beta * x_i + e_i` with `e_i ~ N(0, residual_sd)`.
///
/// One standard-normal draw is consumed for every element of `independent`,
/// including missing ones, so the noise stream stays aligned with the table
/// rows. Missing inputs yield missing outputs.
pub fn simulate<R: Rng>(
    alpha: f64,
    beta: f64,
    independent: &[Obs],
    residual_sd: f64,
    rng: &mut R,
) -> CapmResult<Series> {
    if !residual_sd.is_finite() || residual_sd < 0.0 {
        return Err(CapmError::invalid(
            "residual_sd",
            format!(
                "Residual standard deviation must be finite and non-negative, got {}",
                residual_sd
            ),
        ));
    }
    if !alpha.is_finite() || !beta.is_finite() {
        return Err(CapmError::invalid(
            "parameters",
            "Alpha and beta must be finite",
        ));
    }
    let standard = Normal::new(0.0, 1.0).map_err(|e| CapmError::InvalidInput {
        field: "distribution".into(),
        reason: format!("Invalid Normal parameters: {e}"),
    })?;

    Ok(independent
        .iter()
        .map(|x| {
            let eps = residual_sd * rng.sample(standard);
            *x * beta + alpha + eps
        })
        .collect())
}

/// [`simulate`] with a fresh generator seeded from `seed`.
pub fn simulate_seeded(
    alpha: f64,
    beta: f64,
    independent: &[Obs],
    residual_sd: f64,
    seed: u64,
) -> CapmResult<Series> {
    let mut rng = StdRng::seed_from_u64(seed);
    simulate(alpha, beta, independent, residual_sd, &mut rng)
}

/// Simulate from a fitted model using its residual sample standard deviation.
pub fn simulate_from_fit<R: Rng>(
    fit: &CapmFit,
    independent: &[Obs],
    rng: &mut R,
) -> CapmResult<Series> {
    simulate(
        fit.alpha.estimate,
        fit.beta.estimate,
        independent,
        fit.residual_std_dev,
        rng,
    )
}
