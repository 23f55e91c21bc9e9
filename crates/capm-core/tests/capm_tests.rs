use capm_core::analysis::{run_capm_analysis, AnalysisSettings, CapmAnalysisInput};
use capm_core::prices::{PriceRecord, PriceTable};
use capm_core::regression::fit_capm;
use capm_core::returns::{compute_excess_returns, compute_log_returns, derive_return_table};
use capm_core::simulation::simulate_seeded;
use capm_core::statistics::describe;
use capm_core::{CapmError, Obs};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Monthly closes for the first half of 2002 (rounded).
fn sample_table() -> PriceTable {
    let rows: [(u32, f64, f64, f64, f64); 7] = [
        (1, 1130.2, 15.4, 37.1, 1.69),
        (2, 1106.7, 14.9, 38.9, 1.76),
        (3, 1147.4, 16.5, 38.0, 1.79),
        (4, 1076.9, 16.0, 31.5, 1.74),
        (5, 1067.1, 17.7, 31.2, 1.71),
        (6, 989.8, 16.0, 29.1, 1.68),
        (7, 911.6, 13.5, 28.9, 1.69),
    ];
    let records = rows
        .iter()
        .map(|&(month, sp, ford, ge, rf)| {
            let mut prices = BTreeMap::new();
            prices.insert("SANDP".to_string(), sp);
            prices.insert("FORD".to_string(), ford);
            prices.insert("GE".to_string(), ge);
            PriceRecord {
                date: NaiveDate::from_ymd_opt(2002, month, 28).unwrap(),
                prices,
                risk_free_yield: rf,
            }
        })
        .collect();
    PriceTable::new("SANDP", vec!["FORD".into(), "GE".into()], records).unwrap()
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[test]
fn test_log_returns_match_definition() {
    let prices = [50.0, 52.5, 51.0, 55.2, 54.9];
    let r = compute_log_returns(&prices).unwrap();
    assert_eq!(r.len(), prices.len());
    assert!(r[0].is_missing());
    for i in 1..prices.len() {
        let expected = 100.0 * (prices[i] / prices[i - 1]).ln();
        assert!((r[i].get().unwrap() - expected).abs() < 1e-12);
    }
}

#[test]
fn test_excess_returns_align_with_table() {
    let table = sample_table();
    let rt = derive_return_table(&table).unwrap();
    assert_eq!(rt.dates, table.dates());
    for inst in &rt.instruments {
        assert_eq!(inst.returns.len(), table.len());
        assert_eq!(inst.excess_returns.len(), table.len());
        assert!(inst.excess_returns[0].is_missing());
    }
    let ge_prices = table.prices("GE").unwrap();
    let manual = 100.0 * (ge_prices[3] / ge_prices[2]).ln() - 1.74 / 12.0;
    let got = rt.excess("GE").unwrap()[3].get().unwrap();
    assert!((got - manual).abs() < 1e-12);
}

#[test]
fn test_excess_returns_scale_with_returns() {
    let returns = vec![Obs::MISSING, Obs::value(1.5), Obs::value(-0.25)];
    let zero_rate = vec![Obs::value(0.0); 3];
    let base = compute_excess_returns(&returns, &zero_rate).unwrap();
    let scaled: Vec<Obs> = returns.iter().map(|r| *r * 3.0).collect();
    let scaled_ex = compute_excess_returns(&scaled, &zero_rate).unwrap();
    for (a, b) in base.iter().zip(&scaled_ex) {
        assert_eq!((*a * 3.0).get(), b.get());
    }
}

// ---------------------------------------------------------------------------
// Statistics & regression
// ---------------------------------------------------------------------------

#[test]
fn test_describe_market_excess() {
    let rt = derive_return_table(&sample_table()).unwrap();
    let s = describe(rt.excess("SANDP").unwrap()).unwrap();
    assert_eq!(s.count, 6);
    assert!(s.min <= s.p25 && s.p25 <= s.median && s.median <= s.p75 && s.p75 <= s.max);
    assert!(s.mean < 0.0, "the sample is a falling market");
    assert!(s.kurtosis.unwrap() >= 1.0);
}

#[test]
fn test_fit_on_sample_table() {
    let rt = derive_return_table(&sample_table()).unwrap();
    let fit = fit_capm(rt.excess("FORD").unwrap(), rt.excess("SANDP").unwrap()).unwrap();
    assert_eq!(fit.n, 6);
    assert_eq!(fit.dof, 4);
    assert_eq!(fit.observations, vec![1, 2, 3, 4, 5, 6]);
    let resid_sum: f64 = fit.residuals.iter().sum();
    assert!(resid_sum.abs() < 1e-9, "OLS residuals sum to zero");
    assert!(fit.r_squared >= 0.0 && fit.r_squared <= 1.0);
}

#[test]
fn test_exact_fit_worked_example() {
    let x: Vec<Obs> = [1.0, 2.0, 3.0, 4.0, 5.0].into_iter().map(Obs::value).collect();
    let y: Vec<Obs> = [2.0, 4.0, 6.0, 8.0, 10.0].into_iter().map(Obs::value).collect();
    let fit = fit_capm(&y, &x).unwrap();
    assert!(fit.alpha.estimate.abs() < 1e-9);
    assert!((fit.beta.estimate - 2.0).abs() < 1e-9);
    assert!(fit.residual_std_dev < 1e-9);
    assert!((fit.r_squared - 1.0).abs() < 1e-9);
}

#[test]
fn test_fit_needs_three_pairs() {
    let x = vec![Obs::value(1.0), Obs::value(2.0)];
    let y = vec![Obs::value(1.0), Obs::value(2.0)];
    assert!(matches!(
        fit_capm(&y, &x),
        Err(CapmError::InsufficientData(_))
    ));
}

// ---------------------------------------------------------------------------
// Simulation & full pipeline
// ---------------------------------------------------------------------------

#[test]
fn test_simulation_is_reproducible() {
    let rt = derive_return_table(&sample_table()).unwrap();
    let market = rt.excess("SANDP").unwrap();
    let a = simulate_seeded(0.1, 1.2, market, 2.5, 1234).unwrap();
    let b = simulate_seeded(0.1, 1.2, market, 2.5, 1234).unwrap();
    assert_eq!(a, b);
    assert!(a[0].is_missing());
}

#[test]
fn test_analysis_envelope() {
    let input = CapmAnalysisInput {
        prices: sample_table(),
        settings: AnalysisSettings::new("FORD"),
    };
    let out = run_capm_analysis(&input).unwrap();
    assert_eq!(out.result.dependent, "FORD");
    assert_eq!(out.result.market, "SANDP");
    assert_eq!(out.result.fit.n, 6);
    // Six observations is well under the recommended sample size
    assert!(out.warnings.iter().any(|w| w.contains("fewer than recommended")));
    assert_eq!(out.assumptions["seed"], 1234);

    let json = serde_json::to_value(&out).unwrap();
    assert!(json["result"]["simulated"][0].is_null());
    assert!(json["result"]["intervals"]["beta"]["lower"].is_number());
}

#[test]
fn test_analysis_input_from_json() {
    let input = CapmAnalysisInput {
        prices: sample_table(),
        settings: AnalysisSettings::new("GE"),
    };
    let json = serde_json::to_string(&input).unwrap();
    let back: CapmAnalysisInput = serde_json::from_str(&json).unwrap();
    assert_eq!(back.settings, input.settings);
    assert_eq!(back.prices, input.prices);
}
