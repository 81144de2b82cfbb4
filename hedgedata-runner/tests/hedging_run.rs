//! Integration tests for the hedging backtest: prepared datasets in, one log
//! per (dataset, model) out, readable by the log summary.

use std::path::Path;

use hedgedata_runner::{run_hedging, run_pipeline, summarize_logs, HedgeError, PipelineConfig};

fn small_config(dir: &Path) -> PipelineConfig {
    let mut cfg = PipelineConfig::default();
    cfg.data_dir = dir.join("data");
    cfg.live.offline = true;
    cfg.mock_export.seed = Some(5);
    cfg.hedge.logs_dir = dir.join("logs");
    cfg.hedge.binomial_steps = 50;
    cfg.hedge.mc_paths = 200;
    cfg.hedge.mc_steps = 4;
    cfg
}

#[test]
fn prepared_datasets_produce_nine_summarizable_logs() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = small_config(tmp.path());
    run_pipeline(&cfg, None).unwrap();

    let runs = run_hedging(&cfg).unwrap();
    assert_eq!(runs.len(), 9);
    let names: Vec<String> = runs
        .iter()
        .map(|r| r.log_path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names[0], "result_BlackScholes_yfinance.csv");
    assert_eq!(names[4], "result_Binomial_synthetic.csv");
    assert_eq!(names[8], "result_MonteCarlo_bloomberg_export.csv");

    // Every dataset lies before the 2024-12-30 expiry.
    assert_eq!(runs[0].rows, 252);
    assert_eq!(runs[8].rows, 100);

    let summaries = summarize_logs(&cfg.hedge.logs_dir).unwrap();
    assert_eq!(summaries.len(), 9);
    for s in &summaries {
        assert!(s.mean_error.is_finite(), "{}", s.model);
    }
}

#[test]
fn black_scholes_hedge_tracks_its_own_price_closely() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = small_config(tmp.path());
    run_pipeline(&cfg, None).unwrap();

    let runs = run_hedging(&cfg).unwrap();
    let bs = runs
        .iter()
        .find(|r| r.model == "BlackScholes" && r.dataset == "synthetic")
        .unwrap();
    let mut rdr = csv::Reader::from_path(&bs.log_path).unwrap();
    let first = rdr.records().next().unwrap().unwrap();
    let premium: f64 = first[3].parse().unwrap();
    assert!(first[8].parse::<f64>().unwrap().abs() < 1e-9);

    // Daily rebalancing leaves a residual well below the premium received.
    let error = bs.final_error.unwrap();
    assert!(error.abs() < 0.5 * premium, "final hedging error {error} vs premium {premium}");
}

#[test]
fn missing_datasets_are_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = small_config(tmp.path());
    std::fs::create_dir_all(&cfg.data_dir).unwrap();
    hedgedata_runner::produce_synthetic(&cfg.synthetic, &cfg.synthetic_path()).unwrap();

    let runs = run_hedging(&cfg).unwrap();
    assert_eq!(runs.len(), 3);
    assert!(runs.iter().all(|r| r.dataset == "synthetic"));
}

#[test]
fn invalid_hedge_config_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = small_config(tmp.path());
    cfg.hedge.mc_paths = 0;
    assert!(matches!(run_hedging(&cfg), Err(HedgeError::Config(_))));
    assert!(!cfg.hedge.logs_dir.exists());
}
