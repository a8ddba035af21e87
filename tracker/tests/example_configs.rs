use std::{collections::HashSet, fs, path::Path};
use tracker_lib::{config::Config, predictor::OngoingPass};

const CONFIG_FILES: &[&str] = &["live.toml", "offline.toml"];

#[test]
fn example_config_file_list_matches_expected() {
    let cfg_files: HashSet<String> = fs::read_dir("../configs")
        .unwrap()
        .map(|d| d.unwrap().file_name().into_string().unwrap())
        .collect();
    let expected: HashSet<String> = CONFIG_FILES.iter().map(|f| f.to_string()).collect();
    assert_eq!(cfg_files, expected, "Example configs directory is missing an expected config file or contains a new config file that should be tested");
}

#[test]
fn example_config_files_parse() {
    let dir = Path::new("../configs");
    for cfg_file in CONFIG_FILES {
        let p = dir.join(cfg_file);
        if let Err(e) = Config::load(&p) {
            panic!("{}: {e}", p.display());
        }
    }
}

#[test]
fn offline_config() {
    let cfg = Config::load("../configs/offline.toml").unwrap();
    assert_eq!(cfg.propagator_config().unwrap().max_tle_age, None);
    assert_eq!(cfg.predictor_config().unwrap().ongoing_pass, OngoingPass::Skip);
}
