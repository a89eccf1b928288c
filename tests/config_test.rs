use std::fs;

use ndarray::Array3;
use tempfile::tempdir;
use topdown_rnn::{RnnConfig, RnnError, TopDownLSTM, RAN};

#[test]
fn test_config_from_json_file() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("top_down.json");
    fs::write(
        &file_path,
        r#"{
            "input_size": 6,
            "hidden_size": 8,
            "num_layers": 3,
            "batch_first": true,
            "dropout": 0.1
        }"#,
    )
    .unwrap();

    let config = RnnConfig::from_json_file(&file_path).unwrap();
    assert_eq!(config.num_layers, 3);
    assert!(config.use_bias);
    assert!(config.batch_first);

    let network = TopDownLSTM::new(config).unwrap();
    let (output, (h_n, _)) = network.forward(&Array3::zeros((2, 4, 6)), None, None).unwrap();
    assert_eq!(output.shape(), &[2, 4, 8]);
    assert_eq!(h_n.shape(), &[3, 2, 8]);
}

#[test]
fn test_config_round_trip_through_file() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("ran.json");
    let config = RnnConfig::new(4, 2).with_num_layers(2).with_bias(false).with_layernorm(true);

    fs::write(&file_path, config.to_json_string().unwrap()).unwrap();
    let loaded = RnnConfig::from_json_file(&file_path).unwrap();

    assert_eq!(loaded, config);
    let network = RAN::new(loaded).unwrap();
    assert!(network.cells().iter().all(|cell| cell.bias.is_none() && cell.layernorm));
}

#[test]
fn test_missing_config_file() {
    let dir = tempdir().unwrap();
    let result = RnnConfig::from_json_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(RnnError::Io(_))));
}

#[test]
fn test_loaded_config_is_validated_on_construction() {
    let config = RnnConfig::from_json_str(r#"{"input_size": 3, "hidden_size": 3, "num_layers": 1}"#).unwrap();
    assert!(RAN::new(config.clone()).is_ok());
    assert!(matches!(TopDownLSTM::new(config), Err(RnnError::Config(_))));
}
