use assert_cmd::Command;

#[test]
fn check_config_loads_defaults() {
    Command::cargo_bin("folio")
        .unwrap()
        .arg("check-config")
        .assert()
        .success();
}

#[test]
fn openapi_prints_the_merged_document() {
    let assert = Command::cargo_bin("folio")
        .unwrap()
        .arg("openapi")
        .assert()
        .success();

    let spec: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(spec["info"]["title"], "FOLIO API");
    assert!(spec["paths"]
        .as_object()
        .unwrap()
        .keys()
        .any(|path| path.starts_with("/api/interests")));
}
