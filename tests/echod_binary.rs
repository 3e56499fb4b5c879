use assert_cmd::Command;

#[test]
fn test_binary_help() {
    let bin_path = env!("CARGO_BIN_EXE_wireline-echod");
    let mut cmd = Command::new(bin_path);
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("wireline-echod"));
}

#[test]
fn test_binary_rejects_bad_bind() {
    let bin_path = env!("CARGO_BIN_EXE_wireline-echod");
    let mut cmd = Command::new(bin_path);
    cmd.arg("--bind").arg("not-an-address").assert().failure();
}
