use assert_cmd::Command;
use flate2::read::GzDecoder;
use std::io::Read;

fn decode(bytes: &[u8]) -> serde_json::Value {
    let mut text = String::new();
    GzDecoder::new(bytes).read_to_string(&mut text).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn command_build_progress_and_result() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let outfile = dir.path().join("graph.json.gz");

    let mut cmd = Command::cargo_bin("treegl")?;
    let output = cmd
        .arg("build")
        .arg("tests/newick/two.nwk")
        .arg("-o")
        .arg(&outfile)
        .output()?;
    assert!(output.status.success());

    // Progress events stream in server-push wire form
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("data: {"));
    assert!(stderr.contains("\"stage\":\"complete\""));
    assert!(stderr.contains("\"progress\":100.0"));

    let value = decode(&std::fs::read(&outfile)?);
    assert_eq!(value["nodes"].as_array().unwrap().len(), 8);
    assert_eq!(value["links"].as_array().unwrap().len(), 7);

    Ok(())
}

#[test]
fn command_build_error_event() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("treegl")?;
    let output = cmd.arg("build").arg("tests/newick/bad.nwk").output()?;
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("\"stage\":\"error\""));
    assert!(stderr.contains("MalformedInput"));

    Ok(())
}

#[test]
fn command_build_cache() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let cache_dir = dir.path().join("cache");

    let run = |outfile: &std::path::Path| -> anyhow::Result<Vec<u8>> {
        let mut cmd = Command::cargo_bin("treegl")?;
        cmd.arg("build")
            .arg("tests/newick/poly.nwk")
            .arg("--cache")
            .arg(&cache_dir)
            .arg("-o")
            .arg(outfile)
            .assert()
            .success();
        Ok(std::fs::read(outfile)?)
    };

    let first = run(&dir.path().join("first.json.gz"))?;
    assert_eq!(std::fs::read_dir(&cache_dir)?.count(), 1);

    let second = run(&dir.path().join("second.json.gz"))?;
    assert_eq!(first, second);

    Ok(())
}
