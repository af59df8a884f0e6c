use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("linear_road_{}_{}", std::process::id(), name))
}

fn run_generator(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_linear_road"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute generator")
}

/// Test that a short run writes both files and logs its report
#[test]
fn test_generator_writes_data_and_tolls() {
    let data = scratch_path("car.dat");
    let tolls = scratch_path("car.dat.tolls.dat");
    let data_arg = data.to_string_lossy().into_owned();

    let output = run_generator(&[
        "-x",
        "2",
        "-o",
        &data_arg,
        "--sim-length",
        "60",
        "--cars-per-tick",
        "1",
        "--seed",
        "7",
    ]);

    assert!(
        output.status.success(),
        "Generator failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Generator did not complete properly. stderr: {}",
        stderr
    );
    assert!(stderr.contains("Cars created:"), "Missing 'Cars created' statistic");
    assert!(
        stderr.contains("Total notifications:"),
        "Missing 'Total notifications' statistic"
    );

    let records = fs::read_to_string(&data).expect("data file written");
    assert!(records.lines().count() > 0);
    assert!(records.lines().all(|line| line.split(',').count() == 15));

    let toll_records = fs::read_to_string(&tolls).expect("toll file written next to data");
    assert!(toll_records.lines().count() > 0);
    assert_eq!(toll_records.lines().count() % 69, 0);

    let _ = fs::remove_file(&data);
    let _ = fs::remove_file(&tolls);
}

/// Test that the multi-threaded mode produces output on stdout
#[test]
fn test_generator_parallel_to_stdout() {
    let tolls = scratch_path("stdout.tolls.dat");
    let tolls_arg = tolls.to_string_lossy().into_owned();

    let output = run_generator(&[
        "-x",
        "2",
        "-m",
        "-o",
        "-",
        "--tolls",
        &tolls_arg,
        "--sim-length",
        "30",
        "--cars-per-tick",
        "1",
    ]);

    assert!(
        output.status.success(),
        "Generator failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() > 0);
    assert!(stdout.lines().all(|line| line.starts_with(['0', '2', '3'])));
    assert!(tolls.exists());

    let _ = fs::remove_file(&tolls);
}

/// Test that invalid expressway counts are rejected before any work
#[test]
fn test_generator_rejects_bad_xway_count() {
    for bad in ["0", "abc"] {
        let output = run_generator(&["-x", bad, "-o", "-", "--sim-length", "1"]);
        assert!(!output.status.success(), "accepted -x {}", bad);
        assert!(output.stdout.is_empty());
    }
}

/// Test that an unwritable output path is fatal
#[test]
fn test_generator_fails_on_bad_output_path() {
    let missing = scratch_path("no_such_dir").join("car.dat");
    let missing_arg = missing.to_string_lossy().into_owned();
    let tolls = scratch_path("bad_output.tolls.dat");
    let tolls_arg = tolls.to_string_lossy().into_owned();

    let output = run_generator(&["-o", &missing_arg, "--tolls", &tolls_arg, "--sim-length", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to create output file"), "stderr: {}", stderr);

    let _ = fs::remove_file(&tolls);
}

/// Test that an unwritable toll path is fatal before any data is generated
#[test]
fn test_generator_fails_on_bad_toll_path_before_running() {
    let data = scratch_path("bad_tolls_car.dat");
    let data_arg = data.to_string_lossy().into_owned();
    let missing = scratch_path("no_such_toll_dir").join("tolls.dat");
    let missing_arg = missing.to_string_lossy().into_owned();

    let output = run_generator(&["-o", &data_arg, "--tolls", &missing_arg, "--sim-length", "300"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to create toll file"), "stderr: {}", stderr);
    assert!(!stderr.contains("SIMULATION COMPLETE"), "stderr: {}", stderr);
    assert!(!data.exists(), "data file should not be created");
}
