use std::fs::File;
use std::io::Write;

use litter_config::{ReadingRow, load_readings_csv};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("readings.csv");
    let mut f = File::create(&path).unwrap();
    for l in lines {
        writeln!(f, "{l}").unwrap();
    }
    (dir, path)
}

#[rstest]
fn loads_numbers_and_absent_markers() {
    let (_dir, path) = write_csv(&[
        "at_ms,grams",
        "0,5012.5",
        "1000,",
        "2000,unavailable",
        "3000,Unknown",
        "4000,5013",
    ]);
    let rows = load_readings_csv(&path).expect("load");
    assert_eq!(
        rows,
        vec![
            ReadingRow {
                at_ms: 0,
                grams: Some(5012.5)
            },
            ReadingRow {
                at_ms: 1000,
                grams: None
            },
            ReadingRow {
                at_ms: 2000,
                grams: None
            },
            ReadingRow {
                at_ms: 3000,
                grams: None
            },
            ReadingRow {
                at_ms: 4000,
                grams: Some(5013.0)
            },
        ]
    );
}

#[rstest]
fn rejects_wrong_headers() {
    let (_dir, path) = write_csv(&["time,weight", "0,1.0"]);
    let err = load_readings_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers 'at_ms,grams'"));
}

#[rstest]
fn rejects_garbage_grams_with_row_number() {
    let (_dir, path) = write_csv(&["at_ms,grams", "0,1.0", "1000,heavy"]);
    let err = load_readings_csv(&path).expect_err("garbage cell");
    assert!(format!("{err}").contains("invalid CSV row 3"), "{err}");
}

#[rstest]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_readings_csv(&dir.path().join("nope.csv")).expect_err("missing");
    assert!(format!("{err}").contains("open readings CSV"));
}
