use assert_cmd::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const HEADER: &str = "Invoice ID,Branch,City,Customer ID,Customer type,Gender,Product line,Unit price,Quantity,Tax 5%,Total,Date,Time,Payment,cogs,gross margin percentage,gross income,Rating";

const ROWS: [&str; 3] = [
    "750-67-8428,A,Yangon,C001,Member,Female,Health and beauty,74.69,7,26.1415,548.9715,05/01/2019,13:08,Ewallet,522.83,4.761904762,26.1415,9.1",
    "226-31-3081,C,Naypyitaw,C002,Normal,Female,Electronic accessories,15.28,5,3.82,80.22,08/03/19,10:29,Cash,76.4,4.761904762,3.82,9.6",
    "631-41-3108,A,Yangon,C002,Normal,Male,Home and lifestyle,46.33,7,16.2155,340.5255,03/03/2019,13:23,Credit card,324.31,4.761904762,16.2155,7.4",
];

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(header: &str, rows: &[&str]) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mut text = header.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        fs::write(dir.path().join("sales.csv"), text).expect("failed to write fixture");
        Self { dir }
    }

    fn data(&self) -> PathBuf {
        self.dir.path().join("sales.csv")
    }

    fn run(&self, args: &[&str]) -> Output {
        let data = self.data();
        Command::new(env!("CARGO_BIN_EXE_retail-insights"))
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--data")
            .arg(&data)
            .args(args)
            .output()
            .expect("failed to run retail-insights")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn top_customers_as_csv() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let output = fixture.run(&["--format", "csv", "report", "top-customers"]);
    output.clone().assert().success();
    assert_eq!(
        stdout(&output),
        "Customer,Total Spend,Transactions\nC001,548.97,1\nC002,420.75,2\n"
    );
}

#[test]
fn top_customers_limit_flag() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let output = fixture.run(&["--format", "csv", "report", "top-customers", "--limit", "1"]);
    output.clone().assert().success();
    assert_eq!(stdout(&output), "Customer,Total Spend,Transactions\nC001,548.97,1\n");
}

#[test]
fn repeat_customers_within_window() {
    // C002 bought on 3 and 8 March.
    let fixture = Fixture::new(HEADER, &ROWS);
    let output = fixture.run(&["--format", "csv", "report", "repeat-customers"]);
    output.clone().assert().success();
    assert_eq!(
        stdout(&output),
        "Customer,First Purchase,Paired Purchase,Frequency\nC002,2019-03-03,2019-03-08,1\n"
    );

    let output = fixture.run(&["--format", "csv", "report", "repeat-customers", "--window-days", "2"]);
    output.clone().assert().success();
    assert_eq!(stdout(&output), "Customer,First Purchase,Paired Purchase,Frequency\n");
}

#[test]
fn all_reports_as_json() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let output = fixture.run(&["--format", "json", "report", "all"]);
    output.clone().assert().success();

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    let reports = value.as_array().expect("array of reports");
    assert_eq!(reports.len(), 10);
    assert_eq!(reports[4]["title"], "Most popular payment method per city");
    assert_eq!(reports[4]["rows"][0]["City"], "Naypyitaw");
    assert_eq!(reports[4]["rows"][0]["Payment Method"], "Cash");

    let top = &reports[8]["rows"][0];
    assert_eq!(top["Customer"], "C001");
    assert_eq!(top["Total Spend"].as_f64(), Some(548.97));
    assert_eq!(top["Transactions"].as_u64(), Some(1));
}

#[test]
fn terminal_table_is_the_default() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let output = fixture.run(&["report", "weekday-trend"]);
    output.clone().assert().success();
    let text = stdout(&output);
    assert!(text.starts_with("Sales by weekday"));
    assert!(text.contains("Saturday"));
}

#[test]
fn report_to_file() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let target = fixture.dir.path().join("out.csv");
    let output = fixture.run(&[
        "--format",
        "csv",
        "--output",
        target.to_str().unwrap(),
        "report",
        "customer-type-preference",
    ]);
    output.clone().assert().success();
    assert!(stdout(&output).is_empty());
    let written = fs::read_to_string(&target).unwrap();
    assert!(written.starts_with("Customer Type,Product Line,Revenue\n"));
    assert!(written.contains("Member,Health and beauty,548.97"));
}

#[test]
fn missing_column_fails_before_any_report() {
    let header = HEADER.replace("Customer ID,", "");
    let rows: Vec<String> = ROWS
        .iter()
        .map(|r| {
            let mut cells: Vec<&str> = r.split(',').collect();
            cells.remove(3);
            cells.join(",")
        })
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let fixture = Fixture::new(&header, &rows);

    let output = fixture.run(&["report", "top-customers"]);
    output.clone().assert().failure();
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("Customer ID"));
}

#[test]
fn bad_rows_are_skipped_unless_aborting() {
    let bad = ROWS[1].replace("08/03/19", "2019-03-08");
    let fixture = Fixture::new(HEADER, &[ROWS[0], &bad, ROWS[2]]);

    let output = fixture.run(&["--format", "csv", "report", "top-customers"]);
    output.clone().assert().success();
    assert_eq!(
        stdout(&output),
        "Customer,Total Spend,Transactions\nC001,548.97,1\nC002,340.53,1\n"
    );
    assert!(stderr(&output).contains("Skipping invalid row"));

    let output = fixture.run(&["--on-parse-error", "abort", "report", "top-customers"]);
    output.clone().assert().failure();
    assert!(stderr(&output).contains("Row 2"));

    let output = fixture.run(&["--format", "csv", "validate"]);
    output.clone().assert().failure();
    assert!(stdout(&output).contains("# Rejected rows"));
    assert!(stderr(&output).contains("1 row(s) failed validation"));
}

#[test]
fn undecodable_row_is_skipped() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let mut bytes = fs::read(fixture.data()).unwrap();
    let at = bytes
        .windows(6)
        .position(|w| w == b"Yangon")
        .unwrap();
    bytes[at + 1] = 0xFF;
    fs::write(fixture.data(), bytes).unwrap();

    let output = fixture.run(&["--format", "csv", "report", "top-customers"]);
    output.clone().assert().success();
    assert_eq!(
        stdout(&output),
        "Customer,Total Spend,Transactions\nC002,420.75,2\n"
    );

    let output = fixture.run(&["--on-parse-error", "abort", "report", "top-customers"]);
    output.clone().assert().failure();
    assert!(stderr(&output).contains("not valid UTF-8"));
}

#[test]
fn clean_table_validates() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let output = fixture.run(&["--format", "csv", "validate"]);
    output.clone().assert().success();
    assert!(stdout(&output).contains("Transactions,Customers,Branches"));
    assert!(stdout(&output).contains("3,2,2,2019-01-05,2019-03-08,969.72"));
}

#[test]
fn config_file_parameters_apply() {
    let fixture = Fixture::new(HEADER, &ROWS);
    let config = fixture.dir.path().join("custom.toml");
    fs::write(&config, "[reports]\ntop_customers = 1\n").unwrap();

    let output = fixture.run(&[
        "--config",
        config.to_str().unwrap(),
        "--format",
        "csv",
        "report",
        "top-customers",
    ]);
    output.clone().assert().success();
    assert_eq!(stdout(&output), "Customer,Total Spend,Transactions\nC001,548.97,1\n");
}

#[test]
fn missing_data_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_retail-insights"))
        .current_dir(dir.path())
        .args(["report", "weekday-trend"])
        .output()
        .unwrap();
    output.clone().assert().failure();
    assert!(stderr(&output).contains("No dataset given"));
}
