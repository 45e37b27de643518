use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn pricewatch_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pricewatch"))
}

const PRODUCTS: &str = "sku,name,current_price,cost_price,stock\n\
A1,Anvil,100.00,50.00,10\n\
B2,Bucket,50.00,45.00,250\n\
C3,Crate,20.00,18.00,5\n\
D4,Drum,80.00,20.00,150\n";

const SALES: &str = "sku,quantity_sold\n\
A1,25\n\
A1,15\n\
B2,0\n\
D4,12\n";

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(data_dir.join("products.csv"), PRODUCTS).unwrap();
    fs::write(data_dir.join("sales.csv"), SALES).unwrap();

    let config_content = format!(
        r#"[inputs]
products = "{root}/data/products.csv"
sales = "{root}/data/sales.csv"

[output]
path = "{root}/data/updated_prices.csv"

[log]
filter = "pricewatch=warn"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("pricewatch.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pricewatch(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pricewatch_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pricewatch binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn output_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data").join("updated_prices.csv")
}

#[test]
fn test_run_writes_price_list() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pricewatch(&config_path, &["run"]);
    assert!(success, "run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("products priced: 4"));
    assert!(stdout.contains("ok"));

    let body = fs::read_to_string(output_path(&tmp)).unwrap();
    assert_eq!(
        body,
        "sku,name,old_price,new_price,stock,quantity_sold\n\
         A1,Anvil,100.00,115.00,10,40\n\
         B2,Bucket,50.00,54.00,250,0\n\
         C3,Crate,20.00,21.60,5,0\n\
         D4,Drum,80.00,72.00,150,12\n"
    );
}

#[test]
fn test_run_is_byte_identical_on_rerun() {
    let (tmp, config_path) = setup_test_env();

    let (_, _, ok1) = run_pricewatch(&config_path, &["run"]);
    assert!(ok1);
    let first = fs::read(output_path(&tmp)).unwrap();

    let (_, _, ok2) = run_pricewatch(&config_path, &["run"]);
    assert!(ok2);
    let second = fs::read(output_path(&tmp)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_dry_run_writes_nothing() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_pricewatch(&config_path, &["run", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(!output_path(&tmp).exists());
}

#[test]
fn test_run_json_summary() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pricewatch(&config_path, &["run", "--json"]);
    assert!(success, "stderr={}", stderr);
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["products"], 4);
    assert_eq!(summary["floor_raised"], 2);
    assert_eq!(summary["missing_sales"], 1);
    assert_eq!(summary["rules_fired"]["Overstocked Inventory"], 1);
}

#[test]
fn test_missing_column_exits_nonzero() {
    let (tmp, config_path) = setup_test_env();
    fs::write(
        tmp.path().join("data").join("sales.csv"),
        "sku,sold\nA1,3\n",
    )
    .unwrap();

    let (_, stderr, success) = run_pricewatch(&config_path, &["run"]);
    assert!(!success);
    assert!(stderr.contains("quantity_sold"), "stderr={}", stderr);
    assert!(!output_path(&tmp).exists());
}

#[test]
fn test_bad_value_keeps_previous_output() {
    let (tmp, config_path) = setup_test_env();

    let (_, _, ok) = run_pricewatch(&config_path, &["run"]);
    assert!(ok);
    let before = fs::read(output_path(&tmp)).unwrap();

    fs::write(
        tmp.path().join("data").join("products.csv"),
        "sku,name,current_price,cost_price,stock\nA1,Anvil,abc,50.00,10\n",
    )
    .unwrap();

    let (_, stderr, success) = run_pricewatch(&config_path, &["run"]);
    assert!(!success);
    assert!(stderr.contains("current_price"), "stderr={}", stderr);
    assert_eq!(fs::read(output_path(&tmp)).unwrap(), before);
}

#[test]
fn test_path_flags_override_config() {
    let (tmp, config_path) = setup_test_env();
    let alt = tmp.path().join("alt.csv");

    let (_, _, success) = run_pricewatch(
        &config_path,
        &["--output", alt.to_str().unwrap(), "run"],
    );
    assert!(success);
    assert!(alt.exists());
    assert!(!output_path(&tmp).exists());
}

#[test]
fn test_rules_lists_chain_in_order() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_pricewatch(&config_path, &["rules"]);
    assert!(success);
    let low = stdout.find("Low Stock, High Demand").unwrap();
    let dead = stdout.find("Dead Stock").unwrap();
    let over = stdout.find("Overstocked Inventory").unwrap();
    let floor = stdout.find("Minimum Profit Constraint").unwrap();
    assert!(low < dead && dead < over && over < floor);
}

#[test]
fn test_disabled_rule_changes_prices() {
    let (tmp, config_path) = setup_test_env();
    let mut content = fs::read_to_string(&config_path).unwrap();
    content.push_str("\n[pricing]\ndisabled_rules = [\"Overstocked Inventory\"]\n");
    fs::write(&config_path, content).unwrap();

    let (stdout, _, success) = run_pricewatch(&config_path, &["rules"]);
    assert!(success);
    assert!(!stdout.contains("Overstocked Inventory"));

    let (_, _, success) = run_pricewatch(&config_path, &["run"]);
    assert!(success);
    let body = fs::read_to_string(output_path(&tmp)).unwrap();
    assert!(body.contains("D4,Drum,80.00,80.00,150,12"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_pricewatch(&missing, &["rules"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_init_scaffolds_config_once() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config").join("pricewatch.toml");

    let (stdout, _, success) = run_pricewatch(&path, &["init"]);
    assert!(success);
    assert!(stdout.contains("Wrote"));
    assert!(path.exists());

    let (_, stderr, success) = run_pricewatch(&path, &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_invalid_log_filter_is_config_error() {
    let (tmp, config_path) = setup_test_env();
    let content = fs::read_to_string(&config_path)
        .unwrap()
        .replace("pricewatch=warn", "pricewatch=loud");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_pricewatch(&config_path, &["run"]);
    assert!(!success);
    assert!(stderr.contains("log.filter"), "stderr={}", stderr);
    assert!(!output_path(&tmp).exists());
}

/// Kills the spawned monitor even when an assertion fails.
struct WatchProcess(Child);

impl Drop for WatchProcess {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn wait_for_output(path: &Path, expected: &str) -> Option<String> {
    let deadline = Instant::now() + Duration::from_secs(30);
    while Instant::now() < deadline {
        if let Ok(body) = fs::read_to_string(path) {
            if body.contains(expected) {
                return Some(body);
            }
        }
        thread::sleep(Duration::from_millis(50));
    }
    None
}

#[test]
fn test_watch_reprices_on_input_change() {
    let (tmp, config_path) = setup_test_env();
    let mut content = fs::read_to_string(&config_path).unwrap();
    content.push_str("\n[watch]\nsettle_ms = 50\n");
    fs::write(&config_path, content).unwrap();
    let output = output_path(&tmp);

    let child = Command::new(pricewatch_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("watch")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    let _watch = WatchProcess(child);

    // Startup pass runs without any notification.
    let first = wait_for_output(&output, "A1,Anvil,100.00,115.00,10,40");
    assert!(first.is_some(), "startup pass never wrote the price list");

    // Edits to the output file itself do not trigger a pass.
    fs::write(&output, "untouched").unwrap();
    thread::sleep(Duration::from_millis(500));
    assert_eq!(fs::read_to_string(&output).unwrap(), "untouched");

    fs::write(
        tmp.path().join("data").join("sales.csv"),
        "sku,quantity_sold\nA1,5\nD4,12\n",
    )
    .unwrap();

    let body = wait_for_output(&output, "A1,Anvil,100.00,100.00,10,5");
    let body = body.expect("change to sales.csv was not repriced");
    assert!(body.starts_with("sku,name,old_price,new_price,stock,quantity_sold\n"));
    assert!(body.contains("D4,Drum,80.00,72.00,150,12"));
}
