use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

fn harvestd() -> Command {
    let mut cmd = Command::cargo_bin("harvestd").expect("binary built");
    cmd.env_remove("HARVEST_CONFIG");
    cmd
}

#[test]
fn rank_prints_types_best_first() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("config.json");
    let actions = temp.path().join("actions.json");
    fs::write(&config, r#"{"desirability": {"measure_light": 0}}"#)?;
    fs::write(
        &actions,
        serde_json::json!([
            {"type": "report", "state": "completed", "time_completed_utc": 200},
            {"type": "measure_humidity", "state": "completed", "time_completed_utc": 100,
             "measurement": {"humidity": {"percentage": 40}}},
            {"type": "measure_light", "state": "completed"},
        ])
        .to_string(),
    )?;

    let out = harvestd()
        .arg("--config")
        .arg(&config)
        .arg("rank")
        .arg("--actions")
        .arg(&actions)
        .output()?;
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout)?;
    let ranked: Vec<&str> = stdout.lines().collect();
    assert_eq!(ranked.len(), 9);
    assert_eq!(&ranked[..3], ["measure_humidity", "report", "get_time_and_report"]);
    assert!(!ranked.contains(&"measure_light"));
    Ok(())
}

#[test]
fn encode_prints_frames_and_honours_ack() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config = temp.path().join("config.json");
    let items = temp.path().join("items.json");
    fs::write(&config, r#"{"device_id": "357520071700641"}"#)?;
    fs::write(
        &items,
        serde_json::json!([
            {"measurement": {"temperature": {"c_x100": 2150}}, "time_utc": 10},
            {"measurement": {"humidity": {"percentage": 55}}, "flags": 1, "time_utc": 20},
            {"measurement": {"wake_up": {"reason": "rtc"}}, "flags": 2, "time_utc": 5},
        ])
        .to_string(),
    )?;

    let out = harvestd()
        .env("HARVEST_CONFIG", &config)
        .arg("encode")
        .arg("--items")
        .arg(&items)
        .arg("--ack")
        .output()?;
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout)?;
    let frames: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line))
        .collect::<Result<_, _>>()?;
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame["v"], 1);
    assert_eq!(frame["n"], "357520071700641");
    assert_eq!(frame["i"], 0);
    let records = frame["r"].as_array().ok_or("records")?;
    assert_eq!(records.len(), 3);
    assert!(records[0].get("wkp").is_some());
    assert_eq!(records[1]["hum"]["a"], 1);
    assert_eq!(records[2]["tmp"]["c"], 2150);
    Ok(())
}

#[test]
fn undefined_flag_bits_in_fixtures_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let items = temp.path().join("items.json");
    fs::write(
        &items,
        serde_json::json!([
            {"measurement": {"temperature": {"c_x100": 1}}, "flags": 4, "time_utc": 50},
            {"measurement": {"humidity": {"percentage": 2}}, "flags": 1, "time_utc": 10},
        ])
        .to_string(),
    )?;
    let out = harvestd()
        .arg("encode")
        .arg("--items")
        .arg(&items)
        .output()?;
    assert!(out.status.success());
    let frame: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    let records = frame["r"].as_array().ok_or("records")?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["hum"]["a"], 1);
    assert!(records[1]["tmp"].get("a").is_none());
    Ok(())
}

#[test]
fn encode_rejects_a_buffer_too_small_for_the_header() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let items = temp.path().join("items.json");
    fs::write(
        &items,
        r#"[{"measurement": {"temperature": {"c_x100": 1}}}]"#,
    )?;
    harvestd()
        .arg("encode")
        .arg("--items")
        .arg(&items)
        .arg("--buffer")
        .arg("16")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn decode_ack_prints_index_or_fails() {
    let out = harvestd()
        .args(["decode-ack", "--device-id", "357520071700641", "--message"])
        .arg(r#" { "n" : "357520071700641" , "i" : 42 } "#)
        .output()
        .expect("run harvestd");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "42");

    harvestd()
        .args(["decode-ack", "--device-id", "357520071700640", "--message"])
        .arg(r#"{"n":"357520071700641","i":42}"#)
        .assert()
        .failure();

    harvestd()
        .args(["decode-ack", "--message", r#"{"i":1,"n":"harvest-node"}"#])
        .assert()
        .failure();
}
