use std::io::Write;

use tempfile::{NamedTempFile, TempDir};

use super::{run, Command};
use crate::control::export::ExportFormat;
use crate::database::{sqlite::SQLite, InventoryStore};
use crate::objects::carrier::Carrier;
use crate::objects::chip::ChipStatus;

fn setup_tests() -> (TempDir, SQLite) {
    let dir = TempDir::new().unwrap();
    let mut sqlite = SQLite::open(dir.path().join("control.sqlite")).unwrap();
    sqlite.setup().unwrap();
    (dir, sqlite)
}

fn import_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

#[test]
fn test_import_creates_shipment() {
    let (_dir, mut sqlite) = setup_tests();
    sqlite.register_chip("3003", Carrier::Vivo, None, "").unwrap();
    let file = import_file(&["1001;Tim", "2002", "3003;Vivo", "4004;Oi", "abc;Tim"]);
    run(Command::Import {
        file: file.path().to_path_buf(),
        carrier: None,
        notes: String::from("monday delivery"),
        delimiter: ';',
    }, &mut sqlite).unwrap();

    let shipments = sqlite.list_shipments().unwrap();
    assert_eq!(1, shipments.len());
    let shipment = &shipments[0];
    // 2002 has no carrier and there is no default, 4004 names an unknown one
    assert_eq!(3, shipment.quantity());
    assert_eq!(Some("Tim"), shipment.carrier());
    assert_eq!("monday delivery", shipment.notes());
    let chips = sqlite.get_chips_for_shipment(shipment.id()).unwrap();
    assert_eq!(1, chips.len());
    assert_eq!("1001", chips[0].iccid());
}

#[test]
fn test_import_with_default_carrier() {
    let (_dir, mut sqlite) = setup_tests();
    let file = import_file(&["1001", "2002;Claro", "3003"]);
    run(Command::Import {
        file: file.path().to_path_buf(),
        carrier: Some(Carrier::Arquia),
        notes: String::new(),
        delimiter: ';',
    }, &mut sqlite).unwrap();
    let shipment = &sqlite.list_shipments().unwrap()[0];
    assert_eq!(Some("Arquia"), shipment.carrier());
    assert_eq!(3, sqlite.get_chips_for_shipment(shipment.id()).unwrap().len());
    assert_eq!(Carrier::Claro, sqlite.get_chip("2002").unwrap().carrier());
}

#[test]
fn test_import_nothing_usable() {
    let (_dir, mut sqlite) = setup_tests();
    let file = import_file(&["1001", "2002"]);
    let result = run(Command::Import {
        file: file.path().to_path_buf(),
        carrier: None,
        notes: String::new(),
        delimiter: ';',
    }, &mut sqlite);
    assert!(result.is_err());
    // no empty shipment is left behind
    assert!(sqlite.list_shipments().unwrap().is_empty());
}

#[test]
fn test_withdraw_from_file() {
    let (_dir, mut sqlite) = setup_tests();
    for iccid in ["1", "2", "3"] {
        sqlite.register_chip(iccid, Carrier::Claro, None, "").unwrap();
    }
    let file = import_file(&["1", "", "2", "9"]);
    run(Command::Withdraw {
        iccids: vec![String::from("3")],
        file: Some(file.path().to_path_buf()),
        withdrawn_by: String::from("Ana"),
    }, &mut sqlite).unwrap();
    let stats = sqlite.compute_statistics().unwrap();
    assert_eq!(3, stats.withdrawn);
    assert_eq!(0, stats.available);
}

#[test]
fn test_withdraw_single_reports_failure() {
    let (_dir, mut sqlite) = setup_tests();
    sqlite.register_chip("1", Carrier::Claro, None, "").unwrap();
    let withdraw = |id: &str| Command::Withdraw {
        iccids: vec![String::from(id)],
        file: None,
        withdrawn_by: String::from("Ana"),
    };
    assert!(run(withdraw("1"), &mut sqlite).is_ok());
    assert!(run(withdraw("1"), &mut sqlite).is_err());
    assert!(run(Command::Withdraw { iccids: vec![], file: None, withdrawn_by: String::from("Ana") }, &mut sqlite).is_err());
}

#[test]
fn test_list_export() {
    let (dir, mut sqlite) = setup_tests();
    sqlite.register_chip("1", Carrier::Claro, None, "").unwrap();
    sqlite.register_chip("2", Carrier::Tim, None, "").unwrap();
    let path = dir.path().join("claro.csv");
    run(Command::List {
        carrier: Some(Carrier::Claro),
        status: Some(ChipStatus::Available),
        export: Some(path.clone()),
        format: ExportFormat::Csv,
        delimiter: ';',
    }, &mut sqlite).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(2, lines.len());
    assert!(lines[1].starts_with("1;Claro;Available;"));
    assert!(run(Command::List {
        carrier: None,
        status: None,
        export: Some(path),
        format: ExportFormat::Csv,
        delimiter: 'é',
    }, &mut sqlite).is_err());
}

#[test]
fn test_delete_shipment_command() {
    let (_dir, mut sqlite) = setup_tests();
    let (id, _) = sqlite.create_shipment(None, None, 1, "").unwrap();
    sqlite.register_chip("1", Carrier::Claro, Some(id), "").unwrap();
    assert!(run(Command::DeleteShipment { id, cascade: true }, &mut sqlite).is_ok());
    assert_eq!(0, sqlite.compute_statistics().unwrap().total);
    assert!(run(Command::DeleteShipment { id, cascade: false }, &mut sqlite).is_err());
    assert!(run(Command::Shipment { id }, &mut sqlite).is_err());
}
