use std::io::Write;

use tempfile::NamedTempFile;

use super::{read_file, read_identifiers, read_rows};
use crate::objects::carrier::Carrier;

#[test]
fn test_read_rows() {
    let input = "8955000001;Claro\n\
                 8955000002;\n\
                 8955 000 003\n\
                 ;Tim\n\
                 \n\
                 8955000004; quectel vivo \n\
                 8955000005;Oi\n";
    let plan = read_rows(input.as_bytes(), b';', Some(Carrier::Tim)).unwrap();
    assert_eq!(
        vec![
            (String::from("8955000001"), Carrier::Claro),
            (String::from("8955000002"), Carrier::Tim),
            (String::from("8955 000 003"), Carrier::Tim),
            (String::from("8955000004"), Carrier::QuectelVivo),
        ],
        plan.items().to_vec()
    );
    // an unknown carrier never falls back to the default
    assert_eq!(vec![String::from("8955000005")], plan.skipped().to_vec());
}

#[test]
fn test_read_rows_without_default() {
    let input = "1,Vivo\n2\n3,Arquia\n";
    let plan = read_rows(input.as_bytes(), b',', None).unwrap();
    assert_eq!(2, plan.items().len());
    assert_eq!(vec![String::from("2")], plan.skipped().to_vec());
}

#[test]
fn test_read_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "111;Tim").unwrap();
    writeln!(file, "222;Tim;extra column").unwrap();
    writeln!(file, "333;Vivo").unwrap();
    let plan = read_file(file.path(), b';', None).unwrap();
    assert_eq!(3, plan.items().len());
    assert!(plan.skipped().is_empty());
    assert!(read_file("./does-not-exist.csv", b';', None).is_err());
}

#[test]
fn test_predominant_carrier() {
    let plan = read_rows("1;Vivo\n2;Tim\n3;Tim\n4;Vivo\n5;Tim\n".as_bytes(), b';', None).unwrap();
    assert_eq!(Some(Carrier::Tim), plan.predominant_carrier());
    let tied = read_rows("1;Vivo\n2;Tim\n".as_bytes(), b';', None).unwrap();
    assert_eq!(Some(Carrier::Vivo), tied.predominant_carrier());
    let empty = read_rows("".as_bytes(), b';', None).unwrap();
    assert_eq!(None, empty.predominant_carrier());
}

#[test]
fn test_read_identifiers() {
    let input = " 8955000001 \n\n8955-000-002\r\n   \n8955000003";
    let ids = read_identifiers(input.as_bytes()).unwrap();
    assert_eq!(
        vec![String::from("8955000001"), String::from("8955-000-002"), String::from("8955000003")],
        ids
    );
}
