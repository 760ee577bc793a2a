use std::fs;

use hwa_catalog::Catalog;
use hwa_input::{InputError, InputFormat, PointSetReader, ReadOptions, detect_format};

#[test]
fn plain_file_in_kilometres() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("points.txt");
    fs::write(&path, "# X Y Z [km]\n1 0 0\n0 2 0\n0 0 3.5\n").expect("write");

    let catalog = Catalog::standard();
    let reader = PointSetReader::new(&catalog);
    let options = ReadOptions {
        position_coeff: 1000.0,
        ..ReadOptions::default()
    };
    let set = reader.read(&path, &options).expect("read");

    assert_eq!(set.format, InputFormat::Plain);
    assert_eq!(
        set.positions(),
        vec![[1000.0, 0.0, 0.0], [0.0, 2000.0, 0.0], [0.0, 0.0, 3500.0]]
    );
    assert_eq!(set.raw_rows[2], vec!["0", "0", "3.5"]);
}

#[test]
fn votable_file_keeps_original_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orbit.vot");
    fs::write(
        &path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<VOTABLE version="1.2">
  <RESOURCE>
    <TABLE>
      <FIELD name="Time" datatype="char" arraysize="*" ucd="time.epoch"/>
      <FIELD name="X" datatype="double" unit="km"/>
      <FIELD name="Y" datatype="double" unit="km"/>
      <FIELD name="Z" datatype="double" unit="km"/>
      <FIELD name="Flag" datatype="int"/>
      <DATA>
        <TABLEDATA>
          <TR><TD>2012-05-01T10:00:00.000</TD><TD>7000</TD><TD>0</TD><TD>0</TD><TD>1</TD></TR>
          <TR><TD>2012-05-01T10:00:30.000</TD><TD>7001</TD><TD>10</TD><TD>-10</TD><TD>0</TD></TR>
        </TABLEDATA>
      </DATA>
    </TABLE>
  </RESOURCE>
</VOTABLE>"#,
    )
    .expect("write");

    assert_eq!(detect_format(&path).expect("detect"), InputFormat::VoTable);

    let catalog = Catalog::standard();
    let set = PointSetReader::new(&catalog)
        .read(&path, &ReadOptions::default())
        .expect("read");

    assert!(set.has_time());
    assert_eq!(set.fields.len(), 5);
    assert_eq!(set.fields[4].name, "Flag");
    assert_eq!(set.positions()[1], [7_001_000.0, 10_000.0, -10_000.0]);
    assert_eq!(set.raw_rows[1][4], "0");
}

#[test]
fn missing_file_is_io_error() {
    let catalog = Catalog::standard();
    let err = PointSetReader::new(&catalog)
        .read(
            std::path::Path::new("/nonexistent/hwa/points.txt"),
            &ReadOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, InputError::Io { .. }));
}
