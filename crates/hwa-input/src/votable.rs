//! Minimal VOTable reader: FIELD declarations and TABLEDATA rows of a single table.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::point_set::InputField;
use crate::{InputError, InputResult};

/// Declared fields and the untouched cell text of every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVoTable {
    pub fields: Vec<InputField>,
    pub rows: Vec<Vec<String>>,
}

fn xml_err(e: impl std::fmt::Display) -> InputError {
    InputError::format(format!("malformed VOTable: {e}"))
}

fn field_from(start: &BytesStart<'_>) -> InputResult<InputField> {
    let mut field = InputField::default();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        match attr.key.local_name().as_ref() {
            b"name" => field.name = value,
            b"unit" => field.unit = Some(value),
            b"ucd" => field.ucd = Some(value),
            b"datatype" => field.datatype = Some(value),
            _ => {}
        }
    }
    if field.name.is_empty() {
        return Err(InputError::format("VOTable FIELD without a name"));
    }
    Ok(field)
}

pub fn parse_votable(text: &str) -> InputResult<RawVoTable> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut out = RawVoTable::default();
    let mut tables = 0usize;
    let mut saw_tabledata = false;
    let mut open_field: Option<InputField> = None;
    let mut in_description = false;
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<String> = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"TABLE" => {
                    tables += 1;
                    if tables > 1 {
                        return Err(InputError::format(
                            "multi-table VOTable input is not supported",
                        ));
                    }
                }
                b"FIELD" => open_field = Some(field_from(&e)?),
                b"DESCRIPTION" => in_description = open_field.is_some(),
                b"TABLEDATA" => saw_tabledata = true,
                b"TR" => row = Some(Vec::with_capacity(out.fields.len())),
                b"TD" => cell = Some(String::new()),
                b"BINARY" | b"BINARY2" | b"FITS" => {
                    return Err(InputError::format(
                        "only TABLEDATA serialization is supported",
                    ));
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"FIELD" => out.fields.push(field_from(&e)?),
                b"TD" => {
                    if let Some(row) = row.as_mut() {
                        row.push(String::new());
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                let text = t.unescape().map_err(xml_err)?;
                if let Some(cell) = cell.as_mut() {
                    cell.push_str(&text);
                } else if in_description {
                    if let Some(field) = open_field.as_mut() {
                        field.description = Some(text.into_owned());
                    }
                }
            }
            Event::CData(c) => {
                if let Some(cell) = cell.as_mut() {
                    cell.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"FIELD" => {
                    if let Some(field) = open_field.take() {
                        out.fields.push(field);
                    }
                }
                b"DESCRIPTION" => in_description = false,
                b"TD" => {
                    if let (Some(row), Some(cell)) = (row.as_mut(), cell.take()) {
                        row.push(cell.trim().to_string());
                    }
                }
                b"TR" => {
                    if let Some(row) = row.take() {
                        if row.len() != out.fields.len() {
                            return Err(InputError::format(format!(
                                "row {} has {} cells, {} fields declared",
                                out.rows.len() + 1,
                                row.len(),
                                out.fields.len()
                            )));
                        }
                        out.rows.push(row);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if out.fields.is_empty() {
        return Err(InputError::format("VOTable declares no FIELD"));
    }
    if !saw_tabledata {
        return Err(InputError::format("VOTable has no TABLEDATA"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<VOTABLE version="1.2" xmlns="http://www.ivoa.net/xml/VOTable/v1.2">
 <RESOURCE>
  <TABLE name="orbit">
   <FIELD name="Time" datatype="char" arraysize="*" ucd="time.epoch"/>
   <FIELD name="px" datatype="double" unit="km" ucd="pos.cartesian.x">
     <DESCRIPTION>Spacecraft X &amp; more</DESCRIPTION>
   </FIELD>
   <FIELD name="Y" datatype="double" unit="km"/>
   <FIELD name="Z" datatype="double" unit="km"/>
   <DATA><TABLEDATA>
    <TR><TD>2010-01-01T00:00:00</TD><TD>1</TD><TD>2</TD><TD>3</TD></TR>
    <TR><TD>2010-01-01T00:01:00</TD><TD>4</TD><TD/><TD>6</TD></TR>
   </TABLEDATA></DATA>
  </TABLE>
 </RESOURCE>
</VOTABLE>"#;

    #[test]
    fn fields_and_rows() {
        let raw = parse_votable(SAMPLE).unwrap();
        assert_eq!(raw.fields.len(), 4);
        assert_eq!(raw.fields[1].name, "px");
        assert_eq!(raw.fields[1].unit.as_deref(), Some("km"));
        assert_eq!(raw.fields[1].ucd.as_deref(), Some("pos.cartesian.x"));
        assert_eq!(
            raw.fields[1].description.as_deref(),
            Some("Spacecraft X & more")
        );
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[1], vec!["2010-01-01T00:01:00", "4", "", "6"]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let text = r#"<VOTABLE><RESOURCE><TABLE><FIELD name="x"/><FIELD name="y"/>
            <DATA><TABLEDATA><TR><TD>1</TD></TR></TABLEDATA></DATA></TABLE></RESOURCE></VOTABLE>"#;
        assert!(parse_votable(text).is_err());
    }

    #[test]
    fn binary_serialization_rejected() {
        let text = r#"<VOTABLE><RESOURCE><TABLE><FIELD name="x"/>
            <DATA><BINARY><STREAM encoding="base64">AAAA</STREAM></BINARY></DATA></TABLE></RESOURCE></VOTABLE>"#;
        assert!(parse_votable(text).is_err());
    }
}
