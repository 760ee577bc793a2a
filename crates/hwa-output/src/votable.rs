//! VOTable 1.2 output.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use hwa_catalog::Catalog;
use hwa_core::{Real, format_value, is_missing};
use hwa_input::{InputFormat, PointSet};
use quick_xml::escape::escape;

use crate::columns::{Joined, PhysicalColumn};

const VOTABLE_NS: &str = "http://www.ivoa.net/xml/VOTable/v1.2";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValues {
    Reals(Vec<Real>),
    Ints(Vec<i64>),
    /// Cells echoed verbatim from the caller's input.
    Text(Vec<String>),
}

impl CellValues {
    pub fn len(&self) -> usize {
        match self {
            CellValues::Reals(v) => v.len(),
            CellValues::Ints(v) => v.len(),
            CellValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, row: usize) -> String {
        match self {
            CellValues::Reals(v) if is_missing(v[row]) => "NaN".to_string(),
            CellValues::Reals(v) => format_value(v[row]),
            CellValues::Ints(v) => v[row].to_string(),
            CellValues::Text(v) => escape(v[row].as_str()).into_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoField {
    pub name: String,
    pub datatype: String,
    pub unit: Option<String>,
    pub ucd: Option<String>,
    pub xtype: Option<String>,
    pub description: Option<String>,
    pub values: CellValues,
}

impl VoField {
    pub fn reals(name: impl Into<String>, values: Vec<Real>) -> Self {
        Self {
            name: name.into(),
            datatype: "double".into(),
            unit: None,
            ucd: None,
            xtype: None,
            description: None,
            values: CellValues::Reals(values),
        }
    }

    pub fn ints(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            datatype: "int".into(),
            values: CellValues::Ints(values),
            ..Self::reals(name, Vec::new())
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_ucd(mut self, ucd: impl Into<String>) -> Self {
        self.ucd = Some(ucd.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A table-level constant, e.g. the edges of the energy channels.
#[derive(Debug, Clone, PartialEq)]
pub struct VoParam {
    pub name: String,
    pub datatype: String,
    pub unit: Option<String>,
    pub ucd: Option<String>,
    pub values: Vec<Real>,
}

impl VoParam {
    pub fn reals(name: impl Into<String>, values: Vec<Real>) -> Self {
        Self {
            name: name.into(),
            datatype: "double".into(),
            unit: None,
            ucd: None,
            values,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_ucd(mut self, ucd: impl Into<String>) -> Self {
        self.ucd = Some(ucd.into());
        self
    }

    fn write(&self, out: &mut String) {
        let value: Vec<String> = self.values.iter().map(|v| v.to_string()).collect();
        let _ = write!(
            out,
            r#"<PARAM name="{}" datatype="{}" arraysize="{}""#,
            escape(self.name.as_str()),
            escape(self.datatype.as_str()),
            self.values.len()
        );
        for (attr, value) in [("unit", &self.unit), ("ucd", &self.ucd)] {
            if let Some(value) = value {
                let _ = write!(out, r#" {attr}="{}""#, escape(value.as_str()));
            }
        }
        let _ = writeln!(out, r#" value="{}"/>"#, value.join(" "));
    }
}

/// Fields for a joined result: the caller's own VOTable columns verbatim when
/// the input was a VOTable, otherwise time and engine positions; then one
/// field per requested variable.
pub fn fields_for(joined: &Joined<'_>, catalog: &Catalog) -> Vec<VoField> {
    let input = joined.input;
    let mut fields = match input.format {
        InputFormat::VoTable => passthrough_fields(input),
        InputFormat::Plain => position_fields(joined, catalog),
    };
    fields.extend(
        joined
            .physical
            .iter()
            .map(|column| physical_field(column, input)),
    );
    fields
}

fn passthrough_fields(input: &PointSet) -> Vec<VoField> {
    input
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| VoField {
            name: field.name.clone(),
            datatype: field.datatype.clone().unwrap_or_else(|| "char".into()),
            unit: field.unit.clone(),
            ucd: field.ucd.clone(),
            xtype: None,
            description: field.description.clone(),
            values: CellValues::Text(input.raw_rows.iter().map(|r| r[i].clone()).collect()),
        })
        .collect()
}

fn position_fields(joined: &Joined<'_>, catalog: &Catalog) -> Vec<VoField> {
    let mut fields = Vec::with_capacity(4);
    if let Some(times) = joined.input.raw_times() {
        fields.push(VoField {
            name: "Time".into(),
            datatype: "char".into(),
            unit: None,
            ucd: Some("time.epoch".into()),
            xtype: Some("dateTime".into()),
            description: None,
            values: CellValues::Text(times.into_iter().map(str::to_string).collect()),
        });
    }
    for (axis, symbol) in ["x", "y", "z"].into_iter().enumerate() {
        let values = joined.positions.iter().map(|p| p[axis]).collect();
        let mut field = VoField::reals(symbol.to_ascii_uppercase(), values);
        if let Ok(var) = catalog.describe_symbol(symbol) {
            field = field
                .with_unit(var.unit)
                .with_ucd(var.ucd)
                .with_description(var.description);
        }
        fields.push(field);
    }
    fields
}

fn physical_field(column: &PhysicalColumn<'_>, input: &PointSet) -> VoField {
    let var = &column.requested.variable;
    let description = column
        .requested
        .description
        .clone()
        .or_else(|| {
            input
                .fields
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(&var.field_name))
                .and_then(|f| f.description.clone())
        })
        .unwrap_or_else(|| var.description.clone());
    VoField::reals(var.field_name.clone(), column.values.clone())
        .with_unit(var.unit.clone())
        .with_ucd(var.ucd.clone())
        .with_description(description)
}

pub fn render(
    service: &str,
    table_name: &str,
    description: &str,
    params: &[VoParam],
    fields: &[VoField],
) -> String {
    render_at(service, table_name, description, params, fields, Utc::now())
}

pub fn render_at(
    service: &str,
    table_name: &str,
    description: &str,
    params: &[VoParam],
    fields: &[VoField],
    generated: DateTime<Utc>,
) -> String {
    let nrows = fields.first().map_or(0, |f| f.values.len());
    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<VOTABLE version="1.2" xmlns:xsi="{XSI_NS}" xmlns="{VOTABLE_NS}">"#
    );
    let _ = writeln!(
        out,
        "<!-- Produced by {} on {} -->",
        escape(service),
        generated.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    out.push_str("<RESOURCE>\n");
    let _ = writeln!(
        out,
        r#"<TABLE name="{}" nrows="{nrows}">"#,
        escape(table_name)
    );
    let _ = writeln!(out, "<DESCRIPTION>\n{}</DESCRIPTION>", escape(description));
    for param in params {
        param.write(&mut out);
    }

    for (i, field) in fields.iter().enumerate() {
        let _ = write!(
            out,
            r#"<FIELD ID="col{}" name="{}" datatype="{}""#,
            i + 1,
            escape(field.name.as_str()),
            escape(field.datatype.as_str())
        );
        if field.datatype == "char" {
            out.push_str(r#" arraysize="*""#);
        }
        for (attr, value) in [("unit", &field.unit), ("ucd", &field.ucd), ("xtype", &field.xtype)] {
            if let Some(value) = value {
                let _ = write!(out, r#" {attr}="{}""#, escape(value.as_str()));
            }
        }
        match &field.description {
            Some(d) => {
                let _ = writeln!(out, ">\n  <DESCRIPTION>{}</DESCRIPTION>\n</FIELD>", escape(d.as_str()));
            }
            None => out.push_str("/>\n"),
        }
    }

    out.push_str("<DATA>\n<TABLEDATA>\n");
    for row in 0..nrows {
        out.push_str("<TR>");
        for field in fields {
            let _ = write!(out, "<TD>{}</TD>", field.values.cell(row));
        }
        out.push_str("</TR>\n");
    }
    out.push_str("</TABLEDATA>\n</DATA>\n</TABLE>\n</RESOURCE>\n</VOTABLE>\n");
    out
}
