// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only STEP writer
//!
//! New instances are numbered above the highest existing id and spliced into
//! the DATA section right after the last existing instance. The original text
//! is never rewritten.

use std::fmt::Write as _;
use std::path::Path;

use crate::model::ParsedModel;
use log::debug;
use utsp_model::{AttributeValue, EntityId, IfcType, ParseError, Result};

/// Builder for new STEP instances appended to an existing file
pub struct StepWriter<'a> {
    source: &'a str,
    raw: Option<&'a [u8]>,
    insert_at: usize,
    next_id: u32,
    lines: Vec<String>,
}

impl<'a> StepWriter<'a> {
    /// Start appending to a parsed model
    pub fn new(model: &'a ParsedModel) -> Result<Self> {
        let index = model.index();
        let mut writer = Self::from_parts(model.source(), index.last_end, index.max_id)?;
        writer.raw = model.raw_source();
        Ok(writer)
    }

    /// Start appending to raw content with a known last instance end and max id
    pub fn from_parts(source: &'a str, last_end: Option<usize>, max_id: u32) -> Result<Self> {
        let insert_at = match last_end {
            Some(end) if end <= source.len() => end,
            Some(end) => {
                return Err(ParseError::format(format!(
                    "instance end {} beyond content length {}",
                    end,
                    source.len()
                )))
            }
            None => source
                .find("DATA;")
                .map(|p| p + 5)
                .ok_or_else(|| ParseError::format("missing DATA section"))?,
        };

        Ok(Self {
            source,
            raw: None,
            insert_at,
            next_id: max_id + 1,
            lines: Vec::new(),
        })
    }

    /// Append an instance and return its new id
    pub fn add(&mut self, ifc_type: &IfcType, attributes: &[AttributeValue]) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;

        let mut line = format!("#{}={}(", id, ifc_type.step_name());
        for (i, attr) in attributes.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            encode_attribute(attr, &mut line);
        }
        line.push_str(");");
        self.lines.push(line);

        EntityId(id)
    }

    /// Number of instances added so far
    pub fn added(&self) -> usize {
        self.lines.len()
    }

    /// Produce the complete file, byte for byte the original outside the
    /// appended instances
    pub fn finish_bytes(self) -> Vec<u8> {
        let Some(raw) = self.raw else {
            return self.finish().into_bytes();
        };
        let at = raw_offset(raw, self.insert_at);
        let extra: usize = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = Vec::with_capacity(raw.len() + extra);
        out.extend_from_slice(&raw[..at]);
        for line in &self.lines {
            out.push(b'\n');
            out.extend_from_slice(line.as_bytes());
        }
        out.extend_from_slice(&raw[at..]);
        debug!("Appended {} instances", self.lines.len());
        out
    }

    /// Produce the complete file content as parsed text
    pub fn finish(self) -> String {
        let extra: usize = self.lines.iter().map(|l| l.len() + 1).sum();
        let mut out = String::with_capacity(self.source.len() + extra);
        out.push_str(&self.source[..self.insert_at]);
        for line in &self.lines {
            out.push('\n');
            out.push_str(line);
        }
        out.push_str(&self.source[self.insert_at..]);
        debug!("Appended {} instances", self.lines.len());
        out
    }

    /// Write the complete file content to disk
    pub fn write_to(self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.finish_bytes())?;
        Ok(())
    }
}

/// Byte offset in `raw` of `offset` in its lossy UTF-8 decoding
fn raw_offset(raw: &[u8], offset: usize) -> usize {
    let mut decoded = 0;
    let mut consumed = 0;
    for chunk in raw.utf8_chunks() {
        let valid = chunk.valid().len();
        if offset <= decoded + valid {
            return consumed + offset.saturating_sub(decoded);
        }
        decoded += valid;
        consumed += valid;
        if !chunk.invalid().is_empty() {
            decoded += char::REPLACEMENT_CHARACTER.len_utf8();
            consumed += chunk.invalid().len();
        }
    }
    raw.len()
}

/// Encode one attribute value in STEP syntax
pub fn encode_attribute(attr: &AttributeValue, out: &mut String) {
    match attr {
        AttributeValue::Null => out.push('$'),
        AttributeValue::Derived => out.push('*'),
        AttributeValue::EntityRef(id) => {
            let _ = write!(out, "#{}", id.0);
        }
        AttributeValue::Bool(true) => out.push_str(".T."),
        AttributeValue::Bool(false) => out.push_str(".F."),
        AttributeValue::Integer(i) => {
            let _ = write!(out, "{}", i);
        }
        AttributeValue::Float(f) => encode_real(*f, out),
        AttributeValue::String(s) => encode_string(s, out),
        AttributeValue::Enum(e) => {
            let _ = write!(out, ".{}.", e);
        }
        AttributeValue::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_attribute(item, out);
            }
            out.push(')');
        }
        AttributeValue::TypedValue(name, args) => {
            out.push_str(&name.to_ascii_uppercase());
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_attribute(arg, out);
            }
            out.push(')');
        }
    }
}

/// STEP reals always carry a decimal point; non-finite values become `$`
fn encode_real(f: f64, out: &mut String) {
    if !f.is_finite() {
        out.push('$');
        return;
    }
    let text = format!("{}", f);
    out.push_str(&text);
    if !text.contains(['.', 'e', 'E']) {
        out.push('.');
    }
}

/// Quote a string, escaping quotes, backslashes and non-ASCII characters
pub fn encode_string(s: &str, out: &mut String) {
    out.push('\'');
    let mut wide: Vec<u16> = Vec::new();
    for c in s.chars() {
        if matches!(c, ' '..='~') {
            flush_wide(&mut wide, out);
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        } else {
            let mut buf = [0u16; 2];
            wide.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }
    flush_wide(&mut wide, out);
    out.push('\'');
}

fn flush_wide(wide: &mut Vec<u16>, out: &mut String) {
    if wide.is_empty() {
        return;
    }
    out.push_str("\\X2\\");
    for unit in wide.drain(..) {
        let _ = write!(out, "{:04X}", unit);
    }
    out.push_str("\\X0\\");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::decode_step_string;
    use utsp_model::{EntityResolver, IfcModel, PropertyValue};

    const TEST_IFC: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,$);
#7=IFCBUILDINGELEMENTPROXY('p1',$,'Hull',$,$,$,$,$,$);
ENDSEC;
END-ISO-10303-21;
";

    fn encode(attr: &AttributeValue) -> String {
        let mut out = String::new();
        encode_attribute(attr, &mut out);
        out
    }

    #[test]
    fn test_encode_values() {
        assert_eq!(encode(&AttributeValue::Float(200.0)), "200.");
        assert_eq!(encode(&AttributeValue::Float(0.22)), "0.22");
        assert_eq!(encode(&AttributeValue::Float(f64::NAN)), "$");
        assert_eq!(encode(&AttributeValue::Bool(true)), ".T.");
        assert_eq!(encode(&AttributeValue::Enum("BOTH".into())), ".BOTH.");
        assert_eq!(
            encode(&AttributeValue::List(vec![
                AttributeValue::EntityRef(EntityId(3)),
                AttributeValue::EntityRef(EntityId(4)),
            ])),
            "(#3,#4)"
        );
        assert_eq!(
            encode(&AttributeValue::TypedValue(
                "IfcInteger".into(),
                vec![AttributeValue::Integer(2)]
            )),
            "IFCINTEGER(2)"
        );
    }

    #[test]
    fn test_encode_string_escapes() {
        let mut out = String::new();
        encode_string("Høyde 'x' \\ æ", &mut out);
        assert_eq!(out, "'H\\X2\\00F8\\X0\\yde ''x'' \\\\ \\X2\\00E6\\X0\\'");

        let body = &out[1..out.len() - 1];
        assert_eq!(decode_step_string(body), "Høyde 'x' \\ æ");
    }

    #[test]
    fn test_append_after_last_instance() {
        let model = ParsedModel::parse(TEST_IFC).unwrap();
        let mut writer = StepWriter::new(&model).unwrap();

        let prop = writer.add(
            &IfcType::IfcPropertySingleValue,
            &[
                AttributeValue::String("Antall feil".into()),
                AttributeValue::Null,
                AttributeValue::TypedValue("IFCINTEGER".into(), vec![AttributeValue::Integer(2)]),
                AttributeValue::Null,
            ],
        );
        assert_eq!(prop, EntityId(8));
        let pset = writer.add(
            &IfcType::IfcPropertySet,
            &[
                AttributeValue::String("g".into()),
                AttributeValue::Null,
                AttributeValue::String("NOSKI_Validering".into()),
                AttributeValue::Null,
                AttributeValue::List(vec![AttributeValue::EntityRef(prop)]),
            ],
        );
        assert_eq!(pset, EntityId(9));
        assert_eq!(writer.added(), 2);

        let output = writer.finish();
        assert!(output.contains(
            "#7=IFCBUILDINGELEMENTPROXY('p1',$,'Hull',$,$,$,$,$,$);\n#8=IFCPROPERTYSINGLEVALUE('Antall feil',$,IFCINTEGER(2),$);\n#9=IFCPROPERTYSET"
        ));
        assert!(output.ends_with("ENDSEC;\nEND-ISO-10303-21;\n"));

        let reparsed = ParsedModel::parse(&output).unwrap();
        assert_eq!(reparsed.resolver().max_id(), 9);
        let value = reparsed
            .resolver()
            .get(EntityId(8))
            .and_then(|e| e.get(2).and_then(PropertyValue::from_attribute));
        assert_eq!(value, Some(PropertyValue::Integer(2)));
        assert_eq!(reparsed.metadata().schema_version, "IFC4");
    }

    #[test]
    fn test_latin1_bytes_survive_export() {
        let mut bytes = TEST_IFC.replace("'Hull'", "'Hull ?st'").into_bytes();
        let at = bytes.iter().position(|&b| b == b'?').unwrap();
        bytes[at] = 0xD8;

        let model = ParsedModel::from_bytes(bytes.clone()).unwrap();
        let mut writer = StepWriter::new(&model).unwrap();
        writer.add(&IfcType::IfcProject, &[AttributeValue::String("Ny".into())]);
        let output = writer.finish_bytes();

        let split = bytes.windows(16).position(|w| w == b"\nENDSEC;\nEND-ISO").unwrap();
        assert_eq!(&output[..split], &bytes[..split]);
        assert!(output[..split].contains(&0xD8));
        assert!(output[split..].starts_with(b"\n#8=IFCPROJECT('Ny');"));
        assert!(output.ends_with(&bytes[split..]));
    }

    #[test]
    fn test_raw_offset_skips_replacements() {
        let raw = b"ab\xF8cd";
        // Decoded: "ab\u{FFFD}cd", where 'c' sits at byte 5
        assert_eq!(raw_offset(raw, 2), 2);
        assert_eq!(raw_offset(raw, 5), 3);
        assert_eq!(raw_offset(raw, 7), 5);
    }

    #[test]
    fn test_empty_data_section() {
        let source = "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\nENDSEC;\nEND-ISO-10303-21;\n";
        let mut writer = StepWriter::from_parts(source, None, 0).unwrap();
        assert_eq!(writer.add(&IfcType::IfcProject, &[]), EntityId(1));
        assert_eq!(
            writer.finish(),
            "ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n#1=IFCPROJECT();\nENDSEC;\nEND-ISO-10303-21;\n"
        );
    }
}
