// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Scans the DATA section of an IFC file to discover instances without
//! decoding their attributes.

use memchr::{memchr, memmem};
use rustc_hash::FxHashMap;

/// Byte offsets and type buckets for every instance in a file
#[derive(Clone, Debug, Default)]
pub struct EntityIndex {
    /// Instance id -> (start, end) byte offsets, end is just past the `;`
    pub offsets: FxHashMap<u32, (usize, usize)>,
    /// Upper-case type name -> instance ids in file order
    pub by_type: FxHashMap<String, Vec<u32>>,
    /// Highest instance id seen
    pub max_id: u32,
    /// End offset of the last instance in the DATA section
    pub last_end: Option<usize>,
}

impl EntityIndex {
    /// Number of indexed instances
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when no instance was found
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Fast entity scanner for IFC files
///
/// Walks instance by instance: between two instances only whitespace and
/// `/* ... */` comments are expected, anything else is skipped line-wise.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner for the given content
    pub fn new(content: &'a str) -> Self {
        // Skip header section (find DATA; line)
        let pos = content.find("DATA;").map(|p| p + 5).unwrap_or(0);

        Self { content, pos }
    }

    /// Scan to find the next entity
    ///
    /// Returns (id, type_name, start_byte, end_byte)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        loop {
            self.skip_trivia();
            if self.pos >= bytes.len() {
                return None;
            }

            if bytes[self.pos] != b'#' {
                // ENDSEC, END-ISO-10303-21 or garbage: move to the next line
                match memchr(b'\n', &bytes[self.pos..]) {
                    Some(nl) => {
                        self.pos += nl + 1;
                        continue;
                    }
                    None => {
                        self.pos = bytes.len();
                        return None;
                    }
                }
            }

            let start = self.pos;
            self.pos += 1;
            let id_start = self.pos;
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            let Ok(id) = self.content[id_start..self.pos].parse::<u32>() else {
                self.skip_statement();
                continue;
            };

            self.skip_blanks();
            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                self.skip_statement();
                continue;
            }
            self.pos += 1;
            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            if self.pos == type_start {
                self.skip_statement();
                continue;
            }
            let type_name = &self.content[type_start..self.pos];

            let end = self.find_entity_end()?;
            return Some((id, type_name, start, end));
        }
    }

    /// Skip whitespace and block comments
    fn skip_trivia(&mut self) {
        let bytes = self.content.as_bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if bytes[self.pos..].starts_with(b"/*") {
                match memmem::find(&bytes[self.pos + 2..], b"*/") {
                    Some(close) => self.pos += close + 4,
                    None => self.pos = bytes.len(),
                }
                continue;
            }
            return;
        }
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t' | b'\r' | b'\n') {
            self.pos += 1;
        }
    }

    /// Skip a malformed statement up to and including its `;`
    fn skip_statement(&mut self) {
        if self.find_entity_end().is_none() {
            self.pos = self.content.len();
        }
    }

    /// Find the end of an entity (semicolon), handling quoted strings
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\'' => {
                    // Check for escaped quote ''
                    if in_string && self.pos + 1 < bytes.len() && bytes[self.pos + 1] == b'\'' {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                b';' if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }

    /// Build an index of all entities (offsets, type buckets, max id)
    pub fn build_index(content: &'a str) -> EntityIndex {
        let mut scanner = Self::new(content);
        let mut index = EntityIndex::default();

        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            index.offsets.insert(id, (start, end));
            index
                .by_type
                .entry(type_name.to_ascii_uppercase())
                .or_default()
                .push(id);
            index.max_id = index.max_id.max(id);
            index.last_end = Some(end);
        }

        index
    }

    /// Count entities by type
    pub fn count_by_type(content: &'a str) -> FxHashMap<String, usize> {
        let mut scanner = Self::new(content);
        let mut counts: FxHashMap<String, usize> = FxHashMap::default();

        while let Some((_, type_name, _, _)) = scanner.next_entity() {
            *counts.entry(type_name.to_uppercase()).or_insert(0) += 1;
        }

        counts
    }
}

/// Parse the header section to extract metadata
pub fn parse_header(content: &str) -> HeaderInfo {
    let mut info = HeaderInfo::default();

    let header_start = content.find("HEADER;").unwrap_or(0);
    let header_end = content[header_start..]
        .find("ENDSEC;")
        .map(|p| header_start + p)
        .unwrap_or(content.len());
    let header = &content[header_start..header_end];

    if let Some(schema_start) = header.find("FILE_SCHEMA") {
        let rest = &header[schema_start..];
        if let Some(quote) = rest.find('\'') {
            if let Some((schema, _)) = parse_header_string(&rest[quote..]) {
                info.schema_version = schema;
            }
        }
    }

    // FILE_NAME(name, timestamp, (author), (organization), preprocessor, originating_system, authorization)
    if let Some(name_start) = header.find("FILE_NAME") {
        if let Some(paren) = header[name_start..].find('(') {
            let mut rest = &header[name_start + paren + 1..];
            let mut fields: Vec<Vec<String>> = Vec::new();
            for _ in 0..6 {
                let parsed = if rest.trim_start().starts_with('(') {
                    parse_header_list(rest)
                } else {
                    parse_header_string(rest).map(|(s, r)| (vec![s], r))
                };
                let Some((values, remaining)) = parsed else {
                    break;
                };
                fields.push(values);
                match remaining.find(',') {
                    Some(comma) => rest = &remaining[comma + 1..],
                    None => break,
                }
            }

            let field = |i: usize| {
                fields
                    .get(i)
                    .and_then(|v| v.first())
                    .filter(|s| !s.is_empty())
                    .cloned()
            };
            info.file_name = field(0);
            info.timestamp = field(1);
            info.author = field(2);
            info.organization = field(3);
            info.preprocessor_version = field(4);
            info.originating_system = field(5);
        }
    }

    info
}

/// Parse a string from header ('value')
fn parse_header_string(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start();
    if let Some(rest) = s.strip_prefix('$') {
        return Some((String::new(), rest));
    }
    if !s.starts_with('\'') {
        return None;
    }

    let mut end = 1;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if end + 1 < bytes.len() && bytes[end + 1] == b'\'' {
                end += 2;
                continue;
            }
            break;
        }
        end += 1;
    }
    if end >= bytes.len() {
        return None;
    }

    let value = crate::tokenizer::decode_step_string(&s[1..end]).into_owned();
    Some((value, &s[end + 1..]))
}

/// Parse a list from header (('value1', 'value2'))
fn parse_header_list(s: &str) -> Option<(Vec<String>, &str)> {
    let s = s.trim_start();
    let Some(mut current) = s.strip_prefix('(') else {
        return Some((Vec::new(), s));
    };

    let mut items = Vec::new();
    loop {
        current = current.trim_start();
        if let Some(rest) = current.strip_prefix(')') {
            return Some((items, rest));
        }

        if let Some((item, rest)) = parse_header_string(current) {
            if !item.is_empty() {
                items.push(item);
            }
            current = rest.trim_start();
            if let Some(rest) = current.strip_prefix(',') {
                current = rest;
            }
        } else {
            // Skip unknown content
            let pos = current.find([',', ')'])?;
            current = &current[pos..];
            if let Some(rest) = current.strip_prefix(',') {
                current = rest;
            }
        }
    }
}

/// Header information extracted from IFC file
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    pub schema_version: String,
    pub file_name: Option<String>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub preprocessor_version: Option<String>,
    pub originating_system: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('RIV_Hull_test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,$);
  #2= IFCBUILDINGELEMENTPROXY('g2',$,'Hull; 1',$,$,$,$,$,$);
/* exported by hand */
#10=IFCPROPERTYSET('g3',$,'A4_Utsp',$,(#11));
#11=IFCPROPERTYSINGLEVALUE('A4_Utsp_Rev',$,IFCLABEL('0'),$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_entities() {
        let mut scanner = EntityScanner::new(TEST_IFC);
        let mut entities = Vec::new();

        while let Some((id, type_name, _, _)) = scanner.next_entity() {
            entities.push((id, type_name.to_string()));
        }

        assert_eq!(entities.len(), 4);
        assert_eq!(entities[0], (1, "IFCPROJECT".to_string()));
        assert_eq!(entities[1], (2, "IFCBUILDINGELEMENTPROXY".to_string()));
        assert_eq!(entities[3], (11, "IFCPROPERTYSINGLEVALUE".to_string()));
    }

    #[test]
    fn test_semicolon_inside_string() {
        let index = EntityScanner::build_index(TEST_IFC);
        let (start, end) = index.offsets[&2];
        assert!(TEST_IFC[start..end].ends_with("$,$);"));
        assert!(TEST_IFC[start..end].contains("'Hull; 1'"));
    }

    #[test]
    fn test_build_index() {
        let index = EntityScanner::build_index(TEST_IFC);
        assert_eq!(index.len(), 4);
        assert_eq!(index.max_id, 11);
        assert_eq!(index.by_type["IFCPROPERTYSET"], vec![10]);

        let last_end = index.last_end.unwrap();
        assert!(TEST_IFC[..last_end].ends_with("$);"));
        assert!(TEST_IFC[last_end..].trim_start().starts_with("ENDSEC;"));
    }

    #[test]
    fn test_count_by_type() {
        let counts = EntityScanner::count_by_type(TEST_IFC);
        assert_eq!(counts.get("IFCPROJECT"), Some(&1));
        assert_eq!(counts.get("IFCBUILDINGELEMENTPROXY"), Some(&1));
    }

    #[test]
    fn test_parse_header() {
        let info = parse_header(TEST_IFC);
        assert_eq!(info.schema_version, "IFC2X3");
        assert_eq!(info.file_name.as_deref(), Some("RIV_Hull_test.ifc"));
        assert_eq!(info.author.as_deref(), Some("Author"));
        assert_eq!(info.organization.as_deref(), Some("Org"));
        assert_eq!(info.originating_system.as_deref(), Some("App"));
    }
}
