// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP file tokenizer using nom combinators
//!
//! Parses STEP/IFC entity definitions into tokens.

use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};
use utsp_model::{AttributeValue, DecodedEntity, EntityId, IfcType};

/// Raw token from STEP file (before conversion to AttributeValue)
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    /// Entity reference (#123)
    EntityRef(u32),
    /// String value, escapes decoded
    String(Cow<'a, str>),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Boolean (.T. / .F.)
    Bool(bool),
    /// Enumeration (.VALUE.)
    Enum(&'a str),
    /// List of tokens
    List(Vec<Token<'a>>),
    /// Typed value like IFCLABEL('text')
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value ($)
    Null,
    /// Derived value (*)
    Derived,
}

impl<'a> Token<'a> {
    /// Convert token to owned AttributeValue
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(s.to_string()),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Bool(b) => AttributeValue::Bool(*b),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(|t| t.to_attribute_value()).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                (*name).to_string(),
                args.iter().map(|t| t.to_attribute_value()).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

// ============================================================================
// String decoding
// ============================================================================

/// Decode the body of a STEP string (without the surrounding quotes)
///
/// Handles `''`, `\\`, `\X2\...\X0\` (UTF-16), `\X4\...\X0\` (UTF-32),
/// `\X\hh` (ISO 8859-1) and `\S\c`. Code page switches (`\P?\`) are dropped.
pub fn decode_step_string(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\'', '\\']) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(c) = rest.chars().next() {
        match c {
            '\'' if rest.starts_with("''") => {
                out.push('\'');
                rest = &rest[2..];
            }
            '\\' => {
                rest = decode_escape(rest, &mut out);
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Cow::Owned(out)
}

/// Decode one escape sequence at the start of `s`, returning what follows it
fn decode_escape<'s>(s: &'s str, out: &mut String) -> &'s str {
    if let Some(rest) = s.strip_prefix("\\\\") {
        out.push('\\');
        return rest;
    }
    if let Some(body) = s.strip_prefix("\\X2\\") {
        return match hex_groups(body, 4) {
            Some((units, rest)) => {
                let units = units.into_iter().map(|u| u as u16);
                out.extend(char::decode_utf16(units).map(|r| r.unwrap_or('\u{FFFD}')));
                rest
            }
            None => literal_backslash(s, out),
        };
    }
    if let Some(body) = s.strip_prefix("\\X4\\") {
        return match hex_groups(body, 8) {
            Some((units, rest)) => {
                out.extend(units.into_iter().map(|u| char::from_u32(u).unwrap_or('\u{FFFD}')));
                rest
            }
            None => literal_backslash(s, out),
        };
    }
    if let Some(hex) = s.strip_prefix("\\X\\") {
        if let Some(code) = hex.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
            out.push(char::from(code));
            return &hex[2..];
        }
        return literal_backslash(s, out);
    }
    if let Some(body) = s.strip_prefix("\\S\\") {
        if let Some(c) = body.chars().next().filter(|c| c.is_ascii()) {
            out.push(char::from(c as u8 + 128));
            return &body[1..];
        }
        return literal_backslash(s, out);
    }
    if s.starts_with("\\P") && s.get(3..4) == Some("\\") {
        return &s[4..];
    }
    literal_backslash(s, out)
}

fn literal_backslash<'s>(s: &'s str, out: &mut String) -> &'s str {
    out.push('\\');
    &s[1..]
}

/// Hex groups of `width` digits up to the closing `\X0\`
fn hex_groups(body: &str, width: usize) -> Option<(Vec<u32>, &str)> {
    let close = body.find("\\X0\\")?;
    let hex = &body[..close];
    if hex.len() % width != 0 {
        return None;
    }
    let units = (0..hex.len())
        .step_by(width)
        .map(|i| hex.get(i..i + width).and_then(|h| u32::from_str_radix(h, 16).ok()))
        .collect::<Option<Vec<u32>>>()?;
    Some((units, &body[close + 4..]))
}

// ============================================================================
// Parsing Primitives
// ============================================================================

/// Parse whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

/// Parse an entity reference (#123)
fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, _) = char('#')(input)?;
    let (rest, digits) = take_while1(|c: char| c.is_ascii_digit())(rest)?;
    let id = digits
        .parse::<u32>()
        .map_err(|_| nom::Err::Error(Error::new(input, ErrorKind::Digit)))?;
    Ok((rest, Token::EntityRef(id)))
}

/// Parse a STEP string ('text' with '' for escaped quotes)
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (body, _) = char('\'')(input)?;

    let bytes = body.as_bytes();
    let mut end = 0;
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
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
    }

    let content = &body[..end];
    let remaining = &body[end + 1..];

    Ok((remaining, Token::String(decode_step_string(content))))
}

/// Parse a number (integer or float)
fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (rest, num_str) = recognize((
        opt(alt((char('+'), char('-')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let is_float = num_str.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = lexical_core::parse::<i64>(num_str.as_bytes()) {
            return Ok((rest, Token::Integer(i)));
        }
    }

    // lexical-core rejects a few spellings STEP allows ("200.", "+1.0")
    lexical_core::parse::<f64>(num_str.as_bytes())
        .ok()
        .or_else(|| num_str.trim_start_matches('+').parse::<f64>().ok())
        .map(|f| (rest, Token::Float(f)))
        .ok_or(nom::Err::Error(Error::new(input, ErrorKind::Float)))
}

/// Parse an enumeration (.VALUE.); `.T.` and `.F.` become booleans
fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('.')(input)?;
    let (input, name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = char('.')(input)?;
    let token = match name {
        "T" => Token::Bool(true),
        "F" => Token::Bool(false),
        other => Token::Enum(other),
    };
    Ok((input, token))
}

/// Parse null ($)
fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

/// Parse derived (*)
fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

/// Parse a parenthesised, comma separated token list
fn token_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

/// Parse a list of tokens
fn list(input: &str) -> IResult<&str, Token<'_>> {
    let (input, items) = token_list(input)?;
    Ok((input, Token::List(items)))
}

/// Parse a typed value like IFCLABEL('text')
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, type_name) = take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = token_list(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

/// Parse any token
fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

// ============================================================================
// Entity Parsing
// ============================================================================

/// Parse a complete entity definition
///
/// Format: `#123=IFCBUILDINGELEMENTPROXY(attr1,attr2,...);`
pub fn parse_entity(input: &str) -> Result<DecodedEntity, String> {
    let input = input.trim_start();

    let (input, _) = char::<&str, Error<&str>>('#')
        .parse(input)
        .map_err(|_| "Expected # at start of entity")?;

    let (input, id_str) = take_while1::<_, &str, Error<&str>>(|c: char| c.is_ascii_digit())
        .parse(input)
        .map_err(|_| "Expected entity ID")?;

    let id: u32 = id_str.parse().map_err(|_| "Invalid entity ID")?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<Error<&str>>| "Expected = after entity ID")?;

    let (input, type_name) =
        take_while1::<_, &str, Error<&str>>(|c: char| c.is_alphanumeric() || c == '_')
            .parse(input)
            .map_err(|_| "Expected type name")?;

    let (input, _) = ws(input).unwrap_or((input, ()));

    let (_, tokens) =
        token_list(input).map_err(|e| format!("Failed to parse attributes: {:?}", e))?;

    let attributes: Vec<AttributeValue> = tokens.iter().map(|t| t.to_attribute_value()).collect();

    Ok(DecodedEntity {
        id: EntityId(id),
        ifc_type: IfcType::parse(type_name),
        attributes,
    })
}

/// Parse entity from content at given byte range
pub fn parse_entity_at(content: &str, start: usize, end: usize) -> Result<DecodedEntity, String> {
    let slice = content
        .get(start..end)
        .ok_or_else(|| format!("Byte range {}..{} out of bounds", start, end))?;
    parse_entity(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_ref() {
        let (remaining, token) = entity_ref("#123").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_parse_string() {
        let (remaining, token) = step_string("'hello world'").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::String(Cow::Borrowed("hello world")));
    }

    #[test]
    fn test_parse_string_with_escaped_quote() {
        let (remaining, token) = step_string("'it''s a test'").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::String(Cow::Borrowed("it's a test")));
    }

    #[test]
    fn test_decode_unicode_escapes() {
        assert_eq!(decode_step_string("Innst\\X2\\00F8\\X0\\pningsgods"), "Innstøpningsgods");
        assert_eq!(decode_step_string("Dim H\\X\\F8yde"), "Dim Høyde");
        assert_eq!(decode_step_string("B\\S\\fring"), "Bæring");
        assert_eq!(decode_step_string("\\X4\\0001F600\\X0\\"), "\u{1F600}");
        assert_eq!(decode_step_string("a\\\\b"), "a\\b");
        assert_eq!(decode_step_string("\\PA\\abc"), "abc");
    }

    #[test]
    fn test_parse_number_integer() {
        let (remaining, token) = number("42").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::Integer(42));
    }

    #[test]
    fn test_parse_number_float() {
        let (remaining, token) = number("3.14159").unwrap();
        assert_eq!(remaining, "");
        if let Token::Float(f) = token {
            assert!((f - 3.14159).abs() < 1e-10);
        } else {
            panic!("Expected float");
        }
    }

    #[test]
    fn test_parse_number_trailing_dot() {
        let (remaining, token) = number("200.").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::Float(200.0));
    }

    #[test]
    fn test_parse_number_scientific() {
        let (remaining, token) = number("1.5E-3").unwrap();
        assert_eq!(remaining, "");
        if let Token::Float(f) = token {
            assert!((f - 0.0015).abs() < 1e-10);
        } else {
            panic!("Expected float");
        }
    }

    #[test]
    fn test_parse_enum_and_bool() {
        let (remaining, token) = enumeration(".NOTDEFINED.").unwrap();
        assert_eq!(remaining, "");
        assert_eq!(token, Token::Enum("NOTDEFINED"));
        assert_eq!(enumeration(".T.").unwrap().1, Token::Bool(true));
        assert_eq!(enumeration(".F.").unwrap().1, Token::Bool(false));
        assert_eq!(enumeration(".U.").unwrap().1, Token::Enum("U"));
    }

    #[test]
    fn test_parse_list() {
        let (remaining, token) = list("(1, 2, 3)").unwrap();
        assert_eq!(remaining, "");
        if let Token::List(items) = token {
            assert_eq!(items.len(), 3);
        } else {
            panic!("Expected list");
        }
    }

    #[test]
    fn test_parse_entity() {
        let entity =
            parse_entity("#7=IFCPROPERTYSINGLEVALUE('A4_Utsp_Tetting',$,IFCBOOLEAN(.T.),$);")
                .unwrap();
        assert_eq!(entity.id, EntityId(7));
        assert_eq!(entity.ifc_type, IfcType::IfcPropertySingleValue);
        assert_eq!(entity.attributes.len(), 4);
        assert_eq!(
            entity.attributes[2],
            AttributeValue::TypedValue("IFCBOOLEAN".into(), vec![AttributeValue::Bool(true)])
        );
    }

    #[test]
    fn test_parse_entity_with_unicode_name() {
        let entity = parse_entity(
            "#8=IFCPROPERTYSINGLEVALUE('A4_Utsp_DimH\\X2\\00F8\\X0\\yde',$,IFCLENGTHMEASURE(300.),$);",
        )
        .unwrap();
        assert_eq!(entity.get_string(0), Some("A4_Utsp_DimHøyde"));
        assert_eq!(entity.get_float(2), Some(300.0));
    }
}
