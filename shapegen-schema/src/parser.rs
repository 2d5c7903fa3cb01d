//! Entity document parser.
//!
//! Entities are described in small XML documents, one `<entity>` per file
//! or several under an `<entities>` root:
//!
//! ```xml
//! <entities namespace="App\Dto">
//!     <entity name="UserDTO">
//!         <doc>/** Simple user data transfer object */</doc>
//!         <field name="email" type="?string"/>
//!         <field name="tags" type="array" annotation="array&lt;string&gt;"/>
//!     </entity>
//!     <entity name="RoleEnum" kind="enum" backing="string">
//!         <case name="ADMIN">admin</case>
//!     </entity>
//! </entities>
//! ```

use crate::docblock;
use crate::error::ParseError;
use crate::mapper;
use crate::types::{
    EntityDescriptor, EntityKind, EnumBacking, EnumMember, EnumValue, FieldDescriptor,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;

/// Parses every entity defined in an XML document.
///
/// # Arguments
/// * `xml` - Entity document content
///
/// # Returns
/// Entities in document order.
///
/// # Errors
/// Returns `ParseError` if the XML is malformed, an entity element is
/// missing required attributes, or the document defines no entity.
pub fn parse_entities(xml: &str) -> Result<Vec<EntityDescriptor>, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entities = Vec::new();
    let mut default_namespace = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match element_name(e)? {
                "entities" => {
                    if let Some(ns) = optional_attr(e, "namespace")? {
                        default_namespace = ns;
                    }
                }
                "entity" => {
                    let entity = parse_entity(&mut reader, xml, e, &default_namespace)?;
                    entities.push(entity);
                }
                _ => {}
            },
            Event::Empty(ref e) if element_name(e)? == "entity" => {
                let (entity, _) = parse_entity_header(e, &default_namespace)?;
                entities.push(entity);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if entities.is_empty() {
        return Err(ParseError::structure("no entity element found"));
    }

    Ok(entities)
}

/// Parses the entity element attributes.
fn parse_entity_header(
    e: &BytesStart<'_>,
    default_namespace: &str,
) -> Result<(EntityDescriptor, String), ParseError> {
    let mut name = None;
    let mut namespace = default_namespace.to_string();
    let mut kind = EntityKind::Record;
    let mut backing = None;

    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = decode(&attr.value)?;

        match key {
            "name" => name = Some(value.into_owned()),
            "namespace" => namespace = value.into_owned(),
            "kind" => {
                kind = EntityKind::parse(&value)
                    .ok_or_else(|| ParseError::invalid_attr("entity", "kind", value.as_ref()))?
            }
            "backing" => {
                backing = Some(
                    EnumBacking::parse(&value)
                        .ok_or_else(|| ParseError::invalid_attr("entity", "backing", value.as_ref()))?,
                )
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("entity", "name"))?;
    let qualified = mapper::join_namespace(&namespace, &name);

    let entity = match kind {
        EntityKind::Record => EntityDescriptor::record(qualified),
        EntityKind::Enum => EntityDescriptor::enumeration(qualified, backing),
    };
    Ok((entity, name))
}

/// Parses an entity element with content.
fn parse_entity(
    reader: &mut Reader<&[u8]>,
    source: &str,
    e: &BytesStart<'_>,
    default_namespace: &str,
) -> Result<EntityDescriptor, ParseError> {
    let (mut entity, name) = parse_entity_header(e, default_namespace)?;
    let mut constructor_doc: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match element_name(e)? {
                "doc" => {
                    let raw = read_text(reader, source, e)?;
                    entity.doc_summary = docblock::clean_doc_comment(&raw);
                }
                "constructor-doc" => {
                    constructor_doc = Some(read_text(reader, source, e)?);
                }
                "field" => {
                    let field = parse_field(reader, source, e)?;
                    entity.add_field(field);
                }
                "case" => {
                    let value = read_text(reader, source, e)?;
                    let member = parse_case(e, Some(&value), &entity)?;
                    entity.add_member(member);
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(ref e) => match element_name(e)? {
                "field" => {
                    let field = field_from_attributes(e)?;
                    entity.add_field(finish_field(field, None));
                }
                "case" => {
                    let member = parse_case(e, None, &entity)?;
                    entity.add_member(member);
                }
                _ => {}
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ParseError::structure(format!(
                    "unterminated entity '{name}'"
                )));
            }
            _ => {}
        }
    }

    if let Some(doc) = constructor_doc {
        for field in &mut entity.fields {
            if field.raw_annotation.is_none() {
                field.raw_annotation = docblock::extract_param_type(&doc, &field.name);
            }
        }
    }

    Ok(entity)
}

/// Parses a field element with `<doc>` / `<annotation>` children.
fn parse_field(
    reader: &mut Reader<&[u8]>,
    source: &str,
    e: &BytesStart<'_>,
) -> Result<FieldDescriptor, ParseError> {
    let mut field = field_from_attributes(e)?;
    let mut raw_doc = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match element_name(e)? {
                "doc" => raw_doc = Some(read_text(reader, source, e)?),
                "annotation" => {
                    let annotation = read_text(reader, source, e)?;
                    if !annotation.trim().is_empty() {
                        field.raw_annotation = Some(annotation.trim().to_string());
                    }
                }
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(ParseError::structure(format!(
                    "unterminated field '{}'",
                    field.name
                )));
            }
            _ => {}
        }
    }

    Ok(finish_field(field, raw_doc.as_deref()))
}

/// Reads the field attributes.
fn field_from_attributes(e: &BytesStart<'_>) -> Result<FieldDescriptor, ParseError> {
    let mut name = None;
    let mut declared_type = "mixed".to_string();
    let mut annotation = None;
    let mut nullable = false;
    let mut excluded = false;

    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = decode(&attr.value)?;

        match key {
            "name" => name = Some(value.into_owned()),
            "type" => declared_type = value.trim().to_string(),
            "annotation" => annotation = Some(value.trim().to_string()),
            "nullable" => nullable = parse_bool("nullable", &value)?,
            "exclude" => excluded = parse_bool("exclude", &value)?,
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("field", "name"))?;
    let mut field = FieldDescriptor::new(name, declared_type);
    field.raw_annotation = annotation.filter(|a| !a.is_empty());
    field.is_nullable_by_signature = nullable || signature_allows_null(&field.declared_type);
    field.is_excluded = excluded;
    Ok(field)
}

/// Applies the raw docblock: `@var` fills a missing annotation, the rest
/// becomes the field documentation.
fn finish_field(mut field: FieldDescriptor, raw_doc: Option<&str>) -> FieldDescriptor {
    if let Some(raw) = raw_doc {
        if field.raw_annotation.is_none() {
            field.raw_annotation = docblock::extract_var_type(raw);
        }
        field.doc = docblock::clean_doc_comment(raw);
    }
    field
}

/// Parses one enum case.
fn parse_case(
    e: &BytesStart<'_>,
    text: Option<&str>,
    entity: &EntityDescriptor,
) -> Result<EnumMember, ParseError> {
    let mut name = None;
    let mut value_attr = None;

    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = decode(&attr.value)?;
        match key {
            "name" => name = Some(value.into_owned()),
            "value" => value_attr = Some(value.into_owned()),
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ParseError::missing_attr("case", "name"))?;
    let raw_value = value_attr.or_else(|| text.map(str::to_string));

    let value = match (entity.enum_backing, raw_value) {
        (Some(EnumBacking::Int), Some(raw)) => EnumValue::Int(
            raw.trim()
                .parse()
                .map_err(|_| ParseError::invalid_attr("case", "value", raw.as_str()))?,
        ),
        (Some(EnumBacking::String), Some(raw)) => EnumValue::String(raw),
        (Some(_), None) => return Err(ParseError::missing_attr("case", "value")),
        // Pure enums carry their case name.
        (None, _) => EnumValue::String(name.clone()),
    };

    Ok(EnumMember::new(name, value))
}

/// Returns true when the declared type admits null on its own.
fn signature_allows_null(declared: &str) -> bool {
    let declared = declared.trim();
    declared.starts_with('?') || declared.split('|').any(|part| part.trim() == "null")
}

fn parse_bool(attribute: &str, value: &str) -> Result<bool, ParseError> {
    match value.trim() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ParseError::invalid_attr("field", attribute, other)),
    }
}

fn element_name<'a>(e: &'a BytesStart<'_>) -> Result<&'a str, ParseError> {
    Ok(std::str::from_utf8(e.local_name().into_inner())?)
}

fn optional_attr(e: &BytesStart<'_>, wanted: &str) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == wanted.as_bytes() {
            return Ok(Some(decode(&attr.value)?.into_owned()));
        }
    }
    Ok(None)
}

/// Reads the raw content of the current element, resolving CDATA and entities.
fn read_text(
    reader: &mut Reader<&[u8]>,
    source: &str,
    e: &BytesStart<'_>,
) -> Result<String, ParseError> {
    let span = reader.read_to_end(e.name())?;
    let start = usize::try_from(span.start)
        .map_err(|_| ParseError::structure("element offset out of range"))?;
    let end = usize::try_from(span.end)
        .map_err(|_| ParseError::structure("element offset out of range"))?;
    let raw = source
        .get(start..end)
        .ok_or_else(|| ParseError::structure("element content out of range"))?;
    decode_text(raw)
}

fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, ParseError> {
    let raw = std::str::from_utf8(bytes)?;
    Ok(quick_xml::escape::unescape(raw)?)
}

/// Unescapes text content; CDATA sections are copied verbatim.
fn decode_text(raw: &str) -> Result<String, ParseError> {
    const OPEN: &str = "<![CDATA[";
    const CLOSE: &str = "]]>";

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&quick_xml::escape::unescape(&rest[..start])?);
        let body = &rest[start + OPEN.len()..];
        let end = body
            .find(CLOSE)
            .ok_or_else(|| ParseError::structure("unterminated CDATA section"))?;
        out.push_str(&body[..end]);
        rest = &body[end + CLOSE.len()..];
    }
    out.push_str(&quick_xml::escape::unescape(rest)?);
    Ok(out)
}
