// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Write validation results back into the model
//!
//! Every validated element gets a `NOSKI_Validering` property set. Optionally
//! its geometry is tinted by status so the result can be reviewed in any IFC
//! viewer. Existing instances are never modified; everything is appended.

use std::borrow::Cow;
use std::path::Path;

use log::{debug, info, warn};
use utsp_model::{AttributeValue, EntityId, EntityResolverExt, IfcModel, IfcType};
use utsp_parser::{new_global_id, ParsedModel, StepWriter};
use utsp_rules::{ElementRecord, ElementStatus, FileRecord};

use crate::error::Result;
use crate::messages::{dimension_status, join_or_dash, pset_status, validation_status, ElementMessages};

/// Name of the appended property set
pub const VALIDATION_PSET: &str = "NOSKI_Validering";

/// Options for [`annotate`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// Attach a status colour to every representation item
    pub colorize: bool,
}

impl AnnotateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colors(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }
}

/// Annotated file content
#[derive(Debug)]
pub struct Annotated {
    /// Complete file; bytes outside the new instances match the input file
    pub content: Vec<u8>,
    /// Elements that received a property set
    pub updated: usize,
}

impl Annotated {
    /// Content as text, invalid UTF-8 replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

fn status_rgb(status: ElementStatus) -> (f64, f64, f64) {
    match status {
        ElementStatus::Ok => (0.22, 0.80, 0.44),
        ElementStatus::Warning => (0.96, 0.62, 0.04),
        ElementStatus::Error => (0.92, 0.26, 0.20),
        ElementStatus::MissingPropertySet => (0.49, 0.27, 0.85),
    }
}

fn label(value: impl Into<String>) -> AttributeValue {
    AttributeValue::TypedValue("IFCLABEL".into(), vec![AttributeValue::String(value.into())])
}

fn text(value: impl Into<String>) -> AttributeValue {
    AttributeValue::TypedValue("IFCTEXT".into(), vec![AttributeValue::String(value.into())])
}

fn integer(value: usize) -> AttributeValue {
    let value = i64::try_from(value).unwrap_or(i64::MAX);
    AttributeValue::TypedValue("IFCINTEGER".into(), vec![AttributeValue::Integer(value)])
}

fn refs(ids: &[EntityId]) -> AttributeValue {
    AttributeValue::List(ids.iter().map(|id| AttributeValue::EntityRef(*id)).collect())
}

/// `(name, nominal value)` pairs of the validation property set
fn validation_properties(element: &ElementRecord) -> Vec<(String, AttributeValue)> {
    let mut properties = vec![
        ("Valideringsstatus".to_string(), label(validation_status(element.status))),
        (
            "ObjectType".to_string(),
            label(element.identity.object_type.as_deref().unwrap_or("-")),
        ),
        ("Feilmeldinger".to_string(), text(ElementMessages::of(element).summary())),
        ("Antall feil".to_string(), integer(element.error_count)),
        ("Antall advarsler".to_string(), integer(element.warning_count)),
        ("A4_Utsp pset".to_string(), label(pset_status(&element.location))),
        ("Tilgjengelige psets".to_string(), label(join_or_dash(&element.all_psets))),
        ("Dimensjoner".to_string(), label(dimension_status(element))),
    ];
    properties.extend(element.validations.iter().map(|(property, outcome)| {
        (
            format!("{}_sjekk", property.short_name()),
            label(outcome.message.as_str()),
        )
    }));
    properties
}

/// Surface styles, created on first use and shared by all elements
struct StatusStyles {
    wrap_in_assignment: bool,
    created: Vec<(ElementStatus, EntityId)>,
}

impl StatusStyles {
    fn new(wrap_in_assignment: bool) -> Self {
        Self {
            wrap_in_assignment,
            created: Vec::with_capacity(4),
        }
    }

    /// Id to reference from an `IfcStyledItem`
    fn style_for(&mut self, writer: &mut StepWriter<'_>, status: ElementStatus) -> EntityId {
        if let Some((_, id)) = self.created.iter().find(|(s, _)| *s == status) {
            return *id;
        }

        let (r, g, b) = status_rgb(status);
        let name = format!("Validering_{}", status);
        let colour = writer.add(
            &IfcType::IfcColourRgb,
            &[
                AttributeValue::String(name.clone()),
                AttributeValue::Float(r),
                AttributeValue::Float(g),
                AttributeValue::Float(b),
            ],
        );
        let mut rendering = vec![AttributeValue::EntityRef(colour), AttributeValue::Float(0.0)];
        rendering.extend(std::iter::repeat(AttributeValue::Null).take(6));
        rendering.push(AttributeValue::Enum("NOTDEFINED".into()));
        let rendering = writer.add(&IfcType::IfcSurfaceStyleRendering, &rendering);
        let style = writer.add(
            &IfcType::IfcSurfaceStyle,
            &[
                AttributeValue::String(format!("{}_Style", name)),
                AttributeValue::Enum("BOTH".into()),
                refs(&[rendering]),
            ],
        );

        let id = if self.wrap_in_assignment {
            writer.add(&IfcType::IfcPresentationStyleAssignment, &[refs(&[style])])
        } else {
            style
        };
        debug!("Created style {} for {}", id, status);
        self.created.push((status, id));
        id
    }
}

/// Append a validation property set (and optionally colours) for every
/// element of `record` to the model it was validated from
pub fn annotate(model: &ParsedModel, record: &FileRecord, options: &AnnotateOptions) -> Result<Annotated> {
    let resolver = model.resolver();
    let mut writer = StepWriter::new(model)?;
    let mut styles = StatusStyles::new(model.metadata().is_ifc2x3());
    let mut updated = 0;

    for element in record.elements() {
        let Some(entity) = resolver.get(element.identity.entity_id) else {
            warn!(
                "{}: element {} not found, skipped",
                record.filename, element.identity.entity_id
            );
            continue;
        };
        let owner_history = entity.get(1).cloned().unwrap_or(AttributeValue::Null);

        let properties: Vec<EntityId> = validation_properties(element)
            .into_iter()
            .map(|(name, value)| {
                writer.add(
                    &IfcType::IfcPropertySingleValue,
                    &[
                        AttributeValue::String(name),
                        AttributeValue::Null,
                        value,
                        AttributeValue::Null,
                    ],
                )
            })
            .collect();

        let pset = writer.add(
            &IfcType::IfcPropertySet,
            &[
                AttributeValue::String(new_global_id()),
                owner_history.clone(),
                AttributeValue::String(VALIDATION_PSET.to_string()),
                AttributeValue::Null,
                refs(&properties),
            ],
        );
        writer.add(
            &IfcType::IfcRelDefinesByProperties,
            &[
                AttributeValue::String(new_global_id()),
                owner_history,
                AttributeValue::Null,
                AttributeValue::Null,
                refs(&[entity.id]),
                AttributeValue::EntityRef(pset),
            ],
        );

        if options.colorize {
            let items = resolver.representation_items(&entity);
            if !items.is_empty() {
                let style = styles.style_for(&mut writer, element.status);
                for item in items {
                    writer.add(
                        &IfcType::IfcStyledItem,
                        &[
                            AttributeValue::EntityRef(item),
                            refs(&[style]),
                            AttributeValue::Null,
                        ],
                    );
                }
            }
        }

        updated += 1;
    }

    info!(
        "{}: annotated {} elements ({} new instances)",
        record.filename,
        updated,
        writer.added()
    );
    Ok(Annotated {
        content: writer.finish_bytes(),
        updated,
    })
}

/// [`annotate`] and write the result to `path`; returns the updated count
pub fn annotate_to_path(
    model: &ParsedModel,
    record: &FileRecord,
    options: &AnnotateOptions,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let annotated = annotate(model, record, options)?;
    std::fs::write(path.as_ref(), annotated.content)?;
    Ok(annotated.updated)
}
