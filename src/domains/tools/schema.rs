//! Input schema inference from method names.
//!
//! OPNsense controllers follow consistent verb prefixes (`searchX`, `getX`,
//! `addX`, `setX`, `delX`, `toggleX`), so the argument shape of most methods
//! can be derived from the name alone. The rules are an ordered table of
//! `(predicate, shape)` pairs; the first match wins and unmatched names get a
//! permissive schema so that no method becomes unreachable.

use std::sync::Arc;

use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde_json::{Value, json};

/// Canonical argument shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// `{ current?, rowCount?, searchPhrase? }`
    Pagination,
    /// `{}`
    NoArguments,
    /// `{ uuid }`
    UuidLookup,
    /// `{ uuid, enabled }`
    UuidToggle,
    /// `{ uuid, data }`
    UuidPayload,
    /// `{ data }`
    Payload,
    /// Any object.
    Permissive,
}

/// Where a method's schema comes from.
///
/// Hand-authored sources take priority over inference.
#[derive(Debug, Clone, Copy)]
pub enum SchemaSource {
    Inferred,
    Shape(InputShape),
    Typed(fn() -> Arc<JsonObject>),
}

impl SchemaSource {
    /// Schema derived from a parameter struct.
    pub fn typed<T: JsonSchema + 'static>() -> Self {
        Self::Typed(cached_schema_for_type::<T>)
    }

    /// Resolve the schema for `method`.
    pub fn resolve(&self, method: &str) -> Arc<JsonObject> {
        match self {
            Self::Inferred => infer_schema(method),
            Self::Shape(shape) => shape.schema(),
            Self::Typed(schema) => schema(),
        }
    }
}

type Rule = (fn(&str) -> bool, InputShape);

static RULES: &[Rule] = &[
    (is_search, InputShape::Pagination),
    (is_bare_get, InputShape::NoArguments),
    (is_get, InputShape::UuidLookup),
    (is_delete, InputShape::UuidLookup),
    (is_toggle, InputShape::UuidToggle),
    (is_update, InputShape::UuidPayload),
    (is_add, InputShape::Payload),
];

fn is_search(method: &str) -> bool {
    method.starts_with("search")
}

fn is_bare_get(method: &str) -> bool {
    method == "get"
}

fn is_get(method: &str) -> bool {
    method.starts_with("get")
}

fn is_delete(method: &str) -> bool {
    method.starts_with("delete")
}

fn is_toggle(method: &str) -> bool {
    method.starts_with("toggle")
}

fn is_update(method: &str) -> bool {
    method.starts_with("set") || method.starts_with("update")
}

fn is_add(method: &str) -> bool {
    method.starts_with("add")
}

/// Pick the shape for a method name.
pub fn infer_shape(method: &str) -> InputShape {
    RULES
        .iter()
        .find(|(matches, _)| matches(method))
        .map(|(_, shape)| *shape)
        .unwrap_or(InputShape::Permissive)
}

/// Infer the input schema for a method name.
pub fn infer_schema(method: &str) -> Arc<JsonObject> {
    infer_shape(method).schema()
}

impl InputShape {
    /// The JSON schema for this shape.
    pub fn schema(self) -> Arc<JsonObject> {
        let schema = match self {
            Self::Pagination => json!({
                "type": "object",
                "properties": {
                    "current": {
                        "type": "integer",
                        "description": "Page number (1-based)",
                        "default": 1
                    },
                    "rowCount": {
                        "type": "integer",
                        "description": "Rows per page",
                        "default": 20
                    },
                    "searchPhrase": {
                        "type": "string",
                        "description": "Free-text filter"
                    }
                }
            }),
            Self::NoArguments => json!({
                "type": "object",
                "properties": {}
            }),
            Self::UuidLookup => json!({
                "type": "object",
                "properties": {
                    "uuid": uuid_property()
                },
                "required": ["uuid"]
            }),
            Self::UuidToggle => json!({
                "type": "object",
                "properties": {
                    "uuid": uuid_property(),
                    "enabled": {
                        "type": "boolean",
                        "description": "Whether the item should be enabled"
                    }
                },
                "required": ["uuid", "enabled"]
            }),
            Self::UuidPayload => json!({
                "type": "object",
                "properties": {
                    "uuid": uuid_property(),
                    "data": data_property()
                },
                "required": ["uuid", "data"]
            }),
            Self::Payload => json!({
                "type": "object",
                "properties": {
                    "data": data_property()
                },
                "required": ["data"]
            }),
            Self::Permissive => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": true
            }),
        };

        match schema {
            Value::Object(map) => Arc::new(map),
            _ => Arc::new(JsonObject::new()),
        }
    }
}

fn uuid_property() -> Value {
    json!({
        "type": "string",
        "description": "UUID of the item"
    })
}

fn data_property() -> Value {
    json!({
        "type": "object",
        "description": "Item fields, wrapped the way the API expects them"
    })
}
