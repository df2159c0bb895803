use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{MenuError, Result};

/// Default location for [`persist`], relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "output/structured_outputs_parsed_menu.json";

/// Name the schema is registered under in the `response_format` block.
pub const SCHEMA_NAME: &str = "CoffeeMenu";

/// One line of a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub category: String,
    pub item: String,
    pub description: String,
    #[serde(default)]
    pub price: Option<String>,
}

/// Items in the order the model returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
}

impl Menu {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// JSON Schema for [`Menu`] in the strict form structured outputs require:
/// every property listed as required, no extra properties, and `price`
/// made optional through a nullable type.
pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "category": {"type": "string"},
                        "item": {"type": "string"},
                        "description": {"type": "string"},
                        "price": {"type": ["string", "null"]}
                    },
                    "required": ["category", "item", "description", "price"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["items"],
        "additionalProperties": false
    })
}

/// Write each item as four labelled lines followed by a blank line.
pub fn render<W: Write>(out: &mut W, menu: &Menu) -> std::io::Result<()> {
    for item in &menu.items {
        writeln!(out, "Category: {}", item.category)?;
        writeln!(out, "Item: {}", item.item)?;
        writeln!(out, "Description: {}", item.description)?;
        writeln!(out, "Price: {}", item.price.as_deref().unwrap_or("None"))?;
        writeln!(out)?;
    }
    Ok(())
}

/// Serialize `menu` with 4-space indentation.
pub fn to_json_pretty(menu: &Menu) -> Result<String> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    menu.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| MenuError::Io(e.to_string()))
}

/// Write `menu` to `path`, creating parent directories and replacing any
/// existing file.
pub fn persist(menu: &Menu, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| MenuError::Io(format!("failed to create {}: {e}", dir.display())))?;
    }
    let text = to_json_pretty(menu)?;
    std::fs::write(path, text)
        .map_err(|e| MenuError::Io(format!("failed to write {}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), items = menu.len(), "menu written");
    Ok(())
}
