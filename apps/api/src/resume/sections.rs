//! The structured resume document: which sections exist and how an edit applies.

use serde_json::{json, Map, Value};

/// Top-level keys of `parsed_content`, in display order.
pub const SECTIONS: [&str; 7] = [
    "full_name",
    "contact_info",
    "summary",
    "skills",
    "work_experience",
    "education",
    "projects",
];

pub fn is_known_section(name: &str) -> bool {
    SECTIONS.contains(&name)
}

/// Empty document for a resume started from scratch.
pub fn skeleton_content() -> Value {
    json!({
        "full_name": "",
        "contact_info": { "email": "", "phone": "", "linkedin": "" },
        "summary": "",
        "skills": [],
        "work_experience": [],
        "education": [],
        "projects": [],
    })
}

/// Returns `current` with one section replaced. Non-object documents
/// (never parsed, or parsed into something odd) start from the skeleton.
pub fn apply_section(current: Option<&Value>, section: &str, content: Value) -> Value {
    let mut doc: Map<String, Value> = match current {
        Some(Value::Object(map)) => map.clone(),
        _ => match skeleton_content() {
            Value::Object(map) => map,
            _ => Map::new(),
        },
    };
    doc.insert(section.to_string(), content);
    Value::Object(doc)
}
