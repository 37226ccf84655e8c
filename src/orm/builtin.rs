//! Models shipped with the service itself (the `user` schema)

use super::{FieldKind, ModelDefinition};

/// Application name the built-in models are registered under
pub const APP: &str = "sprout";

pub fn models() -> Vec<ModelDefinition> {
    vec![salt(), user()]
}

fn salt() -> ModelDefinition {
    ModelDefinition::new(APP, "user", "salt")
        .primary_key("id", FieldKind::Int)
        .field("salt", FieldKind::Text)
}

// Provisioning creates `salt` as a `salt_id` column referencing the salt
// table. Relations have no diff mapping yet, so diffing this model reports
// the field as unsupported.
fn user() -> ModelDefinition {
    ModelDefinition::new(APP, "user", "user")
        .primary_key("id", FieldKind::Int)
        .field("name", FieldKind::Text)
        .field("pw", FieldKind::Text)
        .foreign_key("salt", "salt")
        .field("contact", FieldKind::Text)
        .field("profile", FieldKind::Text)
}
