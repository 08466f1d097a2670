use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::types::{Amount, DeviceId, DeviceName};

pub const DEFAULT_UNIT: &str = "Unit";

/// Catalog entry that proposals snapshot their line items from.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub name: DeviceName,
    pub description: String,
    pub unit: String,
    pub category: String,
    pub make: String,
    pub model: String,
    pub unit_cost: Amount,
    pub unit_price: Amount,
    pub specifications: Map<String, Value>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Mutable catalog attributes. The name is fixed at creation.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceDetails {
    pub description: String,
    pub unit: String,
    pub category: String,
    pub make: String,
    pub model: String,
    pub unit_cost: Amount,
    pub unit_price: Amount,
    pub specifications: Map<String, Value>,
}

impl DeviceDetails {
    /// Ensures the specification map carries the `unit` key.
    ///
    /// An explicit `unit` inside the specifications wins over the column
    /// value, matching how the builder merges them.
    pub fn with_unit_in_specifications(mut self) -> Self {
        let mut merged = Map::new();
        merged.insert("unit".to_string(), Value::String(self.unit.clone()));
        for (key, value) in std::mem::take(&mut self.specifications) {
            merged.insert(key, value);
        }
        self.specifications = merged;
        self
    }
}

#[derive(Clone, Debug)]
pub struct NewDevice {
    pub id: DeviceId,
    pub name: DeviceName,
    pub details: DeviceDetails,
}

impl NewDevice {
    #[must_use]
    pub fn new(name: DeviceName, details: DeviceDetails) -> Self {
        Self {
            id: DeviceId::new(),
            name,
            details: details.with_unit_in_specifications(),
        }
    }
}

/// Partial device update. `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct DevicePatch {
    pub description: Option<String>,
    pub unit: Option<String>,
    pub category: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub unit_cost: Option<Amount>,
    pub unit_price: Option<Amount>,
    pub specifications: Option<Map<String, Value>>,
}

impl Device {
    pub fn details(&self) -> DeviceDetails {
        DeviceDetails {
            description: self.description.clone(),
            unit: self.unit.clone(),
            category: self.category.clone(),
            make: self.make.clone(),
            model: self.model.clone(),
            unit_cost: self.unit_cost,
            unit_price: self.unit_price,
            specifications: self.specifications.clone(),
        }
    }

    pub fn patched(&self, patch: DevicePatch) -> DeviceDetails {
        let current = self.details();
        DeviceDetails {
            description: patch.description.unwrap_or(current.description),
            unit: patch.unit.unwrap_or(current.unit),
            category: patch.category.unwrap_or(current.category),
            make: patch.make.unwrap_or(current.make),
            model: patch.model.unwrap_or(current.model),
            unit_cost: patch.unit_cost.unwrap_or(current.unit_cost),
            unit_price: patch.unit_price.unwrap_or(current.unit_price),
            specifications: patch.specifications.unwrap_or(current.specifications),
        }
        .with_unit_in_specifications()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn details(specs: Value) -> DeviceDetails {
        DeviceDetails {
            description: String::new(),
            unit: "Box".to_string(),
            category: "Network".to_string(),
            make: "Cisco".to_string(),
            model: "C9200".to_string(),
            unit_cost: Amount::new(10.0).unwrap(),
            unit_price: Amount::new(15.0).unwrap(),
            specifications: specs.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn unit_is_added_to_specifications() {
        let merged = details(json!({"ports": 24})).with_unit_in_specifications();
        assert_eq!(merged.specifications.get("unit"), Some(&json!("Box")));
        assert_eq!(merged.specifications.get("ports"), Some(&json!(24)));
    }

    #[test]
    fn explicit_unit_in_specifications_wins() {
        let merged = details(json!({"unit": "Pair"})).with_unit_in_specifications();
        assert_eq!(merged.specifications.get("unit"), Some(&json!("Pair")));
    }
}
