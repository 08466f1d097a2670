use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_json::{Map, Value};

use crate::domain::device::{Device as DomainDevice, DeviceDetails, NewDevice as DomainNewDevice};
use crate::domain::types::{Amount, DeviceId, DeviceName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::devices)]
/// Diesel model for [`crate::domain::device::Device`].
pub struct Device {
    pub id: String,
    pub name: String,
    pub description: String,
    pub unit: String,
    pub category: String,
    pub make: String,
    pub model: String,
    pub unit_cost: f64,
    pub unit_price: f64,
    pub specifications: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::devices)]
/// Insertable form of [`Device`].
pub struct NewDevice<'a> {
    pub id: String,
    pub name: &'a str,
    pub description: &'a str,
    pub unit: &'a str,
    pub category: &'a str,
    pub make: &'a str,
    pub model: &'a str,
    pub unit_cost: f64,
    pub unit_price: f64,
    pub specifications: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::devices)]
/// Data used when updating a [`Device`] record. The name never changes.
pub struct UpdateDevice<'a> {
    pub description: &'a str,
    pub unit: &'a str,
    pub category: &'a str,
    pub make: &'a str,
    pub model: &'a str,
    pub unit_cost: f64,
    pub unit_price: f64,
    pub specifications: String,
    pub updated_at: NaiveDateTime,
}

/// Parses a stored JSON object column.
pub(crate) fn parse_json_object(raw: &str) -> Result<Map<String, Value>, TypeConstraintError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TypeConstraintError::InvalidValue(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(TypeConstraintError::InvalidValue(format!(
            "malformed JSON: {e}"
        ))),
    }
}

fn specifications_text(specifications: &Map<String, Value>) -> String {
    Value::Object(specifications.clone()).to_string()
}

impl TryFrom<Device> for DomainDevice {
    type Error = TypeConstraintError;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DeviceId::parse(&device.id)?,
            name: DeviceName::new(device.name)?,
            description: device.description,
            unit: device.unit,
            category: device.category,
            make: device.make,
            model: device.model,
            unit_cost: Amount::new(device.unit_cost)?,
            unit_price: Amount::new(device.unit_price)?,
            specifications: parse_json_object(&device.specifications)?,
            is_active: device.is_active,
            created_at: device.created_at,
            updated_at: device.updated_at,
        })
    }
}

impl<'a> NewDevice<'a> {
    pub fn from_domain(device: &'a DomainNewDevice, now: NaiveDateTime) -> Self {
        let details = &device.details;
        Self {
            id: device.id.to_string(),
            name: device.name.as_str(),
            description: &details.description,
            unit: &details.unit,
            category: &details.category,
            make: &details.make,
            model: &details.model,
            unit_cost: details.unit_cost.get(),
            unit_price: details.unit_price.get(),
            specifications: specifications_text(&details.specifications),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl<'a> UpdateDevice<'a> {
    pub fn from_domain(details: &'a DeviceDetails, now: NaiveDateTime) -> Self {
        Self {
            description: &details.description,
            unit: &details.unit,
            category: &details.category,
            make: &details.make,
            model: &details.model,
            unit_cost: details.unit_cost.get(),
            unit_price: details.unit_price.get(),
            specifications: specifications_text(&details.specifications),
            updated_at: now,
        }
    }
}
