use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::domain::device::{DEFAULT_UNIT, DeviceDetails, DevicePatch};
use crate::domain::types::{Amount, DeviceName};
use crate::forms::{FormError, clean};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/devices`.
pub struct CreateDeviceForm {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub make: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(range(min = 0.0))]
    pub unit_cost: f64,
    #[validate(range(min = 0.0))]
    pub unit_price: f64,
    pub specifications: Option<Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Body of `PUT /api/devices/{id}`. A `name` key is accepted and ignored.
pub struct UpdateDeviceForm {
    pub description: Option<String>,
    pub unit: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub make: Option<String>,
    #[validate(length(min = 1))]
    pub model: Option<String>,
    #[validate(range(min = 0.0))]
    pub unit_cost: Option<f64>,
    #[validate(range(min = 0.0))]
    pub unit_price: Option<f64>,
    pub specifications: Option<Value>,
}

pub struct CreateDevicePayload {
    pub name: DeviceName,
    pub details: DeviceDetails,
}

fn specifications(value: Option<Value>) -> Result<Map<String, Value>, FormError> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(FormError::Invalid(
            "specifications must be a JSON object".to_string(),
        )),
    }
}

fn required(value: String, field: &str) -> Result<String, FormError> {
    clean(Some(value)).ok_or_else(|| FormError::Invalid(format!("{field} is required")))
}

impl TryFrom<CreateDeviceForm> for CreateDevicePayload {
    type Error = FormError;

    fn try_from(form: CreateDeviceForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            name: DeviceName::new(form.name)?,
            details: DeviceDetails {
                description: form.description.unwrap_or_default().trim().to_string(),
                unit: clean(form.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
                category: required(form.category, "category")?,
                make: required(form.make, "make")?,
                model: required(form.model, "model")?,
                unit_cost: Amount::new(form.unit_cost)?,
                unit_price: Amount::new(form.unit_price)?,
                specifications: specifications(form.specifications)?,
            },
        })
    }
}

impl TryFrom<UpdateDeviceForm> for DevicePatch {
    type Error = FormError;

    fn try_from(form: UpdateDeviceForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            description: form.description.map(|d| d.trim().to_string()),
            unit: clean(form.unit),
            category: form.category.map(|c| required(c, "category")).transpose()?,
            make: form.make.map(|m| required(m, "make")).transpose()?,
            model: form.model.map(|m| required(m, "model")).transpose()?,
            unit_cost: form.unit_cost.map(Amount::new).transpose()?,
            unit_price: form.unit_price.map(Amount::new).transpose()?,
            specifications: match form.specifications {
                None => None,
                value => Some(specifications(value)?),
            },
        })
    }
}
