use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use super::short_name;
use crate::errors::ConfigError;
use crate::hashing::hash_value;
use crate::unit::Unit;

/// `(tag, campos)` de una unidad. En JSON: `{"class": "...", ...campos}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub class: String,
    #[serde(flatten)]
    pub fields: Map<String, Json>,
}

impl UnitSpec {
    pub fn of(class: impl Into<String>) -> Self {
        Self { class: class.into(),
               fields: Map::new() }
    }

    pub fn decode(json: &Json) -> Result<Self, ConfigError> {
        if !json.is_object() {
            return Err(ConfigError::invalid_field("class", "unit spec must be a JSON object"));
        }
        UnitSpec::deserialize(json).map_err(|e| ConfigError::invalid_field("class", e))
    }

    pub fn to_json(&self) -> Json {
        let mut map = self.fields.clone();
        map.insert("class".to_string(), Json::String(self.class.clone()));
        Json::Object(map)
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.class)
    }

    /// Campo tipado; `null` o ausente es `None`.
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        match self.fields.get(name) {
            None | Some(Json::Null) => Ok(None),
            Some(v) => T::deserialize(v).map(Some).map_err(|e| ConfigError::invalid_field(name, e)),
        }
    }

    /// Campo con una unidad anidada.
    pub fn unit(&self, name: &str) -> Result<Option<UnitSpec>, ConfigError> {
        match self.fields.get(name) {
            None | Some(Json::Null) => Ok(None),
            Some(v) => UnitSpec::decode(v).map(Some).map_err(|e| nested(name, e)),
        }
    }

    /// Campo con una lista de unidades anidadas.
    pub fn units(&self, name: &str) -> Result<Vec<UnitSpec>, ConfigError> {
        match self.fields.get(name) {
            None | Some(Json::Null) => Ok(vec![]),
            Some(Json::Array(items)) => items.iter().map(|v| UnitSpec::decode(v).map_err(|e| nested(name, e))).collect(),
            Some(_) => Err(ConfigError::invalid_field(name, "expected a list of unit specs")),
        }
    }

    pub fn with(mut self, name: &str, value: impl Serialize) -> Result<Self, ConfigError> {
        let v = serde_json::to_value(value).map_err(|e| ConfigError::invalid_field(name, e))?;
        if !v.is_null() {
            self.fields.insert(name.to_string(), v);
        }
        Ok(self)
    }

    pub fn with_unit<U: Unit + ?Sized>(mut self, name: &str, unit: Option<&U>) -> Result<Self, ConfigError> {
        if let Some(u) = unit {
            self.fields.insert(name.to_string(), u.to_spec()?.to_json());
        }
        Ok(self)
    }

    pub fn with_units<'u, U, I>(mut self, name: &str, units: I) -> Result<Self, ConfigError>
        where U: Unit + ?Sized + 'u,
              I: IntoIterator<Item = &'u U>
    {
        let items = units.into_iter().map(|u| u.to_spec().map(|s| s.to_json())).collect::<Result<Vec<_>, _>>()?;
        self.fields.insert(name.to_string(), Json::Array(items));
        Ok(self)
    }

    /// Hash blake3 del JSON canónico (estable ante el orden de claves).
    pub fn fingerprint(&self) -> String {
        hash_value(&self.to_json())
    }
}

fn nested(name: &str, err: ConfigError) -> ConfigError {
    match err {
        ConfigError::InvalidField { field, reason } => ConfigError::InvalidField { field: format!("{name}.{field}"),
                                                                                   reason },
        other => other,
    }
}
