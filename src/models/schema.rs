use serde::{ de::DeserializeOwned, Deserialize, Serialize };
use serde_json::{ json, Value as JsonValue };

/// A type the provider can be asked to fill in through strict JSON schema
/// output.
pub trait StructuredOutput: DeserializeOwned + Serialize + Send {
    /// Name reported to the provider alongside the schema.
    const NAME: &'static str;

    fn json_schema() -> JsonValue;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub name: String,
    pub date: String,
    pub participants: Vec<String>,
}

impl StructuredOutput for CalendarEvent {
    const NAME: &'static str = "event";

    fn json_schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "date": { "type": "string" },
                "participants": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["name", "date", "participants"],
            "additionalProperties": false
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListing {
    pub cottage_name: String,
    pub number_of_guests: f64,
    pub number_of_bedrooms: f64,
    pub number_of_bathrooms: f64,
    pub allows_pets: bool,
    pub key_features: Vec<String>,
    pub marketing_copy: String,
}

impl StructuredOutput for PropertyListing {
    const NAME: &'static str = "property";

    fn json_schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "cottageName": { "type": "string" },
                "numberOfGuests": { "type": "number" },
                "numberOfBedrooms": { "type": "number" },
                "numberOfBathrooms": { "type": "number" },
                "allowsPets": { "type": "boolean" },
                "keyFeatures": { "type": "array", "items": { "type": "string" } },
                "marketingCopy": { "type": "string" }
            },
            "required": [
                "cottageName",
                "numberOfGuests",
                "numberOfBedrooms",
                "numberOfBathrooms",
                "allowsPets",
                "keyFeatures",
                "marketingCopy"
            ],
            "additionalProperties": false
        })
    }
}
