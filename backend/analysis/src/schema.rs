//! Response schema declared to the model.
//!
//! Written once as JSON Schema; Gemini receives it translated to the OpenAPI
//! subset its `responseSchema` accepts.

use serde_json::{json, Map, Value};

const LEVELS: [&str; 3] = ["low", "medium", "high"];
const SHAPES: [&str; 6] = ["fiber", "fragment", "film", "bead", "foam", "other"];

/// JSON Schema of `ContaminationReport`.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sampleSummary": { "type": "string", "description": "Two or three sentence overview of the sample." },
            "estimatedParticleCount": { "type": "integer", "description": "Estimated number of microplastic particles." },
            "particleDensity": { "type": "string", "description": "Density estimate in plain words, e.g. '~120 particles per litre'." },
            "severityScore": { "type": "integer", "minimum": 1, "maximum": 10, "description": "1 = trace, 10 = extreme, based on particle density." },
            "severityRationale": { "type": "string" },
            "particles": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "shape": { "type": "string", "enum": SHAPES },
                        "polymer": { "type": "string" },
                        "count": { "type": "integer" },
                        "sizeRange": { "type": "string", "description": "Approximate size range in micrometres." },
                        "color": { "type": "string" },
                        "percentage": { "type": "number", "description": "Share of all particles, 0-100." }
                    },
                    "required": ["shape", "polymer", "count", "sizeRange", "color", "percentage"],
                    "additionalProperties": false
                }
            },
            "sources": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "source": { "type": "string" },
                        "likelihood": { "type": "string", "enum": LEVELS },
                        "evidence": { "type": "string" }
                    },
                    "required": ["source", "likelihood", "evidence"],
                    "additionalProperties": false
                }
            },
            "healthRisks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "risk": { "type": "string" },
                        "level": { "type": "string", "enum": LEVELS },
                        "description": { "type": "string" }
                    },
                    "required": ["risk", "level", "description"],
                    "additionalProperties": false
                }
            },
            "recommendations": { "type": "array", "items": { "type": "string" } },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
        },
        "required": [
            "sampleSummary",
            "estimatedParticleCount",
            "particleDensity",
            "severityScore",
            "severityRationale",
            "particles",
            "sources",
            "healthRisks",
            "recommendations"
        ],
        "additionalProperties": false
    })
}

/// Translate JSON Schema into Gemini's OpenAPI-style schema: uppercase type
/// names, no `additionalProperties`, and an explicit `propertyOrdering` so the
/// model emits fields in declaration order.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                match key.as_str() {
                    "additionalProperties" => {}
                    "type" => {
                        let upper = value.as_str().map(str::to_uppercase).unwrap_or_default();
                        out.insert(key.clone(), Value::String(upper));
                    }
                    "properties" => {
                        let props = value.as_object().cloned().unwrap_or_default();
                        let ordering: Vec<Value> =
                            props.keys().map(|k| Value::String(k.clone())).collect();
                        let converted: Map<String, Value> = props
                            .iter()
                            .map(|(k, v)| (k.clone(), to_gemini_schema(v)))
                            .collect();
                        out.insert(key.clone(), Value::Object(converted));
                        out.insert("propertyOrdering".into(), Value::Array(ordering));
                    }
                    "items" => {
                        out.insert(key.clone(), to_gemini_schema(value));
                    }
                    _ => {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
