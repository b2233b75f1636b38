// Parameter extraction
// Merges query string and JSON body into the single map handlers read from

use super::Request;
use serde_json::{Map, Value};

/// Handler parameter map. Query values are strings, body values keep their JSON type.
pub type Params = Map<String, Value>;

/// Methods whose body contributes to the parameter map
const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// Build the parameter map for a request
///
/// Read-only methods see only the query string. POST/PUT/PATCH additionally merge
/// the JSON object body on top (body keys win). A malformed or non-object body
/// contributes nothing.
pub fn extract_params(request: &Request) -> Params {
    let mut params: Params = request
        .query()
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let takes_body = request
        .method()
        .is_some_and(|m| BODY_METHODS.contains(&m));
    if !takes_body {
        return params;
    }

    if let Some(Value::Object(body)) = request.json_body() {
        params.extend(body);
    }

    params
}
