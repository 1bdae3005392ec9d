use json::JsonValue;

/// Always produce a JSON value. `null` is used when there is nothing to output.
pub trait ToJson2 {
    fn to_json2(&self) -> JsonValue;
}
