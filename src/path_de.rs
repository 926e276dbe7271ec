use serde::de::DeserializeOwned;

use crate::error::DeclarationError;

/// Deserialize a declaration document, naming the JSON path of the offending node on failure.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str, origin: &str) -> Result<T, DeclarationError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        DeclarationError::Document(format!("{origin}: at JSON path {path} → {}", err.into_inner()))
    })
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8], origin: &str) -> Result<T, DeclarationError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        DeclarationError::Document(format!("{origin}: at JSON path {path} → {}", err.into_inner()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Outer {
        #[allow(dead_code)]
        items: Vec<Inner>,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        #[allow(dead_code)]
        n: i64,
    }

    #[test]
    fn error_names_the_failing_path() {
        let err = from_str_with_path::<Outer>(r#"{"items": [{"n": 1}, {"n": "x"}]}"#, "schema.json").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("schema.json"), "{text}");
        assert!(text.contains("items[1].n"), "{text}");
        assert!(from_slice_with_path::<Outer>(br#"{"items": []}"#, "bytes").is_ok());
    }
}
