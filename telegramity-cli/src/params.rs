use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tracing::debug;

/// Parse `key=value` context entries.
///
/// Values that parse as JSON (numbers, booleans, objects) keep their type;
/// anything else is taken as a plain string.
pub fn parse_context(params: &[String]) -> Result<BTreeMap<String, Value>> {
    debug!("Parsing {} context entries", params.len());

    params
        .iter()
        .map(|param| {
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid context entry `{param}`, expected KEY=VALUE"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(anyhow!("Invalid context entry `{param}`, key is empty"));
            }
            let value =
                serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
            Ok((key.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context() {
        let params = vec![
            "user_id=u1".to_string(),
            "attempt=3".to_string(),
            "query=a=b".to_string(),
        ];
        let context = parse_context(&params).unwrap();
        assert_eq!(context["user_id"], Value::from("u1"));
        assert_eq!(context["attempt"], Value::from(3));
        assert_eq!(context["query"], Value::from("a=b"));
    }

    #[test]
    fn test_parse_context_rejects_missing_separator() {
        assert!(parse_context(&["oops".to_string()]).is_err());
        assert!(parse_context(&["=value".to_string()]).is_err());
    }
}
