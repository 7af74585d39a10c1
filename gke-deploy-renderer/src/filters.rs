//! Text helpers registered on top of Tera's built-in filters.
//!
//! | filter      | effect                                              |
//! |-------------|-----------------------------------------------------|
//! | `b64enc`    | standard base64 encoding                            |
//! | `b64dec`    | standard base64 decoding (must yield UTF-8)         |
//! | `quote`     | double-quoted, escaped string                       |
//! | `squote`    | single-quoted string, `'` doubled                   |
//! | `indent`    | prefix every line with `width` spaces               |
//! | `nindent`   | newline followed by `indent`                        |
//! | `sha256sum` | lowercase hex SHA-256 digest                        |
//! | `to_yaml`   | YAML serialization, no trailing newline             |
//!
//! Non-string values are stringified as JSON first, so `{{ 3 | b64enc }}`
//! encodes `3`.

use std::collections::HashMap;

use base64::Engine;
use sha2::{Digest, Sha256};
use tera::{Error, Result, Tera, Value};

pub(crate) fn register(tera: &mut Tera) {
    tera.register_filter("b64enc", b64enc);
    tera.register_filter("b64dec", b64dec);
    tera.register_filter("quote", quote);
    tera.register_filter("squote", squote);
    tera.register_filter("indent", indent);
    tera.register_filter("nindent", nindent);
    tera.register_filter("sha256sum", sha256sum);
    tera.register_filter("to_yaml", to_yaml);
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn width_arg(filter: &str, args: &HashMap<String, Value>) -> Result<usize> {
    match args.get("width") {
        Some(v) => tera::from_value::<usize>(v.clone()).map_err(|_| {
            Error::msg(format!(
                "filter `{filter}` expects `width` to be a non-negative integer, got {v}"
            ))
        }),
        None => Err(Error::msg(format!(
            "filter `{filter}` requires a `width` argument"
        ))),
    }
}

fn b64enc(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(as_text(value));
    Ok(Value::String(encoded))
}

fn b64dec(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(as_text(value))
        .map_err(|e| Error::msg(format!("filter `b64dec`: invalid base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::msg(format!("filter `b64dec`: decoded value is not UTF-8: {e}")))?;
    Ok(Value::String(text))
}

fn quote(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let quoted = serde_json::to_string(&as_text(value))
        .map_err(|e| Error::msg(format!("filter `quote`: {e}")))?;
    Ok(Value::String(quoted))
}

fn squote(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    Ok(Value::String(format!(
        "'{}'",
        as_text(value).replace('\'', "''")
    )))
}

fn indent_lines(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.split('\n')
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(value: &Value, args: &HashMap<String, Value>) -> Result<Value> {
    let width = width_arg("indent", args)?;
    Ok(Value::String(indent_lines(&as_text(value), width)))
}

fn nindent(value: &Value, args: &HashMap<String, Value>) -> Result<Value> {
    let width = width_arg("nindent", args)?;
    Ok(Value::String(format!(
        "\n{}",
        indent_lines(&as_text(value), width)
    )))
}

fn sha256sum(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let mut h = Sha256::new();
    h.update(as_text(value).as_bytes());
    Ok(Value::String(hex::encode(h.finalize())))
}

fn to_yaml(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let yaml = serde_yaml::to_string(value)
        .map_err(|e| Error::msg(format!("filter `to_yaml`: {e}")))?;
    Ok(Value::String(yaml.trim_end_matches('\n').to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_args() -> HashMap<String, Value> {
        HashMap::new()
    }

    fn width(n: usize) -> HashMap<String, Value> {
        HashMap::from([("width".to_string(), json!(n))])
    }

    #[test]
    fn b64enc_encodes_strings_and_numbers() {
        assert_eq!(b64enc(&json!("123"), &no_args()).unwrap(), json!("MTIz"));
        assert_eq!(b64enc(&json!(123), &no_args()).unwrap(), json!("MTIz"));
    }

    #[test]
    fn b64dec_rejects_garbage() {
        assert_eq!(b64dec(&json!("MTIz"), &no_args()).unwrap(), json!("123"));
        assert!(b64dec(&json!("!!!"), &no_args()).is_err());
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(
            quote(&json!("say \"hi\""), &no_args()).unwrap(),
            json!(r#""say \"hi\"""#)
        );
        assert_eq!(squote(&json!("it's"), &no_args()).unwrap(), json!("'it''s'"));
    }

    #[test]
    fn indent_prefixes_every_line() {
        assert_eq!(indent(&json!("a\nb"), &width(2)).unwrap(), json!("  a\n  b"));
        assert_eq!(nindent(&json!("a"), &width(4)).unwrap(), json!("\n    a"));
        assert!(indent(&json!("a"), &no_args()).is_err());
    }

    #[test]
    fn sha256sum_is_hex() {
        assert_eq!(
            sha256sum(&json!("abc"), &no_args()).unwrap(),
            json!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn to_yaml_serializes_mappings() {
        let out = to_yaml(&json!({"tier": "web"}), &no_args()).unwrap();
        assert_eq!(out, json!("tier: web"));
    }
}
