//! 从模型输出中提取 JSON 对象
//!
//! 模型输出常见问题：对象前后夹杂说明文字、生成被截断缺少收尾括号、值位置写了未加引号的 `<placeholder>`。
//! parse_one 逐字符扫描并尽量修复，严格 JSON 解析失败时再按 JSON5 宽松解析；
//! 任何无法修复的情况都返回 None，从不 panic。

use serde_json::Value;

/// 提取文本中第一个 JSON 对象
///
/// - 从第一个 `{` 开始，维护期望的收尾符栈，括号错配立即失败
/// - 字符串外的 `<` / `>` 改写为 `"<` / `>"`，把占位符当作字符串
/// - 输入结束时栈未空（生成被截断）则按栈顺序补齐收尾符
/// - 双引号与单引号字符串内的括号、尖括号原样保留
/// - 空对象 `{}` 视为未找到
pub fn parse_one(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut buffer = String::from("{");
    let mut expected = vec!['}'];
    // 当前所在字符串的引号（JSON5 允许单引号字符串）
    let mut quote: Option<char> = None;
    let mut chars = text[start + 1..].chars();

    while let Some(ch) = chars.next() {
        if let Some(open) = quote {
            match ch {
                '\\' => {
                    // 转义序列整体透传；反斜杠位于末尾视为格式错误
                    let escaped = chars.next()?;
                    buffer.push(ch);
                    buffer.push(escaped);
                }
                c if c == open => {
                    quote = None;
                    buffer.push(ch);
                }
                _ => buffer.push(ch),
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                buffer.push(ch);
            }
            '{' => {
                expected.push('}');
                buffer.push(ch);
            }
            '[' => {
                expected.push(']');
                buffer.push(ch);
            }
            '}' | ']' => {
                if expected.pop() != Some(ch) {
                    return None;
                }
                buffer.push(ch);
                if expected.is_empty() {
                    break;
                }
            }
            '<' => buffer.push_str("\"<"),
            '>' => buffer.push_str(">\""),
            _ => buffer.push(ch),
        }
    }

    while let Some(close) = expected.pop() {
        buffer.push(close);
    }

    match parse_relaxed(&buffer)? {
        Value::Object(map) if map.is_empty() => None,
        value => Some(value),
    }
}

/// 先按严格 JSON 解析，失败再按 JSON5 解析（尾逗号、未加引号的键、单引号字符串）
fn parse_relaxed(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Some(value),
        Err(_) => json5::from_str::<Value>(raw).ok(),
    }
}

/// 提取文本中的全部 JSON 对象（按出现顺序）
///
/// 多行文本先逐行提取；逐行一无所获（包括单行文本）时，再把整段文本作为一个整体提取一次。
pub fn parse_all(text: &str) -> Vec<Value> {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 {
        let found: Vec<Value> = lines.iter().filter_map(|line| parse_one(line)).collect();
        if !found.is_empty() {
            return found;
        }
    }

    parse_one(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_object() {
        assert_eq!(parse_one(r#"{ "foo": "bar" }"#), Some(json!({"foo": "bar"})));
    }

    #[test]
    fn test_parse_embedded_object() {
        assert_eq!(
            parse_one(r#"Hello { "foo": "bar" } World"#),
            Some(json!({"foo": "bar"}))
        );
    }

    #[test]
    fn test_parse_truncated_object() {
        let text = r#"Plan: {"foo":"bar","baz":[1,2,3],"qux":{"quux":"corge"}"#;
        assert_eq!(
            parse_one(text),
            Some(json!({"foo": "bar", "baz": [1, 2, 3], "qux": {"quux": "corge"}}))
        );
    }

    #[test]
    fn test_parse_truncated_nested_array() {
        assert_eq!(
            parse_one(r#"{"steps": ["a", "b""#),
            Some(json!({"steps": ["a", "b"]}))
        );
    }

    #[test]
    fn test_parse_rejects_empty_and_malformed() {
        assert_eq!(parse_one("{}"), None);
        assert_eq!(parse_one("{"), None);
        assert_eq!(parse_one(r#"Plan: {"foo": ["bar"}"#), None);
        assert_eq!(parse_one("no braces here"), None);
    }

    #[test]
    fn test_parse_trailing_backslash_fails() {
        assert_eq!(parse_one(r#"{"foo": "bar\"#), None);
    }

    #[test]
    fn test_parse_quotes_placeholders() {
        assert_eq!(parse_one(r#"Plan: {"foo":<bar>}"#), Some(json!({"foo": "<bar>"})));
    }

    #[test]
    fn test_parse_keeps_angle_brackets_in_strings() {
        assert_eq!(
            parse_one(r#"{"html": "<b>bold</b>"}"#),
            Some(json!({"html": "<b>bold</b>"}))
        );
    }

    #[test]
    fn test_parse_escapes_pass_through() {
        assert_eq!(
            parse_one(r#"{"quote": "say \"hi\" {not a brace}"}"#),
            Some(json!({"quote": "say \"hi\" {not a brace}"}))
        );
    }

    #[test]
    fn test_parse_stops_at_first_complete_object() {
        assert_eq!(parse_one(r#"{"a": 1} {"b": 2}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_parse_serialized_value_is_stable() {
        let value = json!({"name": "x", "items": [1, {"k": null}], "ok": true});
        assert_eq!(parse_one(&value.to_string()), Some(value));
    }

    #[test]
    fn test_parse_relaxed_trailing_commas() {
        let value = parse_one(r#"Plan: {"a": 1, "b": [1, 2,],}"#).unwrap();
        assert_eq!(value["a"].as_f64(), Some(1.0));
        assert_eq!(value["b"].as_array().map(Vec::len), Some(2));

        let value = parse_one(r#"{"a": 1,}"#).unwrap();
        assert_eq!(value["a"].as_f64(), Some(1.0));
    }

    #[test]
    fn test_parse_relaxed_unquoted_keys_and_single_quotes() {
        assert_eq!(parse_one(r#"{answer: "x"}"#), Some(json!({"answer": "x"})));
        assert_eq!(parse_one("{'answer': 'x'}"), Some(json!({"answer": "x"})));
        assert_eq!(
            parse_one("Result: {'note': 'a } inside', 'ok': true}"),
            Some(json!({"note": "a } inside", "ok": true}))
        );
    }

    #[test]
    fn test_parse_relaxed_still_rejects_garbage() {
        assert_eq!(parse_one("{a b c}"), None);
        assert_eq!(parse_one("{,}"), None);
    }

    #[test]
    fn test_parse_all_per_line() {
        let text = "first {\"a\": 1}\nnothing here\nsecond {\"b\": 2}";
        assert_eq!(parse_all(text), vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn test_parse_all_multiline_object() {
        let text = "Here you go:\n{\n  \"a\": 1,\n  \"b\": [1, 2]\n}\nThanks";
        assert_eq!(parse_all(text), vec![json!({"a": 1, "b": [1, 2]})]);
    }

    #[test]
    fn test_parse_all_single_line() {
        assert_eq!(parse_all(r#"{"a": 1}"#), vec![json!({"a": 1})]);
        assert!(parse_all("nothing").is_empty());
        assert!(parse_all("").is_empty());
    }
}
