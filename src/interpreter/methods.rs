//! Built-in methods of `list`, `dict`, `str` and the output streams
//!
//! Attribute lookup binds a method name to its receiver
//! ([`BoundMethod`](crate::memory::value::BoundMethod)); calling it lands in
//! [`Interpreter::call_method`]. `dict.keys()`, `values()` and `items()`
//! return list snapshots rather than live views.

use crate::interpreter::builtins::{check_arity, int_argument, reject_kwargs, take_kwarg};
use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::{ExceptionKind, RuntimeError};
use crate::memory::value::{Dict, Stream, Value};
use crate::parser::ast::SourceLocation;
use std::cell::RefCell;
use std::rc::Rc;

const LIST_METHODS: &[&str] = &[
    "append", "pop", "insert", "extend", "remove", "index", "count", "sort", "reverse", "clear",
    "copy",
];

const DICT_METHODS: &[&str] = &[
    "get", "keys", "values", "items", "pop", "popitem", "update", "clear", "copy", "setdefault",
];

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "join", "replace", "startswith",
    "endswith", "find", "index", "count", "isdigit", "isalpha", "isspace", "isupper", "islower",
    "title", "capitalize", "format",
];

/// Whether `value` has a built-in method called `name`
pub(crate) fn has_method(value: &Value, name: &str) -> bool {
    let table: &[&str] = match value {
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        Value::Str(_) => STR_METHODS,
        Value::Stream(_) => &["write", "flush"],
        _ => &[],
    };
    table.contains(&name)
}

impl Interpreter<'_> {
    /// Call `receiver.name(*args, **kwargs)`
    pub(crate) fn call_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match receiver {
            Value::List(items) => self.call_list_method(items, name, args, kwargs, location),
            Value::Dict(dict) => self.call_dict_method(dict, name, args, kwargs, location),
            Value::Str(text) => self.call_str_method(text, name, args, kwargs, location),
            Value::Stream(stream) => {
                reject_kwargs(name, &kwargs, location)?;
                match name {
                    "flush" => {
                        check_arity(name, &args, 0, 0, location)?;
                        Ok(Value::None)
                    }
                    _ => {
                        check_arity(name, &args, 1, 1, location)?;
                        let Value::Str(text) = &args[0] else {
                            return Err(RuntimeError::type_error(
                                format!(
                                    "write() argument must be str, not {}",
                                    args[0].type_name()
                                ),
                                location,
                            ));
                        };
                        self.output.write(*stream, text);
                        Ok(Value::Int(text.chars().count() as i64))
                    }
                }
            }
            other => Err(RuntimeError::raise(
                ExceptionKind::AttributeError,
                format!("'{}' object has no attribute '{}'", other.type_name(), name),
                location,
            )),
        }
    }

    fn call_list_method(
        &mut self,
        items: &Rc<RefCell<Vec<Value>>>,
        name: &str,
        args: Vec<Value>,
        mut kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if name == "sort" {
            check_arity(name, &args, 0, 0, location)?;
            let key = take_kwarg(&mut kwargs, "key");
            let reverse = take_kwarg(&mut kwargs, "reverse").is_some_and(|r| r.is_truthy());
            reject_kwargs(name, &kwargs, location)?;
            // Sort a copy so key functions observe the list unchanged
            let snapshot = items.borrow().clone();
            let sorted = self.sort_values(snapshot, key.as_ref(), reverse, location)?;
            *items.borrow_mut() = sorted;
            return Ok(Value::None);
        }
        reject_kwargs(name, &kwargs, location)?;

        match name {
            "append" => {
                check_arity(name, &args, 1, 1, location)?;
                items.borrow_mut().extend(args);
                Ok(Value::None)
            }
            "extend" => {
                check_arity(name, &args, 1, 1, location)?;
                let extra = self.collect_iterable(&args[0], location)?;
                items.borrow_mut().extend(extra);
                Ok(Value::None)
            }
            "insert" => {
                check_arity(name, &args, 2, 2, location)?;
                let len = items.borrow().len() as i64;
                let index = int_argument(&args[0], location)?;
                let index = if index < 0 { (index + len).max(0) } else { index.min(len) };
                items.borrow_mut().insert(index as usize, args[1].clone());
                Ok(Value::None)
            }
            "pop" => {
                check_arity(name, &args, 0, 1, location)?;
                let mut items = items.borrow_mut();
                if items.is_empty() {
                    return Err(RuntimeError::index_error("pop from empty list", location));
                }
                let len = items.len() as i64;
                let index = match args.first() {
                    Some(value) => int_argument(value, location)?,
                    None => -1,
                };
                let resolved = if index < 0 { index + len } else { index };
                if !(0..len).contains(&resolved) {
                    return Err(RuntimeError::index_error("pop index out of range", location));
                }
                Ok(items.remove(resolved as usize))
            }
            "remove" => {
                check_arity(name, &args, 1, 1, location)?;
                let position = items.borrow().iter().position(|item| item.py_eq(&args[0]));
                match position {
                    Some(i) => {
                        items.borrow_mut().remove(i);
                        Ok(Value::None)
                    }
                    None => Err(RuntimeError::value_error(
                        "list.remove(x): x not in list",
                        location,
                    )),
                }
            }
            "index" => {
                check_arity(name, &args, 1, 1, location)?;
                let position = items.borrow().iter().position(|item| item.py_eq(&args[0]));
                match position {
                    Some(i) => Ok(Value::Int(i as i64)),
                    None => Err(RuntimeError::value_error(
                        format!("{} is not in list", self.repr_of(&args[0], location)?),
                        location,
                    )),
                }
            }
            "count" => {
                check_arity(name, &args, 1, 1, location)?;
                let count = items.borrow().iter().filter(|item| item.py_eq(&args[0])).count();
                Ok(Value::Int(count as i64))
            }
            "reverse" => {
                check_arity(name, &args, 0, 0, location)?;
                items.borrow_mut().reverse();
                Ok(Value::None)
            }
            "clear" => {
                check_arity(name, &args, 0, 0, location)?;
                items.borrow_mut().clear();
                Ok(Value::None)
            }
            _ => {
                check_arity(name, &args, 0, 0, location)?;
                Ok(Value::new_list(items.borrow().clone()))
            }
        }
    }

    fn call_dict_method(
        &mut self,
        dict: &Rc<RefCell<Dict>>,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if name == "update" {
            check_arity(name, &args, 0, 1, location)?;
            let mut entries = match args.first() {
                Some(source) => self.dict_entries(source, location)?,
                None => Vec::new(),
            };
            entries.extend(kwargs.into_iter().map(|(key, value)| (Value::from(key), value)));
            let mut dict = dict.borrow_mut();
            for (key, value) in entries {
                dict.insert(key, value);
            }
            return Ok(Value::None);
        }
        reject_kwargs(name, &kwargs, location)?;

        let hashable_key = |key: &Value| {
            if key.is_hashable() {
                Ok(())
            } else {
                Err(RuntimeError::type_error(
                    format!("unhashable type: '{}'", key.type_name()),
                    location,
                ))
            }
        };

        match name {
            "get" => {
                check_arity(name, &args, 1, 2, location)?;
                hashable_key(&args[0])?;
                let default = args.get(1).cloned().unwrap_or(Value::None);
                Ok(dict.borrow().get(&args[0]).cloned().unwrap_or(default))
            }
            "keys" => {
                check_arity(name, &args, 0, 0, location)?;
                Ok(Value::new_list(dict.borrow().keys()))
            }
            "values" => {
                check_arity(name, &args, 0, 0, location)?;
                Ok(Value::new_list(dict.borrow().values()))
            }
            "items" => {
                check_arity(name, &args, 0, 0, location)?;
                let pairs = dict
                    .borrow()
                    .iter()
                    .map(|(key, value)| Value::new_tuple(vec![key.clone(), value.clone()]))
                    .collect();
                Ok(Value::new_list(pairs))
            }
            "pop" => {
                check_arity(name, &args, 1, 2, location)?;
                hashable_key(&args[0])?;
                let removed = dict.borrow_mut().remove(&args[0]);
                match (removed, args.get(1)) {
                    (Some(value), _) => Ok(value),
                    (None, Some(default)) => Ok(default.clone()),
                    (None, None) => Err(RuntimeError::key_error(args[0].clone(), location)),
                }
            }
            "popitem" => {
                check_arity(name, &args, 0, 0, location)?;
                let last = dict.borrow_mut().pop_last();
                match last {
                    Some((key, value)) => Ok(Value::new_tuple(vec![key, value])),
                    None => Err(RuntimeError::raise(
                        ExceptionKind::KeyError,
                        "popitem(): dictionary is empty",
                        location,
                    )),
                }
            }
            "setdefault" => {
                check_arity(name, &args, 1, 2, location)?;
                hashable_key(&args[0])?;
                let existing = dict.borrow().get(&args[0]).cloned();
                match existing {
                    Some(value) => Ok(value),
                    None => {
                        let default = args.get(1).cloned().unwrap_or(Value::None);
                        dict.borrow_mut().insert(args[0].clone(), default.clone());
                        Ok(default)
                    }
                }
            }
            "clear" => {
                check_arity(name, &args, 0, 0, location)?;
                dict.borrow_mut().clear();
                Ok(Value::None)
            }
            _ => {
                check_arity(name, &args, 0, 0, location)?;
                Ok(Value::new_dict(dict.borrow().clone()))
            }
        }
    }

    fn call_str_method(
        &mut self,
        text: &str,
        name: &str,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if name == "format" {
            return self.str_format(text, &args, &kwargs, location).map(Value::from);
        }
        reject_kwargs(name, &kwargs, location)?;

        if matches!(
            name,
            "upper"
                | "lower"
                | "isdigit"
                | "isalpha"
                | "isspace"
                | "isupper"
                | "islower"
                | "title"
                | "capitalize"
        ) {
            check_arity(name, &args, 0, 0, location)?;
        }

        let result = match name {
            "upper" => Value::from(text.to_uppercase()),
            "lower" => Value::from(text.to_lowercase()),
            "strip" | "lstrip" | "rstrip" => {
                check_arity(name, &args, 0, 1, location)?;
                let chars: Option<Vec<char>> = optional_str(&args, 0, location)?.map(|s| s.chars().collect());
                let matches = |c: char| match &chars {
                    Some(set) => set.contains(&c),
                    None => c.is_whitespace(),
                };
                Value::from(match name {
                    "strip" => text.trim_matches(matches),
                    "lstrip" => text.trim_start_matches(matches),
                    _ => text.trim_end_matches(matches),
                })
            }
            "split" => {
                check_arity(name, &args, 0, 2, location)?;
                let limit = match args.get(1) {
                    Some(value) => int_argument(value, location)?,
                    None => -1,
                };
                let parts: Vec<Value> = match optional_str(&args, 0, location)? {
                    Some("") => {
                        return Err(RuntimeError::value_error("empty separator", location))
                    }
                    Some(separator) if limit < 0 => text.split(separator).map(Value::from).collect(),
                    Some(separator) => text
                        .splitn(limit as usize + 1, separator)
                        .map(Value::from)
                        .collect(),
                    None => split_whitespace(text, limit).into_iter().map(Value::from).collect(),
                };
                Value::new_list(parts)
            }
            "join" => {
                check_arity(name, &args, 1, 1, location)?;
                let mut pieces = Vec::new();
                for (index, item) in self.iterate(&args[0], location)?.enumerate() {
                    match item {
                        Value::Str(s) => pieces.push(s.to_string()),
                        other => {
                            return Err(RuntimeError::type_error(
                                format!(
                                    "sequence item {}: expected str instance, {} found",
                                    index,
                                    other.type_name()
                                ),
                                location,
                            ))
                        }
                    }
                }
                Value::from(pieces.join(text))
            }
            "replace" => {
                check_arity(name, &args, 2, 3, location)?;
                let old = required_str(&args, 0, location)?;
                let new = required_str(&args, 1, location)?;
                match args.get(2).map(|v| int_argument(v, location)).transpose()? {
                    Some(count) if count >= 0 => Value::from(text.replacen(old, new, count as usize)),
                    _ => Value::from(text.replace(old, new)),
                }
            }
            "startswith" | "endswith" => {
                check_arity(name, &args, 1, 1, location)?;
                let candidates: Vec<Value> = match &args[0] {
                    Value::Tuple(items) => items.to_vec(),
                    other => vec![other.clone()],
                };
                let mut found = false;
                for candidate in &candidates {
                    let Value::Str(affix) = candidate else {
                        return Err(RuntimeError::type_error(
                            format!(
                                "{} first arg must be str or a tuple of str, not {}",
                                name,
                                candidate.type_name()
                            ),
                            location,
                        ));
                    };
                    found |= if name == "startswith" {
                        text.starts_with(&**affix)
                    } else {
                        text.ends_with(&**affix)
                    };
                }
                Value::Bool(found)
            }
            "find" | "index" => {
                check_arity(name, &args, 1, 1, location)?;
                let needle = required_str(&args, 0, location)?;
                match text.find(needle) {
                    Some(byte_index) => Value::Int(text[..byte_index].chars().count() as i64),
                    None if name == "find" => Value::Int(-1),
                    None => return Err(RuntimeError::value_error("substring not found", location)),
                }
            }
            "count" => {
                check_arity(name, &args, 1, 1, location)?;
                let needle = required_str(&args, 0, location)?;
                let count = if needle.is_empty() {
                    text.chars().count() + 1
                } else {
                    text.matches(needle).count()
                };
                Value::Int(count as i64)
            }
            "isdigit" => Value::Bool(!text.is_empty() && text.chars().all(|c| c.is_ascii_digit())),
            "isalpha" => Value::Bool(!text.is_empty() && text.chars().all(char::is_alphabetic)),
            "isspace" => Value::Bool(!text.is_empty() && text.chars().all(char::is_whitespace)),
            "isupper" => Value::Bool(
                text.chars().any(char::is_alphabetic)
                    && !text.chars().any(char::is_lowercase),
            ),
            "islower" => Value::Bool(
                text.chars().any(char::is_alphabetic)
                    && !text.chars().any(char::is_uppercase),
            ),
            "title" => Value::from(title_case(text)),
            "capitalize" => {
                let mut chars = text.chars();
                Value::from(match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.as_str().to_lowercase().chars())
                        .collect(),
                    None => String::new(),
                })
            }
            _ => {
                return Err(RuntimeError::raise(
                    ExceptionKind::AttributeError,
                    format!("'str' object has no attribute '{}'", name),
                    location,
                ))
            }
        };

        Ok(result)
    }
}

/// An optional string argument (`None` counts as absent)
fn optional_str<'v>(
    args: &'v [Value],
    index: usize,
    location: SourceLocation,
) -> Result<Option<&'v str>, RuntimeError> {
    match args.get(index) {
        None | Some(Value::None) => Ok(None),
        Some(Value::Str(s)) => Ok(Some(&**s)),
        Some(other) => Err(RuntimeError::type_error(
            format!("must be str or None, not {}", other.type_name()),
            location,
        )),
    }
}

fn required_str<'v>(
    args: &'v [Value],
    index: usize,
    location: SourceLocation,
) -> Result<&'v str, RuntimeError> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(&**s),
        other => Err(RuntimeError::type_error(
            format!(
                "must be str, not {}",
                other.map_or("NoneType", Value::type_name)
            ),
            location,
        )),
    }
}

/// `str.split()` with no separator: runs of whitespace, leading and trailing ignored
fn split_whitespace(text: &str, limit: i64) -> Vec<String> {
    if limit < 0 {
        return text.split_whitespace().map(String::from).collect();
    }
    let mut parts = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if parts.len() as i64 == limit {
            parts.push(rest.to_string());
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        parts.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }
    parts
}

/// Uppercase the first letter of every word, lowercase the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if previous_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_is_letter = c.is_alphabetic();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tables() {
        assert!(has_method(&Value::new_list(Vec::new()), "append"));
        assert!(!has_method(&Value::new_list(Vec::new()), "upper"));
        assert!(has_method(&Value::from("x"), "join"));
        assert!(has_method(&Value::Stream(Stream::Stderr), "write"));
        assert!(!has_method(&Value::Int(1), "append"));
    }

    #[test]
    fn test_split_whitespace_limit() {
        assert_eq!(split_whitespace("  a b  c ", -1), vec!["a", "b", "c"]);
        assert_eq!(split_whitespace("a b c", 1), vec!["a", "b c"]);
        assert!(split_whitespace("   ", -1).is_empty());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hello wORLD"), "Hello World");
        assert_eq!(title_case("it's"), "It'S");
    }
}
