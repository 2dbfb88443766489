use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub enum Setting {
    String(String),
    Int(i64),
    Bool(bool),
}

impl Setting {
    fn as_string(&self) -> Option<&String> {
        if let Setting::String(value) = self {
            Some(value)
        } else {
            None
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Setting::Int(value) => Some(*value),
            Setting::String(value) => value.trim().parse().ok(),
            Setting::Bool(_) => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Setting::Bool(value) => Some(*value),
            Setting::String(value) => Some(is_enabled_flag(value)),
            Setting::Int(value) => Some(*value != 0),
        }
    }
}

/// A flag given as text is on unless it is blank, `0` or `false`.
pub fn is_enabled_flag(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

pub trait Settings {
    fn get(&self, key: &str) -> Option<Setting>;
    fn set(&mut self, key: &str, value: Setting);

    /// Blank strings are treated as absent.
    fn get_string(&self, key: &str) -> Option<String> {
        let setting = self.get(key)?;
        setting
            .as_string()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
    fn get_int(&self, key: &str) -> Option<i64> {
        let setting = self.get(key)?;
        setting.as_int()
    }
    fn get_bool(&self, key: &str) -> Option<bool> {
        let setting = self.get(key)?;
        setting.as_bool()
    }
    fn set_string(&mut self, key: &str, value: &str) {
        self.set(key, Setting::String(value.to_string()));
    }
    fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, Setting::Int(value));
    }
    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, Setting::Bool(value));
    }
}

impl Settings for HashMap<String, Setting> {
    fn get(&self, key: &str) -> Option<Setting> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: Setting) {
        self.insert(key.to_string(), value);
    }
}
