use crate::gettext;
use crate::settings_list::get_settings_list;
use json::JsonValue;
use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::fs::{remove_file, File};
use std::io::{Read, Write};
use std::path::Path;

/// Json value type
#[derive(Clone, Copy, PartialEq)]
pub enum JsonValueType {
    Str,
    Number,
    Boolean,
    Object,
    Array,
}

impl JsonValueType {
    pub fn to_str(&self) -> &'static str {
        match self {
            JsonValueType::Str => "String",
            JsonValueType::Number => "Number",
            JsonValueType::Boolean => "Boolean",
            JsonValueType::Object => "Object",
            JsonValueType::Array => "Array",
        }
    }
}

impl Debug for JsonValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl Display for JsonValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// An callback to check if a json value is valid
pub type SettingDesCallback = fn(obj: &JsonValue) -> bool;

/// An object to describe a setting
#[derive(Clone)]
pub struct SettingDes {
    _name: String,
    _description: String,
    _type: JsonValueType,
    _fun: Option<SettingDesCallback>,
}

impl SettingDes {
    /// Create a new setting description.
    ///
    /// Arrays and objects must come with a callback.
    pub fn new(
        name: &str,
        description: &str,
        typ: JsonValueType,
        callback: Option<SettingDesCallback>,
    ) -> Option<SettingDes> {
        if (typ == JsonValueType::Array || typ == JsonValueType::Object) && callback.is_none() {
            return None;
        }
        Some(SettingDes {
            _name: String::from(name),
            _description: String::from(description),
            _type: typ,
            _fun: callback,
        })
    }

    pub fn name(&self) -> &str {
        self._name.as_str()
    }

    pub fn description(&self) -> &str {
        self._description.as_str()
    }

    pub fn type_name(&self) -> &'static str {
        self._type.to_str()
    }

    /// Check if a value is valid
    pub fn is_vaild_value(&self, value: &JsonValue) -> bool {
        let type_ok = match self._type {
            JsonValueType::Array => value.is_array(),
            JsonValueType::Boolean => value.is_boolean(),
            JsonValueType::Number => value.is_number(),
            JsonValueType::Object => value.is_object(),
            JsonValueType::Str => value.is_string(),
        };
        if !type_ok {
            return false;
        }
        match self._fun {
            Some(fun) => fun(value),
            None => true,
        }
    }
}

impl Debug for SettingDes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "SettingDes {{ name: {}, description: {}, type: {} }}",
            self._name, self._description, self._type
        )
    }
}

/// Store a list of settings
#[derive(Clone, Debug)]
pub struct SettingDesStore {
    list: Vec<SettingDes>,
}

impl SettingDesStore {
    pub fn new(list: Vec<SettingDes>) -> SettingDesStore {
        SettingDesStore { list }
    }

    pub fn check_valid(&self, key: &str, value: &JsonValue) -> Option<bool> {
        for i in self.list.iter() {
            if i.name() == key {
                return Some(i.is_vaild_value(value));
            }
        }
        None
    }

    pub fn print_help(&self) {
        let mut s = String::from("");
        for i in self.list.iter() {
            let mut t = format!("{}: {}", i.name(), i.type_name());
            if t.len() >= 30 {
                t += "\t";
            } else {
                t += " ".repeat(30 - t.len()).as_str();
            }
            t += i.description();
            if s.len() > 0 {
                s += "\n";
            }
            s += t.as_str();
        }
        println!("{}", s);
    }
}

#[derive(Clone, Debug)]
pub struct SettingJar {
    pub settings: HashMap<String, JsonValue>,
}

impl SettingJar {
    pub fn new() -> SettingJar {
        SettingJar {
            settings: HashMap::new(),
        }
    }

    pub fn add(&mut self, key: &str, opt: JsonValue) {
        self.settings.insert(String::from(key), opt);
    }

    pub fn clear(&mut self) {
        self.settings.clear();
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.settings.get(key)
    }

    pub fn to_json(&self) -> JsonValue {
        let mut v = JsonValue::new_object();
        for (key, val) in self.settings.iter() {
            v[key.as_str()] = val.clone();
        }
        v
    }
}

#[derive(Clone, Debug)]
pub struct SettingStore {
    pub basic: SettingDesStore,
    pub data: SettingJar,
}

impl SettingStore {
    pub fn new(list: Vec<SettingDes>) -> Self {
        Self {
            basic: SettingDesStore::new(list),
            data: SettingJar::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.data.get(key).and_then(|o| o.as_bool())
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(|o| o.as_str()).map(|s| s.to_owned())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.data.get(key).and_then(|o| o.as_u64())
    }

    /// A list of strings. Non string members are skipped.
    pub fn get_str_list(&self, key: &str) -> Option<Vec<String>> {
        self.data.get(key).map(|o| {
            o.members()
                .filter_map(|m| m.as_str())
                .map(|s| s.to_owned())
                .collect()
        })
    }

    /// Load settings from a JSON string.
    ///
    /// With `fix_invalid`, broken input and invalid values are dropped instead of failing.
    pub fn read_str(&mut self, s: &str, fix_invalid: bool) -> bool {
        self.data.clear();
        if s.trim().is_empty() {
            if !fix_invalid {
                log::error!("{}", gettext("Settings file is empty."));
                return false;
            }
            return true;
        }
        let obj = match json::parse(s) {
            Ok(obj) => obj,
            Err(_) => {
                if !fix_invalid {
                    log::error!("{}", gettext("Can not parse settings file."));
                    return false;
                }
                return true;
            }
        };
        if !obj.is_object() {
            if !fix_invalid {
                log::error!("{}", gettext("Unknown settings file."));
                return false;
            }
            return true;
        }
        for (key, o) in obj.entries() {
            match self.basic.check_valid(key, o) {
                Some(false) => {
                    if !fix_invalid {
                        let s = gettext("\"<key>\" is invalid, you can use \"tokenauth config fix\" to remove all invalid value.").replace("<key>", key);
                        log::error!("{}", s.as_str());
                        return false;
                    }
                }
                _ => {
                    self.data.add(key, o.clone());
                }
            }
        }
        true
    }

    pub fn read(&mut self, file_name: &str, fix_invalid: bool) -> bool {
        self.data.clear();
        let path = Path::new(file_name);
        if !path.exists() {
            return false;
        }
        let mut f = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("{}", e);
                return false;
            }
        };
        let mut s = String::from("");
        if f.read_to_string(&mut s).is_err() {
            log::error!("{}", gettext("Can not read from settings file."));
            return false;
        }
        self.read_str(&s, fix_invalid)
    }

    pub fn save(&self, file_name: &str) -> bool {
        let s = json::stringify(self.data.to_json());
        let path = Path::new(file_name);
        if path.exists() {
            match remove_file(path) {
                Ok(_) => {}
                Err(e) => {
                    log::error!("{} {}", gettext("Failed to remove file:"), e);
                    return false;
                }
            }
        }
        let mut f = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                log::error!("{} {}", gettext("Failed to create file:"), e);
                return false;
            }
        };
        if let Err(e) = f.write_all(s.as_bytes()) {
            log::error!("{} {}", gettext("Failed to write file:"), e);
            return false;
        }
        if let Err(e) = f.flush() {
            log::error!("{} {}", gettext("Failed to flush file:"), e);
            return false;
        }
        true
    }
}

impl Default for SettingStore {
    fn default() -> Self {
        Self::new(get_settings_list())
    }
}

#[test]
fn test_setting_store() {
    let mut store = SettingStore::default();
    assert!(store.read_str(
        r#"{"server": "0.0.0.0:80", "token_sweep_interval": 60, "cors_entries": ["http://localhost:3000"], "unknown": 1}"#,
        false
    ));
    assert_eq!(store.get_str("server").as_deref(), Some("0.0.0.0:80"));
    assert_eq!(store.get_u64("token_sweep_interval"), Some(60));
    assert_eq!(
        store.get_str_list("cors_entries"),
        Some(vec![String::from("http://localhost:3000")])
    );
    assert!(store.get("unknown").is_some());
    assert!(!store.read_str(r#"{"server": "not an address"}"#, false));
    assert!(store.read_str(r#"{"server": "not an address", "cookie_domain": "a.com"}"#, true));
    assert!(store.get("server").is_none());
    assert_eq!(store.get_str("cookie_domain").as_deref(), Some("a.com"));
    assert!(!store.read_str("[]", false));
    assert!(!store.read_str("", false));
    assert!(store.read_str("{broken", true));
}
