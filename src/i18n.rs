use crate::utils::get_exe_path_else_current;
use gettext::Catalog;
use std::fs::File;

pub fn get_lang() -> String {
    for key in ["LC_ALL", "LC_MESSAGES", "LANG"] {
        match std::env::var(key) {
            Ok(l) => {
                if l.len() > 0 {
                    return l;
                }
            }
            Err(_) => {}
        }
    }
    return String::from("en-US");
}

/// Strip encoding and modifier (`zh_CN.UTF-8@latin` -> `zh_CN`)
fn normalize_lang(lang: &str) -> &str {
    let end = lang.find(|c| c == '.' || c == '@').unwrap_or(lang.len());
    &lang[..end]
}

pub struct I18n {
    catalog: Option<Catalog>,
}

fn open_mo_file(molang: &str) -> Option<File> {
    let pb = get_exe_path_else_current();
    let base = String::from("tokenauth");
    let fname = base + "." + molang.replace("-", "_").as_str() + ".mo";
    let p = pb.join(fname);
    if p.exists() {
        match File::open(p) {
            Ok(f) => {
                return Some(f);
            }
            Err(_) => {}
        }
    }
    #[cfg(not(target_os = "windows"))]
    {
        let mut p = pb.clone();
        p.pop();
        p.push(format!(
            "share/locale/{}/LC_MESSAGES/tokenauth.mo",
            molang.replace("-", "_").as_str()
        ));
        if p.exists() {
            match File::open(p) {
                Ok(f) => {
                    return Some(f);
                }
                Err(_) => {}
            }
        }
    }
    return None;
}

impl I18n {
    pub fn new() -> I18n {
        let s = get_lang();
        let molang = normalize_lang(s.as_str());
        let mut catalog: Option<Catalog> = None;
        if let Some(f) = open_mo_file(molang) {
            match Catalog::parse(f) {
                Ok(c) => {
                    catalog = Some(c);
                }
                Err(_) => {}
            }
        }
        return I18n { catalog };
    }
}

lazy_static! {
    #[doc(hidden)]
    static ref I18NT: I18n = I18n::new();
}

/// Get translation of text
/// * `s` - Origin text
pub fn gettext(s: &str) -> &str {
    match &I18NT.catalog {
        Some(c) => {
            return c.gettext(s);
        }
        None => {
            return s;
        }
    }
}

#[test]
fn test_normalize_lang() {
    assert_eq!(normalize_lang("zh_CN.UTF-8"), "zh_CN");
    assert_eq!(normalize_lang("de_DE@euro"), "de_DE");
    assert_eq!(normalize_lang("en-US"), "en-US");
}
