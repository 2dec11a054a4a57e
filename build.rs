use std::fs;

const CONFIG_PATH: &str = "src/default_config.toml";

fn main() {
    println!("cargo:rerun-if-changed={}", CONFIG_PATH);

    let content = fs::read_to_string(CONFIG_PATH).expect("Failed to read default_config.toml");
    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {}", e),
    };

    // Config::compiled_default falls back to built-in values on a bad file,
    // so every key it reads must be present and well typed here.
    require_string(&table, "code", "default_language");
    require_string(&table, "note", "heading_prefix");
    require_string(&table, "note", "timestamp_format");

    match lookup(&table, "inline", "soft_break").and_then(toml::Value::as_str) {
        Some("newline" | "space") => {}
        other => panic!("default_config.toml: bad inline.soft_break {other:?}"),
    }

    let Some(aliases) = lookup(&table, "code", "aliases").and_then(toml::Value::as_table) else {
        panic!("default_config.toml: missing [code.aliases] table");
    };
    for (tag, language) in aliases {
        if tag.to_lowercase() != *tag {
            panic!("default_config.toml: alias {tag:?} is never matched, tags are lowercased");
        }
        if !language.is_str() {
            panic!("default_config.toml: alias {tag:?} must map to a string");
        }
    }
}

fn lookup<'a>(table: &'a toml::Table, section: &str, key: &str) -> Option<&'a toml::Value> {
    table.get(section)?.as_table()?.get(key)
}

fn require_string(table: &toml::Table, section: &str, key: &str) {
    if lookup(table, section, key).and_then(toml::Value::as_str).is_none() {
        panic!("default_config.toml: {section}.{key} must be a string");
    }
}
