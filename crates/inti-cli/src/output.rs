use colored::Colorize;
use inti_client::models::{EventSummary, ProductSummary, ProfileKind, ProfileSummary, format_count};
use inti_client::{Unavailable, extract};
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(value)),
        OutputFormat::Yaml => println!("{}", format_yaml(value, 0)),
        OutputFormat::Table => print_record(value),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_notice(msg: &str) {
    println!("{} {}", "•".yellow(), msg);
}

/// Serializes typed rows for the JSON/YAML formats.
fn print_serialized<T: Serialize>(items: &T, format: OutputFormat) {
    match serde_json::to_value(items) {
        Ok(value) => print_value(&value, format),
        Err(e) => print_error(&format!("Failed to serialize output: {e}")),
    }
}

fn print_table(header: &[&str], rows: Vec<Vec<String>>, empty: &str) {
    if rows.is_empty() {
        println!("{empty}");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(header.iter().copied());
    for row in rows {
        builder.push_record(row);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

pub fn print_profile(profile: &ProfileSummary, format: OutputFormat) {
    if !matches!(format, OutputFormat::Table) {
        print_serialized(profile, format);
        return;
    }
    let kind = match profile.kind {
        ProfileKind::User => "user",
        ProfileKind::Organization => "organization",
    };
    println!("{} {}", profile.name.bold(), profile.handle().cyan());
    println!("{}: {}", "Type".cyan(), kind);
    if let Some(bio) = &profile.bio {
        println!("{}: {}", "Bio".cyan(), bio);
    }
    println!(
        "{}: {}  {}: {}  {}: {}",
        "Posts".cyan(),
        format_count(profile.total_posts),
        "Followers".cyan(),
        format_count(profile.followers),
        "Following".cyan(),
        format_count(profile.following),
    );
    if profile.is_following {
        println!("{}", "You follow this profile".green());
    }
    if let Some(url) = &profile.picture_url {
        println!("{}: {}", "Picture".cyan(), url);
    }
}

pub fn print_products(products: &[ProductSummary], format: OutputFormat) {
    if !matches!(format, OutputFormat::Table) {
        print_serialized(&products, format);
        return;
    }
    let rows = products
        .iter()
        .map(|p| {
            vec![
                or_dash(p.id.as_deref()),
                p.title.clone(),
                or_dash(p.price.as_deref()),
                or_dash(p.description.as_deref()),
            ]
        })
        .collect();
    print_table(&["ID", "Title", "Price", "Description"], rows, "No products found.");
}

/// `going` is the attendance flag per event, when known.
pub fn print_events(events: &[EventSummary], going: Option<&[bool]>, format: OutputFormat) {
    if !matches!(format, OutputFormat::Table) {
        print_serialized(&events, format);
        return;
    }
    let mut header = vec!["ID", "Title", "Date", "Organizer", "Price"];
    if going.is_some() {
        header.push("Going");
    }
    let rows = events
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut row = vec![
                or_dash(e.id.as_deref()),
                e.title.clone(),
                e.date.clone(),
                e.organizer
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |o| o.name.clone()),
                e.price.clone().unwrap_or_else(|| "Gratuito".to_string()),
            ];
            if let Some(flags) = going {
                let flag = flags.get(i).copied().unwrap_or(false);
                row.push(if flag { "yes" } else { "no" }.to_string());
            }
            row
        })
        .collect();
    print_table(&header, rows, "No events found.");
}

pub fn print_posts(posts: &[Value], format: OutputFormat) {
    if !matches!(format, OutputFormat::Table) {
        print_serialized(&posts, format);
        return;
    }
    let rows = posts
        .iter()
        .map(|post| {
            let text = |field: &str| post.get(field).and_then(Value::as_str);
            vec![
                post.get("id")
                    .and_then(extract::ProfileId::from_value)
                    .map_or_else(|| "-".to_string(), |id| id.to_string()),
                extract::username(post).map_or_else(|| "-".to_string(), |u| format!("@{u}")),
                post.get("likesCount")
                    .and_then(Value::as_u64)
                    .map_or_else(|| "0".to_string(), format_count),
                or_dash(text("createdAt")),
                truncate(text("description").unwrap_or(""), 60),
            ]
        })
        .collect();
    print_table(&["ID", "Author", "Likes", "Created", "Description"], rows, "No posts found.");
}

pub fn print_profiles(profiles: &[ProfileSummary], format: OutputFormat) {
    if !matches!(format, OutputFormat::Table) {
        print_serialized(&profiles, format);
        return;
    }
    let rows = profiles
        .iter()
        .map(|p| {
            vec![
                p.handle(),
                p.name.clone(),
                p.id.as_ref().map_or_else(|| "-".to_string(), |id| id.to_string()),
            ]
        })
        .collect();
    print_table(&["Username", "Name", "ID"], rows, "No profiles found.");
}

pub fn describe_unavailable(reason: &Unavailable) -> String {
    match reason {
        Unavailable::IdentityUnresolved => "Could not identify this profile".to_string(),
        Unavailable::NotFound => "Nothing published yet".to_string(),
        Unavailable::NotOrganization => "Only organizations publish events".to_string(),
        Unavailable::Failed(msg) => format!("Could not load: {msg}"),
    }
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

fn to_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Single records print as key/value pairs; collections fall back to JSON.
fn print_record(value: &Value) {
    match value {
        Value::Object(obj) => {
            let rows = obj
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    vec![k.clone(), truncate(&v, 80)]
                })
                .collect();
            print_table(&["Field", "Value"], rows, "{}");
        }
        Value::Null => println!("(empty response)"),
        other => println!("{}", to_json(other)),
    }
}

fn format_yaml(value: &Value, indent: usize) -> String {
    let prefix = " ".repeat(indent);
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.contains('\n') || s.contains(':') || s.contains('#') {
                format!(
                    "|\n{}{}",
                    " ".repeat(indent + 2),
                    s.replace('\n', &format!("\n{}", " ".repeat(indent + 2)))
                )
            } else {
                format!("\"{s}\"")
            }
        }
        Value::Array(arr) => {
            if arr.is_empty() {
                return "[]".to_string();
            }
            let items: Vec<String> = arr
                .iter()
                .map(|v| format!("{prefix}- {}", format_yaml(v, indent + 2).trim_start()))
                .collect();
            if indent == 0 {
                items.join("\n")
            } else {
                format!("\n{}", items.join("\n"))
            }
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                return "{}".to_string();
            }
            let items: Vec<String> = obj
                .iter()
                .map(|(k, v)| {
                    let val = format_yaml(v, indent + 2);
                    if val.starts_with('\n') {
                        format!("{prefix}{k}:{val}")
                    } else {
                        format!("{prefix}{k}: {val}")
                    }
                })
                .collect();
            if indent == 0 {
                items.join("\n")
            } else {
                format!("\n{}", items.join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("  curto ", 10), "curto");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_yaml_scalars_and_objects() {
        assert_eq!(format_yaml(&json!("ana"), 0), "\"ana\"");
        assert_eq!(format_yaml(&json!([]), 0), "[]");
        let yaml = format_yaml(&json!({ "name": "Ana", "tags": ["a"] }), 0);
        assert!(yaml.contains("name: \"Ana\""));
        assert!(yaml.contains("tags:\n  - \"a\""));
    }

    #[test]
    fn test_describe_unavailable() {
        assert_eq!(
            describe_unavailable(&Unavailable::Failed("HTTP 500".into())),
            "Could not load: HTTP 500"
        );
    }
}
