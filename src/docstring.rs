//! # Docstring Parser
//!
//! Pure text-to-record transformation for the documentation strings attached to
//! methods and object types. The synthesizer only consumes the resulting
//! [`Docstring`], so the grammar below can change without touching schema assembly.
//!
//! ## Grammar
//!
//! ```text
//! Short summary line.
//!
//! Long description, any number of lines
//! and paragraphs.
//!
//! :param name: description of an argument
//! :return: description of the result
//!
//! Attributes
//! ----------
//! field : type, optional
//!     indented description,
//!     possibly on several lines
//! ```
//!
//! Field lists (`:param x:`) and underlined sections (`Attributes`, `Parameters`,
//! `Returns`) may appear in any order after the description.

/// Parsed documentation string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docstring {
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub blank_after_short_description: bool,
    pub params: Vec<DocParam>,
    pub attributes: Vec<DocAttribute>,
    pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocParam {
    pub arg_name: String,
    pub description: String,
}

/// One row of an `Attributes` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocAttribute {
    pub name: String,
    pub type_name: Option<String>,
    pub optional: bool,
    pub description: String,
}

impl Docstring {
    /// Summary followed by the long description, separated the way the source separated them
    #[must_use]
    pub fn description(&self) -> Option<String> {
        let short = self.short_description.as_ref()?;
        match &self.long_description {
            Some(long) => {
                let separator = if self.blank_after_short_description {
                    "\n\n"
                } else {
                    "\n"
                };
                Some(format!("{short}{separator}{long}"))
            }
            None => Some(short.clone()),
        }
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&DocParam> {
        self.params.iter().find(|p| p.arg_name == name)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&DocAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Parse a documentation string. Never fails: unknown constructs are ignored.
#[must_use]
pub fn parse(text: &str) -> Docstring {
    let lines = clean_lines(text);
    let mut doc = Docstring::default();

    let body_end = (0..lines.len())
        .find(|&i| is_field_line(&lines[i]) || is_section_header(&lines, i))
        .unwrap_or(lines.len());
    parse_body(&lines[..body_end], &mut doc);

    let mut i = body_end;
    while i < lines.len() {
        if is_section_header(&lines, i) {
            let name = lines[i].trim().to_lowercase();
            let start = i + 2;
            let mut end = start;
            while end < lines.len() && !is_section_header(&lines, end) && !is_field_line(&lines[end]) {
                end += 1;
            }
            parse_section(&name, &lines[start..end], &mut doc);
            i = end;
        } else if is_field_line(&lines[i]) {
            let mut end = i + 1;
            while end < lines.len()
                && !lines[end].is_empty()
                && !is_field_line(&lines[end])
                && !is_section_header(&lines, end)
            {
                end += 1;
            }
            parse_field(&lines[i..end], &mut doc);
            i = end;
        } else {
            i += 1;
        }
    }

    doc
}

/// Dedent the way docstrings are conventionally written: the first line is taken
/// as-is, the common indentation of the others is removed.
fn clean_lines(text: &str) -> Vec<String> {
    let raw: Vec<&str> = text.lines().collect();
    let indent = raw
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut lines: Vec<String> = raw
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            if idx == 0 || line.trim().is_empty() {
                line.trim().to_string()
            } else if line.is_char_boundary(indent) {
                line[indent..].trim_end().to_string()
            } else {
                line.trim().to_string()
            }
        })
        .collect();

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn is_field_line(line: &str) -> bool {
    line.starts_with(':') && line[1..].contains(':')
}

fn is_section_header(lines: &[String], i: usize) -> bool {
    let Some(title) = lines.get(i) else {
        return false;
    };
    let Some(underline) = lines.get(i + 1) else {
        return false;
    };
    !title.is_empty()
        && !title.starts_with(char::is_whitespace)
        && underline.len() >= 3
        && underline.chars().all(|c| c == '-')
}

fn parse_body(lines: &[String], doc: &mut Docstring) {
    let Some(first) = lines.first().filter(|l| !l.is_empty()) else {
        return;
    };
    doc.short_description = Some(first.clone());

    if lines.len() > 1 {
        doc.blank_after_short_description = lines[1].is_empty();
        let long = lines[1..].join("\n");
        let long = long.trim_matches('\n');
        if !long.is_empty() {
            doc.long_description = Some(long.to_string());
        }
    }
}

fn parse_field(lines: &[String], doc: &mut Docstring) {
    let Some(first) = lines.first() else {
        return;
    };
    let Some((header, rest)) = first[1..].split_once(':') else {
        return;
    };

    let mut description = rest.trim().to_string();
    for continuation in &lines[1..] {
        if !description.is_empty() {
            description.push('\n');
        }
        description.push_str(continuation.trim());
    }

    let words: Vec<&str> = header.split_whitespace().collect();
    match words.first().copied() {
        Some("param" | "parameter" | "arg" | "argument" | "key" | "keyword") => {
            if let Some(name) = words.last().filter(|_| words.len() > 1) {
                doc.params.push(DocParam {
                    arg_name: (*name).to_string(),
                    description,
                });
            }
        }
        Some("return" | "returns") if !description.is_empty() => {
            doc.returns = Some(description);
        }
        _ => {}
    }
}

fn parse_section(name: &str, lines: &[String], doc: &mut Docstring) {
    let entries = section_entries(lines);
    match name {
        "attributes" => {
            for (header, description) in entries {
                let (name, type_name, optional) = split_entry_header(&header);
                doc.attributes.push(DocAttribute {
                    name,
                    type_name,
                    optional,
                    description,
                });
            }
        }
        "parameters" | "params" | "args" | "arguments" => {
            for (header, description) in entries {
                let (name, _, _) = split_entry_header(&header);
                doc.params.push(DocParam {
                    arg_name: name,
                    description,
                });
            }
        }
        "returns" => {
            let text: Vec<String> = entries
                .into_iter()
                .map(|(header, description)| {
                    if description.is_empty() {
                        header
                    } else {
                        description
                    }
                })
                .collect();
            if !text.is_empty() {
                doc.returns = Some(text.join("\n"));
            }
        }
        _ => {}
    }
}

/// Group a section into `(header line, indented description)` pairs
fn section_entries(lines: &[String]) -> Vec<(String, String)> {
    let mut entries: Vec<(String, Vec<String>)> = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            if let Some((_, description)) = entries.last_mut() {
                description.push(line.trim().to_string());
            }
        } else {
            entries.push((line.trim().to_string(), Vec::new()));
        }
    }
    entries
        .into_iter()
        .map(|(header, description)| (header, description.join("\n")))
        .collect()
}

fn split_entry_header(header: &str) -> (String, Option<String>, bool) {
    let Some((name, type_part)) = header.split_once(':') else {
        return (header.trim().to_string(), None, false);
    };
    let mut type_part = type_part.trim();
    let mut optional = false;
    if let Some(stripped) = type_part.strip_suffix("optional") {
        optional = true;
        type_part = stripped.trim_end().trim_end_matches(',').trim_end();
    }
    let type_name = (!type_part.is_empty()).then(|| type_part.to_string());
    (name.trim().to_string(), type_name, optional)
}
