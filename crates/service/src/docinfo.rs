//! Best-effort parsing of operation doc blocks into [`OperationInfo`].
//!
//! The fixed grammar, one argument per bullet line plus an optional
//! return-type line:
//!
//! ```text
//! * `path` / Condition: required / Type: str / Default: "." / File to read
//! * `mode` / Condition: optional / Type: str
//! Returns: str
//! ```
//!
//! Parsing is tolerant: lines that do not match are skipped, and a block
//! with no matches yields an empty argument list. The result is purely
//! informational — dispatch never consults it.

use std::sync::LazyLock;

use regex::Regex;
use sy_protocol::{ArgCondition, ArgumentSpec, OperationInfo};

static ARG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*\*\s*`(?P<name>[^`]+)`\s*/\s*Condition:\s*(?P<cond>\w+)\s*/\s*Type:\s*(?P<type>[^/\n]+?)\s*(?:/\s*Default:\s*(?P<default>[^/\n]+?)\s*)?(?:/\s*(?P<desc>[^\n]+?))?\s*$",
    )
    .expect("argument grammar compiles")
});

static RETURN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Returns:\s*(?P<type>\S[^\n]*?)\s*$").expect("return grammar compiles")
});

pub fn parse(doc: &str) -> OperationInfo {
    let arguments = ARG_RE
        .captures_iter(doc)
        .map(|cap| {
            let condition = match &cap["cond"].to_ascii_lowercase()[..] {
                "required" => ArgCondition::Required,
                _ => ArgCondition::Optional,
            };
            ArgumentSpec {
                name: cap["name"].trim().to_string(),
                condition,
                arg_type: Some(cap["type"].trim().to_string()),
                default: cap.name("default").map(|m| m.as_str().trim().to_string()),
                description: cap.name("desc").map(|m| m.as_str().trim().to_string()),
            }
        })
        .collect();

    let return_type = RETURN_RE
        .captures(doc)
        .map(|cap| cap["type"].trim().to_string());

    OperationInfo { arguments, return_type }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_block_parses() {
        let doc = "\
Reads a file.

* `path` / Condition: required / Type: str / Default: \".\" / File to read
* `mode` / Condition: optional / Type: str
Returns: str
";
        let info = parse(doc);
        assert_eq!(info.arguments.len(), 2);

        let path = &info.arguments[0];
        assert_eq!(path.name, "path");
        assert_eq!(path.condition, ArgCondition::Required);
        assert_eq!(path.arg_type.as_deref(), Some("str"));
        assert_eq!(path.default.as_deref(), Some("\".\""));
        assert_eq!(path.description.as_deref(), Some("File to read"));

        let mode = &info.arguments[1];
        assert_eq!(mode.condition, ArgCondition::Optional);
        assert!(mode.default.is_none());
        assert!(mode.description.is_none());

        assert_eq!(info.return_type.as_deref(), Some("str"));
    }

    #[test]
    fn malformed_block_yields_empty_info() {
        let info = parse("just prose, no bullets here");
        assert!(info.arguments.is_empty());
        assert!(info.return_type.is_none());
    }

    #[test]
    fn unparseable_lines_are_skipped() {
        let doc = "\
* `good` / Condition: required / Type: int
* broken bullet without backticks
Returns: int
";
        let info = parse(doc);
        assert_eq!(info.arguments.len(), 1);
        assert_eq!(info.arguments[0].name, "good");
        assert_eq!(info.return_type.as_deref(), Some("int"));
    }

    #[test]
    fn unknown_condition_degrades_to_optional() {
        let doc = "* `x` / Condition: mandatory / Type: str";
        let info = parse(doc);
        assert_eq!(info.arguments[0].condition, ArgCondition::Optional);
    }

    #[test]
    fn description_may_contain_slashes() {
        let doc = "* `path` / Condition: required / Type: str / Default: out / Copy into /tmp/x";
        let info = parse(doc);
        assert_eq!(info.arguments[0].default.as_deref(), Some("out"));
        assert_eq!(
            info.arguments[0].description.as_deref(),
            Some("Copy into /tmp/x")
        );
    }
}
