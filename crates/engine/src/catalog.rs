//! Static registry of export templates.
//!
//! Templates are compile-time data: the catalog never grows or shrinks at
//! runtime, and template ids are unique.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::ExportError;
use crate::options::{OptionDescriptor, SelectChoice};

// ---------------------------------------------------------------------------
// Format + category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Excel,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Json => "json",
        }
    }

    /// File extension for artifacts of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Excel),
            "json" => Ok(Self::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Selects which analytical view(s) an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Analysis,
    Financial,
    Visualization,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "general"),
            Self::Analysis => write!(f, "analysis"),
            Self::Financial => write!(f, "financial"),
            Self::Visualization => write!(f, "visualization"),
        }
    }
}

// ---------------------------------------------------------------------------
// Template definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub format: ExportFormat,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Display filename; `{date}` is replaced with the export date.
    pub filename_pattern: &'static str,
    #[serde(serialize_with = "serialize_options")]
    pub default_config: &'static [(&'static str, OptionDescriptor)],
}

fn serialize_options<S: Serializer>(
    options: &&'static [(&'static str, OptionDescriptor)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(options.len()))?;
    for (key, desc) in options.iter() {
        map.serialize_entry(key, desc)?;
    }
    map.end()
}

// ---------------------------------------------------------------------------
// Shared option descriptors
// ---------------------------------------------------------------------------

const fn flag(default: bool, label: &'static str) -> OptionDescriptor {
    OptionDescriptor::Boolean { default, label: Some(label), help: None }
}

const DELIMITERS: &[SelectChoice] = &[
    SelectChoice { value: ",", label: "Comma (,)" },
    SelectChoice { value: ";", label: "Semicolon (;)" },
    SelectChoice { value: "\t", label: "Tab" },
    SelectChoice { value: "|", label: "Pipe (|)" },
];

const DELIMITER: OptionDescriptor = OptionDescriptor::Select {
    default: ",",
    label: Some("Delimiter"),
    help: None,
    options: DELIMITERS,
};

const ENCODING: OptionDescriptor = OptionDescriptor::Text {
    default: "utf-8",
    label: Some("Encoding"),
    help: Some("Charset advertised in the content type"),
};

const SHEET_NAME_DATA: OptionDescriptor = OptionDescriptor::Text {
    default: "Data",
    label: Some("Sheet Name"),
    help: None,
};

const INDENT_SIZE: OptionDescriptor = OptionDescriptor::Number {
    default: 2.0,
    label: Some("Indent Size"),
    help: Some("Spaces per indentation level when pretty printing"),
};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub static TEMPLATES: &[TemplateDefinition] = &[
    TemplateDefinition {
        id: "csv-basic",
        name: "Basic CSV",
        description: "Simple CSV export with all columns",
        format: ExportFormat::Csv,
        category: Category::General,
        kind: "basic",
        filename_pattern: "query-results-{date}.csv",
        default_config: &[("includeHeader", flag(true, "Include Header"))],
    },
    TemplateDefinition {
        id: "csv-excel-compatible",
        name: "Excel-Compatible CSV",
        description: "CSV formatted for Excel import",
        format: ExportFormat::Csv,
        category: Category::General,
        kind: "basic",
        filename_pattern: "excel-import-{date}.csv",
        default_config: &[
            ("includeHeader", flag(true, "Include Header")),
            ("bom", flag(true, "Byte Order Mark")),
            ("delimiter", DELIMITER),
            ("encoding", ENCODING),
        ],
    },
    TemplateDefinition {
        id: "excel-basic",
        name: "Basic Excel",
        description: "Simple Excel export with data in a single sheet",
        format: ExportFormat::Excel,
        category: Category::General,
        kind: "basic",
        filename_pattern: "query-results-{date}.xlsx",
        default_config: &[
            ("sheetName", SHEET_NAME_DATA),
            ("includeHeader", flag(true, "Include Header")),
            ("autoFilter", flag(true, "Auto Filter")),
            ("freezeHeader", flag(true, "Freeze Header Row")),
        ],
    },
    TemplateDefinition {
        id: "excel-formatted-report",
        name: "Formatted Excel Report",
        description: "Excel report with title, timestamp, number formatting and totals",
        format: ExportFormat::Excel,
        category: Category::General,
        kind: "report",
        filename_pattern: "report-{date}.xlsx",
        default_config: &[
            (
                "sheetName",
                OptionDescriptor::Text { default: "Report", label: Some("Sheet Name"), help: None },
            ),
            ("addTitle", flag(true, "Add Title")),
            (
                "titleText",
                OptionDescriptor::Text {
                    default: "Data Export",
                    label: Some("Title"),
                    help: Some("Shown in the first row when a title is added"),
                },
            ),
            ("addDatetime", flag(true, "Add Generation Time")),
            ("formatNumbers", flag(true, "Format Numbers")),
            ("boldHeader", flag(true, "Bold Header")),
            ("freezeHeader", flag(true, "Freeze Header Row")),
            ("autoFilter", flag(false, "Auto Filter")),
            ("addTotalRow", flag(true, "Add Total Row")),
        ],
    },
    TemplateDefinition {
        id: "analysis-statistical-summary",
        name: "Statistical Summary",
        description: "Count, min, max, sum, average and standard deviation per numeric column",
        format: ExportFormat::Excel,
        category: Category::Analysis,
        kind: "summary",
        filename_pattern: "statistical-summary-{date}.xlsx",
        default_config: &[],
    },
    TemplateDefinition {
        id: "analysis-category-grouping",
        name: "Category Analysis",
        description: "Row counts, sums and averages grouped by a category column",
        format: ExportFormat::Excel,
        category: Category::Analysis,
        kind: "grouping",
        filename_pattern: "category-analysis-{date}.xlsx",
        default_config: &[],
    },
    TemplateDefinition {
        id: "finance-quarterly-report",
        name: "Quarterly Financial Report",
        description: "Amounts pivoted by period and type with row and column totals",
        format: ExportFormat::Excel,
        category: Category::Financial,
        kind: "report",
        filename_pattern: "quarterly-report-{date}.xlsx",
        default_config: &[],
    },
    TemplateDefinition {
        id: "visualization-chart-data",
        name: "Chart Data Workbook",
        description: "Numeric-formatted sheet ready for charting",
        format: ExportFormat::Excel,
        category: Category::Visualization,
        kind: "chart",
        filename_pattern: "chart-data-{date}.xlsx",
        default_config: &[
            (
                "sheetName",
                OptionDescriptor::Text { default: "Chart Data", label: Some("Sheet Name"), help: None },
            ),
            ("formatNumbers", flag(true, "Format Numbers")),
            ("boldHeader", flag(true, "Bold Header")),
            ("freezeHeader", flag(true, "Freeze Header Row")),
        ],
    },
    TemplateDefinition {
        id: "json-basic",
        name: "Basic JSON",
        description: "Simple JSON export of all data",
        format: ExportFormat::Json,
        category: Category::General,
        kind: "basic",
        filename_pattern: "query-results-{date}.json",
        default_config: &[("pretty", flag(true, "Pretty Print")), ("indentSize", INDENT_SIZE)],
    },
    TemplateDefinition {
        id: "json-compact",
        name: "Compact JSON",
        description: "Compact JSON without whitespace",
        format: ExportFormat::Json,
        category: Category::General,
        kind: "basic",
        filename_pattern: "query-results-compact-{date}.json",
        default_config: &[("pretty", flag(false, "Pretty Print"))],
    },
];

/// The full catalog, in display order.
pub fn list_templates() -> &'static [TemplateDefinition] {
    TEMPLATES
}

pub fn find_template_by_id(id: &str) -> Result<&'static TemplateDefinition, ExportError> {
    TEMPLATES
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| ExportError::TemplateNotFound(id.to_string()))
}

/// Group templates by format, keeping input order within each group.
pub fn group_by_format<'a>(
    templates: &'a [TemplateDefinition],
) -> BTreeMap<ExportFormat, Vec<&'a TemplateDefinition>> {
    let mut groups: BTreeMap<ExportFormat, Vec<&TemplateDefinition>> = BTreeMap::new();
    for template in templates {
        groups.entry(template.format).or_default().push(template);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<&str> = TEMPLATES.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), TEMPLATES.len());
    }

    #[test]
    fn find_missing_template_fails() {
        let err = find_template_by_id("does-not-exist").unwrap_err();
        assert_eq!(err, ExportError::TemplateNotFound("does-not-exist".into()));
    }

    #[test]
    fn find_known_template() {
        let t = find_template_by_id("finance-quarterly-report").unwrap();
        assert_eq!(t.format, ExportFormat::Excel);
        assert_eq!(t.category, Category::Financial);
    }

    #[test]
    fn grouping_preserves_catalog_order() {
        let groups = group_by_format(list_templates());
        let csv: Vec<&str> = groups[&ExportFormat::Csv].iter().map(|t| t.id).collect();
        assert_eq!(csv, vec!["csv-basic", "csv-excel-compatible"]);
        let json: Vec<&str> = groups[&ExportFormat::Json].iter().map(|t| t.id).collect();
        assert_eq!(json, vec!["json-basic", "json-compact"]);
        assert_eq!(groups[&ExportFormat::Excel][0].id, "excel-basic");
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), TEMPLATES.len());
    }

    #[test]
    fn format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Excel);
        assert_eq!(
            "pdf".parse::<ExportFormat>().unwrap_err(),
            ExportError::UnsupportedFormat("pdf".into())
        );
    }

    #[test]
    fn catalog_serializes_option_form_shape() {
        let t = find_template_by_id("csv-excel-compatible").unwrap();
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(json["type"], "basic");
        assert_eq!(json["filenamePattern"], "excel-import-{date}.csv");
        assert_eq!(json["defaultConfig"]["bom"]["type"], "boolean");
        assert_eq!(json["defaultConfig"]["bom"]["default"], true);
        assert_eq!(json["defaultConfig"]["delimiter"]["type"], "select");
        assert_eq!(json["defaultConfig"]["delimiter"]["options"][1]["value"], ";");
    }
}
