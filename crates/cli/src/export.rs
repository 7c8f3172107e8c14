//! `tabex export`: run a dataset through a report template and write the
//! artifact.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use tabex_config::Settings;
use tabex_engine::{find_template_by_id, TemplateSelection};
use tabex_io::{load_dataset, Selection};

use crate::util::{parse_set, write_atomic};
use crate::CliError;

/// Arguments of `tabex export`, as parsed by clap.
pub struct ExportArgs {
    pub file: PathBuf,
    pub template: Option<String>,
    pub query: Option<String>,
    pub table: Option<String>,
    pub set: Vec<String>,
    pub filename: Option<String>,
    pub output: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub quiet: bool,
}

/// Where the artifact goes.
#[derive(Debug, PartialEq)]
enum Destination {
    Stdout,
    File(PathBuf),
}

pub fn cmd_export(args: ExportArgs, settings: &Settings) -> Result<(), CliError> {
    let template_id = args
        .template
        .clone()
        .or_else(|| settings.default_template.clone())
        .ok_or_else(|| {
            CliError::args("no template selected")
                .with_hint("pass --template ID (see `tabex templates`) or set export.defaultTemplate")
        })?;
    let template = find_template_by_id(&template_id).map_err(|e| {
        CliError::from(e).with_hint("run `tabex templates` to list template ids")
    })?;

    let dataset = match (&args.query, &args.table) {
        (Some(sql), _) => Selection::Query(sql.clone()),
        (None, Some(table)) => Selection::Table(table.clone()),
        (None, None) => Selection::Whole,
    };
    let result_set = load_dataset(&args.file, &dataset).map_err(|e| {
        let hint = matches!(dataset, Selection::Whole)
            .then_some("SQLite datasets need --query SQL or --table NAME");
        let err = CliError::from(e);
        match hint {
            Some(h) if err.code == crate::exit_codes::EXIT_USAGE => err.with_hint(h),
            _ => err,
        }
    })?;
    debug!(
        "loaded {} rows x {} columns from {}",
        result_set.len(),
        result_set.columns().len(),
        args.file.display()
    );

    let mut selection = TemplateSelection::new(template.id);
    selection.overrides = settings.overrides_for(template.id);
    for pair in &args.set {
        let (key, value) = parse_set(pair)?;
        selection.overrides.insert(key, value);
    }
    selection.custom_filename = args.filename.clone();

    let artifact = tabex_io::export(&selection, &result_set)?;

    match destination(&args, settings, &artifact.filename) {
        Destination::Stdout => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&artifact.bytes)
                .and_then(|_| handle.flush())
                .map_err(|e| CliError::io(format!("cannot write to stdout: {e}")))?;
        }
        Destination::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CliError::io(format!("cannot create {}: {e}", parent.display())))?;
            }
            write_atomic(&path, &artifact.bytes)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            if !args.quiet {
                eprintln!(
                    "wrote {} ({} rows, {} bytes, {})",
                    path.display(),
                    result_set.len(),
                    artifact.len(),
                    template.id
                );
            }
        }
    }
    Ok(())
}

/// `-o -` means stdout; `-o PATH` is taken as is unless it names an
/// existing directory; otherwise the generated filename goes into
/// `--out-dir`, the configured output directory, or the current directory.
fn destination(args: &ExportArgs, settings: &Settings, filename: &str) -> Destination {
    match &args.output {
        Some(path) if path.as_os_str() == "-" => Destination::Stdout,
        Some(path) if path.is_dir() => Destination::File(path.join(filename)),
        Some(path) => Destination::File(path.clone()),
        None => {
            let dir = args
                .out_dir
                .as_deref()
                .or(settings.output_dir.as_deref())
                .unwrap_or(Path::new("."));
            Destination::File(dir.join(filename))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ExportArgs {
        ExportArgs {
            file: "data.csv".into(),
            template: None,
            query: None,
            table: None,
            set: Vec::new(),
            filename: None,
            output: None,
            out_dir: None,
            quiet: true,
        }
    }

    #[test]
    fn destination_precedence() {
        let settings = Settings { output_dir: Some("/exports".into()), ..Settings::default() };
        let mut a = args();
        assert_eq!(destination(&a, &Settings::default(), "x.csv"), Destination::File("./x.csv".into()));
        assert_eq!(destination(&a, &settings, "x.csv"), Destination::File("/exports/x.csv".into()));

        a.out_dir = Some("out".into());
        assert_eq!(destination(&a, &settings, "x.csv"), Destination::File("out/x.csv".into()));

        a.output = Some("final.csv".into());
        assert_eq!(destination(&a, &settings, "x.csv"), Destination::File("final.csv".into()));

        a.output = Some("-".into());
        assert_eq!(destination(&a, &settings, "x.csv"), Destination::Stdout);
    }

    #[test]
    fn output_directory_gets_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = args();
        a.output = Some(dir.path().to_path_buf());
        assert_eq!(
            destination(&a, &Settings::default(), "x.json"),
            Destination::File(dir.path().join("x.json"))
        );
    }

    #[test]
    fn missing_template_is_usage_error() {
        let err = cmd_export(args(), &Settings::default()).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.hint.is_some());
    }
}
