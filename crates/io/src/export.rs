// Export orchestration: template lookup, option merge, dispatch to encoders

use chrono::{DateTime, Utc};
use log::{debug, info};
use tabex_engine::artifact::{csv_mime_type, Artifact, MIME_JSON, MIME_XLSX};
use tabex_engine::catalog::{find_template_by_id, ExportFormat};
use tabex_engine::error::ExportError;
use tabex_engine::filename::resolve_filename;
use tabex_engine::options::{ExportConfig, TemplateSelection};
use tabex_engine::value::ResultSet;

use crate::csv::{encode_csv, CsvOptions};
use crate::json::{encode_json, JsonOptions};
use crate::xlsx::encode_workbook;

/// Export `result_set` with the selected template, stamped with the current
/// time.
pub fn export(selection: &TemplateSelection, result_set: &ResultSet) -> Result<Artifact, ExportError> {
    export_at(selection, result_set, Utc::now())
}

/// Export with a fixed clock. `now` supplies the filename date (UTC) and
/// every generated timestamp.
pub fn export_at(
    selection: &TemplateSelection,
    result_set: &ResultSet,
    now: DateTime<Utc>,
) -> Result<Artifact, ExportError> {
    let template = find_template_by_id(&selection.template_id)?;
    let config = ExportConfig::resolve(template, &selection.overrides);
    let custom = selection.effective_custom_filename();
    let filename = resolve_filename(template, custom.as_deref(), now.date_naive());
    debug!("exporting with '{}' options {:?}", template.id, config.values());

    let artifact = match template.format {
        ExportFormat::Csv => {
            let options = CsvOptions::from_config(&config);
            let bytes = encode_csv(result_set, &options)?;
            Artifact::new(filename, csv_mime_type(&options.encoding), bytes)
        }
        ExportFormat::Excel => {
            let workbook = encode_workbook(result_set, &config, now)?;
            debug!("workbook sheets: {:?}", workbook.sheets);
            Artifact::new(filename, MIME_XLSX, workbook.bytes)
        }
        ExportFormat::Json => {
            let bytes = encode_json(result_set, &JsonOptions::from_config(&config), now)?;
            Artifact::new(filename, MIME_JSON, bytes)
        }
    };

    info!(
        "exported {} rows with template '{}' to {} ({} bytes)",
        result_set.len(),
        template.id,
        artifact.filename,
        artifact.len()
    );
    Ok(artifact)
}
