use crate::catalogue::Catalogue;
use crate::sampler::ArchivePermissions;
use crate::table::FrequencyTable;

pub const HEADER: &str = "API,Count";
pub const PERMISSIONS_HEADER: &str = "Extension,Permissions";

/// Flat `API,Count` export, one row per observed signature in catalogue order.
///
/// Signatures are always double-quoted; embedded quotes are doubled.
pub fn render(table: &FrequencyTable, catalogue: &Catalogue) -> String {
    let mut output = String::from(HEADER);
    output.push('\n');
    for (entry, count) in table.observed(catalogue) {
        output.push_str(&format!("{},{}\n", quote(&entry.signature), count));
    }
    output
}

/// `Extension,Permissions` export, one row per analyzed archive. Flagged
/// names are joined with `", "`; an archive with none gets `None`.
pub fn render_permissions(records: &[ArchivePermissions]) -> String {
    let mut output = String::from(PERMISSIONS_HEADER);
    output.push('\n');
    for record in records {
        let flagged = if record.sensitive_permissions.is_empty() {
            "None".to_string()
        } else {
            record.sensitive_permissions.join(", ")
        };
        output.push_str(&format!(
            "{},{}\n",
            quote(&record.path.display().to_string()),
            quote(&flagged)
        ));
    }
    output
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
