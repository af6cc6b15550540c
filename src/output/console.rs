use crate::table::UsageLine;
use crate::ScanReport;

/// Render a single-archive scan: analyzed files, permission blocks, then
/// usage grouped by category in catalogue order.
pub fn render(report: &ScanReport) -> String {
    let mut output = String::new();

    for file in &report.archive.files_analyzed {
        output.push_str(&format!("Analyzing file: {}\n", file));
    }

    for block in &report.archive.permissions {
        output.push_str("\n=== Permissions in manifest.json ===\n");
        output.push_str(block);
        output.push('\n');
    }

    if !report.archive.sensitive_permissions.is_empty() {
        output.push_str(&format!(
            "Sensitive permissions: {}\n",
            report.archive.sensitive_permissions.join(", ")
        ));
    }

    output.push_str("\n=== API Usage Summary ===\n");
    for line in report.table.enumerate_by_category(&report.catalogue) {
        match line {
            UsageLine::Header(category) => output.push_str(&format!("\n[{}]\n", category)),
            UsageLine::Entry {
                signature, count, ..
            } => output.push_str(&format!("{}: {}\n", signature, count)),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveSummary;
    use crate::catalogue::{Catalogue, CatalogueSet};
    use crate::table::FrequencyTable;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_grouped_summary() {
        let mut table = FrequencyTable::new();
        table.increment("fetch");
        table.increment("fetch");
        table.increment("localStorage.getItem");
        table.increment("addEventListener");

        let report = ScanReport {
            archive: ArchiveSummary {
                files_analyzed: vec!["manifest.json".into(), "bg.js".into()],
                permissions: vec![r#"["storage","cookies"]"#.into()],
                sensitive_permissions: vec!["cookies".into()],
                ..Default::default()
            },
            table,
            catalogue: Catalogue::builtin(CatalogueSet::Full),
        };

        let expected = "\
Analyzing file: manifest.json
Analyzing file: bg.js

=== Permissions in manifest.json ===
[\"storage\",\"cookies\"]
Sensitive permissions: cookies

=== API Usage Summary ===

[File System]
localStorage.getItem: 1

[Network]
fetch: 2

[User Interaction]
addEventListener: 1
";
        assert_eq!(render(&report), expected);
    }

    #[test]
    fn empty_scan_prints_header_only() {
        let report = ScanReport {
            archive: ArchiveSummary::default(),
            table: FrequencyTable::new(),
            catalogue: Catalogue::builtin(CatalogueSet::Full),
        };
        assert_eq!(render(&report), "\n=== API Usage Summary ===\n");
    }
}
