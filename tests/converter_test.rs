use log::Level;
use whl2conda::converter::index::IndexJson;
use whl2conda::utils::metadata::WheelMetadata;
use whl2conda::{
    DependencyConverter, DependencyRenamer, DiagnosticKind, Diagnostics, RequiresDistEntry,
    StdRenames,
};

fn entries(raw: &[&str]) -> Vec<RequiresDistEntry> {
    raw.iter()
        .map(|r| RequiresDistEntry::parse(r).unwrap())
        .collect()
}

fn converter(pairs: &[(&str, &str)]) -> DependencyConverter {
    DependencyConverter::new(DependencyRenamer::from_pairs(pairs, StdRenames::default()).unwrap())
}

#[test]
fn test_skip_policy() {
    let conversion = converter(&[]).convert(
        &entries(&[
            "pytest ; extra == 'test'",
            "pywin32 ; sys_platform == 'win32'",
        ]),
        "",
    );

    assert!(conversion.dependencies.is_empty());

    let extra: Vec<_> = conversion
        .diagnostics
        .of_kind(DiagnosticKind::ExtraDependencySkipped)
        .collect();
    assert_eq!(extra.len(), 1);
    assert_eq!(extra[0].level(), Level::Debug);

    let marker: Vec<_> = conversion
        .diagnostics
        .of_kind(DiagnosticKind::MarkerDependencySkipped)
        .collect();
    assert_eq!(marker.len(), 1);
    assert_eq!(marker[0].level(), Level::Warn);
    assert!(
        marker[0]
            .message
            .to_lowercase()
            .contains("skipping dependency with environment marker")
    );
}

#[test]
fn test_python_override() {
    let conversion = converter(&[])
        .with_python_version(">=3.10")
        .convert(&entries(&["numpy >=1.20"]), ">=3.8");

    assert_eq!(conversion.dependencies, vec!["numpy >=1.20", "python >=3.10"]);
    assert_eq!(
        conversion
            .dependencies
            .iter()
            .filter(|d| d.starts_with("python "))
            .count(),
        1
    );
    assert_eq!(
        conversion
            .diagnostics
            .of_kind(DiagnosticKind::PythonVersionOverride)
            .count(),
        1
    );
}

#[test]
fn test_python_override_without_requires_python() {
    let conversion = converter(&[])
        .with_python_version(">=3.9")
        .convert(&entries(&["six"]), "");
    assert_eq!(conversion.dependencies, vec!["six ", "python >=3.9"]);
}

#[test]
fn test_python_override_applies_to_renamed_python() {
    let conversion = converter(&[("cpython", "python")])
        .with_python_version(">=3.11")
        .convert(&entries(&["cpython >=3.8"]), "");
    assert_eq!(conversion.dependencies, vec!["python >=3.11"]);
}

#[test]
fn test_rename_and_drop() {
    let conversion = converter(&[("acme-(.*)", r"acme.\1"), ("typing-extensions", "")]).convert(
        &entries(&["acme-widgets ~=1.2.3", "typing-extensions >=4", "attrs"]),
        "",
    );

    assert_eq!(
        conversion.dependencies,
        vec!["acme.widgets >=1.2.3,==1.2.*", "attrs "]
    );
    assert_eq!(
        conversion
            .diagnostics
            .of_kind(DiagnosticKind::DependencyDropped)
            .count(),
        1
    );
    assert_eq!(
        conversion
            .diagnostics
            .of_kind(DiagnosticKind::DependencyRenamed)
            .count(),
        1
    );
    assert_eq!(
        conversion
            .diagnostics
            .of_kind(DiagnosticKind::DependencyCopied)
            .count(),
        1
    );
}

#[test]
fn test_standard_renames_are_applied() {
    let std_renames: StdRenames = vec![("torch".to_string(), "pytorch".to_string())]
        .into_iter()
        .collect();
    let renamer = DependencyRenamer::from_pairs::<&str, &str>(&[], std_renames).unwrap();
    let conversion = DependencyConverter::new(renamer).convert(&entries(&["torch >=2"]), "");

    assert_eq!(conversion.dependencies, vec!["pytorch >=2"]);
    let renamed: Vec<_> = conversion
        .diagnostics
        .of_kind(DiagnosticKind::DependencyRenamed)
        .collect();
    assert_eq!(renamed.len(), 1);
    assert!(renamed[0].message.contains("standard renames"));
}

#[test]
fn test_output_order_and_extra_dependencies() {
    let conversion = converter(&[])
        .with_extra_dependencies(vec!["libzmq >=4".to_string(), "six".to_string()])
        .convert(&entries(&["b", "a >=1", "six"]), ">=3.8");

    // nothing is sorted or deduplicated
    assert_eq!(
        conversion.dependencies,
        vec!["b ", "a >=1", "six ", "python >=3.8", "libzmq >=4", "six"]
    );
    assert_eq!(
        conversion
            .diagnostics
            .of_kind(DiagnosticKind::DependencyAdded)
            .count(),
        2
    );
}

#[test]
fn test_malformed_entry_isolation() {
    let metadata = "Metadata-Version: 2.1
Name: mixed
Version: 0.1
Requires-Dist: numpy >=1.20
Requires-Dist: @@@ not a dependency
Requires-Dist: scipy
Requires-Dist: pandas (>=2)
";
    let md = WheelMetadata::parse(metadata).unwrap();
    let mut diagnostics = Diagnostics::new();
    let parsed = md.dependencies(&mut diagnostics);
    assert_eq!(parsed.len(), 3);
    assert_eq!(
        diagnostics.of_kind(DiagnosticKind::BadRequiresDist).count(),
        1
    );

    let conversion = converter(&[]).convert(&parsed, "");
    assert_eq!(
        conversion.dependencies,
        vec!["numpy >=1.20", "scipy ", "pandas >=2"]
    );
}

#[test]
fn test_bad_version_spec_is_reported_and_kept() {
    let conversion = converter(&[]).convert(&entries(&["foo >=1.0,bogus"]), "");
    assert_eq!(conversion.dependencies, vec!["foo >=1.0,bogus"]);
    assert_eq!(conversion.diagnostics.warnings().count(), 1);
}

#[test]
fn test_index_deduplicates_converted_dependencies() {
    let conversion = converter(&[])
        .with_extra_dependencies(vec!["six".to_string()])
        .convert(&entries(&["six"]), "");
    let index = IndexJson::new("pkg", "1.0", None, &conversion.dependencies, "", None);
    assert_eq!(index.depends, vec!["six "]);
}
