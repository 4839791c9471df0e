use whl2conda::{DiagnosticKind, Diagnostics, translate_version_spec};

fn translate(spec: &str) -> (String, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let translated = translate_version_spec(spec, &mut diagnostics);
    (translated, diagnostics)
}

#[test]
fn test_simple_clauses_are_unchanged() {
    let test_cases = vec![
        (">=1.2.3,<4.0", ">=1.2.3,<4.0"),
        (">=1.2.3, <4.0", ">=1.2.3,<4.0"),
        ("==2.0", "==2.0"),
        ("!=1.5", "!=1.5"),
        ("<=3", "<=3"),
        (">1.0.0", ">1.0.0"),
        ("", ""),
    ];

    for (input, expected) in test_cases {
        let (translated, diagnostics) = translate(input);
        assert_eq!(translated, expected, "translating '{}'", input);
        assert!(diagnostics.is_empty(), "no diagnostics for '{}'", input);
    }
}

#[test]
fn test_compatible_release() {
    assert_eq!(translate("~=1.2.3").0, ">=1.2.3,==1.2.*");
    assert_eq!(translate("~=2.2").0, ">=2.2,==2.*");
    assert_eq!(translate("~=1.4.5,!=1.4.7").0, ">=1.4.5,==1.4.*,!=1.4.7");
}

#[test]
fn test_compatible_release_single_component() {
    let (translated, diagnostics) = translate("~=1");
    assert_eq!(translated, ">=1");
    assert!(diagnostics.is_empty());
}

#[test]
fn test_arbitrary_equality() {
    let (translated, diagnostics) = translate("===1.2.3");
    assert_eq!(translated, "==1.2.3");

    let warnings: Vec<_> = diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, DiagnosticKind::ArbitraryEquality);
    assert!(warnings[0].message.contains("arbitrary equality"));
}

#[test]
fn test_bad_clause_is_kept() {
    let (translated, diagnostics) = translate(">=1.0, foo, <2");
    assert_eq!(translated, ">=1.0,foo,<2");
    assert_eq!(diagnostics.of_kind(DiagnosticKind::BadVersionSpec).count(), 1);
    assert!(
        diagnostics
            .iter()
            .next()
            .unwrap()
            .message
            .contains("bad version spec")
    );
}

#[test]
fn test_leading_v_is_dropped() {
    assert_eq!(translate(">=v1.0").0, ">=1.0");
}
