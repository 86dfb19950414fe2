use std::fs;
use std::path::{Path, PathBuf};

use pkginfo_core::write_packages_file;
use pkginfo_scan::{PackageScanner, ScanConfig};
use pkginfo_synth::{
    PackageEntry, PackageSet, SynthConfig, SynthError, Synthesizer, TextTemplate, synthesize,
};
use tempfile::TempDir;

fn set(names: &[&str]) -> PackageSet {
    names.iter().filter_map(PackageEntry::new).collect()
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

/// Every file below `root`, relative and sorted.
fn files(root: &Path) -> Vec<PathBuf> {
    fn visit(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                visit(&path, root, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }

    let mut out = Vec::new();
    if root.exists() {
        visit(root, root, &mut out);
    }
    out.sort();
    out
}

#[test]
fn test_end_to_end_example_tree() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let out = temp.path().join("out");
    touch(&src.join("foo/Bar.java"));
    touch(&src.join("foo/baz/Qux.java"));
    fs::create_dir_all(src.join("foo/empty")).unwrap();

    let scan = PackageScanner::new(ScanConfig::new([&src]))
        .unwrap()
        .scan()
        .unwrap();
    let report = synthesize(&scan.packages, &out, &TextTemplate::default()).unwrap();

    assert_eq!(report.created.len(), 2);
    assert_eq!(
        fs::read_to_string(out.join("foo/package-info.java")).unwrap(),
        "package foo;"
    );
    assert_eq!(
        fs::read_to_string(out.join("foo/baz/package-info.java")).unwrap(),
        "package foo.baz;"
    );
    assert!(!out.join("foo/empty").exists());
}

#[test]
fn test_declarations_match_packages_exactly() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    touch(&out.join("leftover/Junk.java"));
    touch(&out.join("a/notes.txt"));
    touch(&out.join(".hidden/package-info.java"));

    let packages = set(&["a", "a.b.c", "d"]);
    synthesize(&packages, &out, &TextTemplate::default()).unwrap();

    assert_eq!(
        files(&out),
        vec![
            PathBuf::from("a/b/c/package-info.java"),
            PathBuf::from("a/package-info.java"),
            PathBuf::from("d/package-info.java"),
        ]
    );
    // Intermediate directory of a.b.c survives without a declaration.
    assert!(out.join("a/b").is_dir());
    assert!(!out.join("leftover").exists());
    assert!(!out.join(".hidden").exists());
}

#[test]
fn test_stale_package_is_removed() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let template = TextTemplate::default();

    synthesize(&set(&["a", "a.b"]), &out, &template).unwrap();
    assert!(out.join("a/b/package-info.java").is_file());
    let kept = out.join("a/package-info.java");
    let before = fs::metadata(&kept).unwrap().modified().unwrap();

    let report = synthesize(&set(&["a"]), &out, &template).unwrap();

    assert!(!out.join("a/b/package-info.java").exists());
    assert!(!out.join("a/b").exists());
    assert_eq!(fs::read_to_string(&kept).unwrap(), "package a;");
    assert_eq!(fs::metadata(&kept).unwrap().modified().unwrap(), before);
    assert_eq!(report.removed.len(), 2);
    assert_eq!(report.unchanged, 1);
}

#[test]
fn test_identical_content_is_not_rewritten() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let target = out.join("x/y/package-info.java");
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(&target, "package x.y;").unwrap();
    let before = fs::metadata(&target).unwrap().modified().unwrap();

    let report = synthesize(&set(&["x.y"]), &out, &TextTemplate::default()).unwrap();

    assert_eq!(report.writes(), 0);
    assert_eq!(report.unchanged, 1);
    assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), before);
}

#[test]
fn test_second_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let packages = set(&["com.acme", "com.acme.util", "org.example"]);
    let template = TextTemplate::default();

    let first = synthesize(&packages, &out, &template).unwrap();
    assert_eq!(first.created.len(), 3);

    let second = synthesize(&packages, &out, &template).unwrap();
    assert!(second.is_up_to_date());
    assert_eq!(second.unchanged, 3);
}

#[test]
fn test_drifted_content_is_updated() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let same_length = out.join("a/package-info.java");
    let longer = out.join("b/package-info.java");
    touch(&same_length);
    touch(&longer);
    fs::write(&same_length, "package z;").unwrap();
    fs::write(&longer, "// edited by hand\npackage b;").unwrap();

    let report = synthesize(&set(&["a", "b"]), &out, &TextTemplate::default()).unwrap();

    assert_eq!(report.updated.len(), 2);
    assert_eq!(fs::read_to_string(&same_length).unwrap(), "package a;");
    assert_eq!(fs::read_to_string(&longer).unwrap(), "package b;");
}

#[test]
fn test_files_in_output_root_are_removed() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    touch(&out.join("package-info.java"));
    touch(&out.join("README"));

    let report = synthesize(&set(&["a"]), &out, &TextTemplate::default()).unwrap();

    assert_eq!(files(&out), vec![PathBuf::from("a/package-info.java")]);
    assert_eq!(report.removed.len(), 2);
    assert!(report.removed.iter().all(|r| !r.is_dir));
}

#[test]
fn test_empty_package_set_clears_output() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    synthesize(&set(&["a.b", "c"]), &out, &TextTemplate::default()).unwrap();

    let report = synthesize(&PackageSet::new(), &out, &TextTemplate::default()).unwrap();

    assert!(out.is_dir());
    assert!(files(&out).is_empty());
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    assert_eq!(report.declarations(), 0);
}

#[test]
fn test_plan_leaves_filesystem_untouched() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    touch(&out.join("stale/package-info.java"));
    fs::create_dir_all(out.join("keep")).unwrap();
    fs::write(out.join("keep/package-info.java"), "package keep;").unwrap();

    let synthesizer = Synthesizer::new(SynthConfig::new(&out));
    let packages = set(&["keep", "fresh"]);
    let plan = synthesizer.plan(&packages, &TextTemplate::default()).unwrap();

    assert_eq!(plan.created, vec![out.join("fresh/package-info.java")]);
    assert_eq!(plan.unchanged, 1);
    assert_eq!(plan.removed.len(), 2);
    assert!(!plan.is_up_to_date());
    assert!(out.join("stale/package-info.java").exists());
    assert!(!out.join("fresh").exists());

    synthesizer.synthesize(&packages, &TextTemplate::default()).unwrap();
    assert!(
        synthesizer
            .plan(&packages, &TextTemplate::default())
            .unwrap()
            .is_up_to_date()
    );
}

#[test]
fn test_annotated_template() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let template = TextTemplate::new(
        "@NotNullByDefault\npackage {package};\n\nimport org.jetbrains.annotations.NotNullByDefault;",
    );

    synthesize(&set(&["net.example"]), &out, &template).unwrap();

    assert_eq!(
        fs::read_to_string(out.join("net/example/package-info.java")).unwrap(),
        "@NotNullByDefault\npackage net.example;\n\nimport org.jetbrains.annotations.NotNullByDefault;"
    );
}

#[test]
fn test_closure_template() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let template = |name: &str| format!("/** Generated. */\npackage {name};\n");

    synthesize(&set(&["a"]), &out, &template).unwrap();

    assert_eq!(
        fs::read_to_string(out.join("a/package-info.java")).unwrap(),
        "/** Generated. */\npackage a;\n"
    );
}

#[test]
fn test_custom_declaration_file_name() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    touch(&out.join("a/package-info.java"));
    let config = SynthConfig::builder()
        .output_root(&out)
        .declaration_file("package-info.kt")
        .build()
        .unwrap();

    Synthesizer::new(config)
        .synthesize(&set(&["a"]), &TextTemplate::default())
        .unwrap();

    assert_eq!(files(&out), vec![PathBuf::from("a/package-info.kt")]);
}

#[test]
fn test_synthesize_from_packages_file() {
    let temp = TempDir::new().unwrap();
    let packages_file = temp.path().join("build/packages");
    let out = temp.path().join("out");
    write_packages_file(&packages_file, &set(&["b", "a.c"])).unwrap();

    let report = Synthesizer::new(SynthConfig::new(&out))
        .synthesize_from_file(&packages_file, &TextTemplate::default())
        .unwrap();

    assert_eq!(report.created.len(), 2);
    assert_eq!(
        files(&out),
        vec![
            PathBuf::from("a/c/package-info.java"),
            PathBuf::from("b/package-info.java"),
        ]
    );
}

#[test]
fn test_missing_packages_file_fails() {
    let temp = TempDir::new().unwrap();
    let err = Synthesizer::new(SynthConfig::new(temp.path().join("out")))
        .synthesize_from_file(&temp.path().join("nope"), &TextTemplate::default())
        .unwrap_err();

    assert!(matches!(err, SynthError::Io { .. }));
}

#[test]
fn test_override_respected_through_pipeline() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    let out = temp.path().join("out");
    touch(&src.join("a/A.java"));
    touch(&src.join("b/B.java"));
    let scanner = PackageScanner::new(ScanConfig::new([&src])).unwrap();
    let template = TextTemplate::default();

    synthesize(&scanner.scan().unwrap().packages, &out, &template).unwrap();
    assert!(out.join("a/package-info.java").exists());

    // A hand-written declaration now owns package a.
    fs::write(src.join("a/package-info.java"), "package a;").unwrap();
    synthesize(&scanner.scan().unwrap().packages, &out, &template).unwrap();

    assert_eq!(files(&out), vec![PathBuf::from("b/package-info.java")]);
}
