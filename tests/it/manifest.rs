use std::path::{Path, PathBuf};

use assert_matches::assert_matches;
use fs_err as fs;
use indoc::indoc;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use pipreq::*;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("must create temp dir"),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("must create manifest dir");
        }
        fs::write(&path, content).expect("must write manifest");
        path
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

fn names(manifest: &Manifest) -> Vec<String> {
    manifest.dependencies().iter().map(ToString::to_string).collect()
}

fn read(path: &Path) -> Manifest {
    ManifestReader::default()
        .parse(path)
        .expect("must parse manifest")
}

#[test]
fn reads_requirements() {
    let workspace = Workspace::new();
    let root = workspace.write(
        "requirements.txt",
        indoc! {"
            # Web
            requests [security] >= 2.8.1, == 2.8.*
            docopt == 0.6.1   # pinned for the CLI
            example; python_version >= '3.8'
        "},
    );

    let manifest = read(&root);
    assert_eq!(names(&manifest), vec!["requests", "docopt", "example"]);
    assert!(manifest.diagnostics().is_empty());

    let requests = &manifest.dependencies()[0];
    assert_eq!(requests.extras(), &vec![String::from("security")]);
    let keys = requests
        .constraints()
        .iter()
        .map(Constraint::key)
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            VersionKey::builder().major(2).minor(8).patch(1).build(),
            VersionKey::builder().major(2).minor(8).build(),
        ]
    );

    let docopt = &manifest.dependencies()[1];
    assert_eq!(docopt.likes_version("0.6.1"), Ok(true));
    assert_eq!(docopt.likes_version("0.6.2"), Ok(false));

    let example = &manifest.dependencies()[2];
    assert_eq!(
        example.env_markers(),
        &btreemap! { String::from("python_version") => String::from(">=3.8") }
    );
}

#[test]
fn expands_nested_in_place() {
    let workspace = Workspace::new();
    workspace.write("expands-base.txt", "attrs\nsix\n");
    let root = workspace.write(
        "requirements.txt",
        indoc! {"
            pytest
            -r expands-base.txt
            pytest-cov
        "},
    );

    let manifest = read(&root);
    assert_eq!(names(&manifest), vec!["pytest", "attrs", "six", "pytest-cov"]);
}

#[test]
fn resolves_nested_relative_to_including_manifest() {
    let workspace = Workspace::new();
    workspace.write("reqs/relative-common.txt", "click\n");
    workspace.write("reqs/relative-dev.txt", "--requirement=relative-common.txt\nblack\n");
    let root = workspace.write("requirements.txt", "-r reqs/relative-dev.txt\n");

    let manifest = read(&root);
    assert_eq!(names(&manifest), vec!["click", "black"]);
}

#[test]
fn prefers_literal_nested_path() {
    let workspace = Workspace::new();
    let absolute = workspace.write("elsewhere/literal.txt", "flask\n");
    let root = workspace.write(
        "requirements.txt",
        &format!("-r {}\n", absolute.display()),
    );

    let manifest = read(&root);
    assert_eq!(names(&manifest), vec!["flask"]);
}

#[test]
fn allows_diamond_inclusion() {
    let workspace = Workspace::new();
    workspace.write("diamond-shared.txt", "six\n");
    workspace.write("diamond-left.txt", "-r diamond-shared.txt\nleft\n");
    workspace.write("diamond-right.txt", "-r diamond-shared.txt\nright\n");
    let root = workspace.write(
        "requirements.txt",
        "-r diamond-left.txt\n-r diamond-right.txt\n",
    );

    let manifest = read(&root);
    assert_eq!(names(&manifest), vec!["six", "left", "six", "right"]);
}

#[test]
fn rejects_cycles() {
    let workspace = Workspace::new();
    workspace.write("cycle-a.txt", "alpha\n-r cycle-b.txt\n");
    workspace.write("cycle-b.txt", "beta\n-r cycle-a.txt\n");

    let result = ManifestReader::default().parse(workspace.path().join("cycle-a.txt"));
    assert_matches!(result, Err(ManifestError::CyclicInclusion { path }) if path.ends_with("cycle-a.txt"));
}

#[test]
fn rejects_self_inclusion() {
    let workspace = Workspace::new();
    let root = workspace.write("self-include.txt", "-r self-include.txt\n");

    let result = ManifestReader::default().parse(&root);
    assert_matches!(result, Err(ManifestError::CyclicInclusion { .. }));
}

#[test]
fn missing_nested_manifest_fails() {
    let workspace = Workspace::new();
    let root = workspace.write("requirements.txt", "-r missing-nested.txt\n");

    let result = ManifestReader::default().parse(&root);
    assert_matches!(
        result,
        Err(ManifestError::Io { path, .. }) if path == workspace.path().join("missing-nested.txt")
    );
}

#[test]
fn malformed_constraint_in_nested_manifest() {
    let workspace = Workspace::new();
    let nested = workspace.write("malformed-nested.txt", "ok\nbroken >= x.y\n");
    let root = workspace.write("requirements.txt", "-r malformed-nested.txt\n");

    let result = ManifestReader::default().parse(&root);
    assert_matches!(
        result,
        Err(ManifestError::Line { path, line: 2, source: ParseError::MalformedConstraint { .. } }) if path == nested
    );
}

#[test]
fn diagnostics_point_at_nested_manifest() {
    let workspace = Workspace::new();
    let nested = workspace.write("diagnostics-nested.txt", "pytest\n-e .\n");
    let root = workspace.write(
        "requirements.txt",
        "-r diagnostics-nested.txt\nhttps://example.com/pkg.tar.gz\n",
    );

    let manifest = read(&root);
    assert_eq!(names(&manifest), vec!["pytest"]);

    let diagnostics = manifest.diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].path(), &nested);
    assert_eq!(diagnostics[0].line(), 2);
    assert_eq!(
        diagnostics[0].form(),
        &UnsupportedForm::Field(LineField::Editable)
    );
    assert_eq!(diagnostics[1].path(), &root);
    assert_eq!(diagnostics[1].line(), 2);
    assert_eq!(
        diagnostics[1].to_string(),
        format!("'dist_url' not supported ({}:2)", root.display())
    );
}

#[test]
fn records_locations() {
    let workspace = Workspace::new();
    let root = workspace.write(
        "requirements.txt",
        indoc! {"
            -e git+https://github.com/psf/requests.git#egg=requests
            ./vendor/meme-1.0-py3-none-any.whl
            https://example.com/pkg.tar.gz
            urllib3 @ https://github.com/urllib3/urllib3/archive/refs/tags/1.26.8.zip
        "},
    );

    let manifest = ManifestReader::builder()
        .policy(LocationPolicy::Record)
        .build()
        .parse(&root)
        .expect("must parse manifest");
    assert!(manifest.diagnostics().is_empty());
    assert_eq!(
        names(&manifest),
        vec!["Undefined", "Undefined", "Undefined", "urllib3"]
    );

    let dependencies = manifest.into_dependencies();
    assert!(dependencies[0].editable());
    assert_eq!(
        dependencies[0].location(),
        &Some(Location::Editable(String::from(
            "git+https://github.com/psf/requests.git#egg=requests"
        )))
    );
    assert_eq!(
        dependencies[1].location(),
        &Some(Location::Wheel(PathBuf::from(
            "./vendor/meme-1.0-py3-none-any.whl"
        )))
    );
    assert_eq!(
        dependencies[2].location(),
        &Some(Location::DistributionUrl(String::from(
            "https://example.com/pkg.tar.gz"
        )))
    );
    assert_eq!(
        dependencies[3].location(),
        &Some(Location::PackageUrl(String::from(
            "https://github.com/urllib3/urllib3/archive/refs/tags/1.26.8.zip"
        )))
    );
}

#[test]
fn nested_only_line_produces_no_dependency() {
    let workspace = Workspace::new();
    workspace.write("nested-only-empty.txt", "# nothing here\n");
    let root = workspace.write("requirements.txt", "-r nested-only-empty.txt\n");

    let manifest = read(&root);
    assert!(manifest.dependencies().is_empty());
    assert!(manifest.diagnostics().is_empty());
}

#[test]
fn handles_crlf_and_continuations() {
    let workspace = Workspace::new();
    let root = workspace.write(
        "requirements.txt",
        "requests >= 2.8.1, \\\r\n    < 3\r\nsix\r\n",
    );

    let manifest = read(&root);
    assert_eq!(names(&manifest), vec!["requests", "six"]);
    assert_eq!(manifest.dependencies()[0].constraints().len(), 2);
}

#[test]
fn parse_str_resolves_nested_from_origin() {
    let workspace = Workspace::new();
    workspace.write("from-origin.txt", "attrs\n");

    let manifest = ManifestReader::default()
        .parse_str("-r from-origin.txt\nsix\n", workspace.path().join("virtual.txt"))
        .expect("must parse manifest");
    assert_eq!(names(&manifest), vec!["attrs", "six"]);
}

#[test]
fn iterates_dependencies() {
    let workspace = Workspace::new();
    let root = workspace.write("requirements.txt", "attrs\nsix\n");

    let collected = read(&root)
        .into_iter()
        .map(|dependency| dependency.to_string())
        .collect::<Vec<_>>();
    assert_eq!(collected, vec!["attrs", "six"]);
}
