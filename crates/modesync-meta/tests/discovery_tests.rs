//! Discovery over real directory trees

use modesync_fs::NormalizedPath;
use modesync_meta::{Error, discover};
use modesync_test_utils::ModesFixture;
use pretty_assertions::assert_eq;

fn category_names(fixture: &ModesFixture) -> Vec<String> {
    let discovery = discover(&NormalizedPath::new(fixture.modes_dir())).unwrap();
    discovery.categories.iter().map(|c| c.name.clone()).collect()
}

#[test]
fn test_groups_files_by_category_in_fixed_order() {
    let fixture = ModesFixture::new();
    fixture.write_mode("zeta/one.yaml", &modesync_test_utils::mode_yaml("one"));
    fixture.add_mode("my-helper");
    fixture.write_mode("hybrid/planner.yaml", &modesync_test_utils::mode_yaml("planner"));
    fixture.add_mode("code-enhanced");
    fixture.add_mode("code");

    assert_eq!(
        category_names(&fixture),
        vec!["core", "enhanced", "discovered", "hybrid", "zeta"]
    );
}

#[test]
fn test_entries_are_sorted_by_file_name() {
    let fixture = ModesFixture::new();
    fixture.write_mode("hybrid/b.yaml", &modesync_test_utils::mode_yaml("b"));
    fixture.write_mode("hybrid/a.json", r#"{"slug": "a"}"#);
    fixture.write_mode("hybrid/c.yml", &modesync_test_utils::mode_yaml("c"));

    let discovery = discover(&NormalizedPath::new(fixture.modes_dir())).unwrap();
    let names: Vec<_> = discovery
        .entries()
        .map(|e| e.path.file_name().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.json", "b.yaml", "c.yml"]);
}

#[test]
fn test_parse_failure_does_not_stop_the_walk() {
    let fixture = ModesFixture::new();
    fixture.add_mode("ask");
    fixture.write_mode("broken.yaml", "slug: [unclosed\n");
    fixture.write_mode("list.yaml", "- code\n- debug\n");
    fixture.add_mode("debug");

    let discovery = discover(&NormalizedPath::new(fixture.modes_dir())).unwrap();

    assert_eq!(discovery.len(), 4);
    assert_eq!(discovery.documents().count(), 2);
    let errors: Vec<_> = discovery.parse_errors().collect();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.message.contains("not a mapping")));
}

#[test]
fn test_ignores_hidden_and_foreign_files() {
    let fixture = ModesFixture::new();
    fixture.add_mode("code");
    fixture.write_mode(".draft.yaml", "slug: draft\n");
    fixture.write_mode(".archive/old.yaml", "slug: old\n");
    fixture.write_mode("README.md", "# modes\n");
    fixture.write_mode("settings.toml", "x = 1\n");

    let discovery = discover(&NormalizedPath::new(fixture.modes_dir())).unwrap();
    assert_eq!(discovery.len(), 1);
}

#[test]
fn test_documents_carry_category_and_source() {
    let fixture = ModesFixture::new();
    let path = fixture.write_mode("hybrid/planner.yaml", &modesync_test_utils::mode_yaml("planner"));

    let discovery = discover(&NormalizedPath::new(fixture.modes_dir())).unwrap();
    let doc = discovery.documents().next().unwrap();
    assert_eq!(doc.category, "hybrid");
    assert_eq!(doc.source, NormalizedPath::new(path));
}

#[test]
fn test_discovery_does_not_touch_files() {
    let fixture = ModesFixture::new();
    let path = fixture.write_mode("code.yaml", "slug: Code\nextra: true\n");

    discover(&NormalizedPath::new(fixture.modes_dir())).unwrap();
    assert_eq!(fixture.read(path), "slug: Code\nextra: true\n");
}

#[test]
fn test_missing_root_is_an_error() {
    let fixture = ModesFixture::new();
    let err = discover(&NormalizedPath::new(fixture.root().join("nope"))).unwrap_err();
    assert!(matches!(err, Error::ModesDirNotFound { .. }));
}

#[test]
fn test_file_root_is_an_error() {
    let fixture = ModesFixture::new();
    let file = fixture.add_mode("code");
    let err = discover(&NormalizedPath::new(file)).unwrap_err();
    assert!(matches!(err, Error::NotADirectory { .. }));
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_is_not_followed() {
    let fixture = ModesFixture::new();
    fixture.write_mode("hybrid/planner.yaml", &modesync_test_utils::mode_yaml("planner"));
    std::os::unix::fs::symlink(fixture.modes_dir(), fixture.modes_dir().join("hybrid").join("loop"))
        .unwrap();

    let discovery = discover(&NormalizedPath::new(fixture.modes_dir())).unwrap();
    assert_eq!(discovery.len(), 1);
}
