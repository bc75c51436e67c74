//! Tests for layered settings loading

use std::path::PathBuf;

use tempfile::TempDir;

use lorewiki::config::Settings;

#[test]
fn given_project_file_when_loading_then_overrides_defaults_and_expands_paths() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wiki.toml");
    std::fs::write(
        &path,
        "lib_dir = \"~/lore/lib\"\noutput_dir = \"site\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();

    let home = std::env::var("HOME").expect("HOME should be set");
    assert!(settings.lib_dir.starts_with(&home));
    assert_eq!(settings.output_dir, PathBuf::from("site"));
}

#[test]
fn given_malformed_file_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wiki.toml");
    std::fs::write(&path, "lib_dir = [").unwrap();

    assert!(Settings::load(Some(path.as_path())).is_err());
}

#[test]
fn given_env_var_when_loading_then_env_wins_over_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wiki.toml");
    std::fs::write(&path, "links_file = \"from-file.md\"\n").unwrap();
    std::env::set_var("LOREWIKI_LINKS_FILE", "from-env.md");

    let settings = Settings::load(Some(path.as_path()));
    std::env::remove_var("LOREWIKI_LINKS_FILE");

    assert_eq!(settings.unwrap().links_file, "from-env.md");
}

#[test]
fn given_settings_when_serialising_then_round_trips_through_toml() {
    let settings = Settings::default();
    let parsed: Settings = toml::from_str(&settings.to_toml().unwrap()).unwrap();
    assert_eq!(parsed, settings);
}
