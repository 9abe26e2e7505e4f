//! Content packager
//!
//! Splits an app bundle into the five content packs, writes each one as a
//! pretty-printed JSON document and registers the pack files in the
//! project's asset manifest.

use futures::future::try_join_all;
use serde_json::{Map, Value as JsonValue};
use shipwright_core::domain::bundle::{AppBundle, stringify_id};
use shipwright_core::domain::pack::PackName;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{BuildError, Result};

/// Pack directory, relative to a workspace root
pub const PACKS_DIR: &str = "assets/ota_packs";

/// Asset manifest, relative to a workspace root
pub const MANIFEST_FILE: &str = "pubspec.yaml";

/// Maps the bundle onto the five packs, applying the defaults for absent parts
pub fn build_packs(bundle: &AppBundle) -> BTreeMap<PackName, JsonValue> {
    let or_object = |v: &Option<JsonValue>| v.clone().unwrap_or_else(|| JsonValue::Object(Map::new()));
    let or_array = |v: &Option<JsonValue>| v.clone().unwrap_or_else(|| JsonValue::Array(Vec::new()));

    let mut config = bundle.app.clone();
    if let Some(id) = bundle.app.get("id").and_then(stringify_id) {
        config.insert("id".to_string(), JsonValue::String(id));
    }

    BTreeMap::from([
        (PackName::Design, or_object(&bundle.design)),
        (PackName::Layout, or_object(&bundle.layout)),
        (PackName::Screens, or_array(&bundle.screens)),
        (PackName::Onboarding, or_array(&bundle.onboarding)),
        (PackName::Config, JsonValue::Object(config)),
    ])
}

fn require_packs(
    packs: BTreeMap<PackName, JsonValue>,
) -> Result<BTreeMap<PackName, JsonValue>> {
    if packs.is_empty() {
        return Err(BuildError::Packaging(
            "bundle produced no content packs".to_string(),
        ));
    }
    Ok(packs)
}

/// Writes every pack into `packs_dir`, replacing previous content
///
/// Packs are written concurrently; the call returns once all of them are on
/// disk.
pub async fn write_packs_to(
    packs_dir: &Path,
    bundle: &AppBundle,
) -> Result<BTreeMap<PackName, PathBuf>> {
    let packs = require_packs(build_packs(bundle))?;

    tokio::fs::create_dir_all(packs_dir)
        .await
        .map_err(|e| BuildError::io(packs_dir, e))?;

    let writes = packs.into_iter().map(|(name, value)| async move {
        let path = packs_dir.join(name.file_name());
        let bytes = serde_json::to_vec_pretty(&value).map_err(|e| {
            BuildError::Packaging(format!("failed to serialize {} pack: {}", name, e))
        })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| BuildError::io(&path, e))?;
        debug!("Wrote {} pack to {}", name, path.display());
        Ok::<_, BuildError>((name, path))
    });

    let written = try_join_all(writes).await?;
    Ok(written.into_iter().collect())
}

/// Writes the packs into a workspace and registers them in its manifest
///
/// # Returns
/// Pack name to written file path
pub async fn write_packs(
    workspace_dir: &Path,
    bundle: &AppBundle,
) -> Result<BTreeMap<PackName, PathBuf>> {
    let packs = write_packs_to(&workspace_dir.join(PACKS_DIR), bundle).await?;
    apply_manifest_patch(workspace_dir).await?;

    info!("Wrote {} content packs into {}", packs.len(), workspace_dir.display());
    Ok(packs)
}

/// Copies a previously built package into a workspace
///
/// All five pack files must be present in `package_dir`. Copying a package
/// onto the workspace's own pack directory leaves the files as they are.
pub async fn install_packs(
    package_dir: &Path,
    workspace_dir: &Path,
) -> Result<BTreeMap<PackName, PathBuf>> {
    if !package_dir.is_dir() {
        return Err(BuildError::Packaging(format!(
            "OTA package {} does not exist",
            package_dir.display()
        )));
    }

    if let Some(missing) = PackName::ALL
        .iter()
        .find(|name| !package_dir.join(name.file_name()).is_file())
    {
        return Err(BuildError::Packaging(format!(
            "OTA package {} is missing {}",
            package_dir.display(),
            missing.file_name()
        )));
    }

    let packs_dir = workspace_dir.join(PACKS_DIR);
    tokio::fs::create_dir_all(&packs_dir)
        .await
        .map_err(|e| BuildError::io(&packs_dir, e))?;

    let same_dir = match (
        tokio::fs::canonicalize(package_dir).await,
        tokio::fs::canonicalize(&packs_dir).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };

    let mut installed = BTreeMap::new();
    for name in PackName::ALL {
        let target = packs_dir.join(name.file_name());
        if !same_dir {
            let source = package_dir.join(name.file_name());
            tokio::fs::copy(&source, &target)
                .await
                .map_err(|e| BuildError::io(&source, e))?;
        }
        installed.insert(name, target);
    }

    apply_manifest_patch(workspace_dir).await?;

    info!(
        "Installed OTA package {} into {}",
        package_dir.display(),
        workspace_dir.display()
    );
    Ok(installed)
}

// =============================================================================
// Asset manifest
// =============================================================================

/// Asset paths registered for the packs, in declaration order
pub fn asset_declarations() -> Vec<String> {
    PackName::ALL
        .iter()
        .map(|name| format!("{}/{}", PACKS_DIR, name.file_name()))
        .collect()
}

/// Patches the manifest in `workspace_dir` unless it already lists the packs
///
/// # Returns
/// `true` if the manifest was modified
pub async fn apply_manifest_patch(workspace_dir: &Path) -> Result<bool> {
    let path = workspace_dir.join(MANIFEST_FILE);

    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(BuildError::Packaging(format!(
                "asset manifest {} not found",
                path.display()
            )));
        }
        Err(e) => return Err(BuildError::io(&path, e)),
    };

    match patch_manifest_text(&text).inspect_err(|e| {
        debug!("Cannot patch asset manifest {}: {}", path.display(), e)
    })? {
        Some(patched) => {
            tokio::fs::write(&path, patched)
                .await
                .map_err(|e| BuildError::io(&path, e))?;
            info!("Registered content packs in {}", path.display());
            Ok(true)
        }
        None => {
            debug!("Asset manifest {} already lists the packs", path.display());
            Ok(false)
        }
    }
}

/// Returns the manifest text with the pack assets declared, or `None` if the
/// pack folder is already mentioned
///
/// Declarations go right below the `assets:` key of the top-level `flutter:`
/// section, at the indentation of the items already listed there. An inline
/// `assets: [..]` list is rewritten as a block list. Missing keys are created.
pub fn patch_manifest_text(text: &str) -> Result<Option<String>> {
    if text.contains(PACKS_DIR) {
        return Ok(None);
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    let declare = |indent: usize| {
        asset_declarations()
            .into_iter()
            .map(move |decl| format!("{}- {}", " ".repeat(indent), decl))
    };

    match lines.iter().position(|l| yaml_key(l) == Some("flutter:")) {
        Some(flutter) => {
            let end = lines[flutter + 1..]
                .iter()
                .position(|l| is_top_level(l))
                .map_or(lines.len(), |p| flutter + 1 + p);

            let assets = (flutter + 1..end).find_map(|i| assets_value(lines[i]).map(|v| (i, v)));
            match assets {
                Some((assets, "")) => {
                    let indent = lines[assets + 1..end]
                        .iter()
                        .find(|l| yaml_key(l).is_some())
                        .filter(|l| l.trim_start().starts_with("- "))
                        .map_or(indent_of(lines[assets]) + 2, |l| indent_of(l));

                    for (offset, line) in declare(indent).enumerate() {
                        out.insert(assets + 1 + offset, line);
                    }
                }
                Some((assets, inline)) => {
                    let items = flow_items(inline).ok_or_else(|| {
                        BuildError::Packaging(format!(
                            "asset manifest has an unsupported assets value: {}",
                            inline
                        ))
                    })?;
                    let key_indent = indent_of(lines[assets]);
                    let indent = key_indent + 2;

                    let block: Vec<String> = declare(indent)
                        .chain(
                            items
                                .iter()
                                .map(|item| format!("{}- {}", " ".repeat(indent), item)),
                        )
                        .collect();
                    out[assets] = format!("{}assets:", " ".repeat(key_indent));
                    for (offset, line) in block.into_iter().enumerate() {
                        out.insert(assets + 1 + offset, line);
                    }
                }
                None => {
                    out.insert(flutter + 1, "  assets:".to_string());
                    for (offset, line) in declare(4).enumerate() {
                        out.insert(flutter + 2 + offset, line);
                    }
                }
            }
        }
        None => {
            if out.last().is_some_and(|l| !l.trim().is_empty()) {
                out.push(String::new());
            }
            out.push("flutter:".to_string());
            out.push("  assets:".to_string());
            out.extend(declare(4));
        }
    }

    let mut patched = out.join("\n");
    patched.push('\n');
    Ok(Some(patched))
}

/// Value following an `assets:` key, empty for a block list
fn assets_value(line: &str) -> Option<&str> {
    yaml_key(line)?
        .trim_start()
        .strip_prefix("assets:")
        .map(str::trim)
}

/// Items of a one-line flow sequence such as `[a, "b"]`
fn flow_items(value: &str) -> Option<Vec<&str>> {
    let inner = value.strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

/// Key part of a line with any trailing comment removed
fn yaml_key(line: &str) -> Option<&str> {
    let key = line.split('#').next().unwrap_or_default().trim_end();
    (!key.is_empty()).then_some(key)
}

fn is_top_level(line: &str) -> bool {
    !line.is_empty() && !line.starts_with(char::is_whitespace) && !line.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const PUBSPEC: &str = concat!(
        "name: demo\n",
        "dependencies:\n",
        "  flutter:\n",
        "    sdk: flutter\n",
        "\n",
        "flutter:\n",
        "  uses-material-design: true\n",
        "  assets:\n",
        "    - assets/images/\n",
        "\n",
        "dev_dependencies:\n",
        "  lints: ^3.0.0\n",
    );

    fn bundle(value: JsonValue) -> AppBundle {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_packs_defaults() {
        let packs = build_packs(&bundle(json!({ "app": { "id": 7, "appName": "Demo" } })));

        assert_eq!(packs.len(), 5);
        assert_eq!(packs[&PackName::Design], json!({}));
        assert_eq!(packs[&PackName::Layout], json!({}));
        assert_eq!(packs[&PackName::Screens], json!([]));
        assert_eq!(packs[&PackName::Onboarding], json!([]));
        assert_eq!(packs[&PackName::Config], json!({ "id": "7", "appName": "Demo" }));
    }

    #[test]
    fn test_build_packs_coerces_object_id() {
        let packs = build_packs(&bundle(json!({ "app": { "id": { "$oid": "65f0" } } })));
        assert_eq!(packs[&PackName::Config]["id"], json!("65f0"));
    }

    #[tokio::test]
    async fn test_write_packs_round_trip() {
        let ws = TempDir::new().unwrap();
        std::fs::write(ws.path().join(MANIFEST_FILE), PUBSPEC).unwrap();
        let b = bundle(json!({
            "app": { "id": "abc123", "appName": "Demo" },
            "design": { "theme": "dark" },
            "layout": { "tabs": [] },
            "screens": [{ "name": "home" }]
        }));

        let packs = write_packs(ws.path(), &b).await.unwrap();

        assert_eq!(packs.len(), 5);
        let expected = build_packs(&b);
        for (name, path) in &packs {
            assert_eq!(path, &ws.path().join(PACKS_DIR).join(name.file_name()));
            let written: JsonValue =
                serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(written, expected[name]);
        }
    }

    #[tokio::test]
    async fn test_write_packs_overwrites_previous_run() {
        let ws = TempDir::new().unwrap();
        std::fs::write(ws.path().join(MANIFEST_FILE), PUBSPEC).unwrap();

        write_packs(ws.path(), &bundle(json!({ "design": { "theme": "dark" } })))
            .await
            .unwrap();
        write_packs(ws.path(), &bundle(json!({ "design": { "theme": "light" } })))
            .await
            .unwrap();

        let text = std::fs::read_to_string(ws.path().join(PACKS_DIR).join("design_pack.json")).unwrap();
        assert!(text.contains("light"));
        assert!(!text.contains("dark"));
    }

    #[tokio::test]
    async fn test_missing_manifest_is_packaging_error() {
        let ws = TempDir::new().unwrap();
        let result = write_packs(ws.path(), &AppBundle::default()).await;
        assert!(matches!(result, Err(BuildError::Packaging(_))));
    }

    fn patch(text: &str) -> String {
        patch_manifest_text(text).unwrap().unwrap()
    }

    #[test]
    fn test_require_packs_rejects_empty_map() {
        let result = require_packs(BTreeMap::new());
        assert!(matches!(result, Err(BuildError::Packaging(_))));
    }

    #[test]
    fn test_patch_under_existing_assets() {
        let patched = patch(PUBSPEC);

        assert!(patched.contains(
            "  assets:\n    - assets/ota_packs/design_pack.json\n    - assets/ota_packs/layout_pack.json\n"
        ));
        assert!(patched.contains("    - assets/ota_packs/config_pack.json\n    - assets/images/\n"));
        assert!(patched.contains("dev_dependencies:\n  lints: ^3.0.0\n"));
    }

    #[test]
    fn test_patch_creates_assets_key() {
        let patched = patch("name: demo\nflutter:\n  uses-material-design: true\n");
        assert_eq!(
            patched,
            concat!(
                "name: demo\n",
                "flutter:\n",
                "  assets:\n",
                "    - assets/ota_packs/design_pack.json\n",
                "    - assets/ota_packs/layout_pack.json\n",
                "    - assets/ota_packs/screens_pack.json\n",
                "    - assets/ota_packs/onboarding_pack.json\n",
                "    - assets/ota_packs/config_pack.json\n",
                "  uses-material-design: true\n",
            )
        );
    }

    #[test]
    fn test_patch_ignores_nested_flutter_dependency() {
        let text = "name: demo\ndependencies:\n  flutter:\n    sdk: flutter\n";
        let patched = patch(text);
        assert!(patched.starts_with(text));
        assert!(patched.contains("\nflutter:\n  assets:\n    - assets/ota_packs/design_pack.json\n"));
    }

    #[test]
    fn test_patch_is_idempotent() {
        let once = patch(PUBSPEC);
        assert_eq!(patch_manifest_text(&once).unwrap(), None);

        let declarations = once.matches("assets/ota_packs/").count();
        assert_eq!(declarations, 5);
    }

    #[test]
    fn test_patch_follows_compact_item_indent() {
        let patched = patch("name: demo\nflutter:\n  assets:\n  - assets/images/\n");

        assert_eq!(
            patched,
            concat!(
                "name: demo\n",
                "flutter:\n",
                "  assets:\n",
                "  - assets/ota_packs/design_pack.json\n",
                "  - assets/ota_packs/layout_pack.json\n",
                "  - assets/ota_packs/screens_pack.json\n",
                "  - assets/ota_packs/onboarding_pack.json\n",
                "  - assets/ota_packs/config_pack.json\n",
                "  - assets/images/\n",
            )
        );
    }

    #[test]
    fn test_patch_follows_deep_item_indent_past_comment() {
        let patched = patch("flutter:\n  assets:\n    # images\n      - assets/images/\n");

        let indents: Vec<usize> = patched
            .lines()
            .filter(|l| l.trim_start().starts_with("- "))
            .map(indent_of)
            .collect();
        assert_eq!(indents, vec![6; 6]);
    }

    #[test]
    fn test_patch_expands_inline_assets_list() {
        let patched = patch("flutter:\n  assets: [assets/images/, \"assets/fonts/\"]\n");

        assert_eq!(patched.matches("assets:").count(), 1);
        assert!(patched.starts_with(
            "flutter:\n  assets:\n    - assets/ota_packs/design_pack.json\n"
        ));
        assert!(patched.ends_with(
            "    - assets/ota_packs/config_pack.json\n    - assets/images/\n    - \"assets/fonts/\"\n"
        ));
    }

    #[test]
    fn test_patch_expands_empty_inline_list() {
        let patched = patch("flutter:\n  assets: []\n");
        assert!(patched.starts_with("flutter:\n  assets:\n    - assets/ota_packs/"));
        assert_eq!(patched.matches("- ").count(), 5);
    }

    #[test]
    fn test_patch_rejects_scalar_assets_value() {
        let result = patch_manifest_text("flutter:\n  assets: assets/images/\n");
        assert!(matches!(result, Err(BuildError::Packaging(msg)) if msg.contains("assets/images/")));
    }

    #[tokio::test]
    async fn test_install_packs_requires_every_pack() {
        let ws = TempDir::new().unwrap();
        let pkg = TempDir::new().unwrap();
        std::fs::write(ws.path().join(MANIFEST_FILE), PUBSPEC).unwrap();
        std::fs::write(pkg.path().join("design_pack.json"), "{}").unwrap();

        let result = install_packs(pkg.path(), ws.path()).await;
        assert!(matches!(result, Err(BuildError::Packaging(msg)) if msg.contains("layout_pack.json")));
    }

    #[tokio::test]
    async fn test_install_packs_onto_itself_keeps_content() {
        let ws = TempDir::new().unwrap();
        std::fs::write(ws.path().join(MANIFEST_FILE), PUBSPEC).unwrap();
        let b = bundle(json!({ "design": { "theme": "dark" } }));
        write_packs(ws.path(), &b).await.unwrap();

        let packs_dir = ws.path().join(PACKS_DIR);
        install_packs(&packs_dir, ws.path()).await.unwrap();

        let text = std::fs::read_to_string(packs_dir.join("design_pack.json")).unwrap();
        assert!(text.contains("dark"));
    }
}
