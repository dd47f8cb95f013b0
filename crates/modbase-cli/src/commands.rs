//! Command execution: module directory loading and the install/update flow.

use crate::{Args, Command};
use modbase_core::{
    EntityDeclaration, EntityRegistry, Error, LoadMode, MemoryBackend, MenuItem, MetadataFile,
    Module, ModuleLoader, ModuleManifest, UiRegistry,
};
use std::path::Path;
use tracing::info;

/// Execute the parsed command line.
pub fn run(args: &Args) -> Result<(), Error> {
    let (names, mode) = match &args.command {
        Command::Install { modules } => (modules, LoadMode::Install),
        Command::Update { modules } => (modules, LoadMode::Update),
    };

    if args.database != "memory" {
        return Err(Error::Storage(format!(
            "unknown database profile '{}'",
            args.database
        )));
    }
    let modules = load_modules(&args.modules_dir, names)?;

    let backend = MemoryBackend::new();
    let registry = EntityRegistry::new();
    let mut ui = UiRegistry::new();
    let mut loader = ModuleLoader::new(&backend, &registry, &mut ui)?;
    let report = loader.load(&modules, mode)?;
    drop(loader);

    for name in &report.modules {
        println!("{name}: initialized");
    }
    println!("{} entities registered", registry.len());
    if !ui.is_empty() {
        println!("menu tree:");
        for root in ui.roots() {
            print_item(&ui, root, 1);
        }
    }
    Ok(())
}

fn print_item(ui: &UiRegistry, item: &MenuItem, depth: usize) {
    let indent = "  ".repeat(depth);
    match &item.action {
        Some(action) => println!("{indent}{} -> {action}", item.name),
        None => println!("{indent}{}", item.name),
    }
    for child in ui.children(&item.id) {
        print_item(ui, child, depth + 1);
    }
}

/// Read each named module from `<dir>/<name>/`.
///
/// A module directory holds `module.json` (the manifest), an optional
/// `entities.json`, and the metadata files the manifest lists, which
/// are parsed in listed order.
pub fn load_modules(dir: &Path, names: &[String]) -> Result<Vec<Module>, Error> {
    let mut modules = Vec::with_capacity(names.len());
    for name in names {
        let root = dir.join(name);
        let manifest: ModuleManifest =
            serde_json::from_str(&std::fs::read_to_string(root.join("module.json"))?)?;

        let entities_path = root.join("entities.json");
        let entities = if entities_path.exists() {
            EntityDeclaration::parse_file(&std::fs::read_to_string(entities_path)?)?
        } else {
            Vec::new()
        };

        let mut metadata = Vec::with_capacity(manifest.data.len());
        for file in &manifest.data {
            metadata.push(MetadataFile::parse(&std::fs::read_to_string(
                root.join(file),
            )?)?);
        }

        info!(module = %name, files = manifest.data.len(), "read module");
        modules.push(Module::from_manifest(name, manifest, entities, metadata));
    }
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_library_module(dir: &Path) {
        let root = dir.join("library");
        fs::create_dir_all(root.join("views")).unwrap();
        fs::write(
            root.join("module.json"),
            r#"{"version": "1.0", "depends": [], "data": ["views/menus.json"]}"#,
        )
        .unwrap();
        fs::write(
            root.join("entities.json"),
            r#"[{"name": "library.book",
                 "fields": [{"name": "title", "kind": "char", "required": true}]}]"#,
        )
        .unwrap();
        fs::write(
            root.join("views/menus.json"),
            r#"{"records": [
                {"record": "action", "id": "act_books", "name": "Books",
                 "target_entity": "library.book"},
                {"record": "menuitem", "id": "menu_library", "name": "Library"},
                {"record": "menuitem", "id": "menu_books", "name": "Books",
                 "parent": "menu_library", "action": "act_books"}
            ]}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_modules_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_library_module(dir.path());

        let modules = load_modules(dir.path(), &["library".to_string()]).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].version, "1.0");
        assert_eq!(modules[0].entities.len(), 1);
        assert_eq!(modules[0].metadata.len(), 1);
        assert_eq!(modules[0].metadata[0].records.len(), 3);
    }

    #[test]
    fn test_missing_manifest_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_modules(dir.path(), &["ghost".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_install_flow_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_library_module(dir.path());
        let modules = load_modules(dir.path(), &["library".to_string()]).unwrap();

        let backend = MemoryBackend::new();
        let registry = EntityRegistry::new();
        let mut ui = UiRegistry::new();
        let mut loader = ModuleLoader::new(&backend, &registry, &mut ui).unwrap();
        let report = loader.load(&modules, LoadMode::Install).unwrap();
        drop(loader);

        assert_eq!(report.modules, vec!["library"]);
        assert!(registry.contains("library.book"));
        assert_eq!(ui.roots()[0].id, "menu_library");
    }
}
