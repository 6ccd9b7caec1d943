use crate::config::ScriptPaths;
use crate::error::ScriptLoadError;
use std::path::{Path, PathBuf};

/// One `.sql` file discovered under a script directory, named by convention
/// `NN_short_name.sql` so that lexical ordering of `name` matches execution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptFile {
    pub path: PathBuf,
    pub name: String,
}

/// The four ordered script lists spec.md §2/§4.1 requires the loader to expose.
#[derive(Clone, Debug, Default)]
pub struct LoadedScripts {
    pub functions: Vec<ScriptFile>,
    pub main_table_schemas: Vec<ScriptFile>,
    pub supplementary_table_schemas: Vec<ScriptFile>,
    pub main_feature_extraction: Vec<ScriptFile>,
    pub supplementary: Vec<ScriptFile>,
}

/// Pure, stateless enumerator of the four category directories. Performs no DB access.
pub struct ScriptLoader;

impl ScriptLoader {
    /// Scans all four directories named by `paths` and returns them as ordered lists.
    /// Within `schema_dir`, files are split into main-table vs. supplementary-table
    /// schemas by the `sup_` filename prefix convention (see DESIGN.md); everything
    /// else in that directory is a main-table schema script.
    pub fn load(paths: &ScriptPaths) -> Result<LoadedScripts, ScriptLoadError> {
        let schema_scripts = list_sql_files(&paths.schema_dir)?;
        let (supplementary_table_schemas, main_table_schemas): (Vec<_>, Vec<_>) = schema_scripts
            .into_iter()
            .partition(|f| f.name.trim_start_matches(|c: char| c.is_ascii_digit() || c == '_').starts_with("sup"));

        Ok(LoadedScripts {
            functions: list_sql_files(&paths.functions_dir)?,
            main_table_schemas,
            supplementary_table_schemas,
            main_feature_extraction: list_sql_files(&paths.scripts_main_dir)?,
            supplementary: list_sql_files(&paths.scripts_supplementary_dir)?,
        })
    }
}

fn list_sql_files(dir: &Path) -> Result<Vec<ScriptFile>, ScriptLoadError> {
    if !dir.is_dir() {
        return Err(ScriptLoadError::NotADirectory(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ScriptLoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScriptLoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        files.push(ScriptFile { path, name });
    }

    if files.is_empty() {
        return Err(ScriptLoadError::EmptyDirectory(dir.to_path_buf()));
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str) {
        fs::write(dir.join(name), "-- stub").unwrap();
    }

    #[test]
    fn lists_sql_files_in_lexical_order() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "02_second.sql");
        write(tmp.path(), "01_first.sql");
        write(tmp.path(), "readme.txt");

        let files = list_sql_files(tmp.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["01_first.sql", "02_second.sql"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = list_sql_files(tmp.path()).unwrap_err();
        assert!(matches!(err, ScriptLoadError::EmptyDirectory(_)));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = list_sql_files(Path::new("/does/not/exist")).unwrap_err();
        assert!(matches!(err, ScriptLoadError::NotADirectory(_)));
    }

    #[test]
    fn load_splits_schema_scripts_by_sup_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let functions = tmp.path().join("functions");
        let schema = tmp.path().join("schema");
        let main = tmp.path().join("scripts/main");
        let supplementary = tmp.path().join("scripts/supplementary");
        for d in [&functions, &schema, &main, &supplementary] {
            fs::create_dir_all(d).unwrap();
        }
        write(&functions, "01_fn.sql");
        write(&schema, "01_building.sql");
        write(&schema, "02_sup_tabula.sql");
        write(&main, "01_harvest.sql");
        write(&supplementary, "01_import_tabula.sql");

        let paths = ScriptPaths {
            functions_dir: functions,
            schema_dir: schema,
            scripts_main_dir: main,
            scripts_supplementary_dir: supplementary,
        };
        let loaded = ScriptLoader::load(&paths).unwrap();
        assert_eq!(loaded.main_table_schemas.len(), 1);
        assert_eq!(loaded.supplementary_table_schemas.len(), 1);
        assert_eq!(loaded.supplementary_table_schemas[0].name, "02_sup_tabula.sql");
    }
}
