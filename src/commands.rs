//! Script template loading and command batch generation.
//!
//! Two externally supplied script assets drive the import: a global setup
//! script (no placeholders, sent once per connection) and a per-group script
//! template with four named placeholders. Both are opaque foreign-language
//! text; the generator only substitutes placeholders and escapes values for
//! embedding in the target language's string literals. It never parses or
//! validates the scripts themselves.

use crate::classify::FileGroup;
use crate::error::{AppResult, ImporterError};
use std::collections::HashMap;
use std::path::Path;

/// Filename of the global setup script inside the scripts directory.
pub const GLOBAL_SETUP_SCRIPT_FILE: &str = "fmod_global_setup.js";

/// Filename of the per-group script template inside the scripts directory.
pub const IMPORT_GROUP_TEMPLATE_FILE: &str = "fmod_import_group.js.template";

/// One-line command registering a single audio file as a project asset.
const ASSET_IMPORT_COMMAND: &str = "studio.project.importAudioFile('{path}');";

const PLACEHOLDER_EVENT_NAME: &str = "{EVENT_NAME}";
const PLACEHOLDER_FOLDER_PATH: &str = "{RELATIVE_FOLDER_PATH}";
const PLACEHOLDER_FILE_PATHS_JSON: &str = "{FILE_PATHS_JSON}";
const PLACEHOLDER_INSTRUMENT_TYPE: &str = "{INSTRUMENT_TYPE}";

/// The two script assets, read once and held in memory.
#[derive(Debug, Clone)]
pub struct ScriptTemplates {
    pub global_setup: String,
    group_template: String,
}

impl ScriptTemplates {
    /// Reads both script assets from `dir`. A missing or unreadable file is a
    /// fatal precondition for importing; no partial load is kept.
    pub fn load(dir: &Path) -> AppResult<Self> {
        let global_path = dir.join(GLOBAL_SETUP_SCRIPT_FILE);
        let template_path = dir.join(IMPORT_GROUP_TEMPLATE_FILE);

        if !global_path.is_file() {
            return Err(ImporterError::TemplateMissing(global_path));
        }
        if !template_path.is_file() {
            return Err(ImporterError::TemplateMissing(template_path));
        }

        let global_setup = std::fs::read_to_string(&global_path)?;
        let group_template = std::fs::read_to_string(&template_path)?;
        log::info!(
            "Loaded script templates from '{}'",
            dir.display()
        );

        Ok(Self {
            global_setup,
            group_template,
        })
    }

    /// Builds templates from in-memory strings.
    pub fn from_parts(global_setup: impl Into<String>, group_template: impl Into<String>) -> Self {
        Self {
            global_setup: global_setup.into(),
            group_template: group_template.into(),
        }
    }
}

/// Escapes a value for embedding in a single-quoted script string literal.
///
/// Backslash, single quote, LF, and CR are escaped; the result contains no
/// unescaped instance of any of them.
pub fn escape_script_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Forward-slash-normalized rendition of a path for the console.
pub fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Expands the group set into the transmission batch: one asset-import
/// command per file (group order, then within-group file order) followed by
/// one instantiated script per group. Asset imports must precede the group
/// scripts because each script references its assets by path.
pub fn generate_commands(
    groups: &[FileGroup],
    templates: &ScriptTemplates,
) -> AppResult<Vec<String>> {
    let mut batch = Vec::new();

    for group in groups {
        for file_path in &group.file_paths {
            batch.push(asset_import_command(file_path)?);
        }
    }

    for group in groups {
        batch.push(render_group_script(&templates.group_template, group)?);
    }

    log::info!("Generated {} command block(s)", batch.len());
    Ok(batch)
}

fn asset_import_command(file_path: &Path) -> AppResult<String> {
    let mut vars = HashMap::new();
    vars.insert(
        "path".to_string(),
        escape_script_string(&forward_slashes(file_path)),
    );
    strfmt::strfmt(ASSET_IMPORT_COMMAND, &vars)
        .map_err(|e| ImporterError::CommandRender(e.to_string()))
}

/// Instantiates the group template and appends the save/completion trailer.
///
/// The template is opaque script text that may itself contain `{}` braces,
/// so placeholders are substituted literally instead of through a format
/// engine.
fn render_group_script(template: &str, group: &FileGroup) -> AppResult<String> {
    let event_name = escape_script_string(&group.base_name);
    let folder_path = escape_script_string(
        group
            .relative_folder_path
            .replace('\\', "/")
            .trim_matches('/'),
    );

    let file_paths: Vec<String> = group
        .file_paths
        .iter()
        .map(|p| forward_slashes(p))
        .collect();
    let file_paths_json = escape_script_string(&serde_json::to_string(&file_paths)?);

    let mut script = template
        .replace(PLACEHOLDER_EVENT_NAME, &event_name)
        .replace(PLACEHOLDER_FOLDER_PATH, &folder_path)
        .replace(PLACEHOLDER_FILE_PATHS_JSON, &file_paths_json)
        .replace(PLACEHOLDER_INSTRUMENT_TYPE, group.instrument_type.as_str());

    // Persist the project and emit a console-visible completion marker after
    // each group.
    script.push_str(&format!(
        "\nstudio.project.save();\nstudio.system.print('[IMPORTER_LOG] Project saved after processing group \"' + '{}' + '/' + '{}' + '\".');",
        folder_path, event_name
    ));

    Ok(script)
}
