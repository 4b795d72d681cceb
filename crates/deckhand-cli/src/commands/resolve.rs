use super::{describe_error, json_pretty, EXIT_SUCCESS};
use deckhand_core::Builder;
use deckhand_schema::BundleName;
use std::io::Write;
use std::path::Path;

pub fn run(
    builder: &Builder,
    bundle: &str,
    output: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let bundle = BundleName::new(bundle);
    let meta = builder
        .load_meta(&bundle)
        .map_err(|e| describe_error(&e))?;
    let resolved = builder
        .resolve_meta(meta)
        .map_err(|e| describe_error(&e))?;
    let rendered = resolved
        .to_json_pretty()
        .map_err(|e| format!("failed to render resolved meta: {e}"))?;

    let Some(path) = output else {
        println!("{rendered}");
        return Ok(EXIT_SUCCESS);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| format!("failed to create temp file in {}: {e}", dir.display()))?;
    tmp.write_all(rendered.as_bytes())
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| format!("failed to persist {}: {}", path.display(), e.error))?;

    if json {
        let payload = serde_json::json!({
            "bundle": bundle,
            "output": path,
            "resources": resolved.len(),
            "status": "resolved"
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "wrote resolved meta for bundle '{bundle}' to {} ({} resources)",
            path.display(),
            resolved.len()
        );
    }
    Ok(EXIT_SUCCESS)
}
