use super::{describe_error, json_pretty, EXIT_SUCCESS};
use deckhand_core::{artifact_paths, Builder, CoreError};
use deckhand_schema::BundleName;

pub fn run(builder: &Builder, bundle: &str, json: bool) -> Result<u8, String> {
    let bundle = BundleName::new(bundle);
    let meta = builder
        .load_meta(&bundle)
        .map_err(|e| describe_error(&e))?;
    let checked = artifact_paths(&meta).len();

    match builder.validate_packages(&meta) {
        Ok(()) => {
            if json {
                let payload = serde_json::json!({
                    "bundle": bundle,
                    "packages": checked,
                    "missing": [],
                    "status": "valid"
                });
                println!("{}", json_pretty(&payload)?);
            } else {
                println!("bundle '{bundle}': all {checked} deployment packages present");
            }
            Ok(EXIT_SUCCESS)
        }
        Err(CoreError::MissingPackages(missing)) if json => {
            let payload = serde_json::json!({
                "bundle": bundle,
                "packages": checked,
                "missing": missing,
                "status": "invalid"
            });
            println!("{}", json_pretty(&payload)?);
            Err(format!(
                "{} deployment package(s) missing from bundle '{bundle}'",
                missing.len()
            ))
        }
        Err(e) => Err(describe_error(&e)),
    }
}
