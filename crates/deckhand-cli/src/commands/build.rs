use super::{
    describe_error, json_pretty, print_summary, spin_fail, spin_ok, spinner, type_summary,
    EXIT_SUCCESS,
};
use deckhand_core::Builder;
use deckhand_schema::BundleName;

pub fn run(builder: &Builder, bundle: &str, json: bool) -> Result<u8, String> {
    let bundle = BundleName::new(bundle);

    let pb = if json {
        None
    } else {
        Some(spinner("assembling build meta..."))
    };

    let result = match builder.create_meta(&bundle) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "build meta assembled");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "build meta failed");
            }
            return Err(describe_error(&e));
        }
    };

    if json {
        let payload = serde_json::json!({
            "bundle": bundle,
            "meta_path": result.meta_path,
            "resources": result.manifest.len(),
            "types": type_summary(&result.manifest),
            "status": "built"
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "built meta for bundle '{bundle}' ({} resources)",
            result.manifest.len()
        );
        println!("meta: {}", result.meta_path.display());
        print_summary(&result.manifest);
    }
    Ok(EXIT_SUCCESS)
}
