use anyhow::Result;
use octofhir_search::SearchParameterRegistry;

use crate::output::print_manifest;

pub fn params(registry: &SearchParameterRegistry, resource_type: &str) -> Result<()> {
    let manifest = registry.get_manifest_by_name(resource_type)?;
    print_manifest(&manifest);
    Ok(())
}
