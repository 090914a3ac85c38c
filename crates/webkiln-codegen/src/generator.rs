//! Generated-source assembly
//!
//! Every engine-independent section lives here, in emission order: header
//! comment, toggle advisories, defines, file and extension markers,
//! includes, data arrays, etag constants, the file manifest, the hook
//! declaration and finally the engine route section. The result is passed
//! through [`crate::postprocess::clean`].

use webkiln_core::{Config, TriState};

use crate::engines::{self, EngineBackend, guarded, gzip_array_name, raw_array_name};
use crate::postprocess;
use crate::registry::AssetRegistry;

/// Render the complete generated source for one asset set
///
/// `created_at` carries the pre-formatted timestamp line value when the
/// configuration asks for one; rendering itself never consults a clock, so
/// equal inputs produce byte-identical output.
pub fn render(registry: &AssetRegistry, config: &Config, created_at: Option<&str>) -> String {
    let backend = engines::backend_for(config.engine);
    let plan = engines::plan_default_routes(
        registry,
        backend.has_default_slot(),
        !config.base_path.is_empty(),
    );

    let mut out = String::new();
    emit_header(&mut out, config, created_at);
    emit_toggle_advisories(&mut out, config);
    emit_defines(&mut out, registry, config);
    emit_file_markers(&mut out, registry, config);
    emit_extension_counts(&mut out, registry, config);
    emit_includes(&mut out, backend);
    emit_data_arrays(&mut out, registry, config, backend);
    emit_etag_constants(&mut out, registry, config);
    emit_manifest(&mut out, registry, config);
    out.push_str(&backend.hook_declaration(&config.prefix));
    out.push('\n');
    backend.emit_routes(&mut out, registry, &plan, config);

    postprocess::clean(&out)
}

/// Number of routes the generated init function registers
///
/// One per asset plus one per extra bare-path default registration. Engines
/// with a handler table cap need this for their sizing configuration.
pub fn route_count(registry: &AssetRegistry, config: &Config) -> usize {
    let backend = engines::backend_for(config.engine);
    let plan = engines::plan_default_routes(
        registry,
        backend.has_default_slot(),
        !config.base_path.is_empty(),
    );
    registry.assets.len() + plan.bare.len()
}

fn emit_header(out: &mut String, config: &Config, created_at: Option<&str>) {
    out.push_str(&format!("//engine:   {}\n", config.engine.token()));
    out.push_str(&format!("//config:   {}\n", config.summary()));
    if let Some(timestamp) = created_at {
        out.push_str(&format!("//created:  {timestamp}\n"));
    }
    out.push_str("//\n");
}

/// Point out defines that cannot take effect because the matching toggle is
/// not in the compiler state
fn emit_toggle_advisories(out: &mut String, config: &Config) {
    for (state, feature) in [(config.etag, "ETAG"), (config.gzip, "GZIP")] {
        let switched = match state {
            TriState::On => "ON",
            TriState::Off => "OFF",
            TriState::Compiler => continue,
        };
        let macro_name = format!("{}_ENABLE_{}", config.prefix, feature);
        out.push_str(&format!("#ifdef {macro_name}\n"));
        out.push_str(&format!(
            "#warning {macro_name} has no effect because it is permanently switched {switched}\n"
        ));
        out.push_str("#endif\n\n");
    }
}

fn emit_defines(out: &mut String, registry: &AssetRegistry, config: &Config) {
    if !config.app_version.is_empty() {
        out.push_str(&format!(
            "#define {}_VERSION \"{}\"\n",
            config.prefix, config.app_version
        ));
    }
    out.push_str(&format!(
        "#define {}_COUNT {}\n",
        config.prefix, registry.totals.file_count
    ));
    out.push_str(&format!(
        "#define {}_SIZE {}\n",
        config.prefix, registry.totals.raw_total
    ));
    out.push_str(&format!(
        "#define {}_SIZE_GZIP {}\n\n",
        config.prefix, registry.totals.gzip_total
    ));
}

fn emit_file_markers(out: &mut String, registry: &AssetRegistry, config: &Config) {
    for asset in &registry.assets {
        out.push_str(&format!(
            "#define {}_FILE_{}\n",
            config.prefix,
            asset.identifier_upper()
        ));
    }
    out.push('\n');
}

fn emit_extension_counts(out: &mut String, registry: &AssetRegistry, config: &Config) {
    for group in &registry.extension_groups {
        out.push_str(&format!(
            "#define {}_{}_FILES {}\n",
            config.prefix, group.extension, group.count
        ));
    }
    out.push('\n');
}

fn emit_includes(out: &mut String, backend: &dyn EngineBackend) {
    for header in backend.includes() {
        out.push_str(&format!("#include <{header}>\n"));
    }
    out.push('\n');
}

/// Byte arrays under the gzip toggle: the `datagzip_` set holds the served
/// representation, the `data_` set always holds raw bytes
fn emit_data_arrays(
    out: &mut String,
    registry: &AssetRegistry,
    config: &Config,
    backend: &dyn EngineBackend,
) {
    let gzip_macro = format!("{}_ENABLE_GZIP", config.prefix);
    let mut stored_arrays = String::new();
    let mut raw_arrays = String::new();
    for asset in &registry.assets {
        stored_arrays.push_str(&format!(
            "{} = {{ {} }};\n",
            backend.array_decl(&gzip_array_name(asset), asset.stored().len()),
            byte_list(asset.stored())
        ));
        raw_arrays.push_str(&format!(
            "{} = {{ {} }};\n",
            backend.array_decl(&raw_array_name(asset), asset.raw.len()),
            byte_list(&asset.raw)
        ));
    }
    out.push_str(&guarded(
        config.gzip,
        &gzip_macro,
        &stored_arrays,
        &raw_arrays,
    ));
    out.push('\n');
}

fn emit_etag_constants(out: &mut String, registry: &AssetRegistry, config: &Config) {
    let etag_macro = format!("{}_ENABLE_ETAG", config.prefix);
    let mut constants = String::new();
    for asset in &registry.assets {
        constants.push_str(&format!(
            "const char * etag_{} = \"{}\";\n",
            asset.identifier, asset.etag
        ));
    }
    out.push_str(&guarded(config.etag, &etag_macro, &constants, ""));
    out.push('\n');
}

fn emit_manifest(out: &mut String, registry: &AssetRegistry, config: &Config) {
    let etag_macro = format!("{}_ENABLE_ETAG", config.prefix);

    out.push_str("typedef struct {\n");
    out.push_str("    const char* path;\n");
    out.push_str("    uint32_t size;\n");
    out.push_str("    uint32_t gzipSize;\n");
    out.push_str("    const char* etag;\n");
    out.push_str("    const char* contentType;\n");
    out.push_str(&format!("}} {}_FileInfo;\n\n", config.prefix));

    out.push_str(&format!(
        "static const {}_FileInfo {}_FILES[] = {{\n",
        config.prefix, config.prefix
    ));
    for asset in &registry.assets {
        let route = config.route_path(&asset.path);
        let gzip_size = if asset.uses_compression {
            asset.compressed.len()
        } else {
            0
        };
        let entry = |etag_expr: &str| {
            format!(
                "    {{ \"{}\", {}, {}, {}, \"{}\" }},\n",
                route,
                asset.raw.len(),
                gzip_size,
                etag_expr,
                asset.mime
            )
        };
        let with_etag = entry(&format!("etag_{}", asset.identifier));
        let without_etag = entry("NULL");
        out.push_str(&guarded(config.etag, &etag_macro, &with_etag, &without_etag));
    }
    out.push_str("};\n");
    out.push_str(&format!(
        "static const size_t {}_FILE_COUNT = {};\n\n",
        config.prefix,
        registry.totals.file_count
    ));
}

fn byte_list(data: &[u8]) -> String {
    data.iter()
        .map(|byte| byte.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
