//! PsychicHttp v1 backend

use webkiln_core::Config;

use super::{
    EngineBackend, RoutePlan, cache_control_value, guarded, gzip_array_name, hook_call,
    raw_array_name,
};
use crate::asset::Asset;
use crate::registry::AssetRegistry;

pub(crate) struct Psychic;

impl EngineBackend for Psychic {
    fn includes(&self) -> &'static [&'static str] {
        &["PsychicHttp.h"]
    }

    fn has_default_slot(&self) -> bool {
        true
    }

    fn emit_routes(
        &self,
        out: &mut String,
        registry: &AssetRegistry,
        plan: &RoutePlan,
        config: &Config,
    ) {
        out.push_str(&format!(
            "void {}(PsychicHttpServer * server) {{\n",
            config.init_fn
        ));
        for (index, asset) in registry.assets.iter().enumerate() {
            let route = config.route_path(&asset.path);
            emit_handler(out, asset, &route, plan.slot == Some(index), config);
        }
        for &index in &plan.bare {
            emit_handler(out, &registry.assets[index], config.bare_path(), false, config);
        }
        out.push_str("}\n");
    }
}

fn emit_handler(out: &mut String, asset: &Asset, route: &str, default_slot: bool, config: &Config) {
    let etag_macro = format!("{}_ENABLE_ETAG", config.prefix);
    let gzip_macro = format!("{}_ENABLE_GZIP", config.prefix);

    let register = if default_slot {
        "  server->defaultEndpoint = server->on("
    } else {
        "  server->on("
    };
    out.push_str(&format!(
        "{register}\"{route}\", HTTP_GET, [](PsychicRequest * request) {{\n"
    ));

    let mut etag_branch = String::new();
    etag_branch.push_str(&format!(
        "    if (request->hasHeader(\"If-None-Match\") && request->header(\"If-None-Match\") == String(etag_{})) {{\n",
        asset.identifier
    ));
    etag_branch.push_str("      PsychicResponse response304(request);\n");
    etag_branch.push_str("      response304.setCode(304);\n");
    etag_branch.push_str(&hook_call("      ", &config.prefix, route, 304));
    etag_branch.push_str("      return response304.send();\n");
    etag_branch.push_str("    }\n");
    out.push_str(&guarded(config.etag, &etag_macro, &etag_branch, ""));

    out.push_str("    PsychicResponse response(request);\n");
    out.push_str(&format!(
        "    response.setContentType(\"{}\");\n",
        asset.mime
    ));
    if asset.uses_compression {
        out.push_str(&guarded(
            config.gzip,
            &gzip_macro,
            "    response.addHeader(\"Content-Encoding\", \"gzip\");\n",
            "",
        ));
    }

    let mut cache_headers = String::new();
    cache_headers.push_str(&format!(
        "    response.addHeader(\"Cache-Control\", \"{}\");\n",
        cache_control_value(config.cache_time)
    ));
    cache_headers.push_str(&format!(
        "    response.addHeader(\"ETag\", etag_{});\n",
        asset.identifier
    ));
    out.push_str(&guarded(config.etag, &etag_macro, &cache_headers, ""));
    out.push_str(&hook_call("    ", &config.prefix, route, 200));

    let send_stored = format!(
        "    response.setContent({}, {});\n",
        gzip_array_name(asset),
        asset.stored().len()
    );
    let send_raw = format!(
        "    response.setContent({}, {});\n",
        raw_array_name(asset),
        asset.raw.len()
    );
    out.push_str(&guarded(config.gzip, &gzip_macro, &send_stored, &send_raw));
    out.push_str("    return response.send();\n");
    out.push_str("  });\n");
}
