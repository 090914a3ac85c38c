//! ESPAsyncWebServer backend
//!
//! Arrays live in PROGMEM and the response is constructed with
//! `beginResponse_P`, which also fixes the served array, so the gzip guard
//! wraps the construction line rather than the send.

use webkiln_core::Config;

use super::{
    EngineBackend, RoutePlan, cache_control_value, guarded, gzip_array_name, hook_call,
    raw_array_name,
};
use crate::asset::Asset;
use crate::registry::AssetRegistry;

pub(crate) struct AsyncWs;

impl EngineBackend for AsyncWs {
    fn includes(&self) -> &'static [&'static str] {
        &["Arduino.h", "ESPAsyncWebServer.h"]
    }

    fn array_decl(&self, name: &str, len: usize) -> String {
        format!("const uint8_t {name}[{len}] PROGMEM")
    }

    fn emit_routes(
        &self,
        out: &mut String,
        registry: &AssetRegistry,
        plan: &RoutePlan,
        config: &Config,
    ) {
        out.push_str(&format!(
            "void {}(AsyncWebServer * server) {{\n",
            config.init_fn
        ));
        for asset in &registry.assets {
            let route = config.route_path(&asset.path);
            emit_handler(out, asset, &route, config);
        }
        for &index in &plan.bare {
            emit_handler(out, &registry.assets[index], config.bare_path(), config);
        }
        out.push_str("}\n");
    }
}

fn emit_handler(out: &mut String, asset: &Asset, route: &str, config: &Config) {
    let etag_macro = format!("{}_ENABLE_ETAG", config.prefix);
    let gzip_macro = format!("{}_ENABLE_GZIP", config.prefix);

    out.push_str(&format!(
        "  server->on(\"{route}\", HTTP_GET, [](AsyncWebServerRequest * request) {{\n"
    ));

    let mut etag_branch = String::new();
    etag_branch.push_str(&format!(
        "    if (request->hasHeader(\"If-None-Match\") && request->getHeader(\"If-None-Match\")->value() == String(etag_{})) {{\n",
        asset.identifier
    ));
    etag_branch.push_str("      AsyncWebServerResponse * response304 = request->beginResponse(304);\n");
    etag_branch.push_str(&hook_call("      ", &config.prefix, route, 304));
    etag_branch.push_str("      request->send(response304);\n");
    etag_branch.push_str("      return;\n");
    etag_branch.push_str("    }\n");
    out.push_str(&guarded(config.etag, &etag_macro, &etag_branch, ""));

    let begin_stored = format!(
        "    AsyncWebServerResponse * response = request->beginResponse_P(200, \"{}\", {}, {});\n",
        asset.mime,
        gzip_array_name(asset),
        asset.stored().len()
    );
    let begin_raw = format!(
        "    AsyncWebServerResponse * response = request->beginResponse_P(200, \"{}\", {}, {});\n",
        asset.mime,
        raw_array_name(asset),
        asset.raw.len()
    );
    out.push_str(&guarded(config.gzip, &gzip_macro, &begin_stored, &begin_raw));

    if asset.uses_compression {
        out.push_str(&guarded(
            config.gzip,
            &gzip_macro,
            "    response->addHeader(\"Content-Encoding\", \"gzip\");\n",
            "",
        ));
    }

    let mut cache_headers = String::new();
    cache_headers.push_str(&format!(
        "    response->addHeader(\"Cache-Control\", \"{}\");\n",
        cache_control_value(config.cache_time)
    ));
    cache_headers.push_str(&format!(
        "    response->addHeader(\"ETag\", etag_{});\n",
        asset.identifier
    ));
    out.push_str(&guarded(config.etag, &etag_macro, &cache_headers, ""));
    out.push_str(&hook_call("    ", &config.prefix, route, 200));
    out.push_str("    request->send(response);\n");
    out.push_str("  });\n");
}
