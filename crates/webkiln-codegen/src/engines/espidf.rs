//! ESP-IDF httpd backend
//!
//! Plain C output: named handler functions and `httpd_uri_t` tables instead
//! of lambdas, `malloc`/`free` for reading the If-None-Match header, and a
//! hook declaration without the C++ linkage wrapper.

use webkiln_core::Config;

use super::{
    EngineBackend, RoutePlan, cache_control_value, guarded, gzip_array_name, hook_call,
    raw_array_name,
};
use crate::asset::Asset;
use crate::registry::AssetRegistry;

pub(crate) struct EspIdf;

impl EngineBackend for EspIdf {
    fn includes(&self) -> &'static [&'static str] {
        &[
            "stdint.h",
            "string.h",
            "stdlib.h",
            "esp_err.h",
            "esp_http_server.h",
        ]
    }

    fn array_decl(&self, name: &str, len: usize) -> String {
        format!("const unsigned char {name}[{len}]")
    }

    fn hook_declaration(&self, prefix: &str) -> String {
        format!(
            "__attribute__((weak)) void {prefix}_onFileServed(const char* path, int statusCode) {{}}\n"
        )
    }

    fn emit_routes(
        &self,
        out: &mut String,
        registry: &AssetRegistry,
        plan: &RoutePlan,
        config: &Config,
    ) {
        for (index, asset) in registry.assets.iter().enumerate() {
            emit_handler_fn(out, asset, config);
            out.push('\n');
            if plan.bare.contains(&index) {
                emit_route_struct(out, asset, "route_def_", config.bare_path());
                out.push('\n');
            }
            emit_route_struct(out, asset, "route_", &config.route_path(&asset.path));
            out.push('\n');
        }

        out.push_str(&format!(
            "static inline void {}(httpd_handle_t server) {{\n",
            config.init_fn
        ));
        for (index, asset) in registry.assets.iter().enumerate() {
            if plan.bare.contains(&index) {
                out.push_str(&format!(
                    "    httpd_register_uri_handler(server, &route_def_{});\n",
                    asset.identifier_upper()
                ));
            }
            out.push_str(&format!(
                "    httpd_register_uri_handler(server, &route_{});\n",
                asset.identifier_upper()
            ));
        }
        out.push_str("}\n");
    }
}

fn emit_handler_fn(out: &mut String, asset: &Asset, config: &Config) {
    let etag_macro = format!("{}_ENABLE_ETAG", config.prefix);
    let gzip_macro = format!("{}_ENABLE_GZIP", config.prefix);
    let route = config.route_path(&asset.path);

    out.push_str(&format!(
        "static esp_err_t file_handler_{} (httpd_req_t *req)\n{{\n",
        asset.identifier_upper()
    ));

    let mut etag_branch = String::new();
    etag_branch
        .push_str("    size_t hdr_len = httpd_req_get_hdr_value_len(req, \"If-None-Match\");\n");
    etag_branch.push_str("    if (hdr_len > 0) {\n");
    etag_branch.push_str("        char* hdr_value = malloc(hdr_len + 1);\n");
    etag_branch.push_str("        if (hdr_value != NULL) {\n");
    etag_branch.push_str(
        "            if (httpd_req_get_hdr_value_str(req, \"If-None-Match\", hdr_value, hdr_len + 1) == ESP_OK) {\n",
    );
    etag_branch.push_str(&format!(
        "                if (strcmp(hdr_value, etag_{}) == 0) {{\n",
        asset.identifier
    ));
    etag_branch.push_str("                    free(hdr_value);\n");
    etag_branch.push_str("                    httpd_resp_set_status(req, \"304 Not Modified\");\n");
    etag_branch.push_str(&hook_call("                    ", &config.prefix, &route, 304));
    etag_branch.push_str("                    httpd_resp_send(req, NULL, 0);\n");
    etag_branch.push_str("                    return ESP_OK;\n");
    etag_branch.push_str("                }\n");
    etag_branch.push_str("            }\n");
    etag_branch.push_str("            free(hdr_value);\n");
    etag_branch.push_str("        }\n");
    etag_branch.push_str("    }\n");
    out.push_str(&guarded(config.etag, &etag_macro, &etag_branch, ""));

    out.push_str(&format!(
        "    httpd_resp_set_type(req, \"{}\");\n",
        asset.mime
    ));
    if asset.uses_compression {
        out.push_str(&guarded(
            config.gzip,
            &gzip_macro,
            "    httpd_resp_set_hdr(req, \"Content-Encoding\", \"gzip\");\n",
            "",
        ));
    }

    let mut cache_headers = String::new();
    cache_headers.push_str(&format!(
        "    httpd_resp_set_hdr(req, \"Cache-Control\", \"{}\");\n",
        cache_control_value(config.cache_time)
    ));
    cache_headers.push_str(&format!(
        "    httpd_resp_set_hdr(req, \"ETag\", etag_{});\n",
        asset.identifier
    ));
    out.push_str(&guarded(config.etag, &etag_macro, &cache_headers, ""));
    out.push_str(&hook_call("    ", &config.prefix, &route, 200));

    let send_stored = format!(
        "    httpd_resp_send(req, (const char *){}, {});\n",
        gzip_array_name(asset),
        asset.stored().len()
    );
    let send_raw = format!(
        "    httpd_resp_send(req, (const char *){}, {});\n",
        raw_array_name(asset),
        asset.raw.len()
    );
    out.push_str(&guarded(config.gzip, &gzip_macro, &send_stored, &send_raw));
    out.push_str("    return ESP_OK;\n}\n");
}

fn emit_route_struct(out: &mut String, asset: &Asset, name_prefix: &str, uri: &str) {
    out.push_str(&format!(
        "static const httpd_uri_t {}{} = {{\n",
        name_prefix,
        asset.identifier_upper()
    ));
    out.push_str(&format!("    .uri = \"{uri}\",\n"));
    out.push_str("    .method = HTTP_GET,\n");
    out.push_str(&format!(
        "    .handler = file_handler_{},\n",
        asset.identifier_upper()
    ));
    out.push_str("    .user_ctx = NULL\n};\n");
}
