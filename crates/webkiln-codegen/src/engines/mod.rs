//! Engine backends
//!
//! One backend per supported embedded HTTP server API. The generator owns
//! every engine-independent section; a backend contributes the include set,
//! the array declaration shape, the hook declaration and the route section
//! built from the shared [`RoutePlan`].

pub(crate) mod asyncws;
pub(crate) mod espidf;
pub(crate) mod psychic;
pub(crate) mod psychic2;

use webkiln_core::{Config, Engine, TriState};

use crate::asset::Asset;
use crate::registry::AssetRegistry;

/// Per-engine emission surface
///
/// Route handlers differ in every API call, so each backend writes its own
/// handler bodies, but all of them follow the same step order: etag
/// short-circuit, content type, content encoding, cache headers, hook call,
/// body send.
pub(crate) trait EngineBackend {
    /// Header files the generated source includes
    fn includes(&self) -> &'static [&'static str];

    /// Byte-array declaration without initializer, e.g.
    /// `const uint8_t data_index_html[13]`
    fn array_decl(&self, name: &str, len: usize) -> String {
        format!("const uint8_t {name}[{len}]")
    }

    /// Weak no-op declaration of the observability hook
    fn hook_declaration(&self, prefix: &str) -> String {
        format!(
            "extern \"C\" void __attribute__((weak)) {prefix}_onFileServed(const char* path, int statusCode) {{}}\n"
        )
    }

    /// Whether the server API has an engine-level default endpoint slot
    fn has_default_slot(&self) -> bool {
        false
    }

    /// Emit every route handler, the default-route registrations and the
    /// init function
    fn emit_routes(
        &self,
        out: &mut String,
        registry: &AssetRegistry,
        plan: &RoutePlan,
        config: &Config,
    );
}

/// Resolve the backend for an engine selector
pub(crate) fn backend_for(engine: Engine) -> &'static dyn EngineBackend {
    match engine {
        Engine::Psychic => &psychic::Psychic,
        Engine::Psychic2 => &psychic2::Psychic2,
        Engine::Async => &asyncws::AsyncWs,
        Engine::EspIdf => &espidf::EspIdf,
    }
}

/// How default-document routes are realized for one build
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RoutePlan {
    /// Asset index assigned to the engine default endpoint slot
    pub slot: Option<usize>,

    /// Asset indices that get an extra bare-path registration
    pub bare: Vec<usize>,
}

/// Decide the default-route layout
///
/// Candidates are the root-level `index.htm*` assets in path order. Engines
/// with a default endpoint slot flag the first candidate when a base path is
/// mounted and fall back to one bare-path handler otherwise. Engines without
/// a slot register a bare-path route for every candidate; the first
/// registration wins at runtime.
pub(crate) fn plan_default_routes(
    registry: &AssetRegistry,
    has_slot: bool,
    has_base_path: bool,
) -> RoutePlan {
    let candidates = registry.default_candidates();
    if !has_slot {
        return RoutePlan {
            slot: None,
            bare: candidates,
        };
    }
    match candidates.first().copied() {
        None => RoutePlan::default(),
        Some(first) if has_base_path => RoutePlan {
            slot: Some(first),
            bare: Vec::new(),
        },
        Some(first) => RoutePlan {
            slot: None,
            bare: vec![first],
        },
    }
}

/// Render a block under a tri-state feature toggle
///
/// `enabled` and `disabled` must be empty or newline-terminated. The on and
/// off states pass one branch through verbatim; the compiler state wraps
/// both in an `#ifdef`/`#else` on `macro_name`.
pub(crate) fn guarded(state: TriState, macro_name: &str, enabled: &str, disabled: &str) -> String {
    match state {
        TriState::On => enabled.to_string(),
        TriState::Off => disabled.to_string(),
        TriState::Compiler => {
            if enabled.is_empty() && disabled.is_empty() {
                return String::new();
            }
            let mut out = String::new();
            if enabled.is_empty() {
                out.push_str(&format!("#ifndef {macro_name}\n"));
                out.push_str(disabled);
            } else {
                out.push_str(&format!("#ifdef {macro_name}\n"));
                out.push_str(enabled);
                if !disabled.is_empty() {
                    out.push_str("#else\n");
                    out.push_str(disabled);
                }
            }
            out.push_str("#endif\n");
            out
        }
    }
}

/// One observability hook invocation line
pub(crate) fn hook_call(indent: &str, prefix: &str, route: &str, status: u16) -> String {
    format!("{indent}{prefix}_onFileServed(\"{route}\", {status});\n")
}

/// Cache-Control header value for the configured cache time
pub(crate) fn cache_control_value(cache_time: u32) -> String {
    if cache_time > 0 {
        format!("max-age={cache_time}")
    } else {
        "no-cache".to_string()
    }
}

/// Array holding the served representation under the gzip feature
pub(crate) fn gzip_array_name(asset: &Asset) -> String {
    format!("datagzip_{}", asset.identifier)
}

/// Array holding the raw representation
pub(crate) fn raw_array_name(asset: &Asset) -> String {
    format!("data_{}", asset.identifier)
}
